mod cache;
mod global;
mod local;
mod local_sharded;

pub use cache::{ModelCache, ScanKey};
pub use global::GlobalState;
pub use local::LocalState;
pub use local_sharded::ShardedState;

use rand::Rng;
use crate::data::TopicDocument;
use crate::error::LdaResult;
use crate::params::{ModelOptions, ModelParams};
use crate::stats::{PerplexityStats, SampleMode, TopicCountStats};

pub trait GlobalWorker: ModelParams {
    /// Replaces the model wholesale with the merged topic counts of a completed iteration
    /// and advances the iteration counter.
    ///
    /// # Arguments
    ///
    /// * `stats`: The merged topic count stats of every partition
    fn update_model(&mut self, stats: TopicCountStats) -> LdaResult<()>;
}

/// Local worker keeps track of documents and their topic assignments and is responsible to
/// resample them and to calculate the statistics over them given the model.
pub trait LocalWorker {
    /// Initializes the local state by uniformly assigning every token to a random topic
    ///
    /// # Arguments
    ///
    /// * `topic_num`: The number of topics
    /// * `rng`: The random number generator
    fn init<R: Rng + Clone + Send + Sync>(
        &mut self,
        topic_num: usize,
        rng: &mut R,
    );

    /// Returns the number of documents in the local state
    fn n_documents(&self) -> usize;

    /// Returns the number of tokens in the local state
    fn n_tokens(&self) -> usize;

    /// Collects the word-topic counts of the current assignments
    fn collect_topic_stats(&self, options: &ModelOptions) -> LdaResult<TopicCountStats>;

    /// Collects the log-likelihood of the documents under the given model
    fn collect_perplexity_stats(&self, params: &impl ModelParams) -> LdaResult<PerplexityStats>;

    /// Resamples the topic of every token given the model.
    ///
    /// Every partition works on its own copy of the model, so updates made while scanning one
    /// partition are invisible to the others until the counts are merged. New assignments are only
    /// committed when the whole partition was scanned without error.
    ///
    /// # Arguments
    ///
    /// * `params`: The model of the last completed iteration
    /// * `sweeps`: Number of passes over each document
    /// * `mode`: Whether the partition copy of the model follows the resampled tokens
    /// * `rng`: The random number generator
    fn apply_sweep<R: Rng + Clone + Send + Sync>(
        &mut self,
        params: &impl ModelParams,
        sweeps: usize,
        mode: SampleMode,
        rng: &mut R,
    ) -> LdaResult<()>;

    /// Consumes the state, returning every document with its topic state in input order
    fn into_documents(self) -> Vec<TopicDocument>;
}
