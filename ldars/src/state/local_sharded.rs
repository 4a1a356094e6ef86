use rand::{Rng, SeedableRng};
use rand::rngs::SmallRng;
use rayon::prelude::*;
use crate::data::{Document, TopicDocument};
use crate::error::LdaResult;
use crate::params::{ModelOptions, ModelParams};
use crate::state::{LocalState, LocalWorker};
use crate::stats::{PerplexityStats, SampleMode, TopicCountStats};
use crate::utils::chunk_ranges;

/// Corpus split into contiguous partitions that are scanned in parallel.
///
/// Each partition resamples against its own copy of the broadcast model. An error in any
/// partition fails the whole operation.
pub struct ShardedState {
    pub shards: Vec<LocalState>,
}

impl ShardedState {
    pub fn new(shards: Vec<LocalState>) -> Self {
        Self { shards }
    }

    /// Splits `documents` into at most `n_shards` contiguous partitions of near-equal size.
    pub fn from_documents(documents: Vec<Document>, n_shards: usize) -> Self {
        let ranges = chunk_ranges(documents.len(), n_shards);
        let mut documents = documents.into_iter();

        let shards = ranges.into_iter()
            .enumerate()
            .map(|(partition, range)| {
                let chunk: Vec<_> = documents.by_ref().take(range.len()).collect();
                LocalState::from_documents(chunk).with_partition(partition)
            })
            .collect();

        ShardedState::new(shards)
    }

    pub fn n_shards(&self) -> usize {
        self.shards.len()
    }

    /// One seed per partition, drawn in partition order so a fixed seed and partitioning replay
    /// the same scan regardless of thread scheduling.
    fn shard_seeds<R: Rng>(&self, rng: &mut R) -> Vec<u64> {
        (0..self.shards.len()).map(|_| rng.gen()).collect()
    }
}

impl LocalWorker for ShardedState {
    fn init<R: Rng + Clone + Send + Sync>(&mut self, topic_num: usize, rng: &mut R) {
        self.shards.iter_mut().for_each(|shard| {
            shard.init(topic_num, rng);
        });
    }

    fn n_documents(&self) -> usize {
        self.shards.iter().map(|shard| shard.n_documents()).sum()
    }

    fn n_tokens(&self) -> usize {
        self.shards.iter().map(|shard| shard.n_tokens()).sum()
    }

    fn collect_topic_stats(&self, options: &ModelOptions) -> LdaResult<TopicCountStats> {
        let stats = self.shards.par_iter()
            .map(|shard| shard.collect_topic_stats(options))
            .collect::<LdaResult<Vec<_>>>()?;
        stats.iter().try_fold(TopicCountStats::default(), |mut acc, x| {
            acc.try_merge(x)?;
            Ok(acc)
        })
    }

    fn collect_perplexity_stats(&self, params: &impl ModelParams) -> LdaResult<PerplexityStats> {
        let stats = self.shards.par_iter()
            .map(|shard| shard.collect_perplexity_stats(params))
            .collect::<LdaResult<Vec<_>>>()?;
        Ok(stats.into_iter().sum())
    }

    fn apply_sweep<R: Rng + Clone + Send + Sync>(
        &mut self,
        params: &impl ModelParams,
        sweeps: usize,
        mode: SampleMode,
        rng: &mut R,
    ) -> LdaResult<()> {
        let seeds = self.shard_seeds(rng);
        self.shards.par_iter_mut()
            .zip(seeds)
            .try_for_each(|(shard, seed)| {
                let mut rng = SmallRng::seed_from_u64(seed);
                shard.apply_sweep(params, sweeps, mode, &mut rng)
            })
    }

    fn into_documents(self) -> Vec<TopicDocument> {
        self.shards.into_iter()
            .flat_map(LocalWorker::into_documents)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::prelude::StdRng;
    use rand::SeedableRng;
    use crate::data::Document;
    use crate::params::{ModelOptions, ModelParams};
    use crate::state::{GlobalState, GlobalWorker, LocalState, LocalWorker};
    use crate::stats::SampleMode;
    use super::ShardedState;

    fn corpus() -> Vec<Document> {
        (0..10)
            .map(|i| Document::new(i, vec![(i % 4) as usize, 4], vec![1 + (i % 3) as u32, 2]))
            .collect()
    }

    fn run(n_shards: usize, seed: u64, iters: usize) -> (ShardedState, GlobalState) {
        let mut rng = StdRng::seed_from_u64(seed);
        let options = ModelOptions::new(5, 3, 0.5, 0.1);
        let mut local = ShardedState::from_documents(corpus(), n_shards);
        local.init(options.topic_num, &mut rng);
        let mut global = GlobalState::from_stats(options.clone(), local.collect_topic_stats(&options).unwrap());

        for _ in 0..iters {
            local.apply_sweep(&global, 1, SampleMode::Train, &mut rng).unwrap();
            global.update_model(local.collect_topic_stats(&options).unwrap()).unwrap();
        }
        (local, global)
    }

    #[test]
    fn test_partitioning() {
        let local = ShardedState::from_documents(corpus(), 3);
        assert_eq!(local.n_shards(), 3);
        assert_eq!(local.shards.iter().map(LocalState::n_documents).collect::<Vec<_>>(), vec![4, 4, 2]);
        assert_eq!(local.shards.iter().map(|s| s.partition).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(local.n_documents(), 10);

        let local = ShardedState::from_documents(corpus(), 16);
        assert_eq!(local.n_documents(), 10);
        assert!(local.shards.iter().all(|s| s.n_documents() > 0));
    }

    #[test]
    fn test_token_totals_match_sequential() {
        let total = corpus().iter().map(Document::word_count).sum::<usize>() as i64;
        for n_shards in [1, 2, 4] {
            let (local, global) = run(n_shards, 42, 5);
            assert_eq!(global.n_tokens(), total);
            assert!(global.model().is_consistent());
            assert_eq!(local.n_tokens() as i64, total);
        }
    }

    #[test]
    fn test_deterministic() {
        let (a, global_a) = run(3, 7, 4);
        let (b, global_b) = run(3, 7, 4);
        assert_eq!(global_a, global_b);
        assert_eq!(a.into_documents(), b.into_documents());
    }

    #[test]
    fn test_output_order() {
        let (local, _) = run(4, 1, 2);
        let ids: Vec<_> = local.into_documents().iter().map(|o| o.doc_id()).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }
}
