use itertools::izip;
use rand::Rng;
use tracing::{debug, warn};
use crate::data::{Document, DocTopic, TopicDocument};
use crate::error::LdaResult;
use crate::params::{ModelOptions, ModelParams};
use crate::state::{LocalWorker, ModelCache, ScanKey};
use crate::stats::{sample, PerplexityStats, SampleMode, TopicCountStats};


/// Local state holds one partition of the corpus and performs all computations on it locally.
#[derive(Debug, Clone)]
pub struct LocalState {
    pub partition: usize,
    pub documents: Vec<Document>,
    pub doc_topics: Vec<DocTopic>,
    cache: ModelCache,
}

impl LocalState {
    /// Create a new local state.
    ///
    /// # Arguments
    ///
    /// * `partition`: Index of the partition within the corpus.
    /// * `documents`: The documents of the partition.
    /// * `doc_topics`: Topic state of every document, in the same order.
    pub fn new(
        partition: usize,
        documents: Vec<Document>,
        doc_topics: Vec<DocTopic>,
    ) -> Self {
        Self { partition, documents, doc_topics, cache: ModelCache::new() }
    }

    /// Create a new local state from documents without topic state.
    /// [`LocalWorker::init`] has to be called before the first sweep.
    pub fn from_documents(documents: Vec<Document>) -> Self {
        Self::new(0, documents, Vec::new())
    }

    pub fn with_partition(mut self, partition: usize) -> Self {
        self.partition = partition;
        self
    }

    /// Number of times the partition decoded a broadcast model.
    pub fn n_decodes(&self) -> usize {
        self.cache.n_decodes()
    }

    /// Resamples every document in input order against the partition copy of the model.
    fn sweep(
        &mut self,
        key: ScanKey,
        params: &impl ModelParams,
        sweeps: usize,
        mode: SampleMode,
        rng: &mut impl Rng,
    ) -> LdaResult<Vec<DocTopic>> {
        let options = params.options();
        let mut doc_topics = Vec::with_capacity(self.documents.len());
        for (doc, doc_topic) in izip!(&self.documents, &self.doc_topics) {
            let model = self.cache.acquire(key, options, params.model().as_flat())?;
            doc_topics.push(sample(doc, doc_topic, model, options, sweeps, mode, rng)?);
        }
        Ok(doc_topics)
    }
}

impl LocalWorker for LocalState {
    fn init<R: Rng + Clone + Send + Sync>(&mut self, topic_num: usize, rng: &mut R) {
        self.doc_topics = self.documents.iter()
            .map(|doc| DocTopic::random(doc, topic_num, rng))
            .collect();
    }

    fn n_documents(&self) -> usize {
        self.documents.len()
    }

    fn n_tokens(&self) -> usize {
        self.documents.iter().map(Document::word_count).sum()
    }

    fn collect_topic_stats(&self, options: &ModelOptions) -> LdaResult<TopicCountStats> {
        let mut stats = TopicCountStats::default();
        for (doc, doc_topic) in izip!(&self.documents, &self.doc_topics) {
            stats.accumulate(doc, &doc_topic.topic_assignment, options.voc_size, options.topic_num)?;
        }
        Ok(stats)
    }

    fn collect_perplexity_stats(&self, params: &impl ModelParams) -> LdaResult<PerplexityStats> {
        let mut stats = PerplexityStats::default();
        for (doc, doc_topic) in izip!(&self.documents, &self.doc_topics) {
            stats.accumulate(doc, doc_topic, params.model(), params.options())?;
        }
        Ok(stats)
    }

    fn apply_sweep<R: Rng + Clone + Send + Sync>(
        &mut self,
        params: &impl ModelParams,
        sweeps: usize,
        mode: SampleMode,
        rng: &mut R,
    ) -> LdaResult<()> {
        let key = ScanKey::new(params.iteration(), self.partition);
        let result = self.sweep(key, params, sweeps, mode, rng);
        let scratch = self.cache.release(key);

        match result {
            Ok(doc_topics) => {
                if let Some(scratch) = scratch {
                    debug!(
                        iteration = key.iteration,
                        partition = key.partition,
                        n_documents = doc_topics.len(),
                        n_tokens = scratch.n_tokens(),
                        "finished partition scan"
                    );
                }
                self.doc_topics = doc_topics;
                Ok(())
            }
            Err(err) => {
                warn!(iteration = key.iteration, partition = key.partition, %err, "partition scan failed");
                Err(err)
            }
        }
    }

    fn into_documents(self) -> Vec<TopicDocument> {
        izip!(self.documents, self.doc_topics)
            .map(|(doc, doc_topic)| TopicDocument::new(doc, doc_topic))
            .collect()
    }
}
