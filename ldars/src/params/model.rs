use crate::params::{ModelOptions, TopicCounts};

/// Read-only view of a fitted or in-progress model, shared by every worker of a scan.
pub trait ModelParams: Send + Sync {
    /// Hyperparameters and dimensions.
    fn options(&self) -> &ModelOptions;

    /// Merged word-topic counts of the last completed iteration.
    fn model(&self) -> &TopicCounts;

    /// Number of completed iterations, used to tell scans apart.
    fn iteration(&self) -> usize;

    fn topic_num(&self) -> usize {
        self.options().topic_num
    }

    fn voc_size(&self) -> usize {
        self.options().voc_size
    }

    /// Number of tokens the model was estimated from.
    fn n_tokens(&self) -> i64 {
        self.model().n_tokens()
    }
}
