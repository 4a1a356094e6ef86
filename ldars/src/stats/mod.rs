pub mod sampler;
mod topic_counts;
mod perplexity;

pub use sampler::{sample, topic_weights, SampleMode};
pub use topic_counts::*;
pub use perplexity::*;
