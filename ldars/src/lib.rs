pub mod error;
pub mod data;
pub mod utils;
pub mod model;
pub mod metrics;
pub mod stats;
pub mod state;
pub mod params;
pub mod callback;

pub use error::{LdaError, LdaResult};
pub use data::{Document, DocTopic, TopicDocument};
pub use model::{perplexity, predict, train, Model, PersistedModel};
pub use params::{FitOptions, ModelOptions, TopicCounts};
pub use callback::MonitoringCallback;
pub use metrics::LogLikelihood;
pub use stats::{sample, SampleMode};
