pub mod options;
pub mod topics;
pub mod model;

pub use options::*;
pub use topics::*;
pub use model::ModelParams;
