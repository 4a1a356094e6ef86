mod data;
mod sampling;

pub use data::*;
pub use sampling::*;
