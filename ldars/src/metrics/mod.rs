use std::collections::HashMap;
pub use likelihood::*;
use crate::params::ModelParams;


mod likelihood;


pub trait Metric<P: ModelParams> {
    fn compute(
        &mut self,
        i: usize,
        params: &P,
        metrics: &mut HashMap<String, f64>,
    );
}
