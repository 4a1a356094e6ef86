use std::collections::HashMap;
use std::time::Instant;
use itertools::Itertools;
use tracing::info;
use crate::metrics::Metric;
use crate::params::ModelParams;

pub trait Callback<P: ModelParams> {
    fn before_step(&mut self, _i: usize) {}

    fn during_step(&mut self, _i: usize, _params: &P) {}

    /// Called after the training perplexity was evaluated at iteration `i`.
    fn after_evaluation(&mut self, _i: usize, _perplexity: f64) {}

    fn after_step(&mut self, _i: usize) {}
}

/// Computes metrics during training and logs them once per iteration.
///
/// # Example:
/// ```
/// use ldars::{LogLikelihood, MonitoringCallback};
/// use ldars::state::GlobalState;
///
/// let mut callback = MonitoringCallback::<GlobalState>::new();
/// callback.add_metric(LogLikelihood);
/// callback.set_verbose(true);
/// ```
pub struct MonitoringCallback<P: ModelParams> {
    metrics: Vec<Box<dyn Metric<P>>>,
    callbacks: Vec<Box<dyn Callback<P>>>,
    measures: HashMap<String, f64>,
    step_started: Instant,
    verbose: bool,
}

impl<P: ModelParams> MonitoringCallback<P> {
    pub fn new() -> Self {
        Self {
            metrics: vec![],
            callbacks: vec![],
            measures: HashMap::new(),
            step_started: Instant::now(),
            verbose: false,
        }
    }

    pub fn add_metric(&mut self, metric: impl Metric<P> + 'static) {
        self.metrics.push(Box::new(metric));
    }

    pub fn add_callback(&mut self, callback: impl Callback<P> + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Measures of the current iteration.
    pub fn measures(&self) -> &HashMap<String, f64> {
        &self.measures
    }
}

impl<P: ModelParams> Default for MonitoringCallback<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ModelParams> Callback<P> for MonitoringCallback<P> {
    fn before_step(&mut self, i: usize) {
        self.measures.clear();
        for callback in &mut self.callbacks {
            callback.before_step(i);
        }
        self.step_started = Instant::now();
    }

    fn during_step(&mut self, i: usize, params: &P) {
        self.measures.insert("tokens".to_string(), params.n_tokens() as f64);
        for metric in &mut self.metrics {
            metric.compute(i, params, &mut self.measures);
        }
        for callback in &mut self.callbacks {
            callback.during_step(i, params);
        }
    }

    fn after_evaluation(&mut self, i: usize, perplexity: f64) {
        self.measures.insert("perplexity".to_string(), perplexity);
        for callback in &mut self.callbacks {
            callback.after_evaluation(i, perplexity);
        }
    }

    fn after_step(&mut self, i: usize) {
        for callback in &mut self.callbacks {
            callback.after_step(i);
        }
        if self.verbose {
            let elapsed = self.step_started.elapsed();
            let measures = self.measures.iter()
                .sorted_by(|a, b| a.0.cmp(b.0))
                .map(|(k, v)| format!("{}={:.4}", k, v))
                .join(", ");
            info!("Run iteration {} in {:.2?}; {}", i, elapsed, measures);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use crate::metrics::LogLikelihood;
    use crate::params::{ModelOptions, TopicCounts};
    use crate::state::GlobalState;
    use super::{Callback, MonitoringCallback};

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<String>>>);

    impl Callback<GlobalState> for Recorder {
        fn before_step(&mut self, i: usize) {
            self.0.borrow_mut().push(format!("before {}", i));
        }

        fn after_evaluation(&mut self, i: usize, _perplexity: f64) {
            self.0.borrow_mut().push(format!("eval {}", i));
        }

        fn after_step(&mut self, i: usize) {
            self.0.borrow_mut().push(format!("after {}", i));
        }
    }

    #[test]
    fn test_measures() {
        let options = ModelOptions::new(2, 1, 0.1, 0.3);
        let model = TopicCounts::from_flat(2, 1, vec![2, 1, 3]).unwrap();
        let global = GlobalState::from_model(options, model, 0).unwrap();

        let recorder = Recorder::default();
        let mut callback = MonitoringCallback::new();
        callback.add_metric(LogLikelihood);
        callback.add_callback(recorder.clone());
        callback.set_verbose(true);

        callback.before_step(0);
        callback.during_step(0, &global);
        callback.after_evaluation(0, 12.5);
        callback.after_step(0);

        assert_eq!(callback.measures()["tokens"], 3.0);
        assert_eq!(callback.measures()["perplexity"], 12.5);
        assert!(callback.measures()["log_likelihood"] < 0.0);
        assert_eq!(*recorder.0.borrow(), vec!["before 0", "eval 0", "after 0"]);

        callback.before_step(1);
        assert!(callback.measures().is_empty());
    }
}
