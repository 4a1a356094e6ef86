use crate::error::{LdaError, LdaResult};
use crate::params::{ModelOptions, ModelParams, TopicCounts};
use crate::state::GlobalWorker;
use crate::stats::TopicCountStats;

/// Model broadcast to every worker at the start of an iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalState {
    options: ModelOptions,
    model: TopicCounts,
    iteration: usize,
}

impl GlobalState {
    /// Global state holding the all-zero model.
    pub fn new(options: ModelOptions) -> Self {
        let model = TopicCounts::zeros(options.voc_size, options.topic_num);
        Self { options, model, iteration: 0 }
    }

    /// Global state built from the counts of the initial assignment.
    pub fn from_stats(options: ModelOptions, stats: TopicCountStats) -> Self {
        let model = stats.finalize(options.voc_size, options.topic_num);
        Self { options, model, iteration: 0 }
    }

    /// Global state around an existing model, `iteration` iterations into training.
    pub fn from_model(options: ModelOptions, model: TopicCounts, iteration: usize) -> LdaResult<Self> {
        if model.voc_size() != options.voc_size || model.topic_num() != options.topic_num {
            return Err(LdaError::ModelShape {
                voc_size: options.voc_size,
                topic_num: options.topic_num,
                expected: options.model_len(),
                actual: model.as_flat().len(),
            });
        }
        Ok(Self { options, model, iteration })
    }

    pub fn into_model(self) -> TopicCounts {
        self.model
    }
}

impl ModelParams for GlobalState {
    fn options(&self) -> &ModelOptions {
        &self.options
    }

    fn model(&self) -> &TopicCounts {
        &self.model
    }

    fn iteration(&self) -> usize {
        self.iteration
    }
}

impl GlobalWorker for GlobalState {
    fn update_model(&mut self, stats: TopicCountStats) -> LdaResult<()> {
        let model = stats.finalize(self.options.voc_size, self.options.topic_num);
        if !model.same_shape(&self.model) {
            return Err(LdaError::ModelShape {
                voc_size: self.options.voc_size,
                topic_num: self.options.topic_num,
                expected: self.options.model_len(),
                actual: model.as_flat().len(),
            });
        }
        self.model = model;
        self.iteration += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::data::Document;
    use crate::error::LdaError;
    use crate::params::{ModelOptions, ModelParams, TopicCounts};
    use crate::state::GlobalWorker;
    use crate::stats::TopicCountStats;
    use super::GlobalState;

    #[test]
    fn test_update_replaces_model() {
        let options = ModelOptions::new(3, 2, 0.1, 0.1);
        let mut global = GlobalState::new(options);
        assert_eq!(global.n_tokens(), 0);

        let mut stats = TopicCountStats::default();
        stats.accumulate(&Document::new(0, vec![0, 2], vec![1, 2]), &[1, 0, 0], 3, 2).unwrap();
        global.update_model(stats.clone()).unwrap();
        assert_eq!(global.iteration(), 1);
        assert_eq!(global.model().as_flat(), &[0, 1, 0, 0, 2, 0, 2, 1]);

        // Not added on top of the previous model
        global.update_model(stats).unwrap();
        assert_eq!(global.n_tokens(), 3);
        assert_eq!(global.iteration(), 2);
    }

    #[test]
    fn test_empty_update() {
        let options = ModelOptions::new(3, 2, 0.1, 0.1);
        let model = TopicCounts::from_flat(3, 2, vec![2, 0, 1, 1, 0, 3, 3, 4]).unwrap();
        let mut global = GlobalState::from_model(options, model, 5).unwrap();
        global.update_model(TopicCountStats::default()).unwrap();
        assert_eq!(global.model(), &TopicCounts::zeros(3, 2));
        assert_eq!(global.iteration(), 6);
    }

    #[test]
    fn test_shape_mismatch() {
        let options = ModelOptions::new(3, 2, 0.1, 0.1);
        assert!(matches!(
            GlobalState::from_model(options.clone(), TopicCounts::zeros(4, 2), 0),
            Err(LdaError::ModelShape { expected: 8, actual: 10, .. })
        ));

        let mut global = GlobalState::new(options);
        let mut stats = TopicCountStats::default();
        stats.accumulate(&Document::new(0, vec![3], vec![1]), &[0], 4, 2).unwrap();
        assert!(global.update_model(stats).is_err());
        assert_eq!(global.iteration(), 0);
    }
}
