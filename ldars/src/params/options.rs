#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use crate::error::{LdaError, LdaResult};

/// Hyperparameters of an LDA model.
///
/// Fixed for the whole training run and persisted next to the model counts.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOptions {
    /// Document-topic Dirichlet concentration
    pub alpha: f64,
    /// Topic-word Dirichlet concentration
    pub beta: f64,
    /// Number of distinct vocabulary ids, words are expected in `[0, voc_size)`
    pub voc_size: usize,
    /// Number of latent topics
    pub topic_num: usize,
}

impl ModelOptions {
    pub fn new(voc_size: usize, topic_num: usize, alpha: f64, beta: f64) -> Self {
        Self { alpha, beta, voc_size, topic_num }
    }

    /// Symmetric priors following Griffiths & Steyvers (2004):
    /// `alpha = 50 / topic_num`, `beta = 0.01`.
    pub fn default(voc_size: usize, topic_num: usize) -> Self {
        Self {
            alpha: 50.0 / topic_num.max(1) as f64,
            beta: 0.01,
            voc_size,
            topic_num,
        }
    }

    /// Rejects non-positive priors and empty dimensions.
    pub fn validate(&self) -> LdaResult<()> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(LdaError::InvalidHyperParameter { name, value });
            }
        }
        for (name, value) in [("voc_size", self.voc_size), ("topic_num", self.topic_num)] {
            if value == 0 {
                return Err(LdaError::InvalidDimension { name, value });
            }
        }
        Ok(())
    }

    /// Denominator smoothing mass `voc_size * beta`.
    pub fn voc_beta(&self) -> f64 {
        self.voc_size as f64 * self.beta
    }

    /// Length of the flattened model, `(voc_size + 1) * topic_num`.
    pub fn model_len(&self) -> usize {
        (self.voc_size + 1) * self.topic_num
    }
}

/// Options for the fit and predict methods
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Seed for the random number generator
    pub seed: u64,
    /// Number of training iterations
    pub iters: usize,
    /// Number of workers (partitions) for parallelization (-1 = number of CPUs)
    pub workers: i32,
    /// Number of resampling passes over each document during prediction
    pub predict_sweeps: usize,
    /// Evaluate training perplexity every `evaluate_every` iterations (0 = never)
    pub evaluate_every: usize,
    /// Stop once the relative perplexity change between two evaluations drops below this (0 = never)
    pub perplexity_tol: f64,
}

impl FitOptions {
    pub fn validate(&self) -> LdaResult<()> {
        if self.iters == 0 {
            return Err(LdaError::InvalidDimension { name: "iters", value: 0 });
        }
        if self.predict_sweeps == 0 {
            return Err(LdaError::InvalidDimension { name: "predict_sweeps", value: 0 });
        }
        if !(self.perplexity_tol >= 0.0 && self.perplexity_tol.is_finite()) {
            return Err(LdaError::InvalidHyperParameter { name: "perplexity_tol", value: self.perplexity_tol });
        }
        Ok(())
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            iters: 100,
            workers: 1,
            predict_sweeps: 20,
            evaluate_every: 0,
            perplexity_tol: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::LdaError;
    use super::{FitOptions, ModelOptions};

    #[test]
    fn test_validate_model_options() {
        assert!(ModelOptions::new(3, 2, 0.1, 0.1).validate().is_ok());
        assert_eq!(
            ModelOptions::new(3, 2, 0.0, 0.1).validate(),
            Err(LdaError::InvalidHyperParameter { name: "alpha", value: 0.0 })
        );
        assert_eq!(
            ModelOptions::new(3, 2, 0.1, -1.0).validate(),
            Err(LdaError::InvalidHyperParameter { name: "beta", value: -1.0 })
        );
        assert!(ModelOptions::new(3, 2, f64::NAN, 0.1).validate().is_err());
        assert_eq!(
            ModelOptions::new(0, 2, 0.1, 0.1).validate(),
            Err(LdaError::InvalidDimension { name: "voc_size", value: 0 })
        );
        assert_eq!(
            ModelOptions::new(3, 0, 0.1, 0.1).validate(),
            Err(LdaError::InvalidDimension { name: "topic_num", value: 0 })
        );
    }

    #[test]
    fn test_validate_fit_options() {
        assert!(FitOptions::default().validate().is_ok());

        let mut options = FitOptions::default();
        options.iters = 0;
        assert_eq!(options.validate(), Err(LdaError::InvalidDimension { name: "iters", value: 0 }));
    }

    #[test]
    fn test_model_len() {
        let options = ModelOptions::default(3, 2);
        assert_eq!(options.model_len(), 8);
        assert_eq!(options.alpha, 25.0);
    }
}
