use std::iter::Sum;
use std::ops::{Add, AddAssign};
use crate::data::{Document, DocTopic};
use crate::error::{LdaError, LdaResult};
use crate::params::{ModelOptions, TopicCounts};
use crate::stats::sampler::check_model_shape;

/// Running log-likelihood and token count of a set of documents under a fixed model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerplexityStats {
    pub log_likelihood: f64,
    pub n_tokens: u64,
}

impl PerplexityStats {
    /// Adds the log-likelihood of every token of `doc`.
    ///
    /// With `theta[k] = (n_dk + alpha) / (n_d + topic_num * alpha)` and
    /// `phi[w][k] = (n_wk + beta) / (n_k + voc_size * beta)`, each distinct word contributes
    /// `count * ln(sum_k theta[k] * phi[w][k])`.
    pub fn accumulate(
        &mut self,
        doc: &Document,
        doc_topic: &DocTopic,
        model: &TopicCounts,
        options: &ModelOptions,
    ) -> LdaResult<()> {
        check_model_shape(model, options)?;
        doc.validate(options.voc_size)?;
        doc_topic.validate(doc, options.topic_num)?;

        let word_count = doc.word_count();
        if word_count == 0 {
            return Ok(());
        }

        let theta_norm = word_count as f64 + options.topic_num as f64 * options.alpha;
        let theta: Vec<f64> = doc_topic.topic_count.iter()
            .map(|&c| (c as f64 + options.alpha) / theta_norm)
            .collect();
        let voc_beta = options.voc_beta();

        for (&word, &count) in doc.words.iter().zip(&doc.counts) {
            let mut prob = 0.0;
            for (topic, &theta_k) in theta.iter().enumerate() {
                let (n_wk, n_k) = (model.get(word, topic), model.total(topic));
                let phi = (n_wk as f64 + options.beta) / (n_k as f64 + voc_beta);
                if n_wk < 0 || n_k < 0 || !(phi > 0.0 && phi.is_finite()) {
                    return Err(LdaError::DegenerateWeights { word, topic, weight: phi });
                }
                prob += theta_k * phi;
            }
            self.log_likelihood += count as f64 * prob.ln();
            self.n_tokens += count as u64;
        }
        Ok(())
    }

    /// `exp(-log_likelihood / n_tokens)`.
    pub fn finalize(&self) -> LdaResult<f64> {
        if self.n_tokens == 0 {
            return Err(LdaError::EmptyCorpus);
        }
        Ok((-self.log_likelihood / self.n_tokens as f64).exp())
    }
}

impl<'a> AddAssign<&'a PerplexityStats> for PerplexityStats {
    fn add_assign(&mut self, rhs: &'a PerplexityStats) {
        self.log_likelihood += rhs.log_likelihood;
        self.n_tokens += rhs.n_tokens;
    }
}

impl<'a> Add<&'a PerplexityStats> for PerplexityStats {
    type Output = PerplexityStats;

    fn add(mut self, rhs: &'a PerplexityStats) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for PerplexityStats {
    fn sum<I: Iterator<Item=Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, x| acc + &x)
    }
}
