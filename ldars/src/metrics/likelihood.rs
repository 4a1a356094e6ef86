use std::collections::HashMap;
use statrs::function::gamma::ln_gamma;
use crate::metrics::Metric;
use crate::params::{ModelParams, TopicCounts};

/// Log-likelihood of the corpus words given their topic assignments, with the topic-word
/// distributions integrated out.
///
/// `log p(w | z) = K * (ln G(V * beta) - V * ln G(beta)) + sum_k (sum_w ln G(n_wk + beta) - ln G(n_k + V * beta))`
///
/// # Arguments:
///
/// * `model`: Word-topic counts of the current assignment.
/// * `beta`: Topic-word Dirichlet concentration.
///
/// # Example:
/// ```
/// use statrs::assert_almost_eq;
/// use ldars::metrics::collapsed_log_likelihood;
/// use ldars::params::TopicCounts;
///
/// // Nothing assigned yet
/// let ll = collapsed_log_likelihood(&TopicCounts::zeros(4, 2), 0.5);
/// assert_almost_eq!(ll, 0.0, 1e-10);
/// ```
pub fn collapsed_log_likelihood(model: &TopicCounts, beta: f64) -> f64 {
    let voc_beta = model.voc_size() as f64 * beta;
    let norm = model.topic_num() as f64 * (ln_gamma(voc_beta) - model.voc_size() as f64 * ln_gamma(beta));

    let (words, totals) = model.as_flat().split_at(model.voc_size() * model.topic_num());
    let words = words.iter().map(|&n| ln_gamma(n as f64 + beta)).sum::<f64>();
    let totals = totals.iter().map(|&n| ln_gamma(n as f64 + voc_beta)).sum::<f64>();

    norm + words - totals
}

/// Collapsed log-likelihood measure
pub struct LogLikelihood;

impl<P: ModelParams> Metric<P> for LogLikelihood {
    fn compute(
        &mut self,
        _i: usize,
        params: &P,
        metrics: &mut HashMap<String, f64>
    ) {
        let score = collapsed_log_likelihood(params.model(), params.options().beta);
        metrics.insert("log_likelihood".to_string(), score);
    }
}
