use rand::Rng;
use crate::data::{Document, DocTopic};
use crate::error::{LdaError, LdaResult};
use crate::params::{ModelOptions, TopicCounts};
use crate::utils::categorical_sample;

/// Whether the sampler writes its count updates back into the shared model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleMode {
    /// Word-topic counts and topic totals move with every resampled token.
    Train,
    /// The model is only read; only the document's own topic counts change.
    Frozen,
}

/// Collapsed Gibbs resampling of every token of a single document.
///
/// Performs `sweeps` full passes over the tokens of `doc` in [`Document::tokens`] order. For each
/// token the current topic is removed from the counts, a new topic is drawn with probability
/// proportional to
///
/// `(n_dk + alpha) * (n_wk + beta) / (n_k + voc_size * beta)`
///
/// and the counts are restored with the new topic. In [`SampleMode::Train`] the model counts are
/// updated in place, so later tokens and later documents of the same scan see the new state.
///
/// # Arguments
///
/// * `doc`: The document to resample.
/// * `doc_topic`: The topic state of `doc` from the previous iteration (or a random assignment).
/// * `model`: The model shared by every document of the scan.
/// * `options`: Model hyperparameters.
/// * `sweeps`: Number of passes over the document, at least 1.
/// * `mode`: Whether the model is updated.
/// * `rng`: The random number generator.
///
/// # Returns
///
/// The new topic state of the document. Shape errors are reported before `model` is touched; a
/// negative model count or a non-positive sampling weight aborts with
/// [`LdaError::DegenerateWeights`].
pub fn sample(
    doc: &Document,
    doc_topic: &DocTopic,
    model: &mut TopicCounts,
    options: &ModelOptions,
    sweeps: usize,
    mode: SampleMode,
    rng: &mut impl Rng,
) -> LdaResult<DocTopic> {
    if sweeps == 0 {
        return Err(LdaError::InvalidDimension { name: "sweeps", value: sweeps });
    }
    check_model_shape(model, options)?;
    doc.validate(options.voc_size)?;
    doc_topic.validate(doc, options.topic_num)?;

    if doc.is_empty() {
        return Ok(DocTopic::empty(options.topic_num));
    }

    let mut state = doc_topic.clone();
    let mut weights = vec![0.0; options.topic_num];
    for _ in 0..sweeps {
        for (i, word) in doc.tokens().enumerate() {
            let old_topic = state.topic_assignment[i];
            state.topic_count[old_topic] -= 1;
            if mode == SampleMode::Train {
                model.decrement(word, old_topic);
            }

            let total = topic_weights(&mut weights, &state.topic_count, model, word, options)?;
            let new_topic = categorical_sample(&weights, total, rng);

            state.topic_count[new_topic] += 1;
            if mode == SampleMode::Train {
                model.increment(word, new_topic);
            }
            state.topic_assignment[i] = new_topic;
        }
    }

    Ok(state)
}

/// Fills `weights` with the unnormalized conditional of each topic for one token of `word` and
/// returns their sum.
///
/// Negative word-topic counts or topic totals mean the model does not contain the tokens being
/// resampled. They are rejected even when the weight itself would come out positive.
pub fn topic_weights(
    weights: &mut [f64],
    topic_count: &[i64],
    model: &TopicCounts,
    word: usize,
    options: &ModelOptions,
) -> LdaResult<f64> {
    let voc_beta = options.voc_beta();
    let mut total = 0.0;
    for (topic, weight) in weights.iter_mut().enumerate() {
        let (n_wk, n_k) = (model.get(word, topic), model.total(topic));
        *weight = (topic_count[topic] as f64 + options.alpha)
            * (n_wk as f64 + options.beta)
            / (n_k as f64 + voc_beta);
        if n_wk < 0 || n_k < 0 || !(*weight > 0.0 && weight.is_finite()) {
            return Err(LdaError::DegenerateWeights { word, topic, weight: *weight });
        }
        total += *weight;
    }
    Ok(total)
}

pub(crate) fn check_model_shape(model: &TopicCounts, options: &ModelOptions) -> LdaResult<()> {
    if model.voc_size() != options.voc_size || model.topic_num() != options.topic_num {
        return Err(LdaError::ModelShape {
            voc_size: options.voc_size,
            topic_num: options.topic_num,
            expected: options.model_len(),
            actual: model.as_flat().len(),
        });
    }
    Ok(())
}
