//! # Error Types

/// Errors raised while validating, sampling or evaluating a topic model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LdaError {
    /// A Dirichlet concentration parameter is not strictly positive and finite.
    #[error("hyperparameter `{name}` must be positive and finite, got {value}")]
    InvalidHyperParameter {
        /// Name of the parameter (`alpha` or `beta`).
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A size parameter (vocabulary size, topic count, iteration count) is zero.
    #[error("`{name}` must be positive, got {value}")]
    InvalidDimension {
        /// Name of the parameter.
        name: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// `words` and `counts` of a document differ in length.
    #[error("document {doc_id}: {words} words but {counts} counts")]
    LengthMismatch {
        doc_id: i64,
        words: usize,
        counts: usize,
    },

    /// A distinct word of a document has an occurrence count of zero.
    #[error("document {doc_id}: word {word} has a zero count")]
    ZeroCount {
        doc_id: i64,
        word: usize,
    },

    /// A word id lies outside `[0, voc_size)`.
    #[error("document {doc_id}: word id {word} outside vocabulary of size {voc_size}")]
    WordOutOfRange {
        doc_id: i64,
        word: usize,
        voc_size: usize,
    },

    /// The per-document topic counts do not have `topic_num` entries.
    #[error("document {doc_id}: topic_count has {actual} entries, expected {expected}")]
    TopicCountLength {
        doc_id: i64,
        expected: usize,
        actual: usize,
    },

    /// The topic assignment does not have one entry per token.
    #[error("document {doc_id}: topic_assignment has {actual} entries, expected {expected}")]
    AssignmentLength {
        doc_id: i64,
        expected: usize,
        actual: usize,
    },

    /// The per-document topic counts do not sum to the document's word count.
    #[error("document {doc_id}: topic_count sums to {actual}, expected {expected}")]
    TopicCountSum {
        doc_id: i64,
        expected: usize,
        actual: i64,
    },

    /// A token is assigned to a topic outside `[0, topic_num)`.
    #[error("document {doc_id}: topic {topic} outside [0, {topic_num})")]
    TopicOutOfRange {
        doc_id: i64,
        topic: usize,
        topic_num: usize,
    },

    /// A flattened model does not have `(voc_size + 1) * topic_num` entries.
    #[error("model has {actual} entries, expected {expected} for a ({voc_size} + 1) x {topic_num} layout")]
    ModelShape {
        voc_size: usize,
        topic_num: usize,
        expected: usize,
        actual: usize,
    },

    /// A sampling weight is non-positive or not finite, which only happens
    /// when some count went negative.
    #[error("degenerate sampling weights for word {word}: topic {topic} has weight {weight}")]
    DegenerateWeights {
        word: usize,
        topic: usize,
        weight: f64,
    },

    /// Perplexity was requested over a corpus without any token.
    #[error("perplexity is undefined over zero tokens")]
    EmptyCorpus,

    /// The model has not been fitted or loaded yet.
    #[error("model has not been fitted yet")]
    NotFitted,
}

/// Result type for ldars operations.
pub type LdaResult<T> = Result<T, LdaError>;
