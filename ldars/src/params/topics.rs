use std::ops::{Add, AddAssign};
use nalgebra::{DMatrix, DVectorSlice, DVectorSliceMut, RowDVector};
use crate::error::{LdaError, LdaResult};

/// Word-topic counts and corpus-level topic totals of an LDA model.
///
/// The wire layout is a row-major `(voc_size + 1) x topic_num` integer matrix whose last row holds
/// the topic totals. It is decoded into a column-major `(topic_num, voc_size + 1)` matrix, so the
/// storage is byte for byte the wire layout and column `w` holds the per-topic counts of word `w`.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCounts {
    counts: DMatrix<i64>,
}

impl TopicCounts {
    /// All-zero model for the given vocabulary size and number of topics.
    pub fn zeros(voc_size: usize, topic_num: usize) -> Self {
        Self { counts: DMatrix::zeros(topic_num, voc_size + 1) }
    }

    /// Decodes a flattened model.
    ///
    /// # Example
    /// ```
    /// use ldars::params::TopicCounts;
    ///
    /// // 2 words, 2 topics: rows are word 0, word 1, totals
    /// let model = TopicCounts::from_flat(2, 2, vec![3, 0, 1, 2, 4, 2]).unwrap();
    /// assert_eq!(model.word_topic_count(1).as_slice(), &[1, 2]);
    /// assert_eq!(model.topic_total().as_slice(), &[4, 2]);
    /// ```
    pub fn from_flat(voc_size: usize, topic_num: usize, flat: Vec<i64>) -> LdaResult<Self> {
        let expected = (voc_size + 1) * topic_num;
        if flat.len() != expected {
            return Err(LdaError::ModelShape { voc_size, topic_num, expected, actual: flat.len() });
        }
        Ok(Self { counts: DMatrix::from_vec(topic_num, voc_size + 1, flat) })
    }

    /// Same as [`TopicCounts::from_flat`] without taking ownership.
    pub fn from_flat_slice(voc_size: usize, topic_num: usize, flat: &[i64]) -> LdaResult<Self> {
        Self::from_flat(voc_size, topic_num, flat.to_vec())
    }

    /// Row-major flattened representation for storage and transport.
    pub fn as_flat(&self) -> &[i64] {
        self.counts.as_slice()
    }

    pub fn into_flat(self) -> Vec<i64> {
        self.counts.data.into()
    }

    pub fn voc_size(&self) -> usize {
        self.counts.ncols() - 1
    }

    pub fn topic_num(&self) -> usize {
        self.counts.nrows()
    }

    /// Per-topic counts of word `word`.
    pub fn word_topic_count(&self, word: usize) -> DVectorSlice<i64> {
        self.counts.column(word)
    }

    pub fn word_topic_count_mut(&mut self, word: usize) -> DVectorSliceMut<i64> {
        self.counts.column_mut(word)
    }

    /// Corpus-wide number of tokens assigned to each topic.
    pub fn topic_total(&self) -> DVectorSlice<i64> {
        self.counts.column(self.voc_size())
    }

    /// Per-word counts of topic `topic`, i.e. the transposed view of the word-topic matrix.
    pub fn topic_word_count(&self, topic: usize) -> RowDVector<i64> {
        self.counts.row(topic).columns(0, self.voc_size()).clone_owned()
    }

    /// Total number of tokens in the model.
    pub fn n_tokens(&self) -> i64 {
        self.topic_total().sum()
    }

    /// Removes one token of `word` from `topic`, keeping the totals row in step.
    #[inline]
    pub(crate) fn decrement(&mut self, word: usize, topic: usize) {
        let totals = self.voc_size();
        self.counts[(topic, word)] -= 1;
        self.counts[(topic, totals)] -= 1;
    }

    #[inline]
    pub(crate) fn increment(&mut self, word: usize, topic: usize) {
        let totals = self.voc_size();
        self.counts[(topic, word)] += 1;
        self.counts[(topic, totals)] += 1;
    }

    #[inline]
    pub(crate) fn get(&self, word: usize, topic: usize) -> i64 {
        self.counts[(topic, word)]
    }

    #[inline]
    pub(crate) fn total(&self, topic: usize) -> i64 {
        self.counts[(topic, self.counts.ncols() - 1)]
    }

    /// Checks `topic_total[k] == sum_w word_topic_count[w][k]` for every topic.
    pub fn is_consistent(&self) -> bool {
        let voc_size = self.voc_size();
        self.counts.row_iter().all(|row| {
            row.columns(0, voc_size).sum() == row[voc_size]
        })
    }

    pub(crate) fn same_shape(&self, other: &Self) -> bool {
        self.counts.shape() == other.counts.shape()
    }
}

impl<'a> AddAssign<&'a TopicCounts> for TopicCounts {
    fn add_assign(&mut self, rhs: &'a TopicCounts) {
        self.counts += &rhs.counts;
    }
}

impl<'a> Add<&'a TopicCounts> for TopicCounts {
    type Output = TopicCounts;

    fn add(mut self, rhs: &'a TopicCounts) -> Self::Output {
        self += rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::error::LdaError;
    use super::TopicCounts;

    fn model() -> TopicCounts {
        // word 0: [2, 0], word 1: [1, 1], word 2: [0, 3], totals: [3, 4]
        TopicCounts::from_flat(3, 2, vec![2, 0, 1, 1, 0, 3, 3, 4]).unwrap()
    }

    #[test]
    fn test_from_flat() {
        let model = model();
        assert_eq!(model.voc_size(), 3);
        assert_eq!(model.topic_num(), 2);
        assert_eq!(model.word_topic_count(0).as_slice(), &[2, 0]);
        assert_eq!(model.word_topic_count(2).as_slice(), &[0, 3]);
        assert_eq!(model.topic_total().as_slice(), &[3, 4]);
        assert_eq!(model.topic_word_count(1).as_slice(), &[0, 1, 3]);
        assert_eq!(model.n_tokens(), 7);
        assert!(model.is_consistent());
    }

    #[test]
    fn test_flat_layout_preserved() {
        let flat = vec![2, 0, 1, 1, 0, 3, 3, 4];
        let model = TopicCounts::from_flat(3, 2, flat.clone()).unwrap();
        assert_eq!(model.as_flat(), flat.as_slice());
        assert_eq!(model.into_flat(), flat);
    }

    #[test]
    fn test_from_flat_shape() {
        assert_eq!(
            TopicCounts::from_flat(3, 2, vec![0; 7]),
            Err(LdaError::ModelShape { voc_size: 3, topic_num: 2, expected: 8, actual: 7 })
        );
    }

    #[test]
    fn test_increment_decrement() {
        let mut model = model();
        model.decrement(1, 0);
        model.increment(1, 1);
        assert_eq!(model.word_topic_count(1).as_slice(), &[0, 2]);
        assert_eq!(model.topic_total().as_slice(), &[2, 5]);
        assert!(model.is_consistent());
        assert_eq!(model.n_tokens(), 7);
    }

    #[test]
    fn test_add() {
        let model = model() + &model();
        assert_eq!(model.word_topic_count(2).as_slice(), &[0, 6]);
        assert_eq!(model.n_tokens(), 14);
        assert!(model.is_consistent());
    }
}
