use std::iter::Sum;
use std::ops::{Add, AddAssign};
use crate::data::Document;
use crate::error::{LdaError, LdaResult};
use crate::params::TopicCounts;

/// Partial word-topic counts gathered over a subset of the corpus.
///
/// Accumulating the topic assignments of every document and merging the partial states of all
/// partitions yields the model of the next iteration. Merging is an exact integer sum, so the
/// result does not depend on partition boundaries or merge order. A state that never accumulated
/// anything is the identity of the merge.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicCountStats {
    counts: Option<TopicCounts>,
}

impl TopicCountStats {
    /// Adds one count per token of `doc` to the topic it is assigned to.
    ///
    /// The state is initialized to an all-zero `(voc_size + 1) x topic_num` matrix on first use.
    ///
    /// # Arguments
    ///
    /// * `doc`: The document whose words and counts are accumulated.
    /// * `topic_assignment`: Topic of every token of `doc`, in [`Document::tokens`] order.
    /// * `voc_size`: The vocabulary size.
    /// * `topic_num`: The number of topics.
    pub fn accumulate(
        &mut self,
        doc: &Document,
        topic_assignment: &[usize],
        voc_size: usize,
        topic_num: usize,
    ) -> LdaResult<()> {
        doc.validate(voc_size)?;
        let word_count = doc.word_count();
        if topic_assignment.len() != word_count {
            return Err(LdaError::AssignmentLength {
                doc_id: doc.doc_id,
                expected: word_count,
                actual: topic_assignment.len(),
            });
        }
        if let Some(&topic) = topic_assignment.iter().find(|&&t| t >= topic_num) {
            return Err(LdaError::TopicOutOfRange { doc_id: doc.doc_id, topic, topic_num });
        }

        let counts = self.counts.get_or_insert_with(|| TopicCounts::zeros(voc_size, topic_num));
        if counts.voc_size() != voc_size || counts.topic_num() != topic_num {
            return Err(LdaError::ModelShape {
                voc_size,
                topic_num,
                expected: (voc_size + 1) * topic_num,
                actual: counts.as_flat().len(),
            });
        }

        for (word, &topic) in doc.tokens().zip(topic_assignment) {
            counts.increment(word, topic);
        }
        Ok(())
    }

    /// Whether nothing has been accumulated yet.
    pub fn is_empty(&self) -> bool {
        self.counts.is_none()
    }

    pub fn n_tokens(&self) -> i64 {
        self.counts.as_ref().map_or(0, TopicCounts::n_tokens)
    }

    /// Adds the counts of `rhs`, failing with [`LdaError::ModelShape`] if both states hold models of
    /// different shapes. `self` is left unchanged on failure.
    pub fn try_merge(&mut self, rhs: &TopicCountStats) -> LdaResult<()> {
        if let (Some(lhs), Some(rhs)) = (&self.counts, &rhs.counts) {
            if !lhs.same_shape(rhs) {
                return Err(LdaError::ModelShape {
                    voc_size: lhs.voc_size(),
                    topic_num: lhs.topic_num(),
                    expected: lhs.as_flat().len(),
                    actual: rhs.as_flat().len(),
                });
            }
        }
        *self += rhs;
        Ok(())
    }

    /// The merged counts are the new model; an empty state becomes the all-zero model.
    pub fn finalize(self, voc_size: usize, topic_num: usize) -> TopicCounts {
        self.counts.unwrap_or_else(|| TopicCounts::zeros(voc_size, topic_num))
    }
}

impl From<TopicCounts> for TopicCountStats {
    fn from(counts: TopicCounts) -> Self {
        Self { counts: Some(counts) }
    }
}

/// # Panics
///
/// If both states hold models of different shapes. Use [`TopicCountStats::try_merge`] when the
/// shapes are not known to agree.
impl<'a> AddAssign<&'a TopicCountStats> for TopicCountStats {
    fn add_assign(&mut self, rhs: &'a TopicCountStats) {
        if let Some(rhs) = &rhs.counts {
            match &mut self.counts {
                Some(lhs) => {
                    assert!(lhs.same_shape(rhs), "Cannot merge topic counts of different shapes");
                    *lhs += rhs;
                }
                None => self.counts = Some(rhs.clone()),
            }
        }
    }
}

impl<'a> Add<&'a TopicCountStats> for TopicCountStats {
    type Output = TopicCountStats;

    fn add(mut self, rhs: &'a TopicCountStats) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for TopicCountStats {
    fn sum<I: Iterator<Item=Self>>(mut iter: I) -> Self {
        let res = iter.next().unwrap_or_default();
        iter.fold(res, |acc, x| acc + &x)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::prelude::StdRng;
    use rand::SeedableRng;
    use crate::data::{Document, DocTopic};
    use crate::error::LdaError;
    use super::TopicCountStats;

    fn accumulate_all(docs: &[(Document, DocTopic)]) -> TopicCountStats {
        let mut stats = TopicCountStats::default();
        for (doc, doc_topic) in docs {
            stats.accumulate(doc, &doc_topic.topic_assignment, 5, 3).unwrap();
        }
        stats
    }

    fn arb_corpus() -> impl Strategy<Value=(Vec<(Document, DocTopic)>, usize)> {
        let doc = prop::collection::btree_map(0usize..5, 1u32..4, 0..5);
        (prop::collection::vec(doc, 0..8), any::<u64>(), any::<prop::sample::Index>())
            .prop_map(|(docs, seed, split)| {
                let mut rng = StdRng::seed_from_u64(seed);
                let docs: Vec<_> = docs.into_iter()
                    .enumerate()
                    .map(|(i, words)| {
                        let doc = Document::new(i as i64, words.keys().copied().collect(), words.values().copied().collect());
                        let doc_topic = DocTopic::random(&doc, 3, &mut rng);
                        (doc, doc_topic)
                    })
                    .collect();
                let split = split.index(docs.len() + 1);
                (docs, split)
            })
    }

    proptest! {
        #[test]
        fn prop_merge_partition_independent((docs, split) in arb_corpus()) {
            let (g1, g2) = docs.split_at(split);
            let whole = accumulate_all(&docs).finalize(5, 3);
            let forward = (accumulate_all(g1) + &accumulate_all(g2)).finalize(5, 3);
            let backward = (accumulate_all(g2) + &accumulate_all(g1)).finalize(5, 3);

            prop_assert_eq!(&forward, &whole);
            prop_assert_eq!(&backward, &whole);
            prop_assert!(whole.is_consistent());
        }

        #[test]
        fn prop_merge_associative((docs, split) in arb_corpus()) {
            let (head, tail) = docs.split_at(split);
            let (g2, g3) = tail.split_at(tail.len() / 2);
            let (a, b, c) = (accumulate_all(head), accumulate_all(g2), accumulate_all(g3));

            let left = (a.clone() + &b) + &c;
            let right = a + &(b + &c);
            prop_assert_eq!(left, right);
        }
    }

    #[test]
    fn test_accumulate() {
        let doc_a = Document::new(0, vec![0, 1], vec![2, 1]);
        let doc_b = Document::new(1, vec![1, 2], vec![1, 3]);

        let mut stats = TopicCountStats::default();
        assert!(stats.is_empty());
        stats.accumulate(&doc_a, &[0, 1, 1], 3, 2).unwrap();
        stats.accumulate(&doc_b, &[0, 1, 1, 0], 3, 2).unwrap();
        assert_eq!(stats.n_tokens(), 7);

        let model = stats.finalize(3, 2);
        assert_eq!(model.word_topic_count(0).as_slice(), &[1, 1]);
        assert_eq!(model.word_topic_count(1).as_slice(), &[1, 1]);
        assert_eq!(model.word_topic_count(2).as_slice(), &[1, 2]);
        assert_eq!(model.topic_total().as_slice(), &[3, 4]);
    }

    #[test]
    fn test_accumulate_errors() {
        let doc = Document::new(3, vec![0, 1], vec![2, 1]);
        let mut stats = TopicCountStats::default();
        assert_eq!(
            stats.accumulate(&doc, &[0, 1], 3, 2),
            Err(LdaError::AssignmentLength { doc_id: 3, expected: 3, actual: 2 })
        );
        assert_eq!(
            stats.accumulate(&doc, &[0, 1, 2], 3, 2),
            Err(LdaError::TopicOutOfRange { doc_id: 3, topic: 2, topic_num: 2 })
        );
        assert!(stats.is_empty());

        stats.accumulate(&doc, &[0, 1, 1], 3, 2).unwrap();
        assert!(matches!(stats.accumulate(&doc, &[0, 1, 1], 4, 2), Err(LdaError::ModelShape { .. })));
    }

    #[test]
    fn test_empty_identity() {
        let doc = Document::new(0, vec![2], vec![4]);
        let mut stats = TopicCountStats::default();
        stats.accumulate(&doc, &[1, 1, 0, 1], 3, 2).unwrap();

        assert_eq!(TopicCountStats::default() + &stats, stats);
        assert_eq!(stats.clone() + &TopicCountStats::default(), stats);
        assert_eq!(vec![TopicCountStats::default(), stats.clone()].into_iter().sum::<TopicCountStats>(), stats);
        assert_eq!(Vec::<TopicCountStats>::new().into_iter().sum::<TopicCountStats>().finalize(3, 2).n_tokens(), 0);
    }

    #[test]
    fn test_try_merge_shape() {
        let mut small = TopicCountStats::default();
        small.accumulate(&Document::new(0, vec![2], vec![2]), &[1, 0], 3, 2).unwrap();
        let mut large = TopicCountStats::default();
        large.accumulate(&Document::new(1, vec![4], vec![1]), &[1], 5, 2).unwrap();

        let before = small.clone();
        assert!(matches!(small.try_merge(&large), Err(LdaError::ModelShape { expected: 8, actual: 12, .. })));
        assert_eq!(small, before);

        small.try_merge(&TopicCountStats::default()).unwrap();
        small.try_merge(&before).unwrap();
        assert_eq!(small.n_tokens(), 4);
    }
}
