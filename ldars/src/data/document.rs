use itertools::izip;
use rand::Rng;
#[cfg(feature = "serde")]
use serde::{Serialize, Deserialize};
use crate::error::{LdaError, LdaResult};
use crate::utils::{random_assign, Iterutils};

/// A document in bag-of-words form.
///
/// `words` holds distinct vocabulary ids and `counts` the number of occurrences of each of them.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: i64,
    pub words: Vec<usize>,
    pub counts: Vec<u32>,
}

impl Document {
    pub fn new(doc_id: i64, words: Vec<usize>, counts: Vec<u32>) -> Self {
        Self { doc_id, words, counts }
    }

    /// Number of token occurrences, `sum(counts)`.
    pub fn word_count(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.word_count() == 0
    }

    /// Iterates over every token occurrence in expansion order: `counts[0]` times `words[0]`, then
    /// `counts[1]` times `words[1]`, and so on.
    pub fn tokens(&self) -> impl Iterator<Item=usize> + '_ {
        izip!(&self.words, &self.counts)
            .flat_map(|(&word, &count)| std::iter::repeat(word).take(count as usize))
    }

    /// Checks the document shape against a vocabulary of `voc_size` words.
    pub fn validate(&self, voc_size: usize) -> LdaResult<()> {
        if self.words.len() != self.counts.len() {
            return Err(LdaError::LengthMismatch {
                doc_id: self.doc_id,
                words: self.words.len(),
                counts: self.counts.len(),
            });
        }
        for (&word, &count) in izip!(&self.words, &self.counts) {
            if word >= voc_size {
                return Err(LdaError::WordOutOfRange { doc_id: self.doc_id, word, voc_size });
            }
            if count == 0 {
                return Err(LdaError::ZeroCount { doc_id: self.doc_id, word });
            }
        }
        Ok(())
    }
}

/// Topic state of a single document.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocTopic {
    /// Number of tokens of the document assigned to each topic
    pub topic_count: Vec<i64>,
    /// Topic of every token occurrence, in [`Document::tokens`] order
    pub topic_assignment: Vec<usize>,
}

impl DocTopic {
    /// Builds the topic state from an assignment, counting tokens per topic.
    pub fn from_assignment(topic_assignment: Vec<usize>, topic_num: usize) -> Self {
        let topic_count = topic_assignment.iter()
            .copied()
            .bincounts(topic_num)
            .into_iter()
            .map(|c| c as i64)
            .collect();
        Self { topic_count, topic_assignment }
    }

    /// Topic state of a document without tokens.
    pub fn empty(topic_num: usize) -> Self {
        Self { topic_count: vec![0; topic_num], topic_assignment: Vec::new() }
    }

    /// Uniformly random initial assignment for every token of `doc`.
    pub fn random(doc: &Document, topic_num: usize, rng: &mut impl Rng) -> Self {
        Self::from_assignment(random_assign(doc.word_count(), topic_num, rng), topic_num)
    }

    /// Checks `sum(topic_count) == word_count == len(topic_assignment)` and the topic ranges.
    pub fn validate(&self, doc: &Document, topic_num: usize) -> LdaResult<()> {
        let doc_id = doc.doc_id;
        let word_count = doc.word_count();
        if self.topic_count.len() != topic_num {
            return Err(LdaError::TopicCountLength { doc_id, expected: topic_num, actual: self.topic_count.len() });
        }
        if self.topic_assignment.len() != word_count {
            return Err(LdaError::AssignmentLength {
                doc_id,
                expected: word_count,
                actual: self.topic_assignment.len(),
            });
        }
        let total = self.topic_count.iter().sum::<i64>();
        if total != word_count as i64 || self.topic_count.iter().any(|&c| c < 0) {
            return Err(LdaError::TopicCountSum { doc_id, expected: word_count, actual: total });
        }
        if let Some(&topic) = self.topic_assignment.iter().find(|&&t| t >= topic_num) {
            return Err(LdaError::TopicOutOfRange { doc_id, topic, topic_num });
        }
        Ok(())
    }
}

/// Per-document output of training and prediction.
///
/// Serializes flat as `doc_id, words, counts, word_count, topic_count, topic_assignment`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicDocument {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub document: Document,
    pub word_count: usize,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub doc_topic: DocTopic,
}

impl TopicDocument {
    pub fn new(document: Document, doc_topic: DocTopic) -> Self {
        Self { word_count: document.word_count(), document, doc_topic }
    }

    pub fn doc_id(&self) -> i64 {
        self.document.doc_id
    }

    /// Splits the output back into the document and its topic state.
    pub fn into_parts(self) -> (Document, DocTopic) {
        (self.document, self.doc_topic)
    }

    /// For every distinct word, the topic most of its occurrences are assigned to.
    /// Ties resolve to the lowest topic id. Fails if the topic state does not match the document.
    ///
    /// # Example
    /// ```
    /// use ldars::data::{Document, DocTopic, TopicDocument};
    ///
    /// let doc = Document::new(7, vec![4, 9], vec![3, 1]);
    /// let doc_topic = DocTopic::from_assignment(vec![1, 0, 1, 2], 3);
    /// let output = TopicDocument::new(doc, doc_topic);
    /// assert_eq!(output.word_topic_mapping().unwrap(), vec![(4, 1), (9, 2)]);
    /// ```
    pub fn word_topic_mapping(&self) -> LdaResult<Vec<(usize, usize)>> {
        let n_topics = self.doc_topic.topic_count.len();
        self.doc_topic.validate(&self.document, n_topics)?;
        let assignment = &self.doc_topic.topic_assignment;
        let mut offset = 0;
        let mut mapping = Vec::with_capacity(self.document.words.len());
        for (&word, &count) in izip!(&self.document.words, &self.document.counts) {
            let end = offset + count as usize;
            let bins = assignment[offset..end].iter().copied().bincounts(n_topics);
            let topic = bins.iter()
                .enumerate()
                .fold((0, 0), |best, (k, &c)| if c > best.1 { (k, c) } else { best })
                .0;
            mapping.push((word, topic));
            offset = end;
        }
        Ok(mapping)
    }
}
