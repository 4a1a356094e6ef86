use tracing::trace;
use crate::error::LdaResult;
use crate::params::{ModelOptions, TopicCounts};

/// Identifies one scan of one partition during one iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanKey {
    pub iteration: usize,
    pub partition: usize,
}

impl ScanKey {
    pub fn new(iteration: usize, partition: usize) -> Self {
        Self { iteration, partition }
    }
}

/// Partition-local mutable copy of the broadcast model.
///
/// The first document of a scan decodes the flat model into a private [`TopicCounts`]; every
/// following document of the same scan reuses and mutates that copy, so the counts drift with the
/// resampled assignments of the partition. A different key discards the held copy and decodes
/// the model afresh, so no state leaks between iterations or partitions.
#[derive(Debug, Clone, Default)]
pub struct ModelCache {
    entry: Option<(ScanKey, TopicCounts)>,
    n_decodes: usize,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the scratch model of the scan identified by `key`, decoding `flat` when the cache is
    /// empty or holds the model of another scan.
    ///
    /// # Arguments
    ///
    /// * `key`: The scan the caller belongs to.
    /// * `options`: Dimensions used to decode `flat`.
    /// * `flat`: Broadcast model in row-major `(voc_size + 1) x topic_num` layout.
    pub fn acquire(
        &mut self,
        key: ScanKey,
        options: &ModelOptions,
        flat: &[i64],
    ) -> LdaResult<&mut TopicCounts> {
        let entry = match self.entry.take() {
            Some((held, model)) if held == key => (held, model),
            _ => {
                let model = TopicCounts::from_flat_slice(options.voc_size, options.topic_num, flat)?;
                trace!(iteration = key.iteration, partition = key.partition, "decoded model");
                self.n_decodes += 1;
                (key, model)
            }
        };
        let (_, model) = self.entry.insert(entry);
        Ok(model)
    }

    /// Empties the cache, handing back the scratch model if it belongs to `key`.
    pub fn release(&mut self, key: ScanKey) -> Option<TopicCounts> {
        match self.entry.take() {
            Some((held, model)) if held == key => Some(model),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<ScanKey> {
        self.entry.as_ref().map(|(key, _)| *key)
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }

    /// Number of times a broadcast model was decoded.
    pub fn n_decodes(&self) -> usize {
        self.n_decodes
    }
}
