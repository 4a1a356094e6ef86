use std::ops::Range;

pub trait Iterutils : Iterator {
    /// Counts how many times each value in `[0, n_bins)` occurs.
    ///
    /// # Example:
    /// ```
    /// use ldars::utils::Iterutils;
    ///
    /// let counts = vec![0usize, 2, 2, 1, 2].into_iter().bincounts(4);
    /// assert_eq!(counts, vec![1, 1, 3, 0]);
    /// ```
    fn bincounts(self, n_bins: usize) -> Vec<usize>
        where
            Self: Sized,
            Self::Item: Into<usize>,
    {
        let mut counts = vec![0; n_bins];
        self.for_each(|item| counts[item.into()] += 1);
        counts
    }
}

impl<T: ?Sized> Iterutils for T where T: Iterator { }

/// Splits `0..n_items` into at most `n_chunks` contiguous, non-overlapping ranges of near equal size.
///
/// # Arguments:
///
/// * `n_items`: The number of items to split.
/// * `n_chunks`: The maximum number of chunks.
///
/// # Returns:
///
/// The ranges in order, empty ranges are omitted.
///
/// # Example:
/// ```
/// use ldars::utils::chunk_ranges;
///
/// assert_eq!(chunk_ranges(10, 3), vec![0..4, 4..8, 8..10]);
/// assert_eq!(chunk_ranges(2, 4), vec![0..1, 1..2]);
/// assert!(chunk_ranges(0, 4).is_empty());
/// ```
pub fn chunk_ranges(n_items: usize, n_chunks: usize) -> Vec<Range<usize>> {
    let chunk_size = (n_items as f64 / n_chunks.max(1) as f64).ceil() as usize;
    (0..n_items)
        .step_by(chunk_size.max(1))
        .map(|start| start..std::cmp::min(start + chunk_size, n_items))
        .collect()
}
