use rand::Rng;

/// Draws `word_count` independent topics uniformly from `[0, topic_num)`.
///
/// Seeds the topic assignment of a document before its first Gibbs sweep.
///
/// # Example:
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::SmallRng;
/// use ldars::utils::random_assign;
///
/// let mut rng = SmallRng::seed_from_u64(42);
/// let topics = random_assign(10, 3, &mut rng);
/// assert_eq!(topics.len(), 10);
/// assert!(topics.iter().all(|&k| k < 3));
/// ```
pub fn random_assign(word_count: usize, topic_num: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..word_count).map(|_| rng.gen_range(0..topic_num)).collect()
}

/// Inverse-CDF lookup in an unnormalized categorical distribution.
///
/// Returns the smallest index `k` such that `weights[0] + .. + weights[k] > u`. A `u` that rounding
/// pushed to or past the total resolves to the last index.
///
/// # Arguments:
///
/// * `weights`: Non-negative unnormalized weights.
/// * `u`: A draw from `[0, sum(weights))`.
///
/// # Example:
/// ```
/// use ldars::utils::inverse_cdf_sample;
///
/// let weights = [1.0, 2.0, 3.0];
/// assert_eq!(inverse_cdf_sample(&weights, 0.0), 0);
/// assert_eq!(inverse_cdf_sample(&weights, 1.0), 1);
/// assert_eq!(inverse_cdf_sample(&weights, 2.9), 1);
/// assert_eq!(inverse_cdf_sample(&weights, 5.9), 2);
/// ```
pub fn inverse_cdf_sample(weights: &[f64], u: f64) -> usize {
    let mut cumsum = 0.0;
    for (k, &w) in weights.iter().enumerate() {
        cumsum += w;
        if cumsum > u {
            return k;
        }
    }
    weights.len().saturating_sub(1)
}

/// Draws an index proportionally to `weights`, whose sum is `total`.
pub fn categorical_sample(weights: &[f64], total: f64, rng: &mut impl Rng) -> usize {
    let u = rng.gen::<f64>() * total;
    inverse_cdf_sample(weights, u)
}


#[cfg(test)]
mod tests {
    use rand::prelude::StdRng;
    use rand::SeedableRng;
    use crate::utils::{categorical_sample, inverse_cdf_sample, random_assign, Iterutils};

    #[test]
    fn test_random_assign_uniform() {
        let mut rng = StdRng::seed_from_u64(42);
        let topics = random_assign(40_000, 4, &mut rng);
        for count in topics.into_iter().bincounts(4) {
            assert!((9_000..11_000).contains(&count));
        }
        assert!(random_assign(0, 4, &mut rng).is_empty());
    }

    #[test]
    fn test_inverse_cdf_boundaries() {
        let weights = [0.5, 0.0, 0.5];
        assert_eq!(inverse_cdf_sample(&weights, 0.49), 0);
        assert_eq!(inverse_cdf_sample(&weights, 0.5), 2);
        assert_eq!(inverse_cdf_sample(&weights, 1.0), 2);
    }

    #[test]
    fn test_categorical_sample_frequencies() {
        let mut rng = StdRng::seed_from_u64(7);
        let weights = [1.0, 3.0];
        let draws = (0..20_000)
            .map(|_| categorical_sample(&weights, 4.0, &mut rng))
            .bincounts(2);
        assert!((4_500..5_500).contains(&draws[0]));
        assert!((14_500..15_500).contains(&draws[1]));
    }

    #[test]
    fn test_categorical_sample_replay() {
        let weights = [0.2, 0.3, 0.5];
        let mut rng_a = StdRng::seed_from_u64(3);
        let mut rng_b = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(
                categorical_sample(&weights, 1.0, &mut rng_a),
                categorical_sample(&weights, 1.0, &mut rng_b),
            );
        }
    }
}
