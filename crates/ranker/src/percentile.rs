//! Rank-based percentile normalization.
//!
//! Signals arrive on very different scales (returns in percent, volatility
//! in percent, news in decayed-count units). A rank transform puts them on
//! a common [0, 1] scale and bounds the influence of outliers.

/// Neutral value assigned when the population has fewer than two members.
pub const NEUTRAL: f64 = 0.5;

/// Convert raw values to rank percentiles in [0, 1].
///
/// Indices are stable-sorted by value ascending and each index receives
/// `rank / (n - 1)`. Equal values keep their input order, so among ties
/// the earlier element gets the lower percentile. With fewer than two
/// values every output is [`NEUTRAL`].
///
/// `-0.0` and `0.0` are equal values and tie. NaN sorts above every
/// number and is ranked last.
///
/// # Example
///
/// ```
/// use ranker::to_percentile;
///
/// assert_eq!(to_percentile(&[-0.02, 0.0, 0.05]), vec![0.0, 0.5, 1.0]);
/// assert_eq!(to_percentile(&[7.0]), vec![0.5]);
/// ```
pub fn to_percentile(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    if n <= 1 {
        return vec![NEUTRAL; n];
    }

    let mut order: Vec<usize> = (0..n).collect();
    // Adding 0.0 folds -0.0 into 0.0 before the total order is applied.
    order.sort_by(|&a, &b| (values[a] + 0.0).total_cmp(&(values[b] + 0.0)));

    let denom = (n - 1) as f64;
    let mut out = vec![0.0; n];
    for (rank, idx) in order.into_iter().enumerate() {
        out[idx] = rank as f64 / denom;
    }
    out
}

/// Stability framing of a risk signal: `1 - percentile`.
pub fn to_stability(values: &[f64]) -> Vec<f64> {
    to_percentile(values).into_iter().map(|p| 1.0 - p).collect()
}
