//! Utility functions for Bloom filters

use crate::config::FilterLimits;

/// False positive rate after `n` insertions: `(1 - e^(-k*n/m))^k`
///
/// Returns 0 for an empty or degenerate filter.
pub fn false_positive_rate(m: u32, n: u32, k: u8) -> f64 {
    if m == 0 || n == 0 || k == 0 {
        return 0.0;
    }

    let k = f64::from(k);
    let n = f64::from(n);
    let m = f64::from(m);

    let inner = 1.0 - (-k * n / m).exp();
    inner.powf(k).clamp(0.0, 1.0)
}

/// Suggested Bloom filter parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BloomParameters {
    pub num_bits: u32,
    pub num_hashes: u8,
    pub expected_fpr: f64,
}

/// Calculate optimal Bloom filter parameters within the given limits
pub fn optimal_bloom_parameters(
    expected_elements: u32,
    desired_fpr: f64,
    limits: &FilterLimits,
) -> BloomParameters {
    if expected_elements == 0 || !(desired_fpr > 0.0 && desired_fpr < 1.0) {
        return BloomParameters {
            num_bits: 1,
            num_hashes: 1,
            expected_fpr: 0.0,
        };
    }

    let n = f64::from(expected_elements);

    // Optimal number of bits: m = -n * ln(p) / (ln(2))^2
    let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
    let optimal_bits = (-n * desired_fpr.ln() / ln2_squared).ceil();
    let num_bits = optimal_bits.clamp(1.0, f64::from(limits.max_filter_bits.max(1))) as u32;

    // Optimal number of hash functions: k = (m/n) * ln(2)
    let optimal_hashes = ((f64::from(num_bits) / n) * std::f64::consts::LN_2).round();
    let num_hashes = optimal_hashes.clamp(1.0, f64::from(limits.max_hashes.max(1))) as u8;

    BloomParameters {
        num_bits,
        num_hashes,
        expected_fpr: false_positive_rate(num_bits, expected_elements, num_hashes),
    }
}
