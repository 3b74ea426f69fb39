//! Two-sample Mann-Whitney U test
//!
//! Two-sided p-value from the tie-corrected normal approximation with
//! continuity correction. Degenerate inputs (an empty sample, or zero
//! tie-corrected variance because every value is identical) yield p = 1,
//! the fail-to-reject answer, rather than an error, so callers can treat
//! the result as a plain probability.

use statrs::distribution::{ContinuousCDF, Normal};

/// Average ranks of the combined samples, ties sharing their mean rank
fn ranks(combined: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..combined.len()).collect();
    order.sort_by(|&a, &b| {
        combined[a]
            .partial_cmp(&combined[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut ranks = vec![0.0; combined.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && combined[order[j + 1]] == combined[order[i]] {
            j += 1;
        }
        // Ranks are 1-based; a tie group gets its average rank
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Sum of `t^3 - t` over tie group sizes, for the variance correction
fn tie_term(combined: &[f64]) -> f64 {
    let mut sorted = combined.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut term = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i;
        while j + 1 < sorted.len() && sorted[j + 1] == sorted[i] {
            j += 1;
        }
        let t = (j - i + 1) as f64;
        term += t * t * t - t;
        i = j + 1;
    }
    term
}

/// Two-sided Mann-Whitney U p-value for `a` vs `b`
///
/// Symmetric in its inputs. Returns 1.0 when the test is undefined.
pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> f64 {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return 1.0;
    }

    let combined: Vec<f64> = a.iter().chain(b.iter()).copied().collect();
    let ranks = ranks(&combined);
    let r1: f64 = ranks[..n1].iter().sum();

    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;
    let big_u = u1.max(u2);

    let n = n1f + n2f;
    let variance = n1f * n2f / 12.0 * ((n + 1.0) - tie_term(&combined) / (n * (n - 1.0)));
    if variance <= 0.0 {
        // Every observation identical; the test is undefined
        return 1.0;
    }

    let mean = n1f * n2f / 2.0;
    let z = (big_u - mean - 0.5) / variance.sqrt();
    let normal = match Normal::new(0.0, 1.0) {
        Ok(normal) => normal,
        Err(_) => return 1.0,
    };
    (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0)
}
