//! Stationarity transforms and their inverses.
//!
//! The walk-forward forecaster works on `diff(ln(replicas))`; the seasonal
//! forecaster works on `(1 - B)^d (1 - B^m)^D y`. Both need to map model
//! output back to replica counts, so every forward transform here has an
//! exact inverse.

/// Keep only strictly positive values (the logarithm is undefined at zero).
pub fn positive_only(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| *v > 0.0).collect()
}

/// Natural logarithm of every value.
pub fn log(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.ln()).collect()
}

/// Exponential of every value.
pub fn exp(values: &[f64]) -> Vec<f64> {
    values.iter().map(|v| v.exp()).collect()
}

/// First differences. The leading (undefined) difference is dropped, so
/// the output is one element shorter than the input.
pub fn difference(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Inverse of [`difference`]: running sum of `diffs` seeded with `seed`.
///
/// The output starts with `seed` and is one element longer than `diffs`.
pub fn cumulative_sum(seed: f64, diffs: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(diffs.len() + 1);
    let mut acc = seed;
    out.push(acc);
    for d in diffs {
        acc += d;
        out.push(acc);
    }
    out
}

/// Lag-`lag` differences, `y[t] - y[t - lag]`. Drops the first `lag` values.
pub fn seasonal_difference(values: &[f64], lag: usize) -> Vec<f64> {
    if lag == 0 || values.len() <= lag {
        return Vec::new();
    }
    (lag..values.len()).map(|t| values[t] - values[t - lag]).collect()
}

/// Coefficients of the combined differencing operator `(1 - B)^d (1 - B^m)^D`.
///
/// Returned as the polynomial `[1, c1, c2, ...]` where index `i` is the
/// coefficient of `B^i`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = poly_mul(&poly, &seasonal);
        }
    }
    poly
}

/// Apply a differencing polynomial. Output length is `len - (poly.len() - 1)`.
pub fn apply_differencing(values: &[f64], poly: &[f64]) -> Vec<f64> {
    let order = poly.len().saturating_sub(1);
    if values.len() <= order {
        return Vec::new();
    }
    (order..values.len())
        .map(|t| poly.iter().enumerate().map(|(i, c)| c * values[t - i]).sum())
        .collect()
}

/// Inverse of [`apply_differencing`] for values past the end of `history`.
///
/// Given the undifferenced `history` and differenced values `future`
/// continuing it, returns the undifferenced continuation.
pub fn integrate(history: &[f64], future: &[f64], poly: &[f64]) -> Vec<f64> {
    let mut extended = history.to_vec();
    for w in future {
        let t = extended.len();
        let carried: f64 = poly
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(i, _)| *i <= t)
            .map(|(i, c)| -c * extended[t - i])
            .sum();
        extended.push(w + carried);
    }
    extended.split_off(history.len())
}

/// Multiply two polynomials given as coefficient vectors.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64]) {
        assert_eq!(a.len(), b.len(), "{a:?} vs {b:?}");
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-9, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn positive_only_drops_zeros() {
        assert_eq!(positive_only(&[0.0, 3.0, 0.0, 4.0]), vec![3.0, 4.0]);
    }

    #[test]
    fn difference_drops_leading_value() {
        assert_eq!(difference(&[1.0, 4.0, 9.0]), vec![3.0, 5.0]);
        assert!(difference(&[1.0]).is_empty());
    }

    #[test]
    fn log_difference_round_trip() {
        let replicas = [3.0, 5.0, 8.0, 8.0, 2.0, 13.0];
        let logs = log(&replicas);
        let diffs = difference(&logs);
        let rebuilt = exp(&cumulative_sum(logs[0], &diffs));
        assert_close(&rebuilt, &replicas);
    }

    #[test]
    fn seasonal_difference_uses_lag() {
        let y = [1.0, 2.0, 3.0, 11.0, 12.0, 13.0];
        assert_eq!(seasonal_difference(&y, 3), vec![10.0, 10.0, 10.0]);
        assert!(seasonal_difference(&y, 6).is_empty());
    }

    #[test]
    fn differencing_polynomial_expands_operators() {
        // (1 - B)(1 - B^2) = 1 - B - B^2 + B^3
        assert_close(&differencing_polynomial(1, 1, 2), &[1.0, -1.0, -1.0, 1.0]);
        assert_close(&differencing_polynomial(0, 0, 12), &[1.0]);
    }

    #[test]
    fn apply_differencing_matches_composition() {
        let y = [4.0, 7.0, 1.0, 9.0, 3.0, 8.0, 6.0];
        let poly = differencing_polynomial(1, 1, 2);
        let direct = apply_differencing(&y, &poly);
        let composed = difference(&seasonal_difference(&y, 2));
        assert_close(&direct, &composed);
    }

    #[test]
    fn integrate_inverts_differencing() {
        let y = [4.0, 7.0, 1.0, 9.0, 3.0, 8.0, 6.0, 2.0, 5.0];
        let poly = differencing_polynomial(1, 1, 3);
        let w = apply_differencing(&y, &poly);
        let split = 5;
        let tail_w = &w[split - (poly.len() - 1)..];
        let rebuilt = integrate(&y[..split], tail_w, &poly);
        assert_close(&rebuilt, &y[split..]);
    }
}
