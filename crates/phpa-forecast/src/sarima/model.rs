//! Seasonal ARIMA model: fitting, incremental update, and forecasting.
//!
//! The model for the differenced series `w = (1 - B)^d (1 - B^m)^D y` is
//!
//! ```text
//! φ(B) Φ(B^m) w_t = θ(B) Θ(B^m) e_t
//! ```
//!
//! Coefficients are estimated by conditional sum of squares with zero
//! pre-sample values and residuals, so every order is scored over the whole
//! differenced series and AIC values of different orders are comparable.
//! The optimiser works on unconstrained parameters; each coefficient is
//! `tanh(raw)`, keeping it inside `(-1, 1)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use phpa_core::transform;

use super::optimize::nelder_mead;
use crate::error::{ForecastError, ForecastResult};

/// Residual variance floor, so a perfectly fitted series keeps a finite AIC.
const SIGMA2_FLOOR: f64 = 1e-10;

/// Two-sided 95 % normal quantile.
const Z_95: f64 = 1.959_963_984_540_054;

/// Convergence tolerance on the sum of squares.
const FIT_TOLERANCE: f64 = 1e-10;

/// Model orders `(p, d, q)(P, D, Q)[m]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SarimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
    pub period: usize,
}

impl SarimaOrder {
    /// Number of estimated ARMA coefficients.
    pub fn n_params(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q
    }

    pub fn is_seasonal(&self) -> bool {
        self.seasonal_p + self.seasonal_d + self.seasonal_q > 0
    }

    /// Shortest series this order can be fitted on.
    pub fn min_observations(&self) -> usize {
        let differencing = self.d + self.seasonal_d * self.seasonal_lag();
        let ar_lag = self.p + self.seasonal_p * self.seasonal_lag();
        differencing + ar_lag + self.n_params() + 1
    }

    fn seasonal_lag(&self) -> usize {
        if self.is_seasonal() { self.period } else { 0 }
    }

    /// Coefficients of the combined differencing operator.
    pub fn differencing(&self) -> Vec<f64> {
        transform::differencing_polynomial(self.d, self.seasonal_d, self.seasonal_lag())
    }
}

impl fmt::Display for SarimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SARIMA({},{},{})({},{},{})[{}]",
            self.p, self.d, self.q, self.seasonal_p, self.seasonal_d, self.seasonal_q, self.period
        )
    }
}

/// Expanded lag polynomials of the ARMA part.
///
/// `ar[i]` and `ma[j]` are the coefficients of lag `i` / `j` in
/// `w_t = Σ ar[i] w_{t-i} + e_t + Σ ma[j] e_{t-j}`; index 0 is unused.
#[derive(Debug, Clone, PartialEq)]
struct LagPolynomials {
    ar: Vec<f64>,
    ma: Vec<f64>,
}

impl LagPolynomials {
    fn new(order: &SarimaOrder, raw: &[f64]) -> Self {
        let coeff: Vec<f64> = raw.iter().map(|r| r.tanh()).collect();
        let (phi, rest) = coeff.split_at(order.p);
        let (theta, rest) = rest.split_at(order.q);
        let (seasonal_phi, seasonal_theta) = rest.split_at(order.seasonal_p);
        let m = order.seasonal_lag();

        // (1 - Σ φ_i B^i)(1 - Σ Φ_k B^{mk})
        let mut ar_poly = vec![0.0; order.p + 1];
        ar_poly[0] = 1.0;
        for (i, c) in phi.iter().enumerate() {
            ar_poly[i + 1] = -c;
        }
        let mut seasonal_ar = vec![0.0; m * order.seasonal_p + 1];
        seasonal_ar[0] = 1.0;
        for (k, c) in seasonal_phi.iter().enumerate() {
            seasonal_ar[m * (k + 1)] = -c;
        }
        let ar_full = transform::poly_mul(&ar_poly, &seasonal_ar);

        // (1 + Σ θ_j B^j)(1 + Σ Θ_k B^{mk})
        let mut ma_poly = vec![0.0; order.q + 1];
        ma_poly[0] = 1.0;
        for (j, c) in theta.iter().enumerate() {
            ma_poly[j + 1] = *c;
        }
        let mut seasonal_ma = vec![0.0; m * order.seasonal_q + 1];
        seasonal_ma[0] = 1.0;
        for (k, c) in seasonal_theta.iter().enumerate() {
            seasonal_ma[m * (k + 1)] = *c;
        }
        let ma_full = transform::poly_mul(&ma_poly, &seasonal_ma);

        Self {
            ar: ar_full.iter().enumerate().map(|(i, c)| if i == 0 { 0.0 } else { -c }).collect(),
            ma: ma_full.iter().enumerate().map(|(j, c)| if j == 0 { 0.0 } else { *c }).collect(),
        }
    }

    fn max_ar_lag(&self) -> usize {
        self.ar.len().saturating_sub(1)
    }

    /// Conditional residuals of `w`, one per observation. Values before
    /// the start of the series count as zero.
    fn residuals(&self, w: &[f64]) -> Vec<f64> {
        let mut e = vec![0.0; w.len()];
        for t in 0..w.len() {
            let mut value = w[t];
            for (i, c) in self.ar.iter().enumerate().skip(1) {
                if i <= t {
                    value -= c * w[t - i];
                }
            }
            for (j, c) in self.ma.iter().enumerate().skip(1) {
                if j <= t {
                    value -= c * e[t - j];
                }
            }
            e[t] = value;
        }
        e
    }

    /// ψ-weights of the full model including differencing, for forecast variance.
    fn psi_weights(&self, differencing: &[f64], horizon: usize) -> Vec<f64> {
        let ar_poly: Vec<f64> = self
            .ar
            .iter()
            .enumerate()
            .map(|(i, c)| if i == 0 { 1.0 } else { -c })
            .collect();
        let phi_star: Vec<f64> = transform::poly_mul(&ar_poly, differencing)
            .iter()
            .map(|c| -c)
            .collect();

        let mut psi = vec![0.0; horizon];
        for j in 0..horizon {
            let mut value = if j == 0 { 1.0 } else { self.ma.get(j).copied().unwrap_or(0.0) };
            for i in 1..=j.min(phi_star.len().saturating_sub(1)) {
                value += phi_star[i] * psi[j - i];
            }
            psi[j] = value;
        }
        psi
    }
}

/// Conditional sum of squares over every residual of `w`.
///
/// `None` when the differenced series is too short for this order.
fn css(order: &SarimaOrder, raw: &[f64], w: &[f64]) -> Option<f64> {
    let polys = LagPolynomials::new(order, raw);
    if w.len() < polys.max_ar_lag() + order.n_params() + 1 {
        return None;
    }
    let sse: f64 = polys.residuals(w).iter().map(|v| v * v).sum();
    Some(if sse.is_finite() { sse } else { f64::INFINITY })
}

/// Residual variance and AIC of a fit with `k` coefficients.
fn information_criterion(sse: f64, n: usize, k: usize) -> (f64, f64) {
    let sigma2 = (sse / n as f64).max(SIGMA2_FLOOR);
    let n = n as f64;
    let aic = n * (2.0 * std::f64::consts::PI * sigma2).ln() + n + 2.0 * (k as f64 + 1.0);
    (sigma2, aic)
}

/// Point forecasts with 95 % confidence intervals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeasonalForecast {
    pub mean: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// A fitted seasonal model together with the history it was fitted on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SarimaModel {
    pub order: SarimaOrder,
    /// Unconstrained parameters in `[φ.., θ.., Φ.., Θ..]` order.
    pub raw_params: Vec<f64>,
    pub sigma2: f64,
    pub aic: f64,
    /// Observations in chronological order.
    pub observations: Vec<f64>,
    /// Number of incremental updates applied since training.
    pub updates: u64,
}

impl SarimaModel {
    /// Fit `order` on `observations`, starting from `start` (zeros when absent).
    pub fn fit(
        order: SarimaOrder,
        observations: &[f64],
        start: Option<&[f64]>,
        max_iter: usize,
    ) -> ForecastResult<Self> {
        let w = transform::apply_differencing(observations, &order.differencing());
        let k = order.n_params();
        let start = match start {
            Some(s) if s.len() == k => s.to_vec(),
            _ => vec![0.0; k],
        };

        if css(&order, &start, &w).is_none() {
            return Err(ForecastError::ModelFit(format!(
                "{order} needs more than {} observations",
                observations.len()
            )));
        }

        let objective = |raw: &[f64]| css(&order, raw, &w).unwrap_or(f64::INFINITY);
        let minimum = nelder_mead(objective, &start, max_iter, FIT_TOLERANCE);

        let sse = css(&order, &minimum.x, &w)
            .ok_or_else(|| ForecastError::ModelFit(format!("{order} became infeasible")))?;
        if !sse.is_finite() {
            return Err(ForecastError::ModelFit(format!("{order} residuals diverged")));
        }
        let (sigma2, aic) = information_criterion(sse, w.len(), k);

        Ok(Self {
            order,
            raw_params: minimum.x,
            sigma2,
            aic,
            observations: observations.to_vec(),
            updates: 0,
        })
    }

    /// Fitted coefficients in `[φ.., θ.., Φ.., Θ..]` order.
    pub fn coefficients(&self) -> Vec<f64> {
        self.raw_params.iter().map(|r| r.tanh()).collect()
    }

    /// Append `new_observations` and refresh the coefficients from their
    /// current values without repeating the order search.
    ///
    /// At most `history_limit` observations are retained, but never fewer
    /// than [`SarimaOrder::min_observations`].
    pub fn update(
        &mut self,
        new_observations: &[f64],
        max_iter: usize,
        history_limit: usize,
    ) -> ForecastResult<()> {
        let keep = history_limit.max(self.order.min_observations());
        let mut observations = self.observations.clone();
        observations.extend_from_slice(new_observations);
        if observations.len() > keep {
            observations.drain(..observations.len() - keep);
        }

        let refreshed = Self::fit(self.order, &observations, Some(&self.raw_params), max_iter)?;
        self.raw_params = refreshed.raw_params;
        self.sigma2 = refreshed.sigma2;
        self.aic = refreshed.aic;
        self.observations = refreshed.observations;
        self.updates += 1;
        Ok(())
    }

    /// Forecast `steps` observations past the end of the history.
    pub fn forecast(&self, steps: usize) -> SeasonalForecast {
        let differencing = self.order.differencing();
        let polys = LagPolynomials::new(&self.order, &self.raw_params);
        let w = transform::apply_differencing(&self.observations, &differencing);
        let mut e = polys.residuals(&w);

        let mut w_ext = w;
        for _ in 0..steps {
            let t = w_ext.len();
            let mut value = 0.0;
            for (i, c) in polys.ar.iter().enumerate().skip(1) {
                if i <= t {
                    value += c * w_ext[t - i];
                }
            }
            for (j, c) in polys.ma.iter().enumerate().skip(1) {
                if j <= t {
                    value += c * e[t - j];
                }
            }
            w_ext.push(value);
            e.push(0.0);
        }
        let future_w = &w_ext[w_ext.len() - steps..];
        let mean = transform::integrate(&self.observations, future_w, &differencing);

        let psi = polys.psi_weights(&differencing, steps);
        let mut cumulative = 0.0;
        let mut lower = Vec::with_capacity(steps);
        let mut upper = Vec::with_capacity(steps);
        for (h, point) in mean.iter().enumerate() {
            cumulative += psi[h] * psi[h];
            let half_width = Z_95 * (self.sigma2 * cumulative).sqrt();
            lower.push(point - half_width);
            upper.push(point + half_width);
        }

        SeasonalForecast { mean, lower, upper }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(p: usize, q: usize, sp: usize, sq: usize, seasonal_d: usize) -> SarimaOrder {
        SarimaOrder {
            p,
            d: 1,
            q,
            seasonal_p: sp,
            seasonal_d,
            seasonal_q: sq,
            period: 4,
        }
    }

    #[test]
    fn display_names_orders() {
        assert_eq!(order(1, 2, 0, 1, 1).to_string(), "SARIMA(1,1,2)(0,1,1)[4]");
    }

    #[test]
    fn lag_polynomials_multiply_seasonal_terms() {
        // φ = tanh(r0), Φ = tanh(r1): w_t = φ w_{t-1} + Φ w_{t-4} - φΦ w_{t-5}
        let o = order(1, 0, 1, 0, 1);
        let raw = [0.5, 0.3];
        let polys = LagPolynomials::new(&o, &raw);
        let (phi, sphi) = (0.5f64.tanh(), 0.3f64.tanh());
        assert_eq!(polys.ar.len(), 6);
        assert!((polys.ar[1] - phi).abs() < 1e-12);
        assert!((polys.ar[4] - sphi).abs() < 1e-12);
        assert!((polys.ar[5] + phi * sphi).abs() < 1e-12);
        assert_eq!(polys.ma, vec![0.0]);
    }

    #[test]
    fn residuals_of_pure_ar_recover_noise() {
        let o = order(1, 0, 0, 0, 0);
        let raw = [0.6f64.atanh()];
        let polys = LagPolynomials::new(&o, &raw);
        let noise = [0.0, 1.0, -0.5, 0.25, 2.0];
        let mut w = vec![0.0];
        for t in 1..noise.len() {
            w.push(0.6 * w[t - 1] + noise[t]);
        }
        let e = polys.residuals(&w);
        for (got, want) in e.iter().zip(&noise).skip(1) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn fit_rejects_series_too_short() {
        let err = SarimaModel::fit(order(1, 1, 0, 0, 0), &[1.0, 2.0, 3.0], None, 50).unwrap_err();
        assert!(matches!(err, ForecastError::ModelFit(_)));
    }

    #[test]
    fn constant_series_forecasts_constant() {
        let model = SarimaModel::fit(order(0, 0, 0, 0, 0), &[5.0; 10], None, 50).unwrap();
        let forecast = model.forecast(3);
        assert_eq!(forecast.mean.len(), 3);
        for v in &forecast.mean {
            assert!((v - 5.0).abs() < 1e-9);
        }
        assert!(model.aic.is_finite());
    }

    #[test]
    fn recovers_ar_coefficient() {
        // y = cumsum(w), w_t = 0.7 w_{t-1} + e_t with hashed uniform noise.
        let mut w = vec![0.0];
        for t in 1..200 {
            let x = (t as f64 * 12.9898).sin() * 43758.5453;
            let e = (x - x.floor()) * 2.0 - 1.0;
            w.push(0.7 * w[t - 1] + e);
        }
        let y = transform::cumulative_sum(10.0, &w);
        let model = SarimaModel::fit(order(1, 0, 0, 0, 0), &y, None, 500).unwrap();
        let phi = model.coefficients()[0];
        assert!((phi - 0.7).abs() < 0.1, "phi = {phi}");
    }

    #[test]
    fn seasonal_pattern_is_repeated() {
        let pattern = [2.0, 6.0, 4.0, 8.0];
        let y: Vec<f64> = (0..32).map(|i| pattern[i % 4] + (i / 4) as f64).collect();
        let model = SarimaModel::fit(order(0, 0, 0, 0, 1), &y, None, 50).unwrap();
        let forecast = model.forecast(4);
        // Seasonal + first differencing extends both the pattern and the trend.
        let expected: Vec<f64> = (32..36).map(|i| pattern[i % 4] + (i / 4) as f64).collect();
        for (got, want) in forecast.mean.iter().zip(&expected) {
            assert!((got - want).abs() < 1e-9, "{:?}", forecast.mean);
        }
    }

    #[test]
    fn intervals_widen_with_horizon() {
        let y: Vec<f64> = (0..40).map(|i| 10.0 + ((i * 37) % 11) as f64).collect();
        let model = SarimaModel::fit(order(1, 1, 0, 0, 0), &y, None, 200).unwrap();
        let forecast = model.forecast(5);
        let widths: Vec<f64> = forecast
            .upper
            .iter()
            .zip(&forecast.lower)
            .map(|(u, l)| u - l)
            .collect();
        for pair in widths.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-12, "{widths:?}");
        }
        for ((l, m), u) in forecast.lower.iter().zip(&forecast.mean).zip(&forecast.upper) {
            assert!(l <= m && m <= u);
        }
    }

    #[test]
    fn aic_is_comparable_across_orders() {
        // Extra coefficients pinned at zero leave every residual unchanged,
        // so only the parameter penalty may separate the two orders.
        let y: Vec<f64> = (0..40)
            .map(|i| {
                let x = (i as f64 * 12.9898).sin() * 43758.5453;
                100.0 + 20.0 * (x - x.floor())
            })
            .collect();
        let base = order(0, 0, 0, 0, 1);
        let wide = order(3, 0, 1, 0, 1);
        let w = transform::apply_differencing(&y, &base.differencing());

        let base_sse = css(&base, &[], &w).unwrap();
        let wide_sse = css(&wide, &[0.0; 4], &w).unwrap();
        assert_eq!(base_sse, wide_sse);

        let (_, base_aic) = information_criterion(base_sse, w.len(), 0);
        let (_, wide_aic) = information_criterion(wide_sse, w.len(), 4);
        assert!((wide_aic - base_aic - 8.0).abs() < 1e-9);
    }

    #[test]
    fn update_keeps_enough_history_for_the_order() {
        let pattern = [2.0, 6.0, 4.0, 8.0];
        let y: Vec<f64> = (0..40)
            .map(|i| {
                let x = (i as f64 * 12.9898).sin() * 43758.5453;
                pattern[i % 4] + (x - x.floor())
            })
            .collect();
        let o = order(1, 0, 1, 0, 1);
        assert_eq!(o.min_observations(), 13);

        let mut model = SarimaModel::fit(o, &y, None, 100).unwrap();
        model.update(&[3.0, 7.0], 10, 10).unwrap();
        assert_eq!(model.observations.len(), 13);
        model.update(&[5.0], 10, 10).unwrap();
        assert_eq!(model.observations.len(), 13);
        assert_eq!(model.forecast(2).mean.len(), 2);
    }

    #[test]
    fn update_appends_and_trims_history() {
        let y: Vec<f64> = (0..20).map(|i| 5.0 + (i % 3) as f64).collect();
        let mut model = SarimaModel::fit(order(1, 0, 0, 0, 0), &y, None, 100).unwrap();
        model.update(&[6.0, 7.0, 5.0], 10, 21).unwrap();
        assert_eq!(model.observations.len(), 21);
        assert_eq!(model.observations.last(), Some(&5.0));
        assert_eq!(model.updates, 1);
    }
}
