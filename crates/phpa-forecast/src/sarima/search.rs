//! Stepwise order search.
//!
//! Fits a handful of starting orders, then repeatedly tries the neighbours
//! of the best model so far (each of p, q, P, Q moved by one, and p/q or
//! P/Q moved together) and moves whenever the AIC improves. The search
//! ends when no neighbour improves or the fit budget is spent.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use super::model::{SarimaModel, SarimaOrder};
use crate::error::{ForecastError, ForecastResult};

/// Simplex iterations spent on each candidate fit.
const CANDIDATE_ITERATIONS: usize = 400;

/// Seasonal AR/MA orders never exceed this.
const MAX_SEASONAL_ORDER: usize = 1;

/// Minimum AIC improvement required to move.
const AIC_TOLERANCE: f64 = 1e-6;

/// Bounds of the order search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSpace {
    pub max_p: usize,
    pub max_q: usize,
    pub period: usize,
    /// Upper bound on candidate fits.
    pub budget: usize,
}

impl SearchSpace {
    /// Observations needed before the seasonal component is searched.
    pub fn seasonal_threshold(&self) -> usize {
        2 * self.period + 2
    }
}

struct Search<'a> {
    observations: &'a [f64],
    space: SearchSpace,
    seasonal_d: usize,
    visited: HashSet<SarimaOrder>,
    fits: usize,
    best: Option<SarimaModel>,
}

impl<'a> Search<'a> {
    fn order(&self, p: usize, q: usize, sp: usize, sq: usize) -> SarimaOrder {
        SarimaOrder {
            p,
            d: 1,
            q,
            seasonal_p: sp,
            seasonal_d: self.seasonal_d,
            seasonal_q: sq,
            period: self.space.period,
        }
    }

    fn in_bounds(&self, order: &SarimaOrder) -> bool {
        let max_seasonal = if self.seasonal_d > 0 { MAX_SEASONAL_ORDER } else { 0 };
        order.p <= self.space.max_p
            && order.q <= self.space.max_q
            && order.seasonal_p <= max_seasonal
            && order.seasonal_q <= max_seasonal
    }

    fn exhausted(&self) -> bool {
        self.fits >= self.space.budget
    }

    /// Fit `order` if it is new and in bounds. Returns true if it became the best model.
    fn consider(&mut self, order: SarimaOrder) -> bool {
        if !self.in_bounds(&order) || self.exhausted() || !self.visited.insert(order) {
            return false;
        }
        self.fits += 1;

        let model = match SarimaModel::fit(order, self.observations, None, CANDIDATE_ITERATIONS) {
            Ok(m) => m,
            Err(e) => {
                debug!(%order, error = %e, "candidate skipped");
                return false;
            }
        };
        debug!(%order, aic = model.aic, "candidate fitted");

        let improves = match &self.best {
            Some(best) => model.aic < best.aic - AIC_TOLERANCE,
            None => true,
        };
        if improves {
            self.best = Some(model);
        }
        improves
    }

    fn neighbours(&self, o: &SarimaOrder) -> Vec<SarimaOrder> {
        let mut out = Vec::new();
        let step = |v: usize, delta: isize| v.checked_add_signed(delta);
        for (dp, dq) in [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, 1)] {
            if let (Some(p), Some(q)) = (step(o.p, dp), step(o.q, dq)) {
                out.push(self.order(p, q, o.seasonal_p, o.seasonal_q));
            }
        }
        if self.seasonal_d > 0 {
            for (dp, dq) in [(-1, 0), (1, 0), (0, -1), (0, 1), (-1, -1), (1, 1)] {
                if let (Some(sp), Some(sq)) = (step(o.seasonal_p, dp), step(o.seasonal_q, dq)) {
                    out.push(self.order(o.p, o.q, sp, sq));
                }
            }
        }
        out
    }
}

/// Select and fit the best order for `observations` by stepwise AIC search.
///
/// Differencing is fixed at `d = 1`, `D = 1`. Series shorter than
/// [`SearchSpace::seasonal_threshold`] are searched without a seasonal
/// component.
pub fn stepwise(observations: &[f64], space: SearchSpace) -> ForecastResult<SarimaModel> {
    let seasonal = observations.len() >= space.seasonal_threshold();
    if !seasonal {
        warn!(
            observations = observations.len(),
            period = space.period,
            "series too short for seasonal differencing, searching non-seasonal orders"
        );
    }

    let mut search = Search {
        observations,
        space,
        seasonal_d: usize::from(seasonal),
        visited: HashSet::new(),
        fits: 0,
        best: None,
    };

    let starts = if seasonal {
        [(1, 1, 0, 1), (0, 0, 0, 0), (1, 0, 1, 0), (0, 1, 0, 1)]
    } else {
        [(1, 1, 0, 0), (0, 0, 0, 0), (1, 0, 0, 0), (0, 1, 0, 0)]
    };
    for (p, q, sp, sq) in starts {
        let order = search.order(p.min(space.max_p), q.min(space.max_q), sp, sq);
        search.consider(order);
    }

    loop {
        let Some(current) = search.best.as_ref().map(|m| m.order) else {
            break;
        };
        let mut moved = false;
        for candidate in search.neighbours(&current) {
            if search.consider(candidate) {
                moved = true;
                break;
            }
        }
        if !moved || search.exhausted() {
            break;
        }
    }

    if search.exhausted() {
        warn!(budget = space.budget, "order search stopped at its fit budget");
    }

    let fits = search.fits;
    let best = search.best.ok_or_else(|| {
        ForecastError::ModelFit(format!(
            "no SARIMA order could be fitted to {} observations",
            observations.len()
        ))
    })?;
    info!(order = %best.order, aic = best.aic, fits, "order search complete");
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn space(period: usize) -> SearchSpace {
        SearchSpace {
            max_p: 3,
            max_q: 3,
            period,
            budget: 64,
        }
    }

    #[test]
    fn constant_series_selects_simplest_order() {
        let model = stepwise(&[5.0; 10], space(12)).unwrap();
        assert_eq!(model.order.p, 0);
        assert_eq!(model.order.q, 0);
        assert!(!model.order.is_seasonal());
    }

    fn random_walk(n: usize) -> Vec<f64> {
        let mut y = vec![100.0];
        for t in 1..n {
            let x = (t as f64 * 12.9898).sin() * 43758.5453;
            y.push(y[t - 1] + 20.0 * (x - x.floor() - 0.5));
        }
        y
    }

    #[test]
    fn random_walk_keeps_base_order() {
        let model = stepwise(&random_walk(40), space(24)).unwrap();
        assert!(!model.order.is_seasonal());
        assert_eq!((model.order.p, model.order.q), (0, 0));
    }

    #[test]
    fn seasonal_random_walk_adds_no_autoregressive_lags() {
        // Seasonal differencing of a random walk is a seasonal MA; no AR term is warranted.
        let model = stepwise(&random_walk(80), space(12)).unwrap();
        assert_eq!(model.order.seasonal_d, 1);
        assert_eq!((model.order.p, model.order.seasonal_p), (0, 0));
    }

    #[test]
    fn long_series_searches_seasonal_orders() {
        let pattern = [3.0, 7.0, 5.0, 9.0];
        let y: Vec<f64> = (0..40)
            .map(|i| {
                let x = (i as f64 * 12.9898).sin() * 43758.5453;
                pattern[i % 4] + 0.2 * (x - x.floor())
            })
            .collect();
        let model = stepwise(&y, space(4)).unwrap();
        assert_eq!(model.order.d, 1);
        assert_eq!(model.order.seasonal_d, 1);
        assert_eq!(model.order.period, 4);
    }

    #[test]
    fn budget_bounds_the_number_of_fits() {
        let y: Vec<f64> = (0..30).map(|i| ((i * 17) % 7) as f64).collect();
        let tight = SearchSpace { budget: 2, ..space(12) };
        // Only the first two starting orders are ever fitted.
        let model = stepwise(&y, tight).unwrap();
        assert!(model.order.p <= 1 && model.order.q <= 1);
    }

    #[test]
    fn bounds_are_respected() {
        let y: Vec<f64> = (0..30).map(|i| ((i * 17) % 7) as f64).collect();
        let narrow = SearchSpace { max_p: 0, max_q: 0, ..space(12) };
        let model = stepwise(&y, narrow).unwrap();
        assert_eq!((model.order.p, model.order.q), (0, 0));
    }

    #[test]
    fn single_observation_cannot_be_fitted() {
        let err = stepwise(&[4.0], space(12)).unwrap_err();
        assert!(matches!(err, ForecastError::ModelFit(_)));
    }
}
