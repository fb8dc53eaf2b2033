//! Nelder–Mead simplex minimisation.
//!
//! Derivative-free, which suits the conditional sum-of-squares objective:
//! it is cheap to evaluate but has no closed-form gradient once MA terms
//! feed residuals back into themselves.

/// Reflection, expansion, contraction, and shrink coefficients.
const ALPHA: f64 = 1.0;
const GAMMA: f64 = 2.0;
const RHO: f64 = 0.5;
const SIGMA: f64 = 0.5;

/// Offset of the initial simplex vertices from the start point.
const INITIAL_STEP: f64 = 0.25;

/// Result of a minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
}

/// Minimise `f` starting from `start`.
///
/// Stops after `max_iter` iterations or once the simplex values span less
/// than `tolerance`. Non-finite objective values are treated as `+inf`.
pub fn nelder_mead<F>(f: F, start: &[f64], max_iter: usize, tolerance: f64) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    let eval = |x: &[f64]| {
        let v = f(x);
        if v.is_nan() { f64::INFINITY } else { v }
    };

    let n = start.len();
    if n == 0 {
        return Minimum {
            x: Vec::new(),
            value: eval(start),
            iterations: 0,
        };
    }

    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.to_vec());
    for i in 0..n {
        let mut vertex = start.to_vec();
        vertex[i] += INITIAL_STEP;
        simplex.push(vertex);
    }
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    while iterations < max_iter {
        // Order vertices best to worst.
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|a, b| values[*a].total_cmp(&values[*b]));
        simplex = order.iter().map(|i| simplex[*i].clone()).collect();
        values = order.iter().map(|i| values[*i]).collect();

        if (values[n] - values[0]).abs() <= tolerance {
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|v| v[j]).sum::<f64>() / n as f64)
            .collect();
        let towards = |from: &[f64], coeff: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + coeff * (x - c))
                .collect()
        };

        let reflected = towards(&simplex[n], -ALPHA);
        let fr = eval(&reflected);

        if fr < values[0] {
            let expanded = towards(&reflected, GAMMA);
            let fe = eval(&expanded);
            if fe < fr {
                simplex[n] = expanded;
                values[n] = fe;
            } else {
                simplex[n] = reflected;
                values[n] = fr;
            }
            continue;
        }

        if fr < values[n - 1] {
            simplex[n] = reflected;
            values[n] = fr;
            continue;
        }

        let contracted = towards(&simplex[n], RHO);
        let fc = eval(&contracted);
        if fc < values[n].min(fr) {
            simplex[n] = contracted;
            values[n] = fc;
            continue;
        }

        // Shrink everything toward the best vertex.
        let best = simplex[0].clone();
        for i in 1..=n {
            simplex[i] = best
                .iter()
                .zip(&simplex[i])
                .map(|(b, x)| b + SIGMA * (x - b))
                .collect();
            values[i] = eval(&simplex[i]);
        }
    }

    let (best, value) = simplex
        .into_iter()
        .zip(values)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((start.to_vec(), f64::INFINITY));
    Minimum {
        x: best,
        value,
        iterations,
    }
}
