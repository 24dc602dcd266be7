//! Derivative-free minimization and the double-Gaussian curve model
//!
//! [`minimize`] is a plain Nelder-Mead downhill simplex. It is deterministic
//! for a given start point and stops either when the spread of objective
//! values across the simplex falls below a relative tolerance or when the
//! iteration cap is reached.
//!
//! [`DoubleGaussian`] is the six-parameter model fitted to separability
//! curves by local-maximum thresholding.

/// Options for [`minimize`]
#[derive(Debug, Clone)]
pub struct SimplexOptions {
    /// Iteration cap
    pub max_iterations: usize,
    /// Relative spread of objective values at which the search stops
    pub tolerance: f64,
}

impl Default for SimplexOptions {
    fn default() -> Self {
        Self {
            max_iterations: 5000,
            tolerance: 1e-10,
        }
    }
}

impl SimplexOptions {
    /// Create new options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Result of a simplex search
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations performed
    pub iterations: usize,
    /// True if the tolerance was reached before the iteration cap
    pub converged: bool,
}

const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;
const TINY: f64 = 1e-10;

/// Minimize `f` starting from `start`
///
/// The initial simplex is `start` plus one vertex per dimension displaced
/// by the matching entry of `steps`. NaN objective values are treated as
/// `+inf`, so the search backs away from regions where the model breaks
/// down.
///
/// # Panics
///
/// Panics if `start` and `steps` have different lengths.
pub fn minimize<F>(f: F, start: &[f64], steps: &[f64], options: &SimplexOptions) -> Minimum
where
    F: Fn(&[f64]) -> f64,
{
    assert_eq!(start.len(), steps.len(), "one step per dimension");
    let n = start.len();
    let eval = |p: &[f64]| {
        let v = f(p);
        if v.is_nan() { f64::INFINITY } else { v }
    };

    let mut vertices: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    vertices.push(start.to_vec());
    for (i, &step) in steps.iter().enumerate() {
        let mut v = start.to_vec();
        v[i] += if step == 0.0 { 1e-3 } else { step };
        vertices.push(v);
    }
    let mut values: Vec<f64> = vertices.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;
    while iterations < options.max_iterations {
        // Order vertices best to worst
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        vertices = order.iter().map(|&i| vertices[i].clone()).collect();
        values = order.iter().map(|&i| values[i]).collect();

        let (best, worst) = (values[0], values[n]);
        let spread = 2.0 * (worst - best).abs();
        if spread <= options.tolerance * (best.abs() + worst.abs()) + TINY {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid: Vec<f64> = (0..n)
            .map(|d| vertices[..n].iter().map(|v| v[d]).sum::<f64>() / n as f64)
            .collect();
        let along = |t: f64| -> Vec<f64> {
            centroid
                .iter()
                .zip(&vertices[n])
                .map(|(&c, &w)| c + t * (c - w))
                .collect()
        };

        let reflected = along(REFLECT);
        let fr = eval(&reflected);
        if fr < values[0] {
            let expanded = along(EXPAND);
            let fe = eval(&expanded);
            if fe < fr {
                vertices[n] = expanded;
                values[n] = fe;
            } else {
                vertices[n] = reflected;
                values[n] = fr;
            }
            continue;
        }
        if fr < values[n - 1] {
            vertices[n] = reflected;
            values[n] = fr;
            continue;
        }

        let (contracted, fc) = if fr < values[n] {
            let p = along(CONTRACT * REFLECT);
            let v = eval(&p);
            (p, v)
        } else {
            let p = along(-CONTRACT);
            let v = eval(&p);
            (p, v)
        };
        if fc < values[n].min(fr) {
            vertices[n] = contracted;
            values[n] = fc;
            continue;
        }

        let best_vertex = vertices[0].clone();
        for i in 1..=n {
            for d in 0..n {
                vertices[i][d] = best_vertex[d] + SHRINK * (vertices[i][d] - best_vertex[d]);
            }
            values[i] = eval(&vertices[i]);
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);
    Minimum {
        point: vertices[best].clone(),
        value: values[best],
        iterations,
        converged,
    }
}

const FIT_RESTARTS: usize = 3;

/// Sum of two Gaussian bumps `a * exp(-(x - mu)^2 / (2 sigma^2))`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleGaussian {
    pub a1: f64,
    pub mu1: f64,
    pub sigma1: f64,
    pub a2: f64,
    pub mu2: f64,
    pub sigma2: f64,
}

fn bump(a: f64, mu: f64, sigma: f64, x: f64) -> f64 {
    let s = sigma.abs();
    if s < 1e-12 {
        return if x == mu { a } else { 0.0 };
    }
    a * (-(x - mu).powi(2) / (2.0 * s * s)).exp()
}

impl DoubleGaussian {
    /// Evaluate the model at `x`
    pub fn eval(&self, x: f64) -> f64 {
        bump(self.a1, self.mu1, self.sigma1, x) + bump(self.a2, self.mu2, self.sigma2, x)
    }

    fn to_params(self) -> [f64; 6] {
        [self.a1, self.mu1, self.sigma1, self.a2, self.mu2, self.sigma2]
    }

    fn from_params(p: &[f64]) -> Self {
        Self {
            a1: p[0],
            mu1: p[1],
            sigma1: p[2].abs(),
            a2: p[3],
            mu2: p[4],
            sigma2: p[5].abs(),
        }
    }

    /// Sum of squared residuals against samples `(xs[i], ys[i])`
    pub fn residual(&self, xs: &[f64], ys: &[f64]) -> f64 {
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| (self.eval(x) - y).powi(2))
            .sum()
    }

    fn steps(&self) -> [f64; 6] {
        let amp_step = |a: f64| if a == 0.0 { 0.1 } else { 0.1 * a };
        [
            amp_step(self.a1),
            self.sigma1.max(1.0),
            0.5 * self.sigma1.max(1.0),
            amp_step(self.a2),
            self.sigma2.max(1.0),
            0.5 * self.sigma2.max(1.0),
        ]
    }

    /// Least-squares fit starting from `initial`
    ///
    /// The search restarts from its own result, at most `FIT_RESTARTS`
    /// times, while the residual keeps improving.
    pub fn fit(
        xs: &[f64],
        ys: &[f64],
        initial: DoubleGaussian,
        options: &SimplexOptions,
    ) -> (Self, Minimum) {
        let objective = |p: &[f64]| Self::from_params(p).residual(xs, ys);
        let mut model = initial;
        let mut min = minimize(objective, &model.to_params(), &model.steps(), options);
        let mut iterations = min.iterations;
        for _ in 0..FIT_RESTARTS {
            model = Self::from_params(&min.point);
            let next = minimize(objective, &model.to_params(), &model.steps(), options);
            iterations += next.iterations;
            let improved = next.value < min.value - options.tolerance * min.value.abs();
            if next.value <= min.value {
                min = next;
            }
            if !improved {
                break;
            }
        }
        min.iterations = iterations;
        (Self::from_params(&min.point), min)
    }

    /// The component mean that lies further up the x axis
    pub fn upper_mean(&self) -> f64 {
        self.mu1.max(self.mu2)
    }

    /// The component mean that lies further down the x axis
    pub fn lower_mean(&self) -> f64 {
        self.mu1.min(self.mu2)
    }
}
