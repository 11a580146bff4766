//! Weight update rules for logistic regression.
//!
//! Every rule mutates the weight vector in place. [`GradientDescent`] uses the
//! whole dataset per call; [`StochasticGradientDescent`] and [`AdaGrad`] draw a
//! single row and are meant to be called once per row each epoch.

use ndarray::{s, Array1, ArrayView1, ArrayView2, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{ensure_len, ensure_rows, Result};
use crate::log_reg::GradientFn;

pub const DEFAULT_EPS_STABLE: f64 = 1e-8;

pub trait UpdateRule {
    /// Short label used in reports, e.g. `"SGD"`.
    fn name(&self) -> &'static str;

    /// How many times a training epoch calls [`UpdateRule::update`].
    fn steps_per_epoch(&self, n_rows: usize) -> usize;

    fn update(
        &mut self,
        w: &mut Array1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        grad_fn: GradientFn,
    ) -> Result<()>;
}

fn check_shapes(w: &Array1<f64>, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
    ensure_len("weights", w.len(), x.ncols())?;
    ensure_len("labels", y.len(), x.nrows())?;
    ensure_rows("training data", x.nrows())
}

fn sample_row<'a, 'b, R>(
    x: ArrayView2<'a, f64>,
    y: ArrayView1<'b, f64>,
    rng: &mut R,
) -> (ArrayView2<'a, f64>, ArrayView1<'b, f64>)
where
    R: Rng + ?Sized,
{
    let i = rng.gen_range(0..x.nrows());

    (x.slice_move(s![i..i + 1, ..]), y.slice_move(s![i..i + 1]))
}

fn checked_gradient(
    w: &Array1<f64>,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    grad_fn: GradientFn,
) -> Result<Array1<f64>> {
    let grad = grad_fn(x, y, w.view())?;

    ensure_len("gradient", grad.len(), w.len())?;

    Ok(grad)
}

/// `w ← w − lr · ∇(X, y, w)` over all rows.
pub fn gradient_descent(
    w: &mut Array1<f64>,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    grad_fn: GradientFn,
    lr: f64,
) -> Result<()> {
    check_shapes(w, x, y)?;

    let grad = checked_gradient(w, x, y, grad_fn)?;

    w.scaled_add(-lr, &grad);

    Ok(())
}

/// Same step as [`gradient_descent`], on one row drawn uniformly from `rng`.
pub fn stochastic_gradient_descent<R>(
    w: &mut Array1<f64>,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    grad_fn: GradientFn,
    lr: f64,
    rng: &mut R,
) -> Result<()>
where
    R: Rng + ?Sized,
{
    check_shapes(w, x, y)?;

    let (x_i, y_i) = sample_row(x, y, rng);

    let grad = checked_gradient(w, x_i, y_i, grad_fn)?;

    w.scaled_add(-lr, &grad);

    Ok(())
}

/// AdaGrad step on one random row.
///
/// `gti` accumulates the squared gradient of every feature; each weight then
/// moves by `lr · g / (√gti + eps)`, so features that keep receiving large
/// gradients take ever smaller steps.
#[allow(clippy::too_many_arguments)]
pub fn adagrad<R>(
    w: &mut Array1<f64>,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    grad_fn: GradientFn,
    gti: &mut Array1<f64>,
    lr: f64,
    eps_stable: f64,
    rng: &mut R,
) -> Result<()>
where
    R: Rng + ?Sized,
{
    check_shapes(w, x, y)?;
    ensure_len("accumulator", gti.len(), w.len())?;

    let (x_i, y_i) = sample_row(x, y, rng);

    let grad = checked_gradient(w, x_i, y_i, grad_fn)?;

    Zip::from(&mut *gti)
        .and(&grad)
        .for_each(|acc, &g| *acc += g * g);

    Zip::from(w)
        .and(&grad)
        .and(&*gti)
        .for_each(|w, &g, &acc| *w -= lr * g / (acc.sqrt() + eps_stable));

    Ok(())
}

#[derive(Debug, Clone)]
pub struct GradientDescent {
    learning_rate: f64,
}

impl GradientDescent {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }
}

impl UpdateRule for GradientDescent {
    fn name(&self) -> &'static str {
        "GD"
    }

    fn steps_per_epoch(&self, _n_rows: usize) -> usize {
        1
    }

    fn update(
        &mut self,
        w: &mut Array1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        grad_fn: GradientFn,
    ) -> Result<()> {
        gradient_descent(w, x, y, grad_fn, self.learning_rate)
    }
}

#[derive(Debug, Clone)]
pub struct StochasticGradientDescent {
    learning_rate: f64,
    rng: StdRng,
}

impl StochasticGradientDescent {
    /// Row selection is seeded from OS entropy; use [`Self::with_seed`] for
    /// reproducible runs.
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }
}

impl UpdateRule for StochasticGradientDescent {
    fn name(&self) -> &'static str {
        "SGD"
    }

    fn steps_per_epoch(&self, n_rows: usize) -> usize {
        n_rows
    }

    fn update(
        &mut self,
        w: &mut Array1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        grad_fn: GradientFn,
    ) -> Result<()> {
        stochastic_gradient_descent(w, x, y, grad_fn, self.learning_rate, &mut self.rng)
    }
}

#[derive(Debug, Clone)]
pub struct AdaGrad {
    learning_rate: f64,
    eps_stable: f64,
    accumulator: Array1<f64>,
    rng: StdRng,
}

impl AdaGrad {
    pub fn new(n_features: usize, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            eps_stable: DEFAULT_EPS_STABLE,
            accumulator: Array1::zeros(n_features),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_eps_stable(mut self, eps_stable: f64) -> Self {
        self.eps_stable = eps_stable;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Running sum of squared gradients, one entry per feature.
    pub fn accumulator(&self) -> &Array1<f64> {
        &self.accumulator
    }
}

impl UpdateRule for AdaGrad {
    fn name(&self) -> &'static str {
        "AdaGrad"
    }

    fn steps_per_epoch(&self, n_rows: usize) -> usize {
        n_rows
    }

    fn update(
        &mut self,
        w: &mut Array1<f64>,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        grad_fn: GradientFn,
    ) -> Result<()> {
        adagrad(
            w,
            x,
            y,
            grad_fn,
            &mut self.accumulator,
            self.learning_rate,
            self.eps_stable,
            &mut self.rng,
        )
    }
}
