use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{ensure_len, ensure_rows, Result, TrainError};

pub const DEFAULT_THRESHOLD: f64 = 0.5;

// log(0) guard for probabilities that saturated to exactly 0 or 1
const PROB_CLIP: f64 = 1e-15;

/// Gradient of a loss with respect to the weights, evaluated on the rows of `x`.
/// [`log_loss_grad`] has this signature.
pub type GradientFn = fn(ArrayView2<f64>, ArrayView1<f64>, ArrayView1<f64>) -> Result<Array1<f64>>;

/// Logistic function, split on the sign of `z` so `exp` never overflows.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0. {
        1. / (1. + (-z).exp())
    } else {
        let e = z.exp();

        e / (1. + e)
    }
}

/// Mean binary cross-entropy between labels `y` and predicted probabilities.
pub fn log_loss(y: ArrayView1<f64>, y_probs: ArrayView1<f64>) -> Result<f64> {
    ensure_len("log-loss probabilities", y_probs.len(), y.len())?;
    ensure_rows("log-loss input", y.len())?;

    if let Some((index, &value)) = y_probs
        .iter()
        .enumerate()
        .find(|(_, p)| !(0. ..=1.).contains(*p))
    {
        return Err(TrainError::Domain { index, value });
    }

    let total: f64 = y
        .iter()
        .zip(y_probs.iter())
        .map(|(&y, &p)| {
            let p = p.clamp(PROB_CLIP, 1. - PROB_CLIP);

            -y * p.ln() - (1. - y) * (1. - p).ln()
        })
        .sum();

    Ok(total / y.len() as f64)
}

pub fn predict_probs(x: ArrayView2<f64>, w: ArrayView1<f64>) -> Result<Array1<f64>> {
    ensure_len("weights", w.len(), x.ncols())?;

    Ok(x.dot(&w).mapv_into(sigmoid))
}

/// Binarizes [`predict_probs`]: 1 where the probability reaches `threshold`.
pub fn predict(x: ArrayView2<f64>, w: ArrayView1<f64>, threshold: f64) -> Result<Array1<f64>> {
    let probs = predict_probs(x, w)?;

    Ok(probs.mapv_into(|p| if p >= threshold { 1. } else { 0. }))
}

pub fn evaluate_accuracy(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    w: ArrayView1<f64>,
) -> Result<f64> {
    ensure_len("labels", y.len(), x.nrows())?;
    ensure_rows("accuracy input", y.len())?;

    let predictions = predict(x, w, DEFAULT_THRESHOLD)?;

    let correct = predictions
        .iter()
        .zip(y.iter())
        .filter(|(p, t)| p == t)
        .count();

    Ok(correct as f64 / y.len() as f64)
}

/// `Xᵀ(σ(Xw) − y) / n`, the gradient of [`log_loss`] averaged over the rows of `x`.
///
/// A single-row `x` gives the per-example gradient used by the stochastic rules.
pub fn log_loss_grad(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    w: ArrayView1<f64>,
) -> Result<Array1<f64>> {
    ensure_len("weights", w.len(), x.ncols())?;
    ensure_len("labels", y.len(), x.nrows())?;
    ensure_rows("gradient input", y.len())?;

    let residual = predict_probs(x, w)? - &y;

    Ok(x.t().dot(&residual) / y.len() as f64)
}
