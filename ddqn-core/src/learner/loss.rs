//! Smooth L1 (Huber) loss with `beta = 1` and mean reduction.
use ndarray::{Array1, ArrayView1, Zip};

/// Returns `mean_i huber(pred_i - target_i)`.
///
/// `huber(d) = 0.5 d^2` for `|d| < 1` and `|d| - 0.5` otherwise.
/// Returns 0 for empty inputs.
pub fn smooth_l1_loss(pred: ArrayView1<f32>, target: ArrayView1<f32>) -> f32 {
    let n = pred.len();
    if n == 0 {
        return 0.0;
    }
    let sum = Zip::from(&pred).and(&target).fold(0f32, |acc, &p, &t| {
        let d = (p - t).abs();
        acc + if d < 1.0 { 0.5 * d * d } else { d - 0.5 }
    });
    sum / n as f32
}

/// Derivative of [`smooth_l1_loss`] with respect to `pred`.
pub fn smooth_l1_grad(pred: ArrayView1<f32>, target: ArrayView1<f32>) -> Array1<f32> {
    let n = pred.len().max(1) as f32;
    Zip::from(&pred)
        .and(&target)
        .map_collect(|&p, &t| (p - t).clamp(-1.0, 1.0) / n)
}
