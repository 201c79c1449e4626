//! Savitzky-Golay trend estimation and detrending.
//!
//! A polynomial of order `poly_order` is least-squares fitted to every window of
//! `window_size` samples and evaluated at the window center, which gives a
//! smooth trend estimate. The first and last `window_size / 2` samples come from
//! the polynomial fitted to the first and last full window.
//!
//! [`detrend`] returns `data - trend`, the high-frequency residual. It removes
//! slow drift such as baseline wander and keeps the fast components.

use crate::error::{DenoiseError, Result};
use log::debug;
use nalgebra::{DMatrix, DVector, DVectorView};
use rayon::iter::ParallelIterator;
use rayon::slice::ParallelSlice;

/// Evaluation weights for a local polynomial fit.
///
/// Each row maps the `window_size` samples of a window to the value of the
/// fitted polynomial at one position. Positions are in window coordinates
/// scaled to `[-1, 1]` around the center, which keeps the Vandermonde matrix
/// well conditioned for long windows.
fn fit_weights(
    window_size: usize,
    poly_order: usize,
    positions: &[f64],
) -> Result<Vec<DVector<f64>>> {
    let half = window_size / 2;
    let scale = half.max(1) as f64;
    let vandermonde = DMatrix::from_fn(window_size, poly_order + 1, |r, c| {
        ((r as f64 - half as f64) / scale).powi(c as i32)
    });
    let pinv = vandermonde
        .pseudo_inverse(f64::EPSILON)
        .map_err(|e| DenoiseError::numeric(format!("Polynomial fit failed: {e}")))?;
    let evaluation = DMatrix::from_fn(positions.len(), poly_order + 1, |r, c| {
        positions[r].powi(c as i32)
    });
    let weights = evaluation * pinv;
    Ok(weights.row_iter().map(|row| row.transpose()).collect())
}

fn validate(len: usize, window_size: usize, poly_order: usize) -> Result<()> {
    if len == 0 {
        return Err(DenoiseError::numeric(
            "Savitzky-Golay filtering requires a non-empty signal",
        ));
    }
    if window_size % 2 == 0 {
        return Err(DenoiseError::config(format!(
            "Window size must be odd, got {window_size}"
        )));
    }
    if window_size > len {
        return Err(DenoiseError::config(format!(
            "Window size ({window_size}) must not exceed the signal length ({len})"
        )));
    }
    if poly_order >= window_size {
        return Err(DenoiseError::config(format!(
            "Polynomial order ({poly_order}) must be less than the window size ({window_size})"
        )));
    }
    Ok(())
}

/// Estimates the slow trend of `data` with a Savitzky-Golay filter.
///
/// # Arguments
///
/// * `data` - Input samples.
/// * `window_size` - Odd number of samples per local fit, at most `data.len()`.
/// * `poly_order` - Order of the local polynomial, less than `window_size`.
///
/// # Errors
///
/// * `Numeric` if `data` is empty.
/// * `Configuration` if the window is even, longer than the data, or not longer than the polynomial order.
pub fn trend(data: &[f64], window_size: usize, poly_order: usize) -> Result<Vec<f64>> {
    validate(data.len(), window_size, poly_order)?;
    let n = data.len();
    let half = window_size / 2;
    let scale = half.max(1) as f64;
    debug!("Savitzky-Golay trend, window {window_size}, order {poly_order}, {n} samples");

    let center = fit_weights(window_size, poly_order, &[0.0])?.remove(0);
    let left_positions: Vec<f64> = (0..half)
        .map(|j| (j as f64 - half as f64) / scale)
        .collect();
    let right_positions: Vec<f64> = (1..=half).map(|j| j as f64 / scale).collect();
    let left = fit_weights(window_size, poly_order, &left_positions)?;
    let right = fit_weights(window_size, poly_order, &right_positions)?;

    let head = DVectorView::from(&data[..window_size]);
    let tail = DVectorView::from(&data[n - window_size..]);

    let mut result = Vec::with_capacity(n);
    result.extend(left.iter().map(|w| w.dot(&head)));
    let interior: Vec<f64> = data
        .par_windows(window_size)
        .map(|window| center.dot(&DVectorView::from(window)))
        .collect();
    result.extend(interior);
    result.extend(right.iter().map(|w| w.dot(&tail)));
    Ok(result)
}

/// Removes the Savitzky-Golay trend and returns the residual `data - trend`.
///
/// # Errors
///
/// Same conditions as [`trend`].
///
/// # Examples
///
/// ```
/// use ecg_denoise::filtering::savgol::detrend;
/// let data = vec![5.0; 1000];
/// let residual = detrend(&data, 151, 7).unwrap();
/// assert!(residual.iter().all(|x| x.abs() < 1e-9));
/// ```
pub fn detrend(data: &[f64], window_size: usize, poly_order: usize) -> Result<Vec<f64>> {
    let trend = trend(data, window_size, poly_order)?;
    Ok(data.iter().zip(trend.iter()).map(|(x, t)| x - t).collect())
}
