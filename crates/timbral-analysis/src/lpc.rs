//! Linear prediction: Levinson-Durbin recursion and LPC cepstrum.
//!
//! Coefficients follow the prediction-error filter convention
//!
//! ```text
//! A(z) = 1 + Σ_{k=1}^{p} a_k z^{-k}
//! ```
//!
//! so an autoregressive process `x[n] = φ1·x[n-1] + φ2·x[n-2] + e[n]`
//! recovers `[-φ1, -φ2]`.

use crate::error::{AnalysisError, Result};
use crate::lag::autocorrelation_lags;

/// Output of [`lpc`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LpcResult {
    /// Prediction coefficients `a_1..a_p`.
    pub coefficients: Vec<f32>,
    /// Reflection (PARCOR) coefficient of each recursion stage.
    pub reflection: Vec<f32>,
    /// Residual prediction error power after the final stage.
    pub error: f32,
}

impl LpcResult {
    /// Model order.
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }
}

/// Solve for prediction coefficients from `order + 1` autocorrelation lags.
///
/// A zero lag-0 value (silent frame) yields all-zero coefficients.
///
/// # Errors
///
/// [`AnalysisError::InvalidParameter`] if fewer than two lags are given.
pub fn lpc(autocorr: &[f32]) -> Result<LpcResult> {
    if autocorr.len() < 2 {
        return Err(AnalysisError::invalid(
            "autocorr",
            format!("need at least 2 lags for order >= 1, got {}", autocorr.len()),
        ));
    }
    let order = autocorr.len() - 1;
    let mut coefficients = vec![0.0f32; order];
    let mut reflection = vec![0.0f32; order];
    let mut error = autocorr[0];
    if error == 0.0 {
        return Ok(LpcResult {
            coefficients,
            reflection,
            error,
        });
    }

    for i in 0..order {
        let mut r = -autocorr[i + 1];
        for j in 0..i {
            r -= coefficients[j] * autocorr[i - j];
        }
        r /= error;
        reflection[i] = r;
        coefficients[i] = r;

        // symmetric in-place update of the previous stage
        let half = i / 2;
        for j in 0..half {
            let tmp = coefficients[j];
            coefficients[j] += r * coefficients[i - 1 - j];
            coefficients[i - 1 - j] += r * tmp;
        }
        if i % 2 == 1 {
            coefficients[half] += coefficients[half] * r;
        }

        error *= 1.0 - r * r;
    }

    #[cfg(feature = "tracing")]
    tracing::trace!(order, error, "levinson recursion done");

    Ok(LpcResult {
        coefficients,
        reflection,
        error,
    })
}

/// Cepstral coefficients `c_1..c_Q` of the all-pole model `1/A(z)`.
///
/// With `α = -a`:
///
/// ```text
/// c_n = α_n + Σ_{k=1}^{n-1} (k/n)·c_k·α_{n-k}     n ≤ p
/// c_n =       Σ_{k=n-p}^{n-1} (k/n)·c_k·α_{n-k}   n > p
/// ```
///
/// `cepstral_order` defaults to the LPC order.
pub fn lpcc(lpc: &[f32], cepstral_order: Option<usize>) -> Result<Vec<f32>> {
    let p = lpc.len();
    if p == 0 {
        return Err(AnalysisError::EmptyInput("lpc"));
    }
    let q = cepstral_order.unwrap_or(p);
    if q == 0 {
        return Err(AnalysisError::invalid("cepstral_order", "must be at least 1"));
    }

    // 1-based views: alpha(k) = -a_k, c[n - 1] = c_n
    let alpha = |k: usize| -lpc[k - 1];
    let mut c = vec![0.0f32; q];

    for n in 1..=q {
        let start = if n > p { n - p } else { 1 };
        let sum: f32 = (start..n)
            .map(|k| k as f32 * c[k - 1] * alpha(n - k))
            .sum::<f32>()
            / n as f32;
        c[n - 1] = if n <= p { alpha(n) + sum } else { sum };
    }

    Ok(c)
}

/// LPC of a signal frame via its first `order + 1` autocorrelation lags.
pub fn lpc_from_signal(samples: &[f32], order: usize) -> Result<LpcResult> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptyInput("samples"));
    }
    if order == 0 || order >= samples.len() {
        return Err(AnalysisError::invalid(
            "order",
            format!("must lie in 1..{}, got {order}", samples.len()),
        ));
    }
    lpc(&autocorrelation_lags(samples, order + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ar2_exact_autocorrelation() {
        // phi1 = 0.75, phi2 = -0.5: rho1 = phi1/(1 - phi2), rho2 = phi1*rho1 + phi2
        let result = lpc(&[1.0, 0.5, -0.125]).unwrap();
        assert!((result.coefficients[0] + 0.75).abs() < 1e-6);
        assert!((result.coefficients[1] - 0.5).abs() < 1e-6);
        assert_eq!(result.order(), 2);
        assert!((result.reflection[0] + 0.5).abs() < 1e-6);
        assert!((result.reflection[1] - 0.5).abs() < 1e-6);
        assert!((result.error - 0.5625).abs() < 1e-6);
    }

    #[test]
    fn test_zero_energy() {
        let result = lpc(&[0.0, 0.3, 0.1]).unwrap();
        assert_eq!(result.coefficients, vec![0.0, 0.0]);
    }

    #[test]
    fn test_too_few_lags() {
        assert!(lpc(&[1.0]).is_err());
        assert!(lpc(&[]).is_err());
    }

    #[test]
    fn test_lpcc_first_order() {
        let c = lpcc(&[-0.5], Some(4)).unwrap();
        let expected = [0.5, 0.125, 0.125 / 3.0, 0.0625 / 4.0];
        for (n, (got, want)) in c.iter().zip(expected.iter()).enumerate() {
            assert!((got - want).abs() < 1e-6, "c{}: {got} vs {want}", n + 1);
        }
    }

    #[test]
    fn test_lpcc_defaults_to_order() {
        assert_eq!(lpcc(&[-0.75, 0.5], None).unwrap().len(), 2);
        assert!(lpcc(&[-0.75], Some(0)).is_err());
        assert!(lpcc(&[], None).is_err());
    }

    #[test]
    fn test_lpc_from_signal_validates_order() {
        assert!(lpc_from_signal(&[1.0, 2.0, 3.0], 0).is_err());
        assert!(lpc_from_signal(&[1.0, 2.0, 3.0], 3).is_err());
        assert!(lpc_from_signal(&[], 2).is_err());
        assert_eq!(lpc_from_signal(&[1.0, 0.0, -1.0, 0.0], 2).unwrap().order(), 2);
    }
}
