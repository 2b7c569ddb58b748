//! Multivariate Gaussian density.
//!
//! ```text
//! N(x | μ, Σ) = (2π)^(-d/2) · det(Σ)^(-1/2) · exp(-½ (x-μ)ᵀ Σ⁻¹ (x-μ))
//! ```
//!
//! The E-step evaluates this `n · K` times per iteration, so each covariance
//! is factorized once ([`GaussianDensity::new`]) and the factor is reused for
//! every point. With the Cholesky factor `Σ = L Lᵀ`:
//!
//! - `det(Σ) = Πᵢ Lᵢᵢ²`
//! - `(x-μ)ᵀ Σ⁻¹ (x-μ) = ‖L⁻¹(x-μ)‖²` (one forward substitution, no inverse)
//!
//! A covariance that does not factor (singular, indefinite, non-finite) is an
//! [`Error::SingularCovariance`], never a NaN density.

use crate::error::{Error, Result};
use faer::{Mat, Side};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::f64::consts::PI;

/// Smallest accepted `Lᵢᵢ² / Σᵢᵢ`: the share of a coordinate's variance not
/// explained by the preceding ones. Rank-deficient matrices land near
/// machine epsilon here after rounding.
const MIN_PIVOT_RATIO: f64 = 1e-12;

/// A Gaussian component with its covariance already factorized.
#[derive(Debug, Clone)]
pub struct GaussianDensity {
    mean: Array1<f64>,
    /// Lower Cholesky factor of the covariance.
    chol: Array2<f64>,
    /// `(2π)^(-d/2) · det(Σ)^(-1/2)`.
    norm: f64,
}

impl GaussianDensity {
    /// Factorize `cov` for repeated evaluation.
    ///
    /// `component` only labels the error if the factorization fails.
    pub fn new(
        component: usize,
        mean: ArrayView1<'_, f64>,
        cov: ArrayView2<'_, f64>,
    ) -> Result<Self> {
        let d = mean.len();
        if cov.nrows() != d || cov.ncols() != d {
            return Err(Error::ShapeMismatch {
                expected: format!("{d}x{d} covariance"),
                actual: format!("{}x{} covariance", cov.nrows(), cov.ncols()),
            });
        }
        if cov.iter().any(|v| !v.is_finite()) {
            return Err(Error::SingularCovariance { component });
        }

        let mat = Mat::<f64>::from_fn(d, d, |i, j| cov[[i, j]]);
        let llt = mat
            .cholesky(Side::Lower)
            .map_err(|_| Error::SingularCovariance { component })?;
        let l = llt.compute_l();

        let mut chol = Array2::zeros((d, d));
        let mut sqrt_det = 1.0;
        for i in 0..d {
            for j in 0..=i {
                chol[[i, j]] = l[(i, j)];
            }
            let diag = chol[[i, i]];
            let pivot_ok =
                diag.is_finite() && diag > 0.0 && diag * diag >= MIN_PIVOT_RATIO * cov[[i, i]];
            if !pivot_ok {
                return Err(Error::SingularCovariance { component });
            }
            sqrt_det *= diag;
        }
        // Underflow of the determinant is as fatal as a zero pivot.
        if !(sqrt_det.is_finite() && sqrt_det > 0.0) {
            return Err(Error::SingularCovariance { component });
        }

        let norm = (2.0 * PI).powf(-0.5 * d as f64) / sqrt_det;

        Ok(Self {
            mean: mean.to_owned(),
            chol,
            norm,
        })
    }

    /// Dimension of the distribution.
    pub fn dim(&self) -> usize {
        self.mean.len()
    }

    /// Squared Mahalanobis distance `(x-μ)ᵀ Σ⁻¹ (x-μ)`.
    pub fn mahalanobis_sq(&self, x: ArrayView1<'_, f64>) -> f64 {
        debug_assert_eq!(x.len(), self.dim());
        let d = self.dim();
        // Forward substitution: L y = x - μ.
        let mut y = vec![0.0; d];
        let mut acc = 0.0;
        for i in 0..d {
            let mut r = x[i] - self.mean[i];
            for (j, yj) in y.iter().enumerate().take(i) {
                r -= self.chol[[i, j]] * yj;
            }
            y[i] = r / self.chol[[i, i]];
            acc += y[i] * y[i];
        }
        acc
    }

    /// Density at `x`.
    pub fn pdf(&self, x: ArrayView1<'_, f64>) -> f64 {
        self.norm * (-0.5 * self.mahalanobis_sq(x)).exp()
    }
}

/// One-shot density of `x` under `N(mean, cov)`.
///
/// Prefer [`GaussianDensity`] when evaluating many points against the same
/// component.
pub fn gaussian_pdf(
    x: ArrayView1<'_, f64>,
    mean: ArrayView1<'_, f64>,
    cov: ArrayView2<'_, f64>,
) -> Result<f64> {
    if x.len() != mean.len() {
        return Err(Error::DimensionMismatch {
            expected: mean.len(),
            found: x.len(),
        });
    }
    Ok(GaussianDensity::new(0, mean, cov)?.pdf(x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use proptest::prelude::*;

    #[test]
    fn test_standard_normal_at_origin() {
        let mean = array![0.0, 0.0];
        let cov = Array2::eye(2);
        let p = gaussian_pdf(array![0.0, 0.0].view(), mean.view(), cov.view()).unwrap();
        assert!((p - 1.0 / (2.0 * PI)).abs() < 1e-12);
    }

    #[test]
    fn test_correlated_matches_closed_form() {
        // det = 2*3 - 1 = 5, inverse = [[3, -1], [-1, 2]] / 5
        let mean = array![1.0, -1.0];
        let cov = array![[2.0, 1.0], [1.0, 3.0]];
        let x = array![2.0, 0.5];
        let diff = [1.0_f64, 1.5];
        let maha =
            (3.0 * diff[0] * diff[0] - 2.0 * diff[0] * diff[1] + 2.0 * diff[1] * diff[1]) / 5.0;
        let expected = (-0.5 * maha).exp() / (2.0 * PI * 5.0_f64.sqrt());

        let g = GaussianDensity::new(0, mean.view(), cov.view()).unwrap();
        assert!((g.mahalanobis_sq(x.view()) - maha).abs() < 1e-12);
        assert!((g.pdf(x.view()) - expected).abs() < 1e-14);
    }

    #[test]
    fn test_three_dimensional_diagonal() {
        let mean = array![0.0, 0.0, 0.0];
        let cov = Array2::from_diag(&array![1.0, 4.0, 9.0]);
        let x = array![1.0, 2.0, 3.0];
        // Each coordinate sits one standard deviation out.
        let expected = (2.0 * PI).powf(-1.5) / 6.0 * (-1.5_f64).exp();
        let p = gaussian_pdf(x.view(), mean.view(), cov.view()).unwrap();
        assert!((p - expected).abs() < 1e-14);
    }

    #[test]
    fn test_singular_covariance_is_error() {
        let mean = array![0.0, 0.0];
        let cov = array![[1.0, 1.0], [1.0, 1.0]];
        let err = GaussianDensity::new(2, mean.view(), cov.view()).unwrap_err();
        assert_eq!(err, Error::SingularCovariance { component: 2 });
    }

    #[test]
    fn test_indefinite_covariance_is_error() {
        let mean = array![0.0, 0.0];
        let cov = array![[1.0, 0.0], [0.0, -1.0]];
        assert!(GaussianDensity::new(0, mean.view(), cov.view()).is_err());
    }

    #[test]
    fn test_nan_covariance_is_error() {
        let mean = array![0.0];
        let cov = array![[f64::NAN]];
        assert!(GaussianDensity::new(0, mean.view(), cov.view()).is_err());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mean = array![0.0, 0.0];
        let cov = Array2::eye(3);
        assert!(matches!(
            GaussianDensity::new(0, mean.view(), cov.view()),
            Err(Error::ShapeMismatch { .. })
        ));
        let err = gaussian_pdf(array![0.0].view(), mean.view(), Array2::eye(2).view());
        assert!(matches!(err, Err(Error::DimensionMismatch { .. })));
    }

    proptest! {
        #[test]
        fn pdf_is_positive_and_peaks_at_mean(
            mx in -5.0f64..5.0,
            my in -5.0f64..5.0,
            dx in -3.0f64..3.0,
            dy in -3.0f64..3.0,
            sx in 0.5f64..3.0,
            sy in 0.5f64..3.0,
            rho in -0.8f64..0.8,
        ) {
            let mean = array![mx, my];
            let cov = array![[sx * sx, rho * sx * sy], [rho * sx * sy, sy * sy]];
            let g = GaussianDensity::new(0, mean.view(), cov.view()).unwrap();
            let at_mean = g.pdf(mean.view());
            let off = g.pdf(array![mx + dx, my + dy].view());
            prop_assert!(off > 0.0);
            prop_assert!(off <= at_mean + 1e-15);
        }
    }
}
