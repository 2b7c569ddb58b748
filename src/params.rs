//! Mixture parameters (φ, μ, Σ).

use crate::density::GaussianDensity;
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1};

/// Parameters of a K-component Gaussian mixture in d dimensions.
///
/// Invariants held by every instance produced by this crate:
/// `weights` is non-negative and sums to 1; each covariance is symmetric
/// (positive-definiteness is checked lazily, when the density is factorized).
#[derive(Debug, Clone, PartialEq)]
pub struct MixtureParams {
    /// Mixing proportions φ, length K.
    pub weights: Array1<f64>,
    /// Component means μ, one row per component (K × d).
    pub means: Array2<f64>,
    /// Component covariances Σ, K matrices of shape d × d.
    pub covariances: Vec<Array2<f64>>,
}

impl MixtureParams {
    /// Assemble parameters, checking that the shapes agree.
    pub fn new(
        weights: Array1<f64>,
        means: Array2<f64>,
        covariances: Vec<Array2<f64>>,
    ) -> Result<Self> {
        let k = weights.len();
        if k == 0 {
            return Err(Error::EmptyInput);
        }
        if means.nrows() != k || covariances.len() != k {
            return Err(Error::ShapeMismatch {
                expected: format!("{k} means and {k} covariances"),
                actual: format!("{} means and {} covariances", means.nrows(), covariances.len()),
            });
        }
        let d = means.ncols();
        for cov in &covariances {
            if cov.dim() != (d, d) {
                return Err(Error::ShapeMismatch {
                    expected: format!("{d}x{d} covariance"),
                    actual: format!("{}x{} covariance", cov.nrows(), cov.ncols()),
                });
            }
        }
        Ok(Self {
            weights,
            means,
            covariances,
        })
    }

    /// Number of components K.
    pub fn n_components(&self) -> usize {
        self.weights.len()
    }

    /// Data dimension d.
    pub fn dim(&self) -> usize {
        self.means.ncols()
    }

    /// Factorize every component once; reuse the result for all points.
    pub fn densities(&self) -> Result<Vec<GaussianDensity>> {
        self.covariances
            .iter()
            .enumerate()
            .map(|(j, cov)| GaussianDensity::new(j, self.means.row(j), cov.view()))
            .collect()
    }

    /// Largest absolute difference across all parameters.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        let w = self
            .weights
            .iter()
            .zip(other.weights.iter())
            .map(|(a, b)| (a - b).abs());
        let m = self
            .means
            .iter()
            .zip(other.means.iter())
            .map(|(a, b)| (a - b).abs());
        let c = self
            .covariances
            .iter()
            .zip(other.covariances.iter())
            .flat_map(|(a, b)| a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()));
        w.chain(m).chain(c).fold(0.0, f64::max)
    }
}

/// Mixture density `Σⱼ φⱼ · N(x | μⱼ, Σⱼ)` from pre-factorized components.
pub(crate) fn mixture_pdf(
    densities: &[GaussianDensity],
    weights: &Array1<f64>,
    x: ArrayView1<'_, f64>,
) -> f64 {
    densities
        .iter()
        .zip(weights.iter())
        .map(|(g, &phi)| g.pdf(x) * phi)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_component() -> MixtureParams {
        MixtureParams::new(
            array![0.25, 0.75],
            array![[0.0, 0.0], [3.0, 3.0]],
            vec![Array2::eye(2), Array2::eye(2) * 2.0],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_checks() {
        let bad = MixtureParams::new(
            array![0.5, 0.5],
            array![[0.0, 0.0]],
            vec![Array2::eye(2), Array2::eye(2)],
        );
        assert!(matches!(bad, Err(Error::ShapeMismatch { .. })));

        let bad_cov = MixtureParams::new(array![1.0], array![[0.0, 0.0]], vec![Array2::eye(3)]);
        assert!(matches!(bad_cov, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_mixture_pdf_is_weighted_sum() {
        let p = two_component();
        let dens = p.densities().unwrap();
        let x = array![1.0, 1.0];
        let expected = 0.25 * dens[0].pdf(x.view()) + 0.75 * dens[1].pdf(x.view());
        assert!((mixture_pdf(&dens, &p.weights, x.view()) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_densities_report_failing_component() {
        let mut p = two_component();
        p.covariances[1] = Array2::zeros((2, 2));
        assert_eq!(
            p.densities().unwrap_err(),
            Error::SingularCovariance { component: 1 }
        );
    }

    #[test]
    fn test_max_abs_diff() {
        let p = two_component();
        let mut q = p.clone();
        assert_eq!(p.max_abs_diff(&q), 0.0);
        q.covariances[0][[1, 0]] += 0.5;
        assert!((p.max_abs_diff(&q) - 0.5).abs() < 1e-15);
    }
}
