//! Starting parameters for EM.
//!
//! The rows of X are shuffled and cut into K equal-size groups. Each group
//! contributes one component: its mean is the group's sample mean, mixing
//! weights start uniform, and so do the responsibilities.
//!
//! The covariance has two variants, see [`CovarianceInit`]. The default,
//! [`CovarianceInit::FullDataScatter`], measures the scatter of the *whole*
//! dataset around the group mean (divided by the group size). That yields
//! broad, heavily overlapping starting components. The textbook alternative,
//! [`CovarianceInit::GroupScatter`], uses only the group's own members.
//! Results differ between the two, so the choice is explicit.

use crate::error::{Error, Result};
use crate::params::MixtureParams;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::prelude::*;

/// How initial covariances are computed from the random groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CovarianceInit {
    /// Scatter of every row of X around the group mean, divided by the group size.
    #[default]
    FullDataScatter,
    /// Scatter of the group's own rows around the group mean, divided by the group size.
    GroupScatter,
}

/// Parameters and responsibilities EM starts from.
#[derive(Debug, Clone)]
pub struct Initialization {
    /// Initial φ, μ, Σ.
    pub params: MixtureParams,
    /// Initial W, `1/K` in every cell.
    pub responsibilities: Array2<f64>,
}

/// Randomly partition `x` into `k` groups and derive starting parameters.
///
/// Requires `n` to be a multiple of `k`; anything else is
/// [`Error::UnevenPartition`].
pub fn initialize<R: Rng + ?Sized>(
    x: ArrayView2<'_, f64>,
    k: usize,
    covariance_init: CovarianceInit,
    rng: &mut R,
) -> Result<Initialization> {
    let (n, d) = x.dim();
    if n == 0 {
        return Err(Error::EmptyInput);
    }
    if k == 0 || k > n {
        return Err(Error::InvalidClusterCount {
            requested: k,
            n_items: n,
        });
    }
    if n % k != 0 {
        return Err(Error::UnevenPartition {
            n_items: n,
            n_groups: k,
        });
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);
    let group_size = n / k;

    let mut means = Array2::zeros((k, d));
    let mut covariances = Vec::with_capacity(k);
    for (g, members) in order.chunks(group_size).enumerate() {
        let group = x.select(Axis(0), members);
        let mean = group
            .mean_axis(Axis(0))
            .ok_or(Error::EmptyInput)?;

        let cov = match covariance_init {
            CovarianceInit::FullDataScatter => scatter(x, mean.view()),
            CovarianceInit::GroupScatter => scatter(group.view(), mean.view()),
        } / group_size as f64;

        means.row_mut(g).assign(&mean);
        covariances.push(cov);
    }

    let weights = Array1::from_elem(k, 1.0 / k as f64);
    let params = MixtureParams::new(weights, means, covariances)?;
    let responsibilities = Array2::from_elem((n, k), 1.0 / k as f64);

    Ok(Initialization {
        params,
        responsibilities,
    })
}

/// `(X - c)ᵀ (X - c)`.
fn scatter(x: ArrayView2<'_, f64>, center: ArrayView1<'_, f64>) -> Array2<f64> {
    let centered = &x - &center;
    centered.t().dot(&centered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn square() -> Array2<f64> {
        array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]
    }

    #[test]
    fn test_uniform_weights_and_responsibilities() {
        let x = square();
        let mut rng = StdRng::seed_from_u64(7);
        let init = initialize(x.view(), 2, CovarianceInit::default(), &mut rng).unwrap();

        assert_eq!(init.params.weights, array![0.5, 0.5]);
        assert_eq!(init.responsibilities.dim(), (4, 2));
        assert!(init.responsibilities.iter().all(|&w| w == 0.5));
    }

    #[test]
    fn test_group_means_partition_the_data() {
        // Every row lands in exactly one group, so the group means average
        // back to the overall mean.
        let x = square();
        let mut rng = StdRng::seed_from_u64(11);
        let init = initialize(x.view(), 2, CovarianceInit::default(), &mut rng).unwrap();
        let overall = init.params.means.mean_axis(Axis(0)).unwrap();
        assert!((overall[0] - 0.5).abs() < 1e-12);
        assert!((overall[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_full_data_scatter_literal() {
        let x = square();
        let mut rng = StdRng::seed_from_u64(3);
        let init = initialize(x.view(), 2, CovarianceInit::FullDataScatter, &mut rng).unwrap();
        for g in 0..2 {
            let mean = init.params.means.row(g);
            let mut expected = Array2::<f64>::zeros((2, 2));
            for row in x.rows() {
                let diff = &row - &mean;
                for a in 0..2 {
                    for b in 0..2 {
                        expected[[a, b]] += diff[a] * diff[b];
                    }
                }
            }
            expected /= 2.0;
            let got = &init.params.covariances[g];
            assert!(got
                .iter()
                .zip(expected.iter())
                .all(|(a, b)| (a - b).abs() < 1e-12));
        }
    }

    #[test]
    fn test_group_scatter_single_group_is_sample_covariance() {
        let x = array![[1.0, 2.0], [3.0, 2.0], [2.0, 5.0]];
        let mut rng = StdRng::seed_from_u64(0);
        let init = initialize(x.view(), 1, CovarianceInit::GroupScatter, &mut rng).unwrap();
        let literal = initialize(x.view(), 1, CovarianceInit::FullDataScatter, &mut rng).unwrap();

        // With one group both variants coincide.
        assert!(init.params.max_abs_diff(&literal.params) < 1e-12);
        let cov = &init.params.covariances[0];
        assert!((cov[[0, 0]] - 2.0 / 3.0).abs() < 1e-12);
        assert!((cov[[1, 1]] - 2.0).abs() < 1e-12);
        assert!(cov[[0, 1]].abs() < 1e-12);
    }

    #[test]
    fn test_seed_reproducible() {
        let x: Array2<f64> =
            Array2::from_shape_fn((12, 2), |(i, j)| (i * 3 + j) as f64 * 0.37 % 5.0);
        let a = initialize(
            x.view(),
            3,
            CovarianceInit::default(),
            &mut StdRng::seed_from_u64(229),
        )
        .unwrap();
        let b = initialize(
            x.view(),
            3,
            CovarianceInit::default(),
            &mut StdRng::seed_from_u64(229),
        )
        .unwrap();
        assert_eq!(a.params, b.params);
    }

    #[test]
    fn test_uneven_partition_rejected() {
        let x = Array2::<f64>::zeros((5, 2));
        let err = initialize(x.view(), 2, CovarianceInit::default(), &mut StdRng::seed_from_u64(1));
        assert_eq!(
            err.unwrap_err(),
            Error::UnevenPartition {
                n_items: 5,
                n_groups: 2
            }
        );
    }

    #[test]
    fn test_invalid_cluster_counts() {
        let x = Array2::<f64>::zeros((4, 2));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            initialize(x.view(), 0, CovarianceInit::default(), &mut rng),
            Err(Error::InvalidClusterCount { .. })
        ));
        assert!(matches!(
            initialize(x.view(), 8, CovarianceInit::default(), &mut rng),
            Err(Error::InvalidClusterCount { .. })
        ));
        let empty = Array2::<f64>::zeros((0, 2));
        assert_eq!(
            initialize(empty.view(), 1, CovarianceInit::default(), &mut rng).unwrap_err(),
            Error::EmptyInput
        );
    }
}
