//! Semi-supervised EM: unlabeled points plus a labeled subset.
//!
//! Each labeled point `x̃ᵢ` with label `z̃ᵢ` enters the M-step as `α`
//! pseudo-observations of known origin. Its responsibilities are the one-hot
//! encoding of the label and are never re-estimated:
//!
//! ```text
//! w̃ᵢⱼ = 1 if z̃ᵢ = j else 0
//! ```
//!
//! M-step, with `nⱼ = Σᵢ wᵢⱼ` and `ñⱼ = Σᵢ w̃ᵢⱼ`:
//!
//! ```text
//! φⱼ = (nⱼ + α ñⱼ) / (n + α ñ)
//! μⱼ = (Σᵢ wᵢⱼ xᵢ + α Σᵢ w̃ᵢⱼ x̃ᵢ) / (nⱼ + α ñⱼ)
//! Σⱼ = (Σᵢ wᵢⱼ (xᵢ-μⱼ)(xᵢ-μⱼ)ᵀ + α Σᵢ w̃ᵢⱼ (x̃ᵢ-μⱼ)(x̃ᵢ-μⱼ)ᵀ) / (nⱼ + α ñⱼ)
//! ```
//!
//! The objective is `ll(X) + α · ll(X̃)`, where the labeled term uses the full
//! mixture density at each labeled point (every component contributes).
//! The E-step over X is the unsupervised one.

use crate::convergence::LogLikelihoodTrace;
use crate::em::{self, add_to_diagonal, column_sums, weighted_scatter, RunSettings};
use crate::error::{Error, Result};
use crate::init::Initialization;
use crate::model::{FitMode, GmmFit};
use crate::params::MixtureParams;
use ndarray::{Array2, ArrayView2};
use tracing::{debug, info};

/// Default weight of each labeled example.
pub const DEFAULT_ALPHA: f64 = 20.0;

/// One-hot responsibilities for labels in `[0, k)`.
pub fn one_hot(labels: &[usize], k: usize) -> Result<Array2<f64>> {
    let mut w = Array2::zeros((labels.len(), k));
    for (i, &label) in labels.iter().enumerate() {
        if label >= k {
            return Err(Error::LabelOutOfRange {
                index: i,
                label,
                n_components: k,
            });
        }
        w[[i, label]] = 1.0;
    }
    Ok(w)
}

/// M-step combining unlabeled responsibilities `w` over `x` with the fixed
/// labeled responsibilities `w_tilde` over `x_tilde`, weighted by `alpha`.
pub fn m_step(
    x: ArrayView2<'_, f64>,
    w: ArrayView2<'_, f64>,
    x_tilde: ArrayView2<'_, f64>,
    w_tilde: ArrayView2<'_, f64>,
    alpha: f64,
    reg_covar: f64,
) -> Result<MixtureParams> {
    let n = x.nrows();
    let n_tilde = x_tilde.nrows();
    let d = x.ncols();
    let k = w.ncols();
    if w.nrows() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: w.nrows(),
        });
    }
    if w_tilde.dim() != (n_tilde, k) {
        return Err(Error::ShapeMismatch {
            expected: format!("{n_tilde}x{k} labeled responsibilities"),
            actual: format!("{}x{}", w_tilde.nrows(), w_tilde.ncols()),
        });
    }
    if x_tilde.ncols() != d {
        return Err(Error::DimensionMismatch {
            expected: d,
            found: x_tilde.ncols(),
        });
    }

    let unlabeled_mass = column_sums(w);
    let labeled_mass = column_sums(w_tilde);
    let total_mass = &unlabeled_mass + &(&labeled_mass * alpha);

    let mut means = Array2::zeros((k, d));
    let mut covariances = Vec::with_capacity(k);

    for j in 0..k {
        let nk = total_mass[j];
        if !(nk >= em::MIN_COMPONENT_WEIGHT) {
            return Err(Error::EmptyComponent {
                component: j,
                weight: nk,
            });
        }
        let wj = w.column(j);
        let wj_tilde = w_tilde.column(j);

        let mean = (wj.dot(&x) + wj_tilde.dot(&x_tilde) * alpha) / nk;
        let mut cov = (weighted_scatter(x, wj, mean.view())
            + weighted_scatter(x_tilde, wj_tilde, mean.view()) * alpha)
            / nk;
        add_to_diagonal(&mut cov, reg_covar);

        means.row_mut(j).assign(&mean);
        covariances.push(cov);
    }

    let weights = total_mass / (n as f64 + alpha * n_tilde as f64);
    MixtureParams::new(weights, means, covariances)
}

/// Objective `ll(x) + α · ll(x_tilde)`.
pub fn objective(
    x: ArrayView2<'_, f64>,
    x_tilde: ArrayView2<'_, f64>,
    params: &MixtureParams,
    alpha: f64,
) -> Result<f64> {
    let unsupervised = em::log_likelihood(x, params)?;
    let supervised = em::log_likelihood(x_tilde, params)?;
    Ok(unsupervised + alpha * supervised)
}

/// Run semi-supervised EM from `init`.
pub(crate) fn run(
    x: ArrayView2<'_, f64>,
    x_tilde: ArrayView2<'_, f64>,
    labels: &[usize],
    alpha: f64,
    init: Initialization,
    settings: RunSettings,
) -> Result<GmmFit> {
    let Initialization {
        mut params,
        mut responsibilities,
    } = init;
    if labels.len() != x_tilde.nrows() {
        return Err(Error::DimensionMismatch {
            expected: x_tilde.nrows(),
            found: labels.len(),
        });
    }
    let w_tilde = one_hot(labels, params.n_components())?;
    let mut trace = LogLikelihoodTrace::new();

    while trace.should_continue(settings.tol, settings.max_iter) {
        responsibilities = em::e_step(x, &params)?;
        params = m_step(
            x,
            responsibilities.view(),
            x_tilde,
            w_tilde.view(),
            alpha,
            settings.reg_covar,
        )?;
        let ll = objective(x, x_tilde, &params, alpha)?;
        trace.record(ll)?;
        debug!(iteration = trace.len(), objective = ll, "semi-supervised em iteration");
    }

    let converged = trace.has_converged(settings.tol);
    info!(
        mode = "semi-supervised",
        iterations = trace.len(),
        objective = trace.current().unwrap_or(f64::NAN),
        n_labeled = labels.len(),
        converged,
        "em finished"
    );

    Ok(GmmFit {
        responsibilities,
        params,
        iterations: trace.len(),
        log_likelihoods: trace.into_values(),
        converged,
        mode: FitMode::SemiSupervised,
    })
}
