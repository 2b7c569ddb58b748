//! Unsupervised EM for Gaussian mixtures.
//!
//! # The EM Algorithm
//!
//! **E-step**: responsibilities, the posterior of each component per point:
//! ```text
//! wᵢⱼ = φⱼ N(xᵢ | μⱼ, Σⱼ) / Σₗ φₗ N(xᵢ | μₗ, Σₗ)
//! ```
//!
//! **M-step**: maximize the expected complete-data log-likelihood:
//! - φⱼ = (1/n) Σᵢ wᵢⱼ
//! - μⱼ = Σᵢ wᵢⱼ xᵢ / Σᵢ wᵢⱼ
//! - Σⱼ = Σᵢ wᵢⱼ (xᵢ - μⱼ)(xᵢ - μⱼ)ᵀ / Σᵢ wᵢⱼ
//!
//! **Objective**: `ll = Σᵢ log Σⱼ φⱼ N(xᵢ | μⱼ, Σⱼ)`, evaluated with the
//! parameters the M-step just produced. It never decreases in exact
//! arithmetic.
//!
//! Densities are evaluated directly (no log-sum-exp), which is adequate for
//! low-dimensional data. A point whose mixture density underflows to zero is
//! reported as [`Error::DegenerateResponsibility`].
//!
//! Each step returns a fresh value instead of mutating its input; the engine
//! swaps snapshots between iterations.

use crate::convergence::LogLikelihoodTrace;
use crate::error::{Error, Result};
use crate::init::Initialization;
use crate::model::{FitMode, GmmFit};
use crate::params::{mixture_pdf, MixtureParams};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::{debug, info};

/// Components whose total responsibility falls below this are treated as collapsed.
pub const MIN_COMPONENT_WEIGHT: f64 = 1e-10;

/// Settings for one EM run.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RunSettings {
    pub tol: f64,
    pub max_iter: usize,
    pub reg_covar: f64,
}

/// E-step: posterior responsibilities of every component for every row of `x`.
///
/// Rows of the result sum to 1.
pub fn e_step(x: ArrayView2<'_, f64>, params: &MixtureParams) -> Result<Array2<f64>> {
    let densities = params.densities()?;
    let k = params.n_components();
    let mut w = Array2::zeros((x.nrows(), k));

    for (i, (point, mut row)) in x.rows().into_iter().zip(w.rows_mut()).enumerate() {
        for (j, g) in densities.iter().enumerate() {
            row[j] = g.pdf(point) * params.weights[j];
        }
        let total = row.sum();
        if !(total.is_finite() && total > 0.0) {
            return Err(Error::DegenerateResponsibility { point: i });
        }
        row /= total;
    }

    Ok(w)
}

/// M-step: re-estimate φ, μ, Σ from responsibilities `w`.
///
/// `reg_covar` is added to every covariance diagonal (0 leaves the estimate
/// untouched).
pub fn m_step(
    x: ArrayView2<'_, f64>,
    w: ArrayView2<'_, f64>,
    reg_covar: f64,
) -> Result<MixtureParams> {
    let n = x.nrows();
    let d = x.ncols();
    let k = w.ncols();
    if w.nrows() != n {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: w.nrows(),
        });
    }

    let resp_sum = column_sums(w);
    let mut means = Array2::zeros((k, d));
    let mut covariances = Vec::with_capacity(k);

    for j in 0..k {
        let nk = resp_sum[j];
        if !(nk >= MIN_COMPONENT_WEIGHT) {
            return Err(Error::EmptyComponent {
                component: j,
                weight: nk,
            });
        }
        let wj = w.column(j);
        let mean = wj.dot(&x) / nk;
        let mut cov = weighted_scatter(x, wj, mean.view()) / nk;
        add_to_diagonal(&mut cov, reg_covar);

        means.row_mut(j).assign(&mean);
        covariances.push(cov);
    }

    let weights = resp_sum / n as f64;
    MixtureParams::new(weights, means, covariances)
}

/// Objective `Σᵢ log Σⱼ φⱼ N(xᵢ | μⱼ, Σⱼ)`.
///
/// May return `-inf` when some point has zero mixture density; the engine
/// treats that as fatal.
pub fn log_likelihood(x: ArrayView2<'_, f64>, params: &MixtureParams) -> Result<f64> {
    let densities = params.densities()?;
    Ok(x
        .rows()
        .into_iter()
        .map(|point| mixture_pdf(&densities, &params.weights, point).ln())
        .sum())
}

/// `Σᵢ wᵢ (xᵢ - c)(xᵢ - c)ᵀ`, i.e. `(X - c)ᵀ diag(w) (X - c)`.
pub(crate) fn weighted_scatter(
    x: ArrayView2<'_, f64>,
    weights: ArrayView1<'_, f64>,
    center: ArrayView1<'_, f64>,
) -> Array2<f64> {
    let centered = &x - &center;
    let weighted = &centered * &weights.insert_axis(Axis(1));
    centered.t().dot(&weighted)
}

pub(crate) fn add_to_diagonal(cov: &mut Array2<f64>, value: f64) {
    if value != 0.0 {
        cov.diag_mut().mapv_inplace(|v| v + value);
    }
}

/// Run unsupervised EM from `init` until the objective settles or `max_iter`.
pub(crate) fn run(
    x: ArrayView2<'_, f64>,
    init: Initialization,
    settings: RunSettings,
) -> Result<GmmFit> {
    let Initialization {
        mut params,
        mut responsibilities,
    } = init;
    let mut trace = LogLikelihoodTrace::new();

    while trace.should_continue(settings.tol, settings.max_iter) {
        responsibilities = e_step(x, &params)?;
        params = m_step(x, responsibilities.view(), settings.reg_covar)?;
        let ll = log_likelihood(x, &params)?;
        trace.record(ll)?;
        debug!(iteration = trace.len(), log_likelihood = ll, "em iteration");
    }

    let converged = trace.has_converged(settings.tol);
    info!(
        mode = "unsupervised",
        iterations = trace.len(),
        log_likelihood = trace.current().unwrap_or(f64::NAN),
        converged,
        "em finished"
    );

    Ok(GmmFit {
        responsibilities,
        params,
        iterations: trace.len(),
        log_likelihoods: trace.into_values(),
        converged,
        mode: FitMode::Unsupervised,
    })
}

/// Per-component sums of a responsibility matrix.
pub(crate) fn column_sums(w: ArrayView2<'_, f64>) -> Array1<f64> {
    w.sum_axis(Axis(0))
}
