//! Gaussian mixture model: configuration, entry points and fit result.
//!
//! ```rust
//! use ndarray::array;
//! use semigmm::Gmm;
//!
//! let x = array![
//!     [0.0, 0.0], [0.3, 0.1], [0.1, 0.4], [-0.2, 0.2],
//!     [9.0, 9.0], [9.2, 8.9], [8.8, 9.3], [9.1, 9.4],
//! ];
//! let gmm = Gmm::new().with_n_components(2).with_seed(229);
//! let fit = gmm.fit(x.view()).unwrap();
//! assert_eq!(fit.hard_assignments().len(), 8);
//! assert!(fit.iterations >= 2);
//!
//! // One labeled example per component fixes which cluster is which.
//! let x_tilde = array![[0.1, 0.1], [9.0, 9.1]];
//! let fit = gmm.fit_semi_supervised(x.view(), x_tilde.view(), &[0, 1]).unwrap();
//! let labels = fit.hard_assignments();
//! assert!(labels[..4].iter().all(|&l| l == 0));
//! assert!(labels[4..].iter().all(|&l| l == 1));
//! ```

use crate::convergence::{DEFAULT_MAX_ITER, DEFAULT_TOL};
use crate::em::{self, RunSettings};
use crate::error::{Error, Result};
use crate::init::{initialize, CovarianceInit, Initialization};
use crate::params::MixtureParams;
use crate::semi::{self, DEFAULT_ALPHA};
use ndarray::{Array2, ArrayView2};
use rand::prelude::*;

/// Default number of mixture components.
pub const DEFAULT_N_COMPONENTS: usize = 4;

/// Gaussian mixture model fitted by EM.
#[derive(Debug, Clone)]
pub struct Gmm {
    /// Number of components (clusters).
    n_components: usize,
    /// Maximum EM iterations.
    max_iter: usize,
    /// Stop once the objective moves by less than this.
    tol: f64,
    /// Weight of each labeled example (semi-supervised only).
    alpha: f64,
    /// Added to covariance diagonals after each M-step.
    reg_covar: f64,
    /// Initial covariance variant.
    covariance_init: CovarianceInit,
    /// Random seed.
    seed: Option<u64>,
}

impl Gmm {
    /// Create a new GMM with default settings.
    pub fn new() -> Self {
        Self {
            n_components: DEFAULT_N_COMPONENTS,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
            alpha: DEFAULT_ALPHA,
            reg_covar: 0.0,
            covariance_init: CovarianceInit::default(),
            seed: None,
        }
    }

    /// Set number of components.
    pub fn with_n_components(mut self, n: usize) -> Self {
        self.n_components = n;
        self
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence threshold on the absolute objective change.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the labeled-example weight α.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set covariance diagonal regularization.
    pub fn with_reg_covar(mut self, reg_covar: f64) -> Self {
        self.reg_covar = reg_covar;
        self
    }

    /// Choose how initial covariances are computed.
    pub fn with_covariance_init(mut self, covariance_init: CovarianceInit) -> Self {
        self.covariance_init = covariance_init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of components.
    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Labeled-example weight α.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Configured seed, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Fit to unlabeled data only.
    pub fn fit(&self, x: ArrayView2<'_, f64>) -> Result<GmmFit> {
        self.validate()?;
        validate_matrix(x)?;
        let init = self.initialize(x)?;
        em::run(x, init, self.settings())
    }

    /// Fit to unlabeled `x` plus labeled `x_tilde` with labels `z_tilde` in
    /// `[0, n_components)`.
    ///
    /// Initialization uses the unlabeled rows only.
    pub fn fit_semi_supervised(
        &self,
        x: ArrayView2<'_, f64>,
        x_tilde: ArrayView2<'_, f64>,
        z_tilde: &[usize],
    ) -> Result<GmmFit> {
        self.validate()?;
        validate_matrix(x)?;
        if x_tilde.ncols() != x.ncols() {
            return Err(Error::DimensionMismatch {
                expected: x.ncols(),
                found: x_tilde.ncols(),
            });
        }
        if let Some((row, col)) = first_non_finite(x_tilde) {
            return Err(Error::NonFiniteInput { row, col });
        }
        if z_tilde.len() != x_tilde.nrows() {
            return Err(Error::DimensionMismatch {
                expected: x_tilde.nrows(),
                found: z_tilde.len(),
            });
        }
        // Fail on bad labels before spending time on initialization.
        semi::one_hot(z_tilde, self.n_components)?;

        let init = self.initialize(x)?;
        semi::run(x, x_tilde, z_tilde, self.alpha, init, self.settings())
    }

    fn initialize(&self, x: ArrayView2<'_, f64>) -> Result<Initialization> {
        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        initialize(x, self.n_components, self.covariance_init, &mut rng)
    }

    fn settings(&self) -> RunSettings {
        RunSettings {
            tol: self.tol,
            max_iter: self.max_iter,
            reg_covar: self.reg_covar,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.n_components == 0 {
            return Err(Error::InvalidParameter {
                name: "n_components",
                message: "must be > 0",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be > 0",
            });
        }
        if !(self.tol.is_finite() && self.tol >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and >= 0",
            });
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "alpha",
                message: "must be finite and >= 0",
            });
        }
        if !(self.reg_covar.is_finite() && self.reg_covar >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "reg_covar",
                message: "must be finite and >= 0",
            });
        }
        Ok(())
    }
}

impl Default for Gmm {
    fn default() -> Self {
        Self::new()
    }
}

/// Which engine produced a fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Unlabeled data only.
    Unsupervised,
    /// Unlabeled data plus weighted labeled examples.
    SemiSupervised,
}

/// Outcome of one EM run.
#[derive(Debug, Clone)]
pub struct GmmFit {
    /// Final responsibilities W (n × K); each row sums to 1.
    pub responsibilities: Array2<f64>,
    /// Final mixture parameters.
    pub params: MixtureParams,
    /// Iterations run.
    pub iterations: usize,
    /// Objective after each iteration.
    pub log_likelihoods: Vec<f64>,
    /// False when the run stopped at `max_iter`.
    pub converged: bool,
    /// Engine used.
    pub mode: FitMode,
}

impl GmmFit {
    /// Hard assignment per point: row-wise argmax of W.
    pub fn hard_assignments(&self) -> Vec<usize> {
        argmax_rows(self.responsibilities.view())
    }

    /// Objective after the final iteration.
    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihoods.last().copied()
    }

    /// Number of points assigned to each component.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.params.n_components()];
        for label in self.hard_assignments() {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Row-wise argmax; ties go to the lowest index.
pub fn argmax_rows(w: ArrayView2<'_, f64>) -> Vec<usize> {
    w.rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (j, &v)| {
                    if v > best.1 {
                        (j, v)
                    } else {
                        best
                    }
                })
                .0
        })
        .collect()
}

/// Fit an unsupervised `k`-component mixture with default settings.
///
/// Returns the responsibility matrix and the number of iterations run.
pub fn fit_unsupervised(
    x: ArrayView2<'_, f64>,
    k: usize,
    seed: Option<u64>,
) -> Result<(Array2<f64>, usize)> {
    let mut gmm = Gmm::new().with_n_components(k);
    if let Some(s) = seed {
        gmm = gmm.with_seed(s);
    }
    let fit = gmm.fit(x)?;
    Ok((fit.responsibilities, fit.iterations))
}

/// Fit a semi-supervised `k`-component mixture with label weight `alpha`.
///
/// Returns the responsibility matrix over `x` and the number of iterations run.
pub fn fit_semi_supervised(
    x: ArrayView2<'_, f64>,
    x_tilde: ArrayView2<'_, f64>,
    z_tilde: &[usize],
    k: usize,
    alpha: f64,
    seed: Option<u64>,
) -> Result<(Array2<f64>, usize)> {
    let mut gmm = Gmm::new().with_n_components(k).with_alpha(alpha);
    if let Some(s) = seed {
        gmm = gmm.with_seed(s);
    }
    let fit = gmm.fit_semi_supervised(x, x_tilde, z_tilde)?;
    Ok((fit.responsibilities, fit.iterations))
}

fn validate_matrix(x: ArrayView2<'_, f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(Error::EmptyInput);
    }
    if let Some((row, col)) = first_non_finite(x) {
        return Err(Error::NonFiniteInput { row, col });
    }
    Ok(())
}

fn first_non_finite(x: ArrayView2<'_, f64>) -> Option<(usize, usize)> {
    x.indexed_iter()
        .find(|(_, v)| !v.is_finite())
        .map(|(idx, _)| idx)
}
