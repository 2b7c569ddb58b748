//! # semigmm
//!
//! Gaussian mixture models fitted with Expectation-Maximization, in two modes:
//!
//! - **unsupervised**: EM over an unlabeled feature matrix X;
//! - **semi-supervised**: EM over X plus a small labeled subset (X̃, z̃) whose
//!   points count as `α` pseudo-observations of known component.
//!
//! The output of a fit is the responsibility matrix W (`W[i, j]` is the
//! posterior probability that row i came from component j), together with the
//! fitted parameters and the objective trace. Hard labels are the row-wise
//! argmax of W.
//!
//! ```rust
//! use ndarray::array;
//! use semigmm::{fit_semi_supervised, fit_unsupervised};
//!
//! let x = array![
//!     [0.0, 0.0], [0.3, 0.1], [0.1, 0.4], [-0.2, 0.2],
//!     [9.0, 9.0], [9.2, 8.9], [8.8, 9.3], [9.1, 9.4],
//! ];
//! let (w, _iterations) = fit_unsupervised(x.view(), 2, Some(229)).unwrap();
//! assert_eq!(w.dim(), (8, 2));
//!
//! let x_tilde = array![[0.1, 0.1], [9.0, 9.1]];
//! let (w, _) = fit_semi_supervised(x.view(), x_tilde.view(), &[1, 0], 2, 20.0, Some(229)).unwrap();
//! assert!(w[[0, 1]] > 0.5);
//! ```
//!
//! ## Modules
//!
//! - [`density`]: multivariate normal density, factorized once per component
//! - [`init`]: random equal-size partition into starting parameters
//! - [`em`]: unsupervised E-step, M-step and objective
//! - [`semi`]: the labeled-data M-step and objective
//! - [`convergence`]: the stopping rule shared by both engines
//! - [`model`]: [`Gmm`] configuration and [`GmmFit`] results
//! - [`dataset`], [`trials`]: CSV loading and multi-seed runs around the core

pub mod convergence;
#[cfg(feature = "std")]
pub mod dataset;
pub mod density;
pub mod em;
/// Error types used across `semigmm`.
pub mod error;
pub mod init;
pub mod model;
pub mod params;
pub mod semi;
pub mod traits;
#[cfg(feature = "std")]
pub mod trials;

pub use convergence::{should_continue, LogLikelihoodTrace};
pub use density::{gaussian_pdf, GaussianDensity};
pub use error::{Error, Result};
pub use init::{initialize, CovarianceInit, Initialization};
pub use model::{argmax_rows, fit_semi_supervised, fit_unsupervised, FitMode, Gmm, GmmFit};
pub use params::MixtureParams;
pub use traits::{Clustering, SoftClustering};

#[cfg(feature = "std")]
pub use dataset::{Dataset, SplitDataset, UNLABELED};
#[cfg(feature = "std")]
pub use trials::{run_trials, TrialOutcome};
