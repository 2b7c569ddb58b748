//! Repeated fits from different random initializations.
//!
//! EM only finds a local optimum, so the same data is usually fitted several
//! times. Trial `t` seeds its initializer with `base_seed + t`, which keeps a
//! whole multi-trial run reproducible without any shared random state.
//! Trials are independent and run on the rayon pool when the `parallel`
//! feature is enabled.

use crate::dataset::SplitDataset;
use crate::error::Result;
use crate::model::{Gmm, GmmFit};
use tracing::warn;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of trials run by default.
pub const DEFAULT_TRIALS: usize = 3;

/// Results of one trial.
#[derive(Debug)]
pub struct TrialOutcome {
    /// Trial index.
    pub trial: usize,
    /// Seed used by both fits of this trial.
    pub seed: u64,
    /// Fit on the unlabeled rows.
    pub unsupervised: Result<GmmFit>,
    /// Fit using the labeled rows as well; `None` when the data has no labels.
    pub semi_supervised: Option<Result<GmmFit>>,
}

/// Run `n_trials` unsupervised (and, with labels, semi-supervised) fits.
///
/// A failing fit is recorded in its outcome and does not stop the other
/// trials. Outcomes are returned in trial order.
pub fn run_trials(
    gmm: &Gmm,
    data: &SplitDataset,
    n_trials: usize,
    base_seed: u64,
) -> Vec<TrialOutcome> {
    let run_one = |trial: usize| {
        let seed = base_seed.wrapping_add(trial as u64);
        let model = gmm.clone().with_seed(seed);

        let unsupervised = model.fit(data.unlabeled.view());
        let semi_supervised = data.has_labels().then(|| {
            model.fit_semi_supervised(data.unlabeled.view(), data.labeled.view(), &data.labels)
        });

        for (mode, result) in [
            ("unsupervised", Some(&unsupervised)),
            ("semi-supervised", semi_supervised.as_ref()),
        ] {
            if let Some(Err(e)) = result {
                warn!(trial, seed, mode, error = %e, "trial failed");
            }
        }

        TrialOutcome {
            trial,
            seed,
            unsupervised,
            semi_supervised,
        }
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<TrialOutcome> = (0..n_trials).into_par_iter().map(run_one).collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<TrialOutcome> = (0..n_trials).map(run_one).collect();

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn split() -> SplitDataset {
        SplitDataset {
            unlabeled: array![
                [0.0, 0.0],
                [0.3, 0.1],
                [0.1, 0.4],
                [-0.2, 0.2],
                [9.0, 9.0],
                [9.2, 8.9],
                [8.8, 9.3],
                [9.1, 9.4],
            ],
            labeled: array![[0.1, 0.1], [9.0, 9.2]],
            labels: vec![0, 1],
        }
    }

    #[test]
    fn test_trials_are_ordered_and_seeded() {
        let gmm = Gmm::new().with_n_components(2);
        let outcomes = run_trials(&gmm, &split(), 3, 229);
        assert_eq!(outcomes.len(), 3);
        for (t, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.trial, t);
            assert_eq!(outcome.seed, 229 + t as u64);
            assert!(outcome.unsupervised.is_ok());
            assert!(matches!(outcome.semi_supervised, Some(Ok(_))));
        }
    }

    #[test]
    fn test_trials_reproducible() {
        let gmm = Gmm::new().with_n_components(2);
        let a = run_trials(&gmm, &split(), 2, 5);
        let b = run_trials(&gmm, &split(), 2, 5);
        for (x, y) in a.iter().zip(b.iter()) {
            let (Ok(fx), Ok(fy)) = (&x.unsupervised, &y.unsupervised) else {
                panic!("fit failed");
            };
            assert_eq!(fx.responsibilities, fy.responsibilities);
        }
    }

    #[test]
    fn test_no_labels_skips_semi_supervised() {
        let mut data = split();
        data.labeled = Array2::zeros((0, 2));
        data.labels.clear();
        let outcomes = run_trials(&Gmm::new().with_n_components(2), &data, 1, 0);
        assert!(outcomes[0].semi_supervised.is_none());
    }

    #[test]
    fn test_failures_are_recorded_per_trial() {
        let mut data = split();
        // Seven rows cannot be split into two equal groups.
        data.unlabeled = data.unlabeled.slice(ndarray::s![..7, ..]).to_owned();
        let outcomes = run_trials(&Gmm::new().with_n_components(2), &data, 2, 0);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.unsupervised.is_err()));
    }
}
