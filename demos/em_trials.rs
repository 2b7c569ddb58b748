use semigmm::trials::DEFAULT_TRIALS;
use semigmm::{run_trials, Dataset, Gmm, GmmFit};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fit a CSV dataset (`x_1,x_2,z`, z = -1 for unlabeled rows) several times,
    // unsupervised and semi-supervised, and print what each trial found.
    //
    //   RUST_LOG=semigmm=debug cargo run --example em_trials -- train.csv
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let path = std::env::args()
        .nth(1)
        .ok_or("usage: em_trials <train.csv> [n_components]")?;
    let k: usize = match std::env::args().nth(2) {
        Some(s) => s.parse()?,
        None => 4,
    };

    let data = Dataset::load(&path)?.split()?;
    println!(
        "unlabeled={} labeled={} dim={}",
        data.unlabeled.nrows(),
        data.labeled.nrows(),
        data.unlabeled.ncols()
    );

    let gmm = Gmm::new().with_n_components(k);
    for outcome in run_trials(&gmm, &data, DEFAULT_TRIALS, 229) {
        println!("trial {} (seed {})", outcome.trial, outcome.seed);
        report("  unsupervised", &outcome.unsupervised);
        if let Some(semi) = &outcome.semi_supervised {
            report("  semi-supervised", semi);
        }
    }

    Ok(())
}

fn report(label: &str, result: &semigmm::Result<GmmFit>) {
    match result {
        Ok(fit) => println!(
            "{label}: iterations={} converged={} objective={:.3} sizes={:?}",
            fit.iterations,
            fit.converged,
            fit.log_likelihood().unwrap_or(f64::NAN),
            fit.cluster_sizes()
        ),
        Err(e) => println!("{label}: failed: {e}"),
    }
}
