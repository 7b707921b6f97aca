//! Streams a plate parameter study through the POD2G pipeline.
//!
//! Run with `RUST_LOG=info cargo run --example plate_stream` to see the
//! training event, or `RUST_LOG=debug` for per-solve iteration counts.

use pod2g::{
    AffineSurrogate, ElasticPlate, KError, Pod2gOptions, SolvePath, TrainingOrchestrator,
    sample_normal_parameters,
};

fn main() -> Result<(), KError> {
    env_logger::init();

    let total = 300;
    let training = 50;
    let opts = Pod2gOptions::default().with_pod_rank(8).with_warm_start(true);
    let plate = ElasticPlate::new(16)?.with_substrate(4000.0)?;
    let monitored = plate.monitored_dof();
    // E [MPa], P [MPa]
    let params = sample_normal_parameters(total, &[2000.0, -10.0], &[600.0, 3.0], opts.seed)?;

    let mut orch = TrainingOrchestrator::new(&plate, AffineSurrogate::default(), params, training, opts)?;
    let (mut baseline_its, mut accelerated_its, mut sum) = (0usize, 0usize, 0.0);
    for response in orch.by_ref() {
        let response = response?;
        match response.path {
            SolvePath::Baseline => baseline_its += response.stats.iterations,
            SolvePath::Accelerated => accelerated_its += response.stats.iterations,
        }
        sum += response.solution[monitored];
    }

    if let Some(report) = orch.training_report() {
        println!(
            "trained after sample {} on {} snapshots: POD rank {}, leading singular values {:?}",
            report.after_index,
            report.samples,
            report.rank,
            &report.singular_values[..report.rank.min(3)]
        );
    }
    println!(
        "mean PCG iterations: baseline {:.1}, POD-AMG {:.1}",
        baseline_its as f64 / training as f64,
        accelerated_its as f64 / (total - training) as f64
    );
    println!(
        "Total analyses: {}. Training analyses: {}. Mean uTop={:.6e}",
        total,
        training,
        sum / total as f64
    );
    Ok(())
}
