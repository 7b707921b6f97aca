//! The training/streaming orchestrator.
//!
//! [`TrainingOrchestrator`] walks an ordered list of parameter vectors. The
//! first `training_count` samples are solved with the baseline
//! preconditioner and their solutions are kept. Right after the last of
//! them, a single training event builds the POD basis, the POD-AMG state and
//! the surrogate; every remaining sample is then solved with POD-AMG.
//!
//! ```text
//! Collecting ──(training_count-th sample)──▶ Training ──▶ Accelerated
//! ```
//!
//! The orchestrator is a lazy, single-pass iterator over
//! `Result<SampleResponse, KError>` in input order. After an error it is
//! exhausted.

use std::iter::FusedIterator;
use std::sync::Arc;

use faer::Mat;

use crate::config::{DivergencePolicy, Pod2gOptions};
use crate::context::{KspContext, SolveOutcome};
use crate::error::KError;
use crate::model::{LinearSystem, LinearSystemProvider};
use crate::preconditioner::{PodAmg, PodAmgState};
use crate::reduction::{PodBasis, PodBasisBuilder};
use crate::surrogate::{Surrogate, SurrogateModel};
use crate::utils::convergence::SolveStats;

pub mod dataset;

pub use dataset::TrainingDataset;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Training,
    Accelerated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvePath {
    Baseline,
    Accelerated,
}

/// One solved sample.
#[derive(Debug, Clone)]
pub struct SampleResponse {
    /// Position in the input sequence.
    pub index: usize,
    pub solution: Vec<f64>,
    pub path: SolvePath,
    pub stats: SolveStats<f64>,
}

/// What the training event produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Index of the sample right after which training ran.
    pub after_index: usize,
    pub samples: usize,
    pub dof_count: usize,
    /// Effective POD rank.
    pub rank: usize,
    pub singular_values: Vec<f64>,
}

struct Trained<M> {
    state: Arc<PodAmgState>,
    model: M,
}

pub struct TrainingOrchestrator<P, S: Surrogate> {
    provider: P,
    surrogate: S,
    options: Pod2gOptions,
    ksp: KspContext,
    parameters: Vec<Vec<f64>>,
    training_count: usize,
    next: usize,
    phase: Phase,
    dataset: Option<TrainingDataset>,
    dof_count: Option<usize>,
    trained: Option<Trained<S::Model>>,
    report: Option<TrainingReport>,
    training_events: usize,
    failed: bool,
}

impl<P: LinearSystemProvider, S: Surrogate> TrainingOrchestrator<P, S> {
    /// Checks the run configuration up front: `0 < training_count ≤ total`,
    /// every parameter vector has the provider's length, options are valid.
    pub fn new(
        provider: P,
        surrogate: S,
        parameters: Vec<Vec<f64>>,
        training_count: usize,
        options: Pod2gOptions,
    ) -> Result<Self, KError> {
        options.validate()?;
        if training_count == 0 || training_count > parameters.len() {
            return Err(KError::Configuration(format!(
                "training count must be in 1..={}, got {}",
                parameters.len(),
                training_count
            )));
        }
        let expected = provider.parameter_count();
        if let Some(pos) = parameters.iter().position(|p| p.len() != expected) {
            return Err(KError::Configuration(format!(
                "parameter vector {pos} has length {}, expected {expected}",
                parameters[pos].len()
            )));
        }
        Ok(Self {
            ksp: KspContext::from_options(&options),
            dataset: Some(TrainingDataset::with_capacity(training_count)),
            provider,
            surrogate,
            options,
            parameters,
            training_count,
            next: 0,
            phase: Phase::Collecting,
            dof_count: None,
            trained: None,
            report: None,
            training_events: 0,
            failed: false,
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn options(&self) -> &Pod2gOptions {
        &self.options
    }

    pub fn training_count(&self) -> usize {
        self.training_count
    }

    pub fn total_count(&self) -> usize {
        self.parameters.len()
    }

    /// DOF count fixed by the first assembled system.
    pub fn dof_count(&self) -> Option<usize> {
        self.dof_count
    }

    pub fn training_events(&self) -> usize {
        self.training_events
    }

    pub fn training_report(&self) -> Option<&TrainingReport> {
        self.report.as_ref()
    }

    pub fn preconditioner_state(&self) -> Option<Arc<PodAmgState>> {
        self.trained.as_ref().map(|t| Arc::clone(&t.state))
    }

    pub fn surrogate_model(&self) -> Option<&S::Model> {
        self.trained.as_ref().map(|t| &t.model)
    }

    /// Solve an arbitrary parameter vector on the exact path.
    pub fn solve_baseline(&self, parameters: &[f64]) -> Result<SolveOutcome, KError> {
        baseline_solve(&self.provider, &self.ksp, parameters, self.dof_count)
    }

    /// Solve an arbitrary parameter vector with the trained POD-AMG.
    pub fn solve_accelerated(&self, parameters: &[f64]) -> Result<SolveOutcome, KError> {
        let trained = self.trained()?;
        accelerated_solve(
            &self.provider,
            &self.ksp,
            trained,
            self.options.warm_start,
            parameters,
            self.dof_count,
        )
    }

    /// Surrogate prediction lifted to the full space.
    pub fn predict_solution(&self, parameters: &[f64]) -> Result<Vec<f64>, KError> {
        predicted_solution(self.trained()?, parameters)
    }

    fn trained(&self) -> Result<&Trained<S::Model>, KError> {
        self.trained
            .as_ref()
            .ok_or_else(|| KError::Configuration("no trained POD preconditioner yet".into()))
    }

    fn step(&mut self, index: usize) -> Result<SampleResponse, KError> {
        match self.phase {
            Phase::Collecting => {
                let outcome = self.solve_baseline(&self.parameters[index])?;
                let response = self.accept(index, SolvePath::Baseline, outcome)?;
                self.register(index, response.solution.clone())?;
                Ok(response)
            }
            Phase::Accelerated => {
                let outcome = self.solve_accelerated(&self.parameters[index])?;
                self.accept(index, SolvePath::Accelerated, outcome)
            }
            Phase::Training => Err(KError::Configuration(format!(
                "sample {index} requested while training was incomplete"
            ))),
        }
    }

    /// Fixes the DOF count and applies the divergence policy.
    fn accept(&mut self, index: usize, path: SolvePath, outcome: SolveOutcome) -> Result<SampleResponse, KError> {
        let dofs = outcome.solution.len();
        match self.dof_count {
            Some(expected) if expected != dofs => {
                return Err(KError::DimensionMismatch { expected, found: dofs });
            }
            Some(_) => {}
            None => self.dof_count = Some(dofs),
        }
        let stats = outcome.stats;
        if !stats.converged && self.options.on_divergence == DivergencePolicy::Fail {
            return Err(KError::NotConverged {
                index,
                iterations: stats.iterations,
                residual: stats.final_residual,
            });
        }
        Ok(SampleResponse { index, solution: outcome.solution, path, stats })
    }

    /// Stores a collected pair and fires training after the last one, unless
    /// nothing is left to accelerate.
    fn register(&mut self, index: usize, solution: Vec<f64>) -> Result<(), KError> {
        let dataset = self
            .dataset
            .as_mut()
            .ok_or_else(|| KError::Configuration("training data was already consumed".into()))?;
        dataset.register(self.parameters[index].clone(), solution)?;
        if dataset.len() == self.training_count && self.training_count < self.parameters.len() {
            self.train(index)?;
        }
        Ok(())
    }

    fn train(&mut self, after_index: usize) -> Result<(), KError> {
        if self.trained.is_some() || self.training_events > 0 {
            return Err(KError::Configuration("the POD preconditioner was already built for this run".into()));
        }
        self.phase = Phase::Training;
        let dataset = self
            .dataset
            .take()
            .ok_or_else(|| KError::Configuration("training data was already consumed".into()))?;
        if dataset.len() != self.training_count {
            return Err(KError::Configuration(format!(
                "expected {} training pairs, found {}",
                self.training_count,
                dataset.len()
            )));
        }
        let (params, snapshots) = dataset.into_matrices()?;
        let basis = PodBasisBuilder::new(self.options.pod_rank)
            .keep_only_nonzero(self.options.keep_only_nonzero)
            .build(&snapshots)?;
        // reduced coordinates, one row per sample
        let snapshots_t = snapshots.transpose().to_owned();
        let reduced: Mat<f64> = &snapshots_t * basis.modes();
        let dof_count = snapshots.nrows();
        drop(snapshots);

        if params.nrows() != reduced.nrows() || params.nrows() != self.training_count {
            return Err(KError::Configuration(format!(
                "surrogate rows differ: {} parameter rows, {} response rows, {} training samples",
                params.nrows(),
                reduced.nrows(),
                self.training_count
            )));
        }
        let model = self.surrogate.train(&params, &reduced)?;

        let report = TrainingReport {
            after_index,
            samples: self.training_count,
            dof_count,
            rank: basis.rank(),
            singular_values: basis.singular_values().to_vec(),
        };
        log::info!(
            "POD2G training after sample {}: {} snapshots, {} dofs, POD rank {} (requested {})",
            after_index,
            report.samples,
            report.dof_count,
            report.rank,
            self.options.pod_rank
        );
        let state = PodAmgState::new(basis, self.options.smoother, self.options.cycles)?;
        self.trained = Some(Trained { state: Arc::new(state), model });
        self.report = Some(report);
        self.training_events += 1;
        self.phase = Phase::Accelerated;
        Ok(())
    }
}

#[cfg(feature = "rayon")]
impl<P, S> TrainingOrchestrator<P, S>
where
    P: LinearSystemProvider + Sync,
    S: Surrogate,
{
    /// Runs the whole sequence with the solves of each phase fanned out on
    /// the rayon pool.
    ///
    /// Responses come back in input order. Collected solutions are registered
    /// in index order, training runs once on the calling thread, and the
    /// accelerated solves share the preconditioner state and the trained
    /// model read-only.
    pub fn run_parallel(&mut self) -> Result<Vec<SampleResponse>, KError> {
        if self.next != 0 || self.failed {
            return Err(KError::Configuration("run_parallel needs a fresh orchestrator".into()));
        }
        self.next = self.parameters.len();
        let result = self.run_parallel_phases();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn run_parallel_phases(&mut self) -> Result<Vec<SampleResponse>, KError> {
        use rayon::prelude::*;

        let total = self.parameters.len();
        let n_train = self.training_count;
        let mut responses = Vec::with_capacity(total);

        let collected: Vec<Result<SolveOutcome, KError>> = {
            let (provider, ksp, params) = (&self.provider, &self.ksp, &self.parameters);
            (0..n_train)
                .into_par_iter()
                .map(|i| baseline_solve(provider, ksp, &params[i], None))
                .collect()
        };
        for (index, outcome) in collected.into_iter().enumerate() {
            let response = self.accept(index, SolvePath::Baseline, outcome?)?;
            self.register(index, response.solution.clone())?;
            responses.push(response);
        }

        if n_train < total {
            let trained = self.trained()?;
            let (provider, ksp, params) = (&self.provider, &self.ksp, &self.parameters);
            let (warm_start, dofs) = (self.options.warm_start, self.dof_count);
            let accelerated: Vec<Result<SolveOutcome, KError>> = (n_train..total)
                .into_par_iter()
                .map(|i| accelerated_solve(provider, ksp, trained, warm_start, &params[i], dofs))
                .collect();
            for (offset, outcome) in accelerated.into_iter().enumerate() {
                responses.push(self.accept(n_train + offset, SolvePath::Accelerated, outcome?)?);
            }
        }
        Ok(responses)
    }
}

impl<P: LinearSystemProvider, S: Surrogate> Iterator for TrainingOrchestrator<P, S> {
    type Item = Result<SampleResponse, KError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.next >= self.parameters.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        let result = self.step(index);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.failed {
            (0, Some(0))
        } else {
            let remaining = self.parameters.len() - self.next;
            (0, Some(remaining))
        }
    }
}

impl<P: LinearSystemProvider, S: Surrogate> FusedIterator for TrainingOrchestrator<P, S> {}

fn assemble<P: LinearSystemProvider>(
    provider: &P,
    parameters: &[f64],
    dof_count: Option<usize>,
) -> Result<LinearSystem, KError> {
    if parameters.len() != provider.parameter_count() {
        return Err(KError::Configuration(format!(
            "parameter vector has length {}, expected {}",
            parameters.len(),
            provider.parameter_count()
        )));
    }
    let system = provider.system(parameters)?;
    if let Some(expected) = dof_count {
        if system.dof_count() != expected {
            return Err(KError::DimensionMismatch { expected, found: system.dof_count() });
        }
    }
    Ok(system)
}

fn baseline_solve<P: LinearSystemProvider>(
    provider: &P,
    ksp: &KspContext,
    parameters: &[f64],
    dof_count: Option<usize>,
) -> Result<SolveOutcome, KError> {
    let system = assemble(provider, parameters, dof_count)?;
    ksp.solve(&system.matrix, &system.rhs, None, None)
}

fn accelerated_solve<P: LinearSystemProvider, M: SurrogateModel>(
    provider: &P,
    ksp: &KspContext,
    trained: &Trained<M>,
    warm_start: bool,
    parameters: &[f64],
    dof_count: Option<usize>,
) -> Result<SolveOutcome, KError> {
    let system = assemble(provider, parameters, dof_count)?;
    let pc = PodAmg::new(&trained.state, &system.matrix)?;
    let x0 = if warm_start { Some(predicted_solution(trained, parameters)?) } else { None };
    ksp.solve(&system.matrix, &system.rhs, Some(&pc), x0.as_deref())
}

fn predicted_solution<M: SurrogateModel>(trained: &Trained<M>, parameters: &[f64]) -> Result<Vec<f64>, KError> {
    let basis: &PodBasis = trained.state.basis();
    let q = trained.model.predict(parameters)?;
    if q.len() != basis.rank() {
        return Err(KError::Configuration(format!(
            "surrogate predicted {} reduced coordinates, POD rank is {}",
            q.len(),
            basis.rank()
        )));
    }
    Ok(basis.lift(&q))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::CsrMatrix;
    use crate::surrogate::NoSurrogate;

    /// Tridiagonal `θ₀ · tridiag(-1, 2, -1) + θ₁ I` with a unit load.
    struct Chain {
        n: usize,
    }

    impl LinearSystemProvider for Chain {
        fn parameter_count(&self) -> usize {
            2
        }

        fn system(&self, p: &[f64]) -> Result<LinearSystem, KError> {
            let mut t = Vec::new();
            for i in 0..self.n {
                t.push((i, i, 2.0 * p[0] + p[1]));
                if i > 0 {
                    t.push((i, i - 1, -p[0]));
                    t.push((i - 1, i, -p[0]));
                }
            }
            let rhs = (0..self.n).map(|i| 1.0 + (i % 3) as f64).collect();
            LinearSystem::new(CsrMatrix::from_triplets(self.n, self.n, &t)?, rhs)
        }
    }

    fn params(count: usize) -> Vec<Vec<f64>> {
        (0..count).map(|i| vec![1.0 + 0.1 * i as f64, 0.5 + 0.05 * (i % 4) as f64]).collect()
    }

    fn options() -> Pod2gOptions {
        Pod2gOptions::default().with_max_iterations_fraction(2.0).with_tolerance(1e-10)
    }

    #[test]
    fn phases_follow_the_training_threshold() {
        let mut orch = TrainingOrchestrator::new(Chain { n: 20 }, NoSurrogate, params(6), 3, options()).unwrap();
        assert_eq!(orch.phase(), Phase::Collecting);
        for i in 0..3 {
            let r = orch.next().unwrap().unwrap();
            assert_eq!(r.path, SolvePath::Baseline);
            assert_eq!(r.index, i);
        }
        assert_eq!(orch.phase(), Phase::Accelerated);
        assert_eq!(orch.training_events(), 1);
        assert_eq!(orch.training_report().unwrap().after_index, 2);
        let rest: Vec<_> = orch.by_ref().collect::<Result<_, _>>().unwrap();
        assert_eq!(rest.len(), 3);
        assert!(rest.iter().all(|r| r.path == SolvePath::Accelerated && r.stats.converged));
        assert!(orch.next().is_none());
    }

    #[test]
    fn second_training_is_rejected() {
        let mut orch = TrainingOrchestrator::new(Chain { n: 10 }, NoSurrogate, params(3), 1, options()).unwrap();
        orch.next().unwrap().unwrap();
        assert_eq!(orch.training_events(), 1);
        assert!(matches!(orch.train(0), Err(KError::Configuration(_))));
        assert_eq!(orch.training_events(), 1);
    }

    #[test]
    fn invalid_training_counts_are_rejected() {
        assert!(TrainingOrchestrator::new(Chain { n: 4 }, NoSurrogate, params(3), 0, options()).is_err());
        assert!(TrainingOrchestrator::new(Chain { n: 4 }, NoSurrogate, params(3), 4, options()).is_err());
        let mut ragged = params(3);
        ragged[1].push(1.0);
        assert!(matches!(
            TrainingOrchestrator::new(Chain { n: 4 }, NoSurrogate, ragged, 2, options()),
            Err(KError::Configuration(_))
        ));
    }

    #[test]
    fn fail_policy_stops_the_stream() {
        let opts = options().with_max_iterations_fraction(0.05).with_divergence_policy(DivergencePolicy::Fail);
        let mut orch = TrainingOrchestrator::new(Chain { n: 40 }, NoSurrogate, params(4), 2, opts).unwrap();
        assert!(matches!(orch.next(), Some(Err(KError::NotConverged { index: 0, .. }))));
        assert!(orch.next().is_none());
    }

    #[test]
    fn accelerated_solve_needs_training() {
        let orch = TrainingOrchestrator::new(Chain { n: 8 }, NoSurrogate, params(2), 1, options()).unwrap();
        assert!(orch.solve_baseline(&[1.0, 1.0]).is_ok());
        assert!(matches!(orch.solve_accelerated(&[1.0, 1.0]), Err(KError::Configuration(_))));
    }
}
