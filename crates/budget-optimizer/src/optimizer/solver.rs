use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use good_lp::{constraint, variable, variables, Expression, ResolutionError, Solution, SolverModel};
use tracing::warn;

/// Comparison operator for one linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    LessEq,
    GreaterEq,
    Eq,
}

/// Continuous variable with finite bounds and an objective coefficient.
#[derive(Debug, Clone, PartialEq)]
pub struct LpVariableSpec {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
}

/// Linear constraint over variable indices.
#[derive(Debug, Clone, PartialEq)]
pub struct LpConstraint {
    pub name: String,
    pub terms: Vec<(usize, f64)>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

/// Assembled maximization model handed to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LpModel {
    pub variables: Vec<LpVariableSpec>,
    pub constraints: Vec<LpConstraint>,
}

/// Optimal variable assignment, indexed like `LpModel::variables`.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    #[error("constraints are mutually unsatisfiable")]
    Infeasible,
    #[error("model reported unbounded despite finite variable bounds")]
    Unbounded,
    #[error("solver backend error: {0}")]
    Backend(String),
    #[error("solver exceeded the {0:?} timeout")]
    Timeout(Duration),
}

/// Narrow solving interface so the LP backend stays swappable without
/// touching constraint or objective construction.
pub trait LpBackend: Send + Sync {
    fn solve(&self, model: &LpModel) -> Result<LpSolution, SolverError>;
}

/// Production backend: `good_lp` over the pure-Rust microlp simplex solver.
#[derive(Debug, Default, Clone, Copy)]
pub struct MicroLpBackend;

impl LpBackend for MicroLpBackend {
    fn solve(&self, model: &LpModel) -> Result<LpSolution, SolverError> {
        let mut problem = variables!();
        let handles: Vec<good_lp::Variable> = model
            .variables
            .iter()
            .map(|spec| problem.add(variable().min(spec.lower).max(spec.upper)))
            .collect();

        let objective: Expression = model
            .variables
            .iter()
            .zip(&handles)
            .map(|(spec, handle)| spec.objective * *handle)
            .sum();

        let mut solver = problem.maximise(objective).using(good_lp::default_solver);
        for planned in &model.constraints {
            let lhs: Expression = planned
                .terms
                .iter()
                .map(|(index, coefficient)| *coefficient * handles[*index])
                .sum();
            let bound = match planned.op {
                ConstraintOp::LessEq => constraint!(lhs <= planned.rhs),
                ConstraintOp::GreaterEq => constraint!(lhs >= planned.rhs),
                ConstraintOp::Eq => constraint!(lhs == planned.rhs),
            };
            solver = solver.with(bound);
        }

        let solution = solver.solve().map_err(|err| match err {
            ResolutionError::Infeasible => SolverError::Infeasible,
            ResolutionError::Unbounded => SolverError::Unbounded,
            other => SolverError::Backend(other.to_string()),
        })?;

        Ok(LpSolution {
            values: handles.iter().map(|handle| solution.value(*handle)).collect(),
        })
    }
}

/// Hardening knobs around the backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverOptions {
    /// Wall-clock bound on one solve attempt.
    pub timeout: Duration,
    /// Total attempts for transient failures; infeasible and unbounded
    /// results are never retried (the model is deterministic).
    pub max_attempts: u32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_attempts: 2,
        }
    }
}

fn solve_once(
    backend: &Arc<dyn LpBackend>,
    model: &LpModel,
    timeout: Duration,
) -> Result<LpSolution, SolverError> {
    let (sender, receiver) = mpsc::channel();
    let backend = Arc::clone(backend);
    let model = model.clone();
    thread::spawn(move || {
        // The receiver may have timed out and dropped; nothing to do then.
        let _ = sender.send(backend.solve(&model));
    });

    match receiver.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(SolverError::Timeout(timeout)),
    }
}

/// Solve with a bounded timeout per attempt and bounded retries on
/// transient failures.
pub(crate) fn solve(
    backend: &Arc<dyn LpBackend>,
    model: &LpModel,
    options: &SolverOptions,
) -> Result<LpSolution, SolverError> {
    let attempts = options.max_attempts.max(1);
    let mut last = SolverError::Backend("solver produced no result".to_string());
    for attempt in 1..=attempts {
        match solve_once(backend, model, options.timeout) {
            Ok(solution) => return Ok(solution),
            Err(err @ (SolverError::Infeasible | SolverError::Unbounded)) => return Err(err),
            Err(err) => {
                warn!(attempt, %err, "solver attempt failed");
                last = err;
            }
        }
    }
    Err(last)
}
