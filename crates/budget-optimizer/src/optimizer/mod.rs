//! Budget optimization engine: turns raw priorities and income into a linear
//! program, solves it, and interprets the result into a validated allocation.
//!
//! The engine is a pure synchronous function of its inputs; each call builds
//! and discards its own model, so concurrent calls need no coordination.

pub(crate) mod constraints;
pub mod domain;
pub(crate) mod objective;
pub mod policy;
pub mod registry;
pub mod router;
pub mod solver;
pub(crate) mod utility;

pub use domain::{
    resolve_ratings, Allocation, BudgetRequest, Category, ValidationError, MAX_RATING, MIN_RATING,
};
pub use policy::{BudgetMode, PolicyProfile, RentBoost, UtilityMode};
pub use registry::{CategoryDefaults, CategoryRegistry, RegistryError};
pub use router::budget_router;
pub use solver::{LpBackend, MicroLpBackend, SolverError, SolverOptions};

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use constraints::ModelPlan;
use solver::LpSolution;

/// Slack allowed when checking solver output against the model's own bounds.
const SOLUTION_TOLERANCE: f64 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    #[error(transparent)]
    InvalidInput(#[from] ValidationError),
    #[error("no allocation satisfies every constraint")]
    Infeasible,
    #[error("model reported unbounded despite finite variable bounds")]
    Unbounded,
    #[error("solver failed after {attempts} attempt(s): {source}")]
    Solver { attempts: u32, source: SolverError },
    #[error("solver returned an inconsistent allocation: {0}")]
    InconsistentSolution(String),
}

/// Stateless optimizer applying one registry and solver configuration to
/// every request.
pub struct BudgetOptimizer {
    registry: CategoryRegistry,
    backend: Arc<dyn LpBackend>,
    options: SolverOptions,
}

impl BudgetOptimizer {
    pub fn new(registry: CategoryRegistry) -> Self {
        Self::with_backend(registry, Arc::new(MicroLpBackend), SolverOptions::default())
    }

    /// Optimizer over the standard registry and production backend.
    pub fn standard() -> Self {
        Self::new(CategoryRegistry::standard())
    }

    pub fn with_backend(
        registry: CategoryRegistry,
        backend: Arc<dyn LpBackend>,
        options: SolverOptions,
    ) -> Self {
        Self {
            registry,
            backend,
            options,
        }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Build, solve, and interpret the linear program for one request.
    pub fn optimize(&self, request: &BudgetRequest) -> Result<Allocation, OptimizeError> {
        request.validate_against(&self.registry)?;

        let rent_waived = utility::rent_waived(request);
        let weights = utility::weights(request, rent_waived);
        let plan = constraints::plan(&self.registry, request, rent_waived);
        let model = objective::compose(&plan, &weights);

        debug!(
            income = request.income(),
            variables = model.variables.len(),
            constraints = model.constraints.len(),
            rent_waived,
            "assembled budget model"
        );

        let solution =
            solver::solve(&self.backend, &model, &self.options).map_err(|err| match err {
                SolverError::Infeasible => OptimizeError::Infeasible,
                SolverError::Unbounded => OptimizeError::Unbounded,
                other => OptimizeError::Solver {
                    attempts: self.options.max_attempts.max(1),
                    source: other,
                },
            })?;

        assemble(&plan, &solution)
    }
}

/// Merge solved values into a validated allocation, including the explicit
/// remainder under full-allocation mode. Zero-valued categories stay in.
fn assemble(plan: &ModelPlan, solution: &LpSolution) -> Result<Allocation, OptimizeError> {
    let mut amounts = BTreeMap::new();
    for (index, (category, bounds)) in plan.bounds.iter().enumerate() {
        let value = solution.values.get(index).copied().ok_or_else(|| {
            OptimizeError::InconsistentSolution(format!("missing value for {category}"))
        })?;
        if value < bounds.lower - SOLUTION_TOLERANCE || value > bounds.upper + SOLUTION_TOLERANCE {
            return Err(OptimizeError::InconsistentSolution(format!(
                "{category} allocation {value} escapes its bounds [{}, {}]",
                bounds.lower, bounds.upper
            )));
        }
        amounts.insert(*category, value.max(0.0));
    }

    let unallocated = match objective::remaining_index(plan) {
        Some(index) => {
            let value = solution.values.get(index).copied().ok_or_else(|| {
                OptimizeError::InconsistentSolution("missing remainder value".to_string())
            })?;
            if value < -SOLUTION_TOLERANCE {
                return Err(OptimizeError::InconsistentSolution(format!(
                    "negative remainder {value}"
                )));
            }
            let total: f64 = amounts.values().sum::<f64>() + value;
            if (total - plan.income).abs() > SOLUTION_TOLERANCE * plan.income.max(1.0) {
                return Err(OptimizeError::InconsistentSolution(format!(
                    "allocated {total} does not add up to income {}",
                    plan.income
                )));
            }
            Some(value.max(0.0))
        }
        None => None,
    };

    Ok(Allocation::new(amounts, unallocated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::solver::LpModel;

    struct FixedBackend {
        values: Vec<f64>,
    }

    impl LpBackend for FixedBackend {
        fn solve(&self, _model: &LpModel) -> Result<LpSolution, SolverError> {
            Ok(LpSolution {
                values: self.values.clone(),
            })
        }
    }

    fn request(income: f64) -> BudgetRequest {
        let registry = CategoryRegistry::standard();
        let ratings = Category::ordered().into_iter().map(|cat| (cat, 5)).collect();
        BudgetRequest::new(&registry, income, 0.0, ratings, PolicyProfile::legacy())
            .expect("valid request")
    }

    #[test]
    fn rejects_out_of_bounds_backend_values() {
        let optimizer = BudgetOptimizer::with_backend(
            CategoryRegistry::standard(),
            Arc::new(FixedBackend {
                // Rent allocated well above its income * 0.30 ceiling.
                values: vec![50_000.0, 2_000.0, 2_000.0, 1_000.0, 1_000.0, 1_000.0],
            }),
            SolverOptions::default(),
        );
        let err = optimizer
            .optimize(&request(10_000.0))
            .expect_err("inconsistent solution rejected");
        assert!(matches!(err, OptimizeError::InconsistentSolution(_)));
    }

    #[test]
    fn rejects_truncated_backend_values() {
        let optimizer = BudgetOptimizer::with_backend(
            CategoryRegistry::standard(),
            Arc::new(FixedBackend {
                values: vec![3_000.0],
            }),
            SolverOptions::default(),
        );
        let err = optimizer
            .optimize(&request(10_000.0))
            .expect_err("short solution rejected");
        assert!(matches!(err, OptimizeError::InconsistentSolution(_)));
    }
}
