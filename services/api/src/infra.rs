use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use budget_optimizer::config::SolverConfig;
use budget_optimizer::optimizer::{
    BudgetOptimizer, Category, CategoryRegistry, MicroLpBackend, MAX_RATING, MIN_RATING,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Engine over the standard registry, with solver bounds from configuration.
pub(crate) fn build_optimizer(solver: &SolverConfig) -> BudgetOptimizer {
    BudgetOptimizer::with_backend(
        CategoryRegistry::standard(),
        Arc::new(MicroLpBackend),
        solver.options(),
    )
}

/// Parse a `Category=rating` pair, e.g. `Food=8`.
pub(crate) fn parse_rating(raw: &str) -> Result<(Category, u8), String> {
    let (label, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected Category=rating, got '{raw}'"))?;
    let category =
        Category::from_label(label).ok_or_else(|| format!("unknown category '{label}'"))?;
    let rating: u8 = value
        .trim()
        .parse()
        .map_err(|_| format!("rating for {category} must be an integer, got '{value}'"))?;
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(format!(
            "rating for {category} must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        ));
    }
    Ok((category, rating))
}
