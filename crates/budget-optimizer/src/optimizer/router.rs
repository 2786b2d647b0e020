use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{resolve_ratings, Allocation, BudgetRequest, Category};
use super::policy::PolicyProfile;
use super::{BudgetOptimizer, OptimizeError};
use crate::export::{self, ExportError};

pub const CSV_ATTACHMENT_NAME: &str = "optimized_budget.csv";

/// Router builder exposing HTTP endpoints for the optimization engine.
pub fn budget_router(optimizer: Arc<BudgetOptimizer>) -> Router {
    Router::new()
        .route("/api/v1/budget/optimize", post(optimize_handler))
        .route("/api/v1/budget/export", post(export_handler))
        .with_state(optimizer)
}

/// Ratings arrive string-keyed so an unknown category surfaces as a
/// validation error (400) instead of a body-deserialization rejection.
#[derive(Debug, Clone, Deserialize)]
pub struct OptimizeRequestBody {
    pub income: f64,
    pub savings_target: f64,
    pub ratings: BTreeMap<String, u8>,
    #[serde(default)]
    pub policy: PolicyProfile,
}

#[derive(Debug, Serialize)]
pub struct AllocationEntryView {
    pub category: Category,
    pub amount: f64,
    pub formatted: String,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponseBody {
    pub generated_at: NaiveDate,
    pub income: f64,
    pub entries: Vec<AllocationEntryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unallocated: Option<f64>,
    pub total_allocated: f64,
}

impl OptimizeResponseBody {
    fn from_allocation(income: f64, allocation: &Allocation) -> Self {
        let entries = allocation
            .entries()
            .map(|(category, amount)| AllocationEntryView {
                category,
                amount,
                formatted: export::format_kshs(amount),
            })
            .collect();
        Self {
            generated_at: Local::now().date_naive(),
            income,
            entries,
            unallocated: allocation.unallocated(),
            total_allocated: allocation.total_allocated(),
        }
    }
}

fn run_optimization(
    optimizer: &BudgetOptimizer,
    body: OptimizeRequestBody,
) -> Result<Allocation, OptimizeError> {
    let ratings = resolve_ratings(body.ratings)?;
    let request = BudgetRequest::new(
        optimizer.registry(),
        body.income,
        body.savings_target,
        ratings,
        body.policy,
    )?;
    optimizer.optimize(&request)
}

fn error_response(err: &OptimizeError) -> Response {
    let status = match err {
        OptimizeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        OptimizeError::Infeasible => StatusCode::UNPROCESSABLE_ENTITY,
        OptimizeError::Unbounded
        | OptimizeError::Solver { .. }
        | OptimizeError::InconsistentSolution(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn optimize_handler(
    State(optimizer): State<Arc<BudgetOptimizer>>,
    Json(body): Json<OptimizeRequestBody>,
) -> Response {
    let income = body.income;
    match run_optimization(&optimizer, body) {
        Ok(allocation) => {
            let view = OptimizeResponseBody::from_allocation(income, &allocation);
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

pub(crate) async fn export_handler(
    State(optimizer): State<Arc<BudgetOptimizer>>,
    Json(body): Json<OptimizeRequestBody>,
) -> Response {
    match run_optimization(&optimizer, body).map(|allocation| export::allocation_csv(&allocation))
    {
        Ok(Ok(csv_text)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{CSV_ATTACHMENT_NAME}\""),
                ),
            ],
            csv_text,
        )
            .into_response(),
        Ok(Err(err)) => export_error_response(&err),
        Err(err) => error_response(&err),
    }
}

fn export_error_response(err: &ExportError) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
