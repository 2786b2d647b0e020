mod cli;
mod infra;
mod oneshot;
mod routes;
mod server;

use budget_optimizer::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
