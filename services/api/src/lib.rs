mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use unit_valuation::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
