use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use super::domain::TransactionType;
use super::service::{
    CondoValuationRequest, HomeValuationRequest, ValuationOutcome, ValuationService,
};
use super::store::{AdjustmentOverrideStore, TransactionStore};
use crate::error::AppError;

/// Router builder exposing estimate and adjustment lookup endpoints.
pub fn valuation_router<T, O>(service: Arc<ValuationService<T, O>>) -> Router
where
    T: TransactionStore + 'static,
    O: AdjustmentOverrideStore + 'static,
{
    Router::new()
        .route("/api/v1/valuation/condo", post(condo_handler::<T, O>))
        .route("/api/v1/valuation/home", post(home_handler::<T, O>))
        .route(
            "/api/v1/valuation/adjustments/:transaction_type/:building_id",
            get(adjustments_handler::<T, O>),
        )
        .with_state(service)
}

pub(crate) async fn condo_handler<T, O>(
    State(service): State<Arc<ValuationService<T, O>>>,
    Json(request): Json<CondoValuationRequest>,
) -> Result<Json<ValuationOutcome>, AppError>
where
    T: TransactionStore + 'static,
    O: AdjustmentOverrideStore + 'static,
{
    Ok(Json(service.estimate_condo(request)?))
}

pub(crate) async fn home_handler<T, O>(
    State(service): State<Arc<ValuationService<T, O>>>,
    Json(request): Json<HomeValuationRequest>,
) -> Result<Json<ValuationOutcome>, AppError>
where
    T: TransactionStore + 'static,
    O: AdjustmentOverrideStore + 'static,
{
    Ok(Json(service.estimate_home(request)?))
}

pub(crate) async fn adjustments_handler<T, O>(
    State(service): State<Arc<ValuationService<T, O>>>,
    Path((transaction_type, building_id)): Path<(String, String)>,
) -> Result<Json<Value>, AppError>
where
    T: TransactionStore + 'static,
    O: AdjustmentOverrideStore + 'static,
{
    let parsed = TransactionType::parse(&transaction_type)
        .ok_or(AppError::UnknownTransactionType(transaction_type))?;
    let resolved = service.resolve_adjustments(&building_id, parsed)?;

    Ok(Json(json!({
        "building_id": building_id,
        "transaction_type": parsed,
        "values": resolved.values,
        "source": resolved.source,
    })))
}
