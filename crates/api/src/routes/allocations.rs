//! Batch registration and allocation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::NaiveDate;
use domain::Command;
use messagebus::MessageBus;
use product_store::ProductStore;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: ProductStore> {
    pub bus: MessageBus<S>,
}

// -- Request types --

#[derive(Deserialize)]
pub struct AddBatchRequest {
    pub reference: String,
    pub sku: String,
    pub quantity: i64,
    pub eta: Option<String>,
}

#[derive(Deserialize)]
pub struct AllocateRequest {
    pub order_id: String,
    pub sku: String,
    pub quantity: u32,
}

// -- Response types --

#[derive(Serialize)]
pub struct BatchCreatedResponse {
    pub reference: String,
}

#[derive(Serialize)]
pub struct AllocationAcceptedResponse {
    pub status: &'static str,
}

// -- Handlers --

/// POST /batches — register a new batch of purchased stock.
#[tracing::instrument(skip(state, req))]
pub async fn add_batch<S: ProductStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AddBatchRequest>,
) -> Result<(StatusCode, Json<BatchCreatedResponse>), ApiError> {
    let eta = parse_eta(req.eta.as_deref())?;

    state
        .bus
        .handle(Command::create_batch(
            req.reference.as_str(),
            req.sku.as_str(),
            req.quantity,
            eta,
        ))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(BatchCreatedResponse {
            reference: req.reference,
        }),
    ))
}

/// POST /allocations — allocate an order line against a sku's batches.
///
/// The allocation outcome travels through events, so running out of
/// stock is still an accepted command: only unknown skus and
/// infrastructure failures surface as errors here.
#[tracing::instrument(skip(state, req))]
pub async fn allocate<S: ProductStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<AllocateRequest>,
) -> Result<(StatusCode, Json<AllocationAcceptedResponse>), ApiError> {
    state
        .bus
        .handle(Command::allocate(
            req.order_id.as_str(),
            req.sku.as_str(),
            req.quantity,
        ))
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(AllocationAcceptedResponse {
            status: "accepted",
        }),
    ))
}

fn parse_eta(eta: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    eta.map(|s| {
        s.parse()
            .map_err(|e| ApiError::BadRequest(format!("Invalid eta: {e}")))
    })
    .transpose()
}
