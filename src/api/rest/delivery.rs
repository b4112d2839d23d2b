use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::post;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::engine::delivery;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::Order;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/:id/pickup", post(confirm_pickup))
        .route("/orders/:id/start", post(start_delivery))
        .route("/orders/:id/arrival", post(mark_arrival))
        .route("/orders/:id/complete", post(complete_delivery))
}

#[derive(Deserialize)]
pub struct PickupRequest {
    pub driver_id: Uuid,
    pub photo_ref: String,
}

#[derive(Deserialize)]
pub struct StartRequest {
    pub driver_id: Uuid,
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    pub driver_id: Uuid,
    pub photo_ref: Option<String>,
    pub handed_to_customer: Option<bool>,
}

async fn confirm_pickup(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<PickupRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(delivery::confirm_pickup(
        &state,
        &actor,
        id,
        payload.driver_id,
        payload.photo_ref,
    )?))
}

async fn start_delivery(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<StartRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(delivery::start_delivery(
        &state,
        &actor,
        id,
        payload.driver_id,
    )?))
}

async fn mark_arrival(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    delivery::mark_arrival(&state, &actor, id)?;
    Ok(Json(json!({ "ok": true })))
}

async fn complete_delivery(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<CompleteRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(delivery::complete_delivery(
        &state,
        &actor,
        id,
        payload.driver_id,
        payload.photo_ref,
        payload.handed_to_customer,
    )?))
}
