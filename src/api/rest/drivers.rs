use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{patch, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::drivers;
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::driver::Driver;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", post(register_driver).get(list_drivers))
        .route("/drivers/:id/availability", patch(set_availability))
}

#[derive(Deserialize)]
pub struct RegisterDriverRequest {
    pub name: String,
    pub phone: String,
}

#[derive(Deserialize)]
pub struct AvailabilityRequest {
    pub available: bool,
}

async fn register_driver(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<RegisterDriverRequest>,
) -> Result<Json<Driver>, AppError> {
    Ok(Json(drivers::register_driver(
        &state,
        &actor,
        payload.name,
        payload.phone,
    )?))
}

async fn list_drivers(
    State(state): State<Arc<AppState>>,
    actor: Actor,
) -> Result<Json<Vec<Driver>>, AppError> {
    Ok(Json(drivers::list_drivers(&state, &actor)?))
}

async fn set_availability(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<AvailabilityRequest>,
) -> Result<Json<Driver>, AppError> {
    Ok(Json(drivers::set_availability(
        &state,
        &actor,
        id,
        payload.available,
    )?))
}
