use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::Json;
use axum::Router;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::engine::orders::CreateOrder;
use crate::engine::{dispatch, orders};
use crate::error::AppError;
use crate::models::actor::Actor;
use crate::models::order::{DeliveryType, Order, OrderStatus};
use crate::models::quote::Quote;
use crate::pricing;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/quote", post(quote_order))
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/confirm", post(confirm_order))
        .route("/orders/:id/status", patch(update_status))
        .route("/orders/:id/assign", post(assign_driver))
        .route("/orders/:id/location", post(report_location))
}

#[derive(Deserialize)]
pub struct QuoteRequest {
    #[serde(with = "rust_decimal::serde::str")]
    pub food_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub platform_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub delivery_fee: Decimal,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub restaurant_id: String,
    pub customer_id: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub food_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub platform_fee: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub delivery_type: DeliveryType,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub new_status: OrderStatus,
}

#[derive(Deserialize, Default)]
pub struct AssignRequest {
    pub driver_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct LocationRequest {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
}

/// Pricing preview; nothing is stored and no actor context is needed.
async fn quote_order(Json(payload): Json<QuoteRequest>) -> Result<Json<Quote>, AppError> {
    let quote = pricing::quote(
        payload.food_subtotal,
        payload.platform_fee,
        payload.delivery_fee,
    )?;
    Ok(Json(quote))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let order = orders::create_order(
        &state,
        &actor,
        CreateOrder {
            restaurant_id: payload.restaurant_id,
            customer_id: payload.customer_id,
            food_subtotal: payload.food_subtotal,
            platform_fee: payload.platform_fee,
            delivery_fee: payload.delivery_fee,
            delivery_type: payload.delivery_type,
        },
    )?;
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::get_order(&state, &actor, id)?))
}

async fn confirm_order(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::confirm_order(&state, &actor, id)?))
}

async fn update_status(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    Ok(Json(orders::set_status(
        &state,
        &actor,
        id,
        payload.new_status,
    )?))
}

async fn assign_driver(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    payload: Option<Json<AssignRequest>>,
) -> Result<Json<Order>, AppError> {
    let requested = payload.and_then(|Json(body)| body.driver_id);
    Ok(Json(dispatch::assign_driver(&state, &actor, id, requested)?))
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<LocationRequest>,
) -> Result<Json<Value>, AppError> {
    dispatch::report_location(
        &state,
        &actor,
        id,
        payload.lat,
        payload.lng,
        payload.accuracy_m,
    )?;
    Ok(Json(json!({ "ok": true })))
}
