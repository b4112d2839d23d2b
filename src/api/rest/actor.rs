use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::actor::{Actor, Role};

/// The gateway in front of this service verifies credentials and forwards
/// the established identity in trusted headers. Requests without a complete
/// actor context are rejected before any handler runs.
#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let role = match required_header(parts, "x-actor-role")?.as_str() {
            "customer" => Role::Customer,
            "driver" => Role::Driver,
            "admin" => Role::Admin,
            other => {
                return Err(AppError::Forbidden(format!("unknown actor role: {other}")));
            }
        };

        let identity = required_header(parts, "x-actor-id")?;

        let driver_id = match role {
            Role::Driver => {
                let raw = required_header(parts, "x-driver-id")?;
                let id = raw.parse::<Uuid>().map_err(|_| {
                    AppError::Forbidden("x-driver-id is not a valid driver id".to_string())
                })?;
                Some(id)
            }
            _ => None,
        };

        Ok(Actor {
            role,
            identity,
            driver_id,
        })
    }
}

fn required_header(parts: &Parts, name: &str) -> Result<String, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Forbidden(format!("missing actor header {name}")))
}
