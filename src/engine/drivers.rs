use tracing::info;
use uuid::Uuid;

use crate::auth;
use crate::error::AppError;
use crate::models::actor::{Actor, Role};
use crate::models::driver::{Driver, DriverDuty};
use crate::state::AppState;

pub fn register_driver(
    state: &AppState,
    actor: &Actor,
    name: String,
    phone: String,
) -> Result<Driver, AppError> {
    auth::require_role(actor, &[Role::Admin])?;

    if name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if phone.trim().is_empty() {
        return Err(AppError::Validation("phone cannot be empty".to_string()));
    }

    let driver = Driver::new(name, phone);
    state.drivers.insert(driver.id, driver.clone());
    state.metrics.drivers_available.inc();
    info!(driver_id = %driver.id, "driver registered");

    Ok(driver)
}

/// Registration order, oldest first, so listings are stable.
pub fn list_drivers(state: &AppState, actor: &Actor) -> Result<Vec<Driver>, AppError> {
    auth::require_role(actor, &[Role::Admin])?;

    let mut drivers = state.drivers.snapshot();
    drivers.sort_by_key(|driver| (driver.registered_at, driver.id));
    Ok(drivers)
}

/// Flips a driver between available and offline. Drivers may only toggle
/// themselves; a driver currently bound to an order cannot be toggled in
/// either direction, release happens through delivery completion or
/// cancellation.
pub fn set_availability(
    state: &AppState,
    actor: &Actor,
    driver_id: Uuid,
    available: bool,
) -> Result<Driver, AppError> {
    auth::require_role(actor, &[Role::Driver, Role::Admin])?;
    auth::require_driver_match(actor, driver_id)?;

    let mut driver = state
        .drivers
        .get_mut(driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;

    if let DriverDuty::Assigned { order_id } = driver.duty {
        return Err(AppError::Conflict(format!(
            "driver is bound to order {order_id}"
        )));
    }

    let target = if available {
        DriverDuty::Available
    } else {
        DriverDuty::Offline
    };

    if driver.duty != target {
        if available {
            state.metrics.drivers_available.inc();
        } else {
            state.metrics.drivers_available.dec();
        }
        driver.duty = target;
    }

    Ok(driver.clone())
}
