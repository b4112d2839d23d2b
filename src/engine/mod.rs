pub mod delivery;
pub mod dispatch;
pub mod drivers;
pub mod orders;

use chrono::Utc;

use crate::models::event::OrderEvent;
use crate::models::order::Order;
use crate::state::AppState;

/// Records an applied transition: metrics counter plus the event stream.
pub(crate) fn note_transition(state: &AppState, order: &Order) {
    state
        .metrics
        .status_transitions_total
        .with_label_values(&[order.status.as_str()])
        .inc();

    state.publish(OrderEvent {
        order_id: order.id,
        status: order.status,
        driver_id: order.driver_id(),
        at: Utc::now(),
    });
}
