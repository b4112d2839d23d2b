use tokio::sync::broadcast;

use crate::models::event::OrderEvent;
use crate::observability::metrics::Metrics;
use crate::store::{DriverStore, OrderStore};

pub struct AppState {
    pub orders: OrderStore,
    pub drivers: DriverStore,
    pub events_tx: broadcast::Sender<OrderEvent>,
    pub metrics: Metrics,
    pub location_history_cap: usize,
}

impl AppState {
    pub fn new(event_buffer_size: usize, location_history_cap: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            orders: OrderStore::new(),
            drivers: DriverStore::new(),
            events_tx,
            metrics: Metrics::new(),
            location_history_cap,
        }
    }

    /// Best-effort fan-out; a send error just means nobody is listening.
    pub fn publish(&self, event: OrderEvent) {
        let _ = self.events_tx.send(event);
    }
}
