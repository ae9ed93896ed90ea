use dashmap::DashMap;
use uuid::Uuid;

use crate::config::Config;
use crate::models::courier::CourierPosition;
use crate::observability::metrics::Metrics;
use crate::registry::DispatchRegistry;

pub struct AppState {
    pub registry: DispatchRegistry,
    /// Last-write-wins courier positions; the registry's location collaborator.
    pub positions: DashMap<Uuid, CourierPosition>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            registry: DispatchRegistry::new(
                config.base_price_per_km,
                config.default_demand,
                config.event_buffer_size,
            ),
            positions: DashMap::new(),
            metrics: Metrics::new(),
        }
    }
}
