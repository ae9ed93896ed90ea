use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

/// Last known position of a courier. Last write wins; stale updates are
/// simply overwritten, the route view only ever wants the newest one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierPosition {
    pub courier_id: Uuid,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
}
