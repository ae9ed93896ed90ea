use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::lifecycle::DeliveryStatus;

/// A resolved address. Geocoding happens upstream; by the time a stop reaches
/// the core it already carries coordinates. Immutable once attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub address: String,
    pub location: GeoPoint,
}

/// Which side of the delivery submitted a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaterRole {
    Client,
    Messenger,
}

impl fmt::Display for RaterRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaterRole::Client => f.write_str("client"),
            RaterRole::Messenger => f.write_str("messenger"),
        }
    }
}

/// Write-once review, attachable only after the delivery reaches a terminal
/// state. At most one per role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub rating: u8,
    pub comment: String,
    pub rater_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub client_id: Uuid,
    /// Set exactly once, by the winning claim. Never cleared or reassigned.
    pub messenger_id: Option<Uuid>,
    pub pickup: Stop,
    pub dropoff: Stop,
    pub status: DeliveryStatus,
    /// Integer currency units, fixed at creation.
    pub price: i64,
    /// Great-circle kilometers between pickup and dropoff, fixed at creation.
    pub distance_km: f64,
    pub estimated_minutes: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub client_rating: Option<Rating>,
    pub messenger_rating: Option<Rating>,
    /// Creation counter backing the registry's "creation order" queries.
    pub sequence: u64,
}

impl Delivery {
    /// Where the courier is headed next: the pickup until the parcel is in
    /// hand, the dropoff from then on. None once terminal or still pending.
    pub fn next_stop(&self) -> Option<&Stop> {
        match self.status {
            DeliveryStatus::Accepted => Some(&self.pickup),
            DeliveryStatus::Pickup | DeliveryStatus::Transit => Some(&self.dropoff),
            _ => None,
        }
    }

    pub fn rating_for(&self, role: RaterRole) -> Option<&Rating> {
        match role {
            RaterRole::Client => self.client_rating.as_ref(),
            RaterRole::Messenger => self.messenger_rating.as_ref(),
        }
    }
}

/// Input to `DispatchRegistry::create`. `hour` and `demand` are supplied by
/// the serving layer when it has them; otherwise the registry falls back to
/// the current UTC hour and the configured default demand.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRequest {
    pub client_id: Uuid,
    pub pickup: Stop,
    pub dropoff: Stop,
    pub demand: Option<f64>,
    pub hour: Option<u8>,
}
