//! The authoritative delivery store.
//!
//! All mutation goes through the registry; callers never touch `Delivery`
//! fields directly. Entry-level exclusive guards from the concurrent map make
//! each operation atomic per delivery id, which is exactly the contract the
//! claim race needs: one winner, everyone else sees `AlreadyClaimed`.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Timelike, Utc};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::eta;
use crate::geo::haversine_km;
use crate::lifecycle::{self, DeliveryStatus, TransitionEvent};
use crate::models::delivery::{CreateRequest, Delivery, RaterRole, Rating};
use crate::pricing;

/// Published on every successful mutation; feeds the notification layer.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DeliveryEvent {
    pub delivery_id: Uuid,
    pub status: DeliveryStatus,
    pub messenger_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

pub struct DispatchRegistry {
    deliveries: DashMap<Uuid, Delivery>,
    sequence: AtomicU64,
    base_price_per_km: i64,
    default_demand: f64,
    events_tx: broadcast::Sender<DeliveryEvent>,
}

impl DispatchRegistry {
    pub fn new(base_price_per_km: i64, default_demand: f64, event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size);

        Self {
            deliveries: DashMap::new(),
            sequence: AtomicU64::new(0),
            base_price_per_km,
            default_demand,
            events_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryEvent> {
        self.events_tx.subscribe()
    }

    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }

    /// Validate a request, price it, and store it as `Pending`.
    ///
    /// `hour` and `demand` come from the serving layer when supplied, so the
    /// quote is reproducible; otherwise the current UTC hour and the configured
    /// default demand fill in.
    pub fn create(&self, req: CreateRequest) -> Result<Delivery, DispatchError> {
        if req.pickup.address.trim().is_empty() || req.dropoff.address.trim().is_empty() {
            return Err(DispatchError::InvalidRequest(
                "pickup and dropoff addresses are required".to_string(),
            ));
        }
        if !req.pickup.location.is_valid() {
            return Err(DispatchError::InvalidRequest(
                "pickup coordinates out of range".to_string(),
            ));
        }
        if !req.dropoff.location.is_valid() {
            return Err(DispatchError::InvalidRequest(
                "dropoff coordinates out of range".to_string(),
            ));
        }
        if let Some(hour) = req.hour {
            if hour > 23 {
                return Err(DispatchError::InvalidRequest(format!(
                    "hour {hour} out of range 0..=23"
                )));
            }
        }
        if let Some(demand) = req.demand {
            if !(0.0..=10.0).contains(&demand) {
                return Err(DispatchError::InvalidRequest(format!(
                    "demand {demand} out of range 0..=10"
                )));
            }
        }

        let distance_km = haversine_km(&req.pickup.location, &req.dropoff.location);
        if distance_km <= 0.0 {
            return Err(DispatchError::InvalidRequest(
                "pickup and dropoff must be distinct points".to_string(),
            ));
        }

        let hour = req.hour.unwrap_or_else(|| Utc::now().hour() as u8);
        let demand = req.demand.unwrap_or(self.default_demand);
        let price = pricing::quote(distance_km, hour, demand, self.base_price_per_km);
        let estimated_minutes =
            eta::estimate_minutes(distance_km, eta::traffic_level_for_hour(hour), hour);

        let delivery = Delivery {
            id: Uuid::new_v4(),
            client_id: req.client_id,
            messenger_id: None,
            pickup: req.pickup,
            dropoff: req.dropoff,
            status: DeliveryStatus::Pending,
            price,
            distance_km,
            estimated_minutes: Some(estimated_minutes),
            created_at: Utc::now(),
            client_rating: None,
            messenger_rating: None,
            sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
        };

        self.deliveries.insert(delivery.id, delivery.clone());
        self.publish(&delivery);

        info!(
            delivery_id = %delivery.id,
            client_id = %delivery.client_id,
            distance_km = delivery.distance_km,
            price = delivery.price,
            "delivery created"
        );

        Ok(delivery)
    }

    /// Atomic check-and-set: exactly one claim per delivery succeeds, even
    /// under concurrent calls. Losers get `AlreadyClaimed`.
    pub fn claim(&self, delivery_id: Uuid, courier_id: Uuid) -> Result<Delivery, DispatchError> {
        let updated = {
            let mut entry = self
                .deliveries
                .get_mut(&delivery_id)
                .ok_or_else(|| DispatchError::NotFound(format!("delivery {delivery_id}")))?;

            if entry.messenger_id.is_some() || entry.status != DeliveryStatus::Pending {
                return Err(DispatchError::AlreadyClaimed);
            }

            entry.status = lifecycle::next_status(entry.status, TransitionEvent::Claim, courier_id)?;
            entry.messenger_id = Some(courier_id);
            entry.clone()
        };

        self.publish(&updated);
        info!(delivery_id = %delivery_id, courier_id = %courier_id, "delivery claimed");
        Ok(updated)
    }

    /// Advance the lifecycle by one courier event. Only the assignee may do
    /// this; claiming goes through `claim`, never through here.
    pub fn advance(
        &self,
        delivery_id: Uuid,
        courier_id: Uuid,
        event: TransitionEvent,
    ) -> Result<Delivery, DispatchError> {
        let updated = {
            let mut entry = self
                .deliveries
                .get_mut(&delivery_id)
                .ok_or_else(|| DispatchError::NotFound(format!("delivery {delivery_id}")))?;

            if entry.messenger_id != Some(courier_id) {
                return Err(DispatchError::Forbidden(
                    "only the assigned courier may advance a delivery".to_string(),
                ));
            }

            entry.status = lifecycle::next_status(entry.status, event, courier_id)?;
            entry.clone()
        };

        self.publish(&updated);
        info!(
            delivery_id = %delivery_id,
            courier_id = %courier_id,
            event = %event,
            status = %updated.status,
            "delivery advanced"
        );
        Ok(updated)
    }

    /// Attach a write-once rating. The record moves to `Completed` only once
    /// both sides have rated; a one-sided rating leaves it `Delivered`.
    pub fn rate(
        &self,
        delivery_id: Uuid,
        rater_id: Uuid,
        role: RaterRole,
        rating: u8,
        comment: String,
    ) -> Result<Delivery, DispatchError> {
        if !(1..=5).contains(&rating) {
            return Err(DispatchError::InvalidRequest(format!(
                "rating {rating} out of range 1..=5"
            )));
        }

        let updated = {
            let mut entry = self
                .deliveries
                .get_mut(&delivery_id)
                .ok_or_else(|| DispatchError::NotFound(format!("delivery {delivery_id}")))?;

            if !entry.status.is_terminal() {
                return Err(DispatchError::Forbidden(
                    "delivery has not been delivered yet".to_string(),
                ));
            }

            let allowed = match role {
                RaterRole::Client => entry.client_id == rater_id,
                RaterRole::Messenger => entry.messenger_id == Some(rater_id),
            };
            if !allowed {
                return Err(DispatchError::Forbidden(format!(
                    "rater is not the {role} of this delivery"
                )));
            }

            if entry.rating_for(role).is_some() {
                return Err(DispatchError::AlreadyRated { role });
            }

            let review = Rating {
                rating,
                comment,
                rater_id,
                timestamp: Utc::now(),
            };
            match role {
                RaterRole::Client => entry.client_rating = Some(review),
                RaterRole::Messenger => entry.messenger_rating = Some(review),
            }

            if entry.client_rating.is_some() && entry.messenger_rating.is_some() {
                entry.status = DeliveryStatus::Completed;
            }
            entry.clone()
        };

        self.publish(&updated);
        info!(
            delivery_id = %delivery_id,
            rater_id = %rater_id,
            role = %role,
            rating,
            "delivery rated"
        );
        Ok(updated)
    }

    pub fn get(&self, delivery_id: Uuid) -> Result<Delivery, DispatchError> {
        self.deliveries
            .get(&delivery_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DispatchError::NotFound(format!("delivery {delivery_id}")))
    }

    /// Pending, unassigned deliveries in creation order.
    pub fn list_available(&self) -> Vec<Delivery> {
        let mut available: Vec<Delivery> = self
            .deliveries
            .iter()
            .filter(|entry| {
                entry.status == DeliveryStatus::Pending && entry.messenger_id.is_none()
            })
            .map(|entry| entry.value().clone())
            .collect();
        available.sort_by_key(|delivery| delivery.sequence);
        available
    }

    /// A courier's non-terminal assignments in creation order.
    pub fn list_active_for(&self, courier_id: Uuid) -> Vec<Delivery> {
        let mut active: Vec<Delivery> = self
            .deliveries
            .iter()
            .filter(|entry| {
                entry.messenger_id == Some(courier_id) && !entry.status.is_terminal()
            })
            .map(|entry| entry.value().clone())
            .collect();
        active.sort_by_key(|delivery| delivery.sequence);
        active
    }

    fn publish(&self, delivery: &Delivery) {
        let _ = self.events_tx.send(DeliveryEvent {
            delivery_id: delivery.id,
            status: delivery.status,
            messenger_id: delivery.messenger_id,
            at: Utc::now(),
        });
    }
}
