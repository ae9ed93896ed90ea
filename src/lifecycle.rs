//! The delivery state machine.
//!
//! Statuses only ever move forward; there is no regression and no skipping.
//! `Completed` is not reachable through a courier event — the registry promotes
//! a `Delivered` record once both parties have rated it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DispatchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Accepted,
    Pickup,
    Transit,
    Delivered,
    Completed,
}

impl DeliveryStatus {
    /// Delivered and completed are both terminal for courier-driven progress.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Completed)
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Accepted => "accepted",
            DeliveryStatus::Pickup => "pickup",
            DeliveryStatus::Transit => "transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionEvent {
    Claim,
    MarkPickedUp,
    MarkInTransit,
    MarkDelivered,
}

impl fmt::Display for TransitionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionEvent::Claim => "claim",
            TransitionEvent::MarkPickedUp => "mark_picked_up",
            TransitionEvent::MarkInTransit => "mark_in_transit",
            TransitionEvent::MarkDelivered => "mark_delivered",
        };
        f.write_str(name)
    }
}

/// The single source of truth for legal transitions. Pure: no clocks, no
/// timeouts, no side effects. `actor` is carried only for error reporting;
/// assignee checks live in the registry, which owns identity context.
pub fn next_status(
    current: DeliveryStatus,
    event: TransitionEvent,
    actor: Uuid,
) -> Result<DeliveryStatus, DispatchError> {
    use DeliveryStatus::*;
    use TransitionEvent::*;

    match (current, event) {
        (Pending, Claim) => Ok(Accepted),
        (Accepted, MarkPickedUp) => Ok(Pickup),
        (Pickup, MarkInTransit) => Ok(Transit),
        (Transit, MarkDelivered) => Ok(Delivered),
        (status, event) => Err(DispatchError::InvalidTransition {
            status,
            event,
            actor,
        }),
    }
}
