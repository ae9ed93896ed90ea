use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::DispatchError;
use crate::lifecycle::{DeliveryStatus, TransitionEvent};
use crate::models::delivery::{CreateRequest, Delivery, RaterRole};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/deliveries", post(create_delivery))
        .route("/deliveries/available", get(list_available))
        .route("/deliveries/:id", get(get_delivery))
        .route("/deliveries/:id/claim", post(claim_delivery))
        .route("/deliveries/:id/advance", post(advance_delivery))
        .route("/deliveries/:id/rating", post(rate_delivery))
}

async fn create_delivery(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateRequest>,
) -> Result<Json<Delivery>, DispatchError> {
    let delivery = state.registry.create(payload)?;
    state.metrics.deliveries_created_total.inc();
    Ok(Json(delivery))
}

async fn get_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, DispatchError> {
    Ok(Json(state.registry.get(id)?))
}

async fn list_available(State(state): State<Arc<AppState>>) -> Json<Vec<Delivery>> {
    Json(state.registry.list_available())
}

#[derive(Deserialize)]
pub struct ClaimRequest {
    pub courier_id: Uuid,
}

async fn claim_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ClaimRequest>,
) -> Result<Json<Delivery>, DispatchError> {
    match state.registry.claim(id, payload.courier_id) {
        Ok(delivery) => {
            state.metrics.claims_total.with_label_values(&["won"]).inc();
            state.metrics.deliveries_active.inc();
            Ok(Json(delivery))
        }
        Err(err @ DispatchError::AlreadyClaimed) => {
            state.metrics.claims_total.with_label_values(&["lost"]).inc();
            Err(err)
        }
        Err(err) => Err(err),
    }
}

#[derive(Deserialize)]
pub struct AdvanceRequest {
    pub courier_id: Uuid,
    pub event: TransitionEvent,
}

async fn advance_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdvanceRequest>,
) -> Result<Json<Delivery>, DispatchError> {
    let delivery = state
        .registry
        .advance(id, payload.courier_id, payload.event)?;

    state
        .metrics
        .transitions_total
        .with_label_values(&[&payload.event.to_string()])
        .inc();
    if delivery.status == DeliveryStatus::Delivered {
        state.metrics.deliveries_active.dec();
    }

    Ok(Json(delivery))
}

#[derive(Deserialize)]
pub struct RatingRequest {
    pub rater_id: Uuid,
    pub role: RaterRole,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

async fn rate_delivery(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RatingRequest>,
) -> Result<Json<Delivery>, DispatchError> {
    let delivery = state.registry.rate(
        id,
        payload.rater_id,
        payload.role,
        payload.rating,
        payload.comment,
    )?;
    state.metrics.ratings_total.inc();
    Ok(Json(delivery))
}
