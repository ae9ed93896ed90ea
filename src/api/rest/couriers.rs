use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, patch};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::geo::GeoPoint;
use crate::models::courier::CourierPosition;
use crate::models::delivery::Delivery;
use crate::routing::order_stops;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/couriers/:id/position", patch(update_position))
        .route("/couriers/:id/deliveries", get(list_active))
        .route("/couriers/:id/route", get(route_view))
}

#[derive(Deserialize)]
pub struct UpdatePositionRequest {
    pub location: GeoPoint,
}

async fn update_position(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePositionRequest>,
) -> Result<Json<CourierPosition>, DispatchError> {
    if !payload.location.is_valid() {
        return Err(DispatchError::InvalidRequest(
            "position coordinates out of range".to_string(),
        ));
    }

    let position = CourierPosition {
        courier_id: id,
        location: payload.location,
        timestamp: Utc::now(),
    };
    state.positions.insert(id, position.clone());

    Ok(Json(position))
}

async fn list_active(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Delivery>> {
    Json(state.registry.list_active_for(id))
}

#[derive(Serialize)]
pub struct RouteStop {
    pub delivery_id: Uuid,
    pub address: String,
    pub location: GeoPoint,
}

/// The courier's active stops, nearest-neighbor ordered from their last known
/// position. Read-only: ordering never touches the stored deliveries.
async fn route_view(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<RouteStop>>, DispatchError> {
    let position = state
        .positions
        .get(&id)
        .map(|entry| entry.location)
        .ok_or_else(|| DispatchError::NotFound(format!("no known position for courier {id}")))?;

    let stops: Vec<RouteStop> = state
        .registry
        .list_active_for(id)
        .iter()
        .filter_map(|delivery| {
            delivery.next_stop().map(|stop| RouteStop {
                delivery_id: delivery.id,
                address: stop.address.clone(),
                location: stop.location,
            })
        })
        .collect();

    let points: Vec<GeoPoint> = stops.iter().map(|stop| stop.location).collect();
    let order = order_stops(&position, &points);

    let mut stops: Vec<Option<RouteStop>> = stops.into_iter().map(Some).collect();
    let ordered = order
        .into_iter()
        .filter_map(|index| stops[index].take())
        .collect();

    Ok(Json(ordered))
}
