use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::lifecycle::{DeliveryStatus, TransitionEvent};
use crate::models::delivery::RaterRole;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("delivery already claimed")]
    AlreadyClaimed,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid transition: {event} not allowed from {status} (actor {actor})")]
    InvalidTransition {
        status: DeliveryStatus,
        event: TransitionEvent,
        actor: Uuid,
    },

    #[error("{role} rating already submitted")]
    AlreadyRated { role: RaterRole },

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = match &self {
            DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
            DispatchError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DispatchError::AlreadyClaimed
            | DispatchError::InvalidTransition { .. }
            | DispatchError::AlreadyRated { .. } => StatusCode::CONFLICT,
            DispatchError::Forbidden(_) => StatusCode::FORBIDDEN,
            DispatchError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
