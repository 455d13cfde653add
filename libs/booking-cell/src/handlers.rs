use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{
    AssignmentError, CancelBookingRequest, CommitOutcome, SelectCandidateRequest,
    UpdateStatusRequest,
};
use crate::BookingCellState;

impl From<AssignmentError> for AppError {
    fn from(err: AssignmentError) -> Self {
        match err {
            AssignmentError::InvalidTransition { .. } => AppError::Conflict(err.to_string()),
            AssignmentError::PreconditionFailed(msg) => AppError::ValidationError(msg),
            AssignmentError::TransportFailure(e) => AppError::ExternalService(e.to_string()),
        }
    }
}

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<BookingCellState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking = state.controller.load_booking(&booking_id).await?;
    let actions = state.controller.lifecycle().get_available_actions(&booking);

    Ok(Json(json!({
        "booking": booking,
        "actions": actions
    })))
}

#[axum::debug_handler]
pub async fn update_booking_status(
    State(state): State<Arc<BookingCellState>>,
    Path(booking_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .controller
        .update_status(&booking_id, request.status)
        .await?;

    Ok(Json(json!({ "booking": booking })))
}

#[axum::debug_handler]
pub async fn cancel_booking(
    State(state): State<Arc<BookingCellState>>,
    Path(booking_id): Path<String>,
    Json(request): Json<CancelBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .controller
        .cancel_booking(&booking_id, &request.reason)
        .await?;

    Ok(Json(json!({ "booking": booking })))
}

// ==============================================================================
// ASSIGNMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn open_assignment(
    State(state): State<Arc<BookingCellState>>,
    Path(booking_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let interaction = state.controller.open(&booking_id).await?;
    Ok(Json(json!({ "interaction": interaction })))
}

#[axum::debug_handler]
pub async fn get_assignment(
    State(state): State<Arc<BookingCellState>>,
) -> Result<Json<Value>, AppError> {
    let interaction = state
        .controller
        .interaction()
        .await
        .ok_or_else(|| AppError::NotFound("No open assignment interaction".to_string()))?;

    Ok(Json(json!({ "interaction": interaction })))
}

#[axum::debug_handler]
pub async fn retry_assignment(
    State(state): State<Arc<BookingCellState>>,
) -> Result<Json<Value>, AppError> {
    let interaction = state.controller.retry().await?;
    Ok(Json(json!({ "interaction": interaction })))
}

#[axum::debug_handler]
pub async fn select_candidate(
    State(state): State<Arc<BookingCellState>>,
    Json(request): Json<SelectCandidateRequest>,
) -> Result<Json<Value>, AppError> {
    let selected = state.controller.select(&request.professional_id).await;
    let interaction = state.controller.interaction().await;

    Ok(Json(json!({
        "selected": selected,
        "interaction": interaction
    })))
}

#[axum::debug_handler]
pub async fn commit_assignment(
    State(state): State<Arc<BookingCellState>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    match state.controller.commit().await? {
        CommitOutcome::Committed(booking) => {
            let actions = state.controller.lifecycle().get_available_actions(&booking);
            Ok((
                StatusCode::OK,
                Json(json!({
                    "booking": booking,
                    "actions": actions
                })),
            ))
        }
        CommitOutcome::Ignored => Ok((
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Assignment already in progress" })),
        )),
    }
}

#[axum::debug_handler]
pub async fn close_assignment(
    State(state): State<Arc<BookingCellState>>,
) -> Result<StatusCode, AppError> {
    match state.controller.close().await {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(AppError::NotFound("No open assignment interaction".to_string())),
    }
}
