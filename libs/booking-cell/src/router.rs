use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers;
use crate::BookingCellState;

pub fn booking_routes(state: Arc<BookingCellState>) -> Router {
    Router::new()
        // Assignment interaction
        .route(
            "/assignment",
            get(handlers::get_assignment).delete(handlers::close_assignment),
        )
        .route("/assignment/retry", post(handlers::retry_assignment))
        .route("/assignment/selection", put(handlers::select_candidate))
        .route("/assignment/commit", post(handlers::commit_assignment))
        // Booking lifecycle
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}/status", patch(handlers::update_booking_status))
        .route("/{booking_id}/cancel", post(handlers::cancel_booking))
        .route("/{booking_id}/assignment", post(handlers::open_assignment))
        .with_state(state)
}
