use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::router::booking_routes;
use booking_cell::BookingCellState;

pub fn create_router(state: Arc<BookingCellState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Detailing admin API is running!" }))
        .nest("/bookings", booking_routes(state))
}
