use std::sync::Arc;

use shared_config::AppConfig;

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::*;

/// Shared state behind the booking routes.
pub struct BookingCellState {
    pub controller: AssignmentController,
}

impl BookingCellState {
    /// State wired to the HTTP backend named in `config`.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let repository: Arc<dyn BookingRepository> = Arc::new(HttpBookingRepository::new(config)?);
        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: &AppConfig, repository: Arc<dyn BookingRepository>) -> Self {
        Self {
            controller: AssignmentController::new(repository, config),
        }
    }
}
