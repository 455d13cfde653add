// libs/booking-cell/src/services/repository.rs
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use shared_api_client::{ApiClient, ApiStatusError};
use shared_config::AppConfig;
use shared_models::envelope::{self, EnvelopeError};
use shared_models::{Booking, BookingStatus, ProfessionalQuery};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Backend reported failure: {0}")]
    Unsuccessful(String),

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<EnvelopeError> for RepositoryError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Unsuccessful(msg) => RepositoryError::Unsuccessful(msg),
            EnvelopeError::MissingPayload(msg) => RepositoryError::Malformed(msg),
        }
    }
}

impl From<anyhow::Error> for RepositoryError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<ApiStatusError>() {
            Some(status) => RepositoryError::Api {
                status: status.status,
                message: status.body.clone(),
            },
            None => RepositoryError::Request(err.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Request/response access to bookings and professionals on the backend.
///
/// Implementations do not retry. The two professional lookups return the raw
/// response body because its shape varies; normalisation is the resolver's job.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn get_booking_by_id(&self, booking_id: &str) -> RepositoryResult<Booking>;

    async fn get_available_professionals(&self, booking_id: &str) -> RepositoryResult<Value>;

    async fn get_professionals(&self, query: &ProfessionalQuery) -> RepositoryResult<Value>;

    async fn assign_professional(
        &self,
        booking_id: &str,
        professional_id: &str,
    ) -> RepositoryResult<Booking>;

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> RepositoryResult<Booking>;

    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> RepositoryResult<Booking>;
}

// ==============================================================================
// HTTP ADAPTER
// ==============================================================================

pub struct HttpBookingRepository {
    client: ApiClient,
}

impl HttpBookingRepository {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: ApiClient::new(config)?,
        })
    }

    fn booking_path(booking_id: &str, suffix: &str) -> String {
        format!("/bookings/{}{}", urlencoding::encode(booking_id), suffix)
    }

    async fn send_for_booking(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> RepositoryResult<Booking> {
        let response = self.client.request(method, path, None, body).await?;
        parse_booking(&response)
    }
}

fn parse_booking(body: &Value) -> RepositoryResult<Booking> {
    let document = envelope::extract_booking(body)?;
    let booking: Booking = serde_json::from_value(document.clone())
        .map_err(|e| RepositoryError::Malformed(format!("Failed to parse booking: {}", e)))?;

    if let Err(violation) = booking.check_invariants() {
        warn!("Backend returned booking {} violating invariants: {}", booking.id, violation);
    }

    Ok(booking)
}

#[async_trait]
impl BookingRepository for HttpBookingRepository {
    async fn get_booking_by_id(&self, booking_id: &str) -> RepositoryResult<Booking> {
        debug!("Fetching booking: {}", booking_id);
        self.send_for_booking(Method::GET, &Self::booking_path(booking_id, ""), None)
            .await
    }

    async fn get_available_professionals(&self, booking_id: &str) -> RepositoryResult<Value> {
        debug!("Fetching available professionals for booking: {}", booking_id);
        let path = Self::booking_path(booking_id, "/available-professionals");
        Ok(self.client.get(&path, None).await?)
    }

    async fn get_professionals(&self, query: &ProfessionalQuery) -> RepositoryResult<Value> {
        debug!("Listing professionals with {:?}", query);
        let params = [
            ("page", query.page.to_string()),
            ("limit", query.limit.to_string()),
            ("status", query.status.clone()),
        ];
        Ok(self.client.get("/professionals", Some(&params)).await?)
    }

    async fn assign_professional(
        &self,
        booking_id: &str,
        professional_id: &str,
    ) -> RepositoryResult<Booking> {
        debug!("Assigning professional {} to booking {}", professional_id, booking_id);
        let body = json!({ "professionalId": professional_id });
        self.send_for_booking(
            Method::PUT,
            &Self::booking_path(booking_id, "/assign"),
            Some(&body),
        )
        .await
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> RepositoryResult<Booking> {
        debug!("Updating booking {} status to {}", booking_id, status);
        let body = json!({ "status": status });
        self.send_for_booking(
            Method::PATCH,
            &Self::booking_path(booking_id, "/status"),
            Some(&body),
        )
        .await
    }

    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> RepositoryResult<Booking> {
        debug!("Cancelling booking {}", booking_id);
        let body = json!({ "reason": reason });
        self.send_for_booking(
            Method::PUT,
            &Self::booking_path(booking_id, "/cancel"),
            Some(&body),
        )
        .await
    }
}
