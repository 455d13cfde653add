// libs/booking-cell/src/services/resolver.rs
use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_config::{AppConfig, DEFAULT_FALLBACK_PAGE_SIZE};
use shared_models::{CandidateSource, ProfessionalCandidate, ProfessionalQuery};

use crate::models::Resolution;
use crate::services::normalize;
use crate::services::repository::{BookingRepository, RepositoryResult};

/// Finds professionals who may be assigned to a booking.
///
/// Tries the booking-scoped lookup first and, when that fails or comes back
/// empty, makes exactly one call to the general active-professionals listing.
pub struct ProfessionalResolver {
    repository: Arc<dyn BookingRepository>,
    fallback_page_size: u32,
}

impl ProfessionalResolver {
    pub fn new(repository: Arc<dyn BookingRepository>, config: &AppConfig) -> Self {
        Self::with_page_size(repository, config.fallback_page_size)
    }

    pub fn with_page_size(repository: Arc<dyn BookingRepository>, fallback_page_size: u32) -> Self {
        Self {
            repository,
            fallback_page_size: if fallback_page_size == 0 {
                DEFAULT_FALLBACK_PAGE_SIZE
            } else {
                fallback_page_size
            },
        }
    }

    pub async fn resolve_candidates(&self, booking_id: &str) -> Resolution {
        debug!("Resolving candidates for booking: {}", booking_id);

        let primary_error = match self.primary_lookup(booking_id).await {
            Ok(candidates) if !candidates.is_empty() => {
                info!(
                    "Primary lookup found {} candidates for booking {}",
                    candidates.len(),
                    booking_id
                );
                return Resolution::Candidates {
                    source: CandidateSource::Primary,
                    candidates,
                };
            }
            Ok(_) => {
                debug!("Primary lookup returned no candidates for booking {}", booking_id);
                None
            }
            Err(e) => {
                warn!("Primary lookup failed for booking {}: {}", booking_id, e);
                Some(e)
            }
        };

        match self.fallback_lookup().await {
            Ok(candidates) if !candidates.is_empty() => {
                info!(
                    "Fallback lookup found {} candidates for booking {}",
                    candidates.len(),
                    booking_id
                );
                Resolution::Candidates {
                    source: CandidateSource::Fallback,
                    candidates,
                }
            }
            Ok(_) => {
                info!("No professionals available for booking {}", booking_id);
                Resolution::NoCandidatesAvailable
            }
            Err(fallback_error) => match primary_error {
                Some(primary) => {
                    warn!(
                        "Both professional lookups failed for booking {}: {}",
                        booking_id, fallback_error
                    );
                    Resolution::TransportFailure {
                        primary,
                        fallback: fallback_error,
                    }
                }
                // We did get an answer from the primary: it was "nobody".
                None => {
                    warn!(
                        "Fallback lookup failed after empty primary for booking {}: {}",
                        booking_id, fallback_error
                    );
                    Resolution::NoCandidatesAvailable
                }
            },
        }
    }

    async fn primary_lookup(
        &self,
        booking_id: &str,
    ) -> RepositoryResult<Vec<ProfessionalCandidate>> {
        let body = self.repository.get_available_professionals(booking_id).await?;
        Ok(normalize::normalize_response(&body, CandidateSource::Primary)?)
    }

    async fn fallback_lookup(&self) -> RepositoryResult<Vec<ProfessionalCandidate>> {
        let query = ProfessionalQuery::active(self.fallback_page_size);
        let body = self.repository.get_professionals(&query).await?;
        Ok(normalize::normalize_response(&body, CandidateSource::Fallback)?)
    }
}
