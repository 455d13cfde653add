// libs/booking-cell/src/models.rs
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::{Booking, BookingStatus, CandidateSource, ProfessionalCandidate};

use crate::services::repository::RepositoryError;

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("Transport failure: {0}")]
    TransportFailure(#[from] RepositoryError),
}

impl AssignmentError {
    pub fn precondition(message: impl Into<String>) -> Self {
        AssignmentError::PreconditionFailed(message.into())
    }
}

// ==============================================================================
// STATE MACHINE VOCABULARY
// ==============================================================================

/// Work a transition needs done before (or as part of) reaching its target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    /// A non-blank cancellation reason must accompany the change.
    CancellationReason,
    /// A professional must already be attached to the booking.
    AssignedProfessional,
}

/// Admin actions that are legal for a booking in its current state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingAction {
    AssignProfessional,
    ReassignProfessional,
    StartService,
    CompleteService,
    Cancel,
}

// ==============================================================================
// CANDIDATE RESOLUTION
// ==============================================================================

/// Outcome of one `resolve_candidates` call.
///
/// Never an error: "nobody available" and "could not ask" are both ordinary
/// outcomes that callers must render differently.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Candidates {
        source: CandidateSource,
        candidates: Vec<ProfessionalCandidate>,
    },
    NoCandidatesAvailable,
    TransportFailure {
        primary: RepositoryError,
        fallback: RepositoryError,
    },
}

impl Resolution {
    pub fn candidates(&self) -> &[ProfessionalCandidate] {
        match self {
            Resolution::Candidates { candidates, .. } => candidates,
            _ => &[],
        }
    }

    pub fn into_candidates(self) -> Vec<ProfessionalCandidate> {
        match self {
            Resolution::Candidates { candidates, .. } => candidates,
            _ => Vec::new(),
        }
    }

    pub fn outcome(&self) -> LookupOutcome {
        match self {
            Resolution::Candidates { source, .. } => LookupOutcome::Found { source: *source },
            Resolution::NoCandidatesAvailable => LookupOutcome::NoCandidatesAvailable,
            Resolution::TransportFailure { .. } => LookupOutcome::TransportFailure,
        }
    }
}

/// What the last candidate lookup of an interaction produced.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupOutcome {
    Found { source: CandidateSource },
    NoCandidatesAvailable,
    TransportFailure,
}

// ==============================================================================
// ASSIGNMENT INTERACTION
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InteractionPhase {
    /// Candidate lookup in flight.
    Opening,
    /// Lookup settled with a list, possibly empty.
    Ready,
    /// Lookup settled without being able to ask anyone.
    Failed,
    /// Assignment call in flight.
    Committing,
}

/// Session-scoped state of one "assign/reassign professional" action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentInteraction {
    pub booking_id: String,
    pub candidates: Vec<ProfessionalCandidate>,
    pub selected_candidate_id: Option<String>,
    pub phase: InteractionPhase,
    pub in_flight: bool,
    pub lookup: Option<LookupOutcome>,
    pub last_error: Option<String>,
}

impl AssignmentInteraction {
    pub fn new(booking_id: impl Into<String>) -> Self {
        Self {
            booking_id: booking_id.into(),
            candidates: Vec::new(),
            selected_candidate_id: None,
            phase: InteractionPhase::Opening,
            in_flight: false,
            lookup: None,
            last_error: None,
        }
    }

    pub fn has_candidate(&self, candidate_id: &str) -> bool {
        self.candidates.iter().any(|c| c.id == candidate_id)
    }

    pub fn selected_candidate(&self) -> Option<&ProfessionalCandidate> {
        let selected = self.selected_candidate_id.as_deref()?;
        self.candidates.iter().find(|c| c.id == selected)
    }

    /// `Ready` with nothing in the list: we asked and nobody is available.
    pub fn is_empty_ready(&self) -> bool {
        self.phase == InteractionPhase::Ready && self.candidates.is_empty()
    }
}

/// Read-only copy of the interaction handed to callers.
pub type InteractionSnapshot = AssignmentInteraction;

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    /// Backend confirmed the assignment; this is the stored record.
    Committed(Booking),
    /// A lookup or commit was already in flight; nothing was sent.
    Ignored,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectCandidateRequest {
    pub professional_id: String,
}
