// libs/booking-cell/src/services/lifecycle.rs
use tracing::{debug, info, warn};

use shared_models::{Booking, BookingStatus};

use crate::models::{AssignmentError, BookingAction, SideEffect};

/// Legal booking states and transitions.
///
/// Stateless: every method is a pure check over the values passed in. Nothing
/// here talks to the backend or mutates a stored record.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingLifecycleService;

impl BookingLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: BookingStatus) -> Vec<BookingStatus> {
        match current_status {
            BookingStatus::Pending => vec![BookingStatus::Ongoing, BookingStatus::Cancelled],
            BookingStatus::Ongoing => vec![BookingStatus::Completed, BookingStatus::Cancelled],
            // Terminal states - no transitions allowed
            BookingStatus::Completed => vec![],
            BookingStatus::Cancelled => vec![],
        }
    }

    pub fn can_transition(&self, current_status: BookingStatus, target: BookingStatus) -> bool {
        self.get_valid_transitions(current_status).contains(&target)
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<(), AssignmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.can_transition(current_status, new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AssignmentError::InvalidTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    pub fn required_side_effects(&self, target: BookingStatus) -> Vec<SideEffect> {
        match target {
            BookingStatus::Cancelled => vec![SideEffect::CancellationReason],
            BookingStatus::Ongoing => vec![SideEffect::AssignedProfessional],
            BookingStatus::Pending | BookingStatus::Completed => vec![],
        }
    }

    /// Check that everything `target` requires is in place.
    pub fn validate_side_effects(
        &self,
        booking: &Booking,
        target: BookingStatus,
        reason: Option<&str>,
    ) -> Result<(), AssignmentError> {
        for effect in self.required_side_effects(target) {
            match effect {
                SideEffect::CancellationReason => {
                    if reason.map(str::trim).unwrap_or_default().is_empty() {
                        return Err(AssignmentError::precondition(
                            "cancellation requires a non-empty reason",
                        ));
                    }
                }
                SideEffect::AssignedProfessional => {
                    if !booking.is_assigned() {
                        return Err(AssignmentError::precondition(format!(
                            "booking {} has no professional assigned",
                            booking.id
                        )));
                    }
                }
            }
        }

        Ok(())
    }

    /// Full check for a status change: legality first, then side effects.
    pub fn validate_change(
        &self,
        booking: &Booking,
        target: BookingStatus,
        reason: Option<&str>,
    ) -> Result<(), AssignmentError> {
        self.validate_status_transition(booking.status, target)?;
        self.validate_side_effects(booking, target, reason)
    }

    /// Assignment is allowed while pending, and while ongoing as a reassignment.
    pub fn validate_assignment(&self, booking: &Booking) -> Result<(), AssignmentError> {
        if booking.is_terminal() {
            warn!("Refusing assignment for {} booking {}", booking.status, booking.id);
            return Err(AssignmentError::InvalidTransition {
                from: booking.status,
                to: BookingStatus::Ongoing,
            });
        }

        Ok(())
    }

    /// Reflect a backend-confirmed transition on the local record.
    ///
    /// Only call after the backend accepted the change. The backend's echo is
    /// authoritative; this fills in whatever it left out.
    pub fn apply_confirmed_transition(
        &self,
        mut booking: Booking,
        target: BookingStatus,
        reason: Option<&str>,
    ) -> Booking {
        if booking.status != target {
            info!(
                "Backend echo for booking {} still {}, applying confirmed {}",
                booking.id, booking.status, target
            );
            booking.status = target;
        }

        if target == BookingStatus::Cancelled {
            let echoed = booking
                .cancellation_reason
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty());
            if !echoed {
                booking.cancellation_reason = reason.map(|r| r.trim().to_string());
            }
        }

        booking
    }

    /// Get the admin actions that are currently legal for a booking
    pub fn get_available_actions(&self, booking: &Booking) -> Vec<BookingAction> {
        let mut actions = Vec::new();

        match booking.status {
            BookingStatus::Pending => {
                if booking.is_assigned() {
                    actions.push(BookingAction::ReassignProfessional);
                    actions.push(BookingAction::StartService);
                } else {
                    actions.push(BookingAction::AssignProfessional);
                }
                actions.push(BookingAction::Cancel);
            }
            BookingStatus::Ongoing => {
                actions.push(BookingAction::ReassignProfessional);
                actions.push(BookingAction::CompleteService);
                actions.push(BookingAction::Cancel);
            }
            BookingStatus::Completed | BookingStatus::Cancelled => {}
        }

        actions
    }
}
