// libs/booking-cell/src/services/assignment.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::{Booking, BookingStatus, EntityRef};

use crate::models::{
    AssignmentError, AssignmentInteraction, CommitOutcome, InteractionPhase, InteractionSnapshot,
    Resolution,
};
use crate::services::lifecycle::BookingLifecycleService;
use crate::services::repository::BookingRepository;
use crate::services::resolver::ProfessionalResolver;

/// Orchestrates professional assignment and booking status changes.
///
/// Owns the authoritative in-memory booking records and at most one open
/// assignment interaction. Records change only after the backend confirms.
///
/// The internal lock is never held across a backend call, so overlapping
/// calls interleave at every await point. Each lookup carries a ticket and
/// only the newest one for the current interaction may write the candidate
/// list.
pub struct AssignmentController {
    repository: Arc<dyn BookingRepository>,
    resolver: ProfessionalResolver,
    lifecycle: BookingLifecycleService,
    state: Mutex<WorkflowState>,
}

#[derive(Default)]
struct WorkflowState {
    bookings: HashMap<String, Booking>,
    interaction: Option<ActiveInteraction>,
    /// Bookings with a cancel or status change awaiting the backend.
    mutating: HashSet<String>,
    next_ticket: u64,
}

impl WorkflowState {
    fn issue_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }
}

struct ActiveInteraction {
    session: u64,
    resolve_ticket: u64,
    view: AssignmentInteraction,
}

impl ActiveInteraction {
    fn begin_resolve(&mut self, ticket: u64) {
        self.resolve_ticket = ticket;
        self.view.phase = InteractionPhase::Opening;
        self.view.in_flight = true;
        self.view.last_error = None;
    }

    fn apply_resolution(&mut self, resolution: Resolution) {
        self.view.in_flight = false;
        self.view.lookup = Some(resolution.outcome());

        match resolution {
            Resolution::TransportFailure { primary, fallback } => {
                self.view.phase = InteractionPhase::Failed;
                self.view.candidates.clear();
                self.view.selected_candidate_id = None;
                self.view.last_error = Some(format!(
                    "primary lookup: {}; fallback lookup: {}",
                    primary, fallback
                ));
            }
            other => {
                self.view.phase = InteractionPhase::Ready;
                self.view.candidates = other.into_candidates();
                self.view.last_error = None;

                let keep_selection = self
                    .view
                    .selected_candidate_id
                    .as_deref()
                    .is_some_and(|id| self.view.has_candidate(id));
                if !keep_selection {
                    self.view.selected_candidate_id = None;
                }
            }
        }
    }
}

impl AssignmentController {
    pub fn new(repository: Arc<dyn BookingRepository>, config: &AppConfig) -> Self {
        Self {
            resolver: ProfessionalResolver::new(repository.clone(), config),
            repository,
            lifecycle: BookingLifecycleService::new(),
            state: Mutex::new(WorkflowState::default()),
        }
    }

    pub fn lifecycle(&self) -> &BookingLifecycleService {
        &self.lifecycle
    }

    // ==========================================================================
    // BOOKING RECORDS
    // ==========================================================================

    /// Record a booking already obtained from the backend, e.g. by a list query.
    pub async fn track_booking(&self, booking: Booking) {
        let mut state = self.state.lock().await;
        state.bookings.insert(booking.id.clone(), booking);
    }

    /// Snapshot of the stored record.
    pub async fn booking(&self, booking_id: &str) -> Option<Booking> {
        self.state.lock().await.bookings.get(booking_id).cloned()
    }

    /// Fetch a booking from the backend and make it the stored record.
    pub async fn load_booking(&self, booking_id: &str) -> Result<Booking, AssignmentError> {
        let booking = self.repository.get_booking_by_id(booking_id).await?;
        self.store(booking_id, booking.clone()).await;
        Ok(booking)
    }

    async fn current_booking(&self, booking_id: &str) -> Result<Booking, AssignmentError> {
        match self.booking(booking_id).await {
            Some(booking) => Ok(booking),
            None => {
                debug!("Booking {} not tracked yet, loading it", booking_id);
                self.load_booking(booking_id).await
            }
        }
    }

    async fn store(&self, booking_id: &str, booking: Booking) {
        let mut state = self.state.lock().await;
        state.bookings.insert(booking_id.to_string(), booking);
    }

    // ==========================================================================
    // ASSIGNMENT INTERACTION
    // ==========================================================================

    pub async fn interaction(&self) -> Option<InteractionSnapshot> {
        let state = self.state.lock().await;
        state.interaction.as_ref().map(|active| active.view.clone())
    }

    /// Open (or resume) the assignment interaction for a booking.
    ///
    /// The booking is loaded first when it is not tracked yet, so terminal
    /// bookings are refused before any candidate lookup. Candidates already
    /// held for the same booking are reused; otherwise a lookup runs before
    /// this returns.
    pub async fn open(&self, booking_id: &str) -> Result<InteractionSnapshot, AssignmentError> {
        let booking = self.current_booking(booking_id).await?;
        self.lifecycle.validate_assignment(&booking)?;

        let (session, ticket) = {
            let mut state = self.state.lock().await;

            if let Some(booking) = state.bookings.get(booking_id) {
                self.lifecycle.validate_assignment(booking)?;
            }

            let reusable = state
                .interaction
                .as_ref()
                .is_some_and(|active| active.view.booking_id == booking_id);

            if !reusable {
                if let Some(previous) = state.interaction.as_ref() {
                    debug!(
                        "Replacing assignment interaction for booking {}",
                        previous.view.booking_id
                    );
                }
                let session = state.issue_ticket();
                state.interaction = Some(ActiveInteraction {
                    session,
                    resolve_ticket: 0,
                    view: AssignmentInteraction::new(booking_id),
                });
            }

            if let Some(active) = state.interaction.as_ref() {
                let settled_with_candidates =
                    !active.view.in_flight && !active.view.candidates.is_empty();
                if active.view.phase == InteractionPhase::Committing || settled_with_candidates {
                    debug!("Reusing open assignment interaction for booking {}", booking_id);
                    return Ok(active.view.clone());
                }
            }

            let ticket = state.issue_ticket();
            let Some(active) = state.interaction.as_mut() else {
                return Err(AssignmentError::precondition("assignment interaction missing"));
            };

            active.begin_resolve(ticket);
            (active.session, ticket)
        };

        info!("Opening assignment interaction for booking {}", booking_id);
        self.run_resolve(booking_id, session, ticket).await
    }

    /// Fetch candidates again, replacing the list.
    pub async fn retry(&self) -> Result<InteractionSnapshot, AssignmentError> {
        let (booking_id, session, ticket) = {
            let mut state = self.state.lock().await;

            match state.interaction.as_ref() {
                None => {
                    return Err(AssignmentError::precondition("no open assignment interaction"))
                }
                Some(active) if active.view.phase == InteractionPhase::Committing => {
                    debug!("Ignoring candidate refresh while a commit is in flight");
                    return Ok(active.view.clone());
                }
                Some(_) => {}
            }

            let ticket = state.issue_ticket();
            let Some(active) = state.interaction.as_mut() else {
                return Err(AssignmentError::precondition("no open assignment interaction"));
            };

            active.begin_resolve(ticket);
            (active.view.booking_id.clone(), active.session, ticket)
        };

        info!("Refreshing candidates for booking {}", booking_id);
        self.run_resolve(&booking_id, session, ticket).await
    }

    async fn run_resolve(
        &self,
        booking_id: &str,
        session: u64,
        ticket: u64,
    ) -> Result<InteractionSnapshot, AssignmentError> {
        let resolution = self.resolver.resolve_candidates(booking_id).await;

        let mut state = self.state.lock().await;
        match state.interaction.as_mut() {
            Some(active) if active.session == session => {
                if active.resolve_ticket == ticket {
                    active.apply_resolution(resolution);
                } else {
                    debug!(
                        "Discarding stale candidate lookup {} for booking {}",
                        ticket, booking_id
                    );
                }
                Ok(active.view.clone())
            }
            _ => {
                debug!("Assignment interaction for booking {} closed during lookup", booking_id);
                Err(AssignmentError::precondition(format!(
                    "assignment interaction for booking {} is no longer open",
                    booking_id
                )))
            }
        }
    }

    /// Select a candidate from the current list. Unknown ids are ignored.
    pub async fn select(&self, candidate_id: &str) -> bool {
        let mut state = self.state.lock().await;

        let Some(active) = state.interaction.as_mut() else {
            return false;
        };

        if active.view.phase == InteractionPhase::Committing || !active.view.has_candidate(candidate_id) {
            debug!("Ignoring selection of {}", candidate_id);
            return false;
        }

        active.view.selected_candidate_id = Some(candidate_id.to_string());
        true
    }

    /// Send the selected candidate to the backend as the booking's professional.
    ///
    /// At most one assignment call per interaction is in flight; a commit while
    /// a lookup or another commit is running returns `Ignored`.
    pub async fn commit(&self) -> Result<CommitOutcome, AssignmentError> {
        let (session, booking_id, professional_id) = {
            let mut guard = self.state.lock().await;
            let WorkflowState {
                bookings,
                interaction,
                mutating,
                ..
            } = &mut *guard;

            let Some(active) = interaction.as_mut() else {
                return Err(AssignmentError::precondition("no open assignment interaction"));
            };

            if active.view.in_flight {
                debug!(
                    "Commit ignored for booking {}: {:?} in flight",
                    active.view.booking_id, active.view.phase
                );
                return Ok(CommitOutcome::Ignored);
            }

            if active.view.candidates.is_empty() {
                return Err(AssignmentError::precondition("candidate list is empty"));
            }

            let Some(professional_id) = active.view.selected_candidate().map(|c| c.id.clone())
            else {
                return Err(AssignmentError::precondition("no candidate selected"));
            };

            let Some(booking) = bookings.get(&active.view.booking_id) else {
                return Err(AssignmentError::precondition(format!(
                    "booking {} is not loaded",
                    active.view.booking_id
                )));
            };
            self.lifecycle.validate_assignment(booking)?;

            if mutating.contains(&active.view.booking_id) {
                return Err(AssignmentError::precondition(format!(
                    "another change to booking {} is in flight",
                    active.view.booking_id
                )));
            }

            active.view.phase = InteractionPhase::Committing;
            active.view.in_flight = true;
            active.view.last_error = None;

            (active.session, active.view.booking_id.clone(), professional_id)
        };

        info!("Assigning professional {} to booking {}", professional_id, booking_id);
        let result = self
            .repository
            .assign_professional(&booking_id, &professional_id)
            .await;

        let mut state = self.state.lock().await;
        match result {
            Ok(mut booking) => {
                if !booking.is_assigned() {
                    debug!("Assignment echo for {} omitted the professional", booking_id);
                    booking.professional = Some(EntityRef::Id(professional_id.clone()));
                }

                state.bookings.insert(booking_id.clone(), booking.clone());
                if state
                    .interaction
                    .as_ref()
                    .is_some_and(|active| active.session == session)
                {
                    state.interaction = None;
                }

                info!("Professional {} assigned to booking {}", professional_id, booking_id);
                Ok(CommitOutcome::Committed(booking))
            }
            Err(e) => {
                warn!("Assignment failed for booking {}: {}", booking_id, e);

                if let Some(active) = state
                    .interaction
                    .as_mut()
                    .filter(|active| active.session == session)
                {
                    active.view.phase = InteractionPhase::Ready;
                    active.view.in_flight = false;
                    active.view.last_error = Some(e.to_string());
                }

                Err(AssignmentError::TransportFailure(e))
            }
        }
    }

    /// Discard the open interaction without committing.
    pub async fn close(&self) -> Option<InteractionSnapshot> {
        let mut state = self.state.lock().await;
        let closed = state.interaction.take().map(|active| active.view);
        if let Some(view) = &closed {
            debug!("Closed assignment interaction for booking {}", view.booking_id);
        }
        closed
    }

    // ==========================================================================
    // STATUS CHANGES
    // ==========================================================================

    /// Claim `booking_id` for one backend mutation.
    ///
    /// Fails while an assignment for the booking is committing or another
    /// cancel or status change for it is awaiting the backend.
    async fn begin_mutation(&self, booking_id: &str) -> Result<(), AssignmentError> {
        let mut state = self.state.lock().await;

        let committing = state.interaction.as_ref().is_some_and(|active| {
            active.view.booking_id == booking_id
                && active.view.phase == InteractionPhase::Committing
        });
        if committing {
            warn!("Refusing to change booking {} while its assignment is in flight", booking_id);
            return Err(AssignmentError::precondition(format!(
                "assignment for booking {} is in flight",
                booking_id
            )));
        }

        if !state.mutating.insert(booking_id.to_string()) {
            warn!("Refusing overlapping change to booking {}", booking_id);
            return Err(AssignmentError::precondition(format!(
                "another change to booking {} is in flight",
                booking_id
            )));
        }

        Ok(())
    }

    async fn end_mutation(&self, booking_id: &str) {
        self.state.lock().await.mutating.remove(booking_id);
    }

    pub async fn cancel_booking(
        &self,
        booking_id: &str,
        reason: &str,
    ) -> Result<Booking, AssignmentError> {
        let reason = reason.trim();
        if reason.is_empty() {
            warn!("Rejected cancellation of booking {} without a reason", booking_id);
            return Err(AssignmentError::precondition(
                "cancellation requires a non-empty reason",
            ));
        }

        self.begin_mutation(booking_id).await?;
        let result = self.send_cancellation(booking_id, reason).await;
        self.end_mutation(booking_id).await;
        result
    }

    async fn send_cancellation(
        &self,
        booking_id: &str,
        reason: &str,
    ) -> Result<Booking, AssignmentError> {
        let current = self.current_booking(booking_id).await?;
        self.lifecycle
            .validate_change(&current, BookingStatus::Cancelled, Some(reason))?;

        let confirmed = self
            .repository
            .cancel_booking(booking_id, reason)
            .await
            .inspect_err(|e| warn!("Cancellation failed for booking {}: {}", booking_id, e))?;

        let booking = self.lifecycle.apply_confirmed_transition(
            keep_professional(confirmed, &current),
            BookingStatus::Cancelled,
            Some(reason),
        );

        let mut state = self.state.lock().await;
        state.bookings.insert(booking_id.to_string(), booking.clone());

        let closes_interaction = state
            .interaction
            .as_ref()
            .is_some_and(|active| active.view.booking_id == booking_id);
        if closes_interaction {
            debug!("Closing assignment interaction for cancelled booking {}", booking_id);
            state.interaction = None;
        }

        info!("Booking {} cancelled", booking_id);
        Ok(booking)
    }

    /// Move a booking to `target` through the backend.
    ///
    /// Cancellation needs a reason and goes through [`Self::cancel_booking`].
    pub async fn update_status(
        &self,
        booking_id: &str,
        target: BookingStatus,
    ) -> Result<Booking, AssignmentError> {
        self.begin_mutation(booking_id).await?;
        let result = self.send_status_update(booking_id, target).await;
        self.end_mutation(booking_id).await;
        result
    }

    async fn send_status_update(
        &self,
        booking_id: &str,
        target: BookingStatus,
    ) -> Result<Booking, AssignmentError> {
        let current = self.current_booking(booking_id).await?;
        self.lifecycle.validate_change(&current, target, None)?;

        let confirmed = self
            .repository
            .update_booking_status(booking_id, target)
            .await
            .inspect_err(|e| warn!("Status update failed for booking {}: {}", booking_id, e))?;

        let booking = self.lifecycle.apply_confirmed_transition(
            keep_professional(confirmed, &current),
            target,
            None,
        );
        self.store(booking_id, booking.clone()).await;

        info!("Booking {} moved from {} to {}", booking_id, current.status, target);
        Ok(booking)
    }
}

/// Status echoes do not always populate the professional; a confirmed status
/// change never detaches one.
fn keep_professional(mut confirmed: Booking, current: &Booking) -> Booking {
    if !confirmed.is_assigned() && current.is_assigned() {
        confirmed.professional = current.professional.clone();
    }
    confirmed
}
