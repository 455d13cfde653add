#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use booking_cell::{AssignmentController, BookingRepository, RepositoryError, RepositoryResult};
use shared_models::{Booking, BookingStatus, EntityRef, ProfessionalQuery};
use shared_utils::test_utils::{MockBackendResponses, TestConfig};

/// Every call the fake saw, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetBooking(String),
    AvailableProfessionals(String),
    Professionals(ProfessionalQuery),
    Assign(String, String),
    UpdateStatus(String, BookingStatus),
    Cancel(String, String),
}

/// Holds a scripted call open until the test releases it.
#[derive(Clone, Default)]
pub struct Gate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub fn open(&self) {
        self.release.notify_one();
    }
}

pub struct Step<T> {
    result: RepositoryResult<T>,
    gate: Option<Gate>,
}

impl<T> Step<T> {
    pub fn ok(value: T) -> Self {
        Self {
            result: Ok(value),
            gate: None,
        }
    }

    pub fn err(error: RepositoryError) -> Self {
        Self {
            result: Err(error),
            gate: None,
        }
    }

    pub fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    async fn run(self) -> RepositoryResult<T> {
        if let Some(gate) = self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        self.result
    }
}

pub fn transport_error(message: &str) -> RepositoryError {
    RepositoryError::Request(message.to_string())
}

/// In-memory backend with scripted answers.
///
/// Unscripted professional lookups succeed with an empty list; unscripted
/// mutations succeed against the stored bookings.
#[derive(Default)]
pub struct FakeRepository {
    bookings: Mutex<HashMap<String, Booking>>,
    primary: Mutex<VecDeque<Step<Value>>>,
    fallback: Mutex<VecDeque<Step<Value>>>,
    assign: Mutex<VecDeque<Step<Booking>>>,
    status_updates: Mutex<VecDeque<Step<Booking>>>,
    cancels: Mutex<VecDeque<Step<Booking>>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_booking(&self, booking: Booking) -> &Self {
        self.bookings.lock().unwrap().insert(booking.id.clone(), booking);
        self
    }

    pub fn script_primary(&self, step: Step<Value>) -> &Self {
        self.primary.lock().unwrap().push_back(step);
        self
    }

    pub fn script_fallback(&self, step: Step<Value>) -> &Self {
        self.fallback.lock().unwrap().push_back(step);
        self
    }

    pub fn script_assign(&self, step: Step<Booking>) -> &Self {
        self.assign.lock().unwrap().push_back(step);
        self
    }

    pub fn script_status_update(&self, step: Step<Booking>) -> &Self {
        self.status_updates.lock().unwrap().push_back(step);
        self
    }

    pub fn script_cancel(&self, step: Step<Booking>) -> &Self {
        self.cancels.lock().unwrap().push_back(step);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    pub fn assign_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::Assign(..)))
    }

    pub fn fallback_calls(&self) -> usize {
        self.count(|call| matches!(call, Call::Professionals(_)))
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn stored(&self, booking_id: &str) -> RepositoryResult<Booking> {
        self.bookings
            .lock()
            .unwrap()
            .get(booking_id)
            .cloned()
            .ok_or_else(|| RepositoryError::Api {
                status: 404,
                message: format!("booking {} not found", booking_id),
            })
    }

    fn save(&self, booking: &Booking) {
        self.bookings
            .lock()
            .unwrap()
            .insert(booking.id.clone(), booking.clone());
    }
}

#[async_trait]
impl BookingRepository for FakeRepository {
    async fn get_booking_by_id(&self, booking_id: &str) -> RepositoryResult<Booking> {
        self.record(Call::GetBooking(booking_id.to_string()));
        self.stored(booking_id)
    }

    async fn get_available_professionals(&self, booking_id: &str) -> RepositoryResult<Value> {
        self.record(Call::AvailableProfessionals(booking_id.to_string()));
        let step = self.primary.lock().unwrap().pop_front();
        match step {
            Some(step) => step.run().await,
            None => Ok(MockBackendResponses::available_professionals(vec![])),
        }
    }

    async fn get_professionals(&self, query: &ProfessionalQuery) -> RepositoryResult<Value> {
        self.record(Call::Professionals(query.clone()));
        let step = self.fallback.lock().unwrap().pop_front();
        match step {
            Some(step) => step.run().await,
            None => Ok(MockBackendResponses::professional_page(vec![])),
        }
    }

    async fn assign_professional(
        &self,
        booking_id: &str,
        professional_id: &str,
    ) -> RepositoryResult<Booking> {
        self.record(Call::Assign(booking_id.to_string(), professional_id.to_string()));
        let step = self.assign.lock().unwrap().pop_front();
        let result = match step {
            Some(step) => step.run().await,
            None => self.stored(booking_id).map(|mut booking| {
                booking.professional = Some(EntityRef::Id(professional_id.to_string()));
                booking
            }),
        };
        if let Ok(booking) = &result {
            self.save(booking);
        }
        result
    }

    async fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
    ) -> RepositoryResult<Booking> {
        self.record(Call::UpdateStatus(booking_id.to_string(), status));
        let step = self.status_updates.lock().unwrap().pop_front();
        let result = match step {
            Some(step) => step.run().await,
            None => self.stored(booking_id).map(|mut booking| {
                booking.status = status;
                booking
            }),
        };
        if let Ok(booking) = &result {
            self.save(booking);
        }
        result
    }

    async fn cancel_booking(&self, booking_id: &str, reason: &str) -> RepositoryResult<Booking> {
        self.record(Call::Cancel(booking_id.to_string(), reason.to_string()));
        let step = self.cancels.lock().unwrap().pop_front();
        let result = match step {
            Some(step) => step.run().await,
            None => self.stored(booking_id).map(|mut booking| {
                booking.status = BookingStatus::Cancelled;
                booking.cancellation_reason = Some(reason.to_string());
                booking
            }),
        };
        if let Ok(booking) = &result {
            self.save(booking);
        }
        result
    }
}

pub fn controller_for(repository: &Arc<FakeRepository>) -> Arc<AssignmentController> {
    let config = TestConfig::default().to_app_config();
    Arc::new(AssignmentController::new(repository.clone(), &config))
}

pub fn professional_list(entries: &[(&str, &str)]) -> Value {
    MockBackendResponses::available_professionals(
        entries
            .iter()
            .map(|(id, name)| MockBackendResponses::professional(id, name))
            .collect(),
    )
}

pub fn professional_page(entries: &[(&str, &str)]) -> Value {
    MockBackendResponses::professional_page(
        entries
            .iter()
            .map(|(id, name)| MockBackendResponses::professional(id, name))
            .collect(),
    )
}
