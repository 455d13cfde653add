pub mod booking;
pub mod envelope;
pub mod error;
pub mod professional;

pub use booking::{
    Address, Booking, BookingInvariantViolation, BookingStatus, EntityRef, EntitySummary,
    PaymentStatus, ServiceLineItem,
};
pub use professional::{CandidateSource, ProfessionalCandidate, ProfessionalQuery};
