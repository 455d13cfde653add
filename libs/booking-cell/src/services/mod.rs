pub mod assignment;
pub mod lifecycle;
pub mod normalize;
pub mod repository;
pub mod resolver;

pub use assignment::AssignmentController;
pub use lifecycle::BookingLifecycleService;
pub use repository::{BookingRepository, HttpBookingRepository, RepositoryError, RepositoryResult};
pub use resolver::ProfessionalResolver;
