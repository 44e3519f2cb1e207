pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod store;
pub mod time;

pub use error::{BookingError, ErrorKind};
pub use router::{appointment_routes, provider_routes, BookingState};
