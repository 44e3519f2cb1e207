pub mod error;
pub mod models;
pub mod services;

pub use error::ReminderError;
pub use models::{NoShowReport, ReminderMessage, ReminderReport};
pub use services::scheduler::ReminderScheduler;
pub use services::sender::{ReminderSender, TracingSender};
