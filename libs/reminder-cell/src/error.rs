use thiserror::Error;

use booking_cell::store::StoreError;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Phone number {0} is not in E.164 format")]
    InvalidPhone(String),

    #[error("Reminder delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
