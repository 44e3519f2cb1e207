pub mod error;
pub mod tenant;

pub use error::AppError;
pub use tenant::TenantId;
