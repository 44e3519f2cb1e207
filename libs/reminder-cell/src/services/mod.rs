pub mod no_show;
pub mod reminder;
pub mod scheduler;
pub mod sender;
