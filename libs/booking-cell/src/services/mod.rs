pub mod availability;
pub mod commission;
pub mod conflict;
pub mod interval;
pub mod lifecycle;
pub mod plan_cycle;
pub mod unit_of_work;
