//! Background workers

pub mod janitor;
pub mod sync_runner;
