//! Manual sync operations

pub mod executor;
pub mod fsm;
pub mod tracker;
