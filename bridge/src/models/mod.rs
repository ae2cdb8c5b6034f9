//! Domain models

pub mod diagnosis;
pub mod status;
pub mod sync;
