//! Caches

pub mod status;
