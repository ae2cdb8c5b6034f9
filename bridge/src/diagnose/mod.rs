//! Error classification and recovery suggestions

pub mod classifier;
pub mod recovery;
