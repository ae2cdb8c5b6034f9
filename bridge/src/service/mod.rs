//! Deployment status service and its naming and permission rules

pub mod deployment;
pub mod naming;
pub mod policy;
