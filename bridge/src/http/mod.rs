//! Upstream HTTP clients

pub mod argocd;
pub mod catalog;
pub mod client;
