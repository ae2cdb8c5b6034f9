//! API models

pub mod argocd;
pub mod catalog;
