//! Upstream API models
//!
//! Request and response shapes for the Argo CD REST API and the portal
//! catalog API. Only the fields the bridge reads are modelled; everything
//! else is ignored on deserialization.

pub mod models;
