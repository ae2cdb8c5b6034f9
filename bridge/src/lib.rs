//! Argo CD Bridge Library
//!
//! Deployment status, error diagnosis and manual sync tracking for Argo CD
//! applications, served to the developer portal over HTTP.

pub mod app;
pub mod argocd;
pub mod cache;
pub mod catalog;
pub mod diagnose;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod server;
pub mod service;
pub mod storage;
pub mod sync;
pub mod utils;
pub mod workers;
