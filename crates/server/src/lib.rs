//! ESRB prediction HTTP service
//!
//! Exposes the predictor over a minimal endpoint and a controller route,
//! alongside health, readiness and Prometheus metrics.

pub mod api;
pub mod config;
pub mod controllers;
