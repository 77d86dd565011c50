//! HTTP API handlers for mmfd-an
//!
//! Per-modality analysis endpoints, fusion endpoints and health.

pub mod analyze;
pub mod fusion;
pub mod health;

pub use analyze::analyze_routes;
pub use fusion::fusion_routes;
pub use health::health_routes;
