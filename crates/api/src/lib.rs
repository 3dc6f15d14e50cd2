//! `provend-api` — thin HTTP layer over the procurement and notification
//! services.

pub mod app;
pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod telemetry;
