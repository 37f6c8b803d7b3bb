pub mod config;
pub mod constants;
pub mod error;
pub mod pipeline;
pub mod storage;

// Layered boundaries: ports in app, adapters in infra
pub mod app;
pub mod infra;

// Domain data shapes shared across layers
pub mod domain;

pub mod observability;
