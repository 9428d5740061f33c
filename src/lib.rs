pub mod app;
pub mod communities;
pub mod config;
pub mod error;
pub mod ids;
pub mod membership;
pub mod presentation;
pub mod seed;
pub mod state;
pub mod store;
pub mod telemetry;
pub mod users;
