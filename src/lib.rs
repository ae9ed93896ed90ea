pub mod api;
pub mod config;
pub mod error;
pub mod eta;
pub mod geo;
pub mod lifecycle;
pub mod models;
pub mod observability;
pub mod pricing;
pub mod registry;
pub mod routing;
pub mod state;
