pub mod config;
pub mod controller;
pub mod error;
pub mod ledger;
pub mod model;
pub mod notify;
pub mod quotation;
pub mod render;
pub mod store;
pub mod telemetry;
pub mod templates;
