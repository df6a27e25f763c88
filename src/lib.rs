mod page;
mod routes;
mod telemetry;

pub mod app;
pub mod bmi;
pub mod charts;
pub mod classifier;
pub mod config;
pub mod ort_service;
pub mod risk;
pub mod server;
pub mod validation;

pub use app::start_app;
pub use classifier::{Classifier, ClassifierError};
pub use telemetry::Metrics;
