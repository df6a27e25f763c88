mod bmi;
mod health;
mod index;
mod metrics;
mod predict;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(index::index))
        .route("/predict", post(predict::predict_form))
        .route("/bmi", post(bmi::bmi_form))
        .route("/api/predict", post(predict::predict_json))
        .route("/api/bmi", post(bmi::bmi_json))
        .route("/health", get(health::healthcheck))
        .route("/metrics", get(metrics::metrics_handler))
}
