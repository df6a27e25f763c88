use crate::{
    classifier::ClassifierError,
    page::Page,
    risk::{self, PatientFeatures, RiskAssessment},
    server::SharedState,
    validation::{Validatable, ValidationError},
};
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde_json::json;
use std::time::Instant;
use thiserror::Error;
use tracing::instrument;

#[derive(Error, Debug)]
pub enum PredictError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Prediction failed: {0}")]
    Classifier(#[from] ClassifierError),
}

impl PredictError {
    fn status(&self) -> StatusCode {
        match self {
            PredictError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PredictError::Classifier(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PredictError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn assess(
    state: &SharedState,
    features: PatientFeatures,
    route: &str,
) -> Result<RiskAssessment, PredictError> {
    state.metrics.record_request(route);
    features.validate()?;

    let start = Instant::now();
    let result = risk::estimate(state.classifier.as_ref(), features);
    state
        .metrics
        .record_prediction_duration(start.elapsed().as_micros() as u64, route);

    let assessment = result.inspect_err(|e| tracing::error!("Inference failed: {:?}", e))?;
    state.metrics.record_verdict(assessment.verdict);
    tracing::info!("Prediction: {}", assessment.verdict);

    Ok(assessment)
}

#[instrument(skip(state))]
pub async fn predict_json(
    State(state): State<SharedState>,
    Json(features): Json<PatientFeatures>,
) -> Result<Json<RiskAssessment>, PredictError> {
    let assessment = assess(&state, features, "/api/predict")?;
    Ok(Json(assessment))
}

#[instrument(skip(state, form))]
pub async fn predict_form(
    State(state): State<SharedState>,
    form: Result<Form<PatientFeatures>, FormRejection>,
) -> Response {
    let features = match form {
        Ok(Form(features)) => features,
        Err(rejection) => {
            state.metrics.record_request("/predict");
            let page = Page {
                error: Some(format!("Invalid input: {}", rejection.body_text())),
                ..Page::default()
            };
            return (rejection.status(), Html(page.render())).into_response();
        }
    };

    match assess(&state, features, "/predict") {
        Ok(assessment) => Html(
            Page {
                features,
                assessment: Some(&assessment),
                ..Page::default()
            }
            .render(),
        )
        .into_response(),
        Err(e) => {
            let page = Page {
                features,
                error: Some(e.to_string()),
                ..Page::default()
            };
            (e.status(), Html(page.render())).into_response()
        }
    }
}
