use crate::{
    bmi::{self, BmiAnalysis, BmiRecord},
    charts::{BmiCharts, ChartError},
    page::Page,
    server::SharedState,
    validation::{Validatable, ValidationError},
};
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

#[derive(Serialize)]
pub struct BmiReport {
    #[serde(flatten)]
    pub analysis: BmiAnalysis,
    pub charts: BmiCharts,
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": format!("Invalid input: {}", self) })),
        )
            .into_response()
    }
}

fn calculate(
    state: &SharedState,
    record: BmiRecord,
    route: &str,
) -> Result<BmiReport, ValidationError> {
    state.metrics.record_request(route);
    record.validate()?;

    let analysis = bmi::analyze(record);
    state.metrics.record_bmi_category(analysis.category_name);
    tracing::debug!("{}", analysis.summary);

    let charts = BmiCharts::new(&analysis);
    Ok(BmiReport { analysis, charts })
}

#[instrument(skip(state))]
pub async fn bmi_json(
    State(state): State<SharedState>,
    Json(record): Json<BmiRecord>,
) -> Result<Json<BmiReport>, ValidationError> {
    calculate(&state, record, "/api/bmi").map(Json)
}

#[instrument(skip(state, form))]
pub async fn bmi_form(
    State(state): State<SharedState>,
    form: Result<Form<BmiRecord>, FormRejection>,
) -> Response {
    let record = match form {
        Ok(Form(record)) => record,
        Err(rejection) => {
            state.metrics.record_request("/bmi");
            let page = Page {
                error: Some(format!("Invalid input: {}", rejection.body_text())),
                ..Page::default()
            };
            return (rejection.status(), Html(page.render())).into_response();
        }
    };

    let report = match calculate(&state, record, "/bmi") {
        Ok(report) => report,
        Err(e) => {
            let page = Page {
                record,
                error: Some(format!("Invalid input: {}", e)),
                ..Page::default()
            };
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(page.render())).into_response();
        }
    };

    match report.charts.render() {
        Ok(rendered) => Html(
            Page {
                record,
                bmi: Some((&report.analysis, &rendered)),
                ..Page::default()
            }
            .render(),
        )
        .into_response(),
        Err(e) => render_failure(record, e),
    }
}

fn render_failure(record: BmiRecord, e: ChartError) -> Response {
    tracing::error!("Chart rendering failed: {:?}", e);
    let page = Page {
        record,
        error: Some(e.to_string()),
        ..Page::default()
    };
    (StatusCode::INTERNAL_SERVER_ERROR, Html(page.render())).into_response()
}
