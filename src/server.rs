use crate::{classifier::Classifier, config::Config, routes::api_routes, telemetry::Metrics};
use axum::Router;
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

#[derive(Clone)]
pub struct SharedState {
    pub classifier: Arc<dyn Classifier>,
    pub metrics: Arc<Metrics>,
}

pub fn build_router(state: SharedState) -> Router {
    Router::new().merge(api_routes()).with_state(state)
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(classifier: Arc<dyn Classifier>, config: &Config) -> anyhow::Result<Self> {
        let addr = config.server.get_address();

        let metrics = Arc::new(Metrics::new()?);
        let metrics_layer = HttpMetricsLayerBuilder::new().build();

        let app_state = SharedState {
            classifier,
            metrics,
        };

        let router = build_router(app_state).layer(metrics_layer);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn({
            let mut shutdown_rx = shutdown_rx.resubscribe();
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move {
                        shutdown_rx.recv().await.ok();
                    })
                    .await?;
                Ok(())
            }
        });

        Ok(server_handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{classifier::ClassifierError, risk::PatientFeatures};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    struct MockClassifier {}

    impl Classifier for MockClassifier {
        fn predict(&self, features: &PatientFeatures) -> Result<i64, ClassifierError> {
            Ok(if features.age >= 50 { 1 } else { 0 })
        }
    }

    struct FailingClassifier {}

    impl Classifier for FailingClassifier {
        fn predict(&self, _features: &PatientFeatures) -> Result<i64, ClassifierError> {
            Err(ClassifierError::Inference("session exploded".into()))
        }
    }

    fn router_with(classifier: Arc<dyn Classifier>) -> Router {
        build_router(SharedState {
            classifier,
            metrics: Arc::new(Metrics::new().unwrap()),
        })
    }

    fn router() -> Router {
        router_with(Arc::new(MockClassifier {}))
    }

    fn json_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_request(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, r#"{"status":"Available"}"#);
    }

    #[tokio::test]
    async fn test_index_renders_form() {
        let response = router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Enter Patient Details"));
        assert!(html.contains("BMI Calculator"));
    }

    #[tokio::test]
    async fn test_predict_json() {
        let response = router()
            .oneshot(json_request(
                "/api/predict",
                r#"{"age": 63, "bmi": 33.1, "skin_thickness": 29.0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["verdict"], "Diabetic");
        assert_eq!(body["label"], 1);
        assert_eq!(body["advice"].as_array().unwrap().len(), 5);

        let response = router()
            .oneshot(json_request(
                "/api/predict",
                r#"{"age": 25, "bmi": 22.0, "skin_thickness": 20.0}"#,
            ))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["verdict"], "Not Diabetic");
    }

    #[tokio::test]
    async fn test_predict_rejects_out_of_range() {
        let response = router()
            .oneshot(json_request(
                "/api/predict",
                r#"{"age": 25, "bmi": 75.0, "skin_thickness": 20.0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(
            body["error"],
            "Invalid input: bmi must be between 10 and 50, got 75"
        );
    }

    #[tokio::test]
    async fn test_predict_inference_failure() {
        let response = router_with(Arc::new(FailingClassifier {}))
            .oneshot(json_request(
                "/api/predict",
                r#"{"age": 40, "bmi": 22.0, "skin_thickness": 20.0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_predict_form() {
        let response = router()
            .oneshot(form_request(
                "/predict",
                "age=71&bmi=28.4&skin_thickness=31",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Prediction: Diabetic"));
        assert!(html.contains("Suggestions for Diabetic Patients"));
        assert!(html.contains("value=\"71\""));
    }

    #[tokio::test]
    async fn test_bmi_json() {
        let response = router()
            .oneshot(json_request(
                "/api/bmi",
                r#"{"height_cm": 170.0, "weight_kg": 70.0}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["bmi"], 24.22);
        assert_eq!(body["category"], "Normal");
        assert_eq!(body["category_name"], "Normal weight");
        assert_eq!(body["charts"]["pie"]["slices"][0]["fraction"], 1.0);
        assert_eq!(body["charts"]["bar"]["bars"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_bmi_form() {
        let response = router()
            .oneshot(form_request("/bmi", "height_cm=160&weight_kg=100"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains("Your BMI is 39.06 (Obesity)"));
        assert_eq!(html.matches("<svg").count(), 3);
    }

    #[tokio::test]
    async fn test_bmi_form_rejects_out_of_range() {
        let response = router()
            .oneshot(form_request("/bmi", "height_cm=20&weight_kg=70"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(response).await;
        assert!(html.contains("height_cm must be between 50 and 250, got 20"));
    }

    #[tokio::test]
    async fn test_predict_form_rejects_malformed_body() {
        let response = router()
            .oneshot(form_request("/predict", "age=abc&bmi=22&skin_thickness=20"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
        let html = body_string(response).await;
        assert!(html.contains("<p class=\"error\">Invalid input: "));
        assert!(html.contains("action=\"/predict\""));
        assert!(!html.contains("Prediction:"));
    }

    #[tokio::test]
    async fn test_bmi_form_rejects_malformed_body() {
        let response = router()
            .oneshot(form_request("/bmi", "height_cm=tall"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(response).await;
        assert!(html.contains("<p class=\"error\">Invalid input: "));
        assert!(html.contains("action=\"/bmi\""));
        assert_eq!(html.matches("<svg").count(), 0);
    }

    #[tokio::test]
    async fn test_form_without_content_type_renders_page() {
        let request = Request::builder()
            .method("POST")
            .uri("/predict")
            .body(Body::from("age=40"))
            .unwrap();
        let response = router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let html = body_string(response).await;
        assert!(html.contains("class=\"error\""));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = router();
        let _ = app
            .clone()
            .oneshot(json_request(
                "/api/bmi",
                r#"{"height_cm": 160.0, "weight_kg": 40.0}"#,
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_string(response).await;
        assert!(text.contains("bmi_category_total"));
        assert!(text.contains("Underweight"));
    }
}
