use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    _provider: SdkMeterProvider,
    request_counter: Counter<u64>,
    prediction_duration: Histogram<u64>,
    prediction_counter: Counter<u64>,
    bmi_category_counter: Counter<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();

        let meter = provider.meter("diabetes_risk");
        // The HTTP metrics layer reads the global provider.
        global::set_meter_provider(provider.clone());

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of requests")
            .build();

        let boundaries = generate_boundaries((50, 250, 1000, 5000, 20000));

        let prediction_duration = meter
            .u64_histogram("prediction_duration_us")
            .with_boundaries(boundaries)
            .with_description("Duration of model inference in microseconds")
            .build();

        let prediction_counter = meter
            .u64_counter("predictions_total")
            .with_description("Number of risk predictions by verdict")
            .build();

        let bmi_category_counter = meter
            .u64_counter("bmi_category_total")
            .with_description("Number of BMI calculations by category")
            .build();

        Ok(Metrics {
            _provider: provider,
            request_counter,
            prediction_duration,
            prediction_counter,
            bmi_category_counter,
            registry,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_prediction_duration(&self, duration_us: u64, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.prediction_duration.record(duration_us, &attributes);
    }

    pub fn record_verdict(&self, verdict: &str) {
        let attributes = vec![KeyValue::new("verdict", verdict.to_string())];
        self.prediction_counter.add(1, &attributes);
    }

    pub fn record_bmi_category(&self, category: &str) {
        let attributes = vec![KeyValue::new("category", category.to_string())];
        self.bmi_category_counter.add(1, &attributes);
    }
}

fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_step: usize = 50;
    let middle_step: usize = 250;
    let end_step: usize = 1000;
    let tail_step: usize = 5000;
    let first_part = (parts.0..=parts.1).step_by(first_step);
    let middle_part = (parts.1..=parts.2).step_by(middle_step);
    let end_part = (parts.2..=parts.3).step_by(end_step);
    let tail_part = (parts.3..=parts.4).step_by(tail_step);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}
