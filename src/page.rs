use crate::{
    bmi::{BmiAnalysis, BmiRecord},
    charts::RenderedCharts,
    risk::{PatientFeatures, RiskAssessment, Verdict},
    validation::{FieldBounds, AGE, BMI, HEIGHT_CM, SKIN_THICKNESS, WEIGHT_KG},
};

const STYLE: &str = "body{font-family:sans-serif;max-width:720px;margin:2em auto;padding:0 1em}\
form{display:grid;gap:.5em;margin-bottom:1em}\
.verdict{padding:.75em;border-radius:6px}\
.diabetic{background:#ffe3e3}.healthy{background:#d3f9d8}\
.info{background:#e7f5ff;padding:.75em;border-radius:6px}\
.error{background:#fff3bf;padding:.75em;border-radius:6px}";

/// The single form page, optionally carrying the outcome of the last action.
#[derive(Default)]
pub struct Page<'a> {
    pub features: PatientFeatures,
    pub record: BmiRecord,
    pub assessment: Option<&'a RiskAssessment>,
    pub bmi: Option<(&'a BmiAnalysis, &'a RenderedCharts)>,
    pub error: Option<String>,
}

impl Page<'_> {
    pub fn render(&self) -> String {
        let mut html = String::with_capacity(8 * 1024);
        html.push_str(&format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\">\
             <title>Diabetes Prediction App</title><style>{STYLE}</style></head><body>\
             <h1>Diabetes Prediction App</h1>"
        ));

        if let Some(error) = &self.error {
            html.push_str(&format!("<p class=\"error\">{}</p>", escape(error)));
        }

        html.push_str("<h2>Enter Patient Details</h2><form method=\"post\" action=\"/predict\">");
        number_input(&mut html, "Age", &AGE, &self.features.age.to_string(), "1");
        number_input(&mut html, "BMI", &BMI, &self.features.bmi.to_string(), "0.01");
        number_input(
            &mut html,
            "Skin Thickness",
            &SKIN_THICKNESS,
            &self.features.skin_thickness.to_string(),
            "0.01",
        );
        html.push_str("<button type=\"submit\">Predict</button></form>");

        if let Some(assessment) = self.assessment {
            let class = match assessment.verdict() {
                Verdict::Diabetic => "diabetic",
                Verdict::NotDiabetic => "healthy",
            };
            html.push_str(&format!(
                "<p class=\"verdict {class}\">Prediction: {}</p><details open><summary>{}</summary><ul>",
                assessment.verdict, assessment.advice_title
            ));
            for line in &assessment.advice {
                html.push_str(&format!("<li>{line}</li>"));
            }
            html.push_str("</ul></details>");
        }

        html.push_str("<h2>BMI Calculator</h2><form method=\"post\" action=\"/bmi\">");
        number_input(
            &mut html,
            "Height (in cm)",
            &HEIGHT_CM,
            &self.record.height_cm.to_string(),
            "0.1",
        );
        number_input(
            &mut html,
            "Weight (in kg)",
            &WEIGHT_KG,
            &self.record.weight_kg.to_string(),
            "0.1",
        );
        html.push_str("<button type=\"submit\">Calculate BMI</button></form>");

        if let Some((analysis, charts)) = self.bmi {
            html.push_str(&format!(
                "<p class=\"info\">{}</p>\
                 <h3>BMI Category Chart</h3>{}\
                 <h3>BMI Gauge Indicator</h3>{}\
                 <h3>BMI Risk Chart</h3>{}",
                analysis.summary, charts.bar, charts.gauge, charts.pie
            ));
        }

        html.push_str("</body></html>");
        html
    }
}

fn number_input(html: &mut String, label: &str, bounds: &FieldBounds, value: &str, step: &str) {
    html.push_str(&format!(
        "<label>{label} <input type=\"number\" name=\"{}\" min=\"{}\" max=\"{}\" step=\"{step}\" value=\"{}\" required></label>",
        bounds.name,
        bounds.min,
        bounds.max,
        escape(value)
    ));
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
