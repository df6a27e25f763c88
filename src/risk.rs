use crate::classifier::{Classifier, ClassifierError};
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Inputs of the risk estimator, fed to the model in field order.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PatientFeatures {
    pub age: u32,
    pub bmi: f64,
    pub skin_thickness: f64,
}

impl Default for PatientFeatures {
    fn default() -> Self {
        Self {
            age: 25,
            bmi: 22.0,
            skin_thickness: 20.0,
        }
    }
}

impl PatientFeatures {
    pub fn to_vector(&self) -> [f32; 3] {
        [self.age as f32, self.bmi as f32, self.skin_thickness as f32]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Diabetic,
    NotDiabetic,
}

const DIABETIC_ADVICE: [&str; 5] = [
    "Maintain a healthy, low-sugar diet (rich in vegetables and whole grains).",
    "Exercise daily, even walking 30 minutes helps.",
    "Monitor your blood sugar regularly.",
    "Follow prescribed medication or insulin plans.",
    "Schedule regular checkups with your healthcare provider.",
];

const PREVENTION_ADVICE: [&str; 5] = [
    "Eat a balanced diet (limit processed foods and sugary drinks).",
    "Stay physically active, at least 150 minutes of exercise per week.",
    "Maintain a healthy weight.",
    "Avoid smoking and excess alcohol.",
    "Get regular screening if you are at risk.",
];

impl Verdict {
    /// Only label `1` is positive.
    pub fn from_label(label: i64) -> Self {
        if label == 1 {
            Verdict::Diabetic
        } else {
            Verdict::NotDiabetic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Diabetic => "Diabetic",
            Verdict::NotDiabetic => "Not Diabetic",
        }
    }

    pub fn advice_title(&self) -> &'static str {
        match self {
            Verdict::Diabetic => "Suggestions for Diabetic Patients",
            Verdict::NotDiabetic => "Tips to Stay Healthy and Prevent Diabetes",
        }
    }

    pub fn advice(&self) -> &'static [&'static str] {
        match self {
            Verdict::Diabetic => &DIABETIC_ADVICE,
            Verdict::NotDiabetic => &PREVENTION_ADVICE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub features: PatientFeatures,
    pub label: i64,
    pub verdict: &'static str,
    pub advice_title: &'static str,
    pub advice: Vec<&'static str>,
}

impl RiskAssessment {
    pub fn verdict(&self) -> Verdict {
        Verdict::from_label(self.label)
    }
}

#[instrument(skip(classifier))]
pub fn estimate(
    classifier: &dyn Classifier,
    features: PatientFeatures,
) -> Result<RiskAssessment, ClassifierError> {
    let label = classifier.predict(&features)?;
    let verdict = Verdict::from_label(label);
    tracing::debug!("Model returned label {} ({})", label, verdict.as_str());

    Ok(RiskAssessment {
        features,
        label,
        verdict: verdict.as_str(),
        advice_title: verdict.advice_title(),
        advice: verdict.advice().to_vec(),
    })
}
