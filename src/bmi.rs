use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct BmiRecord {
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl Default for BmiRecord {
    fn default() -> Self {
        Self {
            height_cm: 170.0,
            weight_kg: 70.0,
        }
    }
}

impl BmiRecord {
    /// `weight / height_m^2`, rounded half away from zero to two decimals.
    ///
    /// Computed over centimetres so that exact ties such as 15.625 stay exact
    /// instead of drifting below the midpoint through `1.6 * 1.6`.
    pub fn bmi(&self) -> f64 {
        round2(self.weight_kg * 10_000.0 / (self.height_cm * self.height_cm))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Values in `[24.9, 25)` fall through to `Obese`, as do values in `[29.9, 30)`.
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            BmiCategory::Underweight
        } else if (18.5..24.9).contains(&bmi) {
            BmiCategory::Normal
        } else if (25.0..29.9).contains(&bmi) {
            BmiCategory::Overweight
        } else {
            BmiCategory::Obese
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal weight",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obesity",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }

    /// Healthy/risk split shown in the risk pie chart.
    pub fn risk_split(&self) -> RiskSplit {
        let (healthy, risk) = match self {
            BmiCategory::Normal => (1.0, 0.0),
            BmiCategory::Underweight => (0.2, 0.8),
            BmiCategory::Overweight => (0.4, 0.6),
            BmiCategory::Obese => (0.1, 0.9),
        };
        RiskSplit { healthy, risk }
    }

    pub fn all() -> [BmiCategory; 4] {
        [
            BmiCategory::Underweight,
            BmiCategory::Normal,
            BmiCategory::Overweight,
            BmiCategory::Obese,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskSplit {
    pub healthy: f64,
    pub risk: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct BmiAnalysis {
    pub record: BmiRecord,
    pub bmi: f64,
    pub category: BmiCategory,
    pub category_name: &'static str,
    pub summary: String,
}

pub fn analyze(record: BmiRecord) -> BmiAnalysis {
    let bmi = record.bmi();
    let category = BmiCategory::from_bmi(bmi);
    BmiAnalysis {
        record,
        bmi,
        category,
        category_name: category.display_name(),
        summary: format!("Your BMI is {} ({})", bmi, category.display_name()),
    }
}
