use crate::{bmi::BmiRecord, risk::PatientFeatures};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub name: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const AGE: FieldBounds = FieldBounds {
    name: "age",
    min: 1.0,
    max: 120.0,
};
pub const BMI: FieldBounds = FieldBounds {
    name: "bmi",
    min: 10.0,
    max: 50.0,
};
pub const SKIN_THICKNESS: FieldBounds = FieldBounds {
    name: "skin_thickness",
    min: 1.0,
    max: 100.0,
};
pub const HEIGHT_CM: FieldBounds = FieldBounds {
    name: "height_cm",
    min: 50.0,
    max: 250.0,
};
pub const WEIGHT_KG: FieldBounds = FieldBounds {
    name: "weight_kg",
    min: 10.0,
    max: 300.0,
};

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

impl FieldBounds {
    pub fn check(&self, value: f64) -> Result<(), ValidationError> {
        if value.is_finite() && value >= self.min && value <= self.max {
            Ok(())
        } else {
            Err(ValidationError::OutOfRange {
                name: self.name,
                min: self.min,
                max: self.max,
                value,
            })
        }
    }
}

/// Mirrors the numeric bounds of the input form.
pub trait Validatable {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validatable for PatientFeatures {
    fn validate(&self) -> Result<(), ValidationError> {
        AGE.check(self.age as f64)?;
        BMI.check(self.bmi)?;
        SKIN_THICKNESS.check(self.skin_thickness)
    }
}

impl Validatable for BmiRecord {
    fn validate(&self) -> Result<(), ValidationError> {
        HEIGHT_CM.check(self.height_cm)?;
        WEIGHT_KG.check(self.weight_kg)
    }
}
