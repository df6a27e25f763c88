use crate::risk::PatientFeatures;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to load model: {0}")]
    LoadFailed(String),
    #[error("Session mutex poisoned: {0}")]
    SessionPoisoned(String),
    #[error("Failed to build input tensor: {0}")]
    InputTensor(String),
    #[error("Inference failed: {0}")]
    Inference(String),
    #[error("Model produced no label in output `{0}`")]
    MissingLabel(String),
}

/// A frozen binary classifier over `[age, bmi, skin_thickness]`.
///
/// Implementations are loaded once at startup and shared read-only between
/// requests.
pub trait Classifier: Send + Sync + 'static {
    fn predict(&self, features: &PatientFeatures) -> Result<i64, ClassifierError>;
}
