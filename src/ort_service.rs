use crate::{
    classifier::{Classifier, ClassifierError},
    config::ModelConfig,
    risk::PatientFeatures,
};
use ndarray::Array2;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::TensorRef,
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// ONNX Runtime backed classifier, e.g. a scikit-learn SVM exported with
/// skl2onnx. Expects a `[1, 3]` float input and an int64 label output.
#[derive(Clone)]
pub struct OrtClassifier {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
    input_name: String,
    output_name: String,
}

impl OrtClassifier {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ClassifierError> {
        let model_path = model_config.get_path();
        if !model_path.exists() {
            return Err(ClassifierError::LoadFailed(format!(
                "model file not found: {:?}",
                model_path
            )));
        }

        let num_instances = model_config.num_instances.max(1);
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(&model_path)?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()
            .map_err(|e| ClassifierError::LoadFailed(e.to_string()))?;

        tracing::info!(
            "Created {} ONNX sessions from {:?}",
            num_instances,
            model_path
        );

        Ok(Self {
            sessions: Arc::new(sessions),
            counter: Arc::new(AtomicUsize::new(0)),
            input_name: model_config.input_name.clone(),
            output_name: model_config.output_name.clone(),
        })
    }

    fn run_inference(&self, input: &Array2<f32>) -> Result<i64, ClassifierError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let mut session = self.sessions[index]
            .lock()
            .map_err(|e| ClassifierError::SessionPoisoned(e.to_string()))?;

        tracing::debug!("Handling request with session {}", index);

        let tensor_ref = TensorRef::from_array_view(input.view())
            .map_err(|e| ClassifierError::InputTensor(e.to_string()))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => tensor_ref])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ClassifierError::Inference(format!("model has no output `{}`", self.output_name))
        })?;

        let (_shape, labels) = output
            .try_extract_tensor::<i64>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        labels
            .first()
            .copied()
            .ok_or_else(|| ClassifierError::MissingLabel(self.output_name.clone()))
    }
}

fn to_input_tensor(features: &PatientFeatures) -> Array2<f32> {
    let [age, bmi, skin_thickness] = features.to_vector();
    ndarray::arr2(&[[age, bmi, skin_thickness]])
}

impl Classifier for OrtClassifier {
    fn predict(&self, features: &PatientFeatures) -> Result<i64, ClassifierError> {
        let input = to_input_tensor(features);
        self.run_inference(&input)
    }
}
