//! ONNX Runtime classifier backend
//!
//! Handles the two output layouts a converted scikit-learn classifier can
//! have: a `[batch, n_classes]` probability tensor, or the zipmap layout
//! `seq(map(int64, float))`.

use crate::error::{ChurnError, Result};
use crate::models::classifier::{Classifier, ClassifierOutput};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor, ValueType};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, warn};

/// Loaded ONNX classifier with its resolved input/output names
pub struct OnnxClassifier {
    /// ONNX Runtime session; `run` needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    label_name: Option<String>,
    probability_name: String,
    /// Static feature width declared by the graph input, if any
    width: Option<usize>,
}

fn ort_err<E: std::fmt::Display>(path: &Path) -> impl Fn(E) -> ChurnError + '_ {
    move |e| ChurnError::artifact(path, e)
}

impl OnnxClassifier {
    /// Load an ONNX classifier from file
    pub fn load<P: AsRef<Path>>(path: P, threads: usize) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChurnError::artifact(path, "file not found"));
        }

        info!(path = %path.display(), threads, "Loading ONNX classifier");

        ort::init().commit().map_err(ort_err(path))?;

        let session = Session::builder()
            .map_err(ort_err(path))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_err(path))?
            .with_intra_threads(threads)
            .map_err(ort_err(path))?
            .commit_from_file(path)
            .map_err(ort_err(path))?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| ChurnError::artifact(path, "model has no inputs"))?;
        let input_name = input.name.clone();

        let width = match &input.input_type {
            ValueType::Tensor { shape, .. } => shape.last().copied().filter(|d| *d > 0).map(|d| d as usize),
            _ => None,
        };

        let label_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("label"))
            .map(|o| o.name.clone());

        let probability_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .ok_or_else(|| ChurnError::artifact(path, "model has no outputs"))?;

        info!(
            input = %input_name,
            label = ?label_name,
            probabilities = %probability_name,
            width = ?width,
            "ONNX classifier loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            label_name,
            probability_name,
            width,
        })
    }

    /// Extract the positive-class probability from the session outputs
    fn extract_probability(&self, outputs: &SessionOutputs) -> Result<f64> {
        let output = outputs.get(self.probability_name.as_str()).ok_or_else(|| {
            ChurnError::Inference(format!("missing output '{}'", self.probability_name))
        })?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            return positive_from_tensor(shape, data);
        }

        if DynSequenceValueType::can_downcast(&output.dtype()) {
            return positive_from_sequence_map(output);
        }

        Err(ChurnError::Inference(format!(
            "unsupported probability output type {:?}",
            output.dtype()
        )))
    }

    fn extract_label(&self, outputs: &SessionOutputs) -> Option<bool> {
        let name = self.label_name.as_deref()?;
        let output = outputs.get(name)?;
        match output.try_extract_tensor::<i64>() {
            Ok((_, data)) => data.first().map(|&l| l == 1),
            Err(e) => {
                warn!(output = %name, error = %e, "Label output is not an int64 tensor");
                None
            }
        }
    }
}

/// Probability tensor is `[1, n_classes]` or `[n_classes]`; a single
/// column is already the positive class.
fn positive_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> Result<f64> {
    let classes = shape.last().copied().unwrap_or(0);
    match classes {
        c if c >= 2 && data.len() >= 2 => Ok(f64::from(data[1])),
        1 if !data.is_empty() => Ok(f64::from(data[0])),
        _ => Err(ChurnError::Inference(format!(
            "unexpected probability tensor shape {:?}",
            shape
        ))),
    }
}

fn positive_from_sequence_map(output: &DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| ChurnError::Inference(format!("not a sequence: {}", e)))?;

    let maps = sequence
        .try_extract_sequence::<DynMapValueType>(&allocator)
        .map_err(|e| ChurnError::Inference(e.to_string()))?;

    let first = maps
        .first()
        .ok_or_else(|| ChurnError::Inference("empty probability sequence".to_string()))?;

    let pairs = first
        .try_extract_key_values::<i64, f32>()
        .map_err(|e| ChurnError::Inference(e.to_string()))?;

    positive_from_pairs(&pairs)
}

/// Zipmap entries are `(class, probability)`; class 1 is churn.
fn positive_from_pairs(pairs: &[(i64, f32)]) -> Result<f64> {
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
        return Ok(f64::from(*p));
    }
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - f64::from(*p));
    }
    Err(ChurnError::Inference("no class probability in map".to_string()))
}

fn check_input_width(expected: Option<usize>, actual: usize) -> Result<()> {
    match expected {
        Some(width) if width != actual => Err(ChurnError::Inference(format!(
            "expected {} features, got {}",
            width, actual
        ))),
        _ => Ok(()),
    }
}

/// The graph's own label wins; without one, fall back to the 0.5 cut.
fn resolve_label(model_label: Option<bool>, probability: f64) -> bool {
    model_label.unwrap_or(probability > 0.5)
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn expected_width(&self) -> Option<usize> {
        self.width
    }

    fn predict(&self, features: &[f32]) -> Result<ClassifierOutput> {
        check_input_width(self.width, features.len())?;

        let shape = vec![1_i64, features.len() as i64];
        let input = Tensor::from_array((shape, features.to_vec()))
            .map_err(|e| ChurnError::Inference(format!("failed to build input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ChurnError::Inference(format!("session lock poisoned: {}", e)))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| ChurnError::Inference(e.to_string()))?;

        let probability = self.extract_probability(&outputs)?;
        let label = resolve_label(self.extract_label(&outputs), probability);

        debug!(probability, label, "ONNX classifier scored");

        Ok(ClassifierOutput { label, probability })
    }
}
