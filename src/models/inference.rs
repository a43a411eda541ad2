//! Churn inference engine

use crate::config::AppConfig;
use crate::error::{ChurnError, Result};
use crate::feature_extractor::FeatureExtractor;
use crate::models::loader::{ArtifactLoader, ModelContext};
use crate::types::customer::CustomerRecord;
use crate::types::prediction::PredictionResult;
use tracing::{debug, info};

/// Stateless churn inference over loaded artifacts.
///
/// Share it behind an `Arc`; every call only reads the context.
pub struct InferenceEngine {
    context: ModelContext,
}

impl InferenceEngine {
    /// Create a new inference engine from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let context = ArtifactLoader::new(&config.artifacts).load()?;
        Ok(Self::with_context(context))
    }

    /// Create an inference engine over an already-loaded context
    pub fn with_context(context: ModelContext) -> Self {
        info!(
            classifier = context.classifier.name(),
            features = context.feature_width(),
            "Inference engine initialized"
        );
        Self { context }
    }

    pub fn context(&self) -> &ModelContext {
        &self.context
    }

    pub fn extractor(&self) -> FeatureExtractor<'_> {
        FeatureExtractor::from_context(&self.context)
    }

    /// Validate and encode a record without scoring it
    pub fn encode(&self, record: &CustomerRecord) -> Result<Vec<f32>> {
        record.validate()?;
        self.extractor().extract(record)
    }

    /// Predict churn for a single customer record
    pub fn infer(&self, record: &CustomerRecord) -> Result<PredictionResult> {
        let features = self.encode(record)?;
        let output = self.context.classifier.predict(&features)?;

        if !output.probability.is_finite() || !(0.0..=1.0).contains(&output.probability) {
            return Err(ChurnError::Inference(format!(
                "classifier returned probability {} outside [0, 1]",
                output.probability
            )));
        }

        debug!(
            classifier = self.context.classifier.name(),
            label = output.label,
            probability = output.probability,
            "Inference complete"
        );

        Ok(PredictionResult {
            label: output.label,
            probability: output.probability,
        })
    }
}
