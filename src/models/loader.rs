//! Artifact loader

use crate::config::ArtifactsConfig;
use crate::error::{ChurnError, Result};
use crate::models::classifier::Classifier;
use crate::models::encoders::{CategoricalEncoder, LabelEncoder, OneHotEncoder};
use crate::models::onnx::OnnxClassifier;
use crate::models::trees::GradientBoostedTrees;
use std::path::{Path, PathBuf};
use tracing::info;

/// Number of columns that precede the one-hot block
pub const BASE_FEATURE_COUNT: usize = 9;

/// Everything inference needs, loaded once and never mutated
pub struct ModelContext {
    /// Gender label mapping
    pub gender: LabelEncoder,
    /// Country one-hot scheme
    pub country: OneHotEncoder,
    /// Trained churn classifier
    pub classifier: Box<dyn Classifier>,
}

impl ModelContext {
    /// Assemble a context from already-built parts, checking feature widths.
    pub fn new(
        gender: LabelEncoder,
        country: OneHotEncoder,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self> {
        let context = Self {
            gender,
            country,
            classifier,
        };
        context.check_width(Path::new("<classifier>"))?;
        Ok(context)
    }

    /// Width of the vector fed to the classifier
    pub fn feature_width(&self) -> usize {
        BASE_FEATURE_COUNT + self.country.width()
    }

    fn check_width(&self, classifier_path: &Path) -> Result<()> {
        match self.classifier.expected_width() {
            Some(expected) if expected != self.feature_width() => Err(ChurnError::artifact(
                classifier_path,
                format!(
                    "classifier expects {} features but encoders produce {}",
                    expected,
                    self.feature_width()
                ),
            )),
            _ => Ok(()),
        }
    }
}

/// Supported classifier serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierFormat {
    Onnx,
    Json,
}

impl ClassifierFormat {
    /// Pick the format from the artifact's file extension
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("onnx") => Ok(ClassifierFormat::Onnx),
            Some("json") => Ok(ClassifierFormat::Json),
            other => Err(ChurnError::artifact(
                path,
                format!("unsupported classifier format {:?} (expected .onnx or .json)", other),
            )),
        }
    }
}

/// Loader for the three artifacts named in configuration
pub struct ArtifactLoader {
    dir: PathBuf,
    label_encoder: String,
    one_hot_encoder: String,
    classifier: String,
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ArtifactLoader {
    pub fn new(config: &ArtifactsConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            label_encoder: config.label_encoder.clone(),
            one_hot_encoder: config.one_hot_encoder.clone(),
            classifier: config.classifier.clone(),
            onnx_threads: config.onnx_threads,
        }
    }

    pub fn classifier_path(&self) -> PathBuf {
        self.dir.join(&self.classifier)
    }

    /// Load a classifier, dispatching on its file extension
    pub fn load_classifier(&self, path: &Path) -> Result<Box<dyn Classifier>> {
        let classifier: Box<dyn Classifier> = match ClassifierFormat::from_path(path)? {
            ClassifierFormat::Onnx => Box::new(OnnxClassifier::load(path, self.onnx_threads)?),
            ClassifierFormat::Json => Box::new(GradientBoostedTrees::load(path)?),
        };
        Ok(classifier)
    }

    /// Load all artifacts into a context
    pub fn load(&self) -> Result<ModelContext> {
        info!(dir = %self.dir.display(), "Loading model artifacts");

        let gender = LabelEncoder::load(self.dir.join(&self.label_encoder))?;
        let country = OneHotEncoder::load(self.dir.join(&self.one_hot_encoder))?;

        let classifier_path = self.classifier_path();
        let classifier = self.load_classifier(&classifier_path)?;

        let context = ModelContext {
            gender,
            country,
            classifier,
        };
        context.check_width(&classifier_path)?;

        info!(
            classifier = context.classifier.name(),
            width = context.feature_width(),
            "Model artifacts loaded"
        );

        Ok(context)
    }
}
