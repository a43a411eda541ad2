//! Artifact-backed encoders and classifiers

pub mod classifier;
pub mod encoders;
pub mod inference;
pub mod loader;
pub mod onnx;
pub mod trees;

pub use classifier::{Classifier, ClassifierOutput};
pub use encoders::{CategoricalEncoder, LabelEncoder, OneHotEncoder};
pub use inference::InferenceEngine;
pub use loader::{ArtifactLoader, ModelContext};
