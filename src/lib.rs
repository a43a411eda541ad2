//! Bank Churn Predictor Library
//!
//! Encodes a customer record into the feature layout a pre-trained churn
//! classifier expects and reports the predicted label and probability.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod form;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::ChurnError;
pub use feature_extractor::FeatureExtractor;
pub use models::inference::InferenceEngine;
pub use types::{customer::CustomerRecord, prediction::PredictionResult};
