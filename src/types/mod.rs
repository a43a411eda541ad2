//! Type definitions for the churn predictor

pub mod customer;
pub mod prediction;

pub use customer::{Country, CustomerRecord, Gender};
pub use prediction::PredictionResult;
