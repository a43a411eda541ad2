//! Feature extraction for churn model inference.
//!
//! Builds the vector in the exact column order the classifier was trained
//! on: nine base columns followed by the one-hot country block.

use crate::error::Result;
use crate::models::encoders::CategoricalEncoder;
use crate::models::loader::{ModelContext, BASE_FEATURE_COUNT};
use crate::types::customer::CustomerRecord;

/// Base column names, matching the training frame
pub const BASE_FEATURE_NAMES: [&str; BASE_FEATURE_COUNT] = [
    "credit_score",
    "gender",
    "age",
    "tenure",
    "balance",
    "products_number",
    "credit_card",
    "active_member",
    "estimated_salary",
];

/// Feature extractor that turns a customer record into model input.
pub struct FeatureExtractor<'a> {
    gender: &'a dyn CategoricalEncoder,
    country: &'a dyn CategoricalEncoder,
}

impl<'a> FeatureExtractor<'a> {
    /// Create an extractor over the given encoders.
    pub fn new(gender: &'a dyn CategoricalEncoder, country: &'a dyn CategoricalEncoder) -> Self {
        Self { gender, country }
    }

    /// Create an extractor over a loaded context's encoders.
    pub fn from_context(context: &'a ModelContext) -> Self {
        Self::new(&context.gender, &context.country)
    }

    /// Extract features from a customer record.
    ///
    /// Returns `feature_count()` values. Fails only when a categorical value
    /// is unknown to its encoder.
    pub fn extract(&self, record: &CustomerRecord) -> Result<Vec<f32>> {
        let mut features = Vec::with_capacity(self.feature_count());

        features.push(record.credit_score as f32);
        self.gender.encode_into(record.gender.as_str(), &mut features)?;
        features.push(record.age as f32);
        features.push(record.tenure as f32);
        features.push(record.balance as f32);
        features.push(record.products as f32);
        features.push(flag(record.has_credit_card));
        features.push(flag(record.is_active_member));
        features.push(record.salary as f32);

        self.country.encode_into(record.country.as_str(), &mut features)?;

        Ok(features)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        BASE_FEATURE_COUNT - 1 + self.gender.width() + self.country.width()
    }

    /// Get feature names in column order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names: Vec<String> = BASE_FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        names.extend(self.country.column_names());
        names
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}
