//! Classifier capability shared by all model backends

use crate::error::Result;

/// Raw classifier output for one feature vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierOutput {
    /// Predicted class (true = churn)
    pub label: bool,
    /// Probability of the positive class
    pub probability: f64,
}

/// A pre-trained binary classifier over a fixed-order feature vector.
///
/// Implementations must be shareable across threads; any interior
/// mutability the runtime needs stays inside the backend.
pub trait Classifier: Send + Sync {
    /// Backend name for logs and `inspect`
    fn name(&self) -> &str;

    /// Feature width the model was trained on, when the artifact declares it
    fn expected_width(&self) -> Option<usize>;

    /// Score a single feature vector
    fn predict(&self, features: &[f32]) -> Result<ClassifierOutput>;
}

/// Logistic link used by boosted-tree log-odds scores
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
        assert!(sigmoid(f64::INFINITY) <= 1.0);
        assert!(sigmoid(f64::NEG_INFINITY) >= 0.0);
    }
}
