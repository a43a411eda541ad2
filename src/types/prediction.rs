//! Prediction output

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a single churn inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Whether the customer is predicted to churn
    pub label: bool,
    /// Probability of the churn class (0.0 - 1.0)
    pub probability: f64,
}

impl PredictionResult {
    /// Headline shown to the user
    pub fn headline(&self) -> &'static str {
        if self.label {
            "Yes 🚨 Customer Likely to Churn"
        } else {
            "No ✅ Customer is Safe"
        }
    }

    /// Probability formatted with two decimals
    pub fn probability_text(&self) -> String {
        format!("Churn Probability: {:.2}", self.probability)
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.headline(), self.probability_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering() {
        let churn = PredictionResult {
            label: true,
            probability: 0.8765,
        };
        assert_eq!(churn.headline(), "Yes 🚨 Customer Likely to Churn");
        assert_eq!(churn.probability_text(), "Churn Probability: 0.88");

        let safe = PredictionResult {
            label: false,
            probability: 0.1,
        };
        assert_eq!(
            safe.to_string(),
            "No ✅ Customer is Safe (Churn Probability: 0.10)"
        );
    }

    #[test]
    fn test_json_shape() {
        let result = PredictionResult {
            label: true,
            probability: 0.5,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["label"], true);
        assert_eq!(json["probability"], 0.5);
    }
}
