//! Gradient boosted trees read from a JSON export
//!
//! Mirrors a binary log-loss gradient boosting classifier: the raw score is
//! the prior log-odds plus the learning-rate-scaled sum of one leaf per tree,
//! squashed through the logistic function.

use crate::error::{ChurnError, Result};
use crate::models::classifier::{sigmoid, Classifier, ClassifierOutput};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// One node of a regression tree
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Internal split: go `left` when `x[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn new(nodes: Vec<TreeNode>) -> Self {
        Self { nodes }
    }

    fn evaluate(&self, features: &[f32]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if f64::from(features[*feature]) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Children must point strictly forward, so traversal always terminates.
    fn check(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {} splits on feature {} but model has {} features",
                        i, feature, n_features
                    ));
                }
                for child in [*left, *right] {
                    if child <= i || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", i, child));
                    }
                }
            }
        }
        Ok(())
    }
}

fn default_threshold() -> f64 {
    0.5
}

/// Unchecked wire form of [`GradientBoostedTrees`]
#[derive(Debug, Clone, Deserialize)]
struct TreeExport {
    n_features: usize,
    learning_rate: f64,
    init_score: f64,
    #[serde(default = "default_threshold")]
    threshold: f64,
    #[serde(default)]
    feature_names: Vec<String>,
    trees: Vec<Tree>,
}

impl TryFrom<TreeExport> for GradientBoostedTrees {
    type Error = String;

    fn try_from(export: TreeExport) -> std::result::Result<Self, String> {
        let model = Self {
            n_features: export.n_features,
            learning_rate: export.learning_rate,
            init_score: export.init_score,
            threshold: export.threshold,
            feature_names: export.feature_names,
            trees: export.trees,
        };
        model.check()?;
        Ok(model)
    }
}

/// Binary gradient boosting classifier.
///
/// Every instance has passed [`GradientBoostedTrees::check`], whether built
/// with `new` or deserialized, so evaluation never leaves the node array or
/// the feature vector.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "TreeExport")]
pub struct GradientBoostedTrees {
    n_features: usize,
    learning_rate: f64,
    /// Prior log-odds of the positive class
    init_score: f64,
    /// Probability above which the label is positive
    threshold: f64,
    feature_names: Vec<String>,
    trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    /// Build a model in memory; fails with `Inference` if the trees are malformed.
    pub fn new(
        n_features: usize,
        learning_rate: f64,
        init_score: f64,
        threshold: f64,
        trees: Vec<Tree>,
    ) -> Result<Self> {
        Self::try_from(TreeExport {
            n_features,
            learning_rate,
            init_score,
            threshold,
            feature_names: Vec::new(),
            trees,
        })
        .map_err(ChurnError::Inference)
    }

    /// Load and structurally check a JSON tree export
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ChurnError::artifact(path, e))?;
        let model: Self =
            serde_json::from_slice(&bytes).map_err(|e| ChurnError::artifact(path, e))?;

        info!(
            path = %path.display(),
            trees = model.trees.len(),
            n_features = model.n_features,
            threshold = model.threshold,
            "Gradient boosted trees loaded"
        );

        Ok(model)
    }

    fn check(&self) -> std::result::Result<(), String> {
        if !self.feature_names.is_empty() && self.feature_names.len() != self.n_features {
            return Err(format!(
                "{} feature names for {} features",
                self.feature_names.len(),
                self.n_features
            ));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!("threshold {} outside [0, 1]", self.threshold));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.check(self.n_features)
                .map_err(|e| format!("tree {}: {}", i, e))?;
        }
        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Raw log-odds score
    pub fn decision_function(&self, features: &[f32]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(ChurnError::Inference(format!(
                "expected {} features, got {}",
                self.n_features,
                features.len()
            )));
        }
        let boost: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        Ok(self.init_score + self.learning_rate * boost)
    }
}

impl Classifier for GradientBoostedTrees {
    fn name(&self) -> &str {
        "gradient_boosted_trees"
    }

    fn expected_width(&self) -> Option<usize> {
        Some(self.n_features)
    }

    fn predict(&self, features: &[f32]) -> Result<ClassifierOutput> {
        let raw = self.decision_function(features)?;
        let probability = sigmoid(raw);
        debug!(raw_score = raw, probability, "Tree ensemble scored");

        Ok(ClassifierOutput {
            label: probability > self.threshold,
            probability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn stump(feature: usize, threshold: f64, left: f64, right: f64) -> Tree {
        Tree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: left },
                TreeNode::Leaf { value: right },
            ],
        }
    }

    fn model() -> GradientBoostedTrees {
        GradientBoostedTrees::new(
            2,
            0.5,
            0.0,
            0.5,
            vec![stump(0, 10.0, -1.0, 1.0), stump(1, 0.5, -1.0, 1.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_decision_function() {
        let m = model();
        assert_eq!(m.decision_function(&[5.0, 0.0]).unwrap(), -1.0);
        assert_eq!(m.decision_function(&[10.0, 1.0]).unwrap(), 0.0);
        assert_eq!(m.decision_function(&[11.0, 1.0]).unwrap(), 1.0);
        assert!(matches!(
            m.decision_function(&[5.0]),
            Err(ChurnError::Inference(_))
        ));
    }

    #[test]
    fn test_predict_label_follows_threshold() {
        let m = model();

        let low = m.predict(&[5.0, 0.0]).unwrap();
        assert!(!low.label);
        assert!((low.probability - sigmoid(-1.0)).abs() < 1e-12);

        // Exactly 0.5 is not above the threshold.
        let even = m.predict(&[10.0, 1.0]).unwrap();
        assert_eq!(even.probability, 0.5);
        assert!(!even.label);

        let high = m.predict(&[11.0, 1.0]).unwrap();
        assert!(high.label);
    }

    #[test]
    fn test_wrong_width_is_inference_error() {
        let m = model();
        assert!(matches!(
            m.predict(&[1.0, 2.0, 3.0]),
            Err(ChurnError::Inference(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_trees() {
        let out_of_range = GradientBoostedTrees::new(2, 1.0, 0.0, 0.5, vec![stump(5, 0.0, 0.0, 0.0)]);
        assert!(matches!(out_of_range, Err(ChurnError::Inference(_))));

        let cycle = Tree::new(vec![TreeNode::Split {
            feature: 0,
            threshold: 0.0,
            left: 0,
            right: 0,
        }]);
        let err = GradientBoostedTrees::new(2, 1.0, 0.0, 0.5, vec![cycle])
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid child"));

        assert!(GradientBoostedTrees::new(2, 1.0, 0.0, 1.5, vec![]).is_err());
    }

    #[test]
    fn test_deserialize_runs_structural_check() {
        // Splits on feature 40 of an 11-feature model.
        let json = r#"{"n_features": 11, "learning_rate": 1.0, "init_score": 0.0,
            "trees": [{"nodes": [
                {"feature": 40, "threshold": 0.5, "left": 1, "right": 2},
                {"value": 0.0}, {"value": 1.0}
            ]}]}"#;
        let err = serde_json::from_str::<GradientBoostedTrees>(json).unwrap_err();
        assert!(err.to_string().contains("splits on feature 40"));

        let backwards = r#"{"n_features": 1, "learning_rate": 1.0, "init_score": 0.0,
            "trees": [{"nodes": [
                {"value": 0.0},
                {"feature": 0, "threshold": 0.5, "left": 0, "right": 0}
            ]}]}"#;
        assert!(serde_json::from_str::<GradientBoostedTrees>(backwards).is_err());
    }

    #[test]
    fn test_load_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "n_features": 2,
                "learning_rate": 1.0,
                "init_score": -0.25,
                "trees": [
                    {{"nodes": [
                        {{"feature": 1, "threshold": 0.5, "left": 1, "right": 2}},
                        {{"value": -0.5}},
                        {{"value": 0.75}}
                    ]}}
                ]
            }}"#
        )
        .unwrap();

        let m = GradientBoostedTrees::load(file.path()).unwrap();
        assert_eq!(m.threshold(), 0.5);
        assert_eq!(m.expected_width(), Some(2));
        assert_eq!(m.decision_function(&[0.0, 1.0]).unwrap(), 0.5);
    }

    #[test]
    fn test_load_rejects_out_of_range_feature() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"n_features": 1, "learning_rate": 1.0, "init_score": 0.0,
                "trees": [{{"nodes": [
                    {{"feature": 3, "threshold": 0.5, "left": 1, "right": 2}},
                    {{"value": 0.0}}, {{"value": 1.0}}
                ]}}]}}"#
        )
        .unwrap();

        assert!(matches!(
            GradientBoostedTrees::load(file.path()),
            Err(ChurnError::ArtifactLoad { .. })
        ));
    }
}
