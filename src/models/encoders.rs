//! Categorical encoders fit at training time
//!
//! Both encoders are read from JSON artifacts exported alongside the
//! classifier. Neither ever invents a code for a value it was not fit with.

use crate::error::{ChurnError, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Maps a categorical value onto one or more numeric feature columns.
pub trait CategoricalEncoder: Send + Sync {
    /// Name of the encoded feature
    fn feature(&self) -> &str;

    /// Number of columns produced per value
    fn width(&self) -> usize;

    /// Column names, in output order
    fn column_names(&self) -> Vec<String>;

    /// Append the encoding of `value` to `out`.
    fn encode_into(&self, value: &str, out: &mut Vec<f32>) -> Result<()>;

    /// Encode `value` into a fresh vector.
    fn encode(&self, value: &str) -> Result<Vec<f32>> {
        let mut out = Vec::with_capacity(self.width());
        self.encode_into(value, &mut out)?;
        Ok(out)
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).map_err(|e| ChurnError::artifact(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| ChurnError::artifact(path, e))
}

fn ensure_unique(path: &Path, values: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    if values.is_empty() {
        return Err(ChurnError::artifact(path, "no categories"));
    }
    for v in values {
        if !seen.insert(v.as_str()) {
            return Err(ChurnError::artifact(path, format!("duplicate category '{}'", v)));
        }
    }
    Ok(())
}

/// Single-column integer coding: a value's code is its index in `classes`.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelEncoder {
    #[serde(default = "default_label_feature")]
    feature: String,
    classes: Vec<String>,
}

fn default_label_feature() -> String {
    "gender".to_string()
}

impl LabelEncoder {
    pub fn new(feature: &str, classes: Vec<String>) -> Self {
        Self {
            feature: feature.to_string(),
            classes,
        }
    }

    /// Load a label mapping artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let encoder: Self = read_json(path)?;
        ensure_unique(path, &encoder.classes)?;

        info!(
            feature = %encoder.feature,
            classes = ?encoder.classes,
            path = %path.display(),
            "Label encoder loaded"
        );

        Ok(encoder)
    }

    /// Integer code for `value`
    pub fn code(&self, value: &str) -> Result<usize> {
        self.classes
            .iter()
            .position(|c| c == value)
            .ok_or_else(|| ChurnError::Encoding {
                feature: self.feature.clone(),
                value: value.to_string(),
                known: self.classes.join(", "),
            })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}

impl CategoricalEncoder for LabelEncoder {
    fn feature(&self) -> &str {
        &self.feature
    }

    fn width(&self) -> usize {
        1
    }

    fn column_names(&self) -> Vec<String> {
        vec![self.feature.clone()]
    }

    fn encode_into(&self, value: &str, out: &mut Vec<f32>) -> Result<()> {
        out.push(self.code(value)? as f32);
        Ok(())
    }
}

/// Indicator-column coding over a fixed category list.
#[derive(Debug, Clone, Deserialize)]
pub struct OneHotEncoder {
    #[serde(default = "default_one_hot_feature")]
    feature: String,
    categories: Vec<String>,
    /// `"first"` drops the first category; any other string names the
    /// dropped category.
    #[serde(default)]
    drop: Option<String>,
    #[serde(skip)]
    dropped: Option<usize>,
}

fn default_one_hot_feature() -> String {
    "country".to_string()
}

impl OneHotEncoder {
    /// Build an encoder directly; `drop` follows the artifact convention.
    pub fn new(feature: &str, categories: Vec<String>, drop: Option<&str>) -> Result<Self> {
        let encoder = Self {
            feature: feature.to_string(),
            categories,
            drop: drop.map(str::to_string),
            dropped: None,
        };
        encoder.resolve(Path::new("<memory>"))
    }

    /// Load a one-hot scheme artifact
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let encoder: Self = read_json(path)?;
        let encoder = encoder.resolve(path)?;

        info!(
            feature = %encoder.feature,
            categories = ?encoder.categories,
            dropped = ?encoder.dropped_category(),
            width = encoder.width(),
            path = %path.display(),
            "One-hot encoder loaded"
        );

        Ok(encoder)
    }

    fn resolve(mut self, path: &Path) -> Result<Self> {
        ensure_unique(path, &self.categories)?;
        self.dropped = match self.drop.as_deref() {
            None => None,
            Some("first") => Some(0),
            Some(name) => {
                let idx = self.categories.iter().position(|c| c == name).ok_or_else(|| {
                    ChurnError::artifact(path, format!("dropped category '{}' is not a category", name))
                })?;
                Some(idx)
            }
        };
        if self.dropped.is_some() && self.categories.len() < 2 {
            return Err(ChurnError::artifact(path, "cannot drop the only category"));
        }
        Ok(self)
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn dropped_category(&self) -> Option<&str> {
        self.dropped.map(|i| self.categories[i].as_str())
    }

    fn kept(&self) -> impl Iterator<Item = (usize, &String)> {
        self.categories
            .iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != self.dropped)
    }
}

impl CategoricalEncoder for OneHotEncoder {
    fn feature(&self) -> &str {
        &self.feature
    }

    fn width(&self) -> usize {
        self.categories.len() - usize::from(self.dropped.is_some())
    }

    fn column_names(&self) -> Vec<String> {
        self.kept()
            .map(|(_, c)| format!("{}_{}", self.feature, c))
            .collect()
    }

    fn encode_into(&self, value: &str, out: &mut Vec<f32>) -> Result<()> {
        let idx = self
            .categories
            .iter()
            .position(|c| c == value)
            .ok_or_else(|| ChurnError::Encoding {
                feature: self.feature.clone(),
                value: value.to_string(),
                known: self.categories.join(", "),
            })?;

        out.extend(self.kept().map(|(i, _)| if i == idx { 1.0 } else { 0.0 }));
        Ok(())
    }
}
