//! Softmax top-k ranking of classifier logits.

use super::model_dir::Labels;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Softmax probability in `[0, 1]`.
    pub confidence: f32,
}

/// Predictions ordered by descending confidence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Predictions(Vec<Prediction>);

impl Predictions {
    /// Sorts `predictions` by descending confidence.
    pub fn new(mut predictions: Vec<Prediction>) -> Self {
        predictions.sort_by(|a, b| descending(a.confidence, b.confidence));
        Self(predictions)
    }

    pub fn top(&self) -> Option<&Prediction> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Prediction> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Prediction> {
        self.0
    }
}

/// Rendered into the LLM prompt as-is.
impl fmt::Display for Predictions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "🎯 Prediction Results:")?;
        for (i, p) in self.0.iter().enumerate() {
            writeln!(f, "{}. {} ({:.2}%)", i + 1, p.label, p.confidence * 100.0)?;
        }
        if let Some(top) = self.top() {
            writeln!(f)?;
            writeln!(
                f,
                "🏆 Top Prediction: {} ({:.1}%)",
                top.label,
                top.confidence * 100.0
            )?;
        }
        Ok(())
    }
}

fn descending(a: f32, b: f32) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Numerically stable softmax (shifted by the max logit). Expects finite logits.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    if logits.is_empty() {
        return Vec::new();
    }
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Softmax the logits and keep the `top_k` most probable classes.
///
/// Returns `min(top_k, logits.len())` entries; ties keep class-index order.
/// Empty logits or any NaN or infinite value is a vision error.
pub fn rank(logits: &[f32], labels: &Labels, top_k: usize) -> Result<Predictions> {
    if logits.is_empty() {
        return Err(Error::vision("Model produced empty logits"));
    }
    if let Some(index) = logits.iter().position(|x| !x.is_finite()) {
        return Err(Error::vision(format!(
            "Model produced a non-finite logit at class {index}: {}",
            logits[index]
        )));
    }

    let probabilities = softmax(logits);

    let mut indexed: Vec<(usize, f32)> = probabilities.into_iter().enumerate().collect();
    indexed.sort_by(|a, b| descending(a.1, b.1));
    indexed.truncate(top_k);

    Ok(Predictions(
        indexed
            .into_iter()
            .map(|(index, confidence)| Prediction {
                label: labels.name(index),
                confidence,
            })
            .collect(),
    ))
}
