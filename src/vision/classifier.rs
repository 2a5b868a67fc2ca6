//! ONNX Runtime session management and classifier inference.

use std::path::Path;
use std::sync::Mutex;

use image::DynamicImage;
use ort::session::Session;
use ort::value::Value;
use tracing::debug;

use super::model_dir::{Labels, ModelDir, PreprocessSettings};
use super::preprocess::preprocess;
use super::ranking::{Predictions, rank};
use crate::{Error, Result};

/// Name of the logits output in Hugging Face image-classification exports.
const LOGITS_OUTPUT: &str = "logits";

pub trait ImageClassifier: Send + Sync {
    /// One forward pass, returning at most `top_k` ranked predictions.
    fn classify(&self, image: &DynamicImage, top_k: usize) -> Result<Predictions>;
}

/// Wraps an ONNX Runtime session for a single-image classifier.
///
/// Uses a `Mutex` because `Session::run` requires `&mut self`.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    /// Name of the input tensor (detected from model metadata).
    input_name: String,
    labels: Labels,
    settings: PreprocessSettings,
}

impl OnnxClassifier {
    /// Load `model.onnx`, labels and preprocessing settings from a model directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let model_dir = ModelDir::load(dir)?;
        Self::from_model_dir(model_dir)
    }

    pub fn from_model_dir(model_dir: ModelDir) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| Error::vision(format!("Failed to create ONNX session builder: {e}")))?
            .commit_from_file(&model_dir.model_path)
            .map_err(|e| {
                Error::vision(format!(
                    "Failed to load ONNX model {}: {e}",
                    model_dir.model_path.display()
                ))
            })?;

        let input_name = session
            .inputs()
            .first()
            .map(|i| i.name().to_string())
            .unwrap_or_else(|| "pixel_values".to_string());

        debug!(
            "Loaded classifier from {:?} (input: {:?}, outputs: {:?}, {} labels)",
            model_dir.model_path,
            input_name,
            session
                .outputs()
                .iter()
                .map(|o| o.name())
                .collect::<Vec<_>>(),
            model_dir.labels.len()
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            labels: model_dir.labels,
            settings: model_dir.preprocess,
        })
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    fn logits(&self, image: &DynamicImage) -> Result<Vec<f32>> {
        let tensor = preprocess(image, &self.settings);
        let shape: Vec<i64> = tensor.shape().iter().map(|&d| d as i64).collect();
        let flat_data: Vec<f32> = tensor.iter().copied().collect();

        let input_value = Value::from_array((shape, flat_data))
            .map_err(|e| Error::vision(format!("Failed to create input tensor: {e}")))?;

        let inputs = ort::inputs![self.input_name.as_str() => input_value];

        let mut session = self
            .session
            .lock()
            .map_err(|e| Error::vision(format!("Session lock poisoned: {e}")))?;

        let outputs = session
            .run(inputs)
            .map_err(|e| Error::vision(format!("ONNX inference failed: {e}")))?;

        // Prefer the named logits output; single-output exports may name it differently.
        let logits = outputs
            .iter()
            .find(|(name, _)| *name == LOGITS_OUTPUT)
            .or_else(|| outputs.iter().next())
            .ok_or_else(|| Error::vision("Model produced no outputs"))?;

        let (shape, data) = logits
            .1
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::vision(format!("Failed to extract logits tensor: {e}")))?;

        logits_row(shape, data)
    }
}

/// First row of a `[num_classes]` or `[batch, num_classes]` logits tensor.
fn logits_row(shape: &[i64], data: &[f32]) -> Result<Vec<f32>> {
    let classes = match shape {
        [classes] => *classes,
        [batch, classes] if *batch >= 1 => *classes,
        _ => return Err(Error::vision(format!("Unexpected logits shape: {shape:?}"))),
    };

    let classes = usize::try_from(classes)
        .map_err(|_| Error::vision(format!("Unexpected logits shape: {shape:?}")))?;
    if classes == 0 {
        return Err(Error::vision("Model produced empty logits"));
    }

    data.get(..classes).map(<[f32]>::to_vec).ok_or_else(|| {
        Error::vision(format!(
            "Logits tensor holds {} values, shape {shape:?} needs {classes}",
            data.len()
        ))
    })
}

impl ImageClassifier for OnnxClassifier {
    fn classify(&self, image: &DynamicImage, top_k: usize) -> Result<Predictions> {
        let logits = self.logits(image)?;
        rank(&logits, &self.labels, top_k)
    }
}
