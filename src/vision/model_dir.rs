//! Layout of an exported image-classification model directory.
//!
//! The directory mirrors a Hugging Face checkpoint exported to ONNX:
//! - `model.onnx`: the classifier graph, producing `logits` of shape `[1, num_classes]`
//! - `config.json`: model config, of which only `id2label` is read
//! - `preprocessor_config.json` (optional): resize and normalization settings

use crate::{Error, Result};
use image::imageops::FilterType;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const MODEL_FILE: &str = "model.onnx";
pub const CONFIG_FILE: &str = "config.json";
pub const PREPROCESSOR_FILE: &str = "preprocessor_config.json";

/// Class index to human-readable label.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    by_index: HashMap<usize, String>,
}

impl Labels {
    pub fn new(by_index: HashMap<usize, String>) -> Self {
        Self { by_index }
    }

    /// Parse the `id2label` table of a model `config.json`.
    pub fn from_config_json(json: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct ModelConfig {
            #[serde(default)]
            id2label: HashMap<String, String>,
        }

        let config: ModelConfig = serde_json::from_str(json)?;
        let mut by_index = HashMap::with_capacity(config.id2label.len());
        for (id, label) in config.id2label {
            let index = id
                .parse::<usize>()
                .map_err(|_| Error::vision(format!("id2label key is not an index: {id:?}")))?;
            by_index.insert(index, label);
        }
        Ok(Self { by_index })
    }

    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    /// Label for `index`, or `LABEL_{index}` when the table has no entry.
    pub fn name(&self, index: usize) -> String {
        self.by_index
            .get(&index)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{index}"))
    }
}

/// `size` / `crop_size` as written by Hugging Face image processors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SizeSpec {
    Square(u32),
    HeightWidth { height: u32, width: u32 },
    ShortestEdge { shortest_edge: u32 },
}

/// PIL resampling codes as stored in `preprocessor_config.json`.
fn filter_from_pil(code: u32) -> FilterType {
    match code {
        0 => FilterType::Nearest,
        1 => FilterType::Lanczos3,
        3 => FilterType::CatmullRom,
        _ => FilterType::Triangle,
    }
}

#[derive(Debug, Deserialize)]
struct PreprocessorConfig {
    #[serde(default)]
    size: Option<SizeSpec>,
    #[serde(default)]
    crop_size: Option<SizeSpec>,
    #[serde(default)]
    do_center_crop: Option<bool>,
    #[serde(default)]
    image_mean: Option<[f32; 3]>,
    #[serde(default)]
    image_std: Option<[f32; 3]>,
    #[serde(default)]
    rescale_factor: Option<f32>,
    #[serde(default)]
    do_resize: Option<bool>,
    #[serde(default)]
    do_rescale: Option<bool>,
    #[serde(default)]
    do_normalize: Option<bool>,
    #[serde(default)]
    resample: Option<u32>,
}

/// How an image is turned into the model's input tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessSettings {
    /// Output tensor height.
    pub height: u32,
    /// Output tensor width.
    pub width: u32,
    /// Resize so the shorter side has this length, keeping the aspect ratio,
    /// then center-crop to `width` x `height`. `None` resizes straight to the output size.
    pub shortest_edge: Option<u32>,
    pub filter: FilterType,
    pub do_resize: bool,
    pub rescale_factor: Option<f32>,
    /// Per-channel `(mean, std)`; `None` disables normalization.
    pub normalize: Option<([f32; 3], [f32; 3])>,
}

impl Default for PreprocessSettings {
    /// ViT image processor defaults.
    fn default() -> Self {
        Self {
            height: 224,
            width: 224,
            shortest_edge: None,
            filter: FilterType::Triangle,
            do_resize: true,
            rescale_factor: Some(1.0 / 255.0),
            normalize: Some(([0.5; 3], [0.5; 3])),
        }
    }
}

impl PreprocessSettings {
    pub fn from_preprocessor_json(json: &str) -> Result<Self> {
        let raw: PreprocessorConfig = serde_json::from_str(json)?;
        let defaults = Self::default();

        let (height, width, shortest_edge) = match raw.size {
            Some(SizeSpec::Square(side)) => (side, side, None),
            Some(SizeSpec::HeightWidth { height, width }) => (height, width, None),
            Some(SizeSpec::ShortestEdge { shortest_edge }) => {
                let crop = raw
                    .crop_size
                    .filter(|_| raw.do_center_crop.unwrap_or(true));
                let (height, width) = match crop {
                    Some(SizeSpec::Square(side)) => (side, side),
                    Some(SizeSpec::HeightWidth { height, width }) => (height, width),
                    Some(SizeSpec::ShortestEdge { .. }) => {
                        return Err(Error::vision("crop_size must be a fixed size"));
                    }
                    None => (shortest_edge, shortest_edge),
                };
                (height, width, Some(shortest_edge))
            }
            None => (defaults.height, defaults.width, None),
        };
        if height == 0 || width == 0 || shortest_edge == Some(0) {
            return Err(Error::vision("preprocessor size must be positive"));
        }

        let rescale_factor = if raw.do_rescale.unwrap_or(true) {
            Some(raw.rescale_factor.unwrap_or(1.0 / 255.0))
        } else {
            None
        };

        let normalize = if raw.do_normalize.unwrap_or(true) {
            let (default_mean, default_std) = defaults.normalize.unwrap_or(([0.5; 3], [0.5; 3]));
            let std = raw.image_std.unwrap_or(default_std);
            if std.iter().any(|s| *s == 0.0) {
                return Err(Error::vision("image_std must not contain zero"));
            }
            Some((raw.image_mean.unwrap_or(default_mean), std))
        } else {
            None
        };

        Ok(Self {
            height,
            width,
            shortest_edge,
            filter: raw.resample.map(filter_from_pil).unwrap_or(defaults.filter),
            do_resize: raw.do_resize.unwrap_or(true),
            rescale_factor,
            normalize,
        })
    }
}

/// Everything read from a model directory except the ONNX session itself.
#[derive(Debug, Clone)]
pub struct ModelDir {
    pub model_path: PathBuf,
    pub labels: Labels,
    pub preprocess: PreprocessSettings,
}

impl ModelDir {
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        debug!("Reading model directory {:?}", dir);

        let model_path = dir.join(MODEL_FILE);
        if !model_path.is_file() {
            return Err(Error::vision(format!(
                "{} not found in {}",
                MODEL_FILE,
                dir.display()
            )));
        }

        let config_json = std::fs::read_to_string(dir.join(CONFIG_FILE))?;
        let labels = Labels::from_config_json(&config_json)?;
        if labels.is_empty() {
            warn!("{} has no id2label table; labels will be LABEL_<n>", CONFIG_FILE);
        }

        let preprocessor_path = dir.join(PREPROCESSOR_FILE);
        let preprocess = if preprocessor_path.is_file() {
            PreprocessSettings::from_preprocessor_json(&std::fs::read_to_string(
                preprocessor_path,
            )?)?
        } else {
            debug!("No {}, using ViT defaults", PREPROCESSOR_FILE);
            PreprocessSettings::default()
        };

        Ok(Self {
            model_path,
            labels,
            preprocess,
        })
    }
}
