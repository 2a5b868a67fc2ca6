//! Plant-disease image classification.

pub mod classifier;
pub mod decode;
pub mod model_dir;
pub mod preprocess;
pub mod ranking;

pub use classifier::{ImageClassifier, OnnxClassifier};
pub use decode::decode_base64_image;
pub use model_dir::{Labels, ModelDir, PreprocessSettings};
pub use ranking::{Prediction, Predictions, rank, softmax};
