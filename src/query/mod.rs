//! Routing of farmer input to an LLM prompt.
//!
//! A request carries a question, a classified crop photo, or both. Each
//! combination gets its own prompt shape; the language instruction always
//! comes last so the model answers in the farmer's language.

mod language;

pub use language::language_name;

use crate::vision::Predictions;
use crate::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Image,
    Combined,
}

impl InputKind {
    /// Which inputs are present. A blank message counts as absent.
    pub fn detect(message: Option<&str>, has_image: bool) -> Result<Self> {
        let has_message = message.is_some_and(|m| !m.trim().is_empty());
        match (has_message, has_image) {
            (true, false) => Ok(Self::Text),
            (false, true) => Ok(Self::Image),
            (true, true) => Ok(Self::Combined),
            (false, false) => Err(Error::NoInput),
        }
    }

    pub fn needs_image(self) -> bool {
        matches!(self, Self::Image | Self::Combined)
    }
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Combined => "text+image",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Text {
        message: String,
    },
    Image {
        predictions: Predictions,
    },
    Combined {
        message: String,
        predictions: Predictions,
    },
}

impl Query {
    /// A blank message counts as absent; a present one is kept as written.
    pub fn from_parts(message: Option<&str>, predictions: Option<Predictions>) -> Result<Self> {
        let message = message.filter(|m| !m.trim().is_empty());
        match (message, predictions) {
            (Some(message), None) => Ok(Self::Text {
                message: message.to_string(),
            }),
            (None, Some(predictions)) => Ok(Self::Image { predictions }),
            (Some(message), Some(predictions)) => Ok(Self::Combined {
                message: message.to_string(),
                predictions,
            }),
            (None, None) => Err(Error::NoInput),
        }
    }

    pub fn kind(&self) -> InputKind {
        match self {
            Self::Text { .. } => InputKind::Text,
            Self::Image { .. } => InputKind::Image,
            Self::Combined { .. } => InputKind::Combined,
        }
    }

    pub fn predictions(&self) -> Option<&Predictions> {
        match self {
            Self::Text { .. } => None,
            Self::Image { predictions } | Self::Combined { predictions, .. } => Some(predictions),
        }
    }

    /// Build the user prompt, asking for a reply in `language`.
    pub fn prompt(&self, language: &str) -> String {
        match self {
            Self::Text { message } => {
                format!("{message}\nReturn the response in {language} language.")
            }
            Self::Image { predictions } => format!(
                "This is a result of an image after predicting:\n{predictions}\n\
                 Please recommend some suggestions and return the response in {language} language."
            ),
            Self::Combined {
                message,
                predictions,
            } => format!(
                "User message: {message}\n\
                 Image prediction result: {predictions}\n\
                 Return the response in {language} language."
            ),
        }
    }
}
