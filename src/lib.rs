pub mod config;
pub mod error;
pub mod llm;
pub mod query;
pub mod server;
pub mod vision;

pub use error::{Error, Result};
