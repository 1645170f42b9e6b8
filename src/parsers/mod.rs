//! Language front ends
//!
//! A front end turns raw source bytes into a [`StructuralModel`]. The core
//! pipeline only depends on the `ModelBuilder` trait; Java is the shipped
//! implementation.

pub mod java;

pub use java::JavaModelBuilder;

use crate::models::StructuralModel;
use thiserror::Error;

/// A revision that cannot be modeled. Surfaced, never silently degraded.
#[derive(Error, Debug, Clone)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Language-specific extraction of a file's declarations.
pub trait ModelBuilder: Send + Sync {
    fn build_model(&self, source: &[u8], path: &str) -> Result<StructuralModel, ParseError>;
}

/// Pick a front end from a file extension.
pub fn builder_for_path(path: &str) -> Option<Box<dyn ModelBuilder>> {
    let extension = std::path::Path::new(path).extension()?.to_str()?;
    match extension {
        "java" => Some(Box::new(JavaModelBuilder)),
        _ => None,
    }
}
