//! Error handling for VisionForge-RS
//!
//! This module defines the top-level error type and a Result alias for use
//! throughout the application. Code-generation errors keep their own typed
//! enum (`GenError`) so callers can surface the offending node/attribute;
//! everything else funnels through `ForgeError`.

use crate::codegen::error::GenError;
use thiserror::Error;

/// Main error type for VisionForge-RS operations
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Errors raised during a code-generation pass
    #[error("Code generation error: {0}")]
    Gen(#[from] GenError),

    /// Errors related to project files
    #[error("Project error: {0}")]
    Project(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for VisionForge-RS operations
pub type Result<T> = std::result::Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::id::NodeId;

    #[test]
    fn test_error_display() {
        let err = ForgeError::Project("missing nodes array".to_string());
        assert_eq!(err.to_string(), "Project error: missing nodes array");
    }

    #[test]
    fn test_gen_error_conversion() {
        let gen = GenError::node(NodeId(2), "boom");
        let err: ForgeError = gen.into();
        assert!(err.to_string().contains("Code generation error"));
    }
}
