use std::fmt;

use thiserror::Error;

/// Programmable pipeline stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LumenError {
    #[error("Failed to compile {stage} shader: {log}")]
    ShaderCompile { stage: ShaderStage, log: String },

    #[error("Failed to link program: {log}")]
    Link { log: String },

    #[error("Failed to validate program: {log}")]
    Validation { log: String },

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, LumenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_names_stage() {
        let err = LumenError::ShaderCompile {
            stage: ShaderStage::Fragment,
            log: "ERROR: 0:3: syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to compile fragment shader: ERROR: 0:3: syntax error"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: LumenError = parse.unwrap_err().into();
        assert!(matches!(err, LumenError::Json(_)));
    }
}
