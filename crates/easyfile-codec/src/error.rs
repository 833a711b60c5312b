use std::fmt::Display;

use crate::format::Format;

/// Errors produced while encoding or decoding structured data.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Malformed JSON, or JSON that does not fit the requested shape.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML, or YAML that does not fit the requested shape.
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The value contains something the target format cannot express.
    #[error("cannot represent {path} as {format}: {reason}")]
    Unrepresentable {
        format: Format,
        path: String,
        reason: String,
    },

    /// A `Serialize` implementation rejected the value, or it used a
    /// construct with no structured-value equivalent.
    #[error("serialization error: {0}")]
    Serialize(String),

    /// A format name that is neither JSON nor YAML.
    #[error("unknown format: {0}")]
    UnknownFormat(String),
}

impl CodecError {
    /// Format the error relates to, when known.
    pub fn format(&self) -> Option<Format> {
        match self {
            Self::Json(_) => Some(Format::Json),
            Self::Yaml(_) => Some(Format::Yaml),
            Self::Unrepresentable { format, .. } => Some(*format),
            Self::Serialize(_) | Self::UnknownFormat(_) => None,
        }
    }
}

impl serde::ser::Error for CodecError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Serialize(msg.to_string())
    }
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
