use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// On-disk text formats understood by the codec.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Infer a format from a file extension (`json`, `yaml`, `yml`),
    /// ignoring case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    /// Infer a format from the extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        })
    }
}

impl FromStr for Format {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or_else(|| CodecError::UnknownFormat(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_from_path() {
        assert_eq!(Format::from_path(Path::new("config.json")), Some(Format::Json));
        assert_eq!(Format::from_path(Path::new("a/b/settings.YML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("settings.yaml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("notes.txt")), None);
        assert_eq!(Format::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("yml".parse::<Format>().unwrap(), Format::Yaml);
        assert_eq!(Format::Json.to_string(), "JSON");
        assert!(matches!(
            "toml".parse::<Format>(),
            Err(CodecError::UnknownFormat(name)) if name == "toml"
        ));
    }
}
