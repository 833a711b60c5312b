use std::path::Path;

use easyfile_atomic::WriteOptions;
use easyfile_codec::Format;
use easyfile_offload::{default_max_workers, OffloadConfig};
use serde::{Deserialize, Serialize};

use crate::error::FileResult;
use crate::file::File;

/// Library-wide defaults, loadable from a YAML or JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EasyFileConfig {
    /// `fsync` staging files before renaming them into place.
    pub durable: bool,
    /// Spaces per level for pretty JSON; `0` writes compact JSON.
    pub json_indent: usize,
    /// Concurrent blocking jobs for async operations.
    pub max_workers: usize,
}

impl Default for EasyFileConfig {
    fn default() -> Self {
        Self {
            durable: true,
            json_indent: 2,
            max_workers: default_max_workers(),
        }
    }
}

impl EasyFileConfig {
    /// Load from `path`. The format follows the extension; anything that is
    /// not `.json` is read as YAML. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> FileResult<Self> {
        let file = File::new(path.as_ref());
        let format = Format::from_path(file.path()).unwrap_or(Format::Yaml);
        file.load_as(format)
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            durable: self.durable,
        }
    }

    pub fn offload_config(&self) -> OffloadConfig {
        OffloadConfig::with_max_workers(self.max_workers)
    }
}
