use serde::{Deserialize, Serialize};

/// Offload scheduler configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OffloadConfig {
    /// Upper bound on blocking jobs running at once. Zero is treated as one.
    pub max_workers: usize,
}

impl OffloadConfig {
    pub fn with_max_workers(max_workers: usize) -> Self {
        Self { max_workers }
    }
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
        }
    }
}

/// `min(32, cpus + 4)`.
pub fn default_max_workers() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 4).min(32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_bounded() {
        let workers = OffloadConfig::default().max_workers;
        assert!((5..=32).contains(&workers), "{workers}");
    }
}
