use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime configuration for a lattice peer.
///
/// Only deployment knobs live here. The participant count is compile-time
/// state of the mailbox crate: it shapes the shared region layout, so it can
/// never disagree between peers built from the same source.
#[derive(Deserialize, Debug)]
pub struct PeerConfig {
    /// Directory the region files live in.
    #[serde(default = "defaults::region_dir")]
    pub region_dir: String,
    /// Well-known prefix; a peer's region is `<prefix><index>`.
    #[serde(default = "defaults::region_prefix")]
    pub region_prefix: String,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    /// Bounds of the random pause between driver iterations, microseconds.
    #[serde(default = "defaults::min_publish_delay_us")]
    pub min_publish_delay_us: u64,
    #[serde(default = "defaults::max_publish_delay_us")]
    pub max_publish_delay_us: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn region_dir() -> String {
        "/tmp".into()
    }

    pub fn region_prefix() -> String {
        "lattice_peer_".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn min_publish_delay_us() -> u64 {
        1
    }

    pub fn max_publish_delay_us() -> u64 {
        1_000_000
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        // An absent config file means all-defaults; serde applies the same
        // functions to an empty document.
        toml::from_str("").expect("defaults always deserialize")
    }
}

impl PeerConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: PeerConfig = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Region file path of the peer with the given index.
    pub fn region_path(&self, index: usize) -> PathBuf {
        Path::new(&self.region_dir).join(format!("{}{}", self.region_prefix, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = PeerConfig::default();
        assert_eq!(config.region_dir, "/tmp");
        assert_eq!(config.region_prefix, "lattice_peer_");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.min_publish_delay_us, 1);
        assert_eq!(config.max_publish_delay_us, 1_000_000);
    }

    #[test]
    fn partial_document_keeps_remaining_defaults() {
        let config: PeerConfig = toml::from_str(
            r#"
            region_dir = "/dev/shm"
            max_publish_delay_us = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.region_dir, "/dev/shm");
        assert_eq!(config.max_publish_delay_us, 500);
        assert_eq!(config.region_prefix, "lattice_peer_");
    }

    #[test]
    fn region_path_concatenates_prefix_and_index() {
        let config = PeerConfig::default();
        assert_eq!(
            config.region_path(3),
            PathBuf::from("/tmp/lattice_peer_3")
        );
    }
}
