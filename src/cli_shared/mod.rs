// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

pub mod cli;
pub mod logger;

use crate::cli_shared::cli::Config;
use crate::utils::io::read_toml_file;
use std::path::Path;

/// Reads the configuration at `path`, or returns the default configuration
/// if none is given.
pub fn read_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => read_toml_file(path),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli_shared::cli::ConsensusConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn read_config_default() {
        let config = read_config(None).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn read_config_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = Config {
            consensus: ConsensusConfig {
                genesis_cid: Some(cid::Cid::default().to_string()),
            },
            ..Default::default()
        };
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        assert_eq!(read_config(Some(&path)).unwrap(), config);
    }

    #[test]
    fn read_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_config(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
