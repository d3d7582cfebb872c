// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::{fmt, path::PathBuf, str::FromStr};

use anyhow::Context as _;
use cid::Cid;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};
use smart_default::SmartDefault;
use tracing::level_filters::LevelFilter;

static LOG_LEVEL_NAMES: [&str; 6] = ["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"];

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct LogLevelFilter(pub LevelFilter);

impl fmt::Display for LogLevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            LevelFilter::OFF => "OFF",
            LevelFilter::ERROR => "ERROR",
            LevelFilter::WARN => "WARN",
            LevelFilter::INFO => "INFO",
            LevelFilter::DEBUG => "DEBUG",
            _ => "TRACE",
        };
        f.write_str(name)
    }
}

impl Serialize for LogLevelFilter {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LogLevelFilter {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        // Case insensitive.
        LevelFilter::from_str(&s)
            .map(Self)
            .map_err(|_| Error::unknown_variant(&s, &LOG_LEVEL_NAMES))
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone)]
pub struct LogValue {
    pub module: String,
    pub level: LogLevelFilter,
}

impl LogValue {
    pub fn new(module: &str, level: LevelFilter) -> Self {
        Self {
            module: module.to_string(),
            level: LogLevelFilter(level),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, SmartDefault)]
#[serde(default)]
pub struct LogConfig {
    /// Per-module directives added to the default `info` level
    #[default(vec![
        LogValue::new("forest_ec::interpreter", LevelFilter::WARN),
        LogValue::new("tokio_util", LevelFilter::WARN),
    ])]
    pub filters: Vec<LogValue>,
    /// Directory of the hourly rolling log file, if any
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    pub(in crate::cli_shared) fn to_filter_string(&self) -> String {
        self.filters
            .iter()
            .map(|f| format!("{}={}", f.module, f.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Debug, Clone, Default)]
#[serde(default)]
pub struct ConsensusConfig {
    /// CID of the genesis block. Tipsets made of this single block weigh
    /// zero.
    pub genesis_cid: Option<String>,
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Default, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub log: LogConfig,
    pub consensus: ConsensusConfig,
}

impl Config {
    pub fn genesis_cid(&self) -> anyhow::Result<Option<Cid>> {
        self.consensus
            .genesis_cid
            .as_deref()
            .map(|s| Cid::try_from(s).with_context(|| format!("invalid genesis CID {s}")))
            .transpose()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::{encoding::CidCborExt as _, io::read_toml};
    use tracing_subscriber::EnvFilter;

    #[test]
    fn test_default_log_filters() {
        let config = LogConfig::default();
        EnvFilter::builder()
            .parse(config.to_filter_string())
            .unwrap();
    }

    #[test]
    fn test_config_all_params_under_section() {
        let config = Config {
            consensus: ConsensusConfig {
                genesis_cid: Some(Cid::default().to_string()),
            },
            ..Default::default()
        };
        let serialized_config =
            toml::to_string(&config).expect("could not serialize the configuration");
        assert_eq!(
            serialized_config
                .trim_start()
                .chars()
                .next()
                .expect("configuration empty"),
            '['
        );
        assert_eq!(read_toml::<Config>(&serialized_config).unwrap(), config);
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: Config = read_toml(
            r#"
            [log]
            filters = [{ module = "forest_ec::fil_cns", level = "debug" }]
            "#,
        )
        .unwrap();
        assert_eq!(
            config.log.filters,
            vec![LogValue::new("forest_ec::fil_cns", LevelFilter::DEBUG)]
        );
        assert_eq!(config.log.log_dir, None);
        assert_eq!(config.consensus, ConsensusConfig::default());
        assert_eq!(config.genesis_cid().unwrap(), None);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let res = read_toml::<Config>(
            r#"
            [log]
            filters = [{ module = "forest_ec", level = "loud" }]
            "#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn genesis_cid_is_parsed() {
        let cid = Cid::from_cbor_blake2b256(&"genesis").unwrap();
        let config = Config {
            consensus: ConsensusConfig {
                genesis_cid: Some(cid.to_string()),
            },
            ..Default::default()
        };
        assert_eq!(config.genesis_cid().unwrap(), Some(cid));

        let bad = Config {
            consensus: ConsensusConfig {
                genesis_cid: Some("not a cid".into()),
            },
            ..Default::default()
        };
        assert!(bad.genesis_cid().is_err());
    }
}
