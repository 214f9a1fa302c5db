// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Load the streaming configuration from TOML.
// Author: Lukas Bower

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sdstream::config::{DEFAULT_EXTENSIONS, DEFAULT_SCAN_DEPTH};
use sdstream::StreamConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    #[serde(default)]
    stream: StreamToml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct StreamToml {
    scan_depth: Option<u8>,
    extensions: Option<Vec<String>>,
}

/// Load the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<StreamConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

/// Parse configuration text; missing keys take the built-in defaults.
pub fn parse_config(contents: &str) -> Result<StreamConfig> {
    let parsed: ConfigToml = toml::from_str(contents).context("malformed TOML")?;
    let depth = parsed.stream.scan_depth.unwrap_or(DEFAULT_SCAN_DEPTH);
    let config = match parsed.stream.extensions {
        Some(list) => StreamConfig::new(depth, list.iter().map(String::as_str))?,
        None => StreamConfig::new(depth, DEFAULT_EXTENSIONS)?,
    };
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = parse_config("").expect("defaults");
        assert_eq!(config, StreamConfig::default());
    }

    #[test]
    fn overrides_depth_and_extensions() {
        let config = parse_config("[stream]\nscan_depth = 3\nextensions = [\".NGC\", \"cnc\"]\n")
            .expect("config");
        assert_eq!(config.scan_depth(), 3);
        assert_eq!(config.extensions().collect::<Vec<_>>(), ["ngc", "cnc"]);
    }

    #[test]
    fn rejects_unknown_keys_and_zero_depth() {
        assert!(parse_config("[stream]\ndepth = 3\n").is_err());
        assert!(parse_config("[stream]\nscan_depth = 0\n").is_err());
    }
}
