// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: Tunables for filename admission and directory scans.
// Author: Lukas Bower

//! Tunables for filename admission and directory scans.

use heapless::{String as HeaplessString, Vec as HeaplessVec};

use crate::error::ConfigError;

/// Longest admitted file extension, in bytes.
pub const MAX_EXTENSION_LEN: usize = 7;
/// Maximum number of admitted program extensions.
pub const MAX_EXTENSIONS: usize = 8;
/// Default recursion depth for directory listings.
pub const DEFAULT_SCAN_DEPTH: u8 = 10;
/// Extensions admitted when no configuration is supplied.
pub const DEFAULT_EXTENSIONS: [&str; 6] = ["nc", "gcode", "txt", "text", "tap", "ngc"];

/// Fixed-capacity, lower-case file extension.
pub type Extension = HeaplessString<MAX_EXTENSION_LEN>;

/// Streaming subsystem configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamConfig {
    scan_depth: u8,
    extensions: HeaplessVec<Extension, MAX_EXTENSIONS>,
}

// Every default must fit the fixed-capacity list.
const _: () = {
    assert!(DEFAULT_EXTENSIONS.len() <= MAX_EXTENSIONS);
    let mut idx = 0;
    while idx < DEFAULT_EXTENSIONS.len() {
        assert!(DEFAULT_EXTENSIONS[idx].len() <= MAX_EXTENSION_LEN);
        idx += 1;
    }
};

impl Default for StreamConfig {
    fn default() -> Self {
        let extensions = DEFAULT_EXTENSIONS
            .into_iter()
            .filter_map(|ext| Extension::try_from(ext).ok())
            .take(MAX_EXTENSIONS)
            .collect();
        Self {
            scan_depth: DEFAULT_SCAN_DEPTH,
            extensions,
        }
    }
}

impl StreamConfig {
    /// Build a configuration from explicit values, validating each one.
    pub fn new<'a, I>(scan_depth: u8, extensions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut list = HeaplessVec::new();
        for ext in extensions {
            let value = parse_extension(ext)?;
            if list.contains(&value) {
                continue;
            }
            list.push(value)
                .map_err(|_| ConfigError::TooManyExtensions(MAX_EXTENSIONS))?;
        }
        let config = Self {
            scan_depth,
            extensions: list,
        };
        config.validate()?;
        Ok(config)
    }

    /// Return a copy with a different scan depth.
    pub fn with_scan_depth(mut self, scan_depth: u8) -> Result<Self, ConfigError> {
        self.scan_depth = scan_depth;
        self.validate()?;
        Ok(self)
    }

    /// Check the invariants every configuration must satisfy.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::NoExtensions);
        }
        Ok(())
    }

    /// Maximum directory recursion depth for listings.
    #[must_use]
    pub fn scan_depth(&self) -> u8 {
        self.scan_depth
    }

    /// Admitted program extensions, lower case, without the leading dot.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(|ext| ext.as_str())
    }

    /// Whether `ext` (any case) is an admitted program extension.
    #[must_use]
    pub fn admits_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }
}

fn parse_extension(raw: &str) -> Result<Extension, ConfigError> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty()
        || trimmed.len() > MAX_EXTENSION_LEN
        || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric())
    {
        return Err(ConfigError::InvalidExtension);
    }
    let mut ext = Extension::new();
    for ch in trimmed.chars() {
        ext.push(ch.to_ascii_lowercase())
            .map_err(|_| ConfigError::InvalidExtension)?;
    }
    Ok(ext)
}
