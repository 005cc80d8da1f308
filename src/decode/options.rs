// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoder configuration.

use serde::Deserialize;

use crate::core::{CodecError, Result, DEFAULT_TAG};

/// Options for decode operations.
///
/// Can be loaded from TOML; missing keys take their defaults.
///
/// ```
/// use kindcodec::DecoderOptions;
///
/// let options = DecoderOptions::from_toml_str("tag = \"type\"\nmax_depth = 32").unwrap();
/// assert_eq!(options.tag, "type");
/// assert_eq!(options.excerpt_len, 64);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecoderOptions {
    /// Discriminator key, matched case-insensitively
    pub tag: String,

    /// Maximum nesting depth of the document
    pub max_depth: usize,

    /// Bytes of input quoted in error messages
    pub excerpt_len: usize,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG.to_string(),
            max_depth: 128,
            excerpt_len: 64,
        }
    }
}

impl DecoderOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let options: Self = toml::from_str(source).map_err(|e| CodecError::config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Set the discriminator key.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the maximum nesting depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the excerpt length used in error messages.
    pub fn with_excerpt_len(mut self, excerpt_len: usize) -> Self {
        self.excerpt_len = excerpt_len;
        self
    }

    /// Check the options for consistency.
    pub fn validate(&self) -> Result<()> {
        if self.tag.is_empty() {
            return Err(CodecError::config("tag must not be empty"));
        }
        if self.max_depth == 0 {
            return Err(CodecError::config("max_depth must be at least 1"));
        }
        Ok(())
    }
}
