// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Tagged encoding.
//!
//! Encoding a dynamically-kinded value injects the discriminator as the
//! first key of the resulting object, so the output decodes back through the
//! same constructor.
//!
//! ```
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Config {
//!     name: String,
//! }
//!
//! let json = kindcodec::encode::to_string_tagged("hello", &Config { name: "a".into() }).unwrap();
//! assert_eq!(json, r#"{"@kind":"hello","name":"a"}"#);
//! ```

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::core::{fold_eq, CodecError, Result, DEFAULT_TAG};

/// A value paired with its kind, serialized with the discriminator first.
#[derive(Debug)]
pub struct Tagged<'a, T: ?Sized> {
    tag: &'a str,
    kind: &'a str,
    value: &'a T,
}

impl<'a, T: ?Sized> Tagged<'a, T> {
    /// Tag `value` as `kind` under the default key.
    pub fn new(kind: &'a str, value: &'a T) -> Self {
        Self {
            tag: DEFAULT_TAG,
            kind,
            value,
        }
    }

    /// Use a different discriminator key.
    pub fn with_tag(mut self, tag: &'a str) -> Self {
        self.tag = tag;
        self
    }
}

impl<T: Serialize + ?Sized> Serialize for Tagged<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let value = serde_json::to_value(self.value).map_err(S::Error::custom)?;
        let Value::Object(fields) = value else {
            return Err(S::Error::custom(format!(
                "kind '{}' must encode as an object",
                self.kind
            )));
        };

        // Existing discriminator keys are dropped so the output has exactly one.
        let fields: Vec<_> = fields
            .iter()
            .filter(|(key, _)| !fold_eq(key, self.tag))
            .collect();

        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        map.serialize_entry(self.tag, self.kind)?;
        for (key, field) in fields {
            map.serialize_entry(key, field)?;
        }
        map.end()
    }
}

/// Encode `value` as JSON bytes with the default discriminator first.
pub fn to_vec_tagged<T: Serialize + ?Sized>(kind: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(&Tagged::new(kind, value)).map_err(|e| CodecError::encode(e.to_string()))
}

/// Encode `value` as a JSON string with the default discriminator first.
pub fn to_string_tagged<T: Serialize + ?Sized>(kind: &str, value: &T) -> Result<String> {
    serde_json::to_string(&Tagged::new(kind, value)).map_err(|e| CodecError::encode(e.to_string()))
}
