// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Raw JSON fragments.
//!
//! A [`Fragment`] borrows exactly one JSON value from the input document.
//! Objects and arrays are split into child fragments without copying, using
//! `serde_json`'s borrowed [`RawValue`].

use std::collections::HashMap;
use std::fmt;

use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::value::RawValue;

/// Default discriminator key.
pub const DEFAULT_TAG: &str = "@kind";

/// Top-level shape of a fragment, decided by its first byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
    /// `null`
    Null,
    /// Strings, numbers, booleans (and anything unparseable)
    Scalar,
}

/// A borrowed, whitespace-trimmed slice holding one JSON value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Fragment<'a> {
    bytes: &'a [u8],
}

impl<'a> Fragment<'a> {
    /// Wrap raw bytes, trimming leading and trailing JSON whitespace.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes: trim(bytes),
        }
    }

    /// The trimmed bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Check whether nothing but whitespace was supplied.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Shape of the value, from its first byte.
    pub fn shape(&self) -> Shape {
        match self.bytes.first() {
            Some(b'{') => Shape::Object,
            Some(b'[') => Shape::Array,
            Some(b'n') if self.bytes == b"null" => Shape::Null,
            _ => Shape::Scalar,
        }
    }

    /// Check whether the fragment is the literal `null`.
    pub fn is_null(&self) -> bool {
        self.shape() == Shape::Null
    }

    /// Parse a scalar using standard JSON semantics.
    pub fn parse_scalar<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(self.bytes)
    }

    /// Quoted excerpt of at most `max` bytes, for error messages.
    pub fn excerpt(&self, max: usize) -> String {
        if self.bytes.len() <= max {
            format!("{:?}", String::from_utf8_lossy(self.bytes))
        } else {
            format!("{:?}...", String::from_utf8_lossy(&self.bytes[..max]))
        }
    }
}

impl fmt::Debug for Fragment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fragment({:?})", String::from_utf8_lossy(self.bytes))
    }
}

fn trim(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}

/// Case-insensitive key comparison (Unicode lowercase folding).
pub fn fold_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// An object fragment split into its entries, in input order.
///
/// Duplicate keys collapse to one entry: the value of the last occurrence
/// wins, the position of the first is kept.
#[derive(Debug, Clone)]
pub struct Object<'a> {
    raw: Fragment<'a>,
    entries: Vec<(String, Fragment<'a>)>,
}

impl<'a> Object<'a> {
    /// Parse an object fragment.
    pub fn parse(raw: Fragment<'a>) -> serde_json::Result<Self> {
        let Entries(entries) = serde_json::from_slice(raw.as_bytes())?;
        Ok(Self { raw, entries })
    }

    /// The whole object as it appeared in the input.
    pub fn raw(&self) -> Fragment<'a> {
        self.raw
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the object has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in input order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Fragment<'a>)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Exact-key lookup.
    pub fn get(&self, key: &str) -> Option<Fragment<'a>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| *v)
    }

    /// Case-insensitive lookup; the last matching key wins.
    pub fn find_folded(&self, name: &str) -> Option<Fragment<'a>> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| fold_eq(k, name))
            .map(|(_, v)| *v)
    }

    /// Read the discriminator.
    ///
    /// Returns `None` when the tag is absent, is not a string, or is empty.
    pub fn discriminator(&self, tag: &str) -> Option<String> {
        self.find_folded(tag)
            .and_then(|raw| raw.parse_scalar::<String>().ok())
            .filter(|kind| !kind.is_empty())
    }

    /// Consume the object, yielding owned keys and their fragments.
    pub fn into_entries(self) -> Vec<(String, Fragment<'a>)> {
        self.entries
    }
}

/// An array fragment split into its elements.
#[derive(Debug, Clone)]
pub struct Array<'a> {
    raw: Fragment<'a>,
    elements: Vec<Fragment<'a>>,
}

impl<'a> Array<'a> {
    /// Parse an array fragment.
    pub fn parse(raw: Fragment<'a>) -> serde_json::Result<Self> {
        let values: Vec<&'a RawValue> = serde_json::from_slice(raw.as_bytes())?;
        let elements = values
            .into_iter()
            .map(|v| Fragment::new(v.get().as_bytes()))
            .collect();
        Ok(Self { raw, elements })
    }

    /// The whole array as it appeared in the input.
    pub fn raw(&self) -> Fragment<'a> {
        self.raw
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Check if the array is empty.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Consume the array, yielding its elements in order.
    pub fn into_elements(self) -> Vec<Fragment<'a>> {
        self.elements
    }
}

struct Entries<'a>(Vec<(String, Fragment<'a>)>);

impl<'de> Deserialize<'de> for Entries<'de> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries<'de>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<M>(self, mut map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let mut entries: Vec<(String, Fragment<'de>)> =
                    Vec::with_capacity(map.size_hint().unwrap_or(0));
                let mut index: HashMap<String, usize> = HashMap::new();

                while let Some(key) = map.next_key::<String>()? {
                    let value: &'de RawValue = map.next_value()?;
                    let fragment = Fragment::new(value.get().as_bytes());
                    match index.get(&key) {
                        Some(&at) => entries[at].1 = fragment,
                        None => {
                            index.insert(key.clone(), entries.len());
                            entries.push((key, fragment));
                        }
                    }
                }

                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Extract the discriminator from a raw document, if it is an object.
///
/// Malformed objects yield `Ok(None)` only when they are not objects at all;
/// syntax errors inside an object are reported.
pub fn kind_of(raw: &[u8], tag: &str) -> serde_json::Result<Option<String>> {
    let fragment = Fragment::new(raw);
    if fragment.shape() != Shape::Object {
        return Ok(None);
    }
    Ok(Object::parse(fragment)?.discriminator(tag))
}
