// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! The decode engine.
//!
//! [`DecodeState`] walks a document one fragment at a time. Every
//! destination is reset to its zero value before it is populated, so decoding
//! never merges with earlier contents. Objects carrying the discriminator are
//! handed to dispatch; everything else is decoded structurally.

use std::fmt;

use tracing::trace;

use super::adapter;
use super::dispatch;
use super::structural::Decode;
use super::Decoder;
use crate::core::{Array, CodecError, Fragment, Object, Result, Shape};

/// One step of the location path reported in errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A record field
    Field(String),
    /// A sequence element
    Index(usize),
    /// A map entry
    Key(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, ".{name}"),
            Segment::Index(index) => write!(f, "[{index}]"),
            Segment::Key(key) => write!(f, "[{key:?}]"),
        }
    }
}

/// Per-call decoding state: the decoder in use and the current location.
pub struct DecodeState<'d> {
    decoder: &'d Decoder<'d>,
    path: Vec<Segment>,
}

impl<'d> DecodeState<'d> {
    pub(crate) fn new(decoder: &'d Decoder<'d>) -> Self {
        Self {
            decoder,
            path: Vec::new(),
        }
    }

    /// The decoder driving this call.
    pub fn decoder(&self) -> &'d Decoder<'d> {
        self.decoder
    }

    /// Current location, e.g. `$.items[2]["key"]`.
    pub fn path(&self) -> String {
        let mut rendered = String::from("$");
        for segment in &self.path {
            rendered.push_str(&segment.to_string());
        }
        rendered
    }

    /// Nesting depth of the current location.
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Decode `raw` into `slot`, dispatching on the discriminator.
    pub fn decode<T: Decode>(&mut self, raw: Fragment<'_>, slot: &mut T) -> Result<()> {
        self.decode_inner(raw, slot, true)
    }

    /// Decode `raw` into `slot` by structure only, ignoring a top-level
    /// discriminator. Nested values still dispatch.
    pub fn decode_structural<T: Decode>(&mut self, raw: Fragment<'_>, slot: &mut T) -> Result<()> {
        self.decode_inner(raw, slot, false)
    }

    /// Decode a record field.
    pub fn decode_field<T: Decode>(
        &mut self,
        name: &str,
        raw: Fragment<'_>,
        slot: &mut T,
    ) -> Result<()> {
        self.nested(Segment::Field(name.to_string()), raw, slot)
    }

    /// Decode a sequence element.
    pub fn decode_index<T: Decode>(
        &mut self,
        index: usize,
        raw: Fragment<'_>,
        slot: &mut T,
    ) -> Result<()> {
        self.nested(Segment::Index(index), raw, slot)
    }

    /// Decode a map value.
    pub fn decode_key<T: Decode>(&mut self, key: &str, raw: Fragment<'_>, slot: &mut T) -> Result<()> {
        self.nested(Segment::Key(key.to_string()), raw, slot)
    }

    /// Build a [`CodecError::MalformedInput`] at the current location.
    pub fn malformed(&self, raw: Fragment<'_>, message: impl Into<String>) -> CodecError {
        CodecError::malformed(
            self.path(),
            message,
            raw.excerpt(self.decoder.options().excerpt_len),
        )
    }

    /// Report a JSON syntax or value error.
    pub fn syntax(&self, raw: Fragment<'_>, err: serde_json::Error) -> CodecError {
        self.malformed(raw, err.to_string())
    }

    /// Report a shape the destination cannot hold.
    pub fn mismatch(&self, raw: Fragment<'_>, found: &str, expected: &str) -> CodecError {
        self.malformed(raw, format!("cannot decode {found} into {expected}"))
    }

    fn nested<T: Decode>(&mut self, segment: Segment, raw: Fragment<'_>, slot: &mut T) -> Result<()> {
        self.path.push(segment);
        let max_depth = self.decoder.options().max_depth;
        let result = if self.path.len() > max_depth {
            Err(self.malformed(raw, format!("nesting depth exceeds {max_depth}")))
        } else {
            self.decode(raw, slot)
        };
        self.path.pop();
        result
    }

    fn decode_inner<T: Decode>(
        &mut self,
        raw: Fragment<'_>,
        slot: &mut T,
        dispatching: bool,
    ) -> Result<()> {
        if raw.is_empty() {
            return Err(self.malformed(raw, "unexpected end of input"));
        }

        match raw.shape() {
            Shape::Object => {
                let object = Object::parse(raw).map_err(|e| self.syntax(raw, e))?;
                let decoder = self.decoder;
                if dispatching {
                    if let Some(kind) = object.discriminator(&decoder.options().tag) {
                        let produced = dispatch::dispatch(self, &kind, raw, T::type_label())?;
                        *slot = adapter::adapt::<T>(produced, self)?;
                        return Ok(());
                    }
                }
                trace!(path = %self.path(), target_type = T::type_label(), "decoding object");
                *slot = T::zero();
                slot.decode_object(object, self)
            }
            Shape::Array => {
                let array = Array::parse(raw).map_err(|e| self.syntax(raw, e))?;
                trace!(
                    path = %self.path(),
                    target_type = T::type_label(),
                    len = array.len(),
                    "decoding array"
                );
                *slot = T::zero();
                slot.decode_array(array, self)
            }
            Shape::Null => {
                *slot = T::zero();
                Ok(())
            }
            Shape::Scalar => {
                *slot = T::zero();
                slot.decode_scalar(raw, self)
            }
        }
    }
}

impl fmt::Debug for DecodeState<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeState")
            .field("path", &self.path())
            .finish()
    }
}
