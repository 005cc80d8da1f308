// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Decoding.
//!
//! [`Decoder`] is the entry point: it borrows a [`Registry`], carries the
//! [`DecoderOptions`], the cancellation handle and user extensions, and
//! decodes byte documents into any [`Decode`] destination.
//!
//! # Architecture
//!
//! - [`structural`] - the [`Decode`] trait and its implementations
//! - [`record`] - field-by-field decoding of structs
//! - [`state`] - the recursive engine and error locations
//! - [`binder`] - constructor parameter sources
//! - [`adapter`] - reconciling constructor output with the destination

pub mod adapter;
pub mod binder;
mod dispatch;
pub mod options;
pub mod record;
pub mod state;
pub mod structural;

use tracing::debug;

use crate::core::{Cancellation, ExtensionKey, Extensions, Fragment, Result};
use crate::registry::Registry;

pub use adapter::{CastTable, Dynamic, Interface, Produced};
pub use binder::{Arg, Arguments, Ctx, Destination, Fields, FromParam, Raw};
pub use options::DecoderOptions;
pub use record::{FieldOptions, RecordDecoder};
pub use state::{DecodeState, Segment};
pub use structural::Decode;

/// Decodes documents against a registry.
///
/// Cheap to build and safe to share between threads.
#[derive(Debug)]
pub struct Decoder<'r> {
    registry: &'r Registry,
    options: DecoderOptions,
    cancellation: Cancellation,
    extensions: Extensions,
}

impl<'r> Decoder<'r> {
    /// Create a decoder with default options.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            options: DecoderOptions::default(),
            cancellation: Cancellation::default(),
            extensions: Extensions::default(),
        }
    }

    /// Start building a configured decoder.
    pub fn builder(registry: &'r Registry) -> DecoderBuilder<'r> {
        DecoderBuilder::new(registry)
    }

    /// The registry kinds are looked up in.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Decoder options.
    pub fn options(&self) -> &DecoderOptions {
        &self.options
    }

    /// Cancellation handle forwarded to constructors.
    pub fn cancellation(&self) -> &Cancellation {
        &self.cancellation
    }

    /// User extensions available to constructors.
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Decode `raw` into `dest`, replacing its contents.
    ///
    /// On error `dest` is left in an unspecified state and must not be used.
    pub fn unmarshal_into<T: Decode>(&self, raw: &[u8], dest: &mut T) -> Result<()> {
        debug!(
            target_type = T::type_label(),
            len = raw.len(),
            "unmarshalling document"
        );
        let mut state = DecodeState::new(self);
        state.decode(Fragment::new(raw), dest)
    }

    /// Decode `raw` into a fresh `T`.
    pub fn unmarshal<T: Decode>(&self, raw: &[u8]) -> Result<T> {
        let mut value = T::zero();
        self.unmarshal_into(raw, &mut value)?;
        Ok(value)
    }
}

/// Builder for [`Decoder`].
///
/// ```
/// use kindcodec::{Cancellation, Decoder, ExtensionKey, Registry};
///
/// struct Region;
/// impl ExtensionKey for Region {
///     const NAME: &'static str = "region";
///     type Value = String;
/// }
///
/// let registry = Registry::new();
/// let decoder = Decoder::builder(&registry)
///     .tag("type")
///     .cancellation(Cancellation::new())
///     .extension::<Region>("eu-west".to_string())
///     .build()
///     .unwrap();
/// assert_eq!(decoder.options().tag, "type");
/// ```
#[derive(Debug)]
pub struct DecoderBuilder<'r> {
    registry: &'r Registry,
    options: DecoderOptions,
    cancellation: Cancellation,
    extensions: Extensions,
}

impl<'r> DecoderBuilder<'r> {
    /// Create a builder with default options.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            options: DecoderOptions::default(),
            cancellation: Cancellation::default(),
            extensions: Extensions::default(),
        }
    }

    /// Replace all options.
    pub fn options(mut self, options: DecoderOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the discriminator key.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.options.tag = tag.into();
        self
    }

    /// Set the maximum nesting depth.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.options.max_depth = max_depth;
        self
    }

    /// Set the cancellation handle forwarded to constructors.
    pub fn cancellation(mut self, cancellation: Cancellation) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Make a value available to constructors through [`Ctx<K>`].
    pub fn extension<K: ExtensionKey>(mut self, value: K::Value) -> Self {
        self.extensions.insert::<K>(value);
        self
    }

    /// Validate the options and build the decoder.
    pub fn build(self) -> Result<Decoder<'r>> {
        self.options.validate()?;
        Ok(Decoder {
            registry: self.registry,
            options: self.options,
            cancellation: self.cancellation,
            extensions: self.extensions,
        })
    }
}
