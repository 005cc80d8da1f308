// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # kindcodec
//!
//! Decode JSON documents into typed values where the concrete variant is
//! picked at decode time by a discriminator field (`@kind`) in the document.
//!
//! Each kind is registered ahead of time as a constructor function. Decoding
//! an object that carries the discriminator calls that constructor, binding
//! its parameters from the context and from the same object, then adapts the
//! result to the destination: a value, a `Box`, or an [`Interface`].
//!
//! ## Architecture
//!
//! - `registry/` - kind names to constructors, signature validation
//! - `decode/` - structural decoding, dispatch, parameter binding, adaptation
//! - `core/` - errors, raw fragments, the context bag
//! - `encode` - tagged encoding with the discriminator first
//!
//! ## Example
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kindcodec::{record, BoxError, Decoder, Fields, Registry};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Config {
//!     name: String,
//!     port: u16,
//! }
//!
//! record!(Config { name, port });
//!
//! let registry = Registry::new();
//! registry.register("server", |kind: String, fields: Fields<Config>| -> Result<Config, BoxError> {
//!     Ok(Config { name: kind, port: fields.port })
//! })?;
//!
//! let decoder = Decoder::new(&registry);
//! let configs: Vec<Config> = decoder.unmarshal(br#"[{"@kind":"server","port":80}]"#)?;
//! assert_eq!(configs, vec![Config { name: "server".into(), port: 80 }]);
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use crate::core::{
    kind_of, BoxError, Cancellation, CodecError, Context, ContextKey, ExtensionKey, Extensions,
    Fragment, Object, Result, DEFAULT_TAG,
};

// Kind registry
pub mod registry;

pub use registry::{global_registry, ConstructorEntry, Registry, Signature};

// Decoding
pub mod decode;

pub use decode::{
    Ctx, Decode, Decoder, DecoderBuilder, DecoderOptions, Destination, Dynamic, Fields, FromParam,
    Interface, Produced, Raw,
};

// Tagged encoding
pub mod encode;

/// Register a fallible constructor in the [`global_registry`].
pub fn register<F, Args>(kind: impl Into<String>, constructor: F) -> Result<()>
where
    F: registry::Handler<Args>,
    Args: 'static,
{
    global_registry().register(kind, constructor)
}

/// Decode `raw` into a fresh `T` using the [`global_registry`].
pub fn unmarshal<T: Decode>(raw: &[u8]) -> Result<T> {
    Decoder::new(global_registry()).unmarshal(raw)
}

/// Decode `raw` into `dest` using the [`global_registry`].
pub fn unmarshal_into<T: Decode>(raw: &[u8], dest: &mut T) -> Result<()> {
    Decoder::new(global_registry()).unmarshal_into(raw, dest)
}
