// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Record decoding.
//!
//! Records (structs with named fields) are decoded field by field. Each field
//! is matched to an input key case-insensitively, or through an explicit
//! rename. Input keys no field asks for are ignored; fields with no input
//! stay at their zero value.

use super::state::DecodeState;
use super::structural::Decode;
use crate::core::{Fragment, Object, Result, Shape};

/// Per-field decoding options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldOptions {
    /// Input key to match instead of the field name
    pub rename: Option<&'static str>,
    /// The value is a JSON string holding the encoded value, e.g. `"8080"`
    pub as_string: bool,
}

impl FieldOptions {
    /// Options with no rename and plain encoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Match a different input key.
    pub fn rename(mut self, key: &'static str) -> Self {
        self.rename = Some(key);
        self
    }

    /// Decode the value from inside a JSON string.
    pub fn string(mut self) -> Self {
        self.as_string = true;
        self
    }
}

/// Populates the fields of a record from an object.
///
/// ```
/// use kindcodec::decode::{Decode, DecodeState, FieldOptions, RecordDecoder};
/// use kindcodec::{Decoder, Object, Registry, Result};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Listener {
///     host: String,
///     port: u16,
/// }
///
/// impl Decode for Listener {
///     fn zero() -> Self {
///         Self::default()
///     }
///
///     fn decode_object(&mut self, object: Object<'_>, state: &mut DecodeState<'_>) -> Result<()> {
///         RecordDecoder::new(object, state)
///             .field("host", &mut self.host)?
///             .field_with("port", FieldOptions::new().string(), &mut self.port)?;
///         Ok(())
///     }
/// }
///
/// let registry = Registry::new();
/// let listener: Listener = Decoder::new(&registry)
///     .unmarshal(br#"{"HOST":"localhost","port":"8080"}"#)
///     .unwrap();
/// assert_eq!(listener, Listener { host: "localhost".into(), port: 8080 });
/// ```
pub struct RecordDecoder<'a, 's, 'd> {
    object: Object<'a>,
    state: &'s mut DecodeState<'d>,
}

impl<'a, 's, 'd> RecordDecoder<'a, 's, 'd> {
    /// Start decoding `object`.
    pub fn new(object: Object<'a>, state: &'s mut DecodeState<'d>) -> Self {
        Self { object, state }
    }

    /// Decode the field `name` into `slot`.
    pub fn field<T: Decode>(&mut self, name: &str, slot: &mut T) -> Result<&mut Self> {
        self.field_with(name, FieldOptions::default(), slot)
    }

    /// Decode the field `name` into `slot` with options.
    pub fn field_with<T: Decode>(
        &mut self,
        name: &str,
        options: FieldOptions,
        slot: &mut T,
    ) -> Result<&mut Self> {
        let key = options.rename.unwrap_or(name);
        let Some(raw) = self.object.find_folded(key) else {
            return Ok(self);
        };

        if options.as_string {
            self.decode_quoted(key, raw, slot)?;
        } else {
            self.state.decode_field(key, raw, slot)?;
        }
        Ok(self)
    }

    fn decode_quoted<T: Decode>(&mut self, key: &str, raw: Fragment<'_>, slot: &mut T) -> Result<()> {
        if raw.shape() == Shape::Null {
            *slot = T::zero();
            return Ok(());
        }
        let inner: String = match raw.parse_scalar() {
            Ok(inner) => inner,
            Err(_) => {
                return Err(self
                    .state
                    .malformed(raw, format!("field '{key}' expects a string-encoded value")))
            }
        };
        self.state
            .decode_field(key, Fragment::new(inner.as_bytes()), slot)
    }
}

/// Implement [`Decode`] for a struct with named fields.
///
/// Every field type must implement `Decode` and the struct must implement
/// `Default`. A field may be renamed with `= "key"` and may take the
/// `string` option.
///
/// ```
/// use kindcodec::{record, Decoder, Registry};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Server {
///     name: String,
///     port: u16,
///     tags: Vec<String>,
/// }
///
/// record!(Server {
///     name = "server_name",
///     port: string,
///     tags,
/// });
///
/// let registry = Registry::new();
/// let server: Server = Decoder::new(&registry)
///     .unmarshal(br#"{"Server_Name":"a","port":"81","tags":["x"],"other":1}"#)
///     .unwrap();
/// assert_eq!(server.name, "a");
/// assert_eq!(server.port, 81);
/// assert_eq!(server.tags, vec!["x".to_string()]);
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ty { $($field:ident $(= $rename:literal)? $(: $opt:ident)?),* $(,)? }) => {
        impl $crate::decode::Decode for $ty {
            fn zero() -> Self {
                <$ty as ::std::default::Default>::default()
            }

            #[allow(unused_mut)]
            fn decode_object(
                &mut self,
                object: $crate::Object<'_>,
                state: &mut $crate::decode::DecodeState<'_>,
            ) -> $crate::Result<()> {
                let mut record = $crate::decode::RecordDecoder::new(object, state);
                $(
                    let mut options = $crate::decode::FieldOptions::new();
                    $(options = options.rename($rename);)?
                    $(options = options.$opt();)?
                    record.field_with(stringify!($field), options, &mut self.$field)?;
                )*
                Ok(())
            }
        }
    };
}
