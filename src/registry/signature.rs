// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Constructor signatures.
//!
//! A [`Signature`] is the introspectable shape of a constructor: where each
//! parameter comes from, what type it produces, and whether it can fail.
//! Signatures are validated once, at registration.

use std::any::{type_name, Any};
use std::fmt;

use crate::core::{ContextKey, Fragment, Result};
use crate::decode::{Decode, DecodeState, FromParam};

/// Decodes a fragment structurally into a type-erased value.
pub type DecodeFn = fn(&mut DecodeState<'_>, Fragment<'_>) -> Result<Box<dyn Any>>;

/// A destination type a parameter is decoded into.
#[derive(Clone, Copy)]
pub struct DecodeTarget {
    /// Name of the decoded type
    pub type_name: &'static str,
    /// Decoding function
    pub decode: DecodeFn,
}

impl DecodeTarget {
    /// Target for a [`Decode`] type.
    ///
    /// The fragment is decoded by structure: its own discriminator is not
    /// dispatched again, but nested values are.
    pub fn of<T: Decode>() -> Self {
        fn decode<T: Decode>(state: &mut DecodeState<'_>, raw: Fragment<'_>) -> Result<Box<dyn Any>> {
            let mut value = T::zero();
            state.decode_structural(raw, &mut value)?;
            Ok(Box::new(value))
        }

        Self {
            type_name: type_name::<T>(),
            decode: decode::<T>,
        }
    }
}

impl fmt::Debug for DecodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DecodeTarget").field(&self.type_name).finish()
    }
}

/// Where a parameter's value comes from.
#[derive(Debug, Clone, Copy)]
pub enum ParamSource {
    /// The raw bytes of the dispatched object
    Raw,
    /// The kind name
    Kind,
    /// The dispatched object, decoded into a fresh value
    Decoded(DecodeTarget),
    /// A context entry
    Context(ContextKey),
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamSource::Raw => write!(f, "raw fragment"),
            ParamSource::Kind => write!(f, "kind"),
            ParamSource::Decoded(target) => write!(f, "decoded {}", target.type_name),
            ParamSource::Context(key) => write!(f, "context {key}"),
        }
    }
}

/// A constructor parameter.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    /// Where the value is resolved from
    pub source: ParamSource,
    /// Declared parameter type
    pub type_name: &'static str,
}

impl Param {
    /// Describe a parameter of type `P`.
    pub fn of<P: FromParam>() -> Self {
        Self {
            source: P::source(),
            type_name: type_name::<P>(),
        }
    }
}

/// How a constructor reports its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnShape {
    /// Returns the value directly
    Value,
    /// Returns the value or an error
    ValueOrError {
        /// Declared error type
        error: &'static str,
    },
}

/// Introspectable constructor signature.
#[derive(Debug, Clone)]
pub struct Signature {
    /// Parameters in call order
    pub params: Vec<Param>,
    /// Produced type
    pub produces: &'static str,
    /// Whether the constructor can fail
    pub returns: ReturnShape,
}

impl Signature {
    /// Check that the constructor produces exactly one value.
    ///
    /// Returns the reason on rejection.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.produces == "()" {
            return Err("constructor returns no value".to_string());
        }
        if self.produces.starts_with('(') {
            return Err(format!(
                "constructor returns more than one value ({})",
                self.produces
            ));
        }
        Ok(())
    }

    /// Check whether the constructor can fail.
    pub fn is_fallible(&self) -> bool {
        matches!(self.returns, ReturnShape::ValueOrError { .. })
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn(")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param.type_name)?;
        }
        match self.returns {
            ReturnShape::Value => write!(f, ") -> {}", self.produces),
            ReturnShape::ValueOrError { error } => {
                write!(f, ") -> Result<{}, {}>", self.produces, error)
            }
        }
    }
}
