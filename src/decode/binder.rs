// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Parameter binding.
//!
//! Every constructor parameter type declares where its value comes from
//! through [`FromParam::source`]. The binder resolves those sources, in
//! order, into [`Arg`]s; the constructor converts each back to its declared
//! type. Nothing is inferred at call time.

use std::any::{type_name, Any};
use std::collections::{BTreeMap, HashMap};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::vec;

use tracing::trace;

use super::state::DecodeState;
use super::structural::Decode;
use crate::core::{Cancellation, CodecError, Context, ContextKey, ExtensionKey, Result};
use crate::registry::{DecodeTarget, Param, ParamSource};

/// A constructor parameter type.
pub trait FromParam: Sized + 'static {
    /// Where the value is resolved from.
    fn source() -> ParamSource;

    /// Convert a resolved argument. `None` means the argument has the wrong type.
    fn from_arg(arg: Arg) -> Option<Self>;
}

/// A resolved, type-erased argument.
pub enum Arg {
    /// Raw bytes of the dispatched object
    Raw(Vec<u8>),
    /// The kind name
    Kind(String),
    /// An owned decoded or context value
    Value(Box<dyn Any>),
    /// A shared extension value
    Shared(Arc<dyn Any + Send + Sync>),
}

impl std::fmt::Debug for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Raw(bytes) => write!(f, "Raw({} bytes)", bytes.len()),
            Arg::Kind(kind) => write!(f, "Kind({kind:?})"),
            Arg::Value(_) => f.write_str("Value(..)"),
            Arg::Shared(_) => f.write_str("Shared(..)"),
        }
    }
}

impl FromParam for Vec<u8> {
    fn source() -> ParamSource {
        ParamSource::Raw
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        match arg {
            Arg::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// The raw bytes of the dispatched object, verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub Vec<u8>);

impl FromParam for Raw {
    fn source() -> ParamSource {
        ParamSource::Raw
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        Vec::<u8>::from_arg(arg).map(Raw)
    }
}

impl Deref for Raw {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

/// The kind name doubles as a conventional "name" argument.
impl FromParam for String {
    fn source() -> ParamSource {
        ParamSource::Kind
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        match arg {
            Arg::Kind(kind) => Some(kind),
            _ => None,
        }
    }
}

fn decoded<T: Decode>(arg: Arg) -> Option<Box<T>> {
    match arg {
        Arg::Value(value) => value.downcast::<T>().ok(),
        _ => None,
    }
}

/// A record decoded from the dispatched object itself.
///
/// The object's discriminator is not dispatched again, so one document can
/// both name the kind and carry the constructor's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields<T>(pub T);

impl<T> Fields<T> {
    /// Unwrap the decoded value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Fields<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Fields<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Decode> FromParam for Fields<T> {
    fn source() -> ParamSource {
        ParamSource::Decoded(DecodeTarget::of::<T>())
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        decoded::<T>(arg).map(|value| Fields(*value))
    }
}

impl<T: Decode> FromParam for Box<T> {
    fn source() -> ParamSource {
        ParamSource::Decoded(DecodeTarget::of::<T>())
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        decoded::<T>(arg)
    }
}

impl<V: Decode> FromParam for HashMap<String, V> {
    fn source() -> ParamSource {
        ParamSource::Decoded(DecodeTarget::of::<Self>())
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        decoded::<Self>(arg).map(|value| *value)
    }
}

impl<V: Decode> FromParam for BTreeMap<String, V> {
    fn source() -> ParamSource {
        ParamSource::Decoded(DecodeTarget::of::<Self>())
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        decoded::<Self>(arg).map(|value| *value)
    }
}

impl FromParam for serde_json::Value {
    fn source() -> ParamSource {
        ParamSource::Decoded(DecodeTarget::of::<Self>())
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        decoded::<Self>(arg).map(|value| *value)
    }
}

impl FromParam for Cancellation {
    fn source() -> ParamSource {
        ParamSource::Context(ContextKey::Cancellation)
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        match arg {
            Arg::Value(value) => value.downcast::<Cancellation>().ok().map(|c| *c),
            _ => None,
        }
    }
}

/// Type name of the destination being populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination(pub &'static str);

impl FromParam for Destination {
    fn source() -> ParamSource {
        ParamSource::Context(ContextKey::Destination)
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        match arg {
            Arg::Value(value) => value.downcast::<Destination>().ok().map(|d| *d),
            _ => None,
        }
    }
}

/// A user extension from the context bag.
pub struct Ctx<K: ExtensionKey>(pub K::Value);

impl<K: ExtensionKey> Ctx<K> {
    /// Unwrap the value.
    pub fn into_inner(self) -> K::Value {
        self.0
    }
}

impl<K: ExtensionKey> Deref for Ctx<K> {
    type Target = K::Value;

    fn deref(&self) -> &K::Value {
        &self.0
    }
}

impl<K: ExtensionKey> std::fmt::Debug for Ctx<K>
where
    K::Value: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Ctx").field(&self.0).finish()
    }
}

impl<K: ExtensionKey> FromParam for Ctx<K> {
    fn source() -> ParamSource {
        ParamSource::Context(ContextKey::Extension(K::NAME))
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        match arg {
            Arg::Shared(value) => value.downcast_ref::<K::Value>().cloned().map(Ctx),
            _ => None,
        }
    }
}

/// Resolves the parameters of one dispatch call.
pub(crate) struct Binder<'b, 'd> {
    state: &'b mut DecodeState<'d>,
    context: &'b Context<'b>,
}

impl<'b, 'd> Binder<'b, 'd> {
    pub(crate) fn new(state: &'b mut DecodeState<'d>, context: &'b Context<'b>) -> Self {
        Self { state, context }
    }

    /// Resolve every parameter in declared order. The first failure aborts.
    pub(crate) fn resolve_all(self, params: &[Param]) -> Result<Arguments> {
        let Binder { state, context } = self;
        let mut values = Vec::with_capacity(params.len());

        for (position, param) in params.iter().enumerate() {
            trace!(
                kind = context.kind(),
                position,
                source = %param.source,
                "binding parameter"
            );
            let arg = match param.source {
                ParamSource::Raw => Arg::Raw(context.raw().as_bytes().to_vec()),
                ParamSource::Kind => Arg::Kind(context.kind().to_string()),
                ParamSource::Decoded(target) => Arg::Value((target.decode)(&mut *state, context.raw())?),
                ParamSource::Context(key) => resolve_context(context, key).ok_or_else(|| {
                    CodecError::parameter_resolution(
                        context.kind(),
                        position,
                        param.type_name,
                        format!("no {key} in context"),
                    )
                })?,
            };
            values.push(arg);
        }

        Ok(Arguments {
            kind: context.kind().to_string(),
            values: values.into_iter(),
            position: 0,
        })
    }
}

fn resolve_context(context: &Context<'_>, key: ContextKey) -> Option<Arg> {
    match key {
        ContextKey::Cancellation => Some(Arg::Value(Box::new(context.cancellation().clone()))),
        ContextKey::Destination => Some(Arg::Value(Box::new(Destination(context.destination())))),
        ContextKey::Extension(name) => context.extensions().get_raw(name).map(Arg::Shared),
    }
}

/// Resolved arguments, consumed in declared order.
#[derive(Debug)]
pub struct Arguments {
    kind: String,
    values: vec::IntoIter<Arg>,
    position: usize,
}

impl Arguments {
    /// Bundle arguments for a hand-written constructor.
    pub fn new(kind: impl Into<String>, values: Vec<Arg>) -> Self {
        Self {
            kind: kind.into(),
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Kind being constructed.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Take the next argument as a `P`.
    pub fn next<P: FromParam>(&mut self) -> Result<P> {
        let position = self.position;
        self.position += 1;
        let arg = self.values.next().ok_or_else(|| {
            CodecError::parameter_resolution(
                &self.kind,
                position,
                type_name::<P>(),
                "argument missing",
            )
        })?;
        P::from_arg(arg).ok_or_else(|| {
            CodecError::parameter_resolution(
                &self.kind,
                position,
                type_name::<P>(),
                "argument has a different type",
            )
        })
    }
}
