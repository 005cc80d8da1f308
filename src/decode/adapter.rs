// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Result adaptation.
//!
//! A constructor hands back a type-erased [`Produced`] value. Adaptation
//! reconciles it with the destination type:
//!
//! 1. assign directly when the types match;
//! 2. box a plain value for a `Box<T>` destination;
//! 3. dereference `Box<T>` (up to two levels) for a `T` destination;
//! 4. upcast to `Box<dyn I>` for an [`Interface<dyn I>`](Interface)
//!    destination, using casts declared with
//!    [`Registry::implement`](crate::Registry::implement);
//! 5. when a constructor produced `Box<dyn I>`, unwrap it to its concrete
//!    dynamic value and retry.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::state::DecodeState;
use super::structural::Decode;
use crate::core::{CodecError, Result};
use crate::registry::Registry;

/// Supertrait for interfaces that constructors may return as `Box<dyn I>`.
///
/// Declaring `trait Plugin: Dynamic { .. }` lets the adapter recover the
/// concrete value behind a `Box<dyn Plugin>`.
pub trait Dynamic: Any {
    /// Convert the boxed value into `Box<dyn Any>` holding the concrete type.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Name of the concrete type.
    fn dynamic_type_name(&self) -> &'static str;
}

impl<T: Any> Dynamic for T {
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn dynamic_type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A constructor's output with its static type erased.
pub struct Produced {
    value: Box<dyn Any>,
    type_name: &'static str,
}

impl Produced {
    /// Wrap a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    fn from_parts(value: Box<dyn Any>, type_name: &'static str) -> Self {
        Self { value, type_name }
    }

    /// Name of the held type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// [`TypeId`] of the held type.
    pub fn type_id(&self) -> TypeId {
        Any::type_id(&*self.value)
    }

    /// Check whether the held value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Take the value out as a `T`, or give it back.
    pub fn downcast<T: Any>(self) -> std::result::Result<T, Produced> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Produced::from_parts(value, type_name)),
        }
    }

    /// Take the value out as a `T`, dereferencing `Box<T>` and `Box<Box<T>>`.
    pub fn deref_into<T: Any>(self) -> std::result::Result<T, Produced> {
        let produced = match self.downcast::<T>() {
            Ok(value) => return Ok(value),
            Err(produced) => produced,
        };
        let produced = match produced.downcast::<Box<T>>() {
            Ok(boxed) => return Ok(*boxed),
            Err(produced) => produced,
        };
        produced.downcast::<Box<Box<T>>>().map(|boxed| **boxed)
    }
}

impl fmt::Debug for Produced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Produced")
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// An interface destination: a nullable `Box<dyn I>`.
///
/// Zero value is `None`, like a nil interface.
pub struct Interface<I: ?Sized>(Option<Box<I>>);

impl<I: ?Sized> Interface<I> {
    /// Wrap a boxed interface value.
    pub fn new(value: Box<I>) -> Self {
        Self(Some(value))
    }

    /// The empty interface.
    pub fn none() -> Self {
        Self(None)
    }

    /// Borrow the held value.
    pub fn get(&self) -> Option<&I> {
        self.0.as_deref()
    }

    /// Mutably borrow the held value.
    pub fn get_mut(&mut self) -> Option<&mut I> {
        self.0.as_deref_mut()
    }

    /// Check whether no value is held.
    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Take the boxed value.
    pub fn into_inner(self) -> Option<Box<I>> {
        self.0
    }
}

impl<I: ?Sized> Default for Interface<I> {
    fn default() -> Self {
        Self(None)
    }
}

impl<I: ?Sized + fmt::Debug> fmt::Debug for Interface<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => f.debug_tuple("Interface").field(value).finish(),
            None => f.write_str("Interface(None)"),
        }
    }
}

impl<I: ?Sized + 'static> Decode for Interface<I> {
    const INTERFACE: bool = true;

    fn zero() -> Self {
        Self(None)
    }

    fn type_label() -> &'static str {
        type_name::<I>()
    }

    fn adapt(produced: Produced, registry: &Registry) -> std::result::Result<Self, Produced> {
        let produced = match produced.downcast::<Box<I>>() {
            Ok(value) => return Ok(Self(Some(value))),
            Err(produced) => produced,
        };
        registry.casts().upcast::<I>(produced).map(|v| Self(Some(v)))
    }
}

type CastResult = std::result::Result<Box<dyn Any>, Box<dyn Any>>;
type UnwrapResult = std::result::Result<(Box<dyn Any>, &'static str), Box<dyn Any>>;

type Upcast = Arc<dyn Fn(Box<dyn Any>) -> CastResult + Send + Sync>;
type Unwrap = Arc<dyn Fn(Box<dyn Any>) -> UnwrapResult + Send + Sync>;

/// Declared interface implementations.
///
/// Keys are `(concrete type, Box<dyn I>)` for upcasts, and `Box<dyn I>` for
/// unwrapping back to the concrete value.
#[derive(Clone, Default)]
pub struct CastTable {
    upcasts: HashMap<(TypeId, TypeId), Upcast>,
    unwraps: HashMap<TypeId, Unwrap>,
}

impl CastTable {
    /// Declare that `C` (and `Box<C>`) satisfy interface `I`.
    pub fn implement<C, I>(&mut self, cast: fn(Box<C>) -> Box<I>)
    where
        C: Any,
        I: ?Sized + Dynamic,
    {
        let target = TypeId::of::<Box<I>>();

        self.upcasts.insert(
            (TypeId::of::<C>(), target),
            Arc::new(move |value: Box<dyn Any>| -> CastResult {
                let concrete = value.downcast::<C>()?;
                Ok(Box::new(cast(concrete)) as Box<dyn Any>)
            }),
        );
        // The derived `Box<C>` cast never replaces an exact declaration for `Box<C>`.
        let boxed_cast: Upcast = Arc::new(move |value: Box<dyn Any>| -> CastResult {
            let boxed = value.downcast::<Box<C>>()?;
            Ok(Box::new(cast(*boxed)) as Box<dyn Any>)
        });
        self.upcasts
            .entry((TypeId::of::<Box<C>>(), target))
            .or_insert(boxed_cast);
        self.unwraps.insert(
            target,
            Arc::new(|value: Box<dyn Any>| -> UnwrapResult {
                let boxed = value.downcast::<Box<I>>()?;
                let inner: Box<I> = *boxed;
                let name = <I as Dynamic>::dynamic_type_name(&*inner);
                Ok((<I as Dynamic>::into_any(inner), name))
            }),
        );
    }

    /// Check whether `C` was declared to satisfy `I`.
    pub fn implements<C: Any, I: ?Sized + 'static>(&self) -> bool {
        self.upcasts
            .contains_key(&(TypeId::of::<C>(), TypeId::of::<Box<I>>()))
    }

    /// Upcast a produced value to `Box<I>`.
    pub fn upcast<I: ?Sized + 'static>(
        &self,
        produced: Produced,
    ) -> std::result::Result<Box<I>, Produced> {
        let key = (produced.type_id(), TypeId::of::<Box<I>>());
        let Some(cast) = self.upcasts.get(&key) else {
            return Err(produced);
        };
        let type_name = produced.type_name;
        match cast(produced.value) {
            Ok(value) => value
                .downcast::<Box<I>>()
                .map(|boxed| *boxed)
                .map_err(|value| Produced::from_parts(value, type_name)),
            Err(value) => Err(Produced::from_parts(value, type_name)),
        }
    }

    /// Unwrap a `Box<dyn I>` value to its concrete dynamic value.
    pub fn unwrap_interface(&self, produced: Produced) -> std::result::Result<Produced, Produced> {
        let Some(unwrap) = self.unwraps.get(&produced.type_id()) else {
            return Err(produced);
        };
        let type_name = produced.type_name;
        match unwrap(produced.value) {
            Ok((value, name)) => Ok(Produced::from_parts(value, name)),
            Err(value) => Err(Produced::from_parts(value, type_name)),
        }
    }
}

impl fmt::Debug for CastTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CastTable")
            .field("upcasts", &self.upcasts.len())
            .field("unwraps", &self.unwraps.len())
            .finish()
    }
}

/// Adapt a produced value into a destination of type `T`.
pub(crate) fn adapt<T: Decode>(produced: Produced, state: &DecodeState<'_>) -> Result<T> {
    let registry = state.decoder().registry();

    let produced = match T::adapt(produced, registry) {
        Ok(value) => return Ok(value),
        Err(produced) => produced,
    };

    let unwrapped = registry.casts().unwrap_interface(produced);
    let produced = match unwrapped {
        Ok(concrete) => match T::adapt(concrete, registry) {
            Ok(value) => return Ok(value),
            Err(produced) => produced,
        },
        Err(produced) => produced,
    };

    Err(if T::INTERFACE {
        CodecError::InterfaceNotSatisfied {
            produced: produced.type_name().to_string(),
            interface: T::type_label().to_string(),
            path: state.path(),
        }
    } else {
        CodecError::CannotAdapt {
            produced: produced.type_name().to_string(),
            expected: T::type_label().to_string(),
            path: state.path(),
        }
    })
}
