// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Structural decoding.
//!
//! [`Decode`] describes how a destination of statically known shape is
//! populated from an object, an array, or a scalar fragment. The decode
//! engine in [`DecodeState`] picks the method from the fragment's shape,
//! resets the destination to [`Decode::zero`] first, and routes objects that
//! carry a discriminator to dispatch instead.

use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use super::adapter::Produced;
use super::state::DecodeState;
use crate::core::{Array, Fragment, Object, Result};
use crate::registry::Registry;

/// A destination that can be populated from a JSON fragment.
///
/// Implemented for scalars, `String`, `Option`, `Box`, `Vec`, fixed arrays,
/// string-keyed maps, `serde_json::Value` and [`Interface`](super::Interface).
/// Records implement it with [`record!`](crate::record) or by hand through
/// [`RecordDecoder`](super::RecordDecoder).
pub trait Decode: Sized + 'static {
    /// Whether this destination is an interface (trait object) slot.
    const INTERFACE: bool = false;

    /// The empty form the destination is reset to before decoding.
    fn zero() -> Self;

    /// Name used in error messages.
    fn type_label() -> &'static str {
        type_name::<Self>()
    }

    /// Populate from an object without a discriminator.
    fn decode_object(&mut self, object: Object<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        Err(state.mismatch(object.raw(), "object", Self::type_label()))
    }

    /// Populate from an array.
    fn decode_array(&mut self, array: Array<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        Err(state.mismatch(array.raw(), "array", Self::type_label()))
    }

    /// Populate from a string, number or boolean.
    fn decode_scalar(&mut self, raw: Fragment<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        Err(state.mismatch(raw, "scalar", Self::type_label()))
    }

    /// Turn a constructor's output into this type, or hand it back.
    fn adapt(produced: Produced, registry: &Registry) -> std::result::Result<Self, Produced> {
        let _ = registry;
        produced.deref_into::<Self>()
    }
}

macro_rules! impl_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn zero() -> Self {
                    <$ty as Default>::default()
                }

                fn decode_scalar(
                    &mut self,
                    raw: Fragment<'_>,
                    state: &mut DecodeState<'_>,
                ) -> Result<()> {
                    *self = raw
                        .parse_scalar::<$ty>()
                        .map_err(|e| state.syntax(raw, e))?;
                    Ok(())
                }
            }
        )*
    };
}

impl_scalar!(bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char, String);

/// Accepts only `null`.
impl Decode for () {
    fn zero() -> Self {}
}

impl Decode for serde_json::Value {
    fn zero() -> Self {
        serde_json::Value::Null
    }

    fn decode_object(&mut self, object: Object<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        let raw = object.raw();
        *self = raw.parse_scalar().map_err(|e| state.syntax(raw, e))?;
        Ok(())
    }

    fn decode_array(&mut self, array: Array<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        let raw = array.raw();
        *self = raw.parse_scalar().map_err(|e| state.syntax(raw, e))?;
        Ok(())
    }

    fn decode_scalar(&mut self, raw: Fragment<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        *self = raw.parse_scalar().map_err(|e| state.syntax(raw, e))?;
        Ok(())
    }
}

impl<T: Decode> Decode for Box<T> {
    fn zero() -> Self {
        Box::new(T::zero())
    }

    fn decode_object(&mut self, object: Object<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        (**self).decode_object(object, state)
    }

    fn decode_array(&mut self, array: Array<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        (**self).decode_array(array, state)
    }

    fn decode_scalar(&mut self, raw: Fragment<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        (**self).decode_scalar(raw, state)
    }

    fn adapt(produced: Produced, registry: &Registry) -> std::result::Result<Self, Produced> {
        match produced.downcast::<Box<T>>() {
            Ok(boxed) => Ok(boxed),
            Err(produced) => T::adapt(produced, registry).map(Box::new),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn zero() -> Self {
        None
    }

    fn decode_object(&mut self, object: Object<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        let mut inner = T::zero();
        inner.decode_object(object, state)?;
        *self = Some(inner);
        Ok(())
    }

    fn decode_array(&mut self, array: Array<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        let mut inner = T::zero();
        inner.decode_array(array, state)?;
        *self = Some(inner);
        Ok(())
    }

    fn decode_scalar(&mut self, raw: Fragment<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        let mut inner = T::zero();
        inner.decode_scalar(raw, state)?;
        *self = Some(inner);
        Ok(())
    }

    fn adapt(produced: Produced, registry: &Registry) -> std::result::Result<Self, Produced> {
        match produced.downcast::<Option<T>>() {
            Ok(value) => Ok(value),
            Err(produced) => T::adapt(produced, registry).map(Some),
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn zero() -> Self {
        Vec::new()
    }

    fn decode_array(&mut self, array: Array<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        let elements = array.into_elements();
        *self = elements.iter().map(|_| T::zero()).collect();
        for (index, (slot, raw)) in self.iter_mut().zip(elements).enumerate() {
            state.decode_index(index, raw, slot)?;
        }
        Ok(())
    }
}

/// Fixed-capacity sequences take `min(input, N)` elements; extra input is
/// ignored and missing input leaves trailing elements zero.
impl<T: Decode, const N: usize> Decode for [T; N] {
    fn zero() -> Self {
        std::array::from_fn(|_| T::zero())
    }

    fn decode_array(&mut self, array: Array<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        for (index, (slot, raw)) in self.iter_mut().zip(array.into_elements()).enumerate() {
            state.decode_index(index, raw, slot)?;
        }
        Ok(())
    }
}

impl<V: Decode, S: BuildHasher + Default + 'static> Decode for HashMap<String, V, S> {
    fn zero() -> Self {
        HashMap::default()
    }

    fn decode_object(&mut self, object: Object<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        let mut map = HashMap::with_capacity_and_hasher(object.len(), S::default());
        for (key, raw) in object.into_entries() {
            let mut value = V::zero();
            state.decode_key(&key, raw, &mut value)?;
            map.insert(key, value);
        }
        *self = map;
        Ok(())
    }
}

impl<V: Decode> Decode for BTreeMap<String, V> {
    fn zero() -> Self {
        BTreeMap::new()
    }

    fn decode_object(&mut self, object: Object<'_>, state: &mut DecodeState<'_>) -> Result<()> {
        let mut map = BTreeMap::new();
        for (key, raw) in object.into_entries() {
            let mut value = V::zero();
            state.decode_key(&key, raw, &mut value)?;
            map.insert(key, value);
        }
        *self = map;
        Ok(())
    }
}
