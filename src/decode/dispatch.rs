// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Kind dispatch: find the constructor, bind its parameters, invoke it.

use tracing::debug;

use super::adapter::Produced;
use super::binder::Binder;
use super::state::DecodeState;
use crate::core::{CodecError, Context, Fragment, Result};
use crate::registry::ConstructError;

/// Run the constructor registered for `kind` on the object fragment `raw`.
///
/// `expected` names the destination type, for errors and for the
/// destination context entry.
pub(crate) fn dispatch(
    state: &mut DecodeState<'_>,
    kind: &str,
    raw: Fragment<'_>,
    expected: &'static str,
) -> Result<Produced> {
    let decoder = state.decoder();
    let entry = decoder
        .registry()
        .find(kind)
        .ok_or_else(|| CodecError::kind_not_registered(kind, expected, state.path()))?;

    debug!(
        kind,
        path = %state.path(),
        expected,
        produces = entry.produced_type(),
        "dispatching kind"
    );

    let context = Context::new(
        decoder.cancellation(),
        kind,
        raw,
        expected,
        decoder.extensions(),
    );
    let args = Binder::new(state, &context).resolve_all(&entry.signature().params)?;

    match entry.constructor().construct(args) {
        Ok(Some(produced)) => Ok(produced),
        Ok(None) => Err(CodecError::ConstructorContractViolation {
            kind: kind.to_string(),
        }),
        Err(ConstructError::Bind(err)) => Err(err),
        Err(ConstructError::Invoke(source)) => Err(CodecError::ConstructorInvocation {
            kind: kind.to_string(),
            excerpt: raw.excerpt(decoder.options().excerpt_len),
            source,
        }),
    }
}
