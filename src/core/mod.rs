// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types used throughout kindcodec.
//!
//! This module provides the foundational types for the library:
//! - [`CodecError`] - Error taxonomy of registration and decoding
//! - [`Fragment`] - Borrowed raw JSON values
//! - [`Context`] - The context bag handed to parameter binding

pub mod context;
pub mod error;
pub mod fragment;

pub use context::{Cancellation, Context, ContextKey, ExtensionKey, Extensions};
pub use error::{BoxError, CodecError, Result};
pub use fragment::{fold_eq, kind_of, Array, Fragment, Object, Shape, DEFAULT_TAG};
