// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Ambient values available to constructor parameters.
//!
//! The context bag is a keyed structure: a fixed set of well-known entries
//! (cancellation handle, kind name, raw fragment, destination type) plus
//! user extensions registered under a static name.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::fragment::Fragment;

/// Cancellation and deadline handle forwarded to constructors.
///
/// The decode engine never checks it; constructors doing long-running work
/// are expected to.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl Cancellation {
    /// Create a handle that is never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a handle that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// Create a handle that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Cancel this handle and every clone of it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether the handle was cancelled or its deadline passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// A named slot in the extension map.
///
/// ```
/// use kindcodec::ExtensionKey;
///
/// struct Region;
/// impl ExtensionKey for Region {
///     const NAME: &'static str = "region";
///     type Value = String;
/// }
/// ```
pub trait ExtensionKey: 'static {
    /// Key under which the value is stored.
    const NAME: &'static str;
    /// Stored value type.
    type Value: Clone + Send + Sync + 'static;
}

/// User-supplied context values, keyed by name.
#[derive(Clone, Default)]
pub struct Extensions {
    values: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Create an empty extension map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `K::NAME`, replacing any previous value.
    pub fn insert<K: ExtensionKey>(&mut self, value: K::Value) {
        self.values.insert(K::NAME, Arc::new(value));
    }

    /// Typed lookup.
    pub fn get<K: ExtensionKey>(&self) -> Option<&K::Value> {
        self.values
            .get(K::NAME)
            .and_then(|v| v.downcast_ref::<K::Value>())
    }

    /// Untyped lookup by name.
    pub fn get_raw(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.values.get(name).cloned()
    }

    /// Check if a value is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("Extensions").field("keys", &keys).finish()
    }
}

/// Context entries a parameter can be bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    /// The [`Cancellation`] handle of the decode call
    Cancellation,
    /// Type name of the destination being populated
    Destination,
    /// A user extension, by name
    Extension(&'static str),
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextKey::Cancellation => write!(f, "cancellation"),
            ContextKey::Destination => write!(f, "destination"),
            ContextKey::Extension(name) => write!(f, "extension '{name}'"),
        }
    }
}

/// The context bag of a single dispatch.
///
/// Seeded fresh for every dispatched object, so nested dispatches see their
/// own kind and fragment while sharing the call's cancellation handle and
/// extensions.
#[derive(Debug, Clone, Copy)]
pub struct Context<'c> {
    cancellation: &'c Cancellation,
    kind: &'c str,
    raw: Fragment<'c>,
    destination: &'static str,
    extensions: &'c Extensions,
}

impl<'c> Context<'c> {
    /// Seed a context bag.
    pub fn new(
        cancellation: &'c Cancellation,
        kind: &'c str,
        raw: Fragment<'c>,
        destination: &'static str,
        extensions: &'c Extensions,
    ) -> Self {
        Self {
            cancellation,
            kind,
            raw,
            destination,
            extensions,
        }
    }

    /// Cancellation handle.
    pub fn cancellation(&self) -> &'c Cancellation {
        self.cancellation
    }

    /// Kind being dispatched.
    pub fn kind(&self) -> &'c str {
        self.kind
    }

    /// Fragment carrying the discriminator.
    pub fn raw(&self) -> Fragment<'c> {
        self.raw
    }

    /// Destination type name.
    pub fn destination(&self) -> &'static str {
        self.destination
    }

    /// User extensions.
    pub fn extensions(&self) -> &'c Extensions {
        self.extensions
    }
}
