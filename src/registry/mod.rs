// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Kind registry.
//!
//! Maps kind names to constructors. Keys are exact, case-sensitive strings;
//! two kinds may produce the same concrete type.
//!
//! # Example
//!
//! ```
//! use kindcodec::{BoxError, Registry};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Config {
//!     name: String,
//! }
//!
//! let registry = Registry::new();
//! registry
//!     .register("hello", |name: String| -> Result<Config, BoxError> {
//!         Ok(Config { name })
//!     })
//!     .unwrap();
//!
//! assert!(registry.contains("hello"));
//! assert!(registry.find("Hello").is_none());
//! ```

pub mod constructor;
pub mod signature;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, RwLockReadGuard};

use tracing::{debug, warn};

use crate::core::{CodecError, Result};
use crate::decode::{CastTable, Dynamic};

pub use constructor::{
    Construct, ConstructError, FnConstructor, Handler, InfallibleFn, InfallibleHandler,
};
pub use signature::{DecodeFn, DecodeTarget, Param, ParamSource, ReturnShape, Signature};

/// A registered constructor with its signature.
#[derive(Clone)]
pub struct ConstructorEntry {
    kind: String,
    constructor: Arc<dyn Construct>,
    signature: Arc<Signature>,
}

impl ConstructorEntry {
    /// Kind name.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Name of the type the constructor produces.
    pub fn produced_type(&self) -> &'static str {
        self.signature.produces
    }

    /// Constructor signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The type-erased constructor.
    pub fn constructor(&self) -> &Arc<dyn Construct> {
        &self.constructor
    }
}

impl fmt::Debug for ConstructorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorEntry")
            .field("kind", &self.kind)
            .field("signature", &self.signature.to_string())
            .finish()
    }
}

/// Thread-safe map from kind name to constructor.
///
/// Uses RwLock for concurrent read access with exclusive write access.
/// Population is expected during startup; lookups may run from many threads.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<RegistryInner>,
    casts: RwLock<CastTable>,
}

#[derive(Default)]
struct RegistryInner {
    constructors: BTreeMap<String, ConstructorEntry>,
}

impl Registry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fallible constructor.
    ///
    /// # Arguments
    ///
    /// * `kind` - Kind name (non-empty, case-sensitive)
    /// * `constructor` - `Fn(A1, .., An) -> Result<T, E>` where every `Ai`
    ///   implements [`FromParam`](crate::FromParam) and `E: Into<BoxError>`
    ///
    /// # Errors
    ///
    /// Returns `CodecError::InvalidConstructorSignature` if the kind is empty
    /// or the constructor produces `()` or a tuple. The kind is left
    /// unregistered.
    pub fn register<F, Args>(&self, kind: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Handler<Args>,
        Args: 'static,
    {
        self.register_entry(kind, Arc::new(FnConstructor::new(constructor)))
    }

    /// Register an infallible constructor, `Fn(A1, .., An) -> T`.
    pub fn register_infallible<F, Args>(&self, kind: impl Into<String>, constructor: F) -> Result<()>
    where
        F: InfallibleHandler<Args>,
        Args: 'static,
    {
        self.register_entry(kind, Arc::new(InfallibleFn::new(constructor)))
    }

    /// Register a constructor under `"{namespace}@{kind}"`.
    pub fn register_in<F, Args>(
        &self,
        namespace: &str,
        kind: &str,
        constructor: F,
    ) -> Result<()>
    where
        F: Handler<Args>,
        Args: 'static,
    {
        self.register(format!("{namespace}@{kind}"), constructor)
    }

    /// Register a type-erased constructor.
    ///
    /// Re-registering an existing kind replaces it (last write wins).
    pub fn register_entry(&self, kind: impl Into<String>, constructor: Arc<dyn Construct>) -> Result<()> {
        let kind = kind.into();
        let signature = constructor.signature();

        if kind.is_empty() {
            return Err(CodecError::invalid_signature(
                kind,
                signature.to_string(),
                "kind name is empty",
            ));
        }
        if let Err(reason) = constructor::check_signature(&signature) {
            return Err(CodecError::invalid_signature(
                kind,
                signature.to_string(),
                reason,
            ));
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|e| CodecError::internal(format!("Registry lock poisoned: {e}")))?;

        debug!(
            kind = %kind,
            produces = signature.produces,
            params = signature.params.len(),
            "registering constructor"
        );

        let entry = ConstructorEntry {
            kind: kind.clone(),
            constructor,
            signature: Arc::new(signature),
        };
        if let Some(previous) = inner.constructors.insert(kind.clone(), entry) {
            warn!(
                kind = %kind,
                previous = previous.produced_type(),
                "kind registered twice, replacing previous constructor"
            );
        }
        Ok(())
    }

    /// Look up a kind. Exact match only.
    pub fn find(&self, kind: &str) -> Option<ConstructorEntry> {
        self.read().constructors.get(kind).cloned()
    }

    /// Visit every entry in ascending kind order.
    ///
    /// Iterates over a snapshot, so `f` may use the registry.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &ConstructorEntry),
    {
        let snapshot: Vec<ConstructorEntry> = self.read().constructors.values().cloned().collect();
        for entry in &snapshot {
            f(entry.kind(), entry);
        }
    }

    /// All kind names, sorted.
    pub fn kinds(&self) -> Vec<String> {
        self.read().constructors.keys().cloned().collect()
    }

    /// Check if a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.read().constructors.contains_key(kind)
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.read().constructors.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a kind.
    ///
    /// # Returns
    ///
    /// `true` if the kind was registered
    pub fn remove(&self, kind: &str) -> Result<bool> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| CodecError::internal(format!("Registry lock poisoned: {e}")))?;
        Ok(inner.constructors.remove(kind).is_some())
    }

    /// Declare that concrete type `C` satisfies interface `I`.
    ///
    /// ```
    /// use kindcodec::{Dynamic, Registry};
    ///
    /// trait Greeter: Dynamic {
    ///     fn greet(&self) -> String;
    /// }
    ///
    /// struct English;
    /// impl Greeter for English {
    ///     fn greet(&self) -> String {
    ///         "hello".to_string()
    ///     }
    /// }
    ///
    /// let registry = Registry::new();
    /// registry.implement::<English, dyn Greeter>(|e| e).unwrap();
    /// assert!(registry.implements::<English, dyn Greeter>());
    /// ```
    pub fn implement<C, I>(&self, cast: fn(Box<C>) -> Box<I>) -> Result<()>
    where
        C: std::any::Any,
        I: ?Sized + Dynamic,
    {
        let mut casts = self
            .casts
            .write()
            .map_err(|e| CodecError::internal(format!("Registry lock poisoned: {e}")))?;
        casts.implement::<C, I>(cast);
        debug!(
            concrete = std::any::type_name::<C>(),
            interface = std::any::type_name::<I>(),
            "declared interface implementation"
        );
        Ok(())
    }

    /// Check whether `C` was declared to satisfy `I`.
    pub fn implements<C: std::any::Any, I: ?Sized + 'static>(&self) -> bool {
        self.casts().implements::<C, I>()
    }

    pub(crate) fn casts(&self) -> RwLockReadGuard<'_, CastTable> {
        self.casts.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

static GLOBAL_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// Get the process-wide registry used by the crate-level helpers.
pub fn global_registry() -> &'static Registry {
    GLOBAL_REGISTRY.get_or_init(Registry::new)
}
