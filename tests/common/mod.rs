// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Common utilities for integration tests.

#![allow(dead_code)]

use kindcodec::{record, BoxError, Dynamic, Registry};
use serde::Serialize;

// ============================================================================
// Test Types
// ============================================================================

/// The record every test kind produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Config {
    pub name: String,
}

record!(Config { name });

/// Interface satisfied by `Config` and `Box<Config>`.
pub trait Adapter: Dynamic {
    fn label(&self) -> String;
}

impl std::fmt::Debug for dyn Adapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dynamic_type_name())
    }
}

impl Adapter for Config {
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Adapter for Box<Config> {
    fn label(&self) -> String {
        format!("boxed {}", self.name)
    }
}

pub fn config(name: &str) -> Config {
    Config {
        name: name.to_string(),
    }
}

// ============================================================================
// Registries
// ============================================================================

/// The shape a test constructor returns its `Config` in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Produces {
    /// `Config`
    Value,
    /// `Box<Config>`
    Boxed,
    /// `Box<dyn Adapter>` holding a `Config`
    InterfaceValue,
    /// `Box<dyn Adapter>` holding a `Box<Config>`
    InterfaceBoxed,
}

impl Produces {
    pub const ALL: [Produces; 4] = [
        Produces::Value,
        Produces::Boxed,
        Produces::InterfaceValue,
        Produces::InterfaceBoxed,
    ];
}

pub const KINDS: [&str; 3] = ["hello1", "hello2", "hello3"];

/// Registry with `Config` and `Box<Config>` declared as `Adapter`s.
pub fn adapter_registry() -> Registry {
    let registry = Registry::new();
    registry
        .implement::<Config, dyn Adapter>(|c| c)
        .expect("declare Config as Adapter");
    registry
        .implement::<Box<Config>, dyn Adapter>(|c| c)
        .expect("declare Box<Config> as Adapter");
    registry
}

/// Register `hello1..hello3`, each building `Config { name: kind }` in the given shape.
pub fn registry_with(produces: Produces) -> Registry {
    let registry = adapter_registry();
    for kind in KINDS {
        let result = match produces {
            Produces::Value => registry.register(
                kind,
                |name: String, _raw: Vec<u8>| -> Result<Config, BoxError> { Ok(Config { name }) },
            ),
            Produces::Boxed => registry.register(
                kind,
                |name: String, _raw: Vec<u8>| -> Result<Box<Config>, BoxError> {
                    Ok(Box::new(Config { name }))
                },
            ),
            Produces::InterfaceValue => registry.register(
                kind,
                |name: String, _raw: Vec<u8>| -> Result<Box<dyn Adapter>, BoxError> {
                    Ok(Box::new(Config { name }))
                },
            ),
            Produces::InterfaceBoxed => registry.register(
                kind,
                |name: String, _raw: Vec<u8>| -> Result<Box<dyn Adapter>, BoxError> {
                    let boxed: Box<Config> = Box::new(Config { name });
                    Ok(Box::new(boxed))
                },
            ),
        };
        result.expect("register test kind");
    }
    registry
}
