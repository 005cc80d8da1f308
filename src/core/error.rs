// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for kindcodec.
//!
//! One variant per failure class of the decode pipeline:
//! - Registration (constructor signature validation)
//! - Dispatch (unknown kinds, parameter binding, constructor failures)
//! - Structural decoding (syntax and shape mismatches)
//! - Result adaptation (interface and indirection failures)

use thiserror::Error;

/// Error type returned by constructors.
///
/// Any `std::error::Error + Send + Sync` converts into it, including
/// `anyhow::Error` and plain `String` messages.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while registering constructors or decoding documents.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Constructor rejected at registration time
    #[error("invalid constructor signature for kind '{kind}' ({signature}): {reason}")]
    InvalidConstructorSignature {
        /// Kind the constructor was registered under
        kind: String,
        /// Rendered constructor signature
        signature: String,
        /// Why the signature was rejected
        reason: String,
    },

    /// Discriminator names a kind that has no registered constructor
    #[error("kind '{kind}' is not registered (decoding {expected} at {path})")]
    KindNotRegistered {
        /// Kind found in the document
        kind: String,
        /// Destination type being decoded
        expected: String,
        /// Location in the document
        path: String,
    },

    /// Syntax error, empty fragment, or shape mismatch
    #[error("malformed input at {path}: {message} (input: {excerpt})")]
    MalformedInput {
        /// Location in the document
        path: String,
        /// What went wrong
        message: String,
        /// Quoted excerpt of the offending fragment
        excerpt: String,
    },

    /// A constructor parameter could not be bound
    #[error("cannot bind parameter {position} ({type_name}) of kind '{kind}': {reason}")]
    ParameterResolution {
        /// Kind being constructed
        kind: String,
        /// Zero-based parameter position
        position: usize,
        /// Declared parameter type
        type_name: String,
        /// Why binding failed
        reason: String,
    },

    /// The constructor itself returned an error
    #[error("kind '{kind}' failed to construct from {excerpt}: {source}")]
    ConstructorInvocation {
        /// Kind being constructed
        kind: String,
        /// Quoted excerpt of the fragment handed to the constructor
        excerpt: String,
        /// Error returned by the constructor
        #[source]
        source: BoxError,
    },

    /// The constructor returned neither a value nor an error
    #[error("constructor for kind '{kind}' returned no value")]
    ConstructorContractViolation {
        /// Kind being constructed
        kind: String,
    },

    /// Produced value does not implement the destination interface
    #[error("value of {produced} does not implement {interface} (at {path})")]
    InterfaceNotSatisfied {
        /// Dynamic type of the produced value
        produced: String,
        /// Destination interface
        interface: String,
        /// Location in the document
        path: String,
    },

    /// Produced value cannot reach the destination type through indirection
    #[error("cannot adapt value of {produced} to {expected} (at {path})")]
    CannotAdapt {
        /// Dynamic type of the produced value
        produced: String,
        /// Destination type
        expected: String,
        /// Location in the document
        path: String,
    },

    /// Tagged encoding failed
    #[error("encode error: {message}")]
    Encode {
        /// Error message
        message: String,
    },

    /// Invalid decoder configuration
    #[error("invalid decoder options: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Internal failure (poisoned locks and similar)
    #[error("internal error: {0}")]
    Internal(String),
}

impl CodecError {
    /// Create an invalid constructor signature error.
    pub fn invalid_signature(
        kind: impl Into<String>,
        signature: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CodecError::InvalidConstructorSignature {
            kind: kind.into(),
            signature: signature.into(),
            reason: reason.into(),
        }
    }

    /// Create a "kind not registered" error.
    pub fn kind_not_registered(
        kind: impl Into<String>,
        expected: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        CodecError::KindNotRegistered {
            kind: kind.into(),
            expected: expected.into(),
            path: path.into(),
        }
    }

    /// Create a malformed input error.
    pub fn malformed(
        path: impl Into<String>,
        message: impl Into<String>,
        excerpt: impl Into<String>,
    ) -> Self {
        CodecError::MalformedInput {
            path: path.into(),
            message: message.into(),
            excerpt: excerpt.into(),
        }
    }

    /// Create a parameter resolution error.
    pub fn parameter_resolution(
        kind: impl Into<String>,
        position: usize,
        type_name: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        CodecError::ParameterResolution {
            kind: kind.into(),
            position,
            type_name: type_name.into(),
            reason: reason.into(),
        }
    }

    /// Create an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        CodecError::Encode {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        CodecError::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        CodecError::Internal(message.into())
    }

    /// Whether this error is a result adaptation failure.
    pub fn is_type_adaptation(&self) -> bool {
        matches!(
            self,
            CodecError::InterfaceNotSatisfied { .. } | CodecError::CannotAdapt { .. }
        )
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            CodecError::InvalidConstructorSignature {
                kind,
                signature,
                reason,
            } => vec![
                ("kind", kind.clone()),
                ("signature", signature.clone()),
                ("reason", reason.clone()),
            ],
            CodecError::KindNotRegistered {
                kind,
                expected,
                path,
            } => vec![
                ("kind", kind.clone()),
                ("expected", expected.clone()),
                ("path", path.clone()),
            ],
            CodecError::MalformedInput {
                path,
                message,
                excerpt,
            } => vec![
                ("path", path.clone()),
                ("message", message.clone()),
                ("excerpt", excerpt.clone()),
            ],
            CodecError::ParameterResolution {
                kind,
                position,
                type_name,
                reason,
            } => vec![
                ("kind", kind.clone()),
                ("position", position.to_string()),
                ("type", type_name.clone()),
                ("reason", reason.clone()),
            ],
            CodecError::ConstructorInvocation {
                kind,
                excerpt,
                source,
            } => vec![
                ("kind", kind.clone()),
                ("excerpt", excerpt.clone()),
                ("cause", source.to_string()),
            ],
            CodecError::ConstructorContractViolation { kind } => vec![("kind", kind.clone())],
            CodecError::InterfaceNotSatisfied {
                produced,
                interface,
                path,
            } => vec![
                ("produced", produced.clone()),
                ("interface", interface.clone()),
                ("path", path.clone()),
            ],
            CodecError::CannotAdapt {
                produced,
                expected,
                path,
            } => vec![
                ("produced", produced.clone()),
                ("expected", expected.clone()),
                ("path", path.clone()),
            ],
            CodecError::Encode { message } | CodecError::Config { message } => {
                vec![("message", message.clone())]
            }
            CodecError::Internal(msg) => vec![("message", msg.clone())],
        }
    }
}

/// Result type for kindcodec operations.
pub type Result<T> = std::result::Result<T, CodecError>;
