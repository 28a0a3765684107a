//! Core types for Skroll: the script model that the DSL builds and the
//! session interpreter walks.
//!
//! This crate is independent of the parser. A [`Script`] can be built by
//! `skr-dsl`, constructed programmatically, or deserialized from JSON.

/// Error types used throughout the crate.
pub mod error;
/// Source positions, ranges, and offset-to-line conversion.
pub mod position;
/// The script model: nodes, choices, and actions.
pub mod script;

/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export position types.
pub use position::{LineIndex, SourcePosition, SourceRange};
/// Re-export script model types.
pub use script::{Action, Choice, Node, NodeKind, Script};
