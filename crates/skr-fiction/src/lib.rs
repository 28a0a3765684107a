//! Session interpreter for Skroll scripts.
//!
//! A [`Session`] walks the beat graph of a built [`skr_core::Script`]: it
//! renders the current beat, lists its choices, and follows a chosen option
//! either to a declared beat or into an inline beat made from the option body.

/// Mapping free-form player input to a choice.
pub mod choice_input;
/// Session construction options.
pub mod config;
/// Error types for the session interpreter.
pub mod error;
/// The session state machine.
pub mod session;

pub use choice_input::resolve_choice;
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use session::{Beat, BeatId, Session, SessionChoice};
