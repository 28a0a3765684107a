//! Error types for the session interpreter.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors raised while creating or advancing a session.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum SessionError {
    /// The script is not well-formed.
    #[error("Invalid runtime: {0}.")]
    #[diagnostic(code(skr::session::invalid_runtime))]
    InvalidRuntime(String),

    /// No top-level `story` declaration.
    #[error("Runtime does not contain a story declaration.")]
    #[diagnostic(
        code(skr::session::missing_story),
        help("declare `story <id>:` at the top level")
    )]
    MissingStory,

    /// The story has no scenes.
    #[error("Story does not declare any scenes.")]
    #[diagnostic(
        code(skr::session::no_scenes),
        help("add a `scene <id>:` block under the story")
    )]
    NoScenes,

    /// The configured starting scene is not declared.
    #[error("Starting scene \"{0}\" does not exist.")]
    #[diagnostic(code(skr::session::starting_scene_not_found))]
    StartingSceneNotFound(String),

    /// The starting scene has no beats.
    #[error("Scene \"{0}\" does not contain any beats.")]
    #[diagnostic(
        code(skr::session::scene_has_no_beats),
        help("add a `beat <id>:` block to the scene")
    )]
    SceneHasNoBeats(String),

    /// `choose` after the story ended.
    #[error("Cannot choose after the story has ended.")]
    #[diagnostic(code(skr::session::already_ended))]
    AlreadyEnded,

    /// The id matches no choice of the current beat.
    #[error("{}", unknown_choice(.choice, .beat, .available))]
    #[diagnostic(code(skr::session::unknown_choice))]
    UnknownChoice {
        /// The id that was asked for.
        choice: String,
        /// The current beat.
        beat: String,
        /// Ids that would have been accepted.
        available: Vec<String>,
    },

    /// The choice jumps to a beat that is not declared.
    #[error("Choice \"{label}\" from beat \"{beat}\" targets unknown beat \"{target}\".")]
    #[diagnostic(code(skr::session::unknown_target))]
    UnknownTarget {
        /// Label of the chosen option.
        label: String,
        /// The current beat.
        beat: String,
        /// The missing target.
        target: String,
    },

    /// The choice has neither a target nor an inline body.
    #[error("Choice \"{label}\" from beat \"{beat}\" does not specify a target beat.")]
    #[diagnostic(
        code(skr::session::missing_target),
        help("add `goto <beat>` or an indented body to the option")
    )]
    MissingTarget {
        /// Label of the chosen option.
        label: String,
        /// The current beat.
        beat: String,
    },
}

fn unknown_choice(choice: &str, beat: &str, available: &[String]) -> String {
    if available.is_empty() {
        format!("Beat \"{beat}\" does not have any choices.")
    } else {
        format!(
            "Choice \"{choice}\" is not available. Expected one of: {}.",
            available.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            SessionError::StartingSceneNotFound("mill".into()).to_string(),
            "Starting scene \"mill\" does not exist."
        );
        assert_eq!(
            SessionError::InvalidRuntime("bad range".into()).to_string(),
            "Invalid runtime: bad range."
        );
        assert_eq!(
            SessionError::MissingTarget {
                label: "Go".into(),
                beat: "x".into()
            }
            .to_string(),
            "Choice \"Go\" from beat \"x\" does not specify a target beat."
        );
    }

    #[test]
    fn unknown_choice_lists_ids() {
        let err = SessionError::UnknownChoice {
            choice: "z".into(),
            beat: "x".into(),
            available: vec!["a".into(), "b".into()],
        };
        assert_eq!(
            err.to_string(),
            "Choice \"z\" is not available. Expected one of: a, b."
        );
    }

    #[test]
    fn unknown_choice_without_choices() {
        let err = SessionError::UnknownChoice {
            choice: "z".into(),
            beat: "x".into(),
            available: Vec::new(),
        };
        assert_eq!(err.to_string(), "Beat \"x\" does not have any choices.");
    }

    #[test]
    fn diagnostic_codes() {
        let code = SessionError::NoScenes.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("skr::session::no_scenes"));
        assert!(SessionError::MissingStory.help().is_some());
    }
}
