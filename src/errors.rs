use thiserror::Error;

use crate::settings::Platform;

/// GameAnalytics link errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// The base URL provided in the client options could not be parsed.
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// No response was received: connection failure, TLS failure or timeout.
    #[error("Unable to process HTTP request: {0}")]
    Transport(String),

    /// The user API answered with a non-empty `errors` list.
    /// Each entry is the server's human-readable `msg`.
    #[error("{}", .messages.join("\n"))]
    Rejected { status: u16, messages: Vec<String> },

    /// The user API returned a non-success status and a body that is not an error envelope.
    #[error("Unexpected response ({status}): {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// A success response did not match the expected envelope.
    #[error("Failed to decode user API response: {0}")]
    Decode(String),

    /// A game was selected before any studio.
    #[error("No studio selected.")]
    NoStudioSelected,

    /// The game is not one of the selected studio's games.
    #[error("Game {game} does not belong to studio {studio}.")]
    GameNotInStudio { studio: i64, game: i64 },

    /// The game key is already stored for the other platform.
    #[error("This game's keys are already in use for {0}. You cannot use the same keys for different platforms.")]
    KeysInUse(Platform),

    /// Reading or writing the project settings file failed.
    #[error("Failed to access settings file {path}: {reason}")]
    Settings { path: String, reason: String },

    /// The browser could not be launched.
    #[error("Failed to open {0} in the browser.")]
    OpenFailed(String),
}

impl LinkError {
    /// Server messages, one per line, or the error text for every other variant.
    pub fn lines(&self) -> Vec<String> {
        match self {
            LinkError::Rejected { messages, .. } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}
