use std::fmt;

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

pub mod client;
pub mod organization;
pub mod session;

/// Email and password for a single login attempt. Never persisted.
pub struct Credential {
    pub email: String,
    password: Secret<String>,
}

impl Credential {
    /// Creates a credential. The password is kept out of `Debug` output.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: Secret::new(password.into()),
        }
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Bearer token returned by the login call. Only valid for the fetch that follows it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a token returned by the login call.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, as sent in `X-Authorization`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// A game registered under a studio, with the two keys the runtime SDK needs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Game {
    pub name: String,
    pub id: i64,
    #[serde(rename = "key")]
    pub game_key: String,
    #[serde(rename = "secret")]
    pub secret_key: String,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("game_key", &self.game_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

/// A studio and its games, in the order the server returned them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Studio {
    pub name: String,
    pub id: i64,
    /// Absent in the response means the studio has no games.
    #[serde(default)]
    pub games: Vec<Game>,
}

impl Studio {
    /// Finds one of the studio's games by id.
    pub fn game(&self, id: i64) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }
}
