//! Wire format of the `/ext/v1` user API.
//!
//! Both endpoints answer with the same envelope:
//! `{"errors": [{"msg": ".."}], "results": [{..}]}`.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::LinkError;
use crate::structs::Studio;

pub const TOKEN_PATH: &str = "/ext/v1/token";
pub const USER_PATH: &str = "/ext/v1/user";

/// Body of the login request.
#[derive(Debug, Serialize)]
pub struct LoginBody<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// A server-side error entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub msg: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub results: Vec<Value>,
}

/// First result of a login response.
#[derive(Debug, Deserialize)]
pub struct TokenResult {
    pub token: String,
}

/// First result of a user response.
#[derive(Debug, Deserialize)]
pub struct UserResult {
    pub studios: Vec<Studio>,
}

impl Envelope {
    pub fn parse(body: &str) -> Result<Self, LinkError> {
        serde_json::from_str(body).map_err(|e| LinkError::Decode(e.to_string()))
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.msg.clone()).collect()
    }

    /// Decodes `results[0]` as `T`.
    pub fn first_result<T: DeserializeOwned>(self) -> Result<T, LinkError> {
        let first = self
            .results
            .into_iter()
            .next()
            .ok_or_else(|| LinkError::Decode("empty results list".to_string()))?;

        serde_json::from_value(first).map_err(|e| LinkError::Decode(e.to_string()))
    }
}

/// Classifies a received response.
///
/// A non-empty `errors` list is a rejection whatever the status. A non-success
/// status without parseable errors keeps the raw body for the user. A success
/// status with a body that is not an envelope is a decode failure.
pub fn read_envelope(status: StatusCode, body: &str) -> Result<Envelope, LinkError> {
    match Envelope::parse(body) {
        Ok(envelope) if !envelope.errors.is_empty() => Err(LinkError::Rejected {
            status: status.as_u16(),
            messages: envelope.messages(),
        }),
        Ok(envelope) if status.is_success() => Ok(envelope),
        Err(err) if status.is_success() => Err(err),
        _ => Err(LinkError::UnexpectedStatus {
            status: status.as_u16(),
            body: body.to_string(),
        }),
    }
}
