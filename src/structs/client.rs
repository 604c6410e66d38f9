use std::time::Duration;

use reqwest::blocking::RequestBuilder;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use tracing::{debug, info, warn};

use super::{Credential, SessionToken, Studio};
use crate::errors::LinkError;
use crate::v1::{self, Envelope, LoginBody, TokenResult, UserResult};

pub const DEFAULT_BASE_URL: &str = "https://userapi.gameanalytics.com";
pub const USER_AGENT: &str = "GameAnalyticsLinkClient/1.0";
pub const DEFAULT_CALLER: &str = "UnrealEditor";
pub const DEFAULT_CALLER_VERSION: &str = "1.0.0";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// The user API expects this content type even though the login body is JSON.
const LOGIN_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Options for the user API client. Pass this into `ApiClient::new()`.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Scheme and host of the user API, without a trailing path.
    pub base_url: String,
    /// Sent as `X-Caller`.
    pub caller: String,
    /// Sent as `X-Caller-Version`.
    pub caller_version: String,
    /// Sent as `X-Caller-Platform`.
    pub caller_platform: String,
    /// Upper bound for a single request. A timed-out request counts as a transport failure.
    pub timeout: Duration,
    /// Log every request and outcome at info level instead of debug.
    pub debug: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            caller: DEFAULT_CALLER.to_string(),
            caller_version: DEFAULT_CALLER_VERSION.to_string(),
            caller_platform: host_platform().to_string(),
            timeout: DEFAULT_TIMEOUT,
            debug: false,
        }
    }
}

impl ClientOptions {
    /// Defaults, overridden by `GA_LINK_BASE_URL` and `GA_LINK_TIMEOUT_SECS` when set.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Ok(url) = std::env::var("GA_LINK_BASE_URL") {
            options.base_url = url;
        }

        if let Ok(secs) = std::env::var("GA_LINK_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => options.timeout = Duration::from_secs(secs),
                Err(_) => warn!(value = %secs, "ignoring invalid GA_LINK_TIMEOUT_SECS"),
            }
        }

        options
    }
}

/// Platform name reported in `X-Caller-Platform`.
pub fn host_platform() -> &'static str {
    match std::env::consts::OS {
        "windows" => "Windows",
        "macos" => "Mac",
        "linux" => "Linux",
        other => other,
    }
}

/// Blocking client for the two user API calls.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::blocking::Client,
    base_url: Url,
    options: ClientOptions,
}

impl ApiClient {
    pub fn new(options: ClientOptions) -> Result<Self, LinkError> {
        let base_url = Url::parse(&options.base_url)
            .map_err(|e| LinkError::InvalidBaseUrl(format!("{}: {}", options.base_url, e)))?;

        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(options.timeout)
            .build()
            .map_err(|e| LinkError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            options,
        })
    }

    /// Exchanges a credential for a session token.
    pub fn request_token(&self, credential: &Credential) -> Result<SessionToken, LinkError> {
        let body = serde_json::to_string(&LoginBody {
            email: &credential.email,
            password: credential.password(),
        })
        .map_err(|e| LinkError::Decode(e.to_string()))?;

        let request = self
            .http
            .post(self.endpoint(v1::TOKEN_PATH)?)
            .body(body);

        let result: TokenResult = self
            .execute("login", self.with_caller_headers(request))?
            .first_result()?;

        Ok(SessionToken::new(result.token))
    }

    /// Fetches the studios and games visible to the token's account.
    pub fn fetch_studios(&self, token: &SessionToken) -> Result<Vec<Studio>, LinkError> {
        let request = self
            .http
            .get(self.endpoint(v1::USER_PATH)?)
            .header("X-Authorization", token.as_str());

        let result: UserResult = self
            .execute("fetch organization", self.with_caller_headers(request))?
            .first_result()?;

        Ok(result.studios)
    }

    fn endpoint(&self, path: &str) -> Result<Url, LinkError> {
        self.base_url
            .join(path)
            .map_err(|e| LinkError::InvalidBaseUrl(e.to_string()))
    }

    fn with_caller_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(CONTENT_TYPE, LOGIN_CONTENT_TYPE)
            .header("X-Caller", &self.options.caller)
            .header("X-Caller-Version", &self.options.caller_version)
            .header("X-Caller-Platform", &self.options.caller_platform)
    }

    fn execute(&self, step: &str, request: RequestBuilder) -> Result<Envelope, LinkError> {
        if self.options.debug {
            info!(step, "sending user API request");
        } else {
            debug!(step, "sending user API request");
        }

        let response = request.send().map_err(|e| {
            warn!(step, error = %e, "user API request failed");
            LinkError::Transport(e.to_string())
        })?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| LinkError::Transport(e.to_string()))?;

        if self.options.debug {
            info!(step, status = status.as_u16(), "user API responded");
        } else {
            debug!(step, status = status.as_u16(), "user API responded");
        }

        v1::read_envelope(status, &body)
    }
}
