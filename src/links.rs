use crate::errors::LinkError;

pub const DOCUMENTATION_URL: &str = "http://support.gameanalytics.com";
pub const SIGNUP_URL: &str = "https://go.gameanalytics.com/signup";

/// Pages offered next to the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Documentation,
    Signup,
}

impl Link {
    pub fn url(self) -> &'static str {
        match self {
            Link::Documentation => DOCUMENTATION_URL,
            Link::Signup => SIGNUP_URL,
        }
    }
}

/// Opens the page in the user's default browser.
pub fn open_link(link: Link) -> Result<(), LinkError> {
    tracing::debug!(url = link.url(), "opening browser");
    open::that(link.url()).map_err(|_| LinkError::OpenFailed(link.url().to_string()))
}
