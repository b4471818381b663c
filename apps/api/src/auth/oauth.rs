//! Authorization URLs for the supported OAuth providers. The provider name
//! doubles as the `state` parameter so the callback knows who answered.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    Apple,
    Linkedin,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::Apple => "apple",
            OAuthProvider::Linkedin => "linkedin",
        }
    }

    fn authorize_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            OAuthProvider::Apple => "https://appleid.apple.com/auth/authorize",
            OAuthProvider::Linkedin => "https://www.linkedin.com/oauth/v2/authorization",
        }
    }

    fn scope(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "openid email profile",
            OAuthProvider::Apple => "name email",
            OAuthProvider::Linkedin => "r_liteprofile r_emailaddress",
        }
    }
}

/// Client ids per provider. A provider without an id cannot be used.
#[derive(Debug, Clone, Default)]
pub struct OAuthConfig {
    pub google_client_id: Option<String>,
    pub apple_client_id: Option<String>,
    pub linkedin_client_id: Option<String>,
}

impl OAuthConfig {
    fn client_id(&self, provider: OAuthProvider) -> Option<&str> {
        match provider {
            OAuthProvider::Google => self.google_client_id.as_deref(),
            OAuthProvider::Apple => self.apple_client_id.as_deref(),
            OAuthProvider::Linkedin => self.linkedin_client_id.as_deref(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum OAuthError {
    #[error("No client id configured for {0}")]
    MissingClientId(&'static str),

    #[error("Invalid authorization URL: {0}")]
    InvalidUrl(String),
}

pub fn build_oauth_url(
    provider: OAuthProvider,
    redirect_uri: &str,
    config: &OAuthConfig,
) -> Result<String, OAuthError> {
    let client_id = config
        .client_id(provider)
        .ok_or(OAuthError::MissingClientId(provider.as_str()))?;

    let mut params = vec![
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
        ("response_type", "code"),
        ("scope", provider.scope()),
    ];
    // Apple posts the code back instead of redirecting with a query string.
    if provider == OAuthProvider::Apple {
        params.push(("response_mode", "form_post"));
    }
    params.push(("state", provider.as_str()));

    let url = Url::parse_with_params(provider.authorize_endpoint(), &params)
        .map_err(|e| OAuthError::InvalidUrl(e.to_string()))?;
    Ok(url.to_string())
}
