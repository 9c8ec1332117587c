//! Credential exchange against the cabinet API.
//!
//! Sign-in never fails loudly: every failure mode yields `None`. Requests made
//! without a token are rejected by the API and surface as ordinary per-item
//! failures downstream.

use crate::config::Config;
use crate::urls::Subdomain;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;

const SIGNIN_PATH: &str = "api/v1/signin/new/";

/// A session token issued by the cabinet API. Held in memory only.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value of the `authorization` header carrying this token.
    pub fn header_value(&self) -> String {
        format!("Token {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Debug, Deserialize)]
struct SigninResponse {
    token: Option<String>,
}

/// Exchanges the configured credentials for an access token.
///
/// Returns `None` on transport failure, a non-success status, an undecodable
/// body or a body without a `token` field. No retry is attempted.
pub async fn sign_in(http: &Client, config: &Config) -> Option<AccessToken> {
    let url = config.url(Subdomain::Cabinet, SIGNIN_PATH);
    let credentials = config.credentials();

    let response = match http
        .post(&url)
        .form(&[
            ("username", credentials.username()),
            ("password", credentials.password()),
        ])
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!("Sign-in request to {} failed: {}", url, e);
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!("Sign-in to {} rejected with status {}", url, status);
        return None;
    }

    match response.json::<SigninResponse>().await {
        Ok(SigninResponse { token: Some(token) }) => {
            info!("Signed in as {}", credentials.username());
            Some(AccessToken(token))
        }
        Ok(SigninResponse { token: None }) => {
            warn!("Sign-in response from {} carried no token", url);
            None
        }
        Err(e) => {
            warn!("Failed to decode sign-in response from {}: {}", url, e);
            None
        }
    }
}
