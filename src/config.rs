//! Run configuration, built once at process start and passed down by reference.

use crate::urls::{build_url, join_origin, Subdomain, EGISTIC_DOMAIN};
use bon::bon;
use std::fmt;
use std::path::{Path, PathBuf};

/// Number of farm records fetched simultaneously unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Username and password exchanged for an access token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings shared by every stage of the pipeline.
///
/// # Examples
///
/// ```
/// use egistic::{Config, Credentials, Subdomain};
///
/// let config = Config::builder()
///     .credentials(Credentials::new("alice", "secret"))
///     .base_dir("/tmp/egistic")
///     .build();
///
/// assert_eq!(config.concurrency(), 10);
/// assert_eq!(
///     config.url(Subdomain::Cabinet, "api/v1/signin/new/"),
///     "https://cabinet.egistic.kz/api/v1/signin/new/"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    credentials: Credentials,
    domain: String,
    base_dir: PathBuf,
    concurrency: usize,
    origin: Option<String>,
    accept_invalid_certs: bool,
    show_progress: bool,
}

#[bon]
impl Config {
    /// Creates a configuration. Unset options fall back to the platform defaults:
    /// the `egistic.kz` domain, the current directory as data root and ten
    /// concurrent farm requests.
    ///
    /// `origin` routes every subdomain to one fixed origin (for example a local
    /// mirror at `http://127.0.0.1:8080`) instead of `https://<sub>.<domain>`.
    #[builder]
    pub fn new(
        credentials: Credentials,
        #[builder(into)] domain: Option<String>,
        #[builder(into)] base_dir: Option<PathBuf>,
        concurrency: Option<usize>,
        #[builder(into)] origin: Option<String>,
        accept_invalid_certs: Option<bool>,
        show_progress: Option<bool>,
    ) -> Self {
        Self {
            credentials,
            domain: domain.unwrap_or_else(|| EGISTIC_DOMAIN.to_string()),
            base_dir: base_dir.unwrap_or_else(|| PathBuf::from(".")),
            // A zero-width pool would never make progress.
            concurrency: concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
            origin,
            accept_invalid_certs: accept_invalid_certs.unwrap_or(false),
            show_progress: show_progress.unwrap_or(false),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Whether the layer and farm stages draw progress bars on stderr.
    pub fn show_progress(&self) -> bool {
        self.show_progress
    }

    /// Resolves `path` on `subdomain`, honouring the origin override.
    pub fn url(&self, subdomain: Subdomain, path: &str) -> String {
        match &self.origin {
            Some(origin) => join_origin(origin, path),
            None => build_url(&self.domain, subdomain, path),
        }
    }
}
