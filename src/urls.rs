//! URL construction for the Egistic front-ends.
//!
//! The platform exposes several services under one base domain, each on its own
//! subdomain (`cabinet` for the REST API, `geo` for GeoServer, ...). Routing is a
//! pure function of the domain, the subdomain and the path.

use std::fmt;

/// Base domain of the Egistic platform.
pub const EGISTIC_DOMAIN: &str = "egistic.kz";

/// The service front-end a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subdomain {
    Geo,
    Nuxt,
    Login,
    Cabinet,
    /// The bare domain, without any prefix.
    None,
}

impl Subdomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subdomain::Geo => "geo",
            Subdomain::Nuxt => "nuxt",
            Subdomain::Login => "login",
            Subdomain::Cabinet => "cabinet",
            Subdomain::None => "",
        }
    }
}

impl fmt::Display for Subdomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds an `https` URL for `path` on the given subdomain of `domain`.
///
/// A leading `/` on `path` is ignored, so `"api/v1/"` and `"/api/v1/"` resolve
/// to the same URL.
///
/// # Examples
///
/// ```
/// use egistic::{build_url, Subdomain};
///
/// assert_eq!(
///     build_url("egistic.kz", Subdomain::Cabinet, "api/v1/signin/new/"),
///     "https://cabinet.egistic.kz/api/v1/signin/new/"
/// );
/// assert_eq!(build_url("egistic.kz", Subdomain::None, "/"), "https://egistic.kz/");
/// ```
pub fn build_url(domain: &str, subdomain: Subdomain, path: &str) -> String {
    let path = path.trim_start_matches('/');
    match subdomain {
        Subdomain::None => format!("https://{}/{}", domain, path),
        sub => format!("https://{}.{}/{}", sub, domain, path),
    }
}

/// Joins `path` onto a fixed origin such as `http://127.0.0.1:8080`.
pub(crate) fn join_origin(origin: &str, path: &str) -> String {
    format!(
        "{}/{}",
        origin.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_with_subdomain() {
        assert_eq!(
            build_url(EGISTIC_DOMAIN, Subdomain::Geo, "geoserver/main/wms?service=WMS"),
            "https://geo.egistic.kz/geoserver/main/wms?service=WMS"
        );
        assert_eq!(
            build_url(EGISTIC_DOMAIN, Subdomain::Cabinet, "/api/v1/agrogis/farm/A/full-info/"),
            "https://cabinet.egistic.kz/api/v1/agrogis/farm/A/full-info/"
        );
    }

    #[test]
    fn test_build_url_without_subdomain() {
        assert_eq!(
            build_url("example.org", Subdomain::None, "index.html"),
            "https://example.org/index.html"
        );
    }

    #[test]
    fn test_build_url_is_pure() {
        // Routing to one subdomain never affects the next call.
        let geo = build_url(EGISTIC_DOMAIN, Subdomain::Geo, "a");
        let cabinet = build_url(EGISTIC_DOMAIN, Subdomain::Cabinet, "a");
        assert_eq!(geo, "https://geo.egistic.kz/a");
        assert_eq!(cabinet, "https://cabinet.egistic.kz/a");
        assert_eq!(build_url(EGISTIC_DOMAIN, Subdomain::Geo, "a"), geo);
    }

    #[test]
    fn test_join_origin_trims_slashes() {
        assert_eq!(
            join_origin("http://127.0.0.1:9000/", "/api/v1/signin/new/"),
            "http://127.0.0.1:9000/api/v1/signin/new/"
        );
    }

    #[test]
    fn test_subdomain_display() {
        assert_eq!(Subdomain::Login.to_string(), "login");
        assert_eq!(Subdomain::Nuxt.to_string(), "nuxt");
        assert_eq!(Subdomain::None.to_string(), "");
    }
}
