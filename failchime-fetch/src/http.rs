//! HTTP client helper with native-tls support.

use crate::error::FetchError;
use std::time::Duration;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};
use url::Url;

/// Global timeout for a whole request, body included (30 seconds).
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const USER_AGENT: &str = concat!("failchime/", env!("CARGO_PKG_VERSION"));

/// Parse a download URL and check that its scheme is one we can fetch.
///
/// `http` uses a plain connection and `https` goes through TLS; anything
/// else (`file://`, `ftp://`, ...) is rejected before any network request.
pub fn parse_download_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    check_scheme(&parsed)?;
    Ok(parsed)
}

/// Reject URLs whose scheme is not `http` or `https`.
pub fn check_scheme(url: &Url) -> Result<(), FetchError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(FetchError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Create a new HTTP agent configured with native-tls and a global timeout.
///
/// Redirects are not followed and 4xx/5xx statuses are returned as
/// ordinary responses: the fetcher handles both itself.
pub fn agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .timeout_global(Some(HTTP_TIMEOUT))
        .max_redirects(0)
        .http_status_as_error(false)
        .build()
        .into()
}
