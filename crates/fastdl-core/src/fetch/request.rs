//! Request URL construction.

use crate::error::FetchError;

/// Joins `base_url` and `rel_path`, escaping spaces and nothing else.
/// Anything but `http` is refused.
pub fn request_url(base_url: &str, rel_path: &str) -> Result<String, FetchError> {
    require_http(format!("{base_url}{rel_path}").replace(' ', "%20"))
}

/// Checks a redirect target announced by the origin. Only `http` is followed.
pub fn redirect_target(location: &str) -> Result<String, FetchError> {
    require_http(location.to_string())
}

fn require_http(url: String) -> Result<String, FetchError> {
    let parsed = url::Url::parse(&url).map_err(|e| FetchError::BadUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;
    if parsed.scheme() != "http" {
        return Err(FetchError::BadUrl {
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
            url,
        });
    }
    Ok(url)
}
