//! Downloadability probe.
//!
//! Before committing a registry slot and a full transfer to a URL, the
//! engine issues a minimal range request (`Range: bytes=0-0`) and classifies
//! the response. This keeps URLs that resolve to HTML landing pages or error
//! bodies from ever becoming tasks. The probe is advisory: a server may
//! behave differently between the probe and the real transfer, and that race
//! is accepted.

use std::time::Duration;

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, RANGE};
use tracing::debug;
use url::Url;

use super::client::HttpClient;
use super::constants::PROBE_TIMEOUT_SECS;

/// Range header value requesting only the first byte.
const PROBE_RANGE: &str = "bytes=0-0";

/// Content-Type prefixes accepted as downloadable.
const ACCEPTED_TYPE_PREFIXES: [&str; 4] = ["application/", "image/", "video/", "audio/"];

/// Probes `url` and reports whether it looks fetchable.
///
/// Never errors: any transport failure classifies as not downloadable.
pub(crate) async fn is_downloadable(client: &HttpClient, url: &Url, headers: &HeaderMap) -> bool {
    let request = client
        .inner()
        .get(url.clone())
        .headers(headers.clone())
        .header(RANGE, PROBE_RANGE)
        .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS));

    match request.send().await {
        Ok(response) => {
            let status = response.status().as_u16();
            let accepted = classify_response(status, response.headers());
            debug!(%url, status, accepted, "probe response classified");
            accepted
        }
        Err(error) => {
            debug!(%url, %error, "probe request failed");
            false
        }
    }
}

/// Pure classification of a probe response.
///
/// Accepts when the status is 200/206 and either the resource announces
/// itself as an attachment, carries a binary-ish content type, or has a
/// positive `Content-Length`.
#[must_use]
pub fn classify_response(status: u16, headers: &HeaderMap) -> bool {
    if status != 200 && status != 206 {
        return false;
    }

    if headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("attachment"))
    {
        return true;
    }

    if let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        if ACCEPTED_TYPE_PREFIXES
            .iter()
            .any(|prefix| content_type.starts_with(prefix))
        {
            return true;
        }
    }

    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .is_some_and(|len| len > 0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                reqwest::header::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                value.parse().unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_rejects_error_status() {
        let h = headers(&[("Content-Type", "application/pdf")]);
        assert!(!classify_response(404, &h));
        assert!(!classify_response(500, &h));
        assert!(!classify_response(301, &h));
    }

    #[test]
    fn test_accepts_200_and_206() {
        let h = headers(&[("Content-Type", "application/pdf")]);
        assert!(classify_response(200, &h));
        assert!(classify_response(206, &h));
    }

    #[test]
    fn test_accepts_attachment_disposition_regardless_of_type() {
        let h = headers(&[
            ("Content-Disposition", "attachment; filename=\"a.html\""),
            ("Content-Type", "text/html"),
        ]);
        assert!(classify_response(200, &h));
    }

    #[test]
    fn test_accepts_binary_content_type_prefixes() {
        for content_type in [
            "application/octet-stream",
            "image/png",
            "video/mp4",
            "audio/mpeg",
        ] {
            let h = headers(&[("Content-Type", content_type)]);
            assert!(classify_response(200, &h), "should accept {content_type}");
        }
    }

    #[test]
    fn test_rejects_html_without_length() {
        let h = headers(&[("Content-Type", "text/html")]);
        assert!(!classify_response(200, &h));
    }

    #[test]
    fn test_accepts_positive_content_length_fallback() {
        let h = headers(&[("Content-Type", "text/html"), ("Content-Length", "1024")]);
        assert!(classify_response(200, &h));
    }

    #[test]
    fn test_rejects_zero_or_garbage_content_length() {
        let h = headers(&[("Content-Length", "0")]);
        assert!(!classify_response(200, &h));

        let h = headers(&[("Content-Length", "not-a-number")]);
        assert!(!classify_response(200, &h));
    }

    #[test]
    fn test_rejects_bare_response() {
        assert!(!classify_response(200, &HeaderMap::new()));
    }
}
