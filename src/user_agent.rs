//! Default User-Agent for outgoing requests.
//!
//! Single source for the project URL and UA format so probe and transfer
//! traffic stay consistent and easy to update (good citizenship; RFC 9308).

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/filefetch/filefetch";

/// Default User-Agent attached to probe and transfer requests.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("filefetch/{version} (+{PROJECT_UA_URL})")
}
