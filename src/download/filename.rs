//! File-name sanitization and URL-derived fallback names.

use tracing::debug;
use url::Url;

/// Replaces path separators, control characters, and other filesystem-hostile
/// characters with underscores, collapsing runs and trimming the edges.
///
/// An input consisting only of hostile characters sanitizes to the empty
/// string; callers treat that as an invalid file name.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in name.chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches('_').trim().to_string()
}

/// Derives a file name from the URL's last non-empty path segment,
/// percent-decoded and sanitized. Returns `None` when the URL has no usable
/// segment (e.g. a bare host).
#[must_use]
pub fn file_name_from_url(url: &Url) -> Option<String> {
    let last = url.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let decoded = urlencoding::decode(last).unwrap_or_else(|e| {
        debug!(segment = %last, error = %e, "URL decoding failed, using raw segment");
        last.into()
    });
    let name = sanitize_file_name(&decoded);
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_name_unchanged() {
        assert_eq!(sanitize_file_name("report 2024.pdf"), "report 2024.pdf");
    }

    #[test]
    fn test_sanitize_strips_path_separators() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert!(!sanitize_file_name("a/b\\c.pdf").contains('/'));
        assert!(!sanitize_file_name("a/b\\c.pdf").contains('\\'));
    }

    #[test]
    fn test_sanitize_collapses_runs_and_trims() {
        assert_eq!(sanitize_file_name("a???b"), "a_b");
        assert_eq!(sanitize_file_name("::name::"), "name");
    }

    #[test]
    fn test_sanitize_hostile_only_input_is_empty() {
        assert_eq!(sanitize_file_name("///"), "");
        assert_eq!(sanitize_file_name(""), "");
    }

    #[test]
    fn test_file_name_from_url_last_segment() {
        let url = Url::parse("https://example.com/docs/paper.pdf").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "paper.pdf");
    }

    #[test]
    fn test_file_name_from_url_percent_decoded() {
        let url = Url::parse("https://example.com/my%20paper.pdf").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "my paper.pdf");
    }

    #[test]
    fn test_file_name_from_url_ignores_trailing_slash() {
        let url = Url::parse("https://example.com/docs/archive/").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "archive");
    }

    #[test]
    fn test_file_name_from_url_bare_host_is_none() {
        let url = Url::parse("https://example.com/").unwrap();
        assert!(file_name_from_url(&url).is_none());
    }
}
