//! Link URL checks for the link tool's input.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Domain with a public-style suffix or a dotted-quad IPv4 address, with
/// optional scheme, port, path, query and fragment.
static URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^([a-z][a-z\d+.\-]*://)?",
        r"((([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}|((\d{1,3}\.){3}\d{1,3}))",
        r"(:\d+)?",
        r"(/[-a-z\d%_.~+]*)*",
        r"(\?[;&a-z\d%_.~+=-]*)?",
        r"(#[-a-z\d_]*)?$",
    ))
    .unwrap()
});

static SCHEME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\w+:").unwrap());

/// Whether `value` (already trimmed) can be used as a link target.
///
/// Root-relative, protocol-relative and fragment links are accepted as is.
pub fn is_valid_url(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    if value.starts_with('/') || value.starts_with('#') {
        return true;
    }
    URL_REGEX.is_match(value)
}

/// Trim and add `default_protocol` unless the link has a scheme or is
/// relative to the current page.
pub fn normalize_url(value: &str, default_protocol: &str) -> String {
    let value = value.trim();
    if SCHEME_REGEX.is_match(value) || value.starts_with('/') || value.starts_with('#') {
        return value.to_string();
    }
    format!("{}{}", default_protocol, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_domains_and_addresses() {
        for url in [
            "example.com",
            "sub.example.co.uk",
            "https://example.com/path/to?q=1&b=2#frag",
            "HTTP://EXAMPLE.COM",
            "192.168.0.1:8080/admin",
            "ftp://files.example.org",
        ] {
            assert!(is_valid_url(url), "{url} should be valid");
        }
    }

    #[test]
    fn test_accepts_relative_links() {
        assert!(is_valid_url("/internal/path"));
        assert!(is_valid_url("//cdn.example.com/lib.js"));
        assert!(is_valid_url("#section"));
    }

    #[test]
    fn test_rejects_garbage() {
        for url in [
            "not a url with spaces",
            "example",
            "localhost",
            "http://",
            "exa mple.com",
            "",
        ] {
            assert!(!is_valid_url(url), "{url} should be invalid");
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_url("example.com", "https://"), "https://example.com");
        assert_eq!(normalize_url("  example.com ", "https://"), "https://example.com");
        assert_eq!(normalize_url("http://example.com", "https://"), "http://example.com");
        assert_eq!(normalize_url("mailto:me@example.com", "https://"), "mailto:me@example.com");
        assert_eq!(normalize_url("/internal/path", "https://"), "/internal/path");
        assert_eq!(normalize_url("//cdn.example.com", "https://"), "//cdn.example.com");
        assert_eq!(normalize_url("#section", "https://"), "#section");
    }
}
