use regex::Regex;
use std::sync::LazyLock;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:http|ftp)s?://",
        // dotted DNS name
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]{2,}\.?)",
        r"|localhost",
        // dotted quad, syntax only
        r"|\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("URL pattern is valid")
});

/// Check whether `url` is a well-formed http(s) or ftp(s) URL.
///
/// Accepts a dotted host name, `localhost` or a dotted-quad IPv4 address,
/// an optional port, and an optional path or query. IPv4 octets are not
/// range-checked, so `http://999.999.999.999` passes.
pub fn is_valid_url(url: &str) -> bool {
    URL_PATTERN.is_match(url)
}
