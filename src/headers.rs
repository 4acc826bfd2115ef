//! Browser-like request headers
//!
//! Emulates a desktop Chrome on macOS. Every call draws a new combination of
//! browser build, OS version and optional headers so that a regenerated set
//! does not match the previous one byte for byte.

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;
use tracing::warn;

use crate::locale::Locale;

static CHROME_BUILDS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "120.0.0.0",
        "121.0.0.0",
        "122.0.0.0",
        "123.0.0.0",
        "124.0.0.0",
        "125.0.0.0",
        "126.0.0.0",
    ]
});

static MACOS_VERSIONS: &[&str] = &["10_15_7", "11_7_10", "12_7_4", "13_6_6", "14_4_1"];

static ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Generate a fresh header set for the given locale
pub fn generate_headers(locale: Locale) -> BTreeMap<String, String> {
    let mut rng = rand::thread_rng();

    let build = CHROME_BUILDS.choose(&mut rng).copied().unwrap_or("123.0.0.0");
    let macos = MACOS_VERSIONS.choose(&mut rng).copied().unwrap_or("10_15_7");
    let user_agent = format!(
        "Mozilla/5.0 (Macintosh; Intel Mac OS X {}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
        macos, build
    );
    let major = build.split('.').next().unwrap_or("123");

    let mut headers = BTreeMap::new();
    headers.insert("User-Agent".to_string(), user_agent);
    headers.insert("Accept".to_string(), ACCEPT.to_string());
    headers.insert("Accept-Language".to_string(), locale.accept_language().to_string());
    headers.insert("Upgrade-Insecure-Requests".to_string(), "1".to_string());
    headers.insert(
        "Sec-Ch-Ua".to_string(),
        format!(
            "\"Chromium\";v=\"{0}\", \"Google Chrome\";v=\"{0}\", \"Not-A.Brand\";v=\"99\"",
            major
        ),
    );
    headers.insert("Sec-Ch-Ua-Mobile".to_string(), "?0".to_string());
    headers.insert("Sec-Ch-Ua-Platform".to_string(), "\"macOS\"".to_string());
    headers.insert("Sec-Fetch-Dest".to_string(), "document".to_string());
    headers.insert("Sec-Fetch-Mode".to_string(), "navigate".to_string());
    headers.insert("Sec-Fetch-Site".to_string(), "none".to_string());
    headers.insert("Sec-Fetch-User".to_string(), "?1".to_string());

    if rng.gen_bool(0.5) {
        headers.insert("DNT".to_string(), "1".to_string());
    }
    if rng.gen_bool(0.5) {
        headers.insert("Cache-Control".to_string(), "max-age=0".to_string());
    }

    headers
}

/// Convert a header table into a `HeaderMap`, skipping invalid entries
pub fn to_header_map(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(header = %name, "skipping invalid request header"),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_headers_look_like_mac_chrome() {
        let headers = generate_headers(Locale::De);
        let ua = &headers["User-Agent"];
        assert!(ua.contains("Macintosh; Intel Mac OS X"));
        assert!(ua.contains("Chrome/"));
        assert_eq!(headers["Accept-Language"], Locale::De.accept_language());
        assert_eq!(headers["Sec-Ch-Ua-Platform"], "\"macOS\"");
    }

    #[test]
    fn test_generated_headers_convert_cleanly() {
        for locale in Locale::ALL {
            let headers = generate_headers(locale);
            let map = to_header_map(&headers);
            assert_eq!(map.len(), headers.len());
        }
    }

    #[test]
    fn test_invalid_headers_skipped() {
        let mut headers = BTreeMap::new();
        headers.insert("X-Good".to_string(), "ok".to_string());
        headers.insert("Bad Name".to_string(), "ok".to_string());
        headers.insert("X-Bad-Value".to_string(), "line\nbreak".to_string());
        let map = to_header_map(&headers);
        assert_eq!(map.len(), 1);
        assert_eq!(map["x-good"], "ok");
    }
}
