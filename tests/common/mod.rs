//! Shared fixtures for the client integration tests

use auto24_api::Auto24Config;
use tempfile::TempDir;

/// Listing page carrying the initial-state payload
#[allow(dead_code)]
pub fn listing_page(state_js: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <title>Voitures d'occasion | AutoScout24</title>
</head>
<body>
    <div id="app"></div>
    <script>window.dataLayer = [];</script>
    <script id="initial-state">{}</script>
</body>
</html>"#,
        state_js
    )
}

/// A normal page without the initial-state script
#[allow(dead_code)]
pub fn page_without_payload() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>AutoScout24</title></head>
<body><div id="app">Chargement...</div></body>
</html>"#
        .to_string()
}

#[allow(dead_code)]
pub fn captcha_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Anti-Bot Captcha</title></head>
<body><div id="captcha"><div class="g-recaptcha"></div></div></body>
</html>"#
        .to_string()
}

#[allow(dead_code)]
pub const SAMPLE_STATE: &str = r#"window.INITIAL_STATE = {"search":{"stats":{"count":5}},"searchResults":[{"id":1}]};"#;

/// Config pointing at the mock server, with no waiting and all files in `tmp`
#[allow(dead_code)]
pub fn test_config(base_url: &str, tmp: &TempDir) -> Auto24Config {
    Auto24Config {
        base_url: base_url.to_string(),
        wait_range: vec![0.0, 0.0],
        max_retries: 3,
        tmp_dir: tmp.path().to_path_buf(),
        diagnostic_path: tmp.path().join("out.html"),
        ..Default::default()
    }
}
