//! Persistent client session: cookies, request headers and proxy
//!
//! Cookies are captured from `Set-Cookie` responses through a
//! [`reqwest::cookie::CookieStore`] implementation so the whole state can be
//! written to a JSON file and restored by a later process.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use cookie::Cookie;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Auto24Error, Result};
use crate::proxy::Proxy;

/// A cookie as kept in the session file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    /// Set when the server sent no `Domain` attribute
    #[serde(default)]
    pub host_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl StoredCookie {
    /// Parse a `Set-Cookie` header received from `url`.
    /// Returns `None` for malformed headers and foreign domains.
    pub fn parse_set_cookie(header: &str, url: &Url) -> Option<Self> {
        let host = url.host_str()?.to_lowercase();
        let parsed = Cookie::parse(header).ok()?;
        if parsed.name().is_empty() {
            return None;
        }

        let domain = parsed
            .domain()
            .map(|d| d.trim_start_matches('.').to_lowercase())
            .filter(|d| !d.is_empty());
        let (domain, host_only) = match domain {
            Some(domain) => {
                // single-label domains such as "ch" are public suffixes
                if !domain_matches(&host, &domain) || (domain != host && !domain.contains('.')) {
                    return None;
                }
                (domain, false)
            }
            None => (host, true),
        };

        let path = parsed
            .path()
            .filter(|p| p.starts_with('/'))
            .map(str::to_string)
            .unwrap_or_else(|| default_path(url));

        // Max-Age wins over Expires
        let expires = match parsed.max_age().map(|age| age.whole_seconds()) {
            Some(secs) if secs <= 0 => Some(DateTime::<Utc>::MIN_UTC),
            Some(secs) => {
                ChronoDuration::try_seconds(secs).and_then(|d| Utc::now().checked_add_signed(d))
            }
            None => parsed
                .expires_datetime()
                .and_then(|at| DateTime::<Utc>::from_timestamp(at.unix_timestamp(), 0)),
        };

        Some(StoredCookie {
            name: parsed.name().to_string(),
            value: parsed.value_trimmed().to_string(),
            domain,
            path,
            secure: parsed.secure().unwrap_or(false),
            host_only,
            expires,
        })
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|e| e <= now)
    }

    /// Whether this cookie should be sent with a request to `url`
    pub fn matches(&self, url: &Url, now: DateTime<Utc>) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_lowercase();

        let domain_ok = if self.host_only {
            host == self.domain
        } else {
            domain_matches(&host, &self.domain)
        };

        domain_ok
            && path_matches(url.path(), &self.path)
            && (!self.secure || url.scheme() == "https")
            && !self.is_expired(now)
    }

    fn same_slot(&self, other: &StoredCookie) -> bool {
        self.name == other.name && self.domain == other.domain && self.path == other.path
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    host == domain
        || (host.ends_with(domain) && host[..host.len() - domain.len()].ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => path[..idx].to_string(),
    }
}

/// Thread-safe cookie jar handed to the HTTP client
#[derive(Debug, Default)]
pub struct SessionCookies {
    cookies: RwLock<Vec<StoredCookie>>,
}

impl SessionCookies {
    pub fn new(cookies: Vec<StoredCookie>) -> Self {
        Self {
            cookies: RwLock::new(cookies),
        }
    }

    pub fn insert(&self, cookie: StoredCookie) {
        if let Ok(mut jar) = self.cookies.write() {
            jar.retain(|existing| !existing.same_slot(&cookie));
            if !cookie.is_expired(Utc::now()) {
                jar.push(cookie);
            }
        }
    }

    /// Non-expired cookies
    pub fn snapshot(&self) -> Vec<StoredCookie> {
        let now = Utc::now();
        self.cookies
            .read()
            .map(|jar| jar.iter().filter(|c| !c.is_expired(now)).cloned().collect())
            .unwrap_or_default()
    }
}

impl CookieStore for SessionCookies {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        for header in cookie_headers {
            let Ok(raw) = header.to_str() else {
                continue;
            };
            match StoredCookie::parse_set_cookie(raw, url) {
                Some(cookie) => {
                    debug!(name = %cookie.name, domain = %cookie.domain, "storing cookie");
                    self.insert(cookie);
                }
                None => debug!(header = raw, "ignoring unusable Set-Cookie header"),
            }
        }
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let now = Utc::now();
        let jar = self.cookies.read().ok()?;
        let header = jar
            .iter()
            .filter(|c| c.matches(url, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ");
        if header.is_empty() {
            return None;
        }
        HeaderValue::from_str(&header).ok()
    }
}

/// On-disk form of a [`ClientSession`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub proxy: Option<Proxy>,
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,
}

/// Cookies, headers and proxy reused across requests
#[derive(Debug, Clone)]
pub struct ClientSession {
    headers: BTreeMap<String, String>,
    proxy: Option<Proxy>,
    cookies: Arc<SessionCookies>,
}

impl ClientSession {
    pub fn new(headers: BTreeMap<String, String>, proxy: Option<Proxy>) -> Self {
        Self {
            headers,
            proxy,
            cookies: Arc::new(SessionCookies::default()),
        }
    }

    pub fn from_state(state: SessionState) -> Self {
        Self {
            headers: state.headers,
            proxy: state.proxy,
            cookies: Arc::new(SessionCookies::new(state.cookies)),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            headers: self.headers.clone(),
            proxy: self.proxy.clone(),
            cookies: self.cookies.snapshot(),
        }
    }

    /// Read a saved session. `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let state: SessionState = serde_json::from_str(&content).map_err(|e| {
            Auto24Error::Session(format!("cannot parse {}: {}", path.display(), e))
        })?;
        info!(
            path = %path.display(),
            cookies = state.cookies.len(),
            "loaded saved session"
        );
        Ok(Some(Self::from_state(state)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.state())?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "session saved");
        Ok(())
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn set_headers(&mut self, headers: BTreeMap<String, String>) {
        self.headers = headers;
    }

    pub fn proxy(&self) -> Option<&Proxy> {
        self.proxy.as_ref()
    }

    pub fn set_proxy(&mut self, proxy: Option<Proxy>) {
        self.proxy = proxy;
    }

    pub fn cookies(&self) -> Vec<StoredCookie> {
        self.cookies.snapshot()
    }

    pub fn add_cookie(&self, cookie: StoredCookie) {
        self.cookies.insert(cookie);
    }

    /// Build an HTTP client that shares this session's cookie jar.
    /// Headers are not baked in; they are sent per request.
    pub fn build_http_client(&self, timeout: Duration) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&self.cookies))
            .redirect(reqwest::redirect::Policy::limited(10))
            .timeout(timeout);

        if let Some(ref proxy) = self.proxy {
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        Ok(builder.build()?)
    }
}
