//! HTML inspection and initial-state extraction
//!
//! Everything here is pure: it takes page text and returns data, so it can be
//! exercised against saved pages without touching the network.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::Result;

/// Exact `<title>` of the challenge page
pub const CAPTCHA_TITLE: &str = "Anti-Bot Captcha";

static CAPTCHA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#captcha").expect("static selector"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static selector"));
static INITIAL_STATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script#initial-state").expect("static selector"));
static ASSIGNMENT_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*window\.INITIAL_STATE\s*=\s*").expect("static regex"));

/// What a fetched page turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageKind {
    /// Anti-bot challenge page
    Captcha,
    /// Regular page without the initial-state script
    MissingPayload,
    /// Raw text of the initial-state script
    Payload(String),
}

/// Classify a response body. The captcha check wins over the payload.
pub fn classify_page(html: &str) -> PageKind {
    let document = Html::parse_document(html);
    if is_captcha_page(&document) {
        return PageKind::Captcha;
    }
    match initial_state_script(&document) {
        Some(script) => PageKind::Payload(script),
        None => PageKind::MissingPayload,
    }
}

/// A `div#captcha` container or the challenge `<title>`
pub fn is_captcha_page(document: &Html) -> bool {
    document.select(&CAPTCHA_SELECTOR).next().is_some()
        || document
            .select(&TITLE_SELECTOR)
            .any(|t| t.text().collect::<String>().trim() == CAPTCHA_TITLE)
}

/// Text of `<script id="initial-state">`, `None` if absent or empty
pub fn initial_state_script(document: &Html) -> Option<String> {
    document
        .select(&INITIAL_STATE_SELECTOR)
        .next()
        .map(|el| el.text().collect::<String>())
        // an empty script is treated as missing and retried, not parsed
        .filter(|text| !text.trim().is_empty())
}

/// Turn the initial-state script into JSON text.
///
/// Expects a single statement of the form
/// `window.INITIAL_STATE = <object literal>;` where the literal is JSON
/// except that `undefined` may stand in for a value. The assignment prefix
/// and trailing `;` are removed, and bare `undefined` tokens become `null`.
/// String contents and longer identifiers containing `undefined` are kept.
pub fn js_to_json(js: &str) -> String {
    let body = ASSIGNMENT_PREFIX.replace(js, "");
    let body = body.trim_end().trim_end_matches(';').trim_end();
    replace_undefined(body)
}

/// Parse the initial-state script into a JSON document
pub fn parse_initial_state(js: &str) -> Result<Value> {
    Ok(serde_json::from_str(&js_to_json(js))?)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn replace_undefined(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if c == '"' || c == '\'' {
            out.push(c);
            let mut escaped = false;
            for (_, s) in chars.by_ref() {
                out.push(s);
                if escaped {
                    escaped = false;
                } else if s == '\\' {
                    escaped = true;
                } else if s == c {
                    break;
                }
            }
        } else if is_ident_char(c) {
            let mut end = start + c.len_utf8();
            while let Some(&(i, n)) = chars.peek() {
                if !is_ident_char(n) {
                    break;
                }
                end = i + n.len_utf8();
                chars.next();
            }
            match &src[start..end] {
                "undefined" => out.push_str("null"),
                ident => out.push_str(ident),
            }
        } else {
            out.push(c);
        }
    }

    out
}
