//! Search client for autoscout24.ch
//!
//! Fetches listing searches, detects anti-bot challenges, extracts the
//! page's embedded initial state and keeps a reusable cookie session on disk.

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod headers;
pub mod locale;
pub mod proxy;
pub mod query;
pub mod response;
pub mod session;

pub use client::Auto24Client;
pub use config::{Auto24Config, WaitRange};
pub use error::{Auto24Error, Result};
pub use locale::Locale;
pub use query::{QueryEncoder, SearchQuery};
pub use response::SearchResponse;
pub use session::ClientSession;
