//! AutoScout24 search client
//!
//! One request at a time through a session that keeps cookies and headers
//! between calls. A search retries while the page comes back without the
//! initial-state payload and fails fast on a captcha.

use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{Auto24Config, WaitRange};
use crate::error::{Auto24Error, Result};
use crate::extract::{self, PageKind};
use crate::headers::{generate_headers, to_header_map};
use crate::locale::Locale;
use crate::query::QueryEncoder;
use crate::response::SearchResponse;
use crate::session::ClientSession;

struct FetchedPage {
    status: StatusCode,
    body: String,
}

pub struct Auto24Client {
    config: Auto24Config,
    locale: Locale,
    wait_range: WaitRange,
    base_url: String,
    session: ClientSession,
    http: reqwest::Client,
    session_path: PathBuf,
}

impl Auto24Client {
    /// Validate the configuration and set up the session.
    ///
    /// With `use_session` on, a previously saved session is restored. Custom
    /// headers and a configured proxy take precedence over the saved ones;
    /// without custom headers a restored session keeps its own.
    pub fn new(config: Auto24Config) -> Result<Self> {
        let validated = config.validate()?;
        let session_path = config.session_file_path();

        let restored = if config.use_session {
            ClientSession::load(&session_path).unwrap_or_else(|e| {
                warn!(error = %e, "ignoring unreadable session file, starting fresh");
                None
            })
        } else {
            None
        };

        let mut session = restored.unwrap_or_else(|| {
            ClientSession::new(
                config
                    .headers
                    .clone()
                    .unwrap_or_else(|| generate_headers(validated.locale)),
                validated.proxy.clone(),
            )
        });
        if let Some(ref headers) = config.headers {
            session.set_headers(headers.clone());
        }
        if validated.proxy.is_some() {
            session.set_proxy(validated.proxy.clone());
        }

        let http = session.build_http_client(config.timeout)?;

        info!(
            locale = %validated.locale,
            proxy = %session.proxy().map(|p| p.to_url()).unwrap_or_else(|| "direct".to_string()),
            max_retries = config.max_retries,
            "auto24 client ready"
        );

        Ok(Self {
            locale: validated.locale,
            wait_range: validated.wait_range,
            base_url: validated.base_url,
            config,
            session,
            http,
            session_path,
        })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn config(&self) -> &Auto24Config {
        &self.config
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    pub fn bypass_captcha(&self) -> bool {
        self.config.bypass_captcha
    }

    pub fn search_url(&self) -> String {
        format!("{}/{}/s", self.base_url, self.locale.listing_path())
    }

    pub fn listing_details_url(&self) -> String {
        format!("{}/{}/d", self.base_url, self.locale.code())
    }

    /// Search listings and return the parsed initial state.
    ///
    /// Fails with [`Auto24Error::ReCaptchaRequired`] as soon as a challenge
    /// page is served and with [`Auto24Error::DataNotFound`] once
    /// `max_retries` pages came back without the payload.
    pub async fn search<Q>(&mut self, query: &Q) -> Result<SearchResponse>
    where
        Q: QueryEncoder + ?Sized,
    {
        let url = self.search_url();
        let query = query.encode();
        let max_retries = self.config.max_retries;
        let mut attempts: u32 = 0;

        while attempts < max_retries {
            let page = self.get(&url, &query).await?;

            match extract::classify_page(&page.body) {
                PageKind::Captcha => {
                    warn!(status = %page.status, "anti-bot captcha served");
                    if self.config.bypass_captcha {
                        warn!("captcha bypass requested but not supported");
                    }
                    return Err(Auto24Error::ReCaptchaRequired);
                }
                PageKind::Payload(script) => {
                    let state = extract::parse_initial_state(&script)?;
                    let response = SearchResponse::from_state(state)?;
                    info!(
                        attempt = attempts + 1,
                        results = response.search_results().len(),
                        total = ?response.total_count(),
                        "search succeeded"
                    );
                    return Ok(response);
                }
                PageKind::MissingPayload => {
                    attempts += 1;
                    // Header-based blocking is only a guess; status and size
                    // make markup changes visible in the logs.
                    warn!(
                        attempt = attempts,
                        max_retries,
                        status = %page.status,
                        bytes = page.body.len(),
                        "initial state not found, regenerating headers"
                    );
                    self.write_diagnostic(&page.body).await;
                    self.session.set_headers(generate_headers(self.locale));

                    if attempts < max_retries {
                        let delay = {
                            let mut rng = rand::thread_rng();
                            self.wait_range.sample(&mut rng)
                        };
                        debug!(delay_ms = delay.as_millis() as u64, "waiting before retry");
                        sleep(delay).await;
                    }
                }
            }
        }

        warn!(attempts, "giving up, search data not found");
        Err(Auto24Error::DataNotFound { attempts })
    }

    /// Fetch a listing-details page and return the body unparsed
    pub async fn fetch_listing_details<Q>(&mut self, query: &Q) -> Result<String>
    where
        Q: QueryEncoder + ?Sized,
    {
        let url = self.listing_details_url();
        let page = self.get(&url, &query.encode()).await?;
        Ok(page.body)
    }

    async fn get(&mut self, base_url: &str, query: &str) -> Result<FetchedPage> {
        let url = if query.is_empty() {
            base_url.to_string()
        } else {
            format!("{}?{}", base_url, query)
        };
        info!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .headers(to_header_map(self.session.headers()))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, bytes = body.len(), "response received");

        if self.config.use_session {
            self.session.save(&self.session_path)?;
        }

        Ok(FetchedPage { status, body })
    }

    async fn write_diagnostic(&self, body: &str) {
        let path = &self.config.diagnostic_path;
        match tokio::fs::write(path, body).await {
            Ok(()) => debug!(path = %path.display(), "saved page without payload"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write diagnostic page"),
        }
    }
}
