//! Blocking client
//!
//! Same requests, same errors and same lifecycle as [`crate::Client`], but
//! every network call blocks the calling thread. Dropping an authenticated
//! client logs it out, so a plain block scope is enough to release the
//! session:
//!
//! ```no_run
//! use article_dl::blocking::Client;
//! use article_dl::{Credentials, SiteConfig};
//!
//! # fn run() -> article_dl::Result<()> {
//! let credentials = Credentials::new("reader@example.com", "secret");
//! {
//!     let mut client = Client::new(SiteConfig::default())?;
//!     client.fetch_pdf("https://example.com/article/123", &credentials, "123.pdf")?;
//! } // logged out here
//! # Ok(())
//! # }
//! ```
//!
//! Like `reqwest::blocking`, this client must not be used from within an
//! async runtime.

use crate::article::ArticleUrl;
use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::login;
use crate::plan::{PlannedRequest, SiteEndpoints};
use crate::session::{self, SessionState, Teardown};
use crate::storage;
use crate::types::{CommentPage, Credentials, SavedPdf};
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::header::REFERER;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct Transport {
    http: reqwest::blocking::Client,
    jar: Arc<Jar>,
}

impl Transport {
    fn build(config: &SiteConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::blocking::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, jar })
    }

    fn send(&self, request: &PlannedRequest) -> Result<reqwest::blocking::Response> {
        debug!(
            step = %request.step,
            method = %request.method,
            url = %request.url,
            "sending request"
        );

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone());
        if let Some(referer) = &request.referer {
            builder = builder.header(REFERER, referer.as_str());
        }
        if let Some(form) = &request.form {
            builder = builder.form(form);
        }

        Ok(builder.send()?)
    }
}

/// Blocking article client with a scoped, authenticated session
pub struct Client {
    config: SiteConfig,
    endpoints: SiteEndpoints,
    page_id: Regex,
    transport: Transport,
    state: SessionState,
}

impl Client {
    /// Create an unauthenticated client
    pub fn new(config: SiteConfig) -> Result<Self> {
        config.validate()?;
        let endpoints = SiteEndpoints::resolve(&config)?;
        let page_id = config.page_id_regex()?;
        let transport = Transport::build(&config)?;

        Ok(Self {
            config,
            endpoints,
            page_id,
            transport,
            state: SessionState::default(),
        })
    }

    /// Run `body` with a fresh client and close it afterwards
    ///
    /// Mirrors [`crate::Client::scoped`]: the body's result is returned and
    /// a logout failure is only logged.
    pub fn scoped<T, F>(config: SiteConfig, body: F) -> Result<T>
    where
        F: FnOnce(&mut Client) -> Result<T>,
    {
        let mut client = Client::new(config)?;
        let outcome = body(&mut client);
        let closed = client.close();
        session::finish_scope(outcome, closed)
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Current lifecycle state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Log in, unless this scope already holds a session for the same account
    pub fn login(&mut self, credentials: &Credentials) -> Result<()> {
        if !self.state.needs_login(credentials)? {
            debug!(email = %credentials.email, "reusing authenticated session");
            return Ok(());
        }

        match self.handshake(credentials) {
            Ok(()) => {
                self.state.authenticated(credentials);
                info!(email = %credentials.email, "logged in");
                Ok(())
            }
            Err(e) => {
                debug!("discarding cookies from failed login");
                match Transport::build(&self.config) {
                    Ok(fresh) => self.transport = fresh,
                    Err(rebuild) => warn!(error = %rebuild, "could not reset HTTP client"),
                }
                Err(e)
            }
        }
    }

    fn handshake(&self, credentials: &Credentials) -> Result<()> {
        let response = self.transport.send(&self.endpoints.login_page())?;
        login::ensure_accepted(response.status())?;
        let html = response.text()?;

        let form = login::form_payload(&html, &self.config, credentials)?;
        let response = self.transport.send(&self.endpoints.login_submit(form))?;
        login::ensure_accepted(response.status())?;

        login::ensure_session_cookie(
            &self.transport.jar,
            self.config.session_cookie.as_deref(),
            &[self.endpoints.base(), self.endpoints.secure_base()],
        )
    }

    /// Validate an article URL against this client's configuration
    pub fn article(&self, url: &str) -> Result<ArticleUrl> {
        ArticleUrl::parse(url, &self.config)
    }

    /// Page id of an article, as used by [`Client::fetch_comments`]
    pub fn page_id(&self, url: &str) -> Result<String> {
        self.article(url)?.page_id(&self.page_id)
    }

    /// Download the PDF of `url` with the current session
    pub fn download(&mut self, url: &str) -> Result<Vec<u8>> {
        self.state.ensure_open()?;
        let article = self.article(url)?;
        self.state.require_authenticated()?;
        self.download_article(&article)
    }

    fn download_article(&self, article: &ArticleUrl) -> Result<Vec<u8>> {
        let request = self.endpoints.pdf(article);
        let response = self.transport.send(&request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(&request.url, status));
        }

        let bytes = response.bytes()?;
        debug!(url = %request.url, bytes = bytes.len(), "PDF downloaded");
        Ok(bytes.to_vec())
    }

    /// Log in if needed, then return the PDF bytes of `url`
    pub fn fetch_pdf_bytes(&mut self, url: &str, credentials: &Credentials) -> Result<Vec<u8>> {
        self.state.ensure_open()?;
        let article = self.article(url)?;
        self.login(credentials)?;
        self.download_article(&article)
    }

    /// Log in if needed, download the PDF of `url` and write it to `path`
    pub fn fetch_pdf(
        &mut self,
        url: &str,
        credentials: &Credentials,
        path: impl AsRef<Path>,
    ) -> Result<SavedPdf> {
        let bytes = self.fetch_pdf_bytes(url, credentials)?;
        storage::write_atomic(path.as_ref(), &bytes)
    }

    /// Like [`Client::fetch_pdf`], saving as `dir/<article slug>.pdf`
    pub fn fetch_pdf_into(
        &mut self,
        url: &str,
        credentials: &Credentials,
        dir: impl AsRef<Path>,
    ) -> Result<SavedPdf> {
        let file_name = self.article(url)?.pdf_file_name();
        self.fetch_pdf(url, credentials, dir.as_ref().join(file_name))
    }

    /// Fetch one page of reader comments, most liked first
    pub fn fetch_comments(&mut self, page_id: &str, page: u32, limit: u32) -> Result<CommentPage> {
        self.state.ensure_open()?;
        let request = self.endpoints.comments(page_id, page, limit);
        let response = self.transport.send(&request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(&request.url, status));
        }

        let body = response.text()?;
        Ok(serde_json::from_str(&body)?)
    }

    /// End the scope: log out an authenticated session, then mark the client closed
    pub fn close(&mut self) -> Result<()> {
        match self.state.close() {
            Teardown::Logout => {
                let response = self.transport.send(&self.endpoints.logout())?;
                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Logout {
                        status: status.as_u16(),
                    });
                }
                info!(status = status.as_u16(), "logged out");
                Ok(())
            }
            Teardown::Discard => {
                debug!("closing unauthenticated client");
                Ok(())
            }
            Teardown::AlreadyClosed => Ok(()),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "logout on drop failed");
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("mode", &"blocking")
            .field("base_url", &self.endpoints.base().as_str())
            .field("state", &self.state)
            .finish()
    }
}
