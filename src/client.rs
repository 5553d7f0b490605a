//! Async client
//!
//! [`Client`] owns one cookie jar and one [`SessionState`] for its whole
//! lifetime. Network calls suspend the calling task; the final file write
//! runs on tokio's blocking pool. Dropping an authenticated client blocks
//! until its logout request has completed.

use crate::article::ArticleUrl;
use crate::config::SiteConfig;
use crate::error::{Error, Result};
use crate::login;
use crate::plan::{PlannedRequest, SiteEndpoints, Step};
use crate::session::{self, SessionState, Teardown};
use crate::storage;
use crate::types::{CommentPage, Credentials, SavedPdf};
use futures::future::BoxFuture;
use regex::Regex;
use reqwest::StatusCode;
use reqwest::cookie::Jar;
use reqwest::header::REFERER;
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::RuntimeFlavor;
use tracing::{debug, info, warn};

/// HTTP client and the cookie jar it writes to
struct Transport {
    http: reqwest::Client,
    jar: Arc<Jar>,
}

impl Transport {
    fn build(config: &SiteConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, jar })
    }

    async fn send(&self, request: &PlannedRequest) -> Result<reqwest::Response> {
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

        Ok(builder.send().await?)
    }
}

/// Async article client with a scoped, authenticated session
///
/// Prefer [`Client::scoped`] or an explicit [`Client::close`]. Dropping an
/// authenticated client still logs it out, but it blocks the dropping thread
/// until the logout request completes and can only log a failure.
///
/// # Example
///
/// ```no_run
/// use article_dl::{Client, Credentials, SiteConfig};
///
/// # async fn run() -> article_dl::Result<()> {
/// let credentials = Credentials::new("reader@example.com", "secret");
/// let url = "https://www.lemonde.fr/idees/article/2024/01/02/titre_6208840_3232.html";
///
/// let saved = Client::scoped(SiteConfig::default(), move |client| {
///     Box::pin(async move { client.fetch_pdf(url, &credentials, "article.pdf").await })
/// })
/// .await?;
/// println!("{} bytes written", saved.bytes);
/// # Ok(())
/// # }
/// ```
pub struct Client {
    config: SiteConfig,
    endpoints: SiteEndpoints,
    page_id: Regex,
    transport: Transport,
    state: SessionState,
}

impl Client {
    /// Create an unauthenticated client
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an invalid configuration and
    /// [`Error::Network`] if the HTTP client cannot be built.
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
    /// The client is closed whether `body` succeeds or fails, and the
    /// result of `body` is returned as is. A failed logout is logged at
    /// `warn` level and does not turn a saved PDF into an error.
    pub async fn scoped<T, F>(config: SiteConfig, body: F) -> Result<T>
    where
        F: for<'c> FnOnce(&'c mut Client) -> BoxFuture<'c, Result<T>>,
    {
        let mut client = Client::new(config)?;
        let outcome = body(&mut client).await;
        let closed = client.close().await;
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
    ///
    /// On failure the cookie jar is discarded, so no partial session survives.
    ///
    /// # Errors
    ///
    /// - [`Error::Authentication`] if the login page or the form submission
    ///   is rejected, the form is missing, or the session cookie is not set
    /// - [`Error::Network`] for transport failures
    /// - [`Error::SessionClosed`] after [`Client::close`]
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        if !self.state.needs_login(credentials)? {
            debug!(email = %credentials.email, "reusing authenticated session");
            return Ok(());
        }

        match self.handshake(credentials).await {
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

    async fn handshake(&self, credentials: &Credentials) -> Result<()> {
        let response = self.transport.send(&self.endpoints.login_page()).await?;
        login::ensure_accepted(response.status())?;
        let html = response.text().await?;

        let form = login::form_payload(&html, &self.config, credentials)?;
        let response = self
            .transport
            .send(&self.endpoints.login_submit(form))
            .await?;
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
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] before any request for a malformed URL
    /// - [`Error::Authentication`] if no login has succeeded in this scope
    /// - [`Error::Fetch`] with the status code for a non-success response
    pub async fn download(&mut self, url: &str) -> Result<Vec<u8>> {
        self.state.ensure_open()?;
        let article = self.article(url)?;
        self.state.require_authenticated()?;
        self.download_article(&article).await
    }

    async fn download_article(&self, article: &ArticleUrl) -> Result<Vec<u8>> {
        let request = self.endpoints.pdf(article);
        let response = self.transport.send(&request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(&request.url, status));
        }

        let bytes = response.bytes().await?;
        debug!(url = %request.url, bytes = bytes.len(), "PDF downloaded");
        Ok(bytes.to_vec())
    }

    /// Log in if needed, then return the PDF bytes of `url`
    ///
    /// The URL is validated before the login, so a malformed URL never
    /// causes network traffic.
    pub async fn fetch_pdf_bytes(
        &mut self,
        url: &str,
        credentials: &Credentials,
    ) -> Result<Vec<u8>> {
        self.state.ensure_open()?;
        let article = self.article(url)?;
        self.login(credentials).await?;
        self.download_article(&article).await
    }

    /// Log in if needed, download the PDF of `url` and write it to `path`
    ///
    /// `path` is created or overwritten; nothing is written if any step fails.
    pub async fn fetch_pdf(
        &mut self,
        url: &str,
        credentials: &Credentials,
        path: impl AsRef<Path>,
    ) -> Result<SavedPdf> {
        let bytes = self.fetch_pdf_bytes(url, credentials).await?;
        storage::write_atomic_async(path.as_ref().to_path_buf(), bytes).await
    }

    /// Like [`Client::fetch_pdf`], saving as `dir/<article slug>.pdf`
    pub async fn fetch_pdf_into(
        &mut self,
        url: &str,
        credentials: &Credentials,
        dir: impl AsRef<Path>,
    ) -> Result<SavedPdf> {
        let file_name = self.article(url)?.pdf_file_name();
        self.fetch_pdf(url, credentials, dir.as_ref().join(file_name))
            .await
    }

    /// Fetch one page of reader comments, most liked first
    ///
    /// Comments are public: no login is required, but the session cookies
    /// are sent when present.
    pub async fn fetch_comments(
        &mut self,
        page_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<CommentPage> {
        self.state.ensure_open()?;
        let request = self.endpoints.comments(page_id, page, limit);
        let response = self.transport.send(&request).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(&request.url, status));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// End the scope: log out an authenticated session, then mark the client closed
    ///
    /// Only the first call sends a request; later calls return `Ok(())`.
    /// A non-success logout response is reported as [`Error::Logout`]; the
    /// client is closed either way.
    pub async fn close(&mut self) -> Result<()> {
        match self.state.close() {
            Teardown::Logout => {
                let response = self.transport.send(&self.endpoints.logout()).await?;
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
        if self.state.close() != Teardown::Logout {
            return;
        }

        warn!(step = %Step::Logout, "async client dropped without close(); logging out");
        let request = self.endpoints.logout();

        // The logout must have completed when drop returns
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                let http = self.transport.http.clone();
                let status = tokio::task::block_in_place(|| {
                    handle.block_on(async move {
                        http.request(request.method, request.url)
                            .send()
                            .await
                            .map(|response| response.status())
                    })
                });
                report_drop_logout(status);
            }
            _ => {
                // Current-thread runtime or none at all
                let config = self.config.clone();
                let jar = Arc::clone(&self.transport.jar);
                let worker = std::thread::spawn(move || logout_blocking(&config, jar, request));
                match worker.join() {
                    Ok(status) => report_drop_logout(status),
                    Err(_) => warn!("logout thread panicked"),
                }
            }
        }
    }
}

/// Send the logout with a blocking client sharing the session cookies
fn logout_blocking(
    config: &SiteConfig,
    jar: Arc<Jar>,
    request: PlannedRequest,
) -> reqwest::Result<StatusCode> {
    reqwest::blocking::Client::builder()
        .cookie_provider(jar)
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .build()?
        .request(request.method, request.url)
        .send()
        .map(|response| response.status())
}

fn report_drop_logout(status: reqwest::Result<StatusCode>) {
    match status {
        Ok(status) if status.is_success() => info!(status = status.as_u16(), "logged out"),
        Ok(status) => warn!(status = status.as_u16(), "logout on drop rejected"),
        Err(e) => warn!(error = %e, "logout on drop failed"),
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("mode", &"async")
            .field("base_url", &self.endpoints.base().as_str())
            .field("state", &self.state)
            .finish()
    }
}
