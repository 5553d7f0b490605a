//! Configuration types for article-dl
//!
//! Everything that is specific to the target site (hosts, endpoint paths,
//! login form field names, session cookie, PDF URL rule) lives here so that
//! a change in the site's markup only needs a configuration change.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable overriding [`SiteConfig::base_url`]
pub const ENV_HOST: &str = "ARTICLE_DL_HOST";
/// Environment variable overriding [`SiteConfig::secure_base_url`]
pub const ENV_SECURE_HOST: &str = "ARTICLE_DL_SECURE_HOST";
/// Environment variable overriding [`SiteConfig::session_cookie`]
pub const ENV_SESSION_COOKIE: &str = "ARTICLE_DL_SESSION_COOKIE";
/// Environment variable overriding [`SiteConfig::timeout`] (whole seconds)
pub const ENV_TIMEOUT_SECS: &str = "ARTICLE_DL_TIMEOUT_SECS";

/// Rule deriving the PDF endpoint from an article URL
///
/// The rule is a fixed string transformation; no lookup is involved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PdfRule {
    /// Append a path segment: `/article/123` becomes `/article/123/pdf`
    AppendSegment {
        /// The segment to append
        segment: String,
    },
    /// Replace a path suffix: `/a/b.html` becomes `/a/b.pdf`
    ReplaceExtension {
        /// Suffix the article path must end with
        from: String,
        /// Replacement suffix
        to: String,
    },
    /// Add a query parameter: `/a/b` becomes `/a/b?format=pdf`
    QueryParam {
        /// Parameter name
        name: String,
        /// Parameter value
        value: String,
    },
}

impl Default for PdfRule {
    fn default() -> Self {
        PdfRule::AppendSegment {
            segment: "pdf".to_string(),
        }
    }
}

/// Site configuration shared by the blocking and async clients
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Public host serving articles and comments (default: "https://www.lemonde.fr/")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Host serving the login and logout endpoints (default: "https://secure.lemonde.fr/")
    #[serde(default = "default_secure_base_url")]
    pub secure_base_url: String,

    /// Login endpoint, relative to the secure host
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Logout endpoint, relative to the secure host
    #[serde(default = "default_logout_path")]
    pub logout_path: String,

    /// Comments endpoint, relative to the public host
    #[serde(default = "default_comments_path")]
    pub comments_path: String,

    /// CSS selector locating the login form in the login page
    #[serde(default = "default_form_selector")]
    pub form_selector: String,

    /// Form field receiving the email
    #[serde(default = "default_email_field")]
    pub email_field: String,

    /// Form field receiving the password
    #[serde(default = "default_password_field")]
    pub password_field: String,

    /// Cookie that proves a successful login (None = trust the HTTP status)
    #[serde(default = "default_session_cookie")]
    pub session_cookie: Option<String>,

    /// How the PDF endpoint is derived from an article URL
    #[serde(default)]
    pub pdf_rule: PdfRule,

    /// Regex with one capture group extracting the page id from an article path
    #[serde(default = "default_page_id_pattern")]
    pub page_id_pattern: String,

    /// Reject article URLs whose host differs from `base_url`'s host
    #[serde(default)]
    pub restrict_host: bool,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in whole seconds, passed through to the HTTP client (default: 10s)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            secure_base_url: default_secure_base_url(),
            login_path: default_login_path(),
            logout_path: default_logout_path(),
            comments_path: default_comments_path(),
            form_selector: default_form_selector(),
            email_field: default_email_field(),
            password_field: default_password_field(),
            session_cookie: default_session_cookie(),
            pdf_rule: PdfRule::default(),
            page_id_pattern: default_page_id_pattern(),
            restrict_host: false,
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

impl SiteConfig {
    /// Configuration with both hosts pointing at `base_url`
    ///
    /// Convenient for sites (and test servers) that serve login and articles
    /// from the same origin.
    pub fn for_host(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            secure_base_url: base_url.clone(),
            base_url,
            ..Default::default()
        }
    }

    /// Defaults overlaid with `ARTICLE_DL_*` environment variables
    ///
    /// Unset variables keep their default; a timeout that is not a whole
    /// number of seconds is a configuration error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(host) = std::env::var(ENV_HOST) {
            config.base_url = host;
        }
        if let Ok(host) = std::env::var(ENV_SECURE_HOST) {
            config.secure_base_url = host;
        }
        if let Ok(cookie) = std::env::var(ENV_SESSION_COOKIE) {
            config.session_cookie = (!cookie.trim().is_empty()).then_some(cookie);
        }
        if let Ok(secs) = std::env::var(ENV_TIMEOUT_SECS) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::config("timeout", format!("{ENV_TIMEOUT_SECS} is not a number: {secs}"))
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check every setting that can be checked without network access
    pub fn validate(&self) -> Result<()> {
        parse_base("base_url", &self.base_url)?;
        parse_base("secure_base_url", &self.secure_base_url)?;

        for (key, value) in [
            ("login_path", &self.login_path),
            ("logout_path", &self.logout_path),
            ("comments_path", &self.comments_path),
            ("email_field", &self.email_field),
            ("password_field", &self.password_field),
        ] {
            if value.trim().is_empty() {
                return Err(Error::config(key, "must not be empty"));
            }
        }

        if self.email_field == self.password_field {
            return Err(Error::config(
                "password_field",
                "email and password fields must differ",
            ));
        }

        scraper::Selector::parse(&self.form_selector).map_err(|e| {
            Error::config("form_selector", format!("invalid CSS selector: {e}"))
        })?;

        self.page_id_regex()?;

        match &self.pdf_rule {
            PdfRule::AppendSegment { segment } => {
                if segment.is_empty() || segment.contains('/') {
                    return Err(Error::config(
                        "pdf_rule",
                        "segment must be a single non-empty path segment",
                    ));
                }
            }
            PdfRule::ReplaceExtension { from, .. } => {
                if from.is_empty() {
                    return Err(Error::config("pdf_rule", "suffix to replace is empty"));
                }
            }
            PdfRule::QueryParam { name, .. } => {
                if name.is_empty() {
                    return Err(Error::config("pdf_rule", "query parameter name is empty"));
                }
            }
        }

        if self.timeout.is_zero() {
            return Err(Error::config("timeout", "must be greater than zero"));
        }
        // Serialized as whole seconds
        if self.timeout.subsec_nanos() != 0 {
            return Err(Error::config("timeout", "must be a whole number of seconds"));
        }

        Ok(())
    }

    /// Compiled [`SiteConfig::page_id_pattern`]
    pub fn page_id_regex(&self) -> Result<Regex> {
        let re = Regex::new(&self.page_id_pattern)
            .map_err(|e| Error::config("page_id_pattern", e.to_string()))?;
        if re.captures_len() < 2 {
            return Err(Error::config(
                "page_id_pattern",
                "pattern needs a capture group for the page id",
            ));
        }
        Ok(re)
    }

    /// Parsed [`SiteConfig::base_url`], normalized to end with '/'
    pub fn base(&self) -> Result<Url> {
        parse_base("base_url", &self.base_url)
    }

    /// Parsed [`SiteConfig::secure_base_url`], normalized to end with '/'
    pub fn secure_base(&self) -> Result<Url> {
        parse_base("secure_base_url", &self.secure_base_url)
    }
}

/// Parse a base URL and make sure relative joins append to it
fn parse_base(key: &str, raw: &str) -> Result<Url> {
    let mut url =
        Url::parse(raw).map_err(|e| Error::config(key, format!("invalid URL '{raw}': {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(key, format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// Default value functions
fn default_base_url() -> String {
    "https://www.lemonde.fr/".to_string()
}

fn default_secure_base_url() -> String {
    "https://secure.lemonde.fr/".to_string()
}

fn default_login_path() -> String {
    "sfuser/connexion".to_string()
}

fn default_logout_path() -> String {
    "sfuser/deconnexion".to_string()
}

fn default_comments_path() -> String {
    "ajax/feedbacks/page".to_string()
}

fn default_form_selector() -> String {
    r#"form[method="post"]"#.to_string()
}

fn default_email_field() -> String {
    "email".to_string()
}

fn default_password_field() -> String {
    "password".to_string()
}

fn default_session_cookie() -> Option<String> {
    Some("lmd_a_s".to_string())
}

fn default_page_id_pattern() -> String {
    r"_(\d+)_\d+\.html$".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
