//! Request plans shared by the blocking and async clients
//!
//! Each network step is described by a [`PlannedRequest`] built here from the
//! site configuration. The clients only translate a plan into a reqwest call,
//! so both variants send the same requests in the same order.

use crate::article::ArticleUrl;
use crate::config::SiteConfig;
use crate::error::{Error, Result};
use reqwest::Method;
use url::Url;

/// Network step a request belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// GET the login page to collect the form
    LoginPage,
    /// POST the filled-in login form
    LoginSubmit,
    /// GET the PDF rendition of an article
    Pdf,
    /// GET one page of comments
    Comments,
    /// GET the logout endpoint at scope exit
    Logout,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::LoginPage => "login_page",
            Step::LoginSubmit => "login_submit",
            Step::Pdf => "pdf",
            Step::Comments => "comments",
            Step::Logout => "logout",
        };
        f.write_str(name)
    }
}

/// A fully described HTTP request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedRequest {
    /// Which step this request performs
    pub step: Step,
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: Url,
    /// Referer header, if any
    pub referer: Option<Url>,
    /// URL-encoded form body, if any
    pub form: Option<Vec<(String, String)>>,
}

impl PlannedRequest {
    fn get(step: Step, url: Url) -> Self {
        Self {
            step,
            method: Method::GET,
            url,
            referer: None,
            form: None,
        }
    }
}

/// Resolved endpoints of the configured site
#[derive(Clone, Debug)]
pub struct SiteEndpoints {
    base: Url,
    secure_base: Url,
    login: Url,
    logout: Url,
    comments: Url,
}

impl SiteEndpoints {
    /// Resolve every endpoint path against its host
    pub fn resolve(config: &SiteConfig) -> Result<Self> {
        let base = config.base()?;
        let secure_base = config.secure_base()?;

        let join = |host: &Url, key: &str, path: &str| {
            host.join(path.trim_start_matches('/'))
                .map_err(|e| Error::config(key, format!("cannot resolve '{path}': {e}")))
        };

        Ok(Self {
            login: join(&secure_base, "login_path", &config.login_path)?,
            logout: join(&secure_base, "logout_path", &config.logout_path)?,
            comments: join(&base, "comments_path", &config.comments_path)?,
            base,
            secure_base,
        })
    }

    /// Public host
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Host serving login and logout
    pub fn secure_base(&self) -> &Url {
        &self.secure_base
    }

    /// Login endpoint
    pub fn login(&self) -> &Url {
        &self.login
    }

    /// GET the login page
    pub fn login_page(&self) -> PlannedRequest {
        PlannedRequest::get(Step::LoginPage, self.login.clone())
    }

    /// POST the login form, with the login page as referer
    pub fn login_submit(&self, form: Vec<(String, String)>) -> PlannedRequest {
        PlannedRequest {
            step: Step::LoginSubmit,
            method: Method::POST,
            url: self.login.clone(),
            referer: Some(self.login.clone()),
            form: Some(form),
        }
    }

    /// GET the PDF rendition of `article`
    pub fn pdf(&self, article: &ArticleUrl) -> PlannedRequest {
        PlannedRequest::get(Step::Pdf, article.pdf_endpoint().clone())
    }

    /// GET one page of comments for `page_id`, most liked first
    pub fn comments(&self, page_id: &str, page: u32, limit: u32) -> PlannedRequest {
        let mut url = self.comments.clone();
        url.query_pairs_mut()
            .append_pair("pageId", page_id)
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string())
            .append_pair("order", "likes");
        PlannedRequest::get(Step::Comments, url)
    }

    /// GET the logout endpoint
    pub fn logout(&self) -> PlannedRequest {
        PlannedRequest::get(Step::Logout, self.logout.clone())
    }
}
