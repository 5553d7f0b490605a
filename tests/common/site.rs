//! A mock news site on top of wiremock

use super::fixtures::{LOGIN_PAGE, SESSION_COOKIE};
use article_dl::{Credentials, SiteConfig};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const LOGIN_PATH: &str = "/sfuser/connexion";
pub const LOGOUT_PATH: &str = "/sfuser/deconnexion";
pub const COMMENTS_PATH: &str = "/ajax/feedbacks/page";

/// Credentials accepted by [`MockSite::mount_login`]
pub fn credentials() -> Credentials {
    Credentials::new("a@b.com", "x")
}

/// One recorded request, reduced to what both clients must agree on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub referer_path: Option<String>,
    pub user_agent: Option<String>,
    pub cookie: Option<String>,
    pub body: String,
}

impl From<&Request> for SeenRequest {
    fn from(request: &Request) -> Self {
        let header_value = |name: &str| {
            request
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        Self {
            method: request.method.as_str().to_string(),
            path: request.url.path().to_string(),
            query: request.url.query().map(str::to_string),
            referer_path: header_value("referer")
                .and_then(|r| url::Url::parse(&r).ok())
                .map(|r| r.path().to_string()),
            user_agent: header_value("user-agent"),
            cookie: header_value("cookie"),
            body: String::from_utf8_lossy(&request.body).into_owned(),
        }
    }
}

pub struct MockSite {
    pub server: MockServer,
}

impl MockSite {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Site configuration pointing both hosts at the mock server
    pub fn config(&self) -> SiteConfig {
        SiteConfig::for_host(format!("{}/", self.server.uri()))
    }

    /// Absolute URL on the mock server
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// Login page plus a form submission that sets the session cookie
    pub async fn mount_login(&self, expected_logins: u64) {
        self.mount_login_page(expected_logins).await;

        let (name, value) = SESSION_COOKIE;
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .and(body_string_contains("connection%5B_token%5D=tok-123"))
            .and(body_string_contains("email=a%40b.com"))
            .and(body_string_contains("password=x"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("set-cookie", format!("{name}={value}; Path=/").as_str())
                    .set_body_string("<html><body>Bienvenue</body></html>"),
            )
            .expect(expected_logins)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_login_page(&self, expected: u64) {
        Mock::given(method("GET"))
            .and(path(LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string(LOGIN_PAGE),
            )
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Login submission answered with `status` and no cookie
    pub async fn mount_login_rejected(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// PDF endpoint that only answers requests carrying the session cookie
    pub async fn mount_pdf(&self, pdf_path: &str, status: u16, body: &[u8], expected: u64) {
        let (name, value) = SESSION_COOKIE;
        Mock::given(method("GET"))
            .and(path(pdf_path))
            .and(header("cookie", format!("{name}={value}").as_str()))
            .respond_with(
                ResponseTemplate::new(status)
                    .insert_header("content-type", "application/pdf")
                    .set_body_bytes(body.to_vec()),
            )
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    /// Any PDF request at all; used to assert that none is made
    pub async fn forbid_pdf(&self, pdf_path: &str) {
        Mock::given(method("GET"))
            .and(path(pdf_path))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_logout(&self, expected: u64) {
        self.mount_logout_status(200, expected).await;
    }

    /// Logout endpoint answering with `status`
    pub async fn mount_logout_status(&self, status: u16, expected: u64) {
        Mock::given(method("GET"))
            .and(path(LOGOUT_PATH))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_comments(&self, page_id: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(COMMENTS_PATH))
            .and(query_param("pageId", page_id))
            .and(query_param("order", "likes"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/json")
                    .set_body_string(body),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Every request received so far, in arrival order
    pub async fn requests(&self) -> Vec<SeenRequest> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(SeenRequest::from)
            .collect()
    }

    /// `METHOD path` of every request received so far
    pub async fn request_lines(&self) -> Vec<String> {
        self.requests()
            .await
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}
