//! Login form scraping and session checks
//!
//! The login handshake is the same for both clients: load the login page,
//! copy every named input of the login form (hidden tokens included), fill in
//! the credentials, post it back, and look for the session cookie.

use crate::config::SiteConfig;
use crate::error::{AuthError, Error, Result};
use crate::types::Credentials;
use reqwest::StatusCode;
use reqwest::cookie::{CookieStore, Jar};
use scraper::{Html, Selector};
use url::Url;

/// Build the form payload from the login page HTML
///
/// Inputs are kept in document order. Inputs without a `name` are skipped,
/// inputs without a `value` get an empty one, and the configured email and
/// password fields are overwritten (or appended when the form lacks them).
pub fn form_payload(
    html: &str,
    config: &SiteConfig,
    credentials: &Credentials,
) -> Result<Vec<(String, String)>> {
    let form_selector = Selector::parse(&config.form_selector)
        .map_err(|e| Error::config("form_selector", format!("invalid CSS selector: {e}")))?;
    let input_selector = Selector::parse("input")
        .map_err(|e| Error::config("form_selector", format!("invalid CSS selector: {e}")))?;

    let document = Html::parse_document(html);
    let form = document
        .select(&form_selector)
        .next()
        .ok_or_else(|| AuthError::FormNotFound {
            selector: config.form_selector.clone(),
        })?;

    let mut payload: Vec<(String, String)> = form
        .select(&input_selector)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    set_field(&mut payload, &config.email_field, &credentials.email);
    set_field(&mut payload, &config.password_field, &credentials.password);

    Ok(payload)
}

fn set_field(payload: &mut Vec<(String, String)>, name: &str, value: &str) {
    match payload.iter_mut().find(|(field, _)| field == name) {
        Some((_, existing)) => *existing = value.to_string(),
        None => payload.push((name.to_string(), value.to_string())),
    }
}

/// Map a login-step status to an authentication error
pub fn ensure_accepted(status: StatusCode) -> Result<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(AuthError::Rejected {
            status: status.as_u16(),
        }
        .into())
    }
}

/// Check that the session cookie is present for any of the given URLs
///
/// Succeeds immediately when no session cookie is configured.
pub fn ensure_session_cookie(jar: &Jar, name: Option<&str>, urls: &[&Url]) -> Result<()> {
    let Some(name) = name else {
        return Ok(());
    };

    if urls.iter().any(|url| has_cookie(jar, url, name)) {
        Ok(())
    } else {
        Err(AuthError::MissingSessionCookie {
            name: name.to_string(),
        }
        .into())
    }
}

/// Whether the jar would send a cookie called `name` to `url`
pub fn has_cookie(jar: &Jar, url: &Url, name: &str) -> bool {
    let Some(header) = jar.cookies(url) else {
        return false;
    };
    let Ok(header) = header.to_str() else {
        return false;
    };

    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .any(|(cookie, _)| cookie.trim() == name)
}
