//! Article URL validation and PDF endpoint derivation
//!
//! Pure functions shared by both clients: nothing here touches the network,
//! so a malformed URL is always rejected before a request is sent.

use crate::config::{PdfRule, SiteConfig};
use crate::error::{Error, Result};
use regex::Regex;
use std::path::Path;
use url::Url;

/// A validated article URL together with its derived PDF endpoint
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArticleUrl {
    article: Url,
    pdf: Url,
}

impl ArticleUrl {
    /// Validate `input` and derive its PDF endpoint with `config.pdf_rule`
    ///
    /// The URL must be absolute http(s), have a host, and point to a
    /// non-root path without a trailing slash. With
    /// [`SiteConfig::restrict_host`] the host must also match the base URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use article_dl::ArticleUrl;
    /// use article_dl::config::SiteConfig;
    ///
    /// let config = SiteConfig::default();
    /// let article = ArticleUrl::parse("https://example.com/article/123", &config).unwrap();
    /// assert_eq!(article.pdf_endpoint().as_str(), "https://example.com/article/123/pdf");
    /// ```
    pub fn parse(input: &str, config: &SiteConfig) -> Result<Self> {
        let article =
            Url::parse(input.trim()).map_err(|e| Error::invalid_url(input, e.to_string()))?;

        if !matches!(article.scheme(), "http" | "https") {
            return Err(Error::invalid_url(
                input,
                format!("unsupported scheme '{}'", article.scheme()),
            ));
        }

        let host = article
            .host_str()
            .ok_or_else(|| Error::invalid_url(input, "missing host"))?;

        if config.restrict_host {
            let base = config.base()?;
            if base.host_str() != Some(host) {
                return Err(Error::invalid_url(
                    input,
                    format!("host '{host}' is not the configured site"),
                ));
            }
        }

        let path = article.path();
        if path.is_empty() || path == "/" {
            return Err(Error::invalid_url(input, "missing article path"));
        }
        if path.ends_with('/') {
            return Err(Error::invalid_url(input, "article path ends with '/'"));
        }

        let pdf = derive_pdf_endpoint(input, &article, &config.pdf_rule)?;
        Ok(Self { article, pdf })
    }

    /// The article URL as given (normalized by the URL parser)
    pub fn as_url(&self) -> &Url {
        &self.article
    }

    /// The derived PDF endpoint
    pub fn pdf_endpoint(&self) -> &Url {
        &self.pdf
    }

    /// File name for the saved PDF: the last path segment with a `.pdf` extension
    ///
    /// Percent-encoded characters are decoded; `/article/mon%20titre.html`
    /// becomes `mon titre.pdf`.
    pub fn pdf_file_name(&self) -> String {
        let slug = self
            .article
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default();
        let slug = urlencoding::decode(slug)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| slug.to_string());

        let stem = Path::new(&slug)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("article");
        format!("{stem}.pdf")
    }

    /// Page id captured by `pattern` (first capture group) from the article path
    pub fn page_id(&self, pattern: &Regex) -> Result<String> {
        pattern
            .captures(self.article.path())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| {
                Error::invalid_url(self.article.as_str(), "no page id found in article path")
            })
    }
}

impl std::fmt::Display for ArticleUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.article)
    }
}

fn derive_pdf_endpoint(input: &str, article: &Url, rule: &PdfRule) -> Result<Url> {
    let mut pdf = article.clone();
    pdf.set_fragment(None);

    match rule {
        PdfRule::AppendSegment { segment } => {
            pdf.set_query(None);
            pdf.path_segments_mut()
                .map_err(|_| Error::invalid_url(input, "URL cannot have path segments"))?
                .push(segment);
        }
        PdfRule::ReplaceExtension { from, to } => {
            pdf.set_query(None);
            let path = pdf
                .path()
                .strip_suffix(from.as_str())
                .filter(|stem| !stem.is_empty() && !stem.ends_with('/'))
                .map(|stem| format!("{stem}{to}"))
                .ok_or_else(|| {
                    Error::invalid_url(input, format!("path does not end with '{from}'"))
                })?;
            pdf.set_path(&path);
        }
        PdfRule::QueryParam { name, value } => {
            pdf.query_pairs_mut().append_pair(name, value);
        }
    }

    Ok(pdf)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<ArticleUrl> {
        ArticleUrl::parse(input, &SiteConfig::default())
    }

    fn with_rule(rule: PdfRule) -> SiteConfig {
        SiteConfig {
            pdf_rule: rule,
            ..Default::default()
        }
    }

    #[test]
    fn append_segment_is_deterministic() {
        let a = parse("https://example.com/article/123").unwrap();
        let b = parse("https://example.com/article/123").unwrap();
        assert_eq!(a.pdf_endpoint(), b.pdf_endpoint());
        assert_eq!(a.pdf_endpoint().as_str(), "https://example.com/article/123/pdf");
    }

    #[test]
    fn append_segment_drops_query_and_fragment() {
        let article = parse("https://example.com/article/123?utm=feed#top").unwrap();
        assert_eq!(
            article.pdf_endpoint().as_str(),
            "https://example.com/article/123/pdf"
        );
        // the article URL itself is left alone
        assert_eq!(article.as_url().query(), Some("utm=feed"));
    }

    #[test]
    fn replace_extension_swaps_suffix() {
        let config = with_rule(PdfRule::ReplaceExtension {
            from: ".html".into(),
            to: ".pdf".into(),
        });
        let article = ArticleUrl::parse(
            "https://www.lemonde.fr/idees/article/2024/01/02/titre_6208840_3232.html",
            &config,
        )
        .unwrap();
        assert_eq!(
            article.pdf_endpoint().as_str(),
            "https://www.lemonde.fr/idees/article/2024/01/02/titre_6208840_3232.pdf"
        );

        let err = ArticleUrl::parse("https://www.lemonde.fr/idees/article/123", &config)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn query_param_keeps_existing_query() {
        let config = with_rule(PdfRule::QueryParam {
            name: "format".into(),
            value: "pdf".into(),
        });
        let article = ArticleUrl::parse("https://example.com/a/b?lang=fr", &config).unwrap();
        assert_eq!(
            article.pdf_endpoint().as_str(),
            "https://example.com/a/b?lang=fr&format=pdf"
        );
    }

    #[test]
    fn malformed_urls_are_rejected() {
        for input in [
            "not-a-url",
            "",
            "ftp://example.com/article/1",
            "mailto:someone@example.com",
            "https://example.com",
            "https://example.com/",
            "https://example.com/article/",
        ] {
            match parse(input) {
                Err(Error::InvalidUrl { url, .. }) => assert_eq!(url, input),
                other => panic!("expected InvalidUrl for {input:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn restrict_host_rejects_foreign_hosts() {
        let config = SiteConfig {
            base_url: "https://www.lemonde.fr/".into(),
            restrict_host: true,
            ..Default::default()
        };
        assert!(ArticleUrl::parse("https://www.lemonde.fr/a/b", &config).is_ok());
        assert!(matches!(
            ArticleUrl::parse("https://evil.example/a/b", &config),
            Err(Error::InvalidUrl { .. })
        ));
    }

    #[test]
    fn pdf_file_name_uses_last_segment() {
        let article =
            parse("https://www.lemonde.fr/international/article/2024/05/01/un-titre_6230_3210.html")
                .unwrap();
        assert_eq!(article.pdf_file_name(), "un-titre_6230_3210.pdf");

        assert_eq!(parse("https://example.com/article/123").unwrap().pdf_file_name(), "123.pdf");
        assert_eq!(
            parse("https://example.com/a/mon%20titre.html").unwrap().pdf_file_name(),
            "mon titre.pdf"
        );
    }

    #[test]
    fn page_id_uses_first_capture_group() {
        let pattern = SiteConfig::default().page_id_regex().unwrap();
        let article =
            parse("https://www.lemonde.fr/international/article/2024/05/01/titre_6230998_3210.html")
                .unwrap();
        assert_eq!(article.page_id(&pattern).unwrap(), "6230998");

        let err = parse("https://example.com/article/123").unwrap().page_id(&pattern);
        assert!(matches!(err, Err(Error::InvalidUrl { .. })));
    }
}
