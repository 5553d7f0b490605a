//! # article-dl
//!
//! Log into a news website and download the PDF rendition of an article.
//!
//! ## Design Philosophy
//!
//! article-dl is designed to be:
//! - **Thin** - one login handshake, one GET per article, one logout
//! - **Scoped** - a client holds at most one session and releases it on exit
//! - **Dual-mode** - an async [`Client`] and a [`blocking::Client`] send the
//!   exact same requests, built from shared request plans
//! - **Configurable** - hosts, paths, form fields and the PDF URL rule are
//!   all [`SiteConfig`] settings
//!
//! ## Quick Start
//!
//! ```no_run
//! use article_dl::{Client, Credentials, SiteConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials = Credentials::new("reader@example.com", "secret");
//!     let url = "https://www.lemonde.fr/idees/article/2024/01/02/titre_6208840_3232.html";
//!
//!     let mut client = Client::new(SiteConfig::default())?;
//!     let result = client.fetch_pdf_into(url, &credentials, ".").await;
//!     client.close().await?;
//!
//!     println!("saved {}", result?.path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Article URL validation and PDF endpoint derivation
pub mod article;
/// Blocking client
pub mod blocking;
/// Async client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Login form scraping and session checks
pub mod login;
/// Request plans shared by both clients
pub mod plan;
/// Session lifecycle
pub mod session;
/// PDF persistence
pub mod storage;
/// Core types
pub mod types;

// Re-export commonly used types
pub use article::ArticleUrl;
pub use client::Client;
pub use config::{PdfRule, SiteConfig};
pub use error::{AuthError, Error, Result};
pub use session::SessionState;
pub use types::{Comment, CommentPage, Credentials, SavedPdf};
