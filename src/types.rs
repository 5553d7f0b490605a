//! Core types for article-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the account email
pub const ENV_EMAIL: &str = "ARTICLE_DL_EMAIL";
/// Environment variable holding the account password
pub const ENV_PASSWORD: &str = "ARTICLE_DL_PASSWORD";

/// Account credentials, supplied per call and never persisted
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create credentials from an email and a password
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Read credentials from `ARTICLE_DL_EMAIL` and `ARTICLE_DL_PASSWORD`
    ///
    /// Returns `None` when either variable is unset or empty.
    pub fn from_env() -> Option<Self> {
        let email = std::env::var(ENV_EMAIL).ok().filter(|v| !v.is_empty())?;
        let password = std::env::var(ENV_PASSWORD).ok().filter(|v| !v.is_empty())?;
        Some(Self::new(email, password))
    }
}

// Keep the password out of logs and panic messages
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A PDF written to disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedPdf {
    /// Where the PDF was written
    pub path: PathBuf,
    /// Number of bytes written
    pub bytes: u64,
}

/// One page of reader comments
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommentPage {
    /// Comments on this page, top-level only; replies are nested
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// A reader comment with its nested replies
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    /// Comment identifier
    #[serde(rename = "commentId")]
    pub id: String,

    /// Display name of the author
    #[serde(rename = "userName")]
    pub author: String,

    /// Comment text
    pub content: String,

    /// Publication time
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    /// Number of likes
    #[serde(default)]
    pub likes: u64,

    /// Parent comment for replies
    #[serde(rename = "parentId", default)]
    pub parent_id: Option<String>,

    /// Direct replies
    #[serde(default)]
    pub replies: Vec<Comment>,
}

impl Comment {
    /// Total number of comments in this thread, the comment itself included
    pub fn thread_len(&self) -> usize {
        1 + self.replies.iter().map(Comment::thread_len).sum::<usize>()
    }
}

impl std::fmt::Display for Comment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}) [{} likes]: {}",
            self.author,
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.likes,
            self.content
        )
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("a@b.com", "hunter2");
        let shown = format!("{creds:?}");
        assert!(shown.contains("a@b.com"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn comment_page_parses_nested_replies() {
        let json = r#"{
            "comments": [
                {
                    "commentId": "c1",
                    "userName": "Alice",
                    "content": "Great piece",
                    "createdAt": "2024-03-01T08:30:00Z",
                    "likes": 12,
                    "parentId": null,
                    "replies": [
                        {
                            "commentId": "c2",
                            "userName": "Bob",
                            "content": "Agreed",
                            "createdAt": "2024-03-01T09:45:00+01:00",
                            "likes": 3,
                            "parentId": "c1"
                        }
                    ]
                }
            ],
            "total": 1
        }"#;

        let page: CommentPage = serde_json::from_str(json).expect("deserialize failed");
        assert_eq!(page.comments.len(), 1);

        let top = &page.comments[0];
        assert_eq!(top.author, "Alice");
        assert_eq!(top.parent_id, None);
        assert_eq!(top.thread_len(), 2);

        let reply = &top.replies[0];
        assert_eq!(reply.parent_id.as_deref(), Some("c1"));
        assert!(reply.replies.is_empty());
        // +01:00 offset normalized to UTC
        assert_eq!(reply.created_at.to_rfc3339(), "2024-03-01T08:45:00+00:00");
    }

    #[test]
    fn comment_display_is_single_line() {
        let comment = Comment {
            id: "c1".into(),
            author: "Alice".into(),
            content: "Great piece".into(),
            created_at: "2024-03-01T08:30:00Z".parse().unwrap(),
            likes: 12,
            parent_id: None,
            replies: vec![],
        };
        assert_eq!(
            comment.to_string(),
            "Alice (2024-03-01 08:30) [12 likes]: Great piece"
        );
    }
}
