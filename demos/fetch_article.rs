//! Download one article with both clients and print its top comments
//!
//! ```bash
//! ARTICLE_DL_EMAIL=reader@example.com ARTICLE_DL_PASSWORD=secret \
//!     cargo run --example fetch_article -- <article-url> [output-dir]
//! ```

use article_dl::{Client, Credentials, SiteConfig, blocking};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("article_dl=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let url = args.next().ok_or("usage: fetch_article <article-url> [output-dir]")?;
    let out_dir = args.next().unwrap_or_else(|| ".".to_string());

    let credentials =
        Credentials::from_env().ok_or("ARTICLE_DL_EMAIL and ARTICLE_DL_PASSWORD must be set")?;
    let config = SiteConfig::from_env()?;

    // Blocking: the session is released when the scope ends
    let saved = blocking::Client::scoped(config.clone(), |client| {
        client.fetch_pdf_into(&url, &credentials, &out_dir)
    })?;
    println!("blocking: {} ({} bytes)", saved.path.display(), saved.bytes);

    // Async: same requests, driven by a tokio runtime
    let runtime = tokio::runtime::Runtime::new()?;
    let comments = runtime.block_on(async {
        let mut client = Client::new(config)?;
        let bytes = client.fetch_pdf_bytes(&url, &credentials).await;
        let comments = match client.page_id(&url) {
            Ok(page_id) => client.fetch_comments(&page_id, 1, 5).await.map(Some),
            Err(_) => Ok(None),
        };
        client.close().await?;

        println!("async: {} bytes", bytes?.len());
        comments
    })?;

    if let Some(page) = comments {
        for comment in &page.comments {
            println!("{comment}");
            for reply in &comment.replies {
                println!("    {reply}");
            }
        }
    }

    Ok(())
}
