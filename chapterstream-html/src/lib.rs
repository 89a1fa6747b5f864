//! HTML side of the chapter stream: parses fetched book/chapter pages into
//! the core document model and provides the reqwest-backed
//! [`HttpChapterFetcher`] implementing the core's fetcher seam.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use chapterstream_core::{ChapterDocument, ChapterFetcher};

mod parse;

pub use parse::parse_chapter_document;

/// Cap on a single page fetch. The loader's mutual-exclusion flag stays held
/// for a whole batch, so a hung request has to fail eventually instead of
/// wedging loading for the rest of the session.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches chapter pages from a site serving `/<book>/` base pages and
/// `/<book>/<chapter>/` chapter pages.
pub struct HttpChapterFetcher {
    client: Client,
    base: Url,
}

impl HttpChapterFetcher {
    pub fn new(base: Url) -> Result<Self> {
        let client = Client::builder()
            .timeout(DEFAULT_FETCH_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client, base })
    }

    pub fn with_client(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    fn book_url(&self, book: &str) -> Result<Url> {
        self.base
            .join(&format!("{book}/"))
            .with_context(|| format!("invalid book path for {book}"))
    }

    fn chapter_url(&self, book: &str, chapter: u32) -> Result<Url> {
        self.base
            .join(&format!("{book}/{chapter}/"))
            .with_context(|| format!("invalid chapter path for {book}/{chapter}"))
    }

    async fn fetch(&self, url: Url) -> Result<Option<ChapterDocument>> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        if !response.status().is_success() {
            debug!(%url, status = %response.status(), "chapter page unavailable");
            return Ok(None);
        }
        let body = response
            .text()
            .await
            .with_context(|| format!("reading body from {url} failed"))?;
        Ok(parse_chapter_document(&body))
    }
}

#[async_trait]
impl ChapterFetcher for HttpChapterFetcher {
    async fn fetch_base(&self, book: &str) -> Result<Option<ChapterDocument>> {
        self.fetch(self.book_url(book)?).await
    }

    async fn fetch_chapter(&self, book: &str, chapter: u32) -> Result<Option<ChapterDocument>> {
        self.fetch(self.chapter_url(book, chapter)?).await
    }
}
