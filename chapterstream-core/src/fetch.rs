use anyhow::Result;
use async_trait::async_trait;

use crate::types::ChapterDocument;

/// Resolves chapter pages over whatever transport the host provides.
///
/// `Ok(None)` means the server answered with a non-success status: the
/// identity is expected to stay missing for the whole session and the
/// controller marks it permanently failed. `Err` means the transport itself
/// failed; nothing is marked and the next edge trigger retries.
#[async_trait]
pub trait ChapterFetcher: Send + Sync {
    /// Fetch a book's base page (chapter 1 of the book, plus the metadata
    /// the page carries: title, subtitle, chapter navigation, neighbors).
    async fn fetch_base(&self, book: &str) -> Result<Option<ChapterDocument>>;

    /// Fetch the page for one specific chapter of a book.
    async fn fetch_chapter(&self, book: &str, chapter: u32) -> Result<Option<ChapterDocument>>;
}
