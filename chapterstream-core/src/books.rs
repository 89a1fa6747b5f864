use tracing::debug;

use crate::error::StreamError;
use crate::stream::ChapterStream;
use crate::types::BookMetadata;

impl ChapterStream {
    /// Book-level metadata on demand, cached for the session. A miss costs
    /// one base-page fetch; the served content is static, so entries are
    /// never invalidated.
    pub(crate) async fn resolve_metadata(
        &mut self,
        book: &str,
    ) -> Result<BookMetadata, StreamError> {
        if let Some(meta) = self.metadata.get(book) {
            return Ok(meta.clone());
        }
        let doc = self
            .fetcher
            .fetch_base(book)
            .await
            .map_err(StreamError::Fetch)?
            .ok_or_else(|| StreamError::MissingMetadata(book.to_string()))?;
        let meta = doc.metadata();
        debug!(
            book,
            chapters = meta.chapter_count,
            "resolved book metadata"
        );
        self.metadata.insert(book.to_string(), meta.clone());
        Ok(meta)
    }
}
