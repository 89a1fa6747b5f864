use tracing::{debug, instrument, warn};

use crate::error::StreamError;
use crate::stream::ChapterStream;
use crate::types::{ChapterEntry, ChapterId, Direction, Fragment};

/// Result of one batch load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The batch ran; `count` fragments were spliced into the display.
    Loaded { count: usize },
    /// Nothing left to load in that direction.
    Exhausted,
    /// Another batch load is still in flight; this call was a no-op.
    Busy,
    /// Transport failure; state is unchanged and the next edge trigger
    /// retries.
    Failed,
}

impl ChapterStream {
    /// Load the next batch of chapters in `direction` and splice the results
    /// in. Serialized by the `loading` flag: the flag is taken before the
    /// first fetch and released only after every insertion of the batch
    /// (including cross-book paths) has completed.
    #[instrument(skip(self))]
    pub async fn load_more(&mut self, direction: Direction) -> LoadOutcome {
        if self.loading {
            return LoadOutcome::Busy;
        }
        self.loading = true;
        let outcome = match self.load_more_inner(direction).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(%err, "batch load failed");
                LoadOutcome::Failed
            }
        };
        self.loading = false;
        outcome
    }

    async fn load_more_inner(&mut self, direction: Direction) -> Result<LoadOutcome, StreamError> {
        let frontier = match direction {
            Direction::Before => self.entries.first().cloned(),
            Direction::After => self.entries.last().cloned(),
        };
        let Some(frontier) = frontier else {
            return Ok(LoadOutcome::Exhausted);
        };

        if frontier.ordinal == 0 {
            let batch = self.same_book_batch(direction);
            if !batch.is_empty() {
                let home = self.home_book.clone();
                let mut count = 0;
                for chapter in batch {
                    if let Some(fragment) = self.load_chapter(&home, chapter).await? {
                        self.insert_fragment(&fragment, direction).await;
                        count += 1;
                    }
                    // failed chapters still extend the range so coverage
                    // stays contiguous
                    self.extend_home_bounds(chapter);
                }
                return Ok(LoadOutcome::Loaded { count });
            }
        }

        self.advance_step(frontier, direction).await
    }

    /// Resolve one chapter to a fragment, deduplicated against the loaded,
    /// cross-book and failed sets. Known identities never reach the network.
    pub(crate) async fn load_chapter(
        &mut self,
        book: &str,
        chapter: u32,
    ) -> Result<Option<Fragment>, StreamError> {
        let id = ChapterId::new(book, chapter);
        if self.is_known(&id) {
            debug!(%id, "chapter already resolved, skipping fetch");
            return Ok(None);
        }

        // chapter 1 of the home book lives on the book's base page
        let fetched = if book == self.home_book && chapter == 1 {
            self.fetcher.fetch_base(book).await
        } else {
            self.fetcher.fetch_chapter(book, chapter).await
        };
        let doc = fetched.map_err(StreamError::Fetch)?;

        let Some(doc) = doc else {
            debug!(%id, "chapter page missing, marking failed");
            self.failed.insert(id);
            return Ok(None);
        };
        if doc.posts.is_empty() {
            debug!(%id, "chapter page has no posts, marking failed");
            self.failed.insert(id);
            return Ok(None);
        }

        if book == self.home_book {
            self.loaded.insert(chapter);
        } else {
            self.cross.insert(id);
        }
        Ok(Some(Fragment {
            book: book.to_string(),
            chapter,
            posts: doc.posts,
        }))
    }

    /// Same-book chapters still owed in `direction`, nearest first, bounded
    /// by batch size and the book's chapter count. Already-failed chapters
    /// are included so the range keeps advancing past them; `load_chapter`
    /// skips their fetch.
    fn same_book_batch(&self, direction: Direction) -> Vec<u32> {
        let count = self
            .metadata
            .get(&self.home_book)
            .map(|m| m.chapter_count)
            .unwrap_or(1);
        match direction {
            Direction::After => {
                let start = self.max_loaded.saturating_add(1);
                let end = self
                    .max_loaded
                    .saturating_add(self.config.batch_size)
                    .min(count);
                (start..=end).collect()
            }
            Direction::Before => {
                let end = self.min_loaded.saturating_sub(1);
                let start = self
                    .min_loaded
                    .saturating_sub(self.config.batch_size)
                    .max(1);
                (start..=end).rev().collect()
            }
        }
    }

    /// One monotonic step past `frontier`: the next chapter of the frontier
    /// book, or chapter 1 / the last chapter of the neighboring book when
    /// the frontier book is exhausted in that direction. Cross-book loads go
    /// one chapter at a time.
    async fn advance_step(
        &mut self,
        frontier: ChapterEntry,
        direction: Direction,
    ) -> Result<LoadOutcome, StreamError> {
        let meta = self.resolve_metadata(&frontier.book).await?;

        let within = match direction {
            Direction::After => self.next_unfailed(
                &frontier.book,
                frontier.chapter.saturating_add(1),
                direction,
                meta.chapter_count,
            ),
            Direction::Before if frontier.chapter > 1 => self.next_unfailed(
                &frontier.book,
                frontier.chapter - 1,
                direction,
                meta.chapter_count,
            ),
            Direction::Before => None,
        };
        if let Some(chapter) = within {
            let book = frontier.book.clone();
            return self.load_and_insert(&book, chapter, direction).await;
        }

        let neighbor = match direction {
            Direction::After => meta.next,
            Direction::Before => meta.prev,
        };
        let Some(neighbor) = neighbor else {
            debug!(book = %frontier.book, "no neighbor past book edge");
            return Ok(LoadOutcome::Exhausted);
        };

        let neighbor_meta = self.resolve_metadata(&neighbor.book).await?;
        self.assign_ordinal(&neighbor.book, direction);
        let start = match direction {
            Direction::After => 1,
            Direction::Before => neighbor_meta.chapter_count,
        };
        match self.next_unfailed(&neighbor.book, start, direction, neighbor_meta.chapter_count) {
            Some(chapter) => self.load_and_insert(&neighbor.book, chapter, direction).await,
            None => Ok(LoadOutcome::Exhausted),
        }
    }

    async fn load_and_insert(
        &mut self,
        book: &str,
        chapter: u32,
        direction: Direction,
    ) -> Result<LoadOutcome, StreamError> {
        match self.load_chapter(book, chapter).await? {
            Some(fragment) => {
                self.insert_fragment(&fragment, direction).await;
                Ok(LoadOutcome::Loaded { count: 1 })
            }
            None => Ok(LoadOutcome::Loaded { count: 0 }),
        }
    }

    /// First chapter from `start` (inclusive, moving in `direction`) that is
    /// not permanently failed, within `1..=count`.
    fn next_unfailed(
        &self,
        book: &str,
        start: u32,
        direction: Direction,
        count: u32,
    ) -> Option<u32> {
        let mut chapter = start;
        loop {
            if chapter < 1 || chapter > count {
                return None;
            }
            if !self.failed.contains(&ChapterId::new(book, chapter)) {
                return Some(chapter);
            }
            match direction {
                Direction::After => chapter = chapter.checked_add(1)?,
                Direction::Before => chapter = chapter.checked_sub(1)?,
            }
        }
    }
}
