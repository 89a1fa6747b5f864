use tracing::debug;

use crate::stream::ChapterStream;
use crate::types::{ChapterEntry, Direction, Fragment};

impl ChapterStream {
    /// Splice a fragment into the display at its sorted position and keep
    /// the visible content stable. Position is found by scanning the index
    /// for the first entry past the fragment's `(book ordinal, chapter)`
    /// key, so strictly ascending display order holds no matter what order
    /// loads complete in.
    pub(crate) async fn insert_fragment(&mut self, fragment: &Fragment, direction: Direction) {
        let ordinal = self.ordinals.get(&fragment.book).copied().unwrap_or(0);
        let entry = ChapterEntry {
            book: fragment.book.clone(),
            chapter: fragment.chapter,
            ordinal,
        };
        let key = entry.key();
        let index = self
            .entries
            .iter()
            .position(|existing| existing.key() > key)
            .unwrap_or(self.entries.len());

        match direction {
            Direction::After => {
                // added outside the current view to the right; nothing to
                // correct
                self.entries.insert(index, entry);
                self.surface.insert(index, fragment);
            }
            Direction::Before => {
                let before = self.surface.geometry();
                self.entries.insert(index, entry);
                self.surface.insert(index, fragment);

                // multi-column reflow is not synchronous; geometry is only
                // trustworthy two render passes after the mutation
                self.surface.next_frame().await;
                self.surface.next_frame().await;

                if self.first_scroll_at.is_none() {
                    // preload phase: no user-chosen position to preserve,
                    // pin the originally requested chapter to the leading
                    // edge instead
                    if let Some(initial_index) = self.initial_entry_index() {
                        let offset = self.surface.offset_of(initial_index);
                        self.suppress_scroll = true;
                        self.surface.set_scroll_left(offset);
                    }
                } else {
                    let after = self.surface.geometry();
                    let delta = after.scroll_width - before.scroll_width;
                    self.suppress_scroll = true;
                    self.surface.set_scroll_left(before.scroll_left + delta);
                }
            }
        }
        debug!(
            book = %fragment.book,
            chapter = fragment.chapter,
            index,
            posts = fragment.posts.len(),
            "fragment spliced"
        );
    }

    fn initial_entry_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.ordinal == 0 && e.chapter == self.initial_chapter)
    }
}
