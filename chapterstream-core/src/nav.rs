use tracing::debug;

use crate::stream::ChapterStream;
use crate::types::BookChrome;

impl ChapterStream {
    /// Bring the address bar and the in-page navigation in line with
    /// whatever the viewport is showing. Runs on the long debounce timer;
    /// writes history replacements only, never pushes, so continuous
    /// scrolling leaves back/forward history alone.
    pub fn update_url(&mut self) {
        let geometry = self.surface.geometry();
        let view_start = geometry.scroll_left;
        let view_end = geometry.scroll_left + geometry.client_width;
        let view_center = geometry.scroll_left + geometry.client_width / 2.0;

        // the book whose content block sits closest to the viewport center;
        // strict comparison keeps the first entry in document order on ties
        let mut best: Option<(usize, f64)> = None;
        for index in 0..self.entries.len() {
            let start = self.surface.offset_of(index);
            let end = self.surface.offset_of(index + 1);
            if end <= view_start || start >= view_end {
                continue;
            }
            let distance = ((start + end) / 2.0 - view_center).abs();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        let Some((best_index, _)) = best else {
            return;
        };

        let detected_book = self.entries[best_index].book.clone();
        if detected_book != self.current_book {
            self.switch_book(&detected_book);
        }

        // leading chapter: leftmost visible entry belonging to the current
        // book, so stray cross-book content just past a boundary is not
        // mistaken for one of this book's chapters
        let mut leading = None;
        for (index, entry) in self.entries.iter().enumerate() {
            let start = self.surface.offset_of(index);
            let end = self.surface.offset_of(index + 1);
            if end <= view_start || start >= view_end {
                continue;
            }
            if entry.book == self.current_book {
                leading = Some(entry.chapter);
                break;
            }
        }
        let Some(chapter) = leading else {
            return;
        };

        let changed = self
            .last_url
            .as_ref()
            .map_or(true, |(book, ch)| *book != self.current_book || *ch != chapter);
        if changed {
            let book = self.current_book.clone();
            self.surface.replace_url(&book, chapter);
            self.surface.select_chapter_link(chapter);
            self.last_url = Some((book, chapter));
        }
    }

    /// Swap the page chrome to another book's cached metadata. Skipped
    /// silently when the metadata was never resolved; the enhancement is
    /// simply omitted.
    fn switch_book(&mut self, book: &str) {
        let Some(meta) = self.metadata.get(book) else {
            return;
        };
        let chrome = BookChrome {
            book: book.to_string(),
            title: meta.title.clone(),
            subtitle: meta.subtitle.clone(),
            chapter_count: meta.chapter_count,
            prev: meta.prev.clone(),
            next: meta.next.clone(),
        };
        self.surface.apply_chrome(&chrome);
        self.current_book = book.to_string();
        debug!(book, "displayed book switched");
    }
}
