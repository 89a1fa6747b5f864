use async_trait::async_trait;

use crate::types::{BookChrome, Fragment, Geometry};

/// The host page seam. The controller is the only structural writer: it
/// inserts fragments, corrects the scroll position, and swaps page chrome.
/// Geometry reads are synchronous; `next_frame` is the one await point that
/// lets the renderer apply pending mutations before geometry is re-read.
#[async_trait]
pub trait Surface: Send {
    fn geometry(&self) -> Geometry;

    /// Splice a fragment in at `index` within display order.
    fn insert(&mut self, index: usize, fragment: &Fragment);

    /// Leading-edge offset of the entry at `index`. `index == len` is valid
    /// and yields the trailing edge of the last entry.
    fn offset_of(&self, index: usize) -> f64;

    fn set_scroll_left(&mut self, px: f64);

    /// Resolve after the renderer has applied one layout pass.
    async fn next_frame(&mut self);

    /// History replacement only; must never push an entry or trigger a real
    /// navigation.
    fn replace_url(&mut self, book: &str, chapter: u32);

    /// Swap title, subtitle, neighbor links and the regenerated chapter
    /// navigation when the displayed book changes.
    fn apply_chrome(&mut self, chrome: &BookChrome);

    /// Mark one chapter-number link selected, clearing the marker elsewhere.
    fn select_chapter_link(&mut self, chapter: u32);
}

/// In-memory surface with a simulated multi-column layout: every post
/// occupies exactly one column. Records the cosmetic side effects so tests
/// and headless drivers can assert on them.
pub struct MemorySurface {
    column_width: f64,
    client_width: f64,
    scroll_left: f64,
    widths: Vec<f64>,
    pub replaced_urls: Vec<(String, u32)>,
    pub chrome_swaps: Vec<BookChrome>,
    pub selected_chapter: Option<u32>,
    pub frames_awaited: usize,
}

impl MemorySurface {
    pub fn new(column_width: f64, client_width: f64) -> Self {
        Self {
            column_width,
            client_width,
            scroll_left: 0.0,
            widths: Vec::new(),
            replaced_urls: Vec::new(),
            chrome_swaps: Vec::new(),
            selected_chapter: None,
            frames_awaited: 0,
        }
    }

    pub fn scroll_left(&self) -> f64 {
        self.scroll_left
    }

    /// Simulated user scroll to the far right edge.
    pub fn scroll_to_end(&mut self) {
        self.scroll_left = (self.total_width() - self.client_width).max(0.0);
    }

    pub fn scroll_to(&mut self, px: f64) {
        self.scroll_left = px.max(0.0);
    }

    fn total_width(&self) -> f64 {
        self.widths.iter().sum()
    }
}

#[async_trait]
impl Surface for MemorySurface {
    fn geometry(&self) -> Geometry {
        Geometry {
            scroll_left: self.scroll_left,
            scroll_width: self.total_width().max(self.client_width),
            client_width: self.client_width,
            column_width: self.column_width,
        }
    }

    fn insert(&mut self, index: usize, fragment: &Fragment) {
        let width = fragment.posts.len() as f64 * self.column_width;
        self.widths.insert(index, width);
    }

    fn offset_of(&self, index: usize) -> f64 {
        self.widths.iter().take(index).sum()
    }

    fn set_scroll_left(&mut self, px: f64) {
        self.scroll_left = px.max(0.0);
    }

    async fn next_frame(&mut self) {
        // layout here is synchronous; just count the checkpoint
        self.frames_awaited += 1;
    }

    fn replace_url(&mut self, book: &str, chapter: u32) {
        self.replaced_urls.push((book.to_string(), chapter));
    }

    fn apply_chrome(&mut self, chrome: &BookChrome) {
        self.chrome_swaps.push(chrome.clone());
    }

    fn select_chapter_link(&mut self, chapter: u32) {
        self.selected_chapter = Some(chapter);
    }
}
