use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::{instrument, warn};

use crate::config::StreamConfig;
use crate::fetch::ChapterFetcher;
use crate::surface::Surface;
use crate::types::{BookMetadata, ChapterDocument, ChapterEntry, ChapterId, Direction, Fragment};

/// One-per-page-view controller for streaming chapters into a paginated
/// display. All session state lives here; the fetcher and the surface are
/// injected seams so the controller itself stays headless.
pub struct ChapterStream {
    pub(crate) config: StreamConfig,
    pub(crate) fetcher: Arc<dyn ChapterFetcher>,
    pub(crate) surface: Box<dyn Surface>,

    /// Book the page view started on. Same-book range bookkeeping is keyed
    /// to it; everything else is cross-book.
    pub(crate) home_book: String,
    /// Book identity the page currently displays; follows the viewport.
    pub(crate) current_book: String,
    pub(crate) initial_chapter: u32,

    /// Contiguous inclusive bound of home-book chapters spliced in. Every
    /// chapter inside it is either loaded or permanently failed.
    pub(crate) min_loaded: u32,
    pub(crate) max_loaded: u32,
    pub(crate) loaded: BTreeSet<u32>,
    pub(crate) cross: HashSet<ChapterId>,
    pub(crate) failed: HashSet<ChapterId>,

    /// Ordered index of spliced chapters; the surface is a projection of it.
    pub(crate) entries: Vec<ChapterEntry>,
    pub(crate) metadata: HashMap<String, BookMetadata>,
    pub(crate) ordinals: HashMap<String, i32>,

    /// Serializes batch loads; a second call while one is in flight no-ops.
    pub(crate) loading: bool,
    /// Armed permanently once the first real scroll is `arm_delay` old.
    pub(crate) loading_enabled: bool,
    pub(crate) first_scroll_at: Option<Instant>,
    /// The next scroll event is a programmatic correction, not the user.
    pub(crate) suppress_scroll: bool,
    pub(crate) preload_done: bool,

    pub(crate) last_scroll_at: Option<Instant>,
    pub(crate) edge_pending: bool,
    pub(crate) nav_pending: bool,
    pub(crate) last_url: Option<(String, u32)>,
}

impl ChapterStream {
    /// Build the controller from the page the view landed on. The page's own
    /// posts become the first entry of the index; its navigation data seeds
    /// the metadata cache for the home book.
    pub fn new(
        config: StreamConfig,
        fetcher: Arc<dyn ChapterFetcher>,
        surface: Box<dyn Surface>,
        page: ChapterDocument,
        initial_chapter: u32,
    ) -> Self {
        let book = page.book.clone();
        let meta = page.metadata();
        let mut stream = Self {
            config,
            fetcher,
            surface,
            home_book: book.clone(),
            current_book: book.clone(),
            initial_chapter,
            min_loaded: initial_chapter,
            max_loaded: initial_chapter,
            loaded: BTreeSet::new(),
            cross: HashSet::new(),
            failed: HashSet::new(),
            entries: Vec::new(),
            metadata: HashMap::new(),
            ordinals: HashMap::new(),
            loading: false,
            loading_enabled: false,
            first_scroll_at: None,
            suppress_scroll: false,
            preload_done: false,
            last_scroll_at: None,
            edge_pending: false,
            nav_pending: false,
            last_url: Some((book.clone(), initial_chapter)),
        };
        stream.metadata.insert(book.clone(), meta);
        stream.ordinals.insert(book.clone(), 0);
        stream.loaded.insert(initial_chapter);
        let fragment = Fragment {
            book: book.clone(),
            chapter: initial_chapter,
            posts: page.posts,
        };
        stream.entries.push(ChapterEntry {
            book,
            chapter: initial_chapter,
            ordinal: 0,
        });
        stream.surface.insert(0, &fragment);
        stream
    }

    /// Pull in the chapter just before the initial one so the user can
    /// scroll left immediately. Runs once at startup, before any real
    /// scroll, and leaves the initially requested chapter at the viewport's
    /// leading edge.
    #[instrument(skip(self))]
    pub async fn initial_preload(&mut self) {
        if self.config.preload_before && self.initial_chapter > 1 {
            let home = self.home_book.clone();
            let chapter = self.initial_chapter - 1;
            match self.load_chapter(&home, chapter).await {
                Ok(Some(fragment)) => {
                    self.insert_fragment(&fragment, Direction::Before).await;
                    self.extend_home_bounds(chapter);
                }
                Ok(None) => self.extend_home_bounds(chapter),
                Err(err) => warn!(%err, "initial preload failed"),
            }
        }
        self.preload_done = true;
    }

    pub fn current_book(&self) -> &str {
        &self.current_book
    }

    pub fn loaded_range(&self) -> (u32, u32) {
        (self.min_loaded, self.max_loaded)
    }

    pub fn entries(&self) -> &[ChapterEntry] {
        &self.entries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn loading_enabled(&self) -> bool {
        self.loading_enabled
    }

    pub fn book_metadata(&self, book: &str) -> Option<&BookMetadata> {
        self.metadata.get(book)
    }

    pub fn surface_mut(&mut self) -> &mut dyn Surface {
        &mut *self.surface
    }

    pub(crate) fn extend_home_bounds(&mut self, chapter: u32) {
        self.min_loaded = self.min_loaded.min(chapter);
        self.max_loaded = self.max_loaded.max(chapter);
    }

    pub(crate) fn is_known(&self, id: &ChapterId) -> bool {
        if self.failed.contains(id) {
            return true;
        }
        if id.book == self.home_book {
            self.loaded.contains(&id.chapter)
        } else {
            self.cross.contains(id)
        }
    }

    /// Assign a display ordinal to a book just crossed into, one step past
    /// the current extreme in that direction.
    pub(crate) fn assign_ordinal(&mut self, book: &str, direction: Direction) -> i32 {
        if let Some(ordinal) = self.ordinals.get(book) {
            return *ordinal;
        }
        let ordinal = match direction {
            Direction::After => self.ordinals.values().copied().max().unwrap_or(0) + 1,
            Direction::Before => self.ordinals.values().copied().min().unwrap_or(0) - 1,
        };
        self.ordinals.insert(book.to_string(), ordinal);
        ordinal
    }

    #[cfg(test)]
    pub(crate) fn set_loading_for_test(&mut self, loading: bool) {
        self.loading = loading;
    }
}
