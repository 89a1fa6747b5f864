use std::fmt;

use serde::Deserialize;

/// Composite identity of one chapter: a book token plus a 1-based chapter
/// number. Chapter numbers within a book are contiguous from 1 up to the
/// book's declared chapter count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChapterId {
    pub book: String,
    pub chapter: u32,
}

impl ChapterId {
    pub fn new(book: impl Into<String>, chapter: u32) -> Self {
        Self {
            book: book.into(),
            chapter,
        }
    }
}

impl fmt::Display for ChapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.book, self.chapter)
    }
}

/// One displayable content block. The first post of each chapter carries the
/// chapter marker, so `chapter` is populated on that post only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentPost {
    pub chapter: Option<u32>,
    pub html: String,
    pub text: String,
}

/// The unit the splicer inserts: all posts of one chapter, in the relative
/// order they appeared in the fetched document.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub book: String,
    pub chapter: u32,
    pub posts: Vec<ContentPost>,
}

/// Reference to a neighboring book: identifier plus short display label.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BookRef {
    pub book: String,
    pub label: String,
}

/// Per-book metadata, cached once resolved and never invalidated within a
/// session (the served content is static).
#[derive(Debug, Clone, Default)]
pub struct BookMetadata {
    pub title: String,
    pub subtitle: String,
    pub chapter_count: u32,
    pub prev: Option<BookRef>,
    pub next: Option<BookRef>,
}

/// Parsed form of one fetched book or chapter page.
#[derive(Debug, Clone)]
pub struct ChapterDocument {
    pub book: String,
    pub title: String,
    pub subtitle: String,
    pub posts: Vec<ContentPost>,
    pub chapter_nav: Vec<u32>,
    pub prev: Option<BookRef>,
    pub next: Option<BookRef>,
}

impl ChapterDocument {
    pub fn metadata(&self) -> BookMetadata {
        BookMetadata {
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            chapter_count: self.chapter_nav.iter().copied().max().unwrap_or(1),
            prev: self.prev.clone(),
            next: self.next.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Before,
    After,
}

/// Scroll geometry of the content container, all in pixels along the
/// horizontal (multi-column) axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub scroll_left: f64,
    pub scroll_width: f64,
    pub client_width: f64,
    pub column_width: f64,
}

/// One slot in the ordered index of spliced chapters. The display surface is
/// a projection of this index; entries are kept sorted by `key()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterEntry {
    pub book: String,
    pub chapter: u32,
    /// Position of the owning book relative to the home book (home = 0,
    /// next = +1, previous = -1, transitively).
    pub ordinal: i32,
}

impl ChapterEntry {
    pub fn key(&self) -> (i32, u32) {
        (self.ordinal, self.chapter)
    }
}

/// Everything the host page swaps when the displayed book changes: title,
/// subtitle, neighbor links, and the chapter-number navigation.
#[derive(Debug, Clone)]
pub struct BookChrome {
    pub book: String,
    pub title: String,
    pub subtitle: String,
    pub chapter_count: u32,
    pub prev: Option<BookRef>,
    pub next: Option<BookRef>,
}
