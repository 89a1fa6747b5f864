//! Headless controller for streaming paginated book chapters into a live
//! multi-column display: edge detection, deduplicated chapter loading,
//! ordered splicing with scroll-position preservation, address/navigation
//! sync, and cross-book boundary resolution. Network access and the host
//! page are injected through the [`ChapterFetcher`] and [`Surface`] seams.

pub mod config;
pub mod error;
pub mod fetch;
pub mod surface;
pub mod types;

mod books;
mod loader;
mod nav;
mod splice;
mod stream;
mod viewport;

pub use config::StreamConfig;
pub use error::StreamError;
pub use fetch::ChapterFetcher;
pub use loader::LoadOutcome;
pub use stream::ChapterStream;
pub use surface::{MemorySurface, Surface};
pub use types::{
    BookChrome, BookMetadata, BookRef, ChapterDocument, ChapterEntry, ChapterId, ContentPost,
    Direction, Fragment, Geometry,
};
pub use viewport::StreamAction;
