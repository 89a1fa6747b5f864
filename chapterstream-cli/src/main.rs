use std::fs;
use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use clap::Parser;
use directories::ProjectDirs;
use tokio::time::sleep;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{prelude::*, EnvFilter};
use url::Url;

use chapterstream_core::{
    BookChrome, ChapterFetcher, ChapterStream, Direction, Fragment, Geometry, LoadOutcome,
    MemorySurface, StreamAction, StreamConfig, Surface,
};
use chapterstream_html::HttpChapterFetcher;

#[derive(Debug, Parser)]
#[command(
    name = "chapterstream",
    version,
    about = "streams paginated book chapters from an imageboard-style site"
)]
struct Args {
    /// Base URL of the site serving /<book>/ and /<book>/<chapter>/ pages
    #[arg(long = "base-url")]
    base_url: Url,

    /// Book identifier to start from
    book: String,

    /// Chapter to open on
    #[arg(default_value_t = 1)]
    chapter: u32,

    /// Number of additional load steps to stream
    #[arg(short = 'n', long = "count", default_value_t = 5)]
    count: u32,

    /// Walk toward earlier chapters instead of later ones
    #[arg(long)]
    backward: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let project_dirs = ProjectDirs::from("net", "chapterstream", "chapterstream")
        .ok_or_else(|| anyhow!("unable to resolve platform data directories"))?;
    let _log_guard = init_logging(&project_dirs)?;
    let config = load_config(&project_dirs)?;

    let fetcher = Arc::new(HttpChapterFetcher::new(args.base_url.clone())?);
    let page = if args.chapter <= 1 {
        fetcher.fetch_base(&args.book).await?
    } else {
        fetcher.fetch_chapter(&args.book, args.chapter).await?
    }
    .ok_or_else(|| anyhow!("no chapter stream at {}/{}", args.book, args.chapter))?;

    info!(book = %args.book, chapter = args.chapter, "stream opened");
    println!("{} — {}", page.title, page.subtitle);

    let surface = TranscriptSurface::new(80.0, 240.0);
    let mut stream = ChapterStream::new(
        config,
        fetcher.clone(),
        Box::new(surface),
        page,
        args.chapter,
    );
    stream.initial_preload().await;

    let direction = if args.backward {
        Direction::Before
    } else {
        Direction::After
    };
    for _ in 0..args.count {
        match step(&mut stream, direction).await? {
            LoadOutcome::Exhausted => {
                println!("(no more chapters in that direction)");
                break;
            }
            LoadOutcome::Failed => {
                println!("(load failed, see the log; stopping)");
                break;
            }
            _ => {}
        }
    }
    Ok(())
}

/// Simulate one user gesture: fling to the relevant edge of loaded content,
/// wait out the debounce windows, and dispatch whatever the controller asks
/// for.
async fn step(stream: &mut ChapterStream, direction: Direction) -> Result<LoadOutcome> {
    let geometry = stream.surface_mut().geometry();
    let target = match direction {
        Direction::After => (geometry.scroll_width - geometry.client_width).max(0.0),
        Direction::Before => 0.0,
    };
    stream.surface_mut().set_scroll_left(target);
    stream.on_scroll(Instant::now());

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        sleep(Duration::from_millis(50)).await;
        match stream.poll(Instant::now()) {
            Some(StreamAction::Edge(edge)) => {
                let outcome = stream.load_more(edge).await;
                if direction == Direction::Before {
                    // a real container fires one scroll event for the
                    // splicer's correction; replay it so the suppression
                    // flag is consumed
                    stream.on_scroll(Instant::now());
                }
                stream.update_url();
                return Ok(outcome);
            }
            Some(StreamAction::NavSync) => stream.update_url(),
            None => {}
        }
        if Instant::now() > deadline {
            return Err(anyhow!("no edge trigger fired within the deadline"));
        }
    }
}

/// Memory-backed surface that prints the stream as it grows.
struct TranscriptSurface {
    inner: MemorySurface,
}

impl TranscriptSurface {
    fn new(column_width: f64, client_width: f64) -> Self {
        Self {
            inner: MemorySurface::new(column_width, client_width),
        }
    }
}

#[async_trait]
impl Surface for TranscriptSurface {
    fn geometry(&self) -> Geometry {
        self.inner.geometry()
    }

    fn insert(&mut self, index: usize, fragment: &Fragment) {
        self.inner.insert(index, fragment);
        println!("=== {} {} ===", fragment.book, fragment.chapter);
        for post in &fragment.posts {
            println!("{}", post.text);
        }
    }

    fn offset_of(&self, index: usize) -> f64 {
        self.inner.offset_of(index)
    }

    fn set_scroll_left(&mut self, px: f64) {
        self.inner.set_scroll_left(px);
    }

    async fn next_frame(&mut self) {
        self.inner.next_frame().await;
    }

    fn replace_url(&mut self, book: &str, chapter: u32) {
        self.inner.replace_url(book, chapter);
        println!("(address: /{book}/{chapter}/)");
    }

    fn apply_chrome(&mut self, chrome: &BookChrome) {
        self.inner.apply_chrome(chrome);
        println!("--- now reading {} ({} chapters) ---", chrome.title, chrome.chapter_count);
    }

    fn select_chapter_link(&mut self, chapter: u32) {
        self.inner.select_chapter_link(chapter);
    }
}

fn load_config(project_dirs: &ProjectDirs) -> Result<StreamConfig> {
    read_config(&project_dirs.config_dir().join("config.toml"))
}

fn read_config(path: &Path) -> Result<StreamConfig> {
    if !path.exists() {
        return Ok(StreamConfig::default());
    }
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read config at {:?}", path))?;
    toml::from_str(&raw).with_context(|| format!("failed to parse config at {:?}", path))
}

fn init_logging(project_dirs: &ProjectDirs) -> Result<WorkerGuard> {
    let log_dir = project_dirs.data_local_dir().join("logs");
    fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, "chapterstream.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer);
    // keep stdout for the transcript
    let console_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|err| anyhow!(err))?;

    Ok(guard)
}
