use kuchiki::traits::*;
use kuchiki::NodeRef;
use serde::Deserialize;
use tracing::debug;

use chapterstream_core::{BookRef, ChapterDocument, ContentPost};

/// Structured neighbor manifest embedded by newer pages. Preferred over
/// sniffing the subtitle links because the rendered markup is not a stable
/// interface.
#[derive(Debug, Deserialize)]
struct BookNavManifest {
    prev: Option<BookRef>,
    next: Option<BookRef>,
}

/// Parse a fetched book or chapter page into the document model. Returns
/// `None` when the page carries no chapter-stream container (the feature is
/// inapplicable there); any other missing piece degrades to an empty field
/// rather than an error.
pub fn parse_chapter_document(html: &str) -> Option<ChapterDocument> {
    let doc = kuchiki::parse_html().one(html.to_string());

    let container = doc.select_first("div.chapter-stream").ok()?;
    let book = {
        let attrs = container.attributes.borrow();
        attrs.get("data-book").map(str::to_string)
    }?;
    if book.is_empty() {
        return None;
    }

    let title = doc
        .select_first("h1.book-title")
        .ok()
        .map(|node| normalize_ws(&node.text_contents()))
        .unwrap_or_default();
    let (prev, next) = neighbor_refs(&doc);

    Some(ChapterDocument {
        book,
        title,
        subtitle: subtitle_text(&doc),
        posts: extract_posts(&doc),
        chapter_nav: extract_chapter_nav(&doc),
        prev,
        next,
    })
}

/// All content posts in document order. The first post of each chapter
/// carries a chapter-marker span holding the chapter number.
fn extract_posts(doc: &NodeRef) -> Vec<ContentPost> {
    let mut posts = Vec::new();
    if let Ok(matches) = doc.select("div.content-post") {
        for post in matches {
            let node = post.as_node();
            let chapter = node
                .select_first("span.chapter-marker")
                .ok()
                .and_then(|marker| marker.text_contents().trim().parse().ok());
            posts.push(ContentPost {
                chapter,
                html: outer_html(node),
                text: normalize_ws(&node.text_contents()),
            });
        }
    }
    posts
}

/// Chapter numbers referenced by the page's chapter navigation; the maximum
/// is the book's chapter count.
fn extract_chapter_nav(doc: &NodeRef) -> Vec<u32> {
    let mut numbers = Vec::new();
    if let Ok(anchors) = doc.select("nav.chapter-nav a") {
        for anchor in anchors {
            if let Ok(number) = anchor.text_contents().trim().parse::<u32>() {
                numbers.push(number);
            }
        }
    }
    numbers
}

/// Subtitle text proper: the direct text children of the subtitle element,
/// excluding any embedded neighbor links.
fn subtitle_text(doc: &NodeRef) -> String {
    let Ok(subtitle) = doc.select_first("p.subtitle") else {
        return String::new();
    };
    let mut out = String::new();
    for child in subtitle.as_node().children() {
        if let Some(text) = child.as_text() {
            out.push_str(&text.borrow());
        }
    }
    normalize_ws(&out)
}

fn neighbor_refs(doc: &NodeRef) -> (Option<BookRef>, Option<BookRef>) {
    if let Ok(script) = doc.select_first("script#book-nav") {
        match serde_json::from_str::<BookNavManifest>(&script.text_contents()) {
            Ok(manifest) => return (manifest.prev, manifest.next),
            Err(err) => {
                debug!(%err, "book-nav manifest unreadable, falling back to link sniffing")
            }
        }
    }

    // legacy pages mark neighbors with a float style or a guillemet in the
    // link label
    let mut prev = None;
    let mut next = None;
    if let Ok(anchors) = doc.select("p.subtitle a[href]") {
        for anchor in anchors {
            let (href, style) = {
                let attrs = anchor.attributes.borrow();
                (
                    attrs.get("href").unwrap_or("").to_string(),
                    attrs.get("style").unwrap_or("").to_string(),
                )
            };
            let Some(book) = book_from_href(&href) else {
                continue;
            };
            let label_raw = anchor.text_contents();
            let style = style.replace(' ', "");
            let is_prev = style.contains("float:left") || label_raw.contains('«');
            let is_next = style.contains("float:right") || label_raw.contains('»');
            let reference = BookRef {
                book,
                label: normalize_ws(&label_raw.replace(['«', '»'], "")),
            };
            if is_prev && prev.is_none() {
                prev = Some(reference);
            } else if is_next && next.is_none() {
                next = Some(reference);
            }
        }
    }
    (prev, next)
}

/// Last path segment of a neighbor link, e.g. `/exo/` -> `exo`.
fn book_from_href(href: &str) -> Option<String> {
    let seg = href.trim_end_matches('/').rsplit('/').next()?;
    if seg.is_empty() {
        None
    } else {
        Some(seg.to_string())
    }
}

fn outer_html(node: &NodeRef) -> String {
    let mut buf = Vec::new();
    if node.serialize(&mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}

fn normalize_ws(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_space = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(ch);
            last_space = false;
        }
    }
    out.trim().to_string()
}
