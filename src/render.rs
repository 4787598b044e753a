//! Turns raw feed XML into something a page can show.
//!
//! Parsing happens in three steps: build the XML tree, decide whether the
//! document is RSS or Atom, then pull a fixed set of fields out of it.
//! Nothing here trusts the feed: entry bodies are reduced to plain text and
//! every string placed into the HTML view goes through the template
//! engine's HTML escaper.

use askama::Template;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use roxmltree::{Document, Node, ParsingOptions};
use scraper::Html;
use thiserror::Error;

pub const SUMMARY_LIMIT: usize = 300;

const DATE_FORMAT: &str = "%b %-d, %Y";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to parse RSS feed. Invalid XML format.")]
    Parse,

    #[error("Unrecognized feed format. Please ensure the URL is a valid RSS or Atom feed.")]
    UnrecognizedFormat,

    #[error("Failed to render feed view: {0}")]
    Template(#[from] askama::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Atom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    /// Display-ready date, or the raw value when it could not be parsed.
    pub published: Option<String>,
    /// Plain text, truncated, not yet escaped.
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFeed {
    pub kind: FeedKind,
    pub title: String,
    pub subtitle: Option<String>,
    pub count_label: &'static str,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone)]
pub struct RenderedView {
    pub feed: ParsedFeed,
    pub html: String,
}

#[derive(Template)]
#[template(path = "feed_view.html")]
struct FeedViewTemplate<'a> {
    feed: &'a ParsedFeed,
}

/// The top-level container found in a parsed document.
enum FeedFormat<'a, 'input> {
    Rss(Node<'a, 'input>),
    Atom(Node<'a, 'input>),
}

impl<'a, 'input> FeedFormat<'a, 'input> {
    /// `channel` wins over `feed` when both are present.
    fn detect(doc: &'a Document<'input>) -> Option<Self> {
        if let Some(channel) = find_element(doc.root(), "channel") {
            return Some(FeedFormat::Rss(channel));
        }
        find_element(doc.root(), "feed").map(FeedFormat::Atom)
    }

    fn extract(self) -> ParsedFeed {
        match self {
            FeedFormat::Rss(channel) => extract_rss(channel),
            FeedFormat::Atom(feed) => extract_atom(feed),
        }
    }
}

/// Parses a feed and renders it to an HTML fragment.
pub fn render(xml: &str) -> Result<RenderedView, RenderError> {
    let feed = parse_feed(xml)?;
    let html = FeedViewTemplate { feed: &feed }.render()?;
    Ok(RenderedView { feed, html })
}

pub fn parse_feed(xml: &str) -> Result<ParsedFeed, RenderError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options).map_err(|_| RenderError::Parse)?;

    if find_element(doc.root(), "parsererror").is_some() {
        return Err(RenderError::Parse);
    }

    FeedFormat::detect(&doc)
        .map(FeedFormat::extract)
        .ok_or(RenderError::UnrecognizedFormat)
}

fn extract_rss(channel: Node) -> ParsedFeed {
    // RSS 1.0 keeps its items next to the channel rather than inside it.
    let entries = channel
        .document()
        .descendants()
        .filter(|n| is_named(n, "item"))
        .map(|item| FeedEntry {
            title: child_text(item, "title").unwrap_or_else(|| "Untitled".to_string()),
            link: child_text(item, "link").unwrap_or_else(|| "#".to_string()),
            published: child_text(item, "pubDate").map(|d| format_date(&d)),
            summary: child_text(item, "description").map(|d| summarize(&d)),
        })
        .collect();

    ParsedFeed {
        kind: FeedKind::Rss,
        title: child_text(channel, "title").unwrap_or_else(|| "RSS Feed".to_string()),
        subtitle: child_text(channel, "description"),
        count_label: "Items",
        entries,
    }
}

fn extract_atom(feed: Node) -> ParsedFeed {
    let entries = feed
        .descendants()
        .filter(|n| is_named(n, "entry"))
        .map(|entry| FeedEntry {
            title: child_text(entry, "title").unwrap_or_else(|| "Untitled".to_string()),
            link: atom_link(entry).unwrap_or_else(|| "#".to_string()),
            published: child_text(entry, "updated").map(|d| format_date(&d)),
            summary: child_text(entry, "summary")
                .or_else(|| child_text(entry, "content"))
                .map(|d| summarize(&d)),
        })
        .collect();

    ParsedFeed {
        kind: FeedKind::Atom,
        title: child_text(feed, "title").unwrap_or_else(|| "Atom Feed".to_string()),
        subtitle: child_text(feed, "subtitle"),
        count_label: "Entries",
        entries,
    }
}

fn is_named(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn find_element<'a, 'input>(root: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    root.descendants().find(|n| is_named(n, name))
}

/// Concatenated, trimmed text of the first child element called `name`
/// that has any. Empty elements (e.g. `<atom:link/>` next to an RSS
/// `<link>`) are skipped.
fn child_text(node: Node, name: &str) -> Option<String> {
    node.children()
        .filter(|n| is_named(n, name))
        .find_map(|child| {
            let text: String = child
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect();
            non_empty(&text)
        })
}

fn atom_link(entry: Node) -> Option<String> {
    let links: Vec<Node> = entry
        .children()
        .filter(|n| is_named(n, "link") && n.has_attribute("href"))
        .collect();

    let preferred = links
        .iter()
        .find(|l| matches!(l.attribute("rel"), None | Some("alternate")))
        .or_else(|| links.first())?;

    preferred.attribute("href").and_then(non_empty)
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn summarize(body: &str) -> String {
    truncate(&strip_html(body), SUMMARY_LIMIT)
}

/// Reduces an HTML snippet to its text content, decoding entities.
pub fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let text: String = fragment.root_element().text().collect();
    text.trim().to_string()
}

/// Keeps the first `limit` characters and appends `...` when anything was cut.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(limit).collect();
    truncated.push_str("...");
    truncated
}

/// Formats a feed date as e.g. `Jun 10, 2003`, or returns it untouched if
/// it isn't a date we can read.
pub fn format_date(raw: &str) -> String {
    match parse_date(raw.trim()) {
        Some(date) => date.format(DATE_FORMAT).to_string(),
        None => raw.to_string(),
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // Feeds often carry a weekday that doesn't match the date.
    let without_weekday = text
        .split_once(',')
        .filter(|(day, _)| !day.is_empty() && day.chars().all(|c| c.is_ascii_alphabetic()))
        .map_or(text, |(_, rest)| rest.trim());

    if let Ok(dt) = DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc2822(without_weekday))
        .or_else(|_| DateTime::parse_from_rfc3339(text))
    {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }

    // RFC 822 with a zone name chrono doesn't know (CEST, AEDT, ...):
    // take the date as written.
    let (local, zone) = without_weekday.rsplit_once(' ')?;
    if !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    NaiveDateTime::parse_from_str(local, "%d %b %Y %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(local, "%d %b %Y %H:%M"))
        .map(|dt| dt.date())
        .ok()
}
