//! Atom/RSS entry extraction.
//!
//! Atom-namespaced `<entry>` elements win; if a document contains none, the
//! parser falls back to generic `<item>`/`<title>`/`<link>` elements so that
//! legacy RSS feeds still yield entries.

use chrono::DateTime;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::FetchError;

use super::FeedEntry;

/// Which container element the cursor is inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    /// Atom `<entry>`.
    Entry,
    /// RSS `<item>`.
    Item,
}

/// Which child element's text is being captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Title,
    Link,
    Published,
    Updated,
    PubDate,
}

#[derive(Debug, Default)]
struct Draft {
    title: String,
    url: String,
    published: String,
    updated: String,
}

impl Draft {
    /// Atom timestamps are RFC 3339 (`published` preferred over `updated`),
    /// RSS `pubDate` is RFC 2822. Anything unparseable becomes 0 (unknown).
    fn published_ts(&self, section: Section) -> i64 {
        match section {
            Section::Entry => [&self.published, &self.updated]
                .into_iter()
                .filter(|s| !s.is_empty())
                .find_map(|s| DateTime::parse_from_rfc3339(s).ok())
                .map_or(0, |d| d.timestamp()),
            Section::Item => DateTime::parse_from_rfc2822(&self.published)
                .map_or(0, |d| d.timestamp()),
            Section::None => 0,
        }
    }

    fn finish(self, section: Section) -> FeedEntry {
        let published_ts = self.published_ts(section);
        FeedEntry {
            title: self.title.trim().to_string(),
            url: self.url.trim().to_string(),
            published_ts,
            content: String::new(),
        }
    }
}

fn href_attribute(element: &BytesStart<'_>) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"href")
        .and_then(|attr| attr.unescape_value().ok())
        .map(|v| v.into_owned())
}

fn malformed(e: impl std::fmt::Display) -> FetchError {
    FetchError::MalformedFeed {
        message: e.to_string(),
    }
}

/// Parses feed markup into entries.
///
/// # Errors
/// Fails with [`FetchError::MalformedFeed`] if the markup is not well-formed
/// XML. A well-formed document with no recognizable entries yields an empty
/// list, not an error.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedEntry>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut atom_entries: Vec<FeedEntry> = Vec::new();
    let mut rss_items: Vec<FeedEntry> = Vec::new();

    let mut section = Section::None;
    let mut field = Field::None;
    let mut draft = Draft::default();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"entry" => {
                    section = Section::Entry;
                    draft = Draft::default();
                }
                b"item" => {
                    section = Section::Item;
                    draft = Draft::default();
                }
                b"title" if section != Section::None => field = Field::Title,
                b"link" => match section {
                    Section::Entry => {
                        if draft.url.is_empty() {
                            if let Some(href) = href_attribute(&e) {
                                draft.url = href;
                            }
                        }
                    }
                    Section::Item => field = Field::Link,
                    Section::None => {}
                },
                b"published" if section == Section::Entry => field = Field::Published,
                b"updated" if section == Section::Entry => field = Field::Updated,
                b"pubDate" if section == Section::Item => field = Field::PubDate,
                _ => {}
            },
            Event::Empty(e) => {
                // Atom links are usually self-closing: <link href="..."/>
                if e.local_name().as_ref() == b"link"
                    && section == Section::Entry
                    && draft.url.is_empty()
                {
                    if let Some(href) = href_attribute(&e) {
                        draft.url = href;
                    }
                }
            }
            Event::Text(t) => {
                let text = t.unescape().map_err(malformed)?;
                append_field(&mut draft, field, &text);
            }
            Event::CData(t) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                append_field(&mut draft, field, &text);
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"entry" => {
                    atom_entries.push(std::mem::take(&mut draft).finish(Section::Entry));
                    section = Section::None;
                }
                b"item" => {
                    rss_items.push(std::mem::take(&mut draft).finish(Section::Item));
                    section = Section::None;
                }
                _ => field = Field::None,
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if atom_entries.is_empty() {
        Ok(rss_items)
    } else {
        Ok(atom_entries)
    }
}

fn append_field(draft: &mut Draft, field: Field, text: &str) {
    let slot = match field {
        Field::Title => &mut draft.title,
        Field::Link => &mut draft.url,
        Field::Published | Field::PubDate => &mut draft.published,
        Field::Updated => &mut draft.updated,
        Field::None => return,
    };
    slot.push_str(text);
}
