//! Title, byline, date and related metadata.
//!
//! Every field is resolved through a fixed fallback chain; the first source
//! that yields a non-empty value wins. Sources are read from the original
//! [`Document`], except for the content heading and lead paragraph, which
//! come from the selected content via [`ContentHints`].

use serde_json::Value;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

use crate::dom_tree::{DomTree, NodeId};
use crate::metrics::normalize_text;
use crate::parse::Document;

/// Bylines longer than this are page furniture, not a name.
const MAX_BYLINE_CHARS: usize = 100;
const MIN_EXCERPT_CHARS: usize = 50;
const MAX_EXCERPT_CHARS: usize = 300;

/// Represents all extracted metadata from a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub date: Option<OffsetDateTime>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub language: Option<String>,
}

/// Facts taken from the selected content rather than the whole page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentHints {
    /// Text of the first `<h1>` in the content
    pub heading: Option<String>,
    /// First paragraph long enough to stand as an excerpt
    pub lead_paragraph: Option<String>,
}

impl ContentHints {
    pub fn from_tree(tree: &DomTree, root: NodeId) -> Self {
        let text_of = |id: NodeId| normalize_text(&tree.text_content(id));
        let heading = tree
            .find_all(root, "h1")
            .into_iter()
            .map(text_of)
            .find(|t| !t.is_empty());
        let lead_paragraph = tree
            .find_all(root, "p")
            .into_iter()
            .map(text_of)
            .find(|t| t.chars().count() > MIN_EXCERPT_CHARS);
        Self { heading, lead_paragraph }
    }
}

impl Document {
    /// Title fallback chain:
    /// 1. `[itemprop="headline"]` text (or `content` on a `<meta>`)
    /// 2. `<title>` element
    /// 3. First `<h1>` of the selected content
    /// 4. Open Graph `og:title`
    pub fn extract_title(&self, hints: &ContentHints) -> Option<String> {
        self.select_first("[itemprop=\"headline\"]")
            .and_then(|el| match el.tag_name().as_str() {
                "meta" => el.attr("content").map(normalize_text),
                _ => Some(el.text()),
            })
            .filter(|t| !t.is_empty())
            .or_else(|| self.title())
            .or_else(|| hints.heading.clone())
            .or_else(|| self.meta_content("og:title"))
    }

    /// Byline fallback chain:
    /// 1. `[rel="author"]` text
    /// 2. Short text of an element whose class or id mentions `byline` or `author`
    /// 3. JSON-LD `author` (string, object, or array)
    /// 4. Meta `author`
    pub fn extract_byline(&self, json_ld: &[Value]) -> Option<String> {
        if let Ok(elements) = self.select("[rel=\"author\"]")
            && let Some(text) = elements.iter().map(|el| el.text()).find(|t| !t.is_empty())
        {
            return Some(text);
        }

        for selector in ["[class*=\"byline\"]", "[id*=\"byline\"]", "[class*=\"author\"]", "[id*=\"author\"]"] {
            if let Ok(elements) = self.select(selector)
                && let Some(text) = elements
                    .iter()
                    .filter(|el| el.tag_name() != "meta")
                    .map(|el| el.text())
                    .find(|t| !t.is_empty() && t.chars().count() < MAX_BYLINE_CHARS)
            {
                return Some(text);
            }
        }

        json_ld
            .iter()
            .filter_map(|obj| obj.get("author"))
            .find_map(author_name)
            .or_else(|| self.meta_content("author"))
    }

    /// Date fallback chain, each source parsed with [`parse_date`]:
    /// 1. `<time datetime="">`, every one in document order
    /// 2. Meta `article:published_time`
    /// 3. JSON-LD `datePublished`
    ///
    /// Sources that fail to parse are skipped; if none parse the date is
    /// absent.
    pub fn extract_date(&self, json_ld: &[Value]) -> Option<OffsetDateTime> {
        let time_attrs: Vec<String> = self
            .select("time[datetime]")
            .unwrap_or_default()
            .iter()
            .filter_map(|el| el.attr("datetime").map(str::to_string))
            .collect();
        let published = self.meta_content("article:published_time");
        let structured = json_ld
            .iter()
            .find_map(|obj| obj.get("datePublished").and_then(Value::as_str))
            .map(str::to_string);

        time_attrs
            .into_iter()
            .chain(published)
            .chain(structured)
            .find_map(|raw| parse_date(&raw))
    }

    /// Excerpt fallback chain:
    /// 1. Open Graph `og:description`
    /// 2. Meta `description`
    /// 3. JSON-LD `description`
    /// 4. First long paragraph of the content, cut at 300 characters
    pub fn extract_excerpt(&self, json_ld: &[Value], hints: &ContentHints) -> Option<String> {
        self.meta_content("og:description")
            .or_else(|| self.meta_content("description"))
            .or_else(|| {
                json_ld
                    .iter()
                    .find_map(|obj| obj.get("description").and_then(Value::as_str))
                    .map(normalize_text)
                    .filter(|d| !d.is_empty())
            })
            .or_else(|| hints.lead_paragraph.as_deref().map(truncate_excerpt))
    }

    /// Site name fallback chain:
    /// 1. Open Graph `og:site_name`
    /// 2. JSON-LD `publisher` (string or object `name`)
    /// 3. Domain from the base URL
    pub fn extract_site_name(&self, json_ld: &[Value]) -> Option<String> {
        self.meta_content("og:site_name")
            .or_else(|| {
                json_ld
                    .iter()
                    .filter_map(|obj| obj.get("publisher"))
                    .find_map(author_name)
            })
            .or_else(|| self.base_url().and_then(|url| url.domain()).map(str::to_string))
    }

    /// Extract all metadata at once
    pub fn extract_metadata(&self, hints: &ContentHints) -> Metadata {
        let json_ld = self.json_ld();
        Metadata {
            title: self.extract_title(hints),
            byline: self.extract_byline(&json_ld),
            date: self.extract_date(&json_ld),
            excerpt: self.extract_excerpt(&json_ld, hints),
            site_name: self.extract_site_name(&json_ld),
            language: self.language(),
        }
    }

    /// Every JSON-LD object on the page, with arrays and `@graph`
    /// containers flattened. Blocks that fail to parse are skipped.
    pub fn json_ld(&self) -> Vec<Value> {
        let mut objects = Vec::new();
        for source in self.json_ld_sources() {
            if let Ok(value) = serde_json::from_str::<Value>(source.trim()) {
                flatten_json_ld(value, &mut objects);
            }
        }
        objects
    }
}

fn flatten_json_ld(value: Value, out: &mut Vec<Value>) {
    match value {
        Value::Array(items) => items.into_iter().for_each(|item| flatten_json_ld(item, out)),
        Value::Object(mut map) => {
            if let Some(graph) = map.remove("@graph") {
                flatten_json_ld(graph, out);
            }
            if !map.is_empty() {
                out.push(Value::Object(map));
            }
        }
        _ => {}
    }
}

/// Name from a JSON-LD person or organization reference.
fn author_name(value: &Value) -> Option<String> {
    let name = match value {
        Value::String(name) => Some(normalize_text(name)),
        Value::Object(obj) => obj.get("name").and_then(author_name),
        Value::Array(items) => items.iter().find_map(author_name),
        _ => None,
    };
    name.filter(|name| !name.is_empty())
}

fn truncate_excerpt(text: &str) -> String {
    if text.chars().count() <= MAX_EXCERPT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(MAX_EXCERPT_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Parse a publication date.
///
/// Tries RFC 3339, RFC 2822, then `YYYY-MM-DDTHH:MM:SS`,
/// `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD`; the last three are taken as UTC.
pub fn parse_date(value: &str) -> Option<OffsetDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(date) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(date);
    }
    if let Ok(date) = OffsetDateTime::parse(value, &Rfc2822) {
        return Some(date);
    }

    let local_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    ];
    for format in local_formats {
        if let Ok(date) = PrimitiveDateTime::parse(value, format) {
            return Some(date.assume_utc());
        }
    }

    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}
