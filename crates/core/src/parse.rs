//! Read-only view of the original document.
//!
//! Metadata is read from the page as it arrived, before preprocessing
//! strips `<script>` (JSON-LD) and `<head>` content out of reach. This
//! module wraps `scraper` for that purpose.
//!
//! # Example
//!
//! ```rust
//! use folio_core::parse::Document;
//!
//! let html = r#"<html><head><title>Test</title></head><body><p class="content">Hello</p></body></html>"#;
//! let doc = Document::parse(html);
//! assert_eq!(doc.title(), Some("Test".to_string()));
//! assert_eq!(doc.select("p.content").unwrap().len(), 1);
//! ```

use scraper::{Html, Selector};
use url::Url;

use crate::metrics::normalize_text;
use crate::{FolioError, Result};

/// A parsed HTML document queried with CSS selectors.
pub struct Document {
    html: Html,
    base_url: Option<Url>,
}

impl Document {
    /// Parse HTML. Tree construction is lenient and never fails.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html), base_url: None }
    }

    /// Attach the URL the document was fetched from.
    pub fn with_base_url(mut self, base_url: Option<Url>) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Gets the raw HTML representation.
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::MalformedInput`] if the selector is invalid.
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// First element matching `selector`, `None` for no match or a bad
    /// selector.
    pub fn select_first(&'_ self, selector: &str) -> Option<Element<'_>> {
        let sel = compile(selector).ok()?;
        self.html.select(&sel).next().map(|el| Element { element: el })
    }

    /// Whitespace-normalized `<title>` text.
    pub fn title(&self) -> Option<String> {
        self.select_first("title")
            .map(|el| el.text())
            .filter(|t| !t.is_empty())
    }

    /// `content` of the first `<meta>` whose `name` or `property` is `key`.
    pub fn meta_content(&self, key: &str) -> Option<String> {
        ["name", "property", "itemprop"].iter().find_map(|attr| {
            self.select_first(&format!("meta[{attr}=\"{key}\"]"))
                .and_then(|el| el.attr("content").map(normalize_text))
                .filter(|c| !c.is_empty())
        })
    }

    /// `lang` attribute of the root element.
    pub fn language(&self) -> Option<String> {
        self.html
            .root_element()
            .value()
            .attr("lang")
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty())
    }

    /// Raw bodies of every `application/ld+json` script.
    pub fn json_ld_sources(&self) -> Vec<String> {
        self.select("script[type=\"application/ld+json\"]")
            .map(|scripts| scripts.iter().map(|el| el.raw_text()).collect())
            .unwrap_or_default()
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| FolioError::MalformedInput(format!("Invalid selector: {e}")))
}

/// A single element of a [`Document`].
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Whitespace-normalized text of the element and its descendants.
    pub fn text(&self) -> String {
        normalize_text(&self.raw_text())
    }

    /// Text exactly as it appears in the source.
    pub fn raw_text(&self) -> String {
        self.element.text().collect()
    }

    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Returns the lowercase tag name (e.g., "div", "a", "span").
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }
}
