//! Article output type.
//!
//! [`Article`] is the complete result of one extraction: the cleaned HTML in
//! two renditions, the plain-text blocks derived from it, metadata, and a
//! few derived metrics. Converting it to an external format is left to the
//! caller; it derives [`Serialize`] for that purpose.

use serde::Serialize;
use time::OffsetDateTime;

use crate::metadata::Metadata;
use crate::metrics::count_words;
use crate::serialize::{TextBlock, plain_text};

/// Words per minute used for the reading time estimate.
const WORDS_PER_MINUTE: f64 = 200.0;

/// The complete result of reading an HTML document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: Option<String>,

    pub byline: Option<String>,

    /// Publication date; absent when no source parsed.
    #[serde(with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,

    pub excerpt: Option<String>,

    pub site_name: Option<String>,

    /// Value of `<html lang>`.
    pub language: Option<String>,

    /// Extracted readable content as clean HTML.
    pub content: String,

    /// The same tree as `content`, with digest and node-index attributes
    /// when those options are on.
    pub plain_content: String,

    /// Paragraph-level text blocks in document order.
    pub plain_text: Vec<TextBlock>,

    /// Text blocks joined by blank lines.
    pub text_content: String,

    /// Length of `text_content` in characters.
    pub length: usize,

    pub word_count: usize,

    /// Estimated reading time in minutes (assuming 200 words per minute).
    pub reading_time: f64,

    /// Source URL if known.
    pub source_url: Option<String>,
}

impl Article {
    /// Assemble an article and compute its derived metrics.
    pub fn new(
        metadata: Metadata, content: String, plain_content: String, blocks: Vec<TextBlock>, source_url: Option<String>,
    ) -> Self {
        let text_content = plain_text(&blocks);
        let length = text_content.chars().count();
        let word_count = count_words(&text_content);

        Self {
            title: metadata.title,
            byline: metadata.byline,
            date: metadata.date,
            excerpt: metadata.excerpt,
            site_name: metadata.site_name,
            language: metadata.language,
            content,
            plain_content,
            plain_text: blocks,
            text_content,
            length,
            word_count,
            reading_time: word_count as f64 / WORDS_PER_MINUTE,
            source_url,
        }
    }

    /// The metadata fields, split back out.
    pub fn metadata(&self) -> Metadata {
        Metadata {
            title: self.title.clone(),
            byline: self.byline.clone(),
            date: self.date,
            excerpt: self.excerpt.clone(),
            site_name: self.site_name.clone(),
            language: self.language.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn blocks(texts: &[&str]) -> Vec<TextBlock> {
        texts
            .iter()
            .map(|t| TextBlock { text: t.to_string(), node_index: None })
            .collect()
    }

    #[test]
    fn test_article_creation() {
        let content = "<div><p>This is a test article with some content.</p></div>".to_string();
        let metadata = Metadata { title: Some("Test Article".to_string()), ..Default::default() };

        let article = Article::new(
            metadata,
            content.clone(),
            content.clone(),
            blocks(&["This is a test article with some content."]),
            Some("https://example.com".to_string()),
        );

        assert_eq!(article.content, content);
        assert_eq!(article.text_content, "This is a test article with some content.");
        assert_eq!(article.title, Some("Test Article".to_string()));
        assert_eq!(article.source_url, Some("https://example.com".to_string()));
        assert_eq!(article.word_count, 8);
        assert_eq!(article.length, 41);
    }

    #[test]
    fn test_article_reading_time_calculation() {
        let text = "word ".repeat(200);
        let article = Article::new(Metadata::default(), String::new(), String::new(), blocks(&[text.trim()]), None);
        assert!((article.reading_time - 1.0).abs() < 0.1);
    }

    #[test]
    fn test_text_content_joins_blocks() {
        let article = Article::new(Metadata::default(), String::new(), String::new(), blocks(&["One", "Two"]), None);
        assert_eq!(article.text_content, "One\n\nTwo");
    }

    #[test]
    fn test_metadata_round_trip() {
        let metadata = Metadata {
            title: Some("T".to_string()),
            byline: Some("B".to_string()),
            date: Some(datetime!(2024-01-01 0:00 UTC)),
            excerpt: None,
            site_name: Some("S".to_string()),
            language: Some("en".to_string()),
        };
        let article = Article::new(metadata.clone(), String::new(), String::new(), Vec::new(), None);
        assert_eq!(article.metadata(), metadata);
    }

    #[test]
    fn test_article_serialization() {
        let metadata = Metadata {
            title: Some("Test".to_string()),
            byline: Some("Author".to_string()),
            date: Some(datetime!(2024-01-01 12:00 UTC)),
            ..Default::default()
        };
        let plain = vec![TextBlock { text: "Test content".to_string(), node_index: Some("0.0".to_string()) }];
        let article = Article::new(
            metadata,
            "<p>Test content</p>".to_string(),
            r#"<p data-node-index="0">Test content</p>"#.to_string(),
            plain,
            Some("https://example.com".to_string()),
        );

        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains(r#""content":"<p>Test content</p>""#));
        assert!(json.contains(r#""title":"Test""#));
        assert!(json.contains(r#""byline":"Author""#));
        assert!(json.contains(r#""date":"2024-01-01T12:00:00Z""#));
        assert!(json.contains(r#""node_index":"0.0""#));
        assert!(json.contains(r#""source_url":"https://example.com""#));
    }

    #[test]
    fn test_absent_date_serializes_as_null() {
        let article = Article::new(Metadata::default(), String::new(), String::new(), Vec::new(), None);
        let json = serde_json::to_value(&article).unwrap();
        assert!(json["date"].is_null());
        assert_eq!(json["plain_text"], serde_json::json!([]));
    }
}
