//! Main content extraction API.
//!
//! The main entry point is the [`Readability`] struct, along with the
//! convenience functions [`parse`], [`parse_with_url`] and [`extract`].
//!
//! One call runs the whole pipeline sequentially: size check, preprocessing,
//! scoring, candidate selection, cleanup, serialization, and metadata. Calls
//! share no state, so a single [`Readability`] can serve many threads.
//!
//! # Example
//!
//! ```rust
//! use folio_core::readability::parse;
//!
//! let html = "<html><body><article><p>Content here, and more content.</p></article></body></html>";
//! let article = parse(html).unwrap();
//! assert!(article.text_content.contains("Content here"));
//! ```

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::article::Article;
use crate::dom_tree::DomTree;
use crate::extract::{ExtractConfig, extract_content};
use crate::links::LinkMatcher;
use crate::metadata::ContentHints;
use crate::metrics::{ClassKeywords, text_length};
use crate::parse::Document;
use crate::postprocess::{PostProcessConfig, postprocess_content};
use crate::preprocess::{PreprocessConfig, prepare_tree, preprocess_html};
use crate::scoring::{ScoreConfig, score_of, score_tree};
use crate::serialize::{SerializeConfig, serialize_html, text_blocks};
use crate::{FolioError, Result};

/// Default cap on input size: 1 MiB.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1 << 20;
/// Default deadline for [`Readability::parse_with_timeout`] and [`extract`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Score a page needs somewhere for [`Readability::is_probably_readable`].
const READABLE_SCORE: f64 = 20.0;
const MIN_READABLE_CHARS: usize = 25;

/// Configuration for the Readability builder.
///
/// # Example
///
/// ```rust
/// use folio_core::ReadabilityConfig;
///
/// let config = ReadabilityConfig::builder()
///     .preserve_important_links(true)
///     .add_node_indexes(true)
///     .build();
/// assert!(!config.add_content_digests);
/// ```
#[derive(Debug, Clone)]
pub struct ReadabilityConfig {
    /// Keep "read more" style links from removed boilerplate (default: false).
    pub preserve_important_links: bool,

    /// Add `data-content-digest` to every element of `plain_content` (default: false).
    pub add_content_digests: bool,

    /// Add `data-node-index` to every element of `plain_content` and to text blocks (default: false).
    pub add_node_indexes: bool,

    /// Largest accepted input in bytes (default: 1 MiB).
    pub max_buffer_size: usize,

    /// Deadline for the timed entry points (default: 30 s).
    ///
    /// Only [`Readability::parse_with_timeout`] and [`extract`] honor it;
    /// [`Readability::parse`] and the other synchronous calls run to
    /// completion regardless.
    pub timeout: Duration,

    /// Whether to preserve class attributes in output HTML (default: false).
    pub keep_classes: bool,

    /// Class/id keyword sets for scoring and cleanup.
    pub keywords: ClassKeywords,

    /// Anchor texts that mark an important link.
    pub important_link_phrases: Vec<String>,
}

impl Default for ReadabilityConfig {
    fn default() -> Self {
        Self {
            preserve_important_links: false,
            add_content_digests: false,
            add_node_indexes: false,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            timeout: DEFAULT_TIMEOUT,
            keep_classes: false,
            keywords: ClassKeywords::default(),
            important_link_phrases: LinkMatcher::default().phrases().to_vec(),
        }
    }
}

impl ReadabilityConfig {
    /// Creates a new builder for ReadabilityConfig.
    pub fn builder() -> ReadabilityConfigBuilder {
        ReadabilityConfigBuilder::new()
    }

    fn link_matcher(&self) -> LinkMatcher {
        LinkMatcher::new(self.important_link_phrases.iter().cloned())
    }

    fn preprocess_config(&self, base_url: Option<Url>) -> PreprocessConfig {
        PreprocessConfig { base_url, ..Default::default() }
    }

    fn score_config(&self) -> ScoreConfig {
        ScoreConfig { keywords: self.keywords.clone(), ..Default::default() }
    }

    fn extract_config(&self) -> ExtractConfig {
        ExtractConfig {
            preserve_important_links: self.preserve_important_links,
            link_matcher: self.link_matcher(),
            ..Default::default()
        }
    }

    fn postprocess_config(&self) -> PostProcessConfig {
        PostProcessConfig {
            keywords: self.keywords.clone(),
            preserve_important_links: self.preserve_important_links,
            link_matcher: self.link_matcher(),
            keep_classes: self.keep_classes,
            ..Default::default()
        }
    }

    fn serialize_config(&self) -> SerializeConfig {
        SerializeConfig { add_content_digests: self.add_content_digests, add_node_indexes: self.add_node_indexes }
    }
}

/// Builder for ReadabilityConfig.
pub struct ReadabilityConfigBuilder {
    config: ReadabilityConfig,
}

impl ReadabilityConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ReadabilityConfig::default() }
    }

    pub fn preserve_important_links(mut self, value: bool) -> Self {
        self.config.preserve_important_links = value;
        self
    }

    pub fn add_content_digests(mut self, value: bool) -> Self {
        self.config.add_content_digests = value;
        self
    }

    pub fn add_node_indexes(mut self, value: bool) -> Self {
        self.config.add_node_indexes = value;
        self
    }

    /// Sets the input size cap in bytes.
    pub fn max_buffer_size(mut self, value: usize) -> Self {
        self.config.max_buffer_size = value;
        self
    }

    pub fn timeout(mut self, value: Duration) -> Self {
        self.config.timeout = value;
        self
    }

    /// Sets whether to preserve class attributes in output HTML.
    pub fn keep_classes(mut self, value: bool) -> Self {
        self.config.keep_classes = value;
        self
    }

    /// Replaces the class/id keyword sets.
    pub fn keywords(mut self, value: ClassKeywords) -> Self {
        self.config.keywords = value;
        self
    }

    /// Replaces the important link phrases.
    pub fn important_link_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.important_link_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the config.
    pub fn build(self) -> ReadabilityConfig {
        self.config
    }
}

impl Default for ReadabilityConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main entry point for content extraction.
///
/// # Example
///
/// ```rust
/// use folio_core::Readability;
///
/// let reader = Readability::new();
/// let html = "<html><body><article><p>Content here, and more content.</p></article></body></html>";
/// let article = reader.parse(html).unwrap();
/// println!("Extracted: {}", article.text_content);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Readability {
    config: ReadabilityConfig,
}

impl Readability {
    /// Creates a new Readability instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new Readability instance with a custom configuration.
    pub fn with_config(config: ReadabilityConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReadabilityConfig {
        &self.config
    }

    /// Parses an HTML string and extracts readable content.
    ///
    /// Runs to completion on the calling thread; use
    /// [`parse_with_timeout`](Self::parse_with_timeout) for a deadline.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InputTooLarge`] when the input exceeds
    /// `max_buffer_size`, and [`FolioError::EmptyDocument`] when nothing
    /// readable is found.
    pub fn parse(&self, html: &str) -> Result<Article> {
        self.run(html, None)
    }

    /// Parses raw bytes, which must be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::MalformedInput`] for invalid UTF-8, plus the
    /// errors of [`parse`](Self::parse).
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Article> {
        self.check_size(bytes.len())?;
        let html = std::str::from_utf8(bytes).map_err(|e| FolioError::MalformedInput(e.to_string()))?;
        self.parse(html)
    }

    /// Parses HTML with a known base URL (for relative link resolution).
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::InvalidUrl`] if the URL is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use folio_core::Readability;
    ///
    /// let reader = Readability::new();
    /// let html = "<html><body><article><p>Content, with a <a href='/next'>link</a>.</p></article></body></html>";
    /// let article = reader.parse_with_url(html, "https://example.com").unwrap();
    /// assert_eq!(article.source_url, Some("https://example.com".to_string()));
    /// assert!(article.content.contains("https://example.com/next"));
    /// ```
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Article> {
        let base_url = Url::parse(url).map_err(|e| FolioError::InvalidUrl(e.to_string()))?;
        self.run(html, Some((base_url, url)))
    }

    /// Parses on a blocking worker and gives up after the configured
    /// timeout.
    ///
    /// On expiry the worker is not interrupted; it runs to completion in the
    /// background and its result is dropped. Must be called inside a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns [`FolioError::Timeout`] on expiry, plus the errors of
    /// [`parse`](Self::parse).
    pub async fn parse_with_timeout(&self, html: &str) -> Result<Article> {
        self.check_size(html.len())?;

        let limit = self.config.timeout;
        let reader = self.clone();
        let html = html.to_string();
        let task = tokio::task::spawn_blocking(move || reader.parse(&html));

        match tokio::time::timeout(limit, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => match join_error.try_into_panic() {
                Ok(payload) => std::panic::resume_unwind(payload),
                Err(join_error) => Err(FolioError::Runtime(std::io::Error::other(join_error))),
            },
            Err(_) => {
                warn!(timeout_ms = limit.as_millis() as u64, "extraction timed out");
                Err(FolioError::Timeout { timeout_ms: limit.as_millis() })
            }
        }
    }

    /// Checks if content appears readable without full extraction.
    ///
    /// Scores the page and reports whether any element with some text
    /// reaches a score of 20.
    pub fn is_probably_readable(&self, html: &str) -> bool {
        if self.check_size(html.len()).is_err() {
            return false;
        }
        let preprocess = self.config.preprocess_config(None);
        let mut tree = DomTree::parse(&preprocess_html(html, &preprocess));
        prepare_tree(&mut tree, &preprocess);
        let root = tree.root();
        score_tree(&mut tree, root, &self.config.score_config());

        tree.descendants(root).into_iter().any(|id| {
            score_of(&tree, id).is_some_and(|score| score >= READABLE_SCORE)
                && text_length(&tree, id) >= MIN_READABLE_CHARS
        })
    }

    fn check_size(&self, size: usize) -> Result<()> {
        let limit = self.config.max_buffer_size;
        if size > limit {
            return Err(FolioError::InputTooLarge { size, limit });
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(bytes = html.len()))]
    fn run(&self, html: &str, url: Option<(Url, &str)>) -> Result<Article> {
        self.check_size(html.len())?;
        let (base_url, source_url) = match url {
            Some((base, raw)) => (Some(base), Some(raw.to_string())),
            None => (None, None),
        };

        let document = Document::parse(html).with_base_url(base_url.clone());

        let preprocess = self.config.preprocess_config(base_url);
        let cleaned = preprocess_html(html, &preprocess);
        let mut tree = DomTree::parse(&cleaned);
        prepare_tree(&mut tree, &preprocess);

        let root = tree.root();
        let scored = score_tree(&mut tree, root, &self.config.score_config());
        debug!(scored, nodes = tree.len(), "scored document");

        let content = extract_content(&mut tree, &self.config.extract_config())?;
        let hints = ContentHints::from_tree(&tree, content.root);
        postprocess_content(&mut tree, &content, &self.config.postprocess_config())?;

        let html_content = serialize_html(&tree, content.root, &SerializeConfig::default());
        let plain_content = serialize_html(&tree, content.root, &self.config.serialize_config());
        let blocks = text_blocks(&tree, content.root, self.config.add_node_indexes);

        let metadata = document.extract_metadata(&hints);
        Ok(Article::new(metadata, html_content, plain_content, blocks, source_url))
    }
}

/// Convenience function for one-liner extraction with defaults.
///
/// # Errors
///
/// See [`Readability::parse`].
pub fn parse(html: &str) -> Result<Article> {
    Readability::new().parse(html)
}

/// Convenience function for one-liner with URL context.
///
/// # Errors
///
/// Returns [`FolioError::InvalidUrl`] if the URL is invalid.
pub fn parse_with_url(html: &str, url: &str) -> Result<Article> {
    Readability::new().parse_with_url(html, url)
}

/// Convenience function for quick readability check.
pub fn is_probably_readable(html: &str) -> bool {
    Readability::new().is_probably_readable(html)
}

/// Blocking extraction under `config.timeout`.
///
/// Starts a private current-thread runtime, so it must not be called from
/// inside another Tokio runtime. A timed-out worker is left to finish in the
/// background; this function returns as soon as the deadline passes.
///
/// # Errors
///
/// Returns [`FolioError::Runtime`] if the runtime cannot start, plus the
/// errors of [`Readability::parse_with_timeout`].
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use folio_core::{ReadabilityConfig, extract};
///
/// let config = ReadabilityConfig::builder().timeout(Duration::from_secs(5)).build();
/// let html = "<html><body><article><p>Content here, and more content.</p></article></body></html>";
/// let article = extract(html, config).unwrap();
/// assert!(article.text_content.contains("Content here"));
/// ```
pub fn extract(html: &str, config: ReadabilityConfig) -> Result<Article> {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build()?;
    let reader = Readability::with_config(config);
    let result = runtime.block_on(reader.parse_with_timeout(html));
    runtime.shutdown_background();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r##"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <title>Test Article</title>
            <meta name="author" content="Test Author">
        </head>
        <body>
            <nav class="menu"><a href="/">Home</a> <a href="/about">About</a></nav>
            <article>
                <h1>Article Heading</h1>
                <p>This is the first paragraph of the article, with enough text, commas, and words to score well.</p>
                <p>This is a second paragraph, adding more substance, more clauses, and more length to the story.</p>
                <p>A third paragraph with substantial content, which should help boost the overall readability score.</p>
            </article>
            <footer>Copyright 2024</footer>
        </body>
        </html>
    "##;

    #[test]
    fn test_readability_config_default() {
        let config = ReadabilityConfig::default();
        assert!(!config.preserve_important_links);
        assert!(!config.add_content_digests);
        assert!(!config.add_node_indexes);
        assert_eq!(config.max_buffer_size, 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(!config.keep_classes);
        assert!(config.important_link_phrases.contains(&"read more".to_string()));
    }

    #[test]
    fn test_readability_config_builder() {
        let config = ReadabilityConfig::builder()
            .preserve_important_links(true)
            .add_content_digests(true)
            .add_node_indexes(true)
            .max_buffer_size(2048)
            .timeout(Duration::from_millis(250))
            .keep_classes(true)
            .important_link_phrases(["full story"])
            .build();

        assert!(config.preserve_important_links);
        assert!(config.add_content_digests);
        assert!(config.add_node_indexes);
        assert_eq!(config.max_buffer_size, 2048);
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(config.keep_classes);
        assert_eq!(config.important_link_phrases, vec!["full story".to_string()]);
    }

    #[test]
    fn test_parse_article() {
        let article = Readability::new().parse(ARTICLE_HTML).unwrap();

        assert_eq!(article.title, Some("Test Article".to_string()));
        assert_eq!(article.byline, Some("Test Author".to_string()));
        assert_eq!(article.language, Some("en".to_string()));
        assert!(article.content.contains("first paragraph"));
        assert!(!article.content.contains("Copyright"));
        assert!(!article.content.contains("About"));
        assert_eq!(article.plain_text.len(), 4);
        assert!(article.word_count > 30);
    }

    #[test]
    fn test_plain_content_annotations() {
        let config = ReadabilityConfig::builder().add_content_digests(true).add_node_indexes(true).build();
        let article = Readability::with_config(config).parse(ARTICLE_HTML).unwrap();

        assert!(!article.content.contains("data-node-index"));
        assert!(article.plain_content.contains("data-node-index=\"0\""));
        assert!(article.plain_content.contains("data-content-digest"));
        assert!(article.plain_text.iter().all(|b| b.node_index.is_some()));
    }

    #[test]
    fn test_parse_with_url() {
        let article = Readability::new().parse_with_url(ARTICLE_HTML, "https://example.com/a/").unwrap();
        assert_eq!(article.source_url, Some("https://example.com/a/".to_string()));
    }

    #[test]
    fn test_parse_with_invalid_url() {
        let result = Readability::new().parse_with_url(ARTICLE_HTML, "not a url");
        assert!(matches!(result, Err(FolioError::InvalidUrl(_))));
    }

    #[test]
    fn test_input_too_large() {
        let config = ReadabilityConfig::builder().max_buffer_size(16).build();
        let result = Readability::with_config(config).parse(ARTICLE_HTML);
        assert!(matches!(result, Err(FolioError::InputTooLarge { limit: 16, .. })));
    }

    #[test]
    fn test_parse_bytes() {
        let reader = Readability::new();
        assert!(reader.parse_bytes(ARTICLE_HTML.as_bytes()).is_ok());
        assert!(matches!(reader.parse_bytes(&[0x3c, 0xff, 0xfe]), Err(FolioError::MalformedInput(_))));
    }

    #[test]
    fn test_empty_document() {
        let result = parse("<html><body></body></html>");
        assert!(matches!(result, Err(FolioError::EmptyDocument)));
    }

    #[test]
    fn test_is_probably_readable() {
        assert!(is_probably_readable(ARTICLE_HTML));
        assert!(!is_probably_readable("<html><body><nav><a href=\"/\">Link</a></nav></body></html>"));
    }

    #[tokio::test]
    async fn test_parse_with_timeout_completes() {
        let article = Readability::new().parse_with_timeout(ARTICLE_HTML).await.unwrap();
        assert!(article.content.contains("second paragraph"));
    }

    #[test]
    fn test_parse_runs_without_deadline() {
        let config = ReadabilityConfig::builder().timeout(Duration::from_nanos(1)).build();
        let article = Readability::with_config(config).parse(ARTICLE_HTML).unwrap();
        assert!(article.content.contains("third paragraph"));
    }

    #[test]
    fn test_extract_blocking() {
        let article = extract(ARTICLE_HTML, ReadabilityConfig::default()).unwrap();
        assert_eq!(article.title, Some("Test Article".to_string()));
    }
}
