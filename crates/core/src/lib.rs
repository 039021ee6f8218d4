pub mod article;
pub mod dom_tree;
pub mod error;
pub mod extract;
pub mod links;
pub mod metadata;
pub mod metrics;
pub mod parse;
pub mod postprocess;
pub mod preprocess;
pub mod readability;
pub mod scoring;
pub mod serialize;
pub mod tables;

pub use article::Article;
#[doc(hidden)]
pub use dom_tree::{DomNode, DomTree, NodeData, NodeId};
pub use error::{FolioError, Result};
#[doc(hidden)]
pub use extract::{ExtractConfig, ExtractedContent, extract_content};
pub use links::{IMPORTANT_LINK_PHRASES, LinkMatcher};
pub use metadata::{ContentHints, Metadata, parse_date};
pub use metrics::{ClassKeywords, NEGATIVE_KEYWORDS, NodeMetrics, POSITIVE_KEYWORDS};
pub use parse::Document;
#[doc(hidden)]
pub use postprocess::{CleanupReport, Decision, ElementCategory, PostProcessConfig, postprocess_content};
#[doc(hidden)]
pub use preprocess::{PreprocessConfig, prepare_tree, preprocess_html};
pub use readability::{
    DEFAULT_MAX_BUFFER_SIZE, DEFAULT_TIMEOUT, Readability, ReadabilityConfig, ReadabilityConfigBuilder, extract,
    is_probably_readable, parse, parse_with_url,
};
#[doc(hidden)]
pub use scoring::{ScoreBreakdown, ScoreConfig, base_tag_score, score_tree};
pub use serialize::{SerializeConfig, TextBlock};
#[doc(hidden)]
pub use tables::{TableKind, classify_table};
