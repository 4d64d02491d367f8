//! RUFEERS Extractor - Relationship extraction and text analysis
//!
//! Infers person → action → location triples from dependency parses,
//! scores them against reference triples, and assembles per-document
//! analysis reports (entities, relationships, sentiment, visualizations).

use rufeers_core::{ParsedDocument, RelationshipTriple, Result};

/// Trait for relationship extractors
pub trait TripleExtractor: Send + Sync {
    fn extract(&self, doc: &ParsedDocument) -> Result<Vec<RelationshipTriple>>;
}

pub mod analyzer;
pub mod loader;
pub mod metrics;
pub mod relation;
pub mod render;
pub mod sentiment;

pub use analyzer::{AnalysisReport, Analyzer, EntityRow};
pub use loader::{load_path, ConllULoader, DocumentFormat, DocumentLoader, SpacyJsonLoader};
pub use metrics::{evaluate, EvaluationSummary};
pub use relation::{extract_relationships, RelationshipExtractor};
pub use sentiment::{LexiconSentiment, Sentiment, SentimentScorer};
pub use rufeers_core::EvaluationResult;
