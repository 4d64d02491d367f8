//! RUFEERS Core - Document model, shared types and configuration
//!
//! This crate defines the abstractions shared by the RUFEERS crates:
//! - Parsed document model (tokens, entity spans, dependency links)
//! - Downward tree search with cycle and depth guards
//! - Relationship triples and evaluation results
//! - Common error types
//! - Configuration management

pub mod config;
pub mod document;
pub mod tree;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, LoggingConfig, NewsConfig, SentimentConfig,
};
pub use document::{CharIndex, DocumentBuilder, Entity, ParsedDocument, Token, TokenId};
pub use tree::{find_first, CyclePolicy, TraversalError, TraversalLimits, Tree};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for RUFEERS operations
#[derive(Error, Debug)]
pub enum RufeersError {
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error(transparent)]
    Traversal(#[from] TraversalError),

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("News error: {0}")]
    News(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for RufeersError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_json::Error> for RufeersError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RufeersError>;

// ============================================================================
// Relationship Triples
// ============================================================================

/// A (person, action, location) relationship inferred from a document
///
/// Triples have no identity beyond their three fields. On the wire they
/// serialize as objects; a bare `["person", "action", "location"]` array is
/// accepted as input too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "TripleRepr")]
pub struct RelationshipTriple {
    pub person: String,
    pub action: String,
    pub location: String,
}

impl RelationshipTriple {
    pub fn new(
        person: impl Into<String>,
        action: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            person: person.into(),
            action: action.into(),
            location: location.into(),
        }
    }
}

impl std::fmt::Display for RelationshipTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.person, self.action, self.location)
    }
}

impl<P, A, L> From<(P, A, L)> for RelationshipTriple
where
    P: Into<String>,
    A: Into<String>,
    L: Into<String>,
{
    fn from((person, action, location): (P, A, L)) -> Self {
        Self::new(person, action, location)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TripleRepr {
    Object {
        person: String,
        action: String,
        location: String,
    },
    Tuple(String, String, String),
}

impl From<TripleRepr> for RelationshipTriple {
    fn from(repr: TripleRepr) -> Self {
        match repr {
            TripleRepr::Object {
                person,
                action,
                location,
            } => Self::new(person, action, location),
            TripleRepr::Tuple(person, action, location) => Self::new(person, action, location),
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

/// Precision, recall and F1 of extracted triples against a reference set
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Triples present in both sets
    pub true_positives: usize,
    /// Distinct extracted triples
    pub extracted: usize,
    /// Distinct reference triples
    pub ground_truth: usize,
}

impl EvaluationResult {
    /// Build a result from set sizes, treating empty denominators as zero
    pub fn from_counts(true_positives: usize, extracted: usize, ground_truth: usize) -> Self {
        let precision = ratio(true_positives, extracted);
        let recall = ratio(true_positives, ground_truth);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Self {
            precision,
            recall,
            f1,
            true_positives,
            extracted,
            ground_truth,
        }
    }

    /// False positives (extracted but not expected)
    pub fn false_positives(&self) -> usize {
        self.extracted.saturating_sub(self.true_positives)
    }

    /// False negatives (expected but not extracted)
    pub fn false_negatives(&self) -> usize {
        self.ground_truth.saturating_sub(self.true_positives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
