//! Analysis service
//!
//! Combines the relationship extractor, the sentiment scorer and the
//! evaluator into a single per-request report. Collaborators are injected
//! so tests can substitute them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use rufeers_core::{AppConfig, EvaluationResult, ParsedDocument, RelationshipTriple, Result};

use crate::metrics::evaluate;
use crate::relation::RelationshipExtractor;
use crate::sentiment::{LexiconSentiment, Sentiment, SentimentScorer};
use crate::TripleExtractor;

/// One row of the named-entity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRow {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub label: String,
    pub lemma: String,
}

/// Everything shown for one analysed document
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub entities: Vec<EntityRow>,
    pub relationships: Vec<RelationshipTriple>,
    pub sentiment_score: f32,
    pub sentiment: Sentiment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
}

impl AnalysisReport {
    /// The entity related news is searched for
    pub fn first_entity(&self) -> Option<&EntityRow> {
        self.entities.first()
    }

    pub fn sentiment_line(&self) -> String {
        match self.sentiment {
            Sentiment::Positive => format!("Positive Sentiment Score: {:.2}", self.sentiment_score),
            Sentiment::Negative => format!("Negative Sentiment Score: {:.2}", self.sentiment_score),
            Sentiment::Neutral => "Neutral Sentiment".to_string(),
        }
    }

    /// Plain-text rendering of the report
    pub fn report(&self) -> String {
        let mut out = String::from("=== Named Entities ===\n");
        if self.entities.is_empty() {
            out.push_str("No entities found.\n");
        } else {
            out.push_str(&format!(
                "{:<30} {:>6} {:>6}  {:<12} {}\n",
                "Text", "Start", "End", "Type", "Lemma"
            ));
            for row in &self.entities {
                out.push_str(&format!(
                    "{:<30} {:>6} {:>6}  {:<12} {}\n",
                    row.text, row.start, row.end, row.label, row.lemma
                ));
            }
        }

        out.push_str("\n=== Entity Relationships ===\n");
        if self.relationships.is_empty() {
            out.push_str("No relationships found.\n");
        } else {
            for rel in &self.relationships {
                out.push_str(&format!("{rel}\n"));
            }
        }

        if let Some(evaluation) = &self.evaluation {
            out.push_str(&format!(
                "\n=== Evaluation Metrics ===\n\
                 Precision: {:.2}\n\
                 Recall: {:.2}\n\
                 F1 Score: {:.2}\n",
                evaluation.precision, evaluation.recall, evaluation.f1
            ));
        }

        out.push_str("\n=== Sentiment Analysis ===\n");
        out.push_str(&self.sentiment_line());
        out.push('\n');
        out
    }
}

/// Request-scoped analysis service
pub struct Analyzer {
    extractor: Box<dyn TripleExtractor>,
    scorer: Box<dyn SentimentScorer>,
    neutral_threshold: f32,
}

impl Analyzer {
    /// Analyzer with the default extractor and lexicon scorer
    pub fn new() -> Self {
        Self {
            extractor: Box::new(RelationshipExtractor::new()),
            scorer: Box::new(LexiconSentiment::new()),
            neutral_threshold: 0.0,
        }
    }

    /// Create from config
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            extractor: Box::new(RelationshipExtractor::from_config(&config.extraction)),
            scorer: Box::new(LexiconSentiment::new()),
            neutral_threshold: config.sentiment.neutral_threshold,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn TripleExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_scorer(mut self, scorer: Box<dyn SentimentScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Analyse a parsed document
    pub fn analyze(&self, doc: &ParsedDocument) -> Result<AnalysisReport> {
        let entities = doc
            .entities()
            .iter()
            .map(|e| EntityRow {
                text: e.text.clone(),
                start: e.start,
                end: e.end,
                label: e.label.clone(),
                lemma: e.lemma.clone(),
            })
            .collect();

        let relationships = self.extractor.extract(doc)?;
        let sentiment_score = self.scorer.polarity(doc.text());
        let sentiment = Sentiment::from_score(sentiment_score, self.neutral_threshold);

        let report = AnalysisReport {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            entities,
            relationships,
            sentiment_score,
            sentiment,
            evaluation: None,
        };

        tracing::info!(
            report_id = %report.id,
            entities = report.entities.len(),
            relationships = report.relationships.len(),
            sentiment = %report.sentiment,
            "Analysed document"
        );
        Ok(report)
    }

    /// Analyse a document and score its relationships against `ground_truth`
    pub fn analyze_with_ground_truth(
        &self,
        doc: &ParsedDocument,
        ground_truth: &[RelationshipTriple],
    ) -> Result<AnalysisReport> {
        let mut report = self.analyze(doc)?;
        report.evaluation = Some(evaluate(&report.relationships, ground_truth));
        Ok(report)
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}
