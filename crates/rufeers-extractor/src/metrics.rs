//! Quality Metrics module
//!
//! Scores extracted relationship triples against a reference set with
//! precision, recall and F1, and aggregates scores over many documents.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use rufeers_core::{EvaluationResult, RelationshipTriple};

/// Score `extracted` against `ground_truth`, treating both as sets
///
/// Duplicates collapse and order is ignored. An empty side yields zero for
/// the metric it is the denominator of.
pub fn evaluate(
    extracted: &[RelationshipTriple],
    ground_truth: &[RelationshipTriple],
) -> EvaluationResult {
    let extracted_set: HashSet<&RelationshipTriple> = extracted.iter().collect();
    let truth_set: HashSet<&RelationshipTriple> = ground_truth.iter().collect();

    let true_positives = extracted_set.intersection(&truth_set).count();

    EvaluationResult::from_counts(true_positives, extracted_set.len(), truth_set.len())
}

// ============================================================================
// Aggregate Metrics
// ============================================================================

/// Micro-averaged counts over a batch of evaluated documents
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub num_documents: usize,
    pub true_positives: usize,
    pub extracted: usize,
    pub ground_truth: usize,
}

impl EvaluationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one document's result to the aggregate
    pub fn add(&mut self, result: &EvaluationResult) {
        self.num_documents += 1;
        self.true_positives += result.true_positives;
        self.extracted += result.extracted;
        self.ground_truth += result.ground_truth;
    }

    /// Precision, recall and F1 over the pooled counts
    pub fn result(&self) -> EvaluationResult {
        EvaluationResult::from_counts(self.true_positives, self.extracted, self.ground_truth)
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        let result = self.result();
        format!(
            "=== Relationship Extraction Report ===\n\n\
             Documents evaluated: {}\n\n\
             Precision: {:.2}\n\
             Recall:    {:.2}\n\
             F1 Score:  {:.2}\n\
             Expected: {} | Extracted: {} | TP: {} | FP: {} | FN: {}\n",
            self.num_documents,
            result.precision,
            result.recall,
            result.f1,
            result.ground_truth,
            result.extracted,
            result.true_positives,
            result.false_positives(),
            result.false_negatives(),
        )
    }
}

impl<'a> FromIterator<&'a EvaluationResult> for EvaluationSummary {
    fn from_iter<I: IntoIterator<Item = &'a EvaluationResult>>(iter: I) -> Self {
        let mut summary = Self::new();
        for result in iter {
            summary.add(result);
        }
        summary
    }
}

// ============================================================================
// Tests
// ============================================================================
