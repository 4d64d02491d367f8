//! Relationship Extraction module
//!
//! Infers (person, action, location) triples from a parsed document.
//! For every PERSON entity the syntactic head of the entity's root token is
//! taken as the action, and the head's descendants are searched pre-order
//! for the first token carrying a location label.

use rufeers_core::{
    find_first, ExtractionConfig, ParsedDocument, RelationshipTriple, Result, Token, TokenId,
    TraversalLimits,
};

use crate::TripleExtractor;

/// Dependency-walk extractor for person → action → location triples
#[derive(Debug, Clone)]
pub struct RelationshipExtractor {
    person_label: String,
    location_labels: Vec<String>,
    limits: TraversalLimits,
}

impl RelationshipExtractor {
    /// Create an extractor matching `PERSON` entities to `LOC` tokens
    pub fn new() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }

    /// Create from config
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            person_label: config.person_label.clone(),
            location_labels: config.location_labels.clone(),
            limits: config.limits(),
        }
    }

    /// Replace the accepted location labels
    pub fn with_location_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.location_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the traversal bounds
    pub fn with_limits(mut self, limits: TraversalLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Extract at most one triple per person entity, in entity order
    pub fn extract(&self, doc: &ParsedDocument) -> Result<Vec<RelationshipTriple>> {
        let mut relationships = Vec::new();

        for entity in doc
            .entities()
            .iter()
            .filter(|e| e.label == self.person_label)
        {
            let Some(head) = doc.head_of(entity.root) else {
                continue;
            };

            match self.find_location(doc, head.id)? {
                Some(location) => {
                    tracing::debug!(
                        person = %entity.text,
                        action = %head.text,
                        location = %location.text,
                        "Extracted relationship"
                    );
                    relationships.push(RelationshipTriple::new(
                        &entity.text,
                        &head.text,
                        &location.text,
                    ));
                }
                None => {
                    tracing::debug!(
                        person = %entity.text,
                        action = %head.text,
                        "No location below action token"
                    );
                }
            }
        }

        Ok(relationships)
    }

    /// First location-labelled descendant of `head`, never `head` itself
    pub fn find_location<'d>(
        &self,
        doc: &'d ParsedDocument,
        head: TokenId,
    ) -> Result<Option<&'d Token>> {
        let found = find_first(
            doc,
            head,
            |id| {
                doc.token(id)
                    .map(|t| t.has_entity_label(&self.location_labels))
                    .unwrap_or(false)
            },
            self.limits,
        )?;

        Ok(found.and_then(|id| doc.token(id)))
    }
}

impl Default for RelationshipExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TripleExtractor for RelationshipExtractor {
    fn extract(&self, doc: &ParsedDocument) -> Result<Vec<RelationshipTriple>> {
        RelationshipExtractor::extract(self, doc)
    }
}

/// Extract relationships with the default labels and traversal bounds
pub fn extract_relationships(doc: &ParsedDocument) -> Result<Vec<RelationshipTriple>> {
    RelationshipExtractor::new().extract(doc)
}

// ============================================================================
// Tests
// ============================================================================
