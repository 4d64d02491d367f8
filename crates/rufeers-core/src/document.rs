//! Parsed document model
//!
//! A `ParsedDocument` is the read-only output of an external linguistic
//! pipeline: an arena of tokens linked by dependency heads, plus the labelled
//! entity spans found over them. Documents are only created through
//! [`DocumentBuilder`], which checks head indices and derives children,
//! entity roots and per-token entity labels.

use std::ops::Range;

use serde::Serialize;

use crate::tree::Tree;
use crate::{Result, RufeersError};

/// Index of a token within its document
pub type TokenId = usize;

/// A single parsed token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub id: TokenId,
    pub text: String,
    pub lemma: String,
    /// Coarse part-of-speech tag
    pub pos: String,
    /// Dependency relation to the head
    pub dep: String,
    /// Syntactic head; a sentence root is its own head
    pub head: TokenId,
    /// Dependents, in document order
    pub children: Vec<TokenId>,
    /// Label of the entity span covering this token, if any
    pub ent_type: Option<String>,
    /// Character offset of the first character
    pub start: usize,
    /// Character offset one past the last character
    pub end: usize,
}

impl Token {
    /// Whether this token heads its own sentence
    pub fn is_root(&self) -> bool {
        self.head == self.id
    }

    /// Whether the token lies inside an entity with one of `labels`
    pub fn has_entity_label(&self, labels: &[String]) -> bool {
        self.ent_type
            .as_deref()
            .map(|label| labels.iter().any(|l| l == label))
            .unwrap_or(false)
    }
}

/// A labelled entity span
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
    pub lemma: String,
    /// Character offsets into the document text
    pub start: usize,
    pub end: usize,
    /// Half-open token range covered by the span
    pub token_start: TokenId,
    pub token_end: TokenId,
    /// Syntactic head token within the span
    pub root: TokenId,
}

impl Entity {
    pub fn tokens(&self) -> Range<TokenId> {
        self.token_start..self.token_end
    }
}

/// Tokens, dependency links and entity spans of one analysed text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    text: String,
    tokens: Vec<Token>,
    entities: Vec<Entity>,
}

impl ParsedDocument {
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Entities in document order
    ///
    /// The builder sorts spans by their first token, so this order holds
    /// even when spans were supplied out of order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn token(&self, id: TokenId) -> Option<&Token> {
        self.tokens.get(id)
    }

    /// The syntactic head of token `id`
    pub fn head_of(&self, id: TokenId) -> Option<&Token> {
        self.token(id).and_then(|t| self.token(t.head))
    }

    /// The root token of an entity span
    pub fn root_of(&self, entity: &Entity) -> Option<&Token> {
        self.token(entity.root)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
}

impl Tree for ParsedDocument {
    type Node = TokenId;

    fn children(&self, node: TokenId) -> &[TokenId] {
        self.tokens
            .get(node)
            .map(|t| t.children.as_slice())
            .unwrap_or(&[])
    }
}

// ============================================================================
// Builder
// ============================================================================

/// A token as supplied by a parser, before links are resolved
#[derive(Debug, Clone, Default)]
pub struct TokenSpec {
    pub text: String,
    pub lemma: Option<String>,
    pub pos: String,
    pub dep: String,
    pub head: TokenId,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
struct EntitySpec {
    tokens: Range<TokenId>,
    label: String,
}

/// Assembles and validates a [`ParsedDocument`]
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    text: String,
    /// Length of `text` in characters
    text_chars: usize,
    tokens: Vec<TokenSpec>,
    entities: Vec<EntitySpec>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the full document text; token offsets index into it
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self.text_chars = self.text.chars().count();
        self
    }

    /// Add a token with explicit offsets
    pub fn token(mut self, spec: TokenSpec) -> Self {
        self.tokens.push(spec);
        self
    }

    /// Append a word to the text (space separated) and add it as a token
    pub fn word(mut self, text: &str, head: TokenId, dep: &str) -> Self {
        if !self.text.is_empty() {
            self.text.push(' ');
            self.text_chars += 1;
        }
        let start = self.text_chars;
        self.text.push_str(text);
        self.text_chars += text.chars().count();
        let end = self.text_chars;

        self.tokens.push(TokenSpec {
            text: text.to_string(),
            lemma: None,
            pos: String::new(),
            dep: dep.to_string(),
            head,
            start,
            end,
        });
        self
    }

    /// Number of tokens added so far
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Mark tokens `tokens` as an entity labelled `label`
    pub fn entity(mut self, tokens: Range<TokenId>, label: &str) -> Self {
        self.entities.push(EntitySpec {
            tokens,
            label: label.to_string(),
        });
        self
    }

    pub fn build(self) -> Result<ParsedDocument> {
        let count = self.tokens.len();

        for (id, spec) in self.tokens.iter().enumerate() {
            if spec.head >= count {
                return Err(RufeersError::InvalidDocument(format!(
                    "token {id} ({:?}) has head {} but the document has {count} tokens",
                    spec.text, spec.head
                )));
            }
        }

        let mut tokens: Vec<Token> = self
            .tokens
            .into_iter()
            .enumerate()
            .map(|(id, spec)| Token {
                id,
                lemma: spec.lemma.unwrap_or_else(|| spec.text.clone()),
                text: spec.text,
                pos: spec.pos,
                dep: spec.dep,
                head: spec.head,
                children: Vec::new(),
                ent_type: None,
                start: spec.start,
                end: spec.end,
            })
            .collect();

        for id in 0..count {
            let head = tokens[id].head;
            if head != id {
                tokens[head].children.push(id);
            }
        }

        let chars = CharIndex::new(&self.text);
        let mut entities = Vec::with_capacity(self.entities.len());
        for spec in self.entities {
            let range = spec.tokens;
            if range.start >= range.end || range.end > count {
                return Err(RufeersError::InvalidDocument(format!(
                    "entity {:?} covers invalid token range {}..{}",
                    spec.label, range.start, range.end
                )));
            }

            if let Some(taken) = range.clone().find(|&i| tokens[i].ent_type.is_some()) {
                return Err(RufeersError::InvalidDocument(format!(
                    "entity {:?} overlaps another entity at token {taken}",
                    spec.label
                )));
            }

            let root = span_root(&tokens, &range);
            let start = tokens[range.start].start;
            let end = tokens[range.end - 1].end;
            let lemma = tokens[range.clone()]
                .iter()
                .map(|t| t.lemma.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            let text = chars
                .slice(start, end)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    tokens[range.clone()]
                        .iter()
                        .map(|t| t.text.as_str())
                        .collect::<Vec<_>>()
                        .join(" ")
                });

            for token in &mut tokens[range.clone()] {
                token.ent_type = Some(spec.label.clone());
            }

            entities.push(Entity {
                text,
                label: spec.label,
                lemma,
                start,
                end,
                token_start: range.start,
                token_end: range.end,
                root,
            });
        }

        entities.sort_by_key(|e| e.token_start);

        Ok(ParsedDocument {
            text: self.text,
            tokens,
            entities,
        })
    }
}

/// First token of the span whose head lies outside it or is itself
fn span_root(tokens: &[Token], range: &Range<TokenId>) -> TokenId {
    range
        .clone()
        .find(|&i| {
            let head = tokens[i].head;
            head == i || !range.contains(&head)
        })
        .unwrap_or_else(|| {
            tracing::warn!(
                start = range.start,
                end = range.end,
                "Entity span has no head outside itself; using its first token as root"
            );
            range.start
        })
}

/// Character-offset view of a text
///
/// Byte positions of every character boundary are computed once, so slicing
/// by character offsets is constant time.
#[derive(Debug, Clone)]
pub struct CharIndex<'t> {
    text: &'t str,
    boundaries: Vec<usize>,
}

impl<'t> CharIndex<'t> {
    pub fn new(text: &'t str) -> Self {
        let boundaries = text
            .char_indices()
            .map(|(b, _)| b)
            .chain(std::iter::once(text.len()))
            .collect();
        Self { text, boundaries }
    }

    /// Number of characters in the text
    pub fn len(&self) -> usize {
        self.boundaries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Characters `start..end`, or `None` if the range falls outside the text
    pub fn slice(&self, start: usize, end: usize) -> Option<&'t str> {
        if start > end {
            return None;
        }
        let from = *self.boundaries.get(start)?;
        let to = *self.boundaries.get(end)?;
        self.text.get(from..to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn khan_document() -> ParsedDocument {
        DocumentBuilder::new()
            .word("Imran", 1, "compound")
            .word("Khan", 3, "nsubjpass")
            .word("was", 3, "auxpass")
            .word("arrested", 3, "ROOT")
            .word("in", 3, "prep")
            .word("Islamabad", 4, "pobj")
            .entity(0..2, "PERSON")
            .entity(5..6, "LOC")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_derives_children() {
        let doc = khan_document();

        assert_eq!(doc.len(), 6);
        assert_eq!(doc.token(3).unwrap().children, vec![1, 2, 4]);
        assert_eq!(doc.token(1).unwrap().children, vec![0]);
        assert!(doc.token(3).unwrap().is_root());
        assert_eq!(doc.text(), "Imran Khan was arrested in Islamabad");
    }

    #[test]
    fn test_builder_entity_root_and_labels() {
        let doc = khan_document();
        let person = &doc.entities()[0];

        assert_eq!(person.text, "Imran Khan");
        assert_eq!(person.root, 1);
        assert_eq!(doc.head_of(person.root).unwrap().text, "arrested");
        assert_eq!(person.start, 0);
        assert_eq!(person.end, 10);

        assert_eq!(doc.token(0).unwrap().ent_type.as_deref(), Some("PERSON"));
        assert_eq!(doc.token(5).unwrap().ent_type.as_deref(), Some("LOC"));
        assert_eq!(doc.token(3).unwrap().ent_type, None);
    }

    #[test]
    fn test_builder_rejects_bad_head() {
        let result = DocumentBuilder::new().word("alone", 4, "ROOT").build();
        assert!(matches!(result, Err(RufeersError::InvalidDocument(_))));
    }

    #[test]
    fn test_builder_rejects_overlapping_entities() {
        let result = DocumentBuilder::new()
            .word("New", 1, "compound")
            .word("York", 1, "ROOT")
            .entity(0..2, "GPE")
            .entity(1..2, "LOC")
            .build();
        assert!(matches!(result, Err(RufeersError::InvalidDocument(_))));
    }

    #[test]
    fn test_builder_rejects_empty_entity() {
        let result = DocumentBuilder::new()
            .word("x", 0, "ROOT")
            .entity(0..0, "LOC")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_entities_sorted_by_position() {
        let doc = DocumentBuilder::new()
            .word("Ali", 1, "nsubj")
            .word("visited", 1, "ROOT")
            .word("Lahore", 1, "dobj")
            .entity(2..3, "LOC")
            .entity(0..1, "PERSON")
            .build()
            .unwrap();

        let labels: Vec<&str> = doc.entities().iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["PERSON", "LOC"]);
    }

    #[test]
    fn test_char_index_multibyte() {
        let chars = CharIndex::new("Zoë met Søren");
        assert_eq!(chars.len(), 13);
        assert_eq!(chars.slice(0, 3), Some("Zoë"));
        assert_eq!(chars.slice(8, 13), Some("Søren"));
        assert_eq!(chars.slice(8, 20), None);
        assert_eq!(chars.slice(3, 2), None);
        assert!(CharIndex::new("").is_empty());
    }

    #[test]
    fn test_tree_children() {
        let doc = khan_document();
        assert_eq!(Tree::children(&doc, 4).to_vec(), vec![5]);
        assert!(Tree::children(&doc, 99).is_empty());
    }
}
