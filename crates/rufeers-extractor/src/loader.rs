//! Document Loader module
//!
//! Turns the serialized output of an external linguistic pipeline into a
//! [`ParsedDocument`]. Two formats are understood:
//! - spaCy `Doc.to_json()` output (character offsets, absolute head indices)
//! - CoNLL-U, with entity spans carried as BIO tags in the MISC column
//!   (`NER=B-PERSON`, `NER=I-PERSON`, `NER=O`)

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use rufeers_core::document::{CharIndex, TokenSpec};
use rufeers_core::{DocumentBuilder, ParsedDocument, Result, RufeersError, TokenId};

/// Adapter from a serialized parse to a [`ParsedDocument`]
pub trait DocumentLoader: Send + Sync {
    fn load(&self, input: &str) -> Result<ParsedDocument>;
}

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    SpacyJson,
    ConllU,
}

impl DocumentFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("json") => Some(Self::SpacyJson),
            Some("conllu") | Some("conll") => Some(Self::ConllU),
            _ => None,
        }
    }

    pub fn loader(&self) -> Box<dyn DocumentLoader> {
        match self {
            Self::SpacyJson => Box::new(SpacyJsonLoader),
            Self::ConllU => Box::new(ConllULoader),
        }
    }
}

impl std::str::FromStr for DocumentFormat {
    type Err = RufeersError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spacy" | "json" => Ok(Self::SpacyJson),
            "conllu" | "conll" => Ok(Self::ConllU),
            other => Err(RufeersError::Parse(format!(
                "Unknown document format: {other}"
            ))),
        }
    }
}

/// Read a parsed document from disk
///
/// Without an explicit `format` the file extension decides; unknown
/// extensions are read as spaCy JSON.
pub fn load_path(path: impl AsRef<Path>, format: Option<DocumentFormat>) -> Result<ParsedDocument> {
    let path = path.as_ref();
    let format = format
        .or_else(|| DocumentFormat::from_path(path))
        .unwrap_or(DocumentFormat::SpacyJson);

    let content = std::fs::read_to_string(path).map_err(|e| RufeersError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let doc = format.loader().load(&content)?;
    tracing::debug!(
        path = %path.display(),
        ?format,
        tokens = doc.len(),
        entities = doc.entities().len(),
        "Loaded parsed document"
    );
    Ok(doc)
}

// ============================================================================
// spaCy JSON
// ============================================================================

/// Loader for spaCy `Doc.to_json()` output
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacyJsonLoader;

#[derive(Debug, Deserialize)]
struct SpacyDoc {
    text: String,
    #[serde(default)]
    ents: Vec<SpacyEnt>,
    tokens: Vec<SpacyToken>,
}

#[derive(Debug, Deserialize)]
struct SpacyEnt {
    start: usize,
    end: usize,
    label: String,
}

#[derive(Debug, Deserialize)]
struct SpacyToken {
    id: Option<usize>,
    start: usize,
    end: usize,
    #[serde(default)]
    pos: String,
    lemma: Option<String>,
    #[serde(default)]
    dep: String,
    head: usize,
}

impl DocumentLoader for SpacyJsonLoader {
    fn load(&self, input: &str) -> Result<ParsedDocument> {
        let parsed: SpacyDoc = serde_json::from_str(input)?;
        let chars = CharIndex::new(&parsed.text);
        let mut builder = DocumentBuilder::new();

        for (index, token) in parsed.tokens.iter().enumerate() {
            if let Some(id) = token.id {
                if id != index {
                    return Err(RufeersError::InvalidDocument(format!(
                        "token at position {index} has id {id}"
                    )));
                }
            }

            let text = chars.slice(token.start, token.end).ok_or_else(|| {
                RufeersError::InvalidDocument(format!(
                    "token {index} offsets {}..{} fall outside the text",
                    token.start, token.end
                ))
            })?;

            builder = builder.token(TokenSpec {
                text: text.to_string(),
                lemma: token.lemma.clone().filter(|l| !l.is_empty()),
                pos: token.pos.clone(),
                dep: token.dep.clone(),
                head: token.head,
                start: token.start,
                end: token.end,
            });
        }

        let boundaries = TokenBoundaries::new(&parsed.tokens);
        for ent in &parsed.ents {
            let range = boundaries.align(ent.start, ent.end).ok_or_else(|| {
                RufeersError::InvalidDocument(format!(
                    "entity {:?} at {}..{} is not aligned to token boundaries",
                    ent.label, ent.start, ent.end
                ))
            })?;
            builder = builder.entity(range, &ent.label);
        }

        builder.text(parsed.text).build()
    }
}

/// Token lookup by character start and end offsets
struct TokenBoundaries {
    starts: HashMap<usize, TokenId>,
    ends: HashMap<usize, TokenId>,
}

impl TokenBoundaries {
    fn new(tokens: &[SpacyToken]) -> Self {
        let mut starts = HashMap::with_capacity(tokens.len());
        let mut ends = HashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            starts.entry(token.start).or_insert(id);
            ends.entry(token.end).or_insert(id);
        }
        Self { starts, ends }
    }

    /// Token range whose first token starts at `start` and last token ends at `end`
    fn align(&self, start: usize, end: usize) -> Option<std::ops::Range<TokenId>> {
        let first = *self.starts.get(&start)?;
        let last = *self.ends.get(&end)?;
        (last >= first).then(|| first..last + 1)
    }
}

// ============================================================================
// CoNLL-U
// ============================================================================

/// Loader for CoNLL-U with BIO entity tags in the MISC column
#[derive(Debug, Clone, Copy, Default)]
pub struct ConllULoader;

const CONLLU_COLUMNS: usize = 10;

#[derive(Debug)]
struct ConllRow {
    form: String,
    lemma: Option<String>,
    upos: String,
    head: usize,
    deprel: String,
    entity: Option<BioTag>,
    space_after: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum BioTag {
    Begin(String),
    Inside(String),
}

impl ConllRow {
    fn parse(line: &str, line_no: usize) -> Result<Option<(usize, Self)>> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != CONLLU_COLUMNS {
            return Err(RufeersError::Parse(format!(
                "line {line_no}: expected {CONLLU_COLUMNS} columns, found {}",
                columns.len()
            )));
        }

        // Multiword ranges and empty nodes carry no dependency of their own
        if columns[0].contains('-') || columns[0].contains('.') {
            return Ok(None);
        }

        let id: usize = columns[0]
            .parse()
            .map_err(|_| RufeersError::Parse(format!("line {line_no}: bad id {:?}", columns[0])))?;
        let head: usize = columns[6].parse().map_err(|_| {
            RufeersError::Parse(format!("line {line_no}: bad head {:?}", columns[6]))
        })?;

        let mut entity = None;
        let mut space_after = true;
        for field in columns[9].split('|') {
            if let Some(tag) = field.strip_prefix("NER=") {
                entity = parse_bio(tag);
            } else if field == "SpaceAfter=No" {
                space_after = false;
            }
        }

        Ok(Some((
            id,
            Self {
                form: columns[1].to_string(),
                lemma: none_if_blank(columns[2]),
                upos: none_if_blank(columns[3]).unwrap_or_default(),
                head,
                deprel: none_if_blank(columns[7]).unwrap_or_default(),
                entity,
                space_after,
            },
        )))
    }
}

fn none_if_blank(value: &str) -> Option<String> {
    match value {
        "_" | "" => None,
        other => Some(other.to_string()),
    }
}

fn parse_bio(tag: &str) -> Option<BioTag> {
    if let Some(label) = tag.strip_prefix("B-") {
        Some(BioTag::Begin(label.to_string()))
    } else {
        tag.strip_prefix("I-")
            .map(|label| BioTag::Inside(label.to_string()))
    }
}

/// Builds document text, tokens and entity spans sentence by sentence
#[derive(Default)]
struct ConllAssembler {
    builder: DocumentBuilder,
    text: String,
    chars: usize,
    count: usize,
    open_entity: Option<(TokenId, String)>,
}

impl ConllAssembler {
    fn push_sentence(&mut self, rows: Vec<ConllRow>) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        if !self.text.is_empty() {
            self.text.push(' ');
            self.chars += 1;
        }

        let offset = self.count;
        let len = rows.len();
        let mut builder = std::mem::take(&mut self.builder);

        for (index, row) in rows.into_iter().enumerate() {
            let id = offset + index;
            let head = match row.head {
                0 => id,
                h if h <= len => offset + h - 1,
                h => {
                    return Err(RufeersError::InvalidDocument(format!(
                        "token {:?} has head {h} in a sentence of {len} tokens",
                        row.form
                    )))
                }
            };

            builder = self.track_entity(builder, id, row.entity.as_ref());

            let start = self.chars;
            let width = row.form.chars().count();
            self.text.push_str(&row.form);
            self.chars += width;
            if row.space_after && index + 1 < len {
                self.text.push(' ');
                self.chars += 1;
            }

            builder = builder.token(TokenSpec {
                text: row.form,
                lemma: row.lemma,
                pos: row.upos,
                dep: row.deprel,
                head,
                start,
                end: start + width,
            });
        }

        self.count += len;
        self.builder = self.close_entity(builder);
        Ok(())
    }

    fn track_entity(
        &mut self,
        builder: DocumentBuilder,
        id: TokenId,
        tag: Option<&BioTag>,
    ) -> DocumentBuilder {
        match tag {
            Some(BioTag::Inside(label))
                if self.open_entity.as_ref().map(|(_, l)| l) == Some(label) =>
            {
                builder
            }
            Some(BioTag::Begin(label)) | Some(BioTag::Inside(label)) => {
                let builder = self.close_entity(builder);
                self.open_entity = Some((id, label.clone()));
                builder
            }
            None => self.close_entity(builder),
        }
    }

    /// End the open entity just before the next token to be added
    fn close_entity(&mut self, builder: DocumentBuilder) -> DocumentBuilder {
        match self.open_entity.take() {
            Some((start, label)) => {
                let end = builder.token_count();
                builder.entity(start..end, &label)
            }
            None => builder,
        }
    }

    fn finish(self) -> Result<ParsedDocument> {
        self.builder.text(self.text).build()
    }
}

impl DocumentLoader for ConllULoader {
    fn load(&self, input: &str) -> Result<ParsedDocument> {
        let mut assembler = ConllAssembler::default();
        let mut rows: Vec<ConllRow> = Vec::new();

        for (index, line) in input.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim_end_matches('\r');

            if line.trim().is_empty() {
                assembler.push_sentence(std::mem::take(&mut rows))?;
                continue;
            }
            if line.starts_with('#') {
                continue;
            }

            if let Some((id, row)) = ConllRow::parse(line, line_no)? {
                if id != rows.len() + 1 {
                    return Err(RufeersError::Parse(format!(
                        "line {line_no}: expected token id {}, found {id}",
                        rows.len() + 1
                    )));
                }
                rows.push(row);
            }
        }
        assembler.push_sentence(rows)?;

        assembler.finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
