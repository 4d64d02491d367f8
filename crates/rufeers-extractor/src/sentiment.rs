//! Sentiment scoring module
//!
//! Lexicon-based polarity in `[-1, 1]`. Intensifiers scale the next polar
//! word, negators flip and damp it, and the document score is the mean over
//! all polar words.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Anything that can assign a polarity to free text
pub trait SentimentScorer: Send + Sync {
    /// Polarity in `[-1, 1]`; zero when the text carries no signal
    fn polarity(&self, text: &str) -> f32;
}

/// Coarse sentiment class of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Classify `score`; magnitudes at or below `neutral_threshold` are neutral
    pub fn from_score(score: f32, neutral_threshold: f32) -> Self {
        if score > neutral_threshold {
            Self::Positive
        } else if score < -neutral_threshold {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z]+(?:'[A-Za-z]+)?").unwrap());

static POLARITY: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| {
    HashMap::from([
        // Positive
        ("good", 0.7),
        ("great", 0.8),
        ("excellent", 1.0),
        ("amazing", 0.6),
        ("wonderful", 1.0),
        ("best", 1.0),
        ("better", 0.5),
        ("happy", 0.8),
        ("glad", 0.5),
        ("love", 0.5),
        ("nice", 0.6),
        ("beautiful", 0.85),
        ("success", 0.3),
        ("successful", 0.75),
        ("win", 0.8),
        ("won", 0.8),
        ("peaceful", 0.25),
        ("safe", 0.5),
        ("praised", 0.4),
        ("welcome", 0.8),
        ("hope", 0.3),
        ("support", 0.2),
        ("fair", 0.7),
        ("free", 0.4),
        ("positive", 0.23),
        ("strong", 0.43),
        ("celebrated", 0.5),
        // Negative
        ("bad", -0.7),
        ("worse", -0.4),
        ("worst", -1.0),
        ("terrible", -1.0),
        ("awful", -1.0),
        ("horrible", -1.0),
        ("sad", -0.5),
        ("angry", -0.5),
        ("hate", -0.8),
        ("poor", -0.4),
        ("wrong", -0.5),
        ("fail", -0.5),
        ("failed", -0.5),
        ("crisis", -0.4),
        ("violent", -0.8),
        ("violence", -0.8),
        ("dead", -0.2),
        ("killed", -0.2),
        ("attack", -0.5),
        ("protest", -0.2),
        ("corrupt", -0.5),
        ("corruption", -0.5),
        ("illegal", -0.5),
        ("guilty", -0.5),
        ("dangerous", -0.6),
        ("unfair", -0.5),
        ("negative", -0.3),
        ("weak", -0.38),
        ("condemned", -0.4),
    ])
});

static INTENSIFIERS: Lazy<HashMap<&'static str, f32>> = Lazy::new(|| {
    HashMap::from([
        ("very", 1.3),
        ("really", 1.2),
        ("extremely", 1.5),
        ("highly", 1.3),
        ("so", 1.2),
        ("too", 1.2),
        ("quite", 1.1),
        ("slightly", 0.6),
        ("somewhat", 0.7),
    ])
});

const NEGATORS: &[&str] = &["not", "no", "never", "none", "nothing", "neither", "nor"];

/// Damping applied to a negated polar word
const NEGATION_FACTOR: f32 = -0.5;

/// Built-in English polarity lexicon
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentiment;

impl LexiconSentiment {
    pub fn new() -> Self {
        Self
    }

    fn is_negator(word: &str) -> bool {
        NEGATORS.contains(&word) || word.ends_with("n't")
    }
}

impl SentimentScorer for LexiconSentiment {
    fn polarity(&self, text: &str) -> f32 {
        let mut scores = Vec::new();
        let mut modifier = 1.0_f32;
        let mut negated = false;

        for mat in WORD.find_iter(text) {
            let word = mat.as_str().to_lowercase();

            if Self::is_negator(&word) {
                negated = true;
                continue;
            }
            if let Some(factor) = INTENSIFIERS.get(word.as_str()) {
                modifier *= factor;
                continue;
            }

            if let Some(&polarity) = POLARITY.get(word.as_str()) {
                let mut score = polarity * modifier;
                if negated {
                    score *= NEGATION_FACTOR;
                }
                scores.push(score.clamp(-1.0, 1.0));
            }

            modifier = 1.0;
            negated = false;
        }

        if scores.is_empty() {
            return 0.0;
        }
        let mean = scores.iter().sum::<f32>() / scores.len() as f32;
        mean.clamp(-1.0, 1.0)
    }
}
