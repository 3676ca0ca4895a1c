//! Scoring an utterance against registered intent patterns.

use std::collections::HashSet;

use bankchat_types::intent::IntentResult;
use regex::Regex;

use super::entities::EntityExtractor;

/// Weight of a pattern hit in the confidence score.
const PATTERN_WEIGHT: f64 = 0.5;
/// Weight of the matched keyword fraction in the confidence score.
const KEYWORD_WEIGHT: f64 = 0.4;

/// One routable intent: phrase patterns plus a keyword bag.
#[derive(Debug, Clone)]
pub struct IntentPattern {
    name: String,
    patterns: Vec<Regex>,
    keywords: Vec<String>,
}

impl IntentPattern {
    /// Build a pattern set.
    ///
    /// `phrases` match case-insensitively on word boundaries; `regexes` are
    /// compiled case-insensitively as written. Keywords match whole words.
    pub fn new(
        name: &str,
        phrases: &[&str],
        regexes: &[&str],
        keywords: &[&str],
    ) -> Result<Self, regex::Error> {
        let mut patterns = Vec::with_capacity(phrases.len() + regexes.len());
        for phrase in phrases {
            patterns.push(Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase)))?);
        }
        for raw in regexes {
            patterns.push(Regex::new(&format!("(?i){raw}"))?);
        }
        Ok(Self {
            name: name.to_string(),
            patterns,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `0.5` for any pattern hit plus `0.4` times the fraction of keywords
    /// present.
    fn score(&self, utterance: &str, words: &HashSet<String>) -> f64 {
        let pattern_hit = if self.patterns.iter().any(|p| p.is_match(utterance)) {
            PATTERN_WEIGHT
        } else {
            0.0
        };
        let keyword_part = if self.keywords.is_empty() {
            0.0
        } else {
            let matched = self.keywords.iter().filter(|k| words.contains(*k)).count();
            KEYWORD_WEIGHT * matched as f64 / self.keywords.len() as f64
        };
        pattern_hit + keyword_part
    }
}

/// Maps an utterance to the best-scoring intent and its entities.
#[derive(Debug)]
pub struct IntentRouter {
    intents: Vec<IntentPattern>,
    extractor: EntityExtractor,
}

impl IntentRouter {
    pub fn new(intents: Vec<IntentPattern>) -> Result<Self, regex::Error> {
        Ok(Self {
            intents,
            extractor: EntityExtractor::new()?,
        })
    }

    /// Router with the built-in banking intents.
    pub fn banking() -> Result<Self, regex::Error> {
        Self::new(super::catalog::banking_intents()?)
    }

    /// Score every intent and return the best.
    ///
    /// Ties go to the intent registered first. The reported confidence is
    /// rounded to two decimals after the winner is chosen. When nothing
    /// scores above zero the `general` sentinel is returned with no entities.
    pub fn classify(&self, utterance: &str) -> IntentResult {
        let words = word_set(utterance);

        let mut best: Option<(&IntentPattern, f64)> = None;
        for intent in &self.intents {
            let score = intent.score(utterance, &words);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((intent, score));
            }
        }

        match best {
            Some((intent, score)) => {
                let confidence = (score * 100.0).round() / 100.0;
                tracing::debug!(intent = intent.name(), confidence, "utterance classified");
                IntentResult {
                    name: intent.name().to_string(),
                    confidence,
                    entities: self.extractor.extract(utterance, intent.name()),
                }
            }
            None => IntentResult::general(),
        }
    }

    /// Entity extraction for a known intent, used mid-dialog.
    pub fn extract_entities(
        &self,
        utterance: &str,
        intent: &str,
    ) -> std::collections::BTreeMap<String, String> {
        self.extractor.extract(utterance, intent)
    }
}

fn word_set(utterance: &str) -> HashSet<String> {
    utterance
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}
