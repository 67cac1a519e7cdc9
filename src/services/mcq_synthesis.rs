//! Two-stage question synthesis.
//!
//! Stage one asks the model to draft, critique and improve a question in a
//! labelled plain-text format, and keeps only the final IMPROVED block. Stage
//! two turns that block into a JSON candidate with three distractors. Every
//! failure along the way becomes a typed [`NoCandidate`] outcome; nothing here
//! returns an error to the caller.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::constants::prompts::{elaboration_prompt, self_refine_prompt};
use crate::models::domain::mcq::DISTRACTOR_COUNT;
use crate::models::domain::McqCandidate;
use crate::services::generation_service::{TextGenerator, TokenUsage};

static FIRST_JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{.*?\}").expect("first-object pattern compiles"));

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Section {
    Stem,
    Answer,
    Critique,
    Improved,
}

const SECTION_LABELS: [(&str, Section); 4] = [
    ("STEM", Section::Stem),
    ("ANSWER", Section::Answer),
    ("CRITIQUE", Section::Critique),
    ("IMPROVED", Section::Improved),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ParseState {
    Seeking,
    Capturing,
}

/// Recognises a labelled section line such as `IMPROVED: ...`, tolerating
/// markdown decoration (`**IMPROVED:**`, `## IMPROVED:`, `- IMPROVED:`).
fn section_marker(line: &str) -> Option<(Section, &str)> {
    let body = line
        .trim()
        .trim_start_matches(|c: char| matches!(c, '*' | '#' | '-') || c.is_whitespace());

    SECTION_LABELS.iter().find_map(|(label, section)| {
        let rest = body.strip_prefix(label)?.trim_start_matches('*');
        let rest = rest.strip_prefix(':')?;
        Some((*section, rest.trim_start_matches('*').trim()))
    })
}

/// Line-oriented extractor for the self-refine output.
///
/// An `IMPROVED:` marker opens a block (text after the colon included); a
/// `CRITIQUE:` marker closes it, as does the next `IMPROVED:`. `STEM:` and
/// `ANSWER:` lines inside a block belong to it. The last non-empty block wins.
#[derive(Debug)]
pub struct SelfRefineParser<'a> {
    state: ParseState,
    current: Vec<&'a str>,
    last: Option<String>,
}

impl<'a> SelfRefineParser<'a> {
    pub fn new() -> Self {
        Self {
            state: ParseState::Seeking,
            current: Vec::new(),
            last: None,
        }
    }

    pub fn feed(&mut self, line: &'a str) {
        match (section_marker(line), self.state) {
            (Some((Section::Improved, rest)), _) => {
                self.close_block();
                if !rest.is_empty() {
                    self.current.push(rest);
                }
                self.state = ParseState::Capturing;
            }
            (Some((Section::Critique, _)), ParseState::Capturing) => {
                self.close_block();
                self.state = ParseState::Seeking;
            }
            (Some((Section::Stem | Section::Answer, _)), ParseState::Capturing)
            | (None, ParseState::Capturing) => self.current.push(line.trim_end()),
            (_, ParseState::Seeking) => {}
        }
    }

    pub fn finish(mut self) -> Option<String> {
        self.close_block();
        self.last
    }

    fn close_block(&mut self) {
        let block = self.current.join("\n").trim().to_string();
        self.current.clear();
        if !block.is_empty() {
            self.last = Some(block);
        }
    }
}

impl Default for SelfRefineParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

pub fn last_improved_block(raw: &str) -> Option<String> {
    let mut parser = SelfRefineParser::new();
    for line in raw.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Result of scanning a model response for the candidate object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JsonExtraction {
    Parsed(McqCandidate),
    Malformed(String),
    Absent,
}

/// Parses the first brace-delimited span of `text`. Nothing is repaired: any
/// missing, empty or mistyped field makes the span malformed.
pub fn extract_candidate(text: &str) -> JsonExtraction {
    let Some(found) = FIRST_JSON_OBJECT.find(text) else {
        return JsonExtraction::Absent;
    };

    let value: Value = match serde_json::from_str(found.as_str()) {
        Ok(value) => value,
        Err(e) => return JsonExtraction::Malformed(format!("invalid JSON: {}", e)),
    };

    match candidate_from_value(&value) {
        Ok(candidate) => JsonExtraction::Parsed(candidate),
        Err(reason) => JsonExtraction::Malformed(reason),
    }
}

fn required_text(value: &Value, field: &str) -> Result<String, String> {
    match value.get(field) {
        None | Some(Value::Null) => Err(format!("missing field: {}", field)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(format!("empty field: {}", field)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(format!("field {} is not a string", field)),
    }
}

fn candidate_from_value(value: &Value) -> Result<McqCandidate, String> {
    let stem = required_text(value, "stem")?;
    let key = required_text(value, "key")?;

    let distractors = match value.get("distractors") {
        None | Some(Value::Null) => return Err("missing field: distractors".to_string()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err("field distractors is not an array".to_string()),
    };
    if distractors.len() != DISTRACTOR_COUNT {
        return Err(format!(
            "expected {} distractors, found {}",
            DISTRACTOR_COUNT,
            distractors.len()
        ));
    }

    let distractors = distractors
        .iter()
        .map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            _ => Err("distractors must be non-empty strings".to_string()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(McqCandidate {
        stem,
        key,
        distractors,
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NoCandidate {
    #[error("generation call failed: {0}")]
    GenerationFailed(String),
    #[error("no IMPROVED block in self-refine output")]
    MissingImproved,
    #[error("no JSON object in elaboration output")]
    JsonAbsent,
    #[error("malformed candidate: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SynthesisOutcome {
    Produced(McqCandidate),
    NoCandidate(NoCandidate),
}

/// Outcome of one synthesis attempt plus the tokens it consumed.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesisReport {
    pub outcome: SynthesisOutcome,
    pub usage: TokenUsage,
}

impl SynthesisReport {
    fn none(reason: NoCandidate, usage: TokenUsage) -> Self {
        Self {
            outcome: SynthesisOutcome::NoCandidate(reason),
            usage,
        }
    }

    pub fn candidate(&self) -> Option<&McqCandidate> {
        match &self.outcome {
            SynthesisOutcome::Produced(candidate) => Some(candidate),
            SynthesisOutcome::NoCandidate(_) => None,
        }
    }

    pub fn into_candidate(self) -> Option<McqCandidate> {
        match self.outcome {
            SynthesisOutcome::Produced(candidate) => Some(candidate),
            SynthesisOutcome::NoCandidate(_) => None,
        }
    }
}

pub struct McqSynthesizer {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
}

impl McqSynthesizer {
    pub fn new(generator: Arc<dyn TextGenerator>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    pub async fn synthesize(&self, context: &str) -> SynthesisReport {
        let mut usage = TokenUsage::default();

        let draft = match self
            .generator
            .generate(&self_refine_prompt(context), self.temperature)
            .await
        {
            Ok(generation) => {
                usage += generation.usage;
                generation.text
            }
            Err(e) => {
                let reason = NoCandidate::GenerationFailed(e.to_string());
                return SynthesisReport::none(reason, usage);
            }
        };

        let Some(improved) = last_improved_block(&draft) else {
            return SynthesisReport::none(NoCandidate::MissingImproved, usage);
        };

        let elaborated = match self
            .generator
            .generate(&elaboration_prompt(&improved), self.temperature)
            .await
        {
            Ok(generation) => {
                usage += generation.usage;
                generation.text
            }
            Err(e) => {
                let reason = NoCandidate::GenerationFailed(e.to_string());
                return SynthesisReport::none(reason, usage);
            }
        };

        let outcome = match extract_candidate(&elaborated) {
            JsonExtraction::Parsed(candidate) => SynthesisOutcome::Produced(candidate),
            JsonExtraction::Malformed(reason) => {
                SynthesisOutcome::NoCandidate(NoCandidate::Malformed(reason))
            }
            JsonExtraction::Absent => SynthesisOutcome::NoCandidate(NoCandidate::JsonAbsent),
        };

        SynthesisReport { outcome, usage }
    }
}
