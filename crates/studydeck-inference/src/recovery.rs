//! Recovery of question/answer pairs from raw model output.
//!
//! Two tiers run in order and are never merged:
//!
//! 1. **Structural**: locate the JSON array, run the [`repair`](crate::repair)
//!    pipeline, parse with `serde_json`.
//! 2. **Pattern**: scan the raw text for `"question": "...", "answer": "..."`
//!    sequences.
//!
//! If neither tier yields a usable pair the caller gets
//! [`Error::ResponseParse`] carrying both failure reasons.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use studydeck_core::{Error, FlashcardPair, Result};

use crate::repair::repair_candidate;

/// Which tier produced the recovered pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryTier {
    Structural,
    Pattern,
}

impl RecoveryTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryTier::Structural => "structural",
            RecoveryTier::Pattern => "pattern",
        }
    }
}

impl fmt::Display for RecoveryTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pairs recovered from one model response.
#[derive(Debug, Clone, PartialEq)]
pub struct Recovered {
    /// Usable pairs in response order. Never empty.
    pub pairs: Vec<FlashcardPair>,
    pub tier: RecoveryTier,
}

/// Recover flashcard pairs from raw model output.
pub fn recover(raw: &str) -> Result<Recovered> {
    let tier1_reason = match recover_structural(raw) {
        Ok(pairs) => {
            debug!(
                subsystem = "inference",
                component = "recovery",
                tier = "structural",
                pair_count = pairs.len(),
                "Recovered pairs from JSON array"
            );
            return Ok(Recovered {
                pairs,
                tier: RecoveryTier::Structural,
            });
        }
        Err(reason) => reason,
    };

    warn!(
        subsystem = "inference",
        component = "recovery",
        tier = "structural",
        response_len = raw.len(),
        error = %tier1_reason,
        "Structural recovery failed, falling back to pattern extraction"
    );

    match recover_by_pattern(raw) {
        Ok(pairs) => {
            debug!(
                subsystem = "inference",
                component = "recovery",
                tier = "pattern",
                pair_count = pairs.len(),
                "Recovered pairs by pattern"
            );
            Ok(Recovered {
                pairs,
                tier: RecoveryTier::Pattern,
            })
        }
        Err(tier2_reason) => Err(Error::ResponseParse {
            tier1: tier1_reason,
            tier2: tier2_reason,
        }),
    }
}

// =============================================================================
// TIER 1: STRUCTURAL
// =============================================================================

/// Find the JSON array of objects inside `raw`.
///
/// The candidate starts at the first `[` whose next non-whitespace character
/// is `{` and ends at the matching `]`, skipping brackets inside strings. If
/// the text ends before the array closes, the last `]` after the start is
/// used instead.
pub fn locate_candidate(raw: &str) -> Option<&str> {
    let start = raw.char_indices().find_map(|(idx, c)| {
        if c != '[' {
            return None;
        }
        raw[idx + 1..]
            .chars()
            .find(|ch| !ch.is_whitespace())
            .filter(|ch| *ch == '{')
            .map(|_| idx)
    })?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&raw[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    // Unbalanced: most often a stray quote or truncated output.
    raw[start..]
        .rfind(']')
        .map(|end| &raw[start..start + end + 1])
}

fn recover_structural(raw: &str) -> std::result::Result<Vec<FlashcardPair>, String> {
    let candidate =
        locate_candidate(raw).ok_or_else(|| "no JSON array of objects found".to_string())?;
    let repaired = repair_candidate(candidate);

    let value: Value =
        serde_json::from_str(&repaired).map_err(|e| format!("invalid JSON after repair: {e}"))?;
    let items = value
        .as_array()
        .ok_or_else(|| "parsed JSON is not an array".to_string())?;

    let pairs: Vec<FlashcardPair> = items.iter().filter_map(pair_from_value).collect();
    for pair in &pairs {
        trace!(question = %pair.question, "Recovered structural pair");
    }

    if pairs.is_empty() {
        return Err(format!(
            "array of {} items contained no usable question/answer objects",
            items.len()
        ));
    }
    Ok(pairs)
}

fn pair_from_value(item: &Value) -> Option<FlashcardPair> {
    let question = item.get("question")?.as_str()?;
    let answer = item.get("answer")?.as_str()?;
    FlashcardPair::new(question, answer).ok()
}

// =============================================================================
// TIER 2: PATTERN
// =============================================================================

static PAIR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    let quoted = r#"(?:"((?:[^"\\]|\\.)*?)"|'((?:[^'\\]|\\.)*?)')"#;
    let pattern = format!(
        r#"(?s)["']question["']\s*:\s*{quoted}\s*,\s*["']answer["']\s*:\s*{quoted}"#
    );
    Regex::new(&pattern).expect("pair pattern is a valid regex")
});

/// Single-line fallback that lets a value run across an unescaped inner quote
/// up to the next `", "answer"` or closing quote.
static LENIENT_PAIR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"["']question["']\s*:\s*["'](.+?)["']\s*,\s*["']answer["']\s*:\s*["'](.+?)["']"#,
    )
    .expect("lenient pair pattern is a valid regex")
});

fn recover_by_pattern(raw: &str) -> std::result::Result<Vec<FlashcardPair>, String> {
    let mut pairs = Vec::new();
    let mut matches = 0usize;

    for caps in PAIR_PATTERN.captures_iter(raw) {
        matches += 1;
        let question = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        let answer = caps.get(3).or_else(|| caps.get(4)).map_or("", |m| m.as_str());
        push_captured(&mut pairs, question, answer);
    }

    if matches == 0 {
        for caps in LENIENT_PAIR_PATTERN.captures_iter(raw) {
            matches += 1;
            let question = caps.get(1).map_or("", |m| m.as_str());
            let answer = caps.get(2).map_or("", |m| m.as_str());
            push_captured(&mut pairs, question, answer);
        }
        if !pairs.is_empty() {
            debug!(
                subsystem = "inference",
                component = "recovery",
                tier = "pattern",
                pair_count = pairs.len(),
                "Escape-aware pattern found nothing, used lenient pattern"
            );
        }
    }

    if pairs.is_empty() {
        return Err(if matches == 0 {
            "no question/answer pairs found".to_string()
        } else {
            format!("{matches} question/answer matches were all blank")
        });
    }
    Ok(pairs)
}

fn push_captured(pairs: &mut Vec<FlashcardPair>, question: &str, answer: &str) {
    if let Ok(pair) = FlashcardPair::new(unescape_captured(question), unescape_captured(answer)) {
        trace!(question = %pair.question, "Recovered pattern pair");
        pairs.push(pair);
    }
}

/// Undo the escapes a model commonly emits inside quoted values.
fn unescape_captured(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
