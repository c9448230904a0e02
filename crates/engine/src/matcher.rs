//! Regex pattern matching over transaction descriptions.
//!
//! Patterns are user-maintained and validated at creation time, so a row
//! that fails to compile here is stale data: it is skipped with a warning,
//! never allowed to abort a whole matching pass.
//!
//! Owner attribution is first-match-wins; the iteration order is pattern
//! creation order, which callers guarantee by loading rows ordered by
//! `(created_at, id)`. Tag attribution applies every match.

use regex::RegexBuilder;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Upper bound on the compiled size of a user pattern. The regex crate's
/// engine is linear-time at match time, so bounding the compile is the
/// whole guard.
const PATTERN_SIZE_LIMIT: usize = 1 << 16;

/// A compiled pattern plus the owner or tag it attributes to.
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    pub pattern_id: Uuid,
    /// The owner or tag this pattern belongs to.
    pub target_id: Uuid,
    regex: regex::Regex,
}

impl CompiledPattern {
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Validates pattern text the way the matcher will compile it.
///
/// Used at creation time so invalid patterns are rejected with a validation
/// error and never stored.
pub fn validate_pattern(pattern: &str) -> ResultEngine<()> {
    compile(pattern).map(|_| ())
}

fn compile(pattern: &str) -> ResultEngine<regex::Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|err| EngineError::InvalidPattern(format!("{pattern}: {err}")))
}

/// A set of compiled patterns, built once per matching pass.
#[derive(Clone, Debug, Default)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compiles `(pattern_id, target_id, pattern_text)` rows, preserving
    /// their order. Rows that no longer compile are skipped.
    pub fn compile(rows: &[(Uuid, Uuid, String)]) -> Self {
        let mut patterns = Vec::with_capacity(rows.len());
        for (pattern_id, target_id, text) in rows {
            match compile(text) {
                Ok(regex) => patterns.push(CompiledPattern {
                    pattern_id: *pattern_id,
                    target_id: *target_id,
                    regex,
                }),
                Err(err) => {
                    tracing::warn!("skipping stored pattern {pattern_id}: {err}");
                }
            }
        }
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First matching pattern, in load order (owner attribution policy).
    pub fn first_match(&self, text: &str) -> Option<&CompiledPattern> {
        self.patterns.iter().find(|p| p.is_match(text))
    }

    /// Every matching pattern (tag attribution policy).
    pub fn all_matches(&self, text: &str) -> Vec<&CompiledPattern> {
        self.patterns.iter().filter(|p| p.is_match(text)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(texts: &[&str]) -> Vec<(Uuid, Uuid, String)> {
        texts
            .iter()
            .map(|t| (Uuid::new_v4(), Uuid::new_v4(), t.to_string()))
            .collect()
    }

    #[test]
    fn first_match_respects_load_order() {
        let rows = rows(&["RENT", "RENT APT"]);
        let set = PatternSet::compile(&rows);
        let hit = set.first_match("RENT APT 302").unwrap();
        assert_eq!(hit.pattern_id, rows[0].0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let rows = rows(&["transferencia"]);
        let set = PatternSet::compile(&rows);
        assert!(set.first_match("ABONO TRANSFERENCIA").is_some());
    }

    #[test]
    fn all_matches_returns_every_hit() {
        let rows = rows(&["APT", "302", "NOMATCH"]);
        let set = PatternSet::compile(&rows);
        assert_eq!(set.all_matches("APT 302").len(), 2);
    }

    #[test]
    fn invalid_rows_are_skipped_not_fatal() {
        let rows = vec![
            (Uuid::new_v4(), Uuid::new_v4(), "[unclosed".to_string()),
            (Uuid::new_v4(), Uuid::new_v4(), "valid".to_string()),
        ];
        let set = PatternSet::compile(&rows);
        assert!(set.first_match("still valid").is_some());
    }

    #[test]
    fn validate_rejects_bad_regex() {
        assert!(validate_pattern("(").is_err());
        assert!(validate_pattern("RENT.*302").is_ok());
    }
}
