//! Token-containment search over visible notes.
//!
//! # Responsibility
//! - Resolve the candidate set through `AccessEvaluator::list_visible`.
//! - Match query tokens against note title and body.
//!
//! # Invariants
//! - Only notes visible to the searching principal are ever returned.
//! - Blank queries (or queries without word characters) return no hits.
//! - Hits keep visible-set order: owned notes first, then shared notes.

use crate::access::evaluator::{AccessEvaluator, AccessResult};
use crate::model::note::{Note, PrincipalId};
use crate::repo::note_repo::NoteStore;
use crate::repo::principal_repo::PrincipalDirectory;
use crate::repo::share_repo::ShareRegistry;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid word regex"));

/// Search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// User query text. Terms are OR-ed.
    pub text: String,
    /// Optional cap on the number of hits. `None` returns every match and
    /// `Some(0)` returns nothing.
    pub limit: Option<u32>,
}

impl SearchQuery {
    /// Creates an uncapped query.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: None,
        }
    }

    /// Caps the number of returned hits.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Splits text into lowercase word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    WORD_RE
        .find_iter(text)
        .map(|word| word.as_str().to_lowercase())
        .collect()
}

/// Returns whether any query token appears as a word of the note.
pub fn note_matches(note: &Note, terms: &HashSet<String>) -> bool {
    tokenize(&note.title)
        .into_iter()
        .chain(tokenize(&note.body))
        .any(|token| terms.contains(&token))
}

/// Search engine delegating visibility to an access evaluator.
pub struct SearchEngine<'e, 'a, N: ?Sized, S: ?Sized, P: ?Sized> {
    evaluator: &'e AccessEvaluator<'a, N, S, P>,
}

impl<'e, 'a, N, S, P> SearchEngine<'e, 'a, N, S, P>
where
    N: NoteStore + ?Sized,
    S: ShareRegistry + ?Sized,
    P: PrincipalDirectory + ?Sized,
{
    pub fn new(evaluator: &'e AccessEvaluator<'a, N, S, P>) -> Self {
        Self { evaluator }
    }

    /// Searches notes visible to `principal`.
    pub fn search(&self, principal: &PrincipalId, query: &SearchQuery) -> AccessResult<Vec<Note>> {
        let terms: HashSet<String> = tokenize(&query.text).into_iter().collect();
        if terms.is_empty() || query.limit == Some(0) {
            return Ok(Vec::new());
        }

        let candidates = self.evaluator.list_visible(principal)?;
        let candidate_count = candidates.len();
        let max_hits = query.limit.map_or(usize::MAX, |limit| limit as usize);
        let hits: Vec<Note> = candidates
            .into_iter()
            .map(|visible| visible.note)
            .filter(|note| note_matches(note, &terms))
            .take(max_hits)
            .collect();

        debug!(
            "event=search module=search status=ok principal={} terms={} candidates={} hits={}",
            principal,
            terms.len(),
            candidate_count,
            hits.len()
        );
        Ok(hits)
    }
}
