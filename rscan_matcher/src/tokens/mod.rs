//! Token sequence types shared by all matcher passes
//!
//! Tokens come from the external R tokenizer as `(kind, text)` rows tagged
//! with a source name. Each token additionally carries an append-only map of
//! per-matcher state snapshots, recorded by the engine immediately before
//! that matcher processes the token. Later passes read earlier passes'
//! snapshots through this map; there are no live back-pointers between
//! passes.

pub mod kinds;

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;

/// Per-token map from matcher name to an opaque recorded state snapshot.
///
/// Entries are immutable once recorded; re-recording under the same name
/// replaces the entry (the engine does this when a matcher revisits an
/// index). Snapshots are shared `Arc`s so cloning a token list is cheap.
#[derive(Clone, Default)]
pub struct SnapshotMap {
    entries: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl SnapshotMap {
    /// Record the state of `matcher` as it was before the current step.
    pub fn record<S: Any + Send + Sync>(&mut self, matcher: &'static str, state: S) {
        self.entries.insert(matcher, Arc::new(state));
    }

    /// Typed read of a recorded snapshot. Returns `None` when the matcher
    /// has not visited this token or the requested type does not match.
    pub fn get<S: Any>(&self, matcher: &str) -> Option<&S> {
        self.entries
            .get(matcher)
            .and_then(|state| state.downcast_ref::<S>())
    }

    pub fn contains(&self, matcher: &str) -> bool {
        self.entries.contains_key(matcher)
    }
}

impl fmt::Debug for SnapshotMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_tuple("SnapshotMap").field(&names).finish()
    }
}

/// One lexeme from the external tokenizer.
#[derive(Debug, Clone)]
pub struct Token {
    /// Name of the source unit this token came from (request-supplied).
    pub source: String,
    /// Token kind string as emitted by R's `getParseData`, e.g. `SYMBOL`,
    /// `LEFT_ASSIGN`, `"'('"`. The set is owned by the interpreter, so
    /// kinds stay strings; see [`kinds`] for the ones the matchers use.
    pub kind: String,
    /// Verbatim token text.
    pub text: String,
    /// Per-matcher recorded state snapshots.
    pub snapshots: SnapshotMap,
}

impl Token {
    pub fn new(
        source: impl Into<String>,
        kind: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            kind: kind.into(),
            text: text.into(),
            snapshots: SnapshotMap::default(),
        }
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }
}

/// Fully materialized, randomly addressable token sequence.
///
/// Matchers need repeated and backward access, not just forward streaming,
/// so the whole sequence is held in memory.
#[derive(Debug, Clone, Default)]
pub struct TokenList {
    tokens: Vec<Token>,
}

impl TokenList {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn get(&self, index: usize) -> Option<&Token> {
        self.tokens.get(index)
    }

    /// Token kind at `index`, or `None` past the end. Convenience for
    /// matchers peeking at neighbors.
    pub fn kind_at(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(|t| t.kind.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// The last token's recorded snapshot for `matcher` — the pass's final
    /// result once the pass has completed.
    pub fn final_state<S: Any + Clone>(&self, matcher: &str) -> Option<S> {
        self.tokens
            .last()
            .and_then(|t| t.snapshots.get::<S>(matcher))
            .cloned()
    }
}

impl Index<usize> for TokenList {
    type Output = Token;

    fn index(&self, index: usize) -> &Token {
        &self.tokens[index]
    }
}

impl IndexMut<usize> for TokenList {
    fn index_mut(&mut self, index: usize) -> &mut Token {
        &mut self.tokens[index]
    }
}

impl FromIterator<Token> for TokenList {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}
