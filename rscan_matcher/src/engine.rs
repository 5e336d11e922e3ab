//! Generic incremental token-matcher engine
//!
//! A matcher pass is a state value plus a step function returning the next
//! state and a signed cursor delta. The engine replays the step across the
//! token sequence, recording the pre-step state into each visited token's
//! snapshot map. Signed deltas let a single linear pass do limited lookback
//! and lookahead reclassification without recursive descent: `delta == 0`
//! revisits the same index with updated state, `delta < 0` rewinds to
//! reclassify earlier tokens.
//!
//! The engine places no bound on total steps; a matcher that never advances
//! will loop forever. Keeping per-token work bounded is the matcher's
//! responsibility.

use std::any::Any;

use crate::tokens::TokenList;

/// Errors that abort a matcher pass.
///
/// These abort the pass for the current source unit only; entity lists
/// already recorded in token snapshots are append-only, so prefix results
/// from before the failing step remain valid.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error("matcher '{matcher}' stepped to negative index {index}")]
    NegativeIndex { matcher: &'static str, index: isize },

    #[error("unbalanced parenthesis at token {index}: expected '{expected}', found {found}")]
    UnbalancedParen {
        index: usize,
        expected: char,
        found: String,
    },
}

/// Step function contract: `(state, index, tokens) -> (next state, delta)`.
pub type StepResult<S> = Result<(S, isize), MatchError>;

/// Run one matcher pass over `tokens`, recording pre-step snapshots under
/// `matcher`.
///
/// The state starts at `S::default()` and the cursor at 0. The pass
/// succeeds when the cursor reaches the end of the sequence; a step that
/// would move it below zero fails with [`MatchError::NegativeIndex`], and
/// step errors propagate immediately.
pub fn run_matcher<S, F>(matcher: &'static str, tokens: &mut TokenList, mut step: F) -> Result<(), MatchError>
where
    S: Default + Clone + Any + Send + Sync,
    F: FnMut(S, usize, &TokenList) -> StepResult<S>,
{
    let mut state = S::default();
    let mut cursor: isize = 0;
    loop {
        if cursor < 0 {
            return Err(MatchError::NegativeIndex {
                matcher,
                index: cursor,
            });
        }
        let index = cursor as usize;
        if index >= tokens.len() {
            return Ok(());
        }
        tokens[index].snapshots.record(matcher, state.clone());
        let (next, delta) = step(state, index, tokens)?;
        state = next;
        cursor += delta;
    }
}
