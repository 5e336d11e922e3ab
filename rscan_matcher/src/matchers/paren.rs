//! Parenthesis tracker
//!
//! Maintains a stack of currently open `(`/`{` brackets. The contract the
//! other matchers rely on: the recorded snapshot's stack length at token i
//! equals the number of open brackets at that point, and passing a bracket
//! token always nets `+1`.
//!
//! Opening brackets are handled in two visits (push with `delta == 0`, then
//! clear the flag and advance). The underlying tokenizer can surface a
//! virtual re-scan of bracket tokens; the net-effect contract above is what
//! matters, not the two-step mechanism.

use serde::Serialize;

use crate::engine::{MatchError, StepResult};
use crate::tokens::{kinds, TokenList};

pub const TRACK_PARENTHESIS: &str = "paren";

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParenState {
    /// Set while the opening bracket at the current index has already been
    /// pushed, pending the second visit.
    #[serde(skip)]
    pushed: bool,
    pub stack: Vec<char>,
}

impl ParenState {
    /// Number of currently open brackets of both kinds.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn pop(&mut self, expected: char, index: usize) -> Result<(), MatchError> {
        match self.stack.pop() {
            Some(found) if found == expected => Ok(()),
            Some(found) => Err(MatchError::UnbalancedParen {
                index,
                expected,
                found: found.to_string(),
            }),
            None => Err(MatchError::UnbalancedParen {
                index,
                expected,
                found: "empty stack".to_string(),
            }),
        }
    }
}

/// Recorded bracket depth at token `index`, or 0 when the paren pass has
/// not visited it. Shared helper for the passes that consume this state.
pub fn depth_at(tokens: &TokenList, index: usize) -> usize {
    tokens
        .get(index)
        .and_then(|t| t.snapshots.get::<ParenState>(TRACK_PARENTHESIS))
        .map(ParenState::depth)
        .unwrap_or(0)
}

pub fn track_parenthesis(mut state: ParenState, i: usize, tokens: &TokenList) -> StepResult<ParenState> {
    match tokens[i].kind.as_str() {
        kinds::OPEN_PAREN => {
            if !state.pushed {
                state.stack.push('(');
                state.pushed = true;
                return Ok((state, 0));
            }
            state.pushed = false;
        }
        kinds::OPEN_BRACE => {
            if !state.pushed {
                state.stack.push('{');
                state.pushed = true;
                return Ok((state, 0));
            }
            state.pushed = false;
        }
        kinds::CLOSE_PAREN => state.pop('(', i)?,
        kinds::CLOSE_BRACE => state.pop('{', i)?,
        _ => {}
    }
    Ok((state, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_matcher;
    use crate::matchers::testutil::tokens;
    use crate::tokens::kinds::*;
    use assert_matches::assert_matches;

    #[test]
    fn balanced_input_ends_empty() {
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "f"),
            (OPEN_PAREN, "("),
            (OPEN_BRACE, "{"),
            (SYMBOL, "x"),
            (CLOSE_BRACE, "}"),
            (CLOSE_PAREN, ")"),
            (NUM_CONST, "1"),
        ]);
        run_matcher(TRACK_PARENTHESIS, &mut list, track_parenthesis).unwrap();
        let last = list
            .final_state::<ParenState>(TRACK_PARENTHESIS)
            .unwrap();
        assert!(last.stack.is_empty());
    }

    #[test]
    fn recorded_depth_matches_nesting() {
        let mut list = tokens(&[
            (OPEN_PAREN, "("),
            (OPEN_BRACE, "{"),
            (SYMBOL, "x"),
            (CLOSE_BRACE, "}"),
            (CLOSE_PAREN, ")"),
        ]);
        run_matcher(TRACK_PARENTHESIS, &mut list, track_parenthesis).unwrap();

        // The symbol between both brackets sees depth 2; closers see the
        // depth before their own pop.
        assert_eq!(depth_at(&list, 2), 2);
        assert_eq!(depth_at(&list, 3), 2);
        assert_eq!(depth_at(&list, 4), 1);
    }

    #[test]
    fn stray_closer_fails() {
        let mut list = tokens(&[(SYMBOL, "x"), (CLOSE_PAREN, ")")]);
        let err = run_matcher(TRACK_PARENTHESIS, &mut list, track_parenthesis).unwrap_err();
        assert_matches!(err, MatchError::UnbalancedParen { index: 1, expected: '(', .. });
    }

    #[test]
    fn mismatched_kind_fails() {
        let mut list = tokens(&[(OPEN_BRACE, "{"), (CLOSE_PAREN, ")")]);
        let err = run_matcher(TRACK_PARENTHESIS, &mut list, track_parenthesis).unwrap_err();
        assert_matches!(err, MatchError::UnbalancedParen { expected: '(', .. });
    }
}
