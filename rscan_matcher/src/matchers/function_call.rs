//! Function call matcher
//!
//! Recognizes `SYMBOL_FUNCTION_CALL '(' args ')'`. One call frame is open
//! at a time; argument tokens collected while it is open belong to it, so
//! arguments of nested calls fold into the outermost frame. The frame
//! closes at its matching `')'`, identified through the paren tracker's
//! recorded depth, and the emit revisits the closer so the call is present
//! in that token's snapshot.

use serde::Serialize;

use crate::engine::StepResult;
use crate::matchers::paren::depth_at;
use crate::tokens::{kinds, TokenList};

pub const MATCH_FUNCTION_CALL: &str = "function_call";

#[derive(Debug, Clone, Default, Serialize)]
pub struct CallArg {
    /// Empty for positional arguments.
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<CallArg>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionCallState {
    #[serde(skip)]
    current: Option<FunctionCall>,
    /// Set after a `SYMBOL_SUB`; the next value token fills the named arg.
    #[serde(skip)]
    in_named: bool,
    /// Bracket depth recorded at the call name token. The matching closer
    /// is the `')'` whose recorded depth is `open_depth + 1`.
    #[serde(skip)]
    open_depth: usize,

    pub errors: Vec<String>,
    pub calls: Vec<FunctionCall>,
}

pub fn match_function_call(mut state: FunctionCallState, i: usize, tokens: &TokenList) -> StepResult<FunctionCallState> {
    if state.current.is_some() {
        let depth = depth_at(tokens, i);
        let at_closer = tokens[i].kind == kinds::CLOSE_PAREN && depth == state.open_depth + 1;
        if at_closer || depth <= state.open_depth {
            if let Some(call) = state.current.take() {
                state.calls.push(call);
            }
            state.open_depth = 0;
            state.in_named = false;
            // Revisit so the closer's snapshot carries the emitted call.
            return Ok((state, 0));
        }

        let kind = tokens[i].kind.as_str();
        if kind == kinds::SYMBOL || kind.ends_with(kinds::CONST_SUFFIX) {
            if let Some(call) = state.current.as_mut() {
                if state.in_named {
                    if let Some(arg) = call.args.last_mut() {
                        arg.value = tokens[i].text.clone();
                    }
                    state.in_named = false;
                } else {
                    call.args.push(CallArg {
                        name: String::new(),
                        value: tokens[i].text.clone(),
                    });
                }
            }
        } else if kind == kinds::SYMBOL_SUB {
            if let Some(call) = state.current.as_mut() {
                call.args.push(CallArg {
                    name: tokens[i].text.clone(),
                    value: String::new(),
                });
            }
            state.in_named = true;
        }
        return Ok((state, 1));
    }

    if tokens[i].kind == kinds::SYMBOL_FUNCTION_CALL {
        if tokens.kind_at(i + 1) != Some(kinds::OPEN_PAREN) {
            state
                .errors
                .push(format!("function call missing '(' at {i}"));
            return Ok((state, 1));
        }
        state.current = Some(FunctionCall {
            name: tokens[i].text.clone(),
            args: Vec::new(),
        });
        state.open_depth = depth_at(tokens, i);
        return Ok((state, 2));
    }

    Ok((state, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_matcher;
    use crate::matchers::paren::{track_parenthesis, TRACK_PARENTHESIS};
    use crate::matchers::testutil::tokens;
    use crate::tokens::kinds::*;

    fn run(list: &mut crate::tokens::TokenList) -> FunctionCallState {
        run_matcher(TRACK_PARENTHESIS, list, track_parenthesis).unwrap();
        run_matcher(MATCH_FUNCTION_CALL, list, match_function_call).unwrap();
        list.final_state::<FunctionCallState>(MATCH_FUNCTION_CALL)
            .unwrap()
    }

    #[test]
    fn positional_and_named_args() {
        // foo(1, bar=2) with nothing after it
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "foo"),
            (OPEN_PAREN, "("),
            (NUM_CONST, "1"),
            (COMMA, ","),
            (SYMBOL_SUB, "bar"),
            (EQ_SUB, "="),
            (NUM_CONST, "2"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.calls.len(), 1);
        let call = &state.calls[0];
        assert_eq!(call.name, "foo");
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[0].name, "");
        assert_eq!(call.args[0].value, "1");
        assert_eq!(call.args[1].name, "bar");
        assert_eq!(call.args[1].value, "2");
    }

    #[test]
    fn consecutive_calls_both_recorded() {
        // foo(1) bar(2)
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "foo"),
            (OPEN_PAREN, "("),
            (NUM_CONST, "1"),
            (CLOSE_PAREN, ")"),
            (SYMBOL_FUNCTION_CALL, "bar"),
            (OPEN_PAREN, "("),
            (NUM_CONST, "2"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.calls.len(), 2);
        assert_eq!(state.calls[0].name, "foo");
        assert_eq!(state.calls[1].name, "bar");
    }

    #[test]
    fn empty_call() {
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "f"),
            (OPEN_PAREN, "("),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);
        assert_eq!(state.calls.len(), 1);
        assert!(state.calls[0].args.is_empty());
    }

    #[test]
    fn nested_call_args_fold_into_outer_frame() {
        // outer(inner(1), 2) : only the outer frame opens, and both
        // constants land in it.
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "outer"),
            (OPEN_PAREN, "("),
            (SYMBOL_FUNCTION_CALL, "inner"),
            (OPEN_PAREN, "("),
            (NUM_CONST, "1"),
            (CLOSE_PAREN, ")"),
            (COMMA, ","),
            (NUM_CONST, "2"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.calls.len(), 1);
        let call = &state.calls[0];
        assert_eq!(call.name, "outer");
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[0].value, "1");
        assert_eq!(call.args[1].value, "2");
    }

    #[test]
    fn missing_open_paren_is_soft_error() {
        let mut list = tokens(&[(SYMBOL_FUNCTION_CALL, "f"), (SYMBOL, "x")]);
        let state = run(&mut list);

        assert!(state.calls.is_empty());
        assert_eq!(state.errors.len(), 1);
    }

    #[test]
    fn call_name_at_end_of_input() {
        let mut list = tokens(&[(SYMBOL, "x"), (SYMBOL_FUNCTION_CALL, "f")]);
        let state = run(&mut list);

        assert!(state.calls.is_empty());
        assert_eq!(state.errors.len(), 1);
    }
}
