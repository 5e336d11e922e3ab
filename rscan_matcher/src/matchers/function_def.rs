//! Function definition matcher
//!
//! Recognizes `function(arg1[=default1], ...) body`. The assigned name, if
//! any, comes from the assignment matcher's recorded snapshot at the token
//! preceding the `function` keyword; anonymous definitions are recorded
//! without one. Formals are collected one paren level below the depth
//! recorded at the keyword, and the definition is emitted at the closing
//! parenthesis of the formal list.

use serde::Serialize;

use crate::engine::StepResult;
use crate::matchers::assign::{AssignState, MATCH_ASSIGNMENT};
use crate::matchers::paren::depth_at;
use crate::tokens::{kinds, TokenList};

pub const MATCH_FUNCTION_DEF: &str = "function_def";

#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionArg {
    pub name: String,
    /// Default value text, empty when the formal has none. Only the first
    /// token of a compound default is captured.
    pub default: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Function {
    /// Empty for anonymous functions.
    pub assigned_name: String,
    pub args: Vec<FunctionArg>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FunctionDefState {
    #[serde(skip)]
    initialized: bool,
    #[serde(skip)]
    current: Function,
    #[serde(skip)]
    cur_arg: FunctionArg,
    #[serde(skip)]
    next_is_default: bool,
    /// Index of the `function` keyword of the definition being collected.
    #[serde(skip)]
    keyword_index: Option<usize>,
    /// Bracket depth recorded at the keyword; formals live at `+1`.
    #[serde(skip)]
    begin_depth: usize,

    pub functions: Vec<Function>,
}

pub fn match_function_def(mut state: FunctionDefState, i: usize, tokens: &TokenList) -> StepResult<FunctionDefState> {
    if !state.initialized {
        state.initialized = true;
        return Ok((state, 0));
    }

    if tokens[i].kind == kinds::FUNCTION {
        state.current = Function::default();
        state.cur_arg = FunctionArg::default();
        state.next_is_default = false;
        if i > 0 {
            if let Some(assign) = tokens[i - 1]
                .snapshots
                .get::<AssignState>(MATCH_ASSIGNMENT)
            {
                if !assign.pending_name.is_empty() {
                    state.current.assigned_name = assign.pending_name.clone();
                }
            }
        }
        state.keyword_index = Some(i);
        state.begin_depth = depth_at(tokens, i);
        return Ok((state, 1));
    }

    if state.keyword_index.is_some() {
        let depth = depth_at(tokens, i);
        let closes_formals =
            tokens[i].kind == kinds::CLOSE_PAREN && depth == state.begin_depth + 1;
        if closes_formals || depth == state.begin_depth {
            if !state.cur_arg.name.is_empty() {
                state.current.args.push(std::mem::take(&mut state.cur_arg));
            }
            state
                .functions
                .push(std::mem::take(&mut state.current));
            state.keyword_index = None;
            state.cur_arg = FunctionArg::default();
            state.next_is_default = false;
        } else if depth == state.begin_depth + 1 {
            match tokens[i].kind.as_str() {
                kinds::SYMBOL_FORMALS => state.cur_arg.name = tokens[i].text.clone(),
                kinds::EQ_FORMALS => state.next_is_default = true,
                kinds::COMMA => {
                    state.current.args.push(std::mem::take(&mut state.cur_arg));
                }
                _ => {
                    if state.next_is_default {
                        state.cur_arg.default = tokens[i].text.clone();
                        state.next_is_default = false;
                    }
                }
            }
        }
    }
    Ok((state, 1))
}
