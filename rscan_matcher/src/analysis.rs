//! Per-file analysis driver
//!
//! Runs the five matcher passes over one file's token sequence and collects
//! each pass's final state. The order is fixed: the assignment pass reads
//! paren snapshots, the function-definition pass reads assignment
//! snapshots, and the call pass reads paren snapshots. Reordering does not
//! fail, it silently reads zero-value states.

use serde::Serialize;

use crate::engine::{run_matcher, MatchError};
use crate::matchers::{
    match_assignment, match_function_call, match_function_def, match_library_calls,
    track_parenthesis, AssignState, FunctionCallState, FunctionDefState, LibraryState,
    ParenState, MATCH_ASSIGNMENT, MATCH_FUNCTION_CALL, MATCH_FUNCTION_DEF,
    MATCH_LIBRARY_CALLS, TRACK_PARENTHESIS,
};
use crate::tokens::TokenList;

/// Final states of every pass over one file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileAnalysis {
    pub paren: ParenState,
    pub assign: AssignState,
    pub function_def: FunctionDefState,
    pub library: LibraryState,
    pub function_call: FunctionCallState,
}

pub fn analyze_tokens(tokens: &mut TokenList) -> Result<FileAnalysis, MatchError> {
    run_matcher(TRACK_PARENTHESIS, tokens, track_parenthesis)?;
    run_matcher(MATCH_ASSIGNMENT, tokens, match_assignment)?;
    run_matcher(MATCH_FUNCTION_DEF, tokens, match_function_def)?;
    run_matcher(MATCH_LIBRARY_CALLS, tokens, match_library_calls)?;
    run_matcher(MATCH_FUNCTION_CALL, tokens, match_function_call)?;

    Ok(FileAnalysis {
        paren: tokens
            .final_state::<ParenState>(TRACK_PARENTHESIS)
            .unwrap_or_default(),
        assign: tokens
            .final_state::<AssignState>(MATCH_ASSIGNMENT)
            .unwrap_or_default(),
        function_def: tokens
            .final_state::<FunctionDefState>(MATCH_FUNCTION_DEF)
            .unwrap_or_default(),
        library: tokens
            .final_state::<LibraryState>(MATCH_LIBRARY_CALLS)
            .unwrap_or_default(),
        function_call: tokens
            .final_state::<FunctionCallState>(MATCH_FUNCTION_CALL)
            .unwrap_or_default(),
    })
}
