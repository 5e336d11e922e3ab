//! Structural matcher passes
//!
//! Five independent passes over one token sequence, each recovering one
//! shallow lexical pattern. They must run in the order
//! [`analysis::analyze_tokens`](crate::analysis::analyze_tokens) runs them:
//! later passes dereference earlier passes' recorded snapshots, and a pass
//! that runs too early reads zero-value states instead of an error.

pub mod assign;
pub mod function_call;
pub mod function_def;
pub mod library;
pub mod paren;

pub use assign::{match_assignment, AssignState, Variable, MATCH_ASSIGNMENT};
pub use function_call::{match_function_call, CallArg, FunctionCall, FunctionCallState, MATCH_FUNCTION_CALL};
pub use function_def::{match_function_def, Function, FunctionArg, FunctionDefState, MATCH_FUNCTION_DEF};
pub use library::{match_library_calls, LibraryCall, LibraryState, MATCH_LIBRARY_CALLS};
pub use paren::{track_parenthesis, ParenState, TRACK_PARENTHESIS};
