//! Library call matcher
//!
//! Collects package references from two shapes: `pkg::sym` qualification
//! (the `SYMBOL_PACKAGE` token) and calls to the package-loading functions
//! with a string-literal or bare-symbol first argument. Keeps both an
//! ordered call list and a deduplicated namespace set. Runs independently
//! of the paren tracker.

use serde::Serialize;

use crate::engine::StepResult;
use crate::tokens::{kinds, TokenList};

pub const MATCH_LIBRARY_CALLS: &str = "library";

const PACKAGE_LOAD_FUNCTIONS: [&str; 5] = [
    "library",
    "require",
    "attachNamespace",
    "loadNamespace",
    "requireNamespace",
];

#[derive(Debug, Clone, Serialize)]
pub struct LibraryCall {
    /// Loading function name, or `SYMBOL_PACKAGE` for `::` qualification.
    pub method: String,
    pub namespace: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LibraryState {
    pub errors: Vec<String>,
    pub namespaces_used: Vec<String>,
    pub library_calls: Vec<LibraryCall>,
}

impl LibraryState {
    fn record(&mut self, method: &str, namespace: &str) {
        if !self.namespaces_used.iter().any(|ns| ns == namespace) {
            self.namespaces_used.push(namespace.to_string());
        }
        self.library_calls.push(LibraryCall {
            method: method.to_string(),
            namespace: namespace.to_string(),
        });
    }
}

fn strip_string_quotes(text: &str) -> &str {
    if text.starts_with('"') {
        text.trim_matches('"')
    } else if text.starts_with('\'') {
        text.trim_matches('\'')
    } else {
        text
    }
}

pub fn match_library_calls(mut state: LibraryState, i: usize, tokens: &TokenList) -> StepResult<LibraryState> {
    match tokens[i].kind.as_str() {
        kinds::SYMBOL_PACKAGE => {
            let namespace = tokens[i].text.clone();
            state.record(kinds::SYMBOL_PACKAGE, &namespace);
        }
        kinds::SYMBOL_FUNCTION_CALL
            if PACKAGE_LOAD_FUNCTIONS.contains(&tokens[i].text.as_str()) =>
        {
            if tokens.kind_at(i + 1) != Some(kinds::OPEN_PAREN) {
                state.errors.push(format!("library call missing '(' at {i}"));
                return Ok((state, 1));
            }
            let Some(arg) = tokens.get(i + 2) else {
                state.errors.push(format!("library call missing argument at {i}"));
                return Ok((state, 1));
            };
            let namespace = match arg.kind.as_str() {
                kinds::STR_CONST => strip_string_quotes(&arg.text).to_string(),
                kinds::SYMBOL => arg.text.clone(),
                other => {
                    state.errors.push(format!(
                        "unexpected token {other} trying to resolve library call at {}",
                        i + 2
                    ));
                    return Ok((state, 1));
                }
            };
            let method = tokens[i].text.clone();
            state.record(&method, &namespace);
        }
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

    fn run(list: &mut crate::tokens::TokenList) -> LibraryState {
        run_matcher(MATCH_LIBRARY_CALLS, list, match_library_calls).unwrap();
        list.final_state::<LibraryState>(MATCH_LIBRARY_CALLS)
            .unwrap()
    }

    #[test]
    fn library_call_with_bare_symbol() {
        // library(dplyr)
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "library"),
            (OPEN_PAREN, "("),
            (SYMBOL, "dplyr"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.namespaces_used, vec!["dplyr"]);
        assert_eq!(state.library_calls.len(), 1);
        assert_eq!(state.library_calls[0].method, "library");
        assert_eq!(state.library_calls[0].namespace, "dplyr");
    }

    #[test]
    fn require_call_strips_string_quotes() {
        // requireNamespace("jsonlite"); require('tibble')
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "requireNamespace"),
            (OPEN_PAREN, "("),
            (STR_CONST, "\"jsonlite\""),
            (CLOSE_PAREN, ")"),
            (SYMBOL_FUNCTION_CALL, "require"),
            (OPEN_PAREN, "("),
            (STR_CONST, "'tibble'"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.namespaces_used, vec!["jsonlite", "tibble"]);
        assert_eq!(state.library_calls[0].namespace, "jsonlite");
        assert_eq!(state.library_calls[1].namespace, "tibble");
    }

    #[test]
    fn namespace_qualification_recorded() {
        // stats::rnorm(1)
        let mut list = tokens(&[
            (SYMBOL_PACKAGE, "stats"),
            (NS_GET, "::"),
            (SYMBOL_FUNCTION_CALL, "rnorm"),
            (OPEN_PAREN, "("),
            (NUM_CONST, "1"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.namespaces_used, vec!["stats"]);
        assert_eq!(state.library_calls[0].method, SYMBOL_PACKAGE);
        assert_eq!(state.library_calls[0].namespace, "stats");
    }

    #[test]
    fn namespaces_dedup_but_calls_stay_ordered() {
        // library(dplyr); dplyr::filter(x)
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "library"),
            (OPEN_PAREN, "("),
            (SYMBOL, "dplyr"),
            (CLOSE_PAREN, ")"),
            (SYMBOL_PACKAGE, "dplyr"),
            (NS_GET, "::"),
            (SYMBOL_FUNCTION_CALL, "filter"),
            (OPEN_PAREN, "("),
            (SYMBOL, "x"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.namespaces_used, vec!["dplyr"]);
        assert_eq!(state.library_calls.len(), 2);
    }

    #[test]
    fn similarly_named_call_is_not_a_load() {
        // e(x) : a one-letter call must not register as a loader.
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "e"),
            (OPEN_PAREN, "("),
            (SYMBOL, "x"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert!(state.library_calls.is_empty());
        assert!(state.namespaces_used.is_empty());
        assert!(state.errors.is_empty());
    }

    #[test]
    fn unexpected_argument_is_soft_error() {
        // library(1)
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "library"),
            (OPEN_PAREN, "("),
            (NUM_CONST, "1"),
            (CLOSE_PAREN, ")"),
        ]);
        let state = run(&mut list);

        assert!(state.library_calls.is_empty());
        assert_eq!(state.errors.len(), 1);
    }
}
