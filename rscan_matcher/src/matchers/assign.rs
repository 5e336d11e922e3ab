//! Assignment matcher
//!
//! Recognizes `SYMBOL (<-|=) rhs` plus indexed/attribute targets such as
//! `x[i] <- ...` and `attr(x, "y") <- ...`. On an assignment operator the
//! pass rewinds one token to classify the left-hand side; indexed targets
//! trigger a further backward bracket-balancing scan to the base
//! identifier, bounded by the paren tracker's recorded depth. The pass then
//! bounces to the token after the operator and back, so the operator
//! token's final snapshot carries the resolved name — the
//! function-definition matcher reads it there.

use serde::Serialize;

use crate::engine::StepResult;
use crate::matchers::paren::depth_at;
use crate::tokens::{kinds, TokenList};

pub const MATCH_ASSIGNMENT: &str = "assign";

#[derive(Debug, Clone, Serialize)]
pub struct Variable {
    pub name: String,
    /// Operator kind: `LEFT_ASSIGN` or `EQ_ASSIGN`.
    pub assign_kind: String,
    /// Kind of the first right-hand-side token.
    pub rhs_kind: String,
}

/// Backward scan for the base identifier of an indexed/attribute target.
#[derive(Debug, Clone)]
struct TargetScan {
    /// Open bracket balance while walking leftwards; `[[` counts twice.
    balance: usize,
    /// Paren depth where the scan started; dropping below it means the
    /// scan escaped the enclosing expression.
    floor: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignState {
    #[serde(skip)]
    initialized: bool,
    /// Index of the operator currently being resolved.
    #[serde(skip)]
    op_index: Option<usize>,
    /// Resolved target name, waiting for the emit bounce. The
    /// function-definition matcher reads this field out of recorded
    /// snapshots.
    #[serde(skip)]
    pub(crate) pending_name: String,
    #[serde(skip)]
    scan: Option<TargetScan>,

    pub errors: Vec<String>,
    pub variables: Vec<Variable>,
    pub eq_assign_count: usize,
    pub left_assign_count: usize,
}

pub fn match_assignment(mut state: AssignState, i: usize, tokens: &TokenList) -> StepResult<AssignState> {
    if !state.initialized {
        state.initialized = true;
        return Ok((state, 0));
    }

    // Emit bounce: name resolved, return to the operator and record the
    // variable with the RHS kind read one past it.
    if !state.pending_name.is_empty() {
        if let Some(op) = state.op_index {
            if i != op {
                return Ok((state, op as isize - i as isize));
            }
            let rhs_kind = tokens
                .kind_at(i + 1)
                .unwrap_or_default()
                .to_string();
            let name = std::mem::take(&mut state.pending_name);
            state.variables.push(Variable {
                name,
                assign_kind: tokens[i].kind.clone(),
                rhs_kind,
            });
            state.op_index = None;
            return Ok((state, 1));
        }
    }

    if let Some(scan) = state.scan.take() {
        return scan_target(state, scan, i, tokens);
    }

    if let Some(op) = state.op_index {
        if op > i {
            // Classifying the token immediately left of the operator.
            let accessor_prefixed = i > 0
                && matches!(
                    tokens[i - 1].kind.as_str(),
                    kinds::DOLLAR | kinds::AT
                );
            if !accessor_prefixed {
                match tokens[i].kind.as_str() {
                    kinds::SYMBOL => state.pending_name = tokens[i].text.clone(),
                    kinds::CLOSE_BRACKET | kinds::CLOSE_PAREN => {
                        let scan = TargetScan {
                            balance: 0,
                            floor: depth_at(tokens, i),
                        };
                        return scan_target(state, scan, i, tokens);
                    }
                    other => state.errors.push(format!(
                        "unexpected token {other} before assignment at {i}"
                    )),
                }
            }
            return Ok((state, op as isize - i as isize + 1));
        }
    }

    match tokens[i].kind.as_str() {
        kinds::EQ_ASSIGN => state.eq_assign_count += 1,
        kinds::LEFT_ASSIGN => state.left_assign_count += 1,
        _ => return Ok((state, 1)),
    }
    state.pending_name.clear();
    state.op_index = Some(i);
    state.scan = None;
    Ok((state, -1))
}

/// One backward step of the indexed-target scan at token `j`. Resumes at
/// the token after the operator on success or on a soft failure.
fn scan_target(
    mut state: AssignState,
    mut scan: TargetScan,
    j: usize,
    tokens: &TokenList,
) -> StepResult<AssignState> {
    let Some(op) = state.op_index else {
        return Ok((state, 1));
    };
    let resume = op as isize - j as isize + 1;

    if depth_at(tokens, j) < scan.floor {
        state.errors.push(format!(
            "left enclosing expression resolving indexed assignment target at {j}"
        ));
        state.op_index = None;
        return Ok((state, resume));
    }

    match tokens[j].kind.as_str() {
        kinds::CLOSE_BRACKET | kinds::CLOSE_PAREN => scan.balance += 1,
        kinds::OPEN_BRACKET | kinds::OPEN_PAREN | kinds::LBB => {
            // `[[` closes two bracket levels at once.
            let closes = if tokens[j].kind == kinds::LBB { 2 } else { 1 };
            scan.balance = scan.balance.saturating_sub(closes);
            if scan.balance == 0 {
                if j == 0 {
                    state.errors.push(format!(
                        "no base identifier for indexed assignment ending at {op}"
                    ));
                    state.op_index = None;
                    return Ok((state, resume));
                }
                match tokens[j - 1].kind.as_str() {
                    kinds::SYMBOL | kinds::SYMBOL_FUNCTION_CALL => {
                        state.pending_name = tokens[j - 1].text.clone();
                        return Ok((state, resume));
                    }
                    // Chained target like `a[b][c]`: keep balancing the
                    // next bracket group to the left.
                    kinds::CLOSE_BRACKET | kinds::CLOSE_PAREN => {}
                    other => {
                        state.errors.push(format!(
                            "unexpected token {other} trying to resolve indexed assignment at {j}"
                        ));
                        state.op_index = None;
                        return Ok((state, resume));
                    }
                }
            }
        }
        _ => {}
    }

    if j == 0 {
        state.errors.push(format!(
            "ran out of tokens resolving indexed assignment target for operator at {op}"
        ));
        state.op_index = None;
        return Ok((state, resume));
    }
    state.scan = Some(scan);
    Ok((state, -1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_matcher;
    use crate::matchers::paren::{track_parenthesis, TRACK_PARENTHESIS};
    use crate::matchers::testutil::tokens;
    use crate::tokens::kinds::*;

    fn run(list: &mut crate::tokens::TokenList) -> AssignState {
        run_matcher(TRACK_PARENTHESIS, list, track_parenthesis).unwrap();
        run_matcher(MATCH_ASSIGNMENT, list, match_assignment).unwrap();
        list.final_state::<AssignState>(MATCH_ASSIGNMENT).unwrap()
    }

    #[test]
    fn left_assign_to_number() {
        // x <- 1
        let mut list = tokens(&[(SYMBOL, "x"), (LEFT_ASSIGN, "<-"), (NUM_CONST, "1")]);
        let state = run(&mut list);

        assert_eq!(state.variables.len(), 1);
        let v = &state.variables[0];
        assert_eq!(v.name, "x");
        assert_eq!(v.assign_kind, LEFT_ASSIGN);
        assert_eq!(v.rhs_kind, NUM_CONST);
        assert_eq!(state.left_assign_count, 1);
        assert_eq!(state.eq_assign_count, 0);
    }

    #[test]
    fn eq_assign_to_string() {
        // y = "a"
        let mut list = tokens(&[(SYMBOL, "y"), (EQ_ASSIGN, "="), (STR_CONST, "\"a\"")]);
        let state = run(&mut list);

        assert_eq!(state.variables.len(), 1);
        assert_eq!(state.variables[0].name, "y");
        assert_eq!(state.variables[0].assign_kind, EQ_ASSIGN);
        assert_eq!(state.variables[0].rhs_kind, STR_CONST);
        assert_eq!(state.eq_assign_count, 1);
    }

    #[test]
    fn counts_sum_to_total() {
        // a <- 1; b = 2; c <- 3  (the R tokenizer drops the semicolons'
        // neighbors into separate statements; kinds are what matter here)
        let mut list = tokens(&[
            (SYMBOL, "a"),
            (LEFT_ASSIGN, "<-"),
            (NUM_CONST, "1"),
            (SYMBOL, "b"),
            (EQ_ASSIGN, "="),
            (NUM_CONST, "2"),
            (SYMBOL, "c"),
            (LEFT_ASSIGN, "<-"),
            (NUM_CONST, "3"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.variables.len(), 3);
        assert_eq!(
            state.eq_assign_count + state.left_assign_count,
            state.variables.len()
        );
    }

    #[test]
    fn indexed_target_resolves_base_symbol() {
        // x[i] <- 1
        let mut list = tokens(&[
            (SYMBOL, "x"),
            (OPEN_BRACKET, "["),
            (SYMBOL, "i"),
            (CLOSE_BRACKET, "]"),
            (LEFT_ASSIGN, "<-"),
            (NUM_CONST, "1"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.variables.len(), 1);
        assert_eq!(state.variables[0].name, "x");
        assert!(state.errors.is_empty());
    }

    #[test]
    fn attribute_target_resolves_call_symbol() {
        // attr(x, "y") <- TRUE
        let mut list = tokens(&[
            (SYMBOL_FUNCTION_CALL, "attr"),
            (OPEN_PAREN, "("),
            (SYMBOL, "x"),
            (COMMA, ","),
            (STR_CONST, "\"y\""),
            (CLOSE_PAREN, ")"),
            (LEFT_ASSIGN, "<-"),
            (NUM_CONST, "TRUE"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.variables.len(), 1);
        assert_eq!(state.variables[0].name, "attr");
        assert_eq!(state.variables[0].rhs_kind, NUM_CONST);
    }

    #[test]
    fn double_bracket_chain_resolves_leftmost_base() {
        // a[[b]][c] <- 1
        let mut list = tokens(&[
            (SYMBOL, "a"),
            (LBB, "[["),
            (SYMBOL, "b"),
            (CLOSE_BRACKET, "]"),
            (CLOSE_BRACKET, "]"),
            (OPEN_BRACKET, "["),
            (SYMBOL, "c"),
            (CLOSE_BRACKET, "]"),
            (LEFT_ASSIGN, "<-"),
            (NUM_CONST, "1"),
        ]);
        let state = run(&mut list);

        assert_eq!(state.variables.len(), 1);
        assert_eq!(state.variables[0].name, "a");
    }

    #[test]
    fn dollar_target_is_skipped_without_error() {
        // x$field <- 1 : the field symbol is accessor-prefixed, so the
        // assignment is not recorded as a plain variable.
        let mut list = tokens(&[
            (SYMBOL, "x"),
            (DOLLAR, "$"),
            (SYMBOL, "field"),
            (LEFT_ASSIGN, "<-"),
            (NUM_CONST, "1"),
        ]);
        let state = run(&mut list);

        assert!(state.variables.is_empty());
        assert!(state.errors.is_empty());
        assert_eq!(state.left_assign_count, 1);
    }

    #[test]
    fn unrecognized_lhs_is_soft_error() {
        // "lit" <- 1
        let mut list = tokens(&[
            (STR_CONST, "\"lit\""),
            (LEFT_ASSIGN, "<-"),
            (NUM_CONST, "1"),
        ]);
        let state = run(&mut list);

        assert!(state.variables.is_empty());
        assert_eq!(state.errors.len(), 1);
        // The operator is still counted even though the target was not
        // recognized.
        assert_eq!(state.left_assign_count, 1);
    }
}
