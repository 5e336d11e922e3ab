//! NAMESPACE directive scanner.
//!
//! NAMESPACE files are R source restricted to top-level directive calls
//! (`export(...)`, `importFrom(...)`, ...). The file is tokenized through
//! the agent and scanned in one forward pass; a directive commits when its
//! parens close. Unknown directives and malformed runs become recorded
//! parse errors, never aborts.

use std::collections::BTreeMap;

use rscan_matcher::tokens::kinds;
use rscan_matcher::TokenList;

use super::report::{Namespace, NamespaceCall, ParseError};

const NAMESPACE_FILE: &str = "/NAMESPACE";

fn namespace_error(errors: &mut Vec<ParseError>, message: String) {
    errors.push(ParseError {
        stage: "NAMESPACE".to_string(),
        file: NAMESPACE_FILE.to_string(),
        message,
    });
}

pub fn scan_namespace(tokens: &TokenList) -> (Namespace, Vec<ParseError>) {
    let mut namespace = Namespace::default();
    let mut errors = Vec::new();

    let mut args: Vec<String> = Vec::new();
    let mut opts: BTreeMap<String, String> = BTreeMap::new();
    let mut opt_name = String::new();
    let mut paren_depth: i64 = 0;
    let mut directive = String::new();

    let mut ptr = 0;
    while ptr < tokens.len() {
        let token = &tokens[ptr];
        match token.kind.as_str() {
            kinds::SYMBOL_FUNCTION_CALL => {
                if paren_depth != 0 {
                    namespace_error(
                        &mut errors,
                        format!(
                            "unexpected function call at depth {paren_depth}: {}",
                            token.text
                        ),
                    );
                    ptr += 1;
                    continue;
                }
                directive = token.text.clone();
                ptr += 1;
            }
            kinds::COMMA => ptr += 1,
            kinds::OPEN_PAREN => {
                paren_depth += 1;
                ptr += 1;
            }
            kinds::CLOSE_PAREN => {
                paren_depth -= 1;
                ptr += 1;
            }
            kinds::STR_CONST | kinds::SYMBOL | kinds::NUM_CONST => {
                let mut text = token.text.as_str();
                if token.kind == kinds::STR_CONST
                    && (text.starts_with('"') || text.starts_with('\''))
                    && text.len() >= 2
                {
                    text = &text[1..text.len() - 1];
                }
                if opt_name.is_empty() {
                    args.push(text.to_string());
                } else {
                    opts.insert(std::mem::take(&mut opt_name), text.to_string());
                }
                ptr += 1;
            }
            kinds::SYMBOL_SUB => {
                if tokens.kind_at(ptr + 1) != Some(kinds::EQ_SUB) {
                    namespace_error(
                        &mut errors,
                        format!("expected EQ_SUB after option name '{}'", token.text),
                    );
                    ptr += 1;
                } else {
                    opt_name = token.text.clone();
                    ptr += 2;
                }
            }
            other => {
                namespace_error(
                    &mut errors,
                    format!("unexpected token {other} text={:?}", token.text),
                );
                ptr += 1;
            }
        }

        if paren_depth == 0 && !directive.is_empty() && args.len() + opts.len() > 0 {
            commit_directive(&mut namespace, &mut errors, &directive, &args, &opts);
            namespace.calls.push(NamespaceCall {
                name: directive.clone(),
                args: std::mem::take(&mut args),
                opts: std::mem::take(&mut opts),
            });
        }
    }

    (namespace, errors)
}

fn commit_directive(
    namespace: &mut Namespace,
    errors: &mut Vec<ParseError>,
    directive: &str,
    args: &[String],
    _opts: &BTreeMap<String, String>,
) {
    match directive {
        "export" | "exportClasses" | "exportMethods" | "exportPattern" => {
            namespace.exports.extend(args.iter().cloned());
        }
        "import" => {
            namespace.imports.extend(args.iter().cloned());
        }
        "importFrom" | "importClassesFrom" | "importMethodsFrom" => {
            if let Some((pkg, rest)) = args.split_first() {
                namespace
                    .imports
                    .extend(rest.iter().map(|arg| format!("{pkg}::{arg}")));
            }
        }
        "S3method" => {
            if args.len() >= 2 {
                namespace.exports.push(format!("{}.{}", args[0], args[1]));
            } else {
                namespace_error(
                    errors,
                    format!("S3method needs a generic and a class, got {args:?}"),
                );
            }
        }
        "useDynLib" => {}
        other => {
            namespace_error(
                errors,
                format!("unknown top-level directive: {other}"),
            );
        }
    }
}
