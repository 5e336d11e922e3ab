//! Token kind strings emitted by R's `getParseData`.
//!
//! Single-character operators and brackets come back quoted, e.g. the
//! opening parenthesis token has kind `'('` including the single quotes.
//! Only the kinds the matchers dispatch on are named here; unknown kinds
//! pass through the matchers untouched.

pub const SYMBOL: &str = "SYMBOL";
pub const SYMBOL_FUNCTION_CALL: &str = "SYMBOL_FUNCTION_CALL";
pub const SYMBOL_FORMALS: &str = "SYMBOL_FORMALS";
pub const SYMBOL_SUB: &str = "SYMBOL_SUB";
pub const SYMBOL_PACKAGE: &str = "SYMBOL_PACKAGE";

pub const LEFT_ASSIGN: &str = "LEFT_ASSIGN";
pub const EQ_ASSIGN: &str = "EQ_ASSIGN";
pub const EQ_FORMALS: &str = "EQ_FORMALS";
pub const EQ_SUB: &str = "EQ_SUB";

pub const NUM_CONST: &str = "NUM_CONST";
pub const STR_CONST: &str = "STR_CONST";

pub const FUNCTION: &str = "FUNCTION";
pub const NS_GET: &str = "NS_GET";

pub const OPEN_PAREN: &str = "'('";
pub const CLOSE_PAREN: &str = "')'";
pub const OPEN_BRACE: &str = "'{'";
pub const CLOSE_BRACE: &str = "'}'";
pub const OPEN_BRACKET: &str = "'['";
pub const CLOSE_BRACKET: &str = "']'";
/// Double-bracket `[[` comes back as one token.
pub const LBB: &str = "LBB";

pub const COMMA: &str = "','";
pub const DOLLAR: &str = "'$'";
pub const AT: &str = "'@'";

/// Suffix shared by literal-constant kinds (`NUM_CONST`, `STR_CONST`, ...).
pub const CONST_SUFFIX: &str = "_CONST";
