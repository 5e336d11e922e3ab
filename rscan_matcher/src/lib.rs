// Internal modules
pub mod analysis;
pub mod engine;
pub mod matchers;
pub mod tokens;

// Re-export key types for library consumers
pub use analysis::{analyze_tokens, FileAnalysis};
pub use engine::{run_matcher, MatchError};
pub use tokens::{Token, TokenList};
