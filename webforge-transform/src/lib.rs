//! A small, hand-written jq-like JSON-to-JSON transformation language used
//! by `transform { ... }` pipeline steps.
//!
//! Field paths (`.user.name`), array indices (`.items[-1]`), object/array
//! construction, string concatenation, and a handful of built-in functions
//! (`length`, `default`, `upper`, `lower`, `keys`, `values`, `toString`,
//! `toNumber`). Programs are compiled once and cached by source-text hash.

pub mod ast;
pub mod cache;
pub mod eval;
pub mod parser;
pub mod token;

pub use ast::Expr;
pub use cache::TransformCache;
pub use eval::eval;
pub use parser::parse;

/// Parse and evaluate `source` against `input` in one shot — used for
/// one-off transforms that don't participate in the shared cache.
pub fn run(source: &str, input: &serde_json::Value) -> Result<serde_json::Value, String> {
    let program = parse(source)?;
    eval(&program, input)
}
