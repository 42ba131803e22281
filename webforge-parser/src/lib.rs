//! Recursive-descent parser for the Webforge site description language.
//!
//! Consumes the token stream from `webforge_lexer` and produces a
//! `webforge_core::ast::Site`, resolving `include` statements against the
//! filesystem along the way.

pub mod include;
pub mod parser;

pub use parser::{parse_file, parse_site};
