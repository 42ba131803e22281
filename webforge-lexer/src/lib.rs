//! Tokenizer for the Webforge site description language.
//!
//! Scanning never aborts on bad input — see [`lexer::Lexer`] for the
//! error-token recovery rule that keeps the rest of a malformed file
//! tokenizable.

pub mod lexer;
pub mod token;

pub use lexer::{tokenize, Lexer};
pub use token::{Keyword, Token, TokenKind};
