//! Hand-written tokenizer for the site description language (§4.3).
//!
//! The lexer never halts on malformed input: an unrecognized byte becomes
//! an `Error` token and scanning continues from the next character, so a
//! single typo in one block doesn't prevent the rest of the file from being
//! tokenized (parser-level error recovery then decides what to do with the
//! `Error` tokens it sees).

use crate::token::{lookup_keyword, triggers_raw_block, Token, TokenKind};

/// Quoted string literals longer than this are truncated, not rejected
/// (§4.3: "a triple-quoted literal beyond the cap is truncated, never an
/// error").
const TRIPLE_QUOTE_CAP: usize = 100_000;

pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    bracket_depth: usize,
    _src: std::marker::PhantomData<&'a str>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            bracket_depth: 0,
            _src: std::marker::PhantomData,
        }
    }

    /// Tokenize the whole input, always ending in a single `Eof` token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let line = self.line;
            let Some(c) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, line, ""));
                break;
            };

            let token = match c {
                '{' => self.single(TokenKind::LBrace, "{"),
                '}' => self.single(TokenKind::RBrace, "}"),
                '[' => {
                    self.bracket_depth += 1;
                    self.single(TokenKind::LBracket, "[")
                }
                ']' => {
                    self.bracket_depth = self.bracket_depth.saturating_sub(1);
                    self.single(TokenKind::RBracket, "]")
                }
                '(' => self.single(TokenKind::LParen, "("),
                ')' => self.single(TokenKind::RParen, ")"),
                ',' => self.single(TokenKind::Comma, ","),
                '"' => self.scan_string(),
                '$' => self.scan_env_ref(),
                c if c.is_ascii_digit() || (c == '-' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) => {
                    self.scan_number()
                }
                c if c.is_alphabetic() || c == '_' => self.scan_identifier(),
                other => {
                    self.advance();
                    Token::new(TokenKind::Error(format!("unexpected character '{other}'")), line, other.to_string())
                }
            };

            // A raw-block trigger keyword immediately consumes its `{...}`
            // body as part of this same token slot, so the upcoming `{`
            // must not be re-emitted as a standalone LBrace.
            if let TokenKind::Keyword(kw) = token.kind {
                if triggers_raw_block(kw) {
                    tokens.push(token);
                    if let Some(raw) = self.try_scan_raw_block() {
                        tokens.push(raw);
                    }
                    continue;
                }
            }
            tokens.push(token);
        }
        tokens
    }

    fn single(&mut self, kind: TokenKind, lexeme: &str) -> Token {
        let line = self.line;
        self.advance();
        Token::new(kind, line, lexeme)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    /// After a raw-block-triggering keyword token, look for the opening
    /// `{` (skipping intervening whitespace/comments) and, if found,
    /// capture everything up to the matching `}` as a `RawBlock` token.
    /// If no `{` follows, the keyword is being used bare (no block body)
    /// and no raw-block token is produced.
    fn try_scan_raw_block(&mut self) -> Option<Token> {
        self.skip_trivia();
        if self.peek() != Some('{') {
            return None;
        }
        let line = self.line;
        self.advance(); // consume the opening brace

        let mut depth = 1usize;
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            match c {
                '{' => {
                    depth += 1;
                    raw.push(c);
                    self.advance();
                }
                '}' => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        break;
                    }
                    raw.push(c);
                }
                _ => {
                    raw.push(c);
                    self.advance();
                }
            }
        }

        let trimmed = raw
            .lines()
            .map(str::trim_start)
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = trimmed.trim_matches('\n').to_string();
        Some(Token::new(TokenKind::RawBlock(trimmed), line, raw))
    }

    fn scan_string(&mut self) -> Token {
        let line = self.line;
        self.advance(); // opening quote

        if self.peek() == Some('"') && self.peek_at(1) == Some('"') {
            return self.scan_triple_quoted(line);
        }

        let mut value = String::new();
        while let Some(c) = self.peek() {
            if c == '"' {
                self.advance();
                break;
            }
            if c == '\\' {
                self.advance();
                match self.peek() {
                    Some('n') => {
                        value.push('\n');
                        self.advance();
                    }
                    Some('t') => {
                        value.push('\t');
                        self.advance();
                    }
                    Some('"') => {
                        value.push('"');
                        self.advance();
                    }
                    Some('\\') => {
                        value.push('\\');
                        self.advance();
                    }
                    Some(other) => {
                        value.push(other);
                        self.advance();
                    }
                    None => break,
                }
                continue;
            }
            value.push(c);
            self.advance();
        }
        Token::new(TokenKind::Str(value.clone()), line, value)
    }

    /// `"""..."""` — captured byte-for-byte with no escape processing,
    /// silently truncated at `TRIPLE_QUOTE_CAP` characters (§4.3).
    fn scan_triple_quoted(&mut self, line: usize) -> Token {
        self.advance(); // 2nd quote
        self.advance(); // 3rd quote

        let mut value = String::new();
        loop {
            if self.peek() == Some('"') && self.peek_at(1) == Some('"') && self.peek_at(2) == Some('"') {
                self.advance();
                self.advance();
                self.advance();
                break;
            }
            match self.advance() {
                Some(c) => {
                    if value.chars().count() < TRIPLE_QUOTE_CAP {
                        value.push(c);
                    }
                }
                None => break,
            }
        }
        Token::new(TokenKind::Str(value.clone()), line, value)
    }

    fn scan_env_ref(&mut self) -> Token {
        let line = self.line;
        self.advance(); // '$'
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::EnvRef(name.clone()), line, format!("${name}"))
    }

    fn scan_number(&mut self) -> Token {
        let line = self.line;
        let mut lexeme = String::new();
        if self.peek() == Some('-') {
            lexeme.push('-');
            self.advance();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                lexeme.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
            self.advance();
            self.advance();
            let mut upper = String::new();
            if self.peek() == Some('-') {
                upper.push('-');
                self.advance();
            }
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    upper.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let lo: i64 = lexeme.parse().unwrap_or(0);
            let hi: i64 = upper.parse().unwrap_or(0);
            return Token::new(TokenKind::Range(lo, hi), line, format!("{lexeme}..{upper}"));
        }

        let n: i64 = lexeme.parse().unwrap_or(0);
        Token::new(TokenKind::Num(n), line, lexeme)
    }

    /// Identifiers that match a keyword become `Keyword` tokens, unless
    /// we're inside a bracketed list (`[a, b, c]`), in which case every
    /// identifier is forced to a plain `Str` so field/param names that
    /// happen to collide with keyword spellings (e.g. `method`, `query`)
    /// still work as list elements (§4.3 item 4).
    fn scan_identifier(&mut self) -> Token {
        let line = self.line;
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.advance();
            } else {
                break;
            }
        }

        if self.bracket_depth == 0 {
            if let Some(kw) = lookup_keyword(&word) {
                return Token::new(TokenKind::Keyword(kw), line, word);
            }
        }
        Token::new(TokenKind::Str(word.clone()), line, word)
    }
}

/// Convenience entry point mirroring `Lexer::new(src).tokenize()`.
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Keyword, TokenKind};

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn braces_brackets_and_commas() {
        assert_eq!(
            kinds("{[(,)]}"),
            vec![
                TokenKind::LBrace,
                TokenKind::LBracket,
                TokenKind::LParen,
                TokenKind::Comma,
                TokenKind::RParen,
                TokenKind::RBracket,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_is_recognized() {
        assert_eq!(
            kinds("page"),
            vec![TokenKind::Keyword(Keyword::Page), TokenKind::Eof]
        );
    }

    #[test]
    fn unknown_identifier_becomes_str() {
        assert_eq!(
            kinds("dashboard"),
            vec![TokenKind::Str("dashboard".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn bracketed_list_forces_str_even_for_keyword_spelling() {
        let toks = kinds("[department, method, query]");
        assert_eq!(
            toks,
            vec![
                TokenKind::LBracket,
                TokenKind::Str("department".into()),
                TokenKind::Comma,
                TokenKind::Str("method".into()),
                TokenKind::Comma,
                TokenKind::Str("query".into()),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_range_literal() {
        assert_eq!(kinds("1..65535"), vec![TokenKind::Range(1, 65535), TokenKind::Eof]);
    }

    #[test]
    fn negative_number() {
        assert_eq!(kinds("-42"), vec![TokenKind::Num(-42), TokenKind::Eof]);
    }

    #[test]
    fn env_ref_token() {
        assert_eq!(
            kinds("$DATABASE_URL"),
            vec![TokenKind::EnvRef("DATABASE_URL".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn raw_block_captures_balanced_braces_and_trims_leading_whitespace() {
        let src = "sql {\n    SELECT * FROM users\n    WHERE id = {{id}}\n}";
        let tokens = tokenize(src);
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Sql));
        match &tokens[1].kind {
            TokenKind::RawBlock(body) => {
                assert_eq!(body, "SELECT * FROM users\nWHERE id = {{id}}");
            }
            other => panic!("expected RawBlock, got {other:?}"),
        }
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn raw_block_keyword_with_no_body_emits_no_raw_token() {
        let tokens = tokenize("css");
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Css));
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn triple_quoted_string_preserves_content_verbatim() {
        let src = "\"\"\"line one\nline \\n two\"\"\"";
        let tokens = tokenize(src);
        match &tokens[0].kind {
            TokenKind::Str(s) => assert_eq!(s, "line one\nline \\n two"),
            other => panic!("expected Str, got {other:?}"),
        }
    }

    #[test]
    fn triple_quoted_string_truncates_at_cap() {
        let body = "a".repeat(TRIPLE_QUOTE_CAP + 500);
        let src = format!("\"\"\"{body}\"\"\"");
        let tokens = tokenize(&src);
        match &tokens[0].kind {
            TokenKind::Str(s) => assert_eq!(s.chars().count(), TRIPLE_QUOTE_CAP),
            other => panic!("expected Str, got {other:?}"),
        }
    }

    #[test]
    fn quoted_string_processes_basic_escapes() {
        let tokens = tokenize("\"a\\nb\"");
        match &tokens[0].kind {
            TokenKind::Str(s) => assert_eq!(s, "a\nb"),
            other => panic!("expected Str, got {other:?}"),
        }
    }

    #[test]
    fn unrecognized_character_yields_error_token_and_lexing_continues() {
        let tokens = tokenize("page ~ api");
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Page));
        assert!(matches!(tokens[1].kind, TokenKind::Error(_)));
        assert_eq!(tokens[2].kind, TokenKind::Keyword(Keyword::Api));
    }

    #[test]
    fn line_comment_is_skipped() {
        assert_eq!(
            kinds("page // this is a comment\napi"),
            vec![
                TokenKind::Keyword(Keyword::Page),
                TokenKind::Keyword(Keyword::Api),
                TokenKind::Eof,
            ]
        );
    }
}
