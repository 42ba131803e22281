//! Recursive-descent parser for the transform mini-language.

use crate::ast::Expr;
use crate::token::{tokenize, Tok};

pub fn parse(source: &str) -> Result<Expr, String> {
    let tokens = tokenize(source);
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_pipe()?;
    if !matches!(parser.peek(), Tok::Eof) {
        return Err(format!("unexpected trailing token {:?}", parser.peek()));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Tok>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Tok {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Tok {
        let t = self.tokens[self.pos].clone();
        if !matches!(t, Tok::Eof) {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: &Tok) -> Result<(), String> {
        if self.eat(tok) {
            Ok(())
        } else {
            Err(format!("expected {tok:?}, found {:?}", self.peek()))
        }
    }

    fn parse_pipe(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_additive()?;
        while self.eat(&Tok::Pipe) {
            let right = self.parse_additive()?;
            left = Expr::Pipe(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_postfix_path()?;
        while self.eat(&Tok::Plus) {
            let right = self.parse_postfix_path()?;
            left = Expr::Concat(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// A primary expression, followed by zero or more `.field` / `[n]`
    /// suffixes (so `{...}.x` and `length(.a)[0]` both parse, even though
    /// in practice only path expressions chain this way).
    fn parse_postfix_path(&mut self) -> Result<Expr, String> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Tok::Dot => {
                    self.advance();
                    match self.advance() {
                        Tok::Ident(name) => expr = Expr::Field(Box::new(expr), name),
                        other => return Err(format!("expected field name after '.', found {other:?}")),
                    }
                }
                Tok::LBracket => {
                    self.advance();
                    let idx = match self.advance() {
                        Tok::Num(n) => n as i64,
                        other => return Err(format!("expected integer index, found {other:?}")),
                    };
                    self.expect(&Tok::RBracket)?;
                    expr = Expr::Index(Box::new(expr), idx);
                }
                Tok::Question => {
                    // Trailing `?` suppresses errors from the preceding
                    // access; since our field/index access already returns
                    // null rather than erroring on a missing key, it's a
                    // no-op we simply consume for source compatibility.
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Tok::Dot => {
                // `.` alone, or the start of a path handled by the postfix
                // loop in the caller via a synthetic Identity base.
                Ok(Expr::Identity)
            }
            Tok::Str(s) => Ok(Expr::Literal(serde_json::Value::String(s))),
            Tok::Num(n) => Ok(Expr::Literal(json_number(n))),
            Tok::True => Ok(Expr::Literal(serde_json::Value::Bool(true))),
            Tok::False => Ok(Expr::Literal(serde_json::Value::Bool(false))),
            Tok::Null => Ok(Expr::Literal(serde_json::Value::Null)),
            Tok::LBrace => self.parse_object(),
            Tok::LBracket => self.parse_array(),
            Tok::Ident(name) => {
                if self.eat(&Tok::LParen) {
                    let mut args = Vec::new();
                    if !self.eat(&Tok::RParen) {
                        loop {
                            args.push(self.parse_pipe()?);
                            if !self.eat(&Tok::Comma) {
                                break;
                            }
                        }
                        self.expect(&Tok::RParen)?;
                    }
                    Ok(Expr::Call(name, args))
                } else {
                    Err(format!("unexpected bare identifier '{name}'"))
                }
            }
            Tok::LParen => {
                let inner = self.parse_pipe()?;
                self.expect(&Tok::RParen)?;
                Ok(inner)
            }
            other => Err(format!("unexpected token {other:?}")),
        }
    }

    fn parse_object(&mut self) -> Result<Expr, String> {
        let mut pairs = Vec::new();
        if !self.eat(&Tok::RBrace) {
            loop {
                let key = match self.advance() {
                    Tok::Ident(s) | Tok::Str(s) => s,
                    other => return Err(format!("expected object key, found {other:?}")),
                };
                self.expect(&Tok::Colon)?;
                let value = self.parse_pipe()?;
                pairs.push((key, value));
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(&Tok::RBrace)?;
        }
        Ok(Expr::Object(pairs))
    }

    fn parse_array(&mut self) -> Result<Expr, String> {
        let mut items = Vec::new();
        if !self.eat(&Tok::RBracket) {
            loop {
                items.push(self.parse_pipe()?);
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(&Tok::RBracket)?;
        }
        Ok(Expr::Array(items))
    }
}

fn json_number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        serde_json::Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_identity() {
        assert_eq!(parse(".").unwrap(), Expr::Identity);
    }

    #[test]
    fn parses_field_path() {
        let expr = parse(".user.name").unwrap();
        assert_eq!(
            expr,
            Expr::Field(Box::new(Expr::Field(Box::new(Expr::Identity), "user".into())), "name".into())
        );
    }

    #[test]
    fn parses_index() {
        let expr = parse(".items[0]").unwrap();
        assert_eq!(expr, Expr::Index(Box::new(Expr::Field(Box::new(Expr::Identity), "items".into())), 0));
    }

    #[test]
    fn parses_object_literal_with_pipe_and_call() {
        let expr = parse(r#"{ id: .id, total: length(.items) }"#).unwrap();
        match expr {
            Expr::Object(pairs) => assert_eq!(pairs.len(), 2),
            other => panic!("expected Object, got {other:?}"),
        }
    }
}
