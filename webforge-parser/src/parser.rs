//! Recursive-descent parser, one token of lookahead, producing a
//! `webforge_core::ast::Site` (§4.4).
//!
//! Unrecognized tokens inside a block set a sticky "had-error" flag for
//! that block and terminate it by skipping forward to the block's
//! balancing `}`, rather than aborting the whole parse — a typo in one
//! page shouldn't take down every other page in the file.

use std::path::{Path, PathBuf};

use webforge_core::ast::*;
use webforge_core::error::ParseError;
use webforge_core::value::Value;
use webforge_lexer::{tokenize, Keyword, Token, TokenKind};

use crate::include::IncludeContext;

const MIN_PORT: i64 = 1;
const MAX_PORT: i64 = 65535;

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
}

/// Parse `source` into a `Site`, resolving any `include` statements
/// relative to `base_dir`. Returns the parsed site (possibly partial, if
/// errors occurred) together with every diagnostic collected.
pub fn parse_site(source: &str, base_dir: &Path) -> (Site, Vec<ParseError>) {
    let mut ctx = IncludeContext::rootless();
    let mut parser = Parser::new(source);
    let site = parser.parse_website(base_dir, &mut ctx);
    (site, parser.errors)
}

/// Parse a file from disk, tracking it on the include stack so that if it
/// is itself later `include`d again a cycle is correctly detected.
pub fn parse_file(path: &Path) -> (Site, Vec<ParseError>) {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            return (
                Site::default(),
                vec![ParseError::new(0, format!("cannot read {}: {e}", path.display()))],
            )
        }
    };
    let mut ctx = IncludeContext::new(path);
    let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let mut parser = Parser::new(&source);
    let site = parser.parse_website(&base_dir, &mut ctx);
    (site, parser.errors)
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            tokens: tokenize(source),
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn kind(&self) -> &TokenKind {
        &self.tokens[self.pos].kind
    }

    fn line(&self) -> usize {
        self.tokens[self.pos].line
    }

    fn is_eof(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check_kw(&self, kw: Keyword) -> bool {
        matches!(self.kind(), TokenKind::Keyword(k) if *k == kw)
    }

    fn eat_kw(&mut self, kw: Keyword) -> bool {
        if self.check_kw(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_lbrace(&self) -> bool {
        matches!(self.kind(), TokenKind::LBrace)
    }

    fn eat_lbrace(&mut self) -> bool {
        if self.check_lbrace() {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_lbrace(&mut self) -> bool {
        if self.eat_lbrace() {
            true
        } else {
            self.error("expected '{'");
            false
        }
    }

    fn check_rbrace(&self) -> bool {
        matches!(self.kind(), TokenKind::RBrace)
    }

    fn eat_rbrace(&mut self) -> bool {
        if self.check_rbrace() {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(ParseError::new(self.line(), message.into()));
    }

    fn take_str(&mut self) -> Option<String> {
        if let TokenKind::Str(s) = self.kind().clone() {
            self.advance();
            Some(s)
        } else {
            None
        }
    }

    fn take_num(&mut self) -> Option<i64> {
        if let TokenKind::Num(n) = *self.kind() {
            self.advance();
            Some(n)
        } else {
            None
        }
    }

    fn take_range(&mut self) -> Option<RangeBound> {
        match *self.kind() {
            TokenKind::Range(lo, hi) => {
                self.advance();
                Some(RangeBound { min: lo, max: hi })
            }
            TokenKind::Num(n) => {
                self.advance();
                Some(RangeBound { min: 0, max: n })
            }
            _ => None,
        }
    }

    fn take_raw(&mut self) -> Option<String> {
        if let TokenKind::RawBlock(s) = self.kind().clone() {
            self.advance();
            Some(s)
        } else {
            None
        }
    }

    fn take_value(&mut self) -> Option<Value> {
        match self.kind().clone() {
            TokenKind::Str(s) => {
                self.advance();
                Some(Value::str(s))
            }
            TokenKind::EnvRef(name) => {
                self.advance();
                Some(Value::env_ref(name))
            }
            TokenKind::Num(n) => {
                self.advance();
                Some(Value::Num(n))
            }
            _ => None,
        }
    }

    /// Recovery: consume tokens until the brace depth returns to the level
    /// it was at when this block started (i.e. past its closing `}`), or
    /// EOF. Used after a block sets its sticky had-error flag.
    fn skip_to_block_end(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                    depth -= 1;
                    self.advance();
                }
                TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ---- top level -------------------------------------------------

    fn parse_website(&mut self, base_dir: &Path, ctx: &mut IncludeContext) -> Site {
        let mut site = Site::default();

        if !self.eat_kw(Keyword::Website) {
            self.error("expected top-level 'website' block");
            return site;
        }
        if !self.expect_lbrace() {
            return site;
        }

        while !self.check_rbrace() && !self.is_eof() {
            self.parse_website_statement(&mut site, base_dir, ctx);
        }
        self.eat_rbrace();
        site
    }

    fn parse_website_statement(&mut self, site: &mut Site, base_dir: &Path, ctx: &mut IncludeContext) {
        let before = self.pos;

        if self.eat_kw(Keyword::Name) {
            site.name = self.take_str();
        } else if self.eat_kw(Keyword::Author) {
            site.author = self.take_str();
        } else if self.eat_kw(Keyword::Version) {
            site.version = self.take_str();
        } else if self.eat_kw(Keyword::BaseUrl) {
            site.base_url = self.take_str();
        } else if self.eat_kw(Keyword::Port) {
            self.parse_port(site);
        } else if self.eat_kw(Keyword::Database) {
            site.database = self.take_value().unwrap_or(Value::Null);
        } else if self.eat_kw(Keyword::Include) {
            self.parse_include(site, base_dir, ctx);
        } else if self.eat_kw(Keyword::Auth) {
            self.parse_auth(site);
        } else if self.eat_kw(Keyword::Email) {
            self.parse_email(site);
        } else if self.check_kw(Keyword::Page) {
            self.advance();
            if let Some(page) = self.parse_page() {
                site.pages.push(page);
            }
        } else if self.eat_kw(Keyword::Pages) {
            if self.expect_lbrace() {
                while self.check_kw(Keyword::Page) {
                    self.advance();
                    if let Some(page) = self.parse_page() {
                        site.pages.push(page);
                    }
                }
                self.eat_rbrace();
            }
        } else if self.check_kw(Keyword::Layout) {
            self.advance();
            if let Some(layout) = self.parse_layout() {
                site.layouts.push(layout);
            }
        } else if self.eat_kw(Keyword::Layouts) {
            if self.expect_lbrace() {
                while self.check_kw(Keyword::Layout) {
                    self.advance();
                    if let Some(layout) = self.parse_layout() {
                        site.layouts.push(layout);
                    }
                }
                self.eat_rbrace();
            }
        } else if self.eat_kw(Keyword::Api) {
            if let Some(api) = self.parse_api() {
                site.apis.push(api);
            }
        } else if self.eat_kw(Keyword::Query) {
            if let Some(q) = self.parse_named_query() {
                site.queries.push(q);
            }
        } else if self.eat_kw(Keyword::Transform) {
            if let Some(t) = self.parse_named_transform() {
                site.transforms.push(t);
            }
        } else if self.eat_kw(Keyword::Script) {
            if let Some(s) = self.parse_named_script() {
                site.scripts.push(s);
            }
        } else if self.eat_kw(Keyword::Partial) {
            if let Some(p) = self.parse_partial() {
                site.partials.push(p);
            }
        } else if self.check_kw(Keyword::Style) {
            self.advance();
            if let Some(style) = self.parse_style_block() {
                site.styles.push(style);
            }
        } else if self.eat_kw(Keyword::Styles) {
            if self.expect_lbrace() {
                while self.check_kw(Keyword::Style) {
                    self.advance();
                    if let Some(style) = self.parse_style_block() {
                        site.styles.push(style);
                    }
                }
                self.eat_rbrace();
            }
        } else {
            self.error(format!("unexpected token {:?} inside website block", self.kind()));
            self.advance();
        }

        // A statement handler that made no progress at all would loop
        // forever; force an advance so the sticky-error recovery always
        // terminates.
        if self.pos == before && !self.is_eof() {
            self.advance();
        }
    }

    fn parse_port(&mut self, site: &mut Site) {
        match self.take_num() {
            Some(n) if (MIN_PORT..=MAX_PORT).contains(&n) => site.port = Value::Num(n),
            Some(n) => self.error(format!("port {n} out of range [1, 65535]")),
            None => self.error("expected integer port number"),
        }
    }

    fn parse_include(&mut self, site: &mut Site, base_dir: &Path, ctx: &mut IncludeContext) {
        let Some(rel) = self.take_str() else {
            self.error("expected include path string");
            return;
        };
        let path = base_dir.join(&rel);

        let canon = match ctx.enter(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(include = %rel, error = %e, "include resolution failed");
                self.error(format!("include \"{rel}\": {e}"));
                return;
            }
        };

        let source = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                ctx.leave(&canon);
                self.error(format!("cannot read included file \"{rel}\": {e}"));
                return;
            }
        };

        let included_base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| base_dir.to_path_buf());
        let mut included_parser = Parser::new(&source);
        let included_site = included_parser.parse_website(&included_base, ctx);
        self.errors.extend(included_parser.errors);
        site.merge(included_site);

        ctx.leave(&canon);
    }

    fn parse_auth(&mut self, site: &mut Site) {
        if !self.expect_lbrace() {
            return;
        }
        let mut auth = AuthConfig::default();
        while !self.check_rbrace() && !self.is_eof() {
            if self.eat_kw(Keyword::Salt) {
                auth.salt = self.take_value();
            } else if self.eat_kw(Keyword::Github) {
                if self.expect_lbrace() {
                    while !self.check_rbrace() && !self.is_eof() {
                        if self.eat_kw(Keyword::ClientId) {
                            auth.github_client_id = self.take_value();
                        } else if self.eat_kw(Keyword::ClientSecret) {
                            auth.github_client_secret = self.take_value();
                        } else {
                            self.error("unexpected token in auth.github block");
                            self.advance();
                        }
                    }
                    self.eat_rbrace();
                }
            } else {
                self.error("unexpected token in auth block");
                self.advance();
            }
        }
        self.eat_rbrace();
        site.auth = Some(auth);
    }

    fn parse_email(&mut self, site: &mut Site) {
        if !self.expect_lbrace() {
            return;
        }
        let mut email = EmailConfig::default();
        while !self.check_rbrace() && !self.is_eof() {
            if self.eat_kw(Keyword::Sendgrid) {
                if self.expect_lbrace() {
                    while !self.check_rbrace() && !self.is_eof() {
                        if self.eat_kw(Keyword::ApiKey) {
                            email.sendgrid_api_key = self.take_value();
                        } else if self.eat_kw(Keyword::FromEmail) {
                            email.from_email = self.take_value();
                        } else if self.eat_kw(Keyword::FromName) {
                            email.from_name = self.take_str();
                        } else if self.eat_kw(Keyword::Template) {
                            if let Some(t) = self.parse_email_template() {
                                email.templates.push(t);
                            }
                        } else {
                            self.error("unexpected token in email.sendgrid block");
                            self.advance();
                        }
                    }
                    self.eat_rbrace();
                }
            } else {
                self.error("unexpected token in email block");
                self.advance();
            }
        }
        self.eat_rbrace();
        site.email = Some(email);
    }

    fn parse_email_template(&mut self) -> Option<EmailTemplate> {
        let name = self.take_str().unwrap_or_default();
        if !self.expect_lbrace() {
            return None;
        }
        let mut subject = None;
        let mut alt = None;
        while !self.check_rbrace() && !self.is_eof() {
            if self.eat_kw(Keyword::Subject) {
                subject = self.take_str();
            } else if self.eat_kw(Keyword::Alt) {
                alt = self.take_str();
            } else {
                self.error("unexpected token in email template block");
                self.advance();
            }
        }
        self.eat_rbrace();
        Some(EmailTemplate { name, subject, alt })
    }

    fn parse_style_block(&mut self) -> Option<StyleBlock> {
        if self.eat_kw(Keyword::Css) {
            let content = self.take_raw().unwrap_or_default();
            Some(StyleBlock { content })
        } else {
            self.error("expected 'css' block inside style");
            self.skip_to_block_end();
            None
        }
    }

    fn parse_template(&mut self) -> Option<Template> {
        if self.eat_kw(Keyword::Html) {
            Some(Template {
                kind: TemplateKind::Html,
                content: self.take_raw().unwrap_or_default(),
            })
        } else if self.eat_kw(Keyword::Mustache) {
            Some(Template {
                kind: TemplateKind::Mustache,
                content: self.take_raw().unwrap_or_default(),
            })
        } else {
            None
        }
    }

    fn parse_layout(&mut self) -> Option<Layout> {
        let id = self.take_str().unwrap_or_default();
        if !self.expect_lbrace() {
            return None;
        }
        let mut layout = Layout {
            id,
            doctype: None,
            head: None,
            body: None,
        };
        while !self.check_rbrace() && !self.is_eof() {
            if let Some(t) = self.parse_template() {
                // First html/mustache block is the body; a dedicated
                // doctype string is supported as a bare field.
                layout.body = Some(t);
            } else if let Some(doctype) = self.take_str() {
                layout.doctype = Some(doctype);
            } else {
                self.error("unexpected token in layout block");
                self.advance();
            }
        }
        self.eat_rbrace();
        Some(layout)
    }

    fn parse_fields(&mut self) -> Vec<ApiField> {
        let mut fields = Vec::new();
        if !self.expect_lbrace() {
            return fields;
        }
        while !self.check_rbrace() && !self.is_eof() {
            let Some(name) = self.take_str() else {
                self.error("expected field name");
                self.advance();
                continue;
            };
            if let Some(field) = self.parse_field_body(name) {
                fields.push(field);
            }
        }
        self.eat_rbrace();
        fields
    }

    fn parse_field_body(&mut self, name: String) -> Option<ApiField> {
        if !self.expect_lbrace() {
            return None;
        }
        let mut field = ApiField::new(name, FieldType::String);
        while !self.check_rbrace() && !self.is_eof() {
            if self.eat_kw(Keyword::Type) {
                match self.take_str().as_deref() {
                    Some("string") => field.field_type = FieldType::String,
                    Some("number") => field.field_type = FieldType::Number,
                    Some(other) => self.error(format!("unknown field type '{other}'")),
                    None => self.error("expected field type string"),
                }
            } else if self.eat_kw(Keyword::Required) {
                match self.take_str().as_deref() {
                    Some("true") => field.required = true,
                    Some("false") => field.required = false,
                    _ => self.error("expected 'true' or 'false' for required"),
                }
            } else if self.eat_kw(Keyword::Format) {
                match self.take_str() {
                    Some(s) => match FieldFormat::parse(&s) {
                        Some(f) => field.format = Some(f),
                        None => self.error(format!("unknown field format '{s}'")),
                    },
                    None => self.error("expected field format string"),
                }
            } else if self.eat_kw(Keyword::Length) {
                field.length = self.take_range();
                if field.length.is_none() {
                    self.error("expected length range");
                }
            } else if self.eat_kw(Keyword::Validate) {
                if self.expect_lbrace() {
                    while !self.check_rbrace() && !self.is_eof() {
                        if self.eat_kw(Keyword::Pattern) {
                            field.pattern = self.take_str();
                        } else {
                            self.error("unexpected token in validate block");
                            self.advance();
                        }
                    }
                    self.eat_rbrace();
                }
            } else {
                self.error("unexpected token in field declaration");
                self.advance();
            }
        }
        self.eat_rbrace();
        Some(field)
    }

    fn parse_pipeline_steps(&mut self) -> Vec<PipelineStep> {
        let mut steps = Vec::new();
        if !self.expect_lbrace() {
            return steps;
        }
        while !self.check_rbrace() && !self.is_eof() {
            if self.eat_kw(Keyword::ExecuteQuery) {
                if let Some(name) = self.take_str() {
                    steps.push(PipelineStep::named(StepKind::StaticSql, name));
                } else {
                    self.error("expected query name string");
                }
            } else if self.eat_kw(Keyword::ExecuteTransform) {
                if let Some(name) = self.take_str() {
                    steps.push(PipelineStep::named(StepKind::Transform, name));
                } else {
                    self.error("expected transform name string");
                }
            } else if self.eat_kw(Keyword::ExecuteScript) {
                if let Some(name) = self.take_str() {
                    steps.push(PipelineStep::named(StepKind::Script, name));
                } else {
                    self.error("expected script name string");
                }
            } else if self.eat_kw(Keyword::Dynamic) {
                if self.eat_kw(Keyword::Sql) {
                    steps.push(PipelineStep::dynamic_sql());
                } else {
                    self.error("expected 'sql' after 'dynamic'");
                }
            } else if self.eat_kw(Keyword::Transform) {
                let source = self.take_raw().unwrap_or_default();
                steps.push(PipelineStep::inline(StepKind::Transform, source));
            } else if self.eat_kw(Keyword::Script) {
                let source = self.take_raw().unwrap_or_default();
                steps.push(PipelineStep::inline(StepKind::Script, source));
            } else if self.eat_kw(Keyword::Sql) {
                let source = self.take_raw().unwrap_or_default();
                steps.push(PipelineStep::inline(StepKind::StaticSql, source));
            } else {
                self.error("unexpected token in pipeline block");
                self.advance();
            }
        }
        self.eat_rbrace();
        steps
    }

    fn parse_page(&mut self) -> Option<Page> {
        let id = self.take_str().unwrap_or_default();
        if !self.expect_lbrace() {
            return None;
        }
        let mut page = Page::new(id, "/");
        while !self.check_rbrace() && !self.is_eof() {
            if self.eat_kw(Keyword::Route) {
                page.route = self.take_str().unwrap_or_else(|| "/".into());
            } else if self.eat_kw(Keyword::Method) {
                match self.take_str().as_deref().and_then(HttpMethod::parse) {
                    Some(m) => page.method = m,
                    None => self.error("unknown or missing HTTP method"),
                }
            } else if self.eat_kw(Keyword::Layout) {
                page.layout = self.take_str();
            } else if self.eat_kw(Keyword::Name) {
                page.title = self.take_str();
            } else if self.eat_kw(Keyword::Fields) {
                page.fields = self.parse_fields();
            } else if self.eat_kw(Keyword::ReferenceData) {
                page.reference_data = self.parse_pipeline_steps();
            } else if self.eat_kw(Keyword::Pipeline) {
                page.pipeline = self.parse_pipeline_steps();
            } else if self.eat_kw(Keyword::Redirect) {
                page.redirect = self.take_str();
            } else if self.eat_kw(Keyword::Error) {
                page.error_block = self.parse_template();
            } else if self.eat_kw(Keyword::Success) {
                page.success_block = self.parse_template();
            } else if let Some(t) = self.parse_template() {
                page.template = Some(t);
            } else {
                self.error("unexpected token in page block");
                self.advance();
            }
        }
        self.eat_rbrace();
        Some(page)
    }

    fn parse_api(&mut self) -> Option<ApiEndpoint> {
        if !self.expect_lbrace() {
            return None;
        }
        let mut route = String::new();
        let mut method = HttpMethod::Get;
        let mut fields = Vec::new();
        let mut pipeline = Vec::new();
        while !self.check_rbrace() && !self.is_eof() {
            if self.eat_kw(Keyword::Route) {
                route = self.take_str().unwrap_or_default();
            } else if self.eat_kw(Keyword::Method) {
                match self.take_str().as_deref().and_then(HttpMethod::parse) {
                    Some(m) => method = m,
                    None => self.error("unknown or missing HTTP method"),
                }
            } else if self.eat_kw(Keyword::Fields) {
                fields = self.parse_fields();
            } else if self.eat_kw(Keyword::Pipeline) {
                pipeline = self.parse_pipeline_steps();
            } else {
                self.error("unexpected token in api block");
                self.advance();
            }
        }
        self.eat_rbrace();
        Some(ApiEndpoint {
            route,
            method,
            fields,
            pipeline,
        })
    }

    fn parse_named_query(&mut self) -> Option<NamedQuery> {
        let name = self.take_str().unwrap_or_default();
        if !self.expect_lbrace() {
            return None;
        }
        let mut sql = String::new();
        let mut params = Vec::new();
        while !self.check_rbrace() && !self.is_eof() {
            if self.eat_kw(Keyword::Sql) {
                sql = self.take_raw().unwrap_or_default();
            } else if self.eat_kw(Keyword::Params) {
                params = self.parse_string_list();
            } else {
                self.error("unexpected token in query block");
                self.advance();
            }
        }
        self.eat_rbrace();
        Some(NamedQuery { name, sql, params })
    }

    fn parse_named_transform(&mut self) -> Option<NamedTransform> {
        let name = self.take_str().unwrap_or_default();
        let source = self.take_raw().unwrap_or_default();
        Some(NamedTransform { name, source })
    }

    fn parse_named_script(&mut self) -> Option<NamedScript> {
        let name = self.take_str().unwrap_or_default();
        let source = self.take_raw().unwrap_or_default();
        Some(NamedScript { name, source })
    }

    fn parse_partial(&mut self) -> Option<Partial> {
        let name = self.take_str().unwrap_or_default();
        if !self.expect_lbrace() {
            return None;
        }
        let template = loop {
            if self.check_rbrace() || self.is_eof() {
                break None;
            }
            if let Some(t) = self.parse_template() {
                break Some(t);
            }
            self.error("expected 'html' or 'mustache' block in partial");
            self.advance();
        };
        self.eat_rbrace();
        template.map(|template| Partial { name, template })
    }

    fn parse_string_list(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        if !matches!(self.kind(), TokenKind::LBracket) {
            self.error("expected '['");
            return out;
        }
        self.advance();
        loop {
            match self.kind().clone() {
                TokenKind::RBracket => {
                    self.advance();
                    break;
                }
                TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::Str(s) => {
                    out.push(s);
                    self.advance();
                }
                TokenKind::Eof => break,
                _ => {
                    self.error("unexpected token in parameter list");
                    self.advance();
                }
            }
        }
        out
    }
}
