//! Token kinds and the fixed keyword table (§3, §6).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::enum_variant_names)]
pub enum Keyword {
    Website,
    Name,
    Author,
    Version,
    BaseUrl,
    Port,
    Database,
    Include,
    Layout,
    Layouts,
    Page,
    Pages,
    Style,
    Styles,
    Css,
    Html,
    Mustache,
    Api,
    Method,
    Route,
    Fields,
    Filter,
    PreFilter,
    Jq,
    Lua,
    Sql,
    Pipeline,
    ExecuteQuery,
    ExecuteTransform,
    ExecuteScript,
    Dynamic,
    Transform,
    Script,
    Partial,
    ReferenceData,
    Redirect,
    Error,
    Success,
    Query,
    Params,
    Auth,
    Salt,
    Github,
    ClientId,
    ClientSecret,
    Email,
    Sendgrid,
    FromEmail,
    FromName,
    ApiKey,
    Template,
    Subject,
    Alt,
    Type,
    Required,
    Format,
    Length,
    Validate,
    Pattern,
}

/// Exact-match lookup against the fixed keyword table. Anything that
/// doesn't match becomes a plain identifier, which the lexer folds into a
/// string token (§4.3: "unknown identifiers become string tokens").
pub fn lookup_keyword(word: &str) -> Option<Keyword> {
    use Keyword::*;
    Some(match word {
        "website" => Website,
        "name" => Name,
        "author" => Author,
        "version" => Version,
        "baseUrl" => BaseUrl,
        "port" => Port,
        "database" => Database,
        "include" => Include,
        "layout" => Layout,
        "layouts" => Layouts,
        "page" => Page,
        "pages" => Pages,
        "style" => Style,
        "styles" => Styles,
        "css" => Css,
        "html" => Html,
        "mustache" => Mustache,
        "api" => Api,
        "method" => Method,
        "route" => Route,
        "fields" => Fields,
        "filter" => Filter,
        "preFilter" => PreFilter,
        "jq" => Jq,
        "lua" => Lua,
        "sql" => Sql,
        "pipeline" => Pipeline,
        "executeQuery" => ExecuteQuery,
        "executeTransform" => ExecuteTransform,
        "executeScript" => ExecuteScript,
        "dynamic" => Dynamic,
        "transform" => Transform,
        "script" => Script,
        "partial" => Partial,
        "referenceData" => ReferenceData,
        "redirect" => Redirect,
        "error" => Error,
        "success" => Success,
        "query" => Query,
        "params" => Params,
        "auth" => Auth,
        "salt" => Salt,
        "github" => Github,
        "clientId" => ClientId,
        "clientSecret" => ClientSecret,
        "email" => Email,
        "sendgrid" => Sendgrid,
        "fromEmail" => FromEmail,
        "fromName" => FromName,
        "apiKey" => ApiKey,
        "template" => Template,
        "subject" => Subject,
        "alt" => Alt,
        "type" => Type,
        "required" => Required,
        "format" => Format,
        "length" => Length,
        "validate" => Validate,
        "pattern" => Pattern,
        _ => return None,
    })
}

/// Keywords that, when immediately followed by `{`, switch the lexer into
/// raw-block capture mode for that brace-delimited span (§4.3 item 1).
pub fn triggers_raw_block(kw: Keyword) -> bool {
    matches!(
        kw,
        Keyword::Html | Keyword::Css | Keyword::Sql | Keyword::Jq | Keyword::Lua | Keyword::Mustache
    )
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    /// A quoted (`"..."` or `"""..."""`) or bare-identifier string.
    Str(String),
    Num(i64),
    /// `N..M`.
    Range(i64, i64),
    /// `$NAME`.
    EnvRef(String),
    Keyword(Keyword),
    /// Verbatim interior of a `keyword { ... }` raw block.
    RawBlock(String),
    Error(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, lexeme: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            lexeme: lexeme.into(),
        }
    }
}
