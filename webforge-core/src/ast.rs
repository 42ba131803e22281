//! The intermediate tree produced by the parser.
//!
//! Per the "linked-list intermediate tree" design note, every list here is
//! an ordinary `Vec` in declaration order, and every node owns its data
//! (`String`, `Vec<T>`, `Option<Box<T>>`) rather than borrowing from an
//! arena. There is no way to construct a dangling reference because there
//! are no borrowed references in the tree at all.

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "PATCH" => Some(HttpMethod::Patch),
            "DELETE" => Some(HttpMethod::Delete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    Mustache,
    Html,
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub kind: TemplateKind,
    pub content: String,
}

/// A `styles { ... }` / `css { ... }` block. Modeled as its own variant
/// instead of reusing the property/value node type for opaque content
/// (the `raw_css` parser-side hack the original carries) — see DESIGN.md's
/// Open Question resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBlock {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Email,
    Url,
    Date,
    Time,
    Phone,
    Uuid,
    Ipv4,
}

impl FieldFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "email" => Some(FieldFormat::Email),
            "url" => Some(FieldFormat::Url),
            "date" => Some(FieldFormat::Date),
            "time" => Some(FieldFormat::Time),
            "phone" => Some(FieldFormat::Phone),
            "uuid" => Some(FieldFormat::Uuid),
            "ipv4" => Some(FieldFormat::Ipv4),
            _ => None,
        }
    }
}

/// A `min..max` (or bare `N`, which lower-bounds at zero — see DESIGN.md)
/// numeric range, reused for both string length (`length`) and numeric
/// value bounds, since the grammar exposes a single range literal form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBound {
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiField {
    pub name: String,
    pub field_type: FieldType,
    pub format: Option<FieldFormat>,
    pub required: bool,
    pub length: Option<RangeBound>,
    pub pattern: Option<String>,
}

impl ApiField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            format: None,
            required: false,
            length: None,
            pattern: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Transform,
    Script,
    StaticSql,
    DynamicSql,
}

/// Where a step's source text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepSource {
    /// Source text written inline in the pipeline (`transform { ... }`).
    Inline(String),
    /// `executeTransform "name"` / `executeScript "name"` / `executeQuery "name"`
    /// — resolved against the route index at execution time.
    Named(String),
    /// Dynamic SQL steps carry no source; the SQL text comes from the
    /// input value (`input.sql`) at execution time.
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineStep {
    pub kind: StepKind,
    pub source: StepSource,
}

impl PipelineStep {
    pub fn inline(kind: StepKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: StepSource::Inline(source.into()),
        }
    }

    pub fn named(kind: StepKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            source: StepSource::Named(name.into()),
        }
    }

    pub fn dynamic_sql() -> Self {
        Self {
            kind: StepKind::DynamicSql,
            source: StepSource::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: String,
    pub route: String,
    pub method: HttpMethod,
    pub layout: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<ApiField>,
    pub pipeline: Vec<PipelineStep>,
    pub reference_data: Vec<PipelineStep>,
    pub template: Option<Template>,
    pub error_block: Option<Template>,
    pub success_block: Option<Template>,
    pub redirect: Option<String>,
}

impl Page {
    pub fn new(id: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            route: route.into(),
            method: HttpMethod::Get,
            layout: None,
            title: None,
            description: None,
            fields: Vec::new(),
            pipeline: Vec::new(),
            reference_data: Vec::new(),
            template: None,
            error_block: None,
            success_block: None,
            redirect: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub id: String,
    pub doctype: Option<String>,
    pub head: Option<Template>,
    pub body: Option<Template>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub route: String,
    pub method: HttpMethod,
    pub fields: Vec<ApiField>,
    pub pipeline: Vec<PipelineStep>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    pub name: String,
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedTransform {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedScript {
    pub name: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partial {
    pub name: String,
    pub template: Template,
}

/// `auth { salt ... github { clientId ... clientSecret ... } }`.
///
/// Parsed and retained so the Site loads without error on a complete DSL
/// source, but the OAuth flow itself is out of scope (§1) — no code
/// consumes this beyond handing the resolved values to whatever
/// session/auth glue the embedding application provides.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthConfig {
    pub salt: Option<Value>,
    pub github_client_id: Option<Value>,
    pub github_client_secret: Option<Value>,
}

/// `email { sendgrid { apiKey ... fromEmail ... fromName ... template "name" { subject ... } } }`.
///
/// Same scoping rationale as `AuthConfig`: parsed and retained, not acted on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmailConfig {
    pub sendgrid_api_key: Option<Value>,
    pub from_email: Option<Value>,
    pub from_name: Option<String>,
    pub templates: Vec<EmailTemplate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub name: String,
    pub subject: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub name: Option<String>,
    pub author: Option<String>,
    pub version: Option<String>,
    pub base_url: Option<String>,
    pub port: Value,
    pub database: Value,
    pub auth: Option<AuthConfig>,
    pub email: Option<EmailConfig>,
    pub pages: Vec<Page>,
    pub layouts: Vec<Layout>,
    pub apis: Vec<ApiEndpoint>,
    pub queries: Vec<NamedQuery>,
    pub transforms: Vec<NamedTransform>,
    pub scripts: Vec<NamedScript>,
    pub partials: Vec<Partial>,
    pub styles: Vec<StyleBlock>,
}

impl Default for Site {
    fn default() -> Self {
        Self {
            name: None,
            author: None,
            version: None,
            base_url: None,
            port: Value::Num(3000),
            database: Value::Null,
            auth: None,
            email: None,
            pages: Vec::new(),
            layouts: Vec::new(),
            apis: Vec::new(),
            queries: Vec::new(),
            transforms: Vec::new(),
            scripts: Vec::new(),
            partials: Vec::new(),
            styles: Vec::new(),
        }
    }
}

impl Site {
    /// Merge another site's top-level lists into this one — used by
    /// `include` resolution (§4.4): includes parse into the same arena and
    /// contribute their lists to the including site, last-registration-wins
    /// is handled later by the route index, not here.
    pub fn merge(&mut self, mut other: Site) {
        self.pages.append(&mut other.pages);
        self.layouts.append(&mut other.layouts);
        self.apis.append(&mut other.apis);
        self.queries.append(&mut other.queries);
        self.transforms.append(&mut other.transforms);
        self.scripts.append(&mut other.scripts);
        self.partials.append(&mut other.partials);
        self.styles.append(&mut other.styles);
    }
}
