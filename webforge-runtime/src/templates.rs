//! Template rendering (§4.4 "Template blocks produce a Template with kind
//! inferred from the keyword") and the `/styles.css` aggregation endpoint.
//!
//! `mustache` is the only crate in the pack that targets Mustache syntax
//! directly; its public API is built around `rustc_serialize`'s `Encodable`
//! rather than `serde_json`, so [`json_to_mustache_data`] hand-converts a
//! `serde_json::Value` into the crate's `Data` enum once per render.

use mustache::Data;
use serde_json::Value;
use webforge_core::ast::{Site, Template, TemplateKind};

/// Render `template` against `data`. HTML and raw templates are passed
/// through verbatim — only `mustache`-kind templates interpolate.
pub fn render(template: &Template, data: &Value) -> Result<String, String> {
    match template.kind {
        TemplateKind::Html | TemplateKind::Raw => Ok(template.content.clone()),
        TemplateKind::Mustache => render_mustache(&template.content, data),
    }
}

fn render_mustache(source: &str, data: &Value) -> Result<String, String> {
    let compiled = mustache::compile_str(source).map_err(|e| e.to_string())?;
    let mustache_data = json_to_mustache_data(data);
    let mut out = Vec::new();
    compiled.render_data(&mut out, &mustache_data).map_err(|e| e.to_string())?;
    String::from_utf8(out).map_err(|e| e.to_string())
}

fn json_to_mustache_data(value: &Value) -> Data {
    match value {
        Value::Null => Data::Null,
        Value::Bool(b) => Data::Bool(*b),
        Value::Number(n) => Data::String(n.to_string()),
        Value::String(s) => Data::String(s.clone()),
        Value::Array(items) => Data::Vec(items.iter().map(json_to_mustache_data).collect()),
        Value::Object(map) => {
            let mut builder = std::collections::HashMap::new();
            for (key, value) in map {
                builder.insert(key.clone(), json_to_mustache_data(value));
            }
            Data::Map(builder)
        }
    }
}

/// Render a layout's `head`/`body` template around a page's own rendered
/// content. A layout lookup miss is not fatal (§4.5: "resolution may fail
/// at request time (rendered without a layout shell)") — the caller passes
/// `None` and gets the page content back unwrapped.
pub fn wrap_in_layout(body_content: String, head: Option<&Template>, body: Option<&Template>, data: &Value) -> Result<String, String> {
    let head_rendered = match head {
        Some(t) => render(t, data)?,
        None => String::new(),
    };
    let body_rendered = match body {
        Some(t) => {
            let mut merged = data.clone();
            if let Value::Object(map) = &mut merged {
                map.insert("content".to_string(), Value::String(body_content.clone()));
            }
            render(t, &merged)?
        }
        None => body_content,
    };
    Ok(format!("{head_rendered}{body_rendered}"))
}

/// Concatenate every top-level `styles { ... }` block in declaration order,
/// the `/styles.css` built-in route's entire implementation (§4.11 item 3).
pub fn aggregate_styles(site: &Site) -> String {
    site.styles.iter().map(|block| block.content.as_str()).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webforge_core::ast::StyleBlock;

    #[test]
    fn html_template_passes_through_unchanged() {
        let t = Template {
            kind: TemplateKind::Html,
            content: "<p>{{ not interpolated }}</p>".into(),
        };
        assert_eq!(render(&t, &json!({})).unwrap(), "<p>{{ not interpolated }}</p>");
    }

    #[test]
    fn mustache_template_interpolates_fields() {
        let t = Template {
            kind: TemplateKind::Mustache,
            content: "Hello {{name}}".into(),
        };
        assert_eq!(render(&t, &json!({"name": "Ada"})).unwrap(), "Hello Ada");
    }

    #[test]
    fn mustache_template_renders_a_loop() {
        let t = Template {
            kind: TemplateKind::Mustache,
            content: "{{#items}}<li>{{.}}</li>{{/items}}".into(),
        };
        let out = render(&t, &json!({"items": ["a", "b"]})).unwrap();
        assert_eq!(out, "<li>a</li><li>b</li>");
    }

    #[test]
    fn layout_wraps_page_content() {
        let head = Template {
            kind: TemplateKind::Html,
            content: "<head></head>".into(),
        };
        let body = Template {
            kind: TemplateKind::Mustache,
            content: "<body>{{content}}</body>".into(),
        };
        let out = wrap_in_layout("<p>hi</p>".into(), Some(&head), Some(&body), &json!({})).unwrap();
        assert_eq!(out, "<head></head><body><p>hi</p></body>");
    }

    #[test]
    fn missing_layout_returns_content_unwrapped() {
        let out = wrap_in_layout("<p>hi</p>".into(), None, None, &json!({})).unwrap();
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn aggregate_styles_joins_blocks_in_order() {
        let mut site = Site::default();
        site.styles.push(StyleBlock { content: "body { margin: 0; }".into() });
        site.styles.push(StyleBlock { content: "a { color: blue; }".into() });
        assert_eq!(aggregate_styles(&site), "body { margin: 0; }\na { color: blue; }");
    }
}
