//! Template engine — parses templates into a small typed AST and renders
//! them against a JSON variable bag.
//!
//! Supported syntax:
//! - `{{name}}` — variable substitution (stringified value)
//! - `{{parent.child}}` — one level of nesting
//! - `{{#each list}} ... {{/each}}` — loop; each element becomes the scope,
//!   `{{this}}` exposes scalar elements
//! - `{{#if field}} ... {{/if}}` — conditional on truthiness
//!
//! Unresolved placeholders render as empty strings, never literal markup.
//! Loops nested inside loop bodies are parsed but not expanded (documented
//! limitation, not a crash).

use serde_json::Value;
use thiserror::Error;

// ────────────────────────────────────────────────────────────────────────────
// AST
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Literal(String),
    /// Variable reference as path segments, e.g. `["parent", "child"]`.
    Var(Vec<String>),
    Loop {
        path: Vec<String>,
        body: Vec<Node>,
    },
    If {
        path: Vec<String>,
        body: Vec<Node>,
    },
}

/// Escaping applied to substituted values (never to literal template text).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    None,
    Html,
}

#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("unterminated tag starting at byte {0}")]
    UnterminatedTag(usize),

    #[error("unclosed block: {{{{#{0}}}}}")]
    UnclosedBlock(String),

    #[error("unexpected closing tag: {{{{/{0}}}}}")]
    UnexpectedClose(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Parsing
// ────────────────────────────────────────────────────────────────────────────

/// Parses a template into its AST.
pub fn parse(input: &str) -> Result<Vec<Node>, TemplateError> {
    let mut pos = 0;
    let nodes = parse_block(input, &mut pos, None)?;
    Ok(nodes)
}

/// Parses nodes until end of input or the expected closing tag.
fn parse_block(
    input: &str,
    pos: &mut usize,
    expect_close: Option<&str>,
) -> Result<Vec<Node>, TemplateError> {
    let mut nodes = Vec::new();

    while *pos < input.len() {
        let rest = &input[*pos..];
        let Some(open) = rest.find("{{") else {
            nodes.push(Node::Literal(rest.to_string()));
            *pos = input.len();
            break;
        };

        if open > 0 {
            nodes.push(Node::Literal(rest[..open].to_string()));
        }

        let tag_start = *pos + open;
        let after_open = &input[tag_start + 2..];
        let Some(close) = after_open.find("}}") else {
            return Err(TemplateError::UnterminatedTag(tag_start));
        };
        let tag = after_open[..close].trim().to_string();
        *pos = tag_start + 2 + close + 2;

        if let Some(block) = tag.strip_prefix('#') {
            let (kind, arg) = block.split_once(' ').unwrap_or((block, ""));
            let path = split_path(arg);
            match kind {
                "each" => {
                    let body = parse_block(input, pos, Some("each"))?;
                    nodes.push(Node::Loop { path, body });
                }
                "if" => {
                    let body = parse_block(input, pos, Some("if"))?;
                    nodes.push(Node::If { path, body });
                }
                // Unknown block kinds degrade to an empty substitution.
                _ => nodes.push(Node::Var(split_path(&tag))),
            }
        } else if let Some(closing) = tag.strip_prefix('/') {
            if expect_close == Some(closing) {
                return Ok(nodes);
            }
            return Err(TemplateError::UnexpectedClose(closing.to_string()));
        } else {
            nodes.push(Node::Var(split_path(&tag)));
        }
    }

    match expect_close {
        Some(kind) => Err(TemplateError::UnclosedBlock(kind.to_string())),
        None => Ok(nodes),
    }
}

fn split_path(raw: &str) -> Vec<String> {
    raw.trim()
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Rendering
// ────────────────────────────────────────────────────────────────────────────

/// Renders parsed nodes against a variable bag.
pub fn render(nodes: &[Node], vars: &Value, escape: Escape) -> String {
    let mut out = String::new();
    render_nodes(nodes, vars, false, escape, &mut out);
    out
}

/// Parses and renders in one step.
pub fn render_str(template: &str, vars: &Value, escape: Escape) -> Result<String, TemplateError> {
    Ok(render(&parse(template)?, vars, escape))
}

fn render_nodes(nodes: &[Node], scope: &Value, in_loop: bool, escape: Escape, out: &mut String) {
    for node in nodes {
        match node {
            Node::Literal(text) => out.push_str(text),
            Node::Var(path) => {
                let value = resolve(scope, path);
                out.push_str(&escaped(&stringify(value), escape));
            }
            Node::Loop { path, body } => {
                // Loops inside loop bodies are not expanded.
                if in_loop {
                    continue;
                }
                if let Some(Value::Array(items)) = resolve(scope, path) {
                    for item in items {
                        render_nodes(body, item, true, escape, out);
                    }
                }
            }
            Node::If { path, body } => {
                if is_truthy(resolve(scope, path)) {
                    render_nodes(body, scope, in_loop, escape, out);
                }
            }
        }
    }
}

/// Resolves a path against the current scope. `this` refers to the scope
/// itself (scalar loop elements).
fn resolve<'a>(scope: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = scope;
    for (i, segment) in path.iter().enumerate() {
        if i == 0 && segment == "this" {
            continue;
        }
        current = current.get(segment)?;
    }
    Some(current)
}

fn stringify(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn escaped(text: &str, escape: Escape) -> String {
    match escape {
        Escape::None => text.to_string(),
        Escape::Html => html_escape(text),
    }
}

/// Escapes the five HTML-significant characters.
pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render_plain(template: &str, vars: &Value) -> String {
        render_str(template, vars, Escape::None).unwrap()
    }

    #[test]
    fn test_simple_substitution() {
        let vars = json!({"name": "Ada"});
        assert_eq!(render_plain("Hello {{name}}!", &vars), "Hello Ada!");
    }

    #[test]
    fn test_nested_path_one_level() {
        let vars = json!({"candidate": {"name": "Ada"}});
        assert_eq!(render_plain("{{candidate.name}}", &vars), "Ada");
    }

    #[test]
    fn test_unresolved_placeholder_is_stripped() {
        let vars = json!({"name": "Ada"});
        assert_eq!(render_plain("x{{missing}}y", &vars), "xy");
    }

    #[test]
    fn test_loop_over_object_elements() {
        let vars = json!({"items": [{"name": "A"}, {"name": "B"}]});
        assert_eq!(
            render_plain("{{#each items}}{{name}}{{/each}}", &vars),
            "AB"
        );
    }

    #[test]
    fn test_loop_over_scalars_with_this() {
        let vars = json!({"tags": ["rust", "tokio"]});
        assert_eq!(
            render_plain("{{#each tags}}{{this}},{{/each}}", &vars),
            "rust,tokio,"
        );
    }

    #[test]
    fn test_loop_over_missing_list_renders_nothing() {
        let vars = json!({});
        assert_eq!(render_plain("a{{#each items}}x{{/each}}b", &vars), "ab");
    }

    #[test]
    fn test_nested_loop_not_expanded() {
        let vars = json!({
            "groups": [{"name": "g1", "members": [{"name": "m1"}]}]
        });
        let out = render_plain(
            "{{#each groups}}{{name}}:{{#each members}}{{name}}{{/each}};{{/each}}",
            &vars,
        );
        // Inner loop is skipped, outer loop still renders.
        assert_eq!(out, "g1:;");
    }

    #[test]
    fn test_if_truthy_and_falsy() {
        let vars = json!({"flag": true, "empty": "", "list": [1]});
        assert_eq!(render_plain("{{#if flag}}yes{{/if}}", &vars), "yes");
        assert_eq!(render_plain("{{#if empty}}yes{{/if}}", &vars), "");
        assert_eq!(render_plain("{{#if missing}}yes{{/if}}", &vars), "");
        assert_eq!(render_plain("{{#if list}}yes{{/if}}", &vars), "yes");
    }

    #[test]
    fn test_number_and_bool_stringified() {
        let vars = json!({"score": 82.5, "ok": true});
        assert_eq!(render_plain("{{score}}/{{ok}}", &vars), "82.5/true");
    }

    #[test]
    fn test_html_escape_applied_to_values_only() {
        let vars = json!({"name": "<b>Ada & co</b>"});
        let out = render_str("<p>{{name}}</p>", &vars, Escape::Html).unwrap();
        assert_eq!(out, "<p>&lt;b&gt;Ada &amp; co&lt;/b&gt;</p>");
    }

    #[test]
    fn test_unclosed_block_is_an_error() {
        let err = parse("{{#each items}}no close").unwrap_err();
        assert_eq!(err, TemplateError::UnclosedBlock("each".to_string()));
    }

    #[test]
    fn test_unexpected_close_is_an_error() {
        let err = parse("{{/each}}").unwrap_err();
        assert_eq!(err, TemplateError::UnexpectedClose("each".to_string()));
    }

    #[test]
    fn test_unterminated_tag_is_an_error() {
        assert!(matches!(
            parse("text {{name").unwrap_err(),
            TemplateError::UnterminatedTag(_)
        ));
    }
}
