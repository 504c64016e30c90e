//! Declarative route tables.
//!
//! A route table is a TOML file listing patterns with static responses. The
//! `segroute` binary serves and inspects routers built from it.
//!
//! ```toml
//! [not_found]
//! status = 404
//! body = "nothing here"
//!
//! [[route]]
//! method = "GET"
//! pattern = "/users/:id(\\d+)"
//! body = "user {id}"
//!
//! [[route]]
//! method = "ANY"
//! pattern = "/api/*"
//! over = false
//! json = { error = "unavailable", path = "{_1}" }
//! status = 503
//! ```
//!
//! `{name}` in a body is replaced by the field of that name; `{{` and `}}`
//! produce literal braces. Unknown names render as empty text.

use crate::dispatcher::RequestContext;
use crate::filter::{Capability, Filter};
use crate::router::Router;
use crate::server::ResponseSink;
use anyhow::{anyhow, bail, Context, Result};
use http::StatusCode;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// One `[[route]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteEntry {
    pub method: String,
    pub pattern: String,
    #[serde(default = "default_status")]
    pub status: u16,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub json: Option<serde_json::Value>,
    #[serde(default = "default_over")]
    pub over: bool,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// The optional `[not_found]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotFoundEntry {
    #[serde(default = "default_not_found_status")]
    pub status: u16,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// A parsed route table, entries in file order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteTable {
    #[serde(default)]
    pub not_found: Option<NotFoundEntry>,
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteEntry>,
}

fn default_status() -> u16 {
    200
}

fn default_not_found_status() -> u16 {
    404
}

fn default_over() -> bool {
    true
}

impl RouteTable {
    /// Read and parse a route table file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid table.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read route table {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("invalid route table {}", path.display()))
    }

    /// Parse and validate a route table.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML, unknown methods, invalid status
    /// codes, or an entry with both `body` and `json`.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let table: RouteTable = toml::from_str(text).context("failed to parse TOML")?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<()> {
        for (index, entry) in self.routes.iter().enumerate() {
            let position = || format!("route #{} ({} {})", index + 1, entry.method, entry.pattern);
            entry
                .capability()
                .with_context(position)?;
            status_code(entry.status).with_context(position)?;
            if entry.body.is_some() && entry.json.is_some() {
                bail!("{}: set either 'body' or 'json', not both", position());
            }
        }
        if let Some(not_found) = &self.not_found {
            status_code(not_found.status).context("[not_found]")?;
        }
        Ok(())
    }

    /// Register every entry in file order.
    ///
    /// With `strict`, a malformed regex constraint fails the build; otherwise
    /// it is dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid entry, or a malformed constraint when `strict`.
    pub fn build_router(&self, strict: bool) -> Result<Router> {
        let mut router = Router::new();
        for (index, entry) in self.routes.iter().enumerate() {
            let filter = entry.to_filter()?;
            if strict {
                router.try_filter(&entry.pattern, filter).with_context(|| {
                    format!("route #{} ({} {})", index + 1, entry.method, entry.pattern)
                })?;
            } else {
                router.filter(&entry.pattern, filter);
            }
        }
        if let Some(not_found) = &self.not_found {
            let responder = StaticResponse::from_not_found(not_found)?;
            router.set_not_found(move |out| responder.write(None, out));
        }
        info!(
            routes = router.route_count(),
            strict,
            custom_not_found = self.not_found.is_some(),
            "Route table loaded"
        );
        Ok(router)
    }
}

impl RouteEntry {
    /// # Errors
    ///
    /// Returns an error when `method` is not one of the nine methods or `ANY`.
    pub fn capability(&self) -> Result<Capability> {
        self.method.parse::<Capability>().map_err(|e| anyhow!(e))
    }

    fn to_filter(&self) -> Result<Filter> {
        let capability = self.capability()?;
        let response = StaticResponse::from_entry(self)?;
        let over = self.over;
        Ok(Filter::single(capability, move |ctx, out| {
            response.write(Some(ctx), out);
            over
        }))
    }
}

#[derive(Debug)]
enum Body {
    Text(String),
    Json(serde_json::Value),
}

#[derive(Debug)]
struct StaticResponse {
    status: StatusCode,
    content_type: Option<String>,
    body: Body,
}

impl StaticResponse {
    fn from_entry(entry: &RouteEntry) -> Result<Self> {
        let (body, default_type) = match &entry.json {
            Some(value) => (Body::Json(value.clone()), Some("application/json")),
            None => (Body::Text(entry.body.clone().unwrap_or_default()), None),
        };
        Ok(Self {
            status: status_code(entry.status)?,
            content_type: entry
                .content_type
                .clone()
                .or_else(|| default_type.map(str::to_string)),
            body,
        })
    }

    fn from_not_found(entry: &NotFoundEntry) -> Result<Self> {
        let status = status_code(entry.status)?;
        let body = entry
            .body
            .clone()
            .unwrap_or_else(|| status.canonical_reason().unwrap_or_default().to_string());
        Ok(Self {
            status,
            content_type: entry.content_type.clone(),
            body: Body::Text(body),
        })
    }

    fn write(&self, ctx: Option<&RequestContext<'_>>, out: &mut dyn ResponseSink) {
        if let Some(content_type) = &self.content_type {
            out.set_header("Content-Type", content_type);
        }
        let body = match (&self.body, ctx) {
            (Body::Text(text), Some(ctx)) => render_body(text, ctx),
            (Body::Text(text), None) => text.clone(),
            (Body::Json(value), Some(ctx)) => render_json(value, ctx).to_string(),
            (Body::Json(value), None) => value.to_string(),
        };
        out.return_status(self.status, body.as_bytes());
    }
}

/// Render placeholders inside every string of a JSON value.
fn render_json(value: &serde_json::Value, ctx: &RequestContext<'_>) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::String(text) => Value::String(render_body(text, ctx)),
        Value::Array(items) => Value::Array(items.iter().map(|v| render_json(v, ctx)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_json(v, ctx)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn status_code(code: u16) -> Result<StatusCode> {
    StatusCode::from_u16(code).with_context(|| format!("invalid status code {code}"))
}

/// Substitute `{field}` placeholders from the request's field map.
#[must_use]
pub fn render_body(template: &str, ctx: &RequestContext<'_>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        rendered.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") {
            rendered.push('{');
            rest = &tail[2..];
        } else if tail.starts_with("}}") {
            rendered.push('}');
            rest = &tail[2..];
        } else if let Some(end) = tail.strip_prefix('{').and_then(|t| t.find('}')) {
            let name = &tail[1..=end];
            rendered.push_str(ctx.field(name).unwrap_or_default());
            rest = &tail[end + 2..];
        } else {
            rendered.push_str(&tail[..1]);
            rest = &tail[1..];
        }
    }
    rendered.push_str(rest);
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::QueryParams;
    use http::Method;
    use std::collections::HashMap;

    fn ctx_with<'a>(
        method: &'a Method,
        query: &'a QueryParams,
        fields: &[(&str, &str)],
    ) -> RequestContext<'a> {
        RequestContext {
            method,
            uri: "/",
            path: &[],
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect::<HashMap<_, _>>(),
            query,
        }
    }

    #[test]
    fn test_render_body_placeholders() {
        let method = Method::GET;
        let query = QueryParams::new();
        let ctx = ctx_with(&method, &query, &[("id", "42"), ("_1", "x")]);
        assert_eq!(render_body("user {id} at {_1}", &ctx), "user 42 at x");
        assert_eq!(render_body("{missing}!", &ctx), "!");
        assert_eq!(render_body("{{id}} }} {", &ctx), "{id} } {");
        assert_eq!(render_body("plain", &ctx), "plain");
    }

    #[test]
    fn test_render_json_strings_only() {
        let method = Method::GET;
        let query = QueryParams::new();
        let ctx = ctx_with(&method, &query, &[("id", "7")]);
        let value = serde_json::json!({ "id": "{id}", "tags": ["{id}", 1], "n": 2 });
        assert_eq!(
            render_json(&value, &ctx),
            serde_json::json!({ "id": "7", "tags": ["7", 1], "n": 2 })
        );
    }

    #[test]
    fn test_defaults_applied() {
        let table = RouteTable::from_toml_str(
            r#"
            [[route]]
            method = "get"
            pattern = "/hi"
            body = "hello"
            "#,
        )
        .unwrap();
        let entry = &table.routes[0];
        assert_eq!(entry.status, 200);
        assert!(entry.over);
        assert_eq!(entry.capability().unwrap(), Capability::Get);
        assert!(table.not_found.is_none());
    }

    #[test]
    fn test_unknown_method_rejected() {
        let err = RouteTable::from_toml_str(
            r#"
            [[route]]
            method = "FETCH"
            pattern = "/hi"
            "#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("unknown method 'FETCH'"));
    }

    #[test]
    fn test_body_and_json_conflict() {
        let err = RouteTable::from_toml_str(
            r#"
            [[route]]
            method = "GET"
            pattern = "/hi"
            body = "a"
            json = { b = 1 }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("not both"));
    }

    #[test]
    fn test_invalid_status_rejected() {
        assert!(RouteTable::from_toml_str(
            r#"
            [[route]]
            method = "GET"
            pattern = "/hi"
            status = 1000
            "#,
        )
        .is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(RouteTable::from_toml_str(
            r#"
            [[route]]
            method = "GET"
            pattern = "/hi"
            handler = "nope"
            "#,
        )
        .is_err());
    }
}
