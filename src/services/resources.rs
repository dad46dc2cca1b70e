//! MCP resources: health, metrics, non-secret config, and a generated
//! Markdown manual.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::domain::errors::{ToolError, ToolResult};

use super::tools::{tool_specs, ServerContext};

pub const HEALTH_URI: &str = "aoma://health";
pub const METRICS_URI: &str = "aoma://metrics";
pub const CONFIG_URI: &str = "aoma://config";
pub const DOCS_URI: &str = "aoma://docs";

/// `resources/list` payload entries.
pub fn resource_listing() -> Value {
    json!([
        { "uri": HEALTH_URI, "name": "System health", "mimeType": "application/json", "description": "Aggregated upstream health and metrics" },
        { "uri": METRICS_URI, "name": "Request metrics", "mimeType": "application/json", "description": "Counters, latency average, cache hit rate" },
        { "uri": CONFIG_URI, "name": "Server configuration", "mimeType": "application/json", "description": "Non-secret configuration subset" },
        { "uri": DOCS_URI, "name": "Tool manual", "mimeType": "text/markdown", "description": "Generated manual for every registered tool" },
    ])
}

/// Serves `resources/read` for the `aoma://` scheme.
pub struct ResourceCatalog {
    ctx: Arc<ServerContext>,
}

impl ResourceCatalog {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }

    pub fn list(&self) -> Value {
        json!({ "resources": resource_listing() })
    }

    /// Read a resource into the MCP contents envelope.
    pub async fn read(&self, uri: &str) -> ToolResult<Value> {
        let (mime_type, text) = match uri {
            HEALTH_URI => {
                let status = self.ctx.health.status().await;
                ("application/json", serde_json::to_string_pretty(&status)?)
            }
            METRICS_URI => {
                let snapshot = self.ctx.metrics.snapshot();
                ("application/json", serde_json::to_string_pretty(&snapshot)?)
            }
            CONFIG_URI => ("application/json", serde_json::to_string_pretty(&self.ctx.env.public_view())?),
            DOCS_URI => ("text/markdown", render_manual(&self.ctx.env.version)),
            other => return Err(ToolError::NotFound(format!("unknown resource: {other}"))),
        };
        Ok(json!({
            "contents": [{ "uri": uri, "mimeType": mime_type, "text": text }]
        }))
    }
}

/// Human-oriented Markdown manual enumerating tools and parameters.
/// Consumers must not parse this; the JSON listings are the machine API.
fn render_manual(version: &str) -> String {
    let mut manual = format!(
        "# AOMA Mesh MCP Server\n\nVersion: {version}\n\nRetrieval and analysis tools over the \
         AOMA knowledge corpus.\n\n## Tools\n"
    );
    for spec in tool_specs() {
        manual.push_str(&format!("\n### `{}`\n\n{}\n", spec.name, spec.description));
        if let Some(properties) = spec.schema.get("properties").and_then(Value::as_object) {
            let required: Vec<&str> = spec
                .schema
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            manual.push_str("\nParameters:\n");
            for (name, details) in properties {
                let kind = details.get("type").and_then(Value::as_str).unwrap_or("any");
                let marker = if required.contains(&name.as_str()) { " (required)" } else { "" };
                let description = details.get("description").and_then(Value::as_str).unwrap_or("");
                manual.push_str(&format!("- `{name}` ({kind}){marker} {description}\n"));
            }
        }
    }
    manual.push_str("\n## Resources\n\n");
    if let Some(resources) = resource_listing().as_array() {
        for resource in resources {
            manual.push_str(&format!(
                "- `{}` ({}) — {}\n",
                resource["uri"].as_str().unwrap_or_default(),
                resource["mimeType"].as_str().unwrap_or_default(),
                resource["description"].as_str().unwrap_or_default(),
            ));
        }
    }
    manual
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_lists_every_tool() {
        let manual = render_manual("0.1.0-test");
        for spec in tool_specs() {
            assert!(manual.contains(spec.name), "manual missing {}", spec.name);
        }
        assert!(manual.contains("aoma://docs"));
    }

    #[test]
    fn test_listing_has_four_resources() {
        assert_eq!(resource_listing().as_array().unwrap().len(), 4);
    }
}
