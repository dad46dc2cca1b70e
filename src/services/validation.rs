//! Declarative tool-argument validation.
//!
//! Each tool registers a Draft-7 JSON schema; arguments are sanitized
//! (trimmed, clamped to the bounds the schema declares) and then validated,
//! with every violation collected for the client.

use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

use crate::domain::errors::{ToolError, Violation};

/// A tool's compiled argument schema plus the raw document for listings.
pub struct ArgumentSchema {
    raw: Value,
    compiled: JSONSchema,
}

impl ArgumentSchema {
    /// Compile a schema literal. Registration happens at startup, so a
    /// malformed schema is a programmer error surfaced immediately.
    pub fn new(raw: Value) -> Result<Self, ToolError> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&raw)
            .map_err(|e| ToolError::Internal(format!("invalid tool schema: {e}")))?;
        Ok(Self { raw, compiled })
    }

    /// The raw schema document, for `tools/list` and capability listings.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Validate sanitized arguments, collecting every violation.
    pub fn validate(&self, args: &Value) -> Result<(), ToolError> {
        if let Err(errors) = self.compiled.validate(args) {
            let violations: Vec<Violation> = errors
                .map(|e| {
                    let path = e.instance_path.to_string();
                    Violation {
                        path: if path.is_empty() { "/".to_string() } else { path },
                        message: e.to_string(),
                    }
                })
                .collect();
            return Err(ToolError::InvalidParams(violations));
        }
        Ok(())
    }

    /// Sanitize arguments before validation: trim every string, clamp
    /// numbers into the `minimum`/`maximum` bounds the schema declares for
    /// top-level properties. Oversize values are accepted but clamped.
    pub fn sanitize(&self, args: Value) -> Value {
        let mut args = trim_strings(args);
        if let (Some(properties), Some(object)) =
            (self.raw.get("properties").and_then(Value::as_object), args.as_object_mut())
        {
            for (key, value) in object.iter_mut() {
                let Some(bounds) = properties.get(key) else { continue };
                if let Some(number) = value.as_f64() {
                    let min = bounds.get("minimum").and_then(Value::as_f64);
                    let max = bounds.get("maximum").and_then(Value::as_f64);
                    let clamped = number.clamp(min.unwrap_or(f64::MIN), max.unwrap_or(f64::MAX));
                    if (clamped - number).abs() > f64::EPSILON {
                        *value = clamp_to_value(clamped, value);
                    }
                }
            }
        }
        args
    }
}

/// Recursively trim string values.
fn trim_strings(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_string()),
        Value::Array(items) => Value::Array(items.into_iter().map(trim_strings).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, trim_strings(v))).collect()),
        other => other,
    }
}

/// Preserve integer-ness when clamping.
fn clamp_to_value(clamped: f64, original: &Value) -> Value {
    if original.is_i64() || original.is_u64() {
        Value::from(clamped as i64)
    } else {
        serde_json::Number::from_f64(clamped).map(Value::Number).unwrap_or_else(|| original.clone())
    }
}
