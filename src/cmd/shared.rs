/*!
shared.rs - helpers shared by the `list` and `call` subcommands.

  - schema_type / param_summary: read a property's JSON-schema type
  - parse_params: `--param KEY=VALUE` pairs
  - load_param_file: JSON or YAML object
  - build_arguments: schema-driven coercion of CLI strings into JSON

Tool schemas come from the MCP router (`KaliServer::tool_definitions`), so
`call` coerces arguments exactly as an MCP client would have typed them.
*/

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};

/// Primary JSON type of a schema property.
///
/// Optional fields advertise `"type": ["string", "null"]`; the first non-null
/// entry wins. Missing type is treated as string.
pub fn schema_type(prop: &Value) -> &str {
    match prop.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("string"),
        _ => "string",
    }
}

/// `name:type` pairs for a tool's input schema, sorted by name.
pub fn param_summary(input_schema: &Map<String, Value>) -> Vec<String> {
    input_schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, prop)| format!("{name}:{}", schema_type(prop)))
                .collect()
        })
        .unwrap_or_default()
}

/// Split repeated `KEY=VALUE` arguments. Later keys override earlier ones.
pub fn parse_params(raw: &[String]) -> Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for kv in raw {
        let Some((k, v)) = kv.split_once('=') else {
            bail!("invalid --param (expected KEY=VALUE): {kv}");
        };
        let key = k.trim();
        if key.is_empty() {
            bail!("invalid --param (empty key): {kv}");
        }
        out.insert(key.to_string(), v.to_string());
    }
    Ok(out)
}

/// Load a parameter object from `.json`, `.yaml` or `.yml`. Values keep
/// their JSON types.
pub fn load_param_file(path: &Path) -> Result<Map<String, Value>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read param file: {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

    let value: Value = if is_yaml {
        serde_yaml::from_str(&raw).context("failed to parse YAML param file")?
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON param file")?
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => bail!("param file root must be an object"),
    }
}

/// Merge file values with CLI strings (CLI wins) and coerce the CLI strings
/// using the tool's input schema. Keys unknown to the schema pass through as
/// strings.
pub fn build_arguments(
    input_schema: &Map<String, Value>,
    file_values: Map<String, Value>,
    cli_values: BTreeMap<String, String>,
) -> Map<String, Value> {
    let props = input_schema.get("properties").and_then(Value::as_object);
    let mut args = file_values;
    for (name, raw) in cli_values {
        let value = match props.and_then(|p| p.get(&name)) {
            Some(prop) => coerce_value(&raw, schema_type(prop)),
            None => Value::String(raw),
        };
        args.insert(name, value);
    }
    args
}

/// Coerce a raw string using a JSON-schema type hint. Unparseable input stays
/// a string so the tool reports the type error itself.
pub fn coerce_value(raw: &str, type_hint: &str) -> Value {
    let fallback = || Value::String(raw.to_string());
    match type_hint {
        "integer" => raw
            .trim()
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|_| fallback()),
        "number" => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(fallback),
        "boolean" => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" | "on" => Value::Bool(true),
            "false" | "0" | "no" | "n" | "off" => Value::Bool(false),
            _ => fallback(),
        },
        // A JSON array literal is taken as-is; otherwise split on commas.
        "array" => match serde_json::from_str::<Value>(raw) {
            Ok(v @ Value::Array(_)) => v,
            _ => Value::Array(
                raw.split(',')
                    .map(|s| Value::String(s.trim().to_string()))
                    .filter(|v| v.as_str().is_some_and(|s| !s.is_empty()))
                    .collect(),
            ),
        },
        "object" => match serde_json::from_str::<Value>(raw) {
            Ok(v @ Value::Object(_)) => v,
            _ => fallback(),
        },
        _ => fallback(),
    }
}
