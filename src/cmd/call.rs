/*!
`call.rs`

Implements `kali-mcp-server call <TOOL> [--param KEY=VALUE ...] [--param-file PATH] [--json]`:
run one tool in-process, without an MCP client.

  - Parameters come from `--param` (repeatable) and/or a JSON/YAML file;
    CLI values override file values.
  - CLI strings are coerced with the tool's input schema (integer, boolean,
    array, object), so `--param arguments=-sV,-p,80` becomes a list.
  - A tool error exits non-zero.

JSON success output:
{ "status": "ok", "tool": "...", "elapsed_ms": 12, "arguments": {...}, "output": "..." }

JSON error output:
{ "status": "error", "kind": "process_failed", "error": "...", "command": "..." }
*/

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji};
use crate::cmd::shared::{build_arguments, load_param_file, parse_params};
use crate::config::AppConfig;
use crate::mcp::KaliServer;
use crate::tools::{ToolError, Toolbox};

#[derive(Args, Debug)]
pub struct CallArgs {
    /// Tool name to invoke
    #[arg(value_name = "TOOL")]
    pub tool: String,

    /// Provide parameter (KEY=VALUE), repeatable
    #[arg(long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Load parameters from file (JSON or YAML). CLI --param overrides file entries
    #[arg(long = "param-file", value_name = "PATH")]
    pub param_file: Option<PathBuf>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_call(args: CallArgs, config: &AppConfig) -> Result<()> {
    let (tool, arguments) = match resolve_arguments(&args) {
        Ok(resolved) => resolved,
        Err(e) => return output_error(args.json, &args.tool, None, &e.to_string()),
    };

    let toolbox = Toolbox::new(config)?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let started = Instant::now();
    let outcome = rt.block_on(toolbox.dispatch(&tool, arguments.clone()));
    let elapsed_ms = started.elapsed().as_millis();

    if toolbox.runner().detached_count() > 0 {
        warn!("background processes started by this call are stopped when the command exits");
    }
    toolbox.runner().shutdown();

    match outcome {
        Ok(output) => {
            output_success(args.json, &tool, elapsed_ms, &arguments, &output);
            Ok(())
        }
        Err(e) => output_error(args.json, &tool, Some(&e), &e.to_string()),
    }
}

/// Canonical tool name plus the JSON argument object.
fn resolve_arguments(args: &CallArgs) -> Result<(String, Map<String, Value>)> {
    let name = args.tool.trim();
    let tool = KaliServer::tool_definitions()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| ToolError::unknown_tool(name))?;

    let file_values = match &args.param_file {
        Some(path) => load_param_file(path)?,
        None => Map::new(),
    };
    let cli_values = parse_params(&args.params)?;
    let arguments = build_arguments(&tool.input_schema, file_values, cli_values);
    Ok((tool.name.to_string(), arguments))
}

fn output_success(
    json: bool,
    tool: &str,
    elapsed_ms: u128,
    arguments: &Map<String, Value>,
    output: &str,
) {
    if json {
        let out = json!({
            "status": "ok",
            "tool": tool,
            "elapsed_ms": elapsed_ms,
            "arguments": arguments,
            "output": output,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string())
        );
        return;
    }

    let style = StyleOptions::detect();
    let title = format!("{} {tool}", emoji("success", &style));
    let subtitle = format!("{elapsed_ms} ms");
    println!("{}", box_header(title.trim(), Some(&subtitle), &style));
    println!("{output}");
}

fn output_error(json: bool, tool: &str, err: Option<&ToolError>, msg: &str) -> Result<()> {
    if json {
        let out = match err {
            Some(e) => e.to_json(),
            None => json!({"status": "error", "error": msg}),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&out).unwrap_or_else(|_| out.to_string())
        );
    } else {
        let style = StyleOptions::detect();
        let title = format!("{} {tool} failed", emoji("error", &style));
        println!("{}", box_header(title.trim(), None, &style));
        println!("{}", color(Role::Error, msg, &style));
    }
    anyhow::bail!("{tool}: {}", msg.lines().next().unwrap_or(msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn call_args(tool: &str, params: &[&str]) -> CallArgs {
        CallArgs {
            tool: tool.to_string(),
            params: params.iter().map(|s| s.to_string()).collect(),
            param_file: None,
            json: true,
        }
    }

    #[test]
    fn resolves_case_insensitive_name_and_coerces() {
        let (name, args) = resolve_arguments(&call_args(
            "Generate_Random_String",
            &["length=4", "characterSet=ab"],
        ))
        .unwrap();
        assert_eq!(name, "generate_random_string");
        assert_eq!(args["length"], json!(4));
        assert_eq!(args["characterSet"], json!("ab"));
    }

    #[test]
    fn array_parameters_split_on_commas() {
        let (_, args) = resolve_arguments(&call_args(
            "run_security_tool",
            &["tool=nmap", "arguments=-sV,-p,80"],
        ))
        .unwrap();
        assert_eq!(args["arguments"], json!(["-sV", "-p", "80"]));
    }

    #[test]
    fn param_file_is_merged_under_cli_values() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"content": "from file", "extra": 1}}"#).unwrap();
        let mut args = call_args("url_encode", &["content=a b"]);
        args.param_file = Some(file.path().to_path_buf());
        let (_, resolved) = resolve_arguments(&args).unwrap();
        assert_eq!(resolved["content"], json!("a b"));
        assert_eq!(resolved["extra"], json!(1));
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let err = resolve_arguments(&call_args("rm_rf", &[])).unwrap_err();
        assert!(err.to_string().contains("Unknown tool: rm_rf"));
    }

    #[test]
    fn execute_reports_tool_errors_as_failure() {
        let config = AppConfig::default();
        assert!(execute_call(call_args("url_encode", &["content=a b"]), &config).is_ok());
        assert!(execute_call(call_args("base64_decode", &["content=%%%"]), &config).is_err());
    }
}
