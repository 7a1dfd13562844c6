/*!
Tool implementations and the name-based dispatcher.

Every tool is an `async fn` on [`Toolbox`] taking its request struct and
returning `Result<String, ToolError>`. Handlers fall into four behavioral
classes:

  - shell delegate   (`kali.rs`, `burp.rs`): build a `CommandLine`, run it,
                      map the `ProcessResult` to text
  - HTTP delegate    (`http.rs`): one outbound request, JSON summary
  - transform        (`transform.rs`): pure in-process text conversion
  - config accessor  (`settings.rs`): read / patch the `ConfigStore`

The MCP server (`crate::mcp`) calls the typed handlers directly; the `call`
subcommand goes through [`Toolbox::dispatch`], which resolves the tool by
name and deserializes a JSON argument object.
*/

mod burp;
mod error;
mod http;
mod kali;
pub mod requests;
mod settings;
mod transform;

pub use error::{ToolError, ToolErrorKind, require, require_present};
pub use kali::SECURITY_CATEGORIES;

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::config::{AppConfig, BurpBinaries, ConfigStore, Security};
use crate::process::ProcessRunner;
use http::HttpClients;

/// Behavioral class of a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolClass {
    ShellDelegate,
    HttpDelegate,
    Transform,
    ConfigAccessor,
}

impl ToolClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolClass::ShellDelegate => "shell",
            ToolClass::HttpDelegate => "http",
            ToolClass::Transform => "transform",
            ToolClass::ConfigAccessor => "config",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub class: ToolClass,
}

const fn tool(name: &'static str, class: ToolClass) -> ToolDescriptor {
    ToolDescriptor { name, class }
}

/// Every tool the server registers, in listing order.
pub const CATALOG: &[ToolDescriptor] = &[
    tool("list_kali_tools", ToolClass::ShellDelegate),
    tool("run_security_tool", ToolClass::ShellDelegate),
    tool("list_security_categories", ToolClass::Transform),
    tool("burp_health_check", ToolClass::ShellDelegate),
    tool("burp_start", ToolClass::ShellDelegate),
    tool("burp_scan", ToolClass::ShellDelegate),
    tool("burp_get_config", ToolClass::ConfigAccessor),
    tool("burp_set_config", ToolClass::ConfigAccessor),
    tool("get_server_config", ToolClass::ConfigAccessor),
    tool("send_http1_request", ToolClass::HttpDelegate),
    tool("send_http2_request", ToolClass::HttpDelegate),
    tool("url_encode", ToolClass::Transform),
    tool("url_decode", ToolClass::Transform),
    tool("base64_encode", ToolClass::Transform),
    tool("base64_decode", ToolClass::Transform),
    tool("generate_random_string", ToolClass::Transform),
    tool("create_repeater_tab", ToolClass::ShellDelegate),
    tool("send_to_intruder", ToolClass::ShellDelegate),
    tool("set_proxy_intercept_state", ToolClass::ShellDelegate),
    tool("set_task_execution_engine_state", ToolClass::ShellDelegate),
    tool("output_project_options", ToolClass::ShellDelegate),
    tool("output_user_options", ToolClass::ShellDelegate),
    tool("set_project_options", ToolClass::ShellDelegate),
    tool("set_user_options", ToolClass::ShellDelegate),
    tool("get_proxy_http_history", ToolClass::ShellDelegate),
    tool("get_proxy_http_history_regex", ToolClass::ShellDelegate),
    tool("get_scanner_issues", ToolClass::ShellDelegate),
];

/// Case-insensitive catalog lookup.
pub fn lookup(name: &str) -> Option<&'static ToolDescriptor> {
    CATALOG
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}

/// Shared state and collaborators used by the handlers.
#[derive(Debug)]
pub struct Toolbox {
    config: ConfigStore,
    runner: Arc<ProcessRunner>,
    http: HttpClients,
    security: Security,
    burp: BurpBinaries,
}

impl Toolbox {
    pub fn new(app: &AppConfig) -> Result<Self> {
        Ok(Self {
            config: ConfigStore::new(app.server.clone()),
            runner: Arc::new(ProcessRunner::new(app.limits.runner_limits())),
            http: HttpClients::new(app.limits.http_timeout())?,
            security: app.security.clone(),
            burp: app.burp.clone(),
        })
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Resolve `name` in the catalog and invoke it with a JSON argument object.
    pub async fn dispatch(&self, name: &str, args: Map<String, Value>) -> Result<String, ToolError> {
        let descriptor = lookup(name).ok_or_else(|| ToolError::unknown_tool(name))?;
        let name = descriptor.name;
        let outcome = match name {
            "list_kali_tools" => self.list_kali_tools(parse(name, args)?).await,
            "run_security_tool" => self.run_security_tool(parse(name, args)?).await,
            "list_security_categories" => self.list_security_categories(),
            "burp_health_check" => self.burp_health_check().await,
            "burp_start" => self.burp_start(parse(name, args)?),
            "burp_scan" => self.burp_scan(parse(name, args)?).await,
            "burp_get_config" => self.burp_get_config(),
            "burp_set_config" => self.burp_set_config(parse(name, args)?),
            "get_server_config" => self.get_server_config(parse(name, args)?),
            "send_http1_request" => self.send_http1_request(parse(name, args)?).await,
            "send_http2_request" => self.send_http2_request(parse(name, args)?).await,
            "url_encode" => self.url_encode(parse(name, args)?),
            "url_decode" => self.url_decode(parse(name, args)?),
            "base64_encode" => self.base64_encode(parse(name, args)?),
            "base64_decode" => self.base64_decode(parse(name, args)?),
            "generate_random_string" => self.generate_random_string(parse(name, args)?),
            "create_repeater_tab" => self.create_repeater_tab(parse(name, args)?).await,
            "send_to_intruder" => self.send_to_intruder(parse(name, args)?).await,
            "set_proxy_intercept_state" => self.set_proxy_intercept_state(parse(name, args)?).await,
            "set_task_execution_engine_state" => {
                self.set_task_execution_engine_state(parse(name, args)?).await
            }
            "output_project_options" => self.output_project_options().await,
            "output_user_options" => self.output_user_options().await,
            "set_project_options" => self.set_project_options(parse(name, args)?).await,
            "set_user_options" => self.set_user_options(parse(name, args)?).await,
            "get_proxy_http_history" => self.get_proxy_http_history(parse(name, args)?).await,
            "get_proxy_http_history_regex" => {
                self.get_proxy_http_history_regex(parse(name, args)?).await
            }
            "get_scanner_issues" => self.get_scanner_issues(parse(name, args)?).await,
            other => Err(ToolError::unknown_tool(other)),
        };
        log_outcome(name, &outcome);
        outcome
    }
}

fn parse<T: DeserializeOwned>(tool: &str, args: Map<String, Value>) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| ToolError::invalid(format!("Invalid arguments for {tool}: {e}")))
}

/// Failures are logged here once; handlers log their own successes.
pub fn log_outcome(tool: &str, outcome: &Result<String, ToolError>) {
    if let Err(e) = outcome {
        warn!(
            tool,
            kind = e.kind.as_str(),
            command = e.command.as_deref().unwrap_or(""),
            "{}",
            e.message
        );
    }
}

/// Pretty JSON, the response format of the structured tools.
pub(crate) fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}
