//! Parameter structs for every tool. Their JSON schemas (via schemars) are
//! what MCP clients see in `tools/list`.
//!
//! Required values are modelled as `Option` and checked by the handlers, so a
//! missing value produces a `MissingArgument` tool error rather than a
//! protocol-level invalid-params fault.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use crate::config::ProxyToolPatch as BurpSetConfigRequest;

pub const DEFAULT_CHARACTER_SET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn default_version() -> String {
    "professional".to_string()
}

fn default_burp_port() -> u16 {
    9876
}

fn default_scan_type() -> String {
    "passive".to_string()
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_length() -> usize {
    16
}

fn default_character_set() -> String {
    DEFAULT_CHARACTER_SET.to_string()
}

fn default_repeater_tab() -> String {
    "MCP Request".to_string()
}

fn default_intruder_tab() -> String {
    "MCP Intruder".to_string()
}

fn default_count() -> u32 {
    5
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ListKaliToolsRequest {
    /// Filter tools by category (e.g., information-gathering, vulnerability-analysis, web-applications, password-attacks, exploitation)
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RunSecurityToolRequest {
    /// Name of the security tool to run (required, must be on the allow-list)
    pub tool: Option<String>,
    /// Arguments passed to the tool, one argv element each
    pub arguments: Option<Vec<String>>,
    /// Target host, URL or address, inserted before the arguments
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BurpStartRequest {
    /// Burp Suite edition: professional or community
    #[serde(default = "default_version")]
    pub version: String,
    /// Path to a Burp configuration file
    pub config: Option<String>,
    /// Run without a GUI
    #[serde(default)]
    pub headless: bool,
    /// Port recorded for the Burp MCP endpoint
    #[serde(default = "default_burp_port")]
    pub port: u16,
}

impl Default for BurpStartRequest {
    fn default() -> Self {
        Self {
            version: default_version(),
            config: None,
            headless: false,
            port: default_burp_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BurpScanRequest {
    /// Target URL to scan (required)
    pub target: Option<String>,
    /// Path to a scan configuration file
    pub config: Option<String>,
    /// Path for the scan report
    pub output: Option<String>,
    /// URLs to include in scope
    pub scope: Option<Vec<String>>,
    /// Scan type: passive or active
    #[serde(default = "default_scan_type")]
    pub scan_type: String,
}

impl Default for BurpScanRequest {
    fn default() -> Self {
        Self {
            target: None,
            config: None,
            output: None,
            scope: None,
            scan_type: default_scan_type(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Http1Request {
    /// HTTP method
    #[serde(default = "default_method")]
    pub method: String,
    /// Request URL (required)
    pub url: Option<String>,
    /// Request headers
    pub headers: Option<BTreeMap<String, String>>,
    /// Request body
    #[serde(default)]
    pub body: String,
}

impl Default for Http1Request {
    fn default() -> Self {
        Self {
            method: default_method(),
            url: None,
            headers: None,
            body: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Http2Request {
    /// HTTP method
    #[serde(default = "default_method")]
    pub method: String,
    /// Request URL (required)
    pub url: Option<String>,
    /// HTTP/2 pseudo-headers (:method, :scheme, :authority, :path)
    pub pseudo_headers: Option<BTreeMap<String, String>>,
    /// Request headers
    pub headers: Option<BTreeMap<String, String>>,
    /// Request body (do not put headers here)
    #[serde(default)]
    pub body: String,
}

impl Default for Http2Request {
    fn default() -> Self {
        Self {
            method: default_method(),
            url: None,
            pseudo_headers: None,
            headers: None,
            body: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ContentRequest {
    /// Input text (required)
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RandomStringRequest {
    /// Number of characters to generate
    #[serde(default = "default_length")]
    pub length: usize,
    /// Characters to draw from
    #[serde(rename = "characterSet", default = "default_character_set")]
    pub character_set: String,
}

impl Default for RandomStringRequest {
    fn default() -> Self {
        Self {
            length: default_length(),
            character_set: default_character_set(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RepeaterTabRequest {
    /// Raw HTTP request (required)
    pub request: Option<String>,
    /// Repeater tab name
    #[serde(rename = "tabName", default = "default_repeater_tab")]
    pub tab_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IntruderRequest {
    /// Raw HTTP request (required)
    pub request: Option<String>,
    /// Intruder tab name
    #[serde(rename = "tabName", default = "default_intruder_tab")]
    pub tab_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InterceptStateRequest {
    /// true to enable intercept, false to disable (required)
    pub intercepting: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TaskEngineStateRequest {
    /// true to resume the task engine, false to pause it (required)
    pub running: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct OptionsImportRequest {
    /// Options document as a JSON object (required)
    pub json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryRequest {
    /// Number of items to return
    #[serde(default = "default_count")]
    pub count: u32,
    /// Number of items to skip
    #[serde(default)]
    pub offset: u32,
}

impl Default for HistoryRequest {
    fn default() -> Self {
        Self {
            count: default_count(),
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct HistoryRegexRequest {
    /// Regular expression matched against requests and responses (required)
    pub regex: Option<String>,
    /// Number of items to return
    #[serde(default = "default_count")]
    pub count: u32,
    /// Number of items to skip
    #[serde(default)]
    pub offset: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ServerConfigRequest {
    /// Only return this section (proxyTool, eventStream or socketEndpoint)
    pub section: Option<String>,
}
