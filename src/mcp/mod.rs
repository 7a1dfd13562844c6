//! MCP server: tool registration, prompts, server identity.
//!
//! KaliServer { toolbox: Arc<Toolbox>, tool_router }
//! Every tool method forwards to the matching `Toolbox` handler and turns its
//! `Result<String, ToolError>` into a `CallToolResult`; tool failures are
//! error-flagged results, never protocol faults.
//!
//! Arguments that do not match a tool's advertised schema (a string where an
//! integer is declared, a port above 65535) are rejected by rmcp with
//! `invalid_params` before any handler runs. Required string parameters are
//! optional in the schema, so omitting one still reaches the handler and
//! yields a `missing_argument` result.

pub mod http;
pub mod prompts;

use std::sync::Arc;

use rmcp::handler::server::{router::tool::ToolRouter, wrapper::Parameters};
use rmcp::model::{
    CallToolResult, Content, GetPromptRequestParam, GetPromptResult, Implementation,
    ListPromptsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler, tool, tool_handler, tool_router};

use crate::tools::requests::*;
use crate::tools::{ToolError, Toolbox, log_outcome};

pub const SERVER_NAME: &str = "kali-mcp-server";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const INSTRUCTIONS: &str = "Kali Linux and Burp Suite tooling over MCP.\n\
Start with list_kali_tools or list_security_categories to see what is installed, then \
run_security_tool with a tool name, target and arguments.\n\
Burp Suite: burp_health_check, then burp_start / burp_scan. Repeater, Intruder, proxy \
history and scanner issue tools drive a running Burp instance. burp_get_config and \
burp_set_config manage the integration settings.\n\
HTTP: send_http1_request / send_http2_request return {status, headers, body} with bodies \
truncated at 5000 characters.\n\
Encoding helpers: url_encode, url_decode, base64_encode, base64_decode, generate_random_string.\n\
Only test systems you are authorized to test.";

/// Convert a handler outcome into a tool result.
fn respond(tool: &str, outcome: Result<String, ToolError>) -> Result<CallToolResult, McpError> {
    log_outcome(tool, &outcome);
    Ok(match outcome {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
    })
}

#[derive(Clone)]
pub struct KaliServer {
    toolbox: Arc<Toolbox>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl KaliServer {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self {
            toolbox,
            tool_router: Self::tool_router(),
        }
    }

    pub fn toolbox(&self) -> &Arc<Toolbox> {
        &self.toolbox
    }

    #[tool(description = "List security tools installed on this Kali system (dpkg). Optional category filters the package listing.")]
    async fn list_kali_tools(
        &self,
        Parameters(req): Parameters<ListKaliToolsRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("list_kali_tools", self.toolbox.list_kali_tools(req).await)
    }

    #[tool(description = "Run an allow-listed security tool. The target is passed first, then each argument as its own argv element. No shell is involved.")]
    async fn run_security_tool(
        &self,
        Parameters(req): Parameters<RunSecurityToolRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("run_security_tool", self.toolbox.run_security_tool(req).await)
    }

    #[tool(description = "List the security testing categories.")]
    async fn list_security_categories(&self) -> Result<CallToolResult, McpError> {
        respond(
            "list_security_categories",
            self.toolbox.list_security_categories(),
        )
    }

    #[tool(description = "Check whether Burp Suite is installed and on PATH.")]
    async fn burp_health_check(&self) -> Result<CallToolResult, McpError> {
        respond("burp_health_check", self.toolbox.burp_health_check().await)
    }

    #[tool(description = "Start Burp Suite (professional or community) in the background and record its MCP port.")]
    async fn burp_start(
        &self,
        Parameters(req): Parameters<BurpStartRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("burp_start", self.toolbox.burp_start(req))
    }

    #[tool(description = "Run a headless Burp Suite scan against a target URL.")]
    async fn burp_scan(
        &self,
        Parameters(req): Parameters<BurpScanRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("burp_scan", self.toolbox.burp_scan(req).await)
    }

    #[tool(description = "Show the Burp Suite integration settings (proxyTool section).")]
    async fn burp_get_config(&self) -> Result<CallToolResult, McpError> {
        respond("burp_get_config", self.toolbox.burp_get_config())
    }

    #[tool(description = "Update Burp Suite integration settings. Only the given fields change.")]
    async fn burp_set_config(
        &self,
        Parameters(req): Parameters<BurpSetConfigRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("burp_set_config", self.toolbox.burp_set_config(req))
    }

    #[tool(description = "Show the server configuration: proxyTool, eventStream and socketEndpoint, or one named section.")]
    async fn get_server_config(
        &self,
        Parameters(req): Parameters<ServerConfigRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("get_server_config", self.toolbox.get_server_config(req))
    }

    #[tool(description = "Send an HTTP/1.1 request and return status, headers and body (body truncated at 5000 characters).")]
    async fn send_http1_request(
        &self,
        Parameters(req): Parameters<Http1Request>,
    ) -> Result<CallToolResult, McpError> {
        respond("send_http1_request", self.toolbox.send_http1_request(req).await)
    }

    #[tool(description = "Send an HTTP/2 request. Pseudo-headers (:method, :scheme, :authority, :path) override the method and URL; do not put headers in the body.")]
    async fn send_http2_request(
        &self,
        Parameters(req): Parameters<Http2Request>,
    ) -> Result<CallToolResult, McpError> {
        respond("send_http2_request", self.toolbox.send_http2_request(req).await)
    }

    #[tool(description = "URL-encode a string.")]
    async fn url_encode(
        &self,
        Parameters(req): Parameters<ContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("url_encode", self.toolbox.url_encode(req))
    }

    #[tool(description = "URL-decode a string.")]
    async fn url_decode(
        &self,
        Parameters(req): Parameters<ContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("url_decode", self.toolbox.url_decode(req))
    }

    #[tool(description = "Base64-encode a string.")]
    async fn base64_encode(
        &self,
        Parameters(req): Parameters<ContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("base64_encode", self.toolbox.base64_encode(req))
    }

    #[tool(description = "Base64-decode a string.")]
    async fn base64_decode(
        &self,
        Parameters(req): Parameters<ContentRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("base64_decode", self.toolbox.base64_decode(req))
    }

    #[tool(description = "Generate a random string of the given length from a character set.")]
    async fn generate_random_string(
        &self,
        Parameters(req): Parameters<RandomStringRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "generate_random_string",
            self.toolbox.generate_random_string(req),
        )
    }

    #[tool(description = "Create a Burp Repeater tab with a raw HTTP request.")]
    async fn create_repeater_tab(
        &self,
        Parameters(req): Parameters<RepeaterTabRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("create_repeater_tab", self.toolbox.create_repeater_tab(req).await)
    }

    #[tool(description = "Send a raw HTTP request to Burp Intruder.")]
    async fn send_to_intruder(
        &self,
        Parameters(req): Parameters<IntruderRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("send_to_intruder", self.toolbox.send_to_intruder(req).await)
    }

    #[tool(description = "Enable or disable Burp proxy intercept.")]
    async fn set_proxy_intercept_state(
        &self,
        Parameters(req): Parameters<InterceptStateRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "set_proxy_intercept_state",
            self.toolbox.set_proxy_intercept_state(req).await,
        )
    }

    #[tool(description = "Pause or resume the Burp task execution engine.")]
    async fn set_task_execution_engine_state(
        &self,
        Parameters(req): Parameters<TaskEngineStateRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "set_task_execution_engine_state",
            self.toolbox.set_task_execution_engine_state(req).await,
        )
    }

    #[tool(description = "Export Burp project options as JSON.")]
    async fn output_project_options(&self) -> Result<CallToolResult, McpError> {
        respond(
            "output_project_options",
            self.toolbox.output_project_options().await,
        )
    }

    #[tool(description = "Export Burp user options as JSON.")]
    async fn output_user_options(&self) -> Result<CallToolResult, McpError> {
        respond("output_user_options", self.toolbox.output_user_options().await)
    }

    #[tool(description = "Import Burp project options from a JSON object. Requires allowConfigEdit.")]
    async fn set_project_options(
        &self,
        Parameters(req): Parameters<OptionsImportRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("set_project_options", self.toolbox.set_project_options(req).await)
    }

    #[tool(description = "Import Burp user options from a JSON object. Requires allowConfigEdit.")]
    async fn set_user_options(
        &self,
        Parameters(req): Parameters<OptionsImportRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("set_user_options", self.toolbox.set_user_options(req).await)
    }

    #[tool(description = "Page through Burp proxy HTTP history.")]
    async fn get_proxy_http_history(
        &self,
        Parameters(req): Parameters<HistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "get_proxy_http_history",
            self.toolbox.get_proxy_http_history(req).await,
        )
    }

    #[tool(description = "Page through Burp proxy HTTP history entries matching a regex.")]
    async fn get_proxy_http_history_regex(
        &self,
        Parameters(req): Parameters<HistoryRegexRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond(
            "get_proxy_http_history_regex",
            self.toolbox.get_proxy_http_history_regex(req).await,
        )
    }

    #[tool(description = "Page through Burp scanner issues.")]
    async fn get_scanner_issues(
        &self,
        Parameters(req): Parameters<HistoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        respond("get_scanner_issues", self.toolbox.get_scanner_issues(req).await)
    }
}

impl KaliServer {
    /// Registered tools with their input schemas, as `tools/list` reports them.
    pub fn tool_definitions() -> Vec<Tool> {
        Self::tool_router().list_all()
    }
}

#[tool_handler]
impl ServerHandler for KaliServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: VERSION.to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListPromptsResult, McpError>> + Send + '_ {
        std::future::ready(Ok(prompts::list()))
    }

    fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<GetPromptResult, McpError>> + Send + '_ {
        std::future::ready(prompts::get(&request.name, request.arguments.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::tools::CATALOG;

    fn server() -> KaliServer {
        KaliServer::new(Arc::new(Toolbox::new(&AppConfig::default()).unwrap()))
    }

    #[test]
    fn router_registers_exactly_the_catalog() {
        let mut registered: Vec<String> = KaliServer::tool_definitions()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        registered.sort();
        let mut expected: Vec<String> = CATALOG.iter().map(|t| t.name.to_string()).collect();
        expected.sort();
        assert_eq!(registered, expected);
    }

    #[test]
    fn typed_parameters_are_advertised_in_schemas() {
        let tools = KaliServer::tool_definitions();
        let schema_of = |tool: &str, param: &str| {
            let def = tools.iter().find(|t| t.name == tool).unwrap();
            def.input_schema
                .get("properties")
                .and_then(|p| p.get(param))
                .cloned()
                .unwrap()
        };
        assert_eq!(
            crate::cmd::shared::schema_type(&schema_of("burp_start", "port")),
            "integer"
        );
        assert_eq!(
            crate::cmd::shared::schema_type(&schema_of("burp_scan", "target")),
            "string"
        );
    }

    #[test]
    fn info_advertises_identity_and_capabilities() {
        let info = server().get_info();
        assert_eq!(info.server_info.name, SERVER_NAME);
        assert_eq!(info.server_info.version, VERSION);
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.prompts.is_some());
    }

    #[tokio::test]
    async fn tool_failure_is_error_flagged_result() {
        let out = respond("burp_scan", Err(ToolError::missing("target"))).unwrap();
        assert_eq!(out.is_error, Some(true));
        let out = server()
            .url_encode(Parameters(ContentRequest {
                content: Some("a b&c".into()),
            }))
            .await
            .unwrap();
        assert_eq!(out.is_error, Some(false));
        let text = out.content[0].as_text().map(|t| t.text.clone());
        assert_eq!(text.as_deref(), Some("a%20b%26c"));
    }
}
