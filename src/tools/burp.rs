//! Burp Suite shell delegates.
//!
//! Everything except the health check is refused while the `proxyTool`
//! section is disabled. Option imports additionally need `allowConfigEdit`.

use tracing::info;

use super::requests::{
    BurpScanRequest, BurpStartRequest, HistoryRegexRequest, HistoryRequest, InterceptStateRequest,
    IntruderRequest, OptionsImportRequest, RepeaterTabRequest, TaskEngineStateRequest,
};
use super::{ToolError, Toolbox, require};
use crate::config::ProxyToolPatch;
use crate::process::CommandLine;
use crate::utils::preview;

/// How much of a raw request is echoed back in tab confirmations.
const REQUEST_PREVIEW_CHARS: usize = 500;

/// Which options store an export/import targets.
#[derive(Debug, Clone, Copy)]
enum OptionsScope {
    Project,
    User,
}

impl OptionsScope {
    fn flag(self) -> &'static str {
        match self {
            OptionsScope::Project => "--project-options",
            OptionsScope::User => "--user-options",
        }
    }

    fn label(self) -> &'static str {
        match self {
            OptionsScope::Project => "project",
            OptionsScope::User => "user",
        }
    }
}

impl Toolbox {
    fn burp(&self) -> Result<CommandLine, ToolError> {
        CommandLine::new(self.burp.binary.as_str())
    }

    fn ensure_burp_enabled(&self) -> Result<(), ToolError> {
        if self.config.proxy_tool().enabled {
            Ok(())
        } else {
            Err(ToolError::not_allowed(
                "Burp Suite integration is disabled (proxyTool.enabled = false)",
            ))
        }
    }

    /// Run a Burp command to completion, mapping failure to `"<context>: <stderr>"`.
    async fn run_burp(&self, command: CommandLine, context: &str) -> Result<String, ToolError> {
        let result = self
            .runner
            .run(&command)
            .await?
            .check(&command, context)?;
        Ok(result.stdout)
    }

    pub async fn burp_health_check(&self) -> Result<String, ToolError> {
        let command = CommandLine::new("which")?.arg(self.burp.binary.as_str());
        let result = self.runner.run(&command).await?;
        if !result.success() {
            return Ok("Burp Suite is not installed or not in PATH.".to_string());
        }
        Ok(format!(
            "Burp Suite is installed at: {}",
            result.stdout.trim()
        ))
    }

    pub fn burp_start(&self, req: BurpStartRequest) -> Result<String, ToolError> {
        self.ensure_burp_enabled()?;
        let program = if req.version == "community" {
            self.burp.community_binary.as_str()
        } else {
            self.burp.binary.as_str()
        };
        let command = CommandLine::new(program)?
            .opt_assign("--config-file", req.config.as_deref())
            .flag("--headless", req.headless);

        let pid = self.runner.spawn_detached(&command).map_err(|e| ToolError {
            message: format!("Failed to start Burp Suite: {}", e.message),
            ..e
        })?;
        let proxy = self.config.update_proxy_tool(ProxyToolPatch {
            port: Some(req.port),
            ..Default::default()
        });

        info!(version = %req.version, ?pid, port = req.port, "Burp Suite started");
        Ok(format!(
            "Burp Suite {} started successfully with command: {command}\nMCP server running on http://{}:{}",
            req.version, proxy.host, req.port
        ))
    }

    pub async fn burp_scan(&self, req: BurpScanRequest) -> Result<String, ToolError> {
        let target = require(&req.target, "target")?.trim();
        self.ensure_burp_enabled()?;

        let scope = req
            .scope
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| s.join(","));
        let command = self
            .burp()?
            .arg("--headless")
            .arg(format!("--target={target}"))
            .arg(format!("--scan-type={}", req.scan_type))
            .opt_assign("--config-file", req.config.as_deref())
            .opt_assign("--report-output", req.output.as_deref())
            .opt_assign("--scope-include", scope.as_deref());

        let stdout = self.run_burp(command, "Burp Suite scan failed").await?;
        info!(target, scan_type = %req.scan_type, "Burp Suite scan completed");
        Ok(format!(
            "Burp Suite scan completed successfully. Output:\n{stdout}"
        ))
    }

    pub async fn create_repeater_tab(&self, req: RepeaterTabRequest) -> Result<String, ToolError> {
        let request = require(&req.request, "request")?;
        self.ensure_burp_enabled()?;

        let command = self
            .burp()?
            .arg("--repeater")
            .pair("--request", request)
            .pair("--tab-name", req.tab_name.as_str());
        self.run_burp(command, "Failed to create Repeater tab").await?;

        info!(tab = %req.tab_name, "Repeater tab created");
        Ok(format!(
            "Repeater tab \"{}\" created successfully with request:\n{}...",
            req.tab_name,
            preview(request, REQUEST_PREVIEW_CHARS)
        ))
    }

    pub async fn send_to_intruder(&self, req: IntruderRequest) -> Result<String, ToolError> {
        let request = require(&req.request, "request")?;
        self.ensure_burp_enabled()?;

        let command = self
            .burp()?
            .arg("--intruder")
            .pair("--request", request)
            .pair("--tab-name", req.tab_name.as_str());
        self.run_burp(command, "Failed to send to Intruder").await?;

        info!(tab = %req.tab_name, "request sent to Intruder");
        Ok(format!(
            "Request sent to Intruder tab \"{}\" successfully:\n{}...",
            req.tab_name,
            preview(request, REQUEST_PREVIEW_CHARS)
        ))
    }

    pub async fn set_proxy_intercept_state(
        &self,
        req: InterceptStateRequest,
    ) -> Result<String, ToolError> {
        let intercepting = req
            .intercepting
            .ok_or_else(|| ToolError::missing("intercepting"))?;
        self.ensure_burp_enabled()?;

        let command = self
            .burp()?
            .pair("--proxy-intercept", if intercepting { "enable" } else { "disable" });
        self.run_burp(command, "Failed to set proxy intercept state")
            .await?;

        let state = if intercepting { "enabled" } else { "disabled" };
        info!(state, "proxy intercept updated");
        Ok(format!("Proxy intercept has been {state}"))
    }

    pub async fn set_task_execution_engine_state(
        &self,
        req: TaskEngineStateRequest,
    ) -> Result<String, ToolError> {
        let running = req.running.ok_or_else(|| ToolError::missing("running"))?;
        self.ensure_burp_enabled()?;

        let command = self
            .burp()?
            .pair("--task-engine", if running { "resume" } else { "pause" });
        self.run_burp(command, "Failed to set task execution engine state")
            .await?;

        let state = if running { "running" } else { "paused" };
        info!(state, "task execution engine updated");
        Ok(format!("Task execution engine is now {state}"))
    }

    async fn export_options(&self, scope: OptionsScope) -> Result<String, ToolError> {
        self.ensure_burp_enabled()?;
        let command = self.burp()?.pair(scope.flag(), "export");
        let context = format!("Failed to export {} options", scope.label());
        let stdout = self.run_burp(command, &context).await?;
        info!(scope = scope.label(), "options exported");
        Ok(stdout)
    }

    async fn import_options(
        &self,
        scope: OptionsScope,
        req: OptionsImportRequest,
    ) -> Result<String, ToolError> {
        let json = require(&req.json, "json")?;
        self.ensure_burp_enabled()?;
        if !self.config.proxy_tool().allow_config_edit {
            return Err(ToolError::not_allowed(
                "Editing Burp options is disabled (proxyTool.allowConfigEdit = false)",
            ));
        }
        match serde_json::from_str::<serde_json::Value>(json) {
            Ok(v) if v.is_object() => {}
            Ok(_) => return Err(ToolError::invalid("Options must be a JSON object")),
            Err(e) => return Err(ToolError::invalid(format!("Options are not valid JSON: {e}"))),
        }

        let command = self
            .burp()?
            .pair(scope.flag(), "import")
            .pair("--options-json", json);
        let context = format!("Failed to import {} options", scope.label());
        self.run_burp(command, &context).await?;
        info!(scope = scope.label(), "options imported");
        Ok(format!("Burp Suite {} options updated", scope.label()))
    }

    pub async fn output_project_options(&self) -> Result<String, ToolError> {
        self.export_options(OptionsScope::Project).await
    }

    pub async fn output_user_options(&self) -> Result<String, ToolError> {
        self.export_options(OptionsScope::User).await
    }

    pub async fn set_project_options(&self, req: OptionsImportRequest) -> Result<String, ToolError> {
        self.import_options(OptionsScope::Project, req).await
    }

    pub async fn set_user_options(&self, req: OptionsImportRequest) -> Result<String, ToolError> {
        self.import_options(OptionsScope::User, req).await
    }

    pub async fn get_proxy_http_history(&self, req: HistoryRequest) -> Result<String, ToolError> {
        self.ensure_burp_enabled()?;
        let command = self
            .burp()?
            .arg("--proxy-history")
            .pair("--count", req.count.to_string())
            .pair("--offset", req.offset.to_string());
        self.run_burp(command, "Failed to read proxy history").await
    }

    pub async fn get_proxy_http_history_regex(
        &self,
        req: HistoryRegexRequest,
    ) -> Result<String, ToolError> {
        let regex = require(&req.regex, "regex")?;
        self.ensure_burp_enabled()?;
        let command = self
            .burp()?
            .arg("--proxy-history")
            .pair("--count", req.count.to_string())
            .pair("--offset", req.offset.to_string())
            .pair("--regex", regex);
        self.run_burp(command, "Failed to read proxy history").await
    }

    pub async fn get_scanner_issues(&self, req: HistoryRequest) -> Result<String, ToolError> {
        self.ensure_burp_enabled()?;
        let command = self
            .burp()?
            .arg("--scanner-issues")
            .pair("--count", req.count.to_string())
            .pair("--offset", req.offset.to_string());
        self.run_burp(command, "Failed to read scanner issues").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;
    use crate::tools::testing::toolbox_with;

    // `echo` stands in for the Burp binary so the argv can be observed.

    #[tokio::test]
    async fn health_check_reports_path_or_absence() {
        let tb = toolbox_with(&[], "sh");
        let out = tb.burp_health_check().await.unwrap();
        assert!(out.starts_with("Burp Suite is installed at: /"), "{out}");

        let tb = toolbox_with(&[], "no-such-burp-binary-4711");
        let out = tb.burp_health_check().await.unwrap();
        assert_eq!(out, "Burp Suite is not installed or not in PATH.");
    }

    #[tokio::test]
    async fn scan_builds_flags_in_order() {
        let tb = toolbox_with(&[], "echo");
        let out = tb
            .burp_scan(BurpScanRequest {
                target: Some("https://t.example".into()),
                output: Some("/tmp/r.html".into()),
                scope: Some(vec!["https://a".into(), "https://b".into()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            out,
            "Burp Suite scan completed successfully. Output:\n\
             --headless --target=https://t.example --scan-type=passive \
             --report-output=/tmp/r.html --scope-include=https://a,https://b\n"
        );
    }

    #[tokio::test]
    async fn scan_failure_embeds_command() {
        let tb = toolbox_with(&[], "false");
        let err = tb
            .burp_scan(BurpScanRequest {
                target: Some("https://t.example".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::ProcessFailed);
        assert!(err.message.starts_with("Burp Suite scan failed: "));
        assert_eq!(
            err.command.as_deref(),
            Some("false --headless '--target=https://t.example' '--scan-type=passive'")
        );
    }

    #[tokio::test]
    async fn disabled_section_refuses_burp_tools() {
        let tb = toolbox_with(&[], "echo");
        tb.config().update_proxy_tool(ProxyToolPatch {
            enabled: Some(false),
            ..Default::default()
        });
        let err = tb
            .set_proxy_intercept_state(InterceptStateRequest {
                intercepting: Some(true),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::NotAllowed);
        assert!(tb.burp_start(BurpStartRequest::default()).is_err());
    }

    #[tokio::test]
    async fn start_records_port_and_spawns_detached() {
        let tb = toolbox_with(&[], "true");
        let out = tb
            .burp_start(BurpStartRequest {
                version: "community".into(),
                config: Some("/tmp/burp.json".into()),
                headless: true,
                port: 9999,
            })
            .unwrap();
        assert_eq!(
            out,
            "Burp Suite community started successfully with command: \
             true '--config-file=/tmp/burp.json' --headless\n\
             MCP server running on http://localhost:9999"
        );
        assert_eq!(tb.config().proxy_tool().port, 9999);
    }

    #[tokio::test]
    async fn failed_start_leaves_port_unchanged() {
        let tb = toolbox_with(&[], "no-such-burp-binary-4711");
        let err = tb
            .burp_start(BurpStartRequest {
                port: 9999,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::LaunchFailed);
        assert!(err.message.starts_with("Failed to start Burp Suite: "), "{}", err.message);
        assert_eq!(tb.config().proxy_tool().port, 9876);
    }

    #[tokio::test]
    async fn busy_runner_leaves_port_unchanged() {
        let mut app = crate::config::AppConfig::default();
        app.limits.max_detached = 0;
        app.burp.binary = "true".into();
        let tb = Toolbox::new(&app).unwrap();
        let err = tb
            .burp_start(BurpStartRequest {
                port: 9999,
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::Busy);
        assert_eq!(tb.config().proxy_tool().port, 9876);
    }

    #[tokio::test]
    async fn intercept_and_task_engine_messages() {
        let tb = toolbox_with(&[], "true");
        let out = tb
            .set_proxy_intercept_state(InterceptStateRequest {
                intercepting: Some(false),
            })
            .await
            .unwrap();
        assert_eq!(out, "Proxy intercept has been disabled");
        let out = tb
            .set_task_execution_engine_state(TaskEngineStateRequest {
                running: Some(true),
            })
            .await
            .unwrap();
        assert_eq!(out, "Task execution engine is now running");
    }

    #[tokio::test]
    async fn repeater_tab_previews_request() {
        let tb = toolbox_with(&[], "true");
        let raw = "GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let out = tb
            .create_repeater_tab(RepeaterTabRequest {
                request: Some(raw.into()),
                tab_name: "login".into(),
            })
            .await
            .unwrap();
        assert_eq!(
            out,
            format!("Repeater tab \"login\" created successfully with request:\n{raw}...")
        );
    }

    #[tokio::test]
    async fn option_import_requires_permission_and_object() {
        let tb = toolbox_with(&[], "true");
        let req = || OptionsImportRequest {
            json: Some(r#"{"proxy":{}}"#.into()),
        };
        let err = tb.set_project_options(req()).await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::NotAllowed);

        tb.config().update_proxy_tool(ProxyToolPatch {
            allow_config_edit: Some(true),
            ..Default::default()
        });
        assert_eq!(
            tb.set_user_options(req()).await.unwrap(),
            "Burp Suite user options updated"
        );

        let err = tb
            .set_project_options(OptionsImportRequest {
                json: Some("[1,2]".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn history_queries_pass_paging() {
        let tb = toolbox_with(&[], "echo");
        let out = tb
            .get_proxy_http_history_regex(HistoryRegexRequest {
                regex: Some("admin.*".into()),
                count: 3,
                offset: 6,
            })
            .await
            .unwrap();
        assert_eq!(
            out,
            "--proxy-history --count 3 --offset 6 --regex admin.*\n"
        );
        let out = tb.get_scanner_issues(HistoryRequest::default()).await.unwrap();
        assert_eq!(out, "--scanner-issues --count 5 --offset 0\n");
        let out = tb
            .get_proxy_http_history(HistoryRequest {
                count: 10,
                offset: 20,
            })
            .await
            .unwrap();
        assert_eq!(out, "--proxy-history --count 10 --offset 20\n");
    }

    #[tokio::test]
    async fn option_exports_return_stdout() {
        let tb = toolbox_with(&[], "echo");
        assert_eq!(
            tb.output_project_options().await.unwrap(),
            "--project-options export\n"
        );
        assert_eq!(
            tb.output_user_options().await.unwrap(),
            "--user-options export\n"
        );

        let tb = toolbox_with(&[], "false");
        let err = tb.output_user_options().await.unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::ProcessFailed);
        assert!(err.message.starts_with("Failed to export user options: "));
    }
}
