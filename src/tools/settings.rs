use tracing::info;

use super::requests::{BurpSetConfigRequest, ServerConfigRequest};
use super::{ToolError, Toolbox, to_pretty_json};
use crate::config::Section;

impl Toolbox {
    pub fn burp_get_config(&self) -> Result<String, ToolError> {
        Ok(to_pretty_json(&self.config.get(Section::ProxyTool)))
    }

    pub fn burp_set_config(&self, patch: BurpSetConfigRequest) -> Result<String, ToolError> {
        if matches!(patch.host.as_deref(), Some(h) if h.trim().is_empty()) {
            return Err(ToolError::invalid("host must not be empty"));
        }
        let updated = self.config.update_proxy_tool(patch);
        info!(
            enabled = updated.enabled,
            port = updated.port,
            host = %updated.host,
            "proxyTool section updated"
        );
        Ok(format!(
            "Burp Suite MCP server configuration updated:\n{}",
            to_pretty_json(&updated)
        ))
    }

    /// Whole record, or a single section when one is named.
    pub fn get_server_config(&self, req: ServerConfigRequest) -> Result<String, ToolError> {
        match req.section.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(name) => {
                let section: Section = name.parse().map_err(ToolError::invalid)?;
                Ok(to_pretty_json(&self.config.get(section)))
            }
            None => Ok(to_pretty_json(&self.config.snapshot())),
        }
    }
}
