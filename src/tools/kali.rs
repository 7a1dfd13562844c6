use serde_json::json;
use tracing::info;

use super::requests::{ListKaliToolsRequest, RunSecurityToolRequest};
use super::{ToolError, Toolbox, require, to_pretty_json};
use crate::process::CommandLine;

pub const SECURITY_CATEGORIES: &[&str] = &[
    "information-gathering",
    "vulnerability-scanning",
    "web-application-testing",
    "password-attacks",
    "network-sniffing",
    "wireless-attacks",
    "exploitation",
    "post-exploitation",
    "forensics",
    "reporting",
];

/// Package-name fragments that mark a package as a security tool when no
/// category filter is given.
const TOOL_KEYWORDS: &[&str] = &[
    "kali", "metasploit", "nmap", "burpsuite", "sqlmap", "nikto", "hydra", "john", "aircrack",
    "wireshark", "tcpdump", "netcat", "socat", "gobuster", "dirb", "ffuf", "wpscan", "whatweb",
    "enum4linux", "smbclient", "nbtscan", "rpcclient", "showmount", "snmpwalk", "onesixtyone",
    "ike-scan", "sslscan", "testssl", "nuclei", "subfinder", "amass", "httpx", "dirsearch",
    "wfuzz", "feroxbuster", "rustscan", "masscan", "unicornscan", "zmap", "arp-scan",
    "netdiscover", "fping", "hping3", "scapy", "tcping", "mtr", "traceroute", "dig",
    "nslookup", "host", "whois", "curl", "wget", "git", "svn", "hg",
];

/// Extract installed package names from `dpkg -l` output.
///
/// Only `ii` (installed) rows count. With a category, a row matches when the
/// whole line contains it case-insensitively; without one, the package name
/// must contain a known tool keyword.
pub fn parse_dpkg_listing(listing: &str, category: Option<&str>) -> Vec<String> {
    let category = category.map(str::to_lowercase);
    listing
        .lines()
        .filter(|line| line.starts_with("ii"))
        .filter_map(|line| {
            let name = line.split_whitespace().nth(1)?;
            let keep = match &category {
                Some(cat) => line.to_lowercase().contains(cat.as_str()),
                None => TOOL_KEYWORDS.iter().any(|k| name.contains(k)),
            };
            keep.then(|| name.to_string())
        })
        .collect()
}

impl Toolbox {
    pub async fn list_kali_tools(&self, req: ListKaliToolsRequest) -> Result<String, ToolError> {
        let command = CommandLine::new("dpkg")?.arg("-l");
        let result = self
            .runner
            .run(&command)
            .await?
            .check(&command, "Error listing Kali tools")?;

        let category = req.category.as_deref().filter(|c| !c.trim().is_empty());
        let tools = parse_dpkg_listing(&result.stdout, category);
        info!(count = tools.len(), "listed installed security tools");
        Ok(to_pretty_json(&json!({
            "total": tools.len(),
            "tools": tools,
            "message": format!(
                "Found {} Kali security tools installed on this system.",
                tools.len()
            ),
        })))
    }

    pub async fn run_security_tool(&self, req: RunSecurityToolRequest) -> Result<String, ToolError> {
        let tool = require(&req.tool, "tool")?.trim();
        if tool.contains('/') || tool.contains('\\') || !self.security.is_allowed(tool) {
            return Err(ToolError::not_allowed(format!(
                "Tool '{tool}' is not on the allow-list"
            )));
        }

        let command = CommandLine::new(tool)?
            .opt_arg(req.target.as_deref().map(str::trim))
            .args(req.arguments.unwrap_or_default());
        let result = self
            .runner
            .run(&command)
            .await?
            .check(&command, &format!("Error running tool {tool}"))?;

        info!(tool, "security tool completed");
        Ok(format!(
            "Tool {tool} completed successfully. Output:\n{}",
            result.stdout
        ))
    }

    pub fn list_security_categories(&self) -> Result<String, ToolError> {
        Ok(to_pretty_json(&json!({ "categories": SECURITY_CATEGORIES })))
    }
}
