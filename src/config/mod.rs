//! Application configuration (YAML file with full defaults).
//!
//! load_config(path?) -> AppConfig { server, limits, security, burp }
//! `server` seeds the in-memory `ConfigStore`; nothing is written back.

mod store;

pub use store::{ConfigStore, ProxyToolPatch, Section, ServerConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::process::RunnerLimits;

/// Environment fallback when `--config` is not given.
pub const CONFIG_ENV: &str = "KALI_MCP_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub limits: Limits,
    pub security: Security,
    pub burp: BurpBinaries,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    pub process_timeout_secs: u64,
    pub http_timeout_secs: u64,
    pub max_detached: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            process_timeout_secs: 300,
            http_timeout_secs: 60,
            max_detached: 4,
        }
    }
}

impl Limits {
    pub fn runner_limits(&self) -> RunnerLimits {
        RunnerLimits {
            timeout: Duration::from_secs(self.process_timeout_secs.max(1)),
            max_detached: self.max_detached,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.max(1))
    }
}

/// Programs `run_security_tool` may launch by default.
pub const DEFAULT_ALLOWED_TOOLS: &[&str] = &[
    "nmap", "sqlmap", "nikto", "hydra", "john", "aircrack-ng", "tcpdump", "tshark", "netcat",
    "nc", "socat", "gobuster", "dirb", "ffuf", "wpscan", "whatweb", "enum4linux", "smbclient",
    "nbtscan", "rpcclient", "showmount", "snmpwalk", "onesixtyone", "ike-scan", "sslscan",
    "testssl.sh", "nuclei", "subfinder", "amass", "httpx", "dirsearch", "wfuzz",
    "feroxbuster", "rustscan", "masscan", "unicornscan", "zmap", "arp-scan", "netdiscover",
    "fping", "hping3", "tcping", "mtr", "traceroute", "dig", "nslookup", "host", "whois",
    "curl", "wget",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub allowed_tools: Vec<String>,
}

impl Default for Security {
    fn default() -> Self {
        Self {
            allowed_tools: DEFAULT_ALLOWED_TOOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Security {
    pub fn is_allowed(&self, program: &str) -> bool {
        self.allowed_tools.iter().any(|t| t == program)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurpBinaries {
    pub binary: String,
    pub community_binary: String,
}

impl Default for BurpBinaries {
    fn default() -> Self {
        Self {
            binary: "burpsuite".to_string(),
            community_binary: "burpsuite-community".to_string(),
        }
    }
}

/// Load configuration from `path`, or return defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Parse YAML (JSON is valid YAML). An empty document yields defaults.
pub fn parse_config(raw: &str) -> Result<AppConfig> {
    if raw.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    Ok(serde_yaml::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn no_path_means_defaults() {
        let cfg = load_config(None).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(cfg.security.is_allowed("nmap"));
        assert!(!cfg.security.is_allowed("bash"));
    }

    #[test]
    fn partial_yaml_overrides_only_given_fields() {
        let cfg = parse_config(
            r#"
server:
  proxyTool:
    port: 1337
    allowConfigEdit: true
limits:
  max_detached: 1
security:
  allowed_tools: [sh]
"#,
        )
        .unwrap();
        assert_eq!(cfg.server.proxy_tool.port, 1337);
        assert!(cfg.server.proxy_tool.allow_config_edit);
        assert_eq!(cfg.server.proxy_tool.host, "localhost");
        assert_eq!(cfg.server.event_stream.port, 9877);
        assert_eq!(cfg.limits.max_detached, 1);
        assert_eq!(cfg.limits.process_timeout_secs, 300);
        assert_eq!(cfg.security.allowed_tools, vec!["sh"]);
        assert_eq!(cfg.burp.binary, "burpsuite");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "burp:\n  binary: /opt/burp/burpsuite").unwrap();
        let cfg = load_config(Some(file.path())).unwrap();
        assert_eq!(cfg.burp.binary, "/opt/burp/burpsuite");
        assert_eq!(cfg.burp.community_binary, "burpsuite-community");
    }

    #[test]
    fn empty_file_is_defaults() {
        assert_eq!(parse_config("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(parse_config("server: [unclosed").is_err());
    }

    #[test]
    fn zero_timeouts_are_clamped() {
        let limits = Limits {
            process_timeout_secs: 0,
            http_timeout_secs: 0,
            max_detached: 2,
        };
        assert_eq!(limits.runner_limits().timeout, Duration::from_secs(1));
        assert_eq!(limits.http_timeout(), Duration::from_secs(1));
    }
}
