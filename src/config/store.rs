//! Process-lifetime server configuration record.
//!
//! Three sections, mutated in place by the settings tools and read back by the
//! getters. Nothing here is persisted; a restart returns to the values loaded
//! at startup.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Burp Suite integration section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProxyToolSection {
    pub enabled: bool,
    pub port: u16,
    pub host: String,
    pub allow_config_edit: bool,
}

impl Default for ProxyToolSection {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9876,
            host: "localhost".to_string(),
            allow_config_edit: false,
        }
    }
}

/// Endpoint section shared by the event-stream and socket transports.
///
/// The two sections have different defaults; a partial section in a config
/// file is merged onto the defaults of the section it names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointSection {
    pub enabled: bool,
    pub port: u16,
    pub host: String,
}

impl EndpointSection {
    fn new(enabled: bool, port: u16) -> Self {
        Self {
            enabled,
            port,
            host: "localhost".to_string(),
        }
    }

    fn event_stream() -> Self {
        Self::new(true, 9877)
    }

    fn socket_endpoint() -> Self {
        Self::new(false, 9878)
    }

    /// `host:port` as a bind/connect address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Endpoint fields as written in a config file; absent ones are `None`.
#[derive(Debug, Default, Deserialize)]
struct EndpointFields {
    enabled: Option<bool>,
    port: Option<u16>,
    host: Option<String>,
}

impl EndpointFields {
    fn merge_onto(self, mut base: EndpointSection) -> EndpointSection {
        if let Some(enabled) = self.enabled {
            base.enabled = enabled;
        }
        if let Some(port) = self.port {
            base.port = port;
        }
        if let Some(host) = self.host {
            base.host = host;
        }
        base
    }
}

fn endpoint_over<'de, D: Deserializer<'de>>(
    deserializer: D,
    base: EndpointSection,
) -> Result<EndpointSection, D::Error> {
    // `eventStream:` with no body parses as null.
    let fields = Option::<EndpointFields>::deserialize(deserializer)?.unwrap_or_default();
    Ok(fields.merge_onto(base))
}

fn event_stream_section<'de, D: Deserializer<'de>>(d: D) -> Result<EndpointSection, D::Error> {
    endpoint_over(d, EndpointSection::event_stream())
}

fn socket_endpoint_section<'de, D: Deserializer<'de>>(d: D) -> Result<EndpointSection, D::Error> {
    endpoint_over(d, EndpointSection::socket_endpoint())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub proxy_tool: ProxyToolSection,
    #[serde(deserialize_with = "event_stream_section")]
    pub event_stream: EndpointSection,
    #[serde(deserialize_with = "socket_endpoint_section")]
    pub socket_endpoint: EndpointSection,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            proxy_tool: ProxyToolSection::default(),
            event_stream: EndpointSection::event_stream(),
            socket_endpoint: EndpointSection::socket_endpoint(),
        }
    }
}

/// Section selector, spelled the way the sections serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    ProxyTool,
    EventStream,
    SocketEndpoint,
}

impl Section {
    pub const ALL: [Section; 3] = [
        Section::ProxyTool,
        Section::EventStream,
        Section::SocketEndpoint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::ProxyTool => "proxyTool",
            Section::EventStream => "eventStream",
            Section::SocketEndpoint => "socketEndpoint",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown config section '{s}' (expected one of: proxyTool, eventStream, socketEndpoint)"
                )
            })
    }
}

/// Partial update for the proxy-tool section; absent fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProxyToolPatch {
    /// Enable or disable the Burp Suite integration
    pub enabled: Option<bool>,
    /// Burp Suite MCP port
    pub port: Option<u16>,
    /// Burp Suite MCP host
    pub host: Option<String>,
    /// Allow tools to edit Burp project/user options
    #[serde(rename = "allowConfigEdit")]
    pub allow_config_edit: Option<bool>,
}

/// Shared handle to the live `ServerConfig`.
///
/// Clones share one record. Writes are last-write-wins under the lock, so
/// concurrent sessions never observe a half-applied patch.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Arc<RwLock<ServerConfig>>,
}

impl ConfigStore {
    pub fn new(initial: ServerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ServerConfig> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ServerConfig> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> ServerConfig {
        self.read().clone()
    }

    pub fn proxy_tool(&self) -> ProxyToolSection {
        self.read().proxy_tool.clone()
    }

    /// One section rendered as JSON.
    pub fn get(&self, section: Section) -> serde_json::Value {
        let cfg = self.read();
        let value = match section {
            Section::ProxyTool => serde_json::to_value(&cfg.proxy_tool),
            Section::EventStream => serde_json::to_value(&cfg.event_stream),
            Section::SocketEndpoint => serde_json::to_value(&cfg.socket_endpoint),
        };
        value.unwrap_or(serde_json::Value::Null)
    }

    /// Apply a partial update to the proxy-tool section and return the result.
    pub fn update_proxy_tool(&self, patch: ProxyToolPatch) -> ProxyToolSection {
        let mut cfg = self.write();
        let section = &mut cfg.proxy_tool;
        if let Some(enabled) = patch.enabled {
            section.enabled = enabled;
        }
        if let Some(port) = patch.port {
            section.port = port;
        }
        if let Some(host) = patch.host {
            section.host = host;
        }
        if let Some(allow) = patch.allow_config_edit {
            section.allow_config_edit = allow;
        }
        section.clone()
    }
}
