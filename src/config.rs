//! Agent configuration document: schema, loading, validation.
//!
//! The document is JSON. Deserialization is permissive (every field is
//! optional, ports may be numbers or strings); `AgentConfiguration::from_doc`
//! then enforces the required fields and produces the immutable, validated
//! view the rest of the supervisor works from. Validation runs before any
//! toolchain command is resolved, so a broken document never spawns a
//! process.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

/// Poll interval applied when `monitoringInterval` is absent.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;

/// Backlog size applied when `displayLineCount` is absent.
const DEFAULT_DISPLAY_LINE_COUNT: usize = 50;

// ── Flexible scalars ─────────────────────────────────────────────────────────

/// JSON scalar accepted where the toolchain wants a string argument.
/// Configuration documents in the wild write ports as numbers and flags as
/// booleans; the toolchain receives them as strings either way.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Num(serde_json::Number),
    Str(String),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Num(n) => n.to_string(),
            Self::Str(s) => s,
        }
    }
}

fn de_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

fn de_scalar_map<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeMap<String, Scalar>>::deserialize(deserializer)?
        .map(|m| m.into_iter().map(|(k, v)| (k, v.into_string())).collect()))
}

// ── Raw document ─────────────────────────────────────────────────────────────

/// Top-level configuration document as deserialized from JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigDoc {
    pub data_path: Option<String>,
    pub monitoring_interval: Option<u64>,
    pub display_agent_logs: Option<bool>,
    pub display_line_count: Option<usize>,
    pub coordination_q_mgr: Option<QmgrDoc>,
    pub commands_q_mgr: Option<QmgrDoc>,
    pub agent: Option<AgentDoc>,
}

/// Queue manager connection block.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QmgrDoc {
    pub name: Option<String>,
    pub host: Option<String>,
    #[serde(deserialize_with = "de_scalar")]
    pub port: Option<String>,
    pub channel: Option<String>,
}

/// Agent definition block.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentDoc {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub qmgr_name: Option<String>,
    pub qmgr_host: Option<String>,
    #[serde(deserialize_with = "de_scalar")]
    pub qmgr_port: Option<String>,
    pub qmgr_channel: Option<String>,
    pub credentials_file: Option<String>,
    pub protocol_bridge: Option<BridgeDoc>,
    #[serde(deserialize_with = "de_scalar_map")]
    pub additional_properties: Option<BTreeMap<String, String>>,
    #[serde(deserialize_with = "de_scalar_map")]
    pub resource_monitors: Option<BTreeMap<String, String>>,
}

/// Protocol-bridge parameters. Every field is optional; a parameter that is
/// absent here is omitted from the create command entirely.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeDoc {
    pub server_type: Option<String>,
    pub server_host: Option<String>,
    #[serde(deserialize_with = "de_scalar")]
    pub server_port: Option<String>,
    pub server_timezone: Option<String>,
    pub server_platform: Option<String>,
    pub server_locale: Option<String>,
    pub server_file_encoding: Option<String>,
    pub server_trust_store_file: Option<String>,
    #[serde(deserialize_with = "de_scalar")]
    pub server_limited_write: Option<String>,
    pub server_list_format: Option<String>,
}

// ── Validated view ───────────────────────────────────────────────────────────

/// Immutable, validated agent configuration. Created once at startup.
#[derive(Debug, Clone)]
pub struct AgentConfiguration {
    /// Root of the MFT data directory (`BFG_DATA`).
    pub data_path: String,
    /// Interval between liveness polls.
    pub poll_interval: Duration,
    /// Whether to tail the agent's own log to the operator.
    pub show_agent_logs: bool,
    /// Backlog lines shown when the tail starts.
    pub display_line_count: usize,
    /// Coordination queue manager (the central agent registry).
    pub coordination: QmgrSettings,
    /// Queue manager used to route administrative commands.
    pub commands: QmgrSettings,
    /// The supervised agent itself.
    pub agent: AgentSettings,
}

/// Validated queue manager identity. Only the name is required; host, port,
/// and channel are passed to the toolchain when present.
#[derive(Debug, Clone)]
pub struct QmgrSettings {
    pub name: String,
    pub host: Option<String>,
    pub port: Option<String>,
    pub channel: Option<String>,
}

/// Agent variant selected by the `agent.type` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// Native MFT agent with its own queue manager connection.
    Standard,
    /// Protocol-bridge agent proxying FTP/SFTP endpoints.
    Bridge,
}

impl AgentKind {
    /// `STANDARD` (any case) selects the standard agent; anything else,
    /// including an absent type, selects the bridge variant.
    #[must_use]
    pub fn from_type(kind: Option<&str>) -> Self {
        if kind.is_some_and(|k| k.eq_ignore_ascii_case("STANDARD")) {
            Self::Standard
        } else {
            Self::Bridge
        }
    }
}

/// Validated agent definition.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub name: String,
    pub kind: AgentKind,
    pub qmgr_name: String,
    pub qmgr_host: Option<String>,
    pub qmgr_port: Option<String>,
    pub qmgr_channel: Option<String>,
    pub credentials_file: String,
    /// Bridge parameters; empty defaults when `protocolBridge` is absent.
    pub bridge: BridgeSettings,
    /// Free-form `key=value` lines appended to `agent.properties`.
    pub additional_properties: BTreeMap<String, String>,
    /// Monitor name → watched directory.
    pub resource_monitors: BTreeMap<String, String>,
}

/// Validated bridge parameters. All optional; the argument builder applies
/// the `FTP`/`localhost` defaults for type and host.
#[derive(Debug, Clone, Default)]
pub struct BridgeSettings {
    pub server_type: Option<String>,
    pub server_host: Option<String>,
    pub server_port: Option<String>,
    pub server_timezone: Option<String>,
    pub server_platform: Option<String>,
    pub server_locale: Option<String>,
    pub server_file_encoding: Option<String>,
    pub server_trust_store_file: Option<String>,
    pub server_limited_write: Option<String>,
    pub server_list_format: Option<String>,
}

impl AgentConfiguration {
    /// Validate a raw document into the typed view.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` naming the first required setting
    /// that is absent.
    pub fn from_doc(doc: ConfigDoc) -> Result<Self, ConfigError> {
        let data_path = doc
            .data_path
            .ok_or(ConfigError::MissingField("dataPath"))?;

        let coordination = doc.coordination_q_mgr.unwrap_or_default();
        let coordination_name = coordination
            .name
            .ok_or(ConfigError::MissingField("coordinationQMgr.name"))?;

        let commands = doc.commands_q_mgr.unwrap_or_default();
        let commands_name = commands
            .name
            .ok_or(ConfigError::MissingField("commandsQMgr.name"))?;

        let agent = doc.agent.unwrap_or_default();
        let agent_name = agent.name.ok_or(ConfigError::MissingField("agent.name"))?;
        let qmgr_name = agent
            .qmgr_name
            .ok_or(ConfigError::MissingField("agent.qmgrName"))?;
        let credentials_file = agent
            .credentials_file
            .ok_or(ConfigError::MissingField("agent.credentialsFile"))?;

        let bridge = agent.protocol_bridge.unwrap_or_default();

        Ok(Self {
            data_path,
            poll_interval: Duration::from_secs(
                doc.monitoring_interval
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            show_agent_logs: doc.display_agent_logs.unwrap_or(false),
            display_line_count: doc
                .display_line_count
                .unwrap_or(DEFAULT_DISPLAY_LINE_COUNT),
            coordination: QmgrSettings {
                name: coordination_name,
                host: coordination.host,
                port: coordination.port,
                channel: coordination.channel,
            },
            commands: QmgrSettings {
                name: commands_name,
                host: commands.host,
                port: commands.port,
                channel: commands.channel,
            },
            agent: AgentSettings {
                name: agent_name,
                kind: AgentKind::from_type(agent.kind.as_deref()),
                qmgr_name,
                qmgr_host: agent.qmgr_host,
                qmgr_port: agent.qmgr_port,
                qmgr_channel: agent.qmgr_channel,
                credentials_file,
                bridge: BridgeSettings {
                    server_type: bridge.server_type,
                    server_host: bridge.server_host,
                    server_port: bridge.server_port,
                    server_timezone: bridge.server_timezone,
                    server_platform: bridge.server_platform,
                    server_locale: bridge.server_locale,
                    server_file_encoding: bridge.server_file_encoding,
                    server_trust_store_file: bridge.server_trust_store_file,
                    server_limited_write: bridge.server_limited_write,
                    server_list_format: bridge.server_list_format,
                },
                additional_properties: agent.additional_properties.unwrap_or_default(),
                resource_monitors: agent.resource_monitors.unwrap_or_default(),
            },
        })
    }
}

/// Load and validate the configuration document at `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, or is
/// missing a required setting.
pub fn load(path: &Path) -> Result<AgentConfiguration> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let doc: ConfigDoc = serde_json::from_str(&content)
        .with_context(|| format!("cannot parse {}", path.display()))?;
    Ok(AgentConfiguration::from_doc(doc)?)
}

// ── Unit tests ───────────────────────────────────────────────────────────────
