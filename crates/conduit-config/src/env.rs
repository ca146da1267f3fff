use crate::model::*;
use crate::timeouts::TimeoutHierarchy;
use std::env;

/// Parsed straight from process environment, before validation. Every field
/// has the default spec §6 documents; a missing or unparsable variable
/// falls back to that default rather than failing the read.
pub struct RawConfig {
    pub tool_timeout_secs: u64,
    pub daemon_timeout_secs: u64,
    pub shim_timeout_secs: u64,
    pub client_timeout_secs: u64,

    pub session_timeout_secs: u64,
    pub session_cleanup_interval: u64,
    pub session_max_concurrent: u64,
    pub session_concurrency_max: u64,

    pub message_bus_enabled: bool,
    pub message_bus_inline_threshold_bytes: u64,
    pub message_bus_ttl_secs: u64,

    pub routing_complexity_threshold: f64,
    pub routing_context_threshold_tokens: u64,

    pub expert_analysis_include_files: bool,
    pub expert_analysis_max_file_size_kb: u64,

    pub websocket_port: u16,
    pub auth_bearer_token: String,
    pub max_inbound_bytes: u64,
    pub max_queue_depth: u64,
    pub connection_concurrency_max: u64,
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

impl RawConfig {
    pub fn from_env() -> Self {
        Self {
            tool_timeout_secs: env_u64("TOOL_TIMEOUT_SECS", 30),
            daemon_timeout_secs: env_u64("DAEMON_TIMEOUT_SECS", 60),
            shim_timeout_secs: env_u64("SHIM_TIMEOUT_SECS", 90),
            client_timeout_secs: env_u64("CLIENT_TIMEOUT_SECS", 120),

            session_timeout_secs: env_u64("SESSION_TIMEOUT_SECS", 3600),
            session_cleanup_interval: env_u64("SESSION_CLEANUP_INTERVAL", 300),
            session_max_concurrent: env_u64("SESSION_MAX_CONCURRENT", 100),
            session_concurrency_max: env_u64("SESSION_CONCURRENCY_MAX", 8),

            message_bus_enabled: env_bool("MESSAGE_BUS_ENABLED", false),
            message_bus_inline_threshold_bytes: env_u64("MESSAGE_BUS_INLINE_THRESHOLD_BYTES", 1_048_576),
            message_bus_ttl_secs: env_u64("MESSAGE_BUS_TTL_SECS", 86_400),

            routing_complexity_threshold: env_f64("ROUTING_COMPLEXITY_THRESHOLD", 0.7),
            routing_context_threshold_tokens: env_u64("ROUTING_CONTEXT_THRESHOLD_TOKENS", 100_000),

            expert_analysis_include_files: env_bool("EXPERT_ANALYSIS_INCLUDE_FILES", false),
            expert_analysis_max_file_size_kb: env_u64("EXPERT_ANALYSIS_MAX_FILE_SIZE_KB", 10),

            websocket_port: env_u64("WEBSOCKET_PORT", 8765) as u16,
            auth_bearer_token: env::var("AUTH_BEARER_TOKEN").unwrap_or_default(),
            max_inbound_bytes: env_u64("MAX_INBOUND_BYTES", 10 * 1024 * 1024),
            max_queue_depth: env_u64("MAX_QUEUE_DEPTH", 64),
            connection_concurrency_max: env_u64("CONNECTION_CONCURRENCY_MAX", 16),
        }
    }

    pub fn into_config(self) -> Config {
        Config {
            timeouts: TimeoutHierarchy {
                tool_secs: self.tool_timeout_secs,
                daemon_secs: self.daemon_timeout_secs,
                shim_secs: self.shim_timeout_secs,
                client_secs: self.client_timeout_secs,
            },
            message_bus: MessageBusConfig {
                enabled: self.message_bus_enabled,
                inline_threshold_bytes: self.message_bus_inline_threshold_bytes,
                ttl_secs: self.message_bus_ttl_secs,
            },
            routing: RoutingConfig {
                complexity_threshold: self.routing_complexity_threshold,
                context_threshold_tokens: self.routing_context_threshold_tokens,
            },
            expert_analysis: ExpertAnalysisConfig {
                include_files: self.expert_analysis_include_files,
                max_file_size_kb: self.expert_analysis_max_file_size_kb,
            },
            session: SessionConfig {
                timeout_secs: self.session_timeout_secs,
                cleanup_interval_secs: self.session_cleanup_interval,
                max_concurrent: self.session_max_concurrent,
                concurrency_max: self.session_concurrency_max,
            },
            server: ServerConfig {
                websocket_port: self.websocket_port,
                auth_bearer_token: self.auth_bearer_token,
                max_inbound_bytes: self.max_inbound_bytes,
                max_queue_depth: self.max_queue_depth,
                connection_concurrency_max: self.connection_concurrency_max,
            },
        }
    }
}
