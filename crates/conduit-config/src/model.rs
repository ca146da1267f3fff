use crate::timeouts::TimeoutHierarchy;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageBusConfig {
    pub enabled: bool,
    pub inline_threshold_bytes: u64,
    pub ttl_secs: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RoutingConfig {
    pub complexity_threshold: f64,
    pub context_threshold_tokens: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpertAnalysisConfig {
    pub include_files: bool,
    pub max_file_size_kb: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub timeout_secs: u64,
    pub cleanup_interval_secs: u64,
    pub max_concurrent: u64,
    pub concurrency_max: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub websocket_port: u16,
    pub auth_bearer_token: String,
    pub max_inbound_bytes: u64,
    pub max_queue_depth: u64,
    pub connection_concurrency_max: u64,
}

/// The single validated configuration record, loaded once at startup.
/// Every field here has already passed `validate::validate`.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub timeouts: TimeoutHierarchy,
    pub message_bus: MessageBusConfig,
    pub routing: RoutingConfig,
    pub expert_analysis: ExpertAnalysisConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
}

impl Config {
    /// The degraded-but-safe record handed out by `get_config()` when
    /// environment validation fails. Message bus disabled, conservative
    /// timeouts, localhost-only server — never panics, never half-built.
    pub fn safe_defaults() -> Self {
        Self {
            timeouts: TimeoutHierarchy {
                tool_secs: 30,
                daemon_secs: 60,
                shim_secs: 90,
                client_secs: 120,
            },
            message_bus: MessageBusConfig {
                enabled: false,
                inline_threshold_bytes: 1_048_576,
                ttl_secs: 86_400,
            },
            routing: RoutingConfig {
                complexity_threshold: 0.7,
                context_threshold_tokens: 100_000,
            },
            expert_analysis: ExpertAnalysisConfig {
                include_files: false,
                max_file_size_kb: 10,
            },
            session: SessionConfig {
                timeout_secs: 3600,
                cleanup_interval_secs: 300,
                max_concurrent: 100,
                concurrency_max: 8,
            },
            server: ServerConfig {
                websocket_port: 8765,
                auth_bearer_token: String::new(),
                max_inbound_bytes: 10 * 1024 * 1024,
                max_queue_depth: 64,
                connection_concurrency_max: 16,
            },
        }
    }
}
