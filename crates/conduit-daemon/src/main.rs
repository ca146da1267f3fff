//! Daemon entry point: loads configuration, wires the provider registry,
//! session/continuity/bus/event plumbing, and the two built-in tools, then
//! serves `ConduitRpc` over jsonrpsee until `Ctrl-C`.

use conduit_bus::{MemoryBusBackend, MessageBusClient};
use conduit_continuity::ConversationStore;
use conduit_daemon::tools;
use conduit_daemon::{AppState, ConduitRpcServer, RpcImpl};
use conduit_events::EventBus;
use conduit_providers::{ClaudeProvider, ModelDescriptor, ProviderConfig, ProviderRegistry, Tier};
use conduit_runtime::frame::{SimpleToolFrame, WorkflowEngine};
use conduit_runtime::{ConnectionManager, SessionManager};
use conduit_tools::{Tool, ToolRegistry, WorkflowTool};
use jsonrpsee::server::Server;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

fn build_provider_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();

    let manager_key = std::env::var("CLAUDE_MANAGER_API_KEY").unwrap_or_default();
    let manager_config = ProviderConfig::new(manager_key, "claude-haiku-4-5").max_tokens(4096);
    registry.register(
        ModelDescriptor::new("claude-haiku-4-5", "anthropic", 200_000, 0.0008, vec!["tools"], Tier::Manager),
        Arc::new(ClaudeProvider::new(manager_config, Tier::Manager, 0.0008, vec!["tools"])),
    );

    let complex_key = std::env::var("CLAUDE_COMPLEX_API_KEY").unwrap_or_default();
    let complex_config = ProviderConfig::new(complex_key, "claude-sonnet-4-5").max_tokens(8192);
    registry.register(
        ModelDescriptor::new(
            "claude-sonnet-4-5",
            "anthropic",
            200_000,
            0.003,
            vec!["tools", "vision"],
            Tier::Complex,
        ),
        Arc::new(ClaudeProvider::new(complex_config, Tier::Complex, 0.003, vec!["tools", "vision"])),
    );

    let long_context_key = std::env::var("CLAUDE_LONG_CONTEXT_API_KEY").unwrap_or_default();
    let long_context_config = ProviderConfig::new(long_context_key, "claude-opus-4-1")
        .max_tokens(8192)
        .context_window(1_000_000);
    registry.register(
        ModelDescriptor::new(
            "claude-opus-4-1",
            "anthropic",
            1_000_000,
            0.015,
            vec!["tools", "vision", "long_context"],
            Tier::LongContext,
        ),
        Arc::new(ClaudeProvider::new(
            long_context_config,
            Tier::LongContext,
            0.015,
            vec!["tools", "vision", "long_context"],
        )),
    );

    registry
}

fn build_tool_registry() -> (ToolRegistry, HashMap<String, Arc<dyn WorkflowTool>>) {
    let mut registry = ToolRegistry::new();
    let chat: Arc<dyn Tool> = Arc::new(tools::ChatTool::new());
    registry.register(chat);

    let debug_tool = Arc::new(tools::DebugWorkflowTool::new());
    let debug_as_tool: Arc<dyn Tool> = debug_tool.clone();
    registry.register(debug_as_tool);

    let mut workflow_tools: HashMap<String, Arc<dyn WorkflowTool>> = HashMap::new();
    workflow_tools.insert("debug".to_string(), debug_tool);

    (registry, workflow_tools)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    conduit_core::logging::init_logging(std::env::var("CONDUIT_LOG_JSON").is_ok());

    let config = conduit_config::get_config();
    info!(
        tool_secs = config.timeouts.tool_secs,
        daemon_secs = config.timeouts.daemon_secs,
        websocket_port = config.server.websocket_port,
        "starting conduit daemon"
    );

    let providers = Arc::new(build_provider_registry());
    let continuity = Arc::new(ConversationStore::new(Duration::from_secs(config.session.timeout_secs)));
    let bus_backend = Arc::new(MemoryBusBackend::new());
    let bus = Arc::new(MessageBusClient::new(
        bus_backend,
        config.message_bus.inline_threshold_bytes,
        config.message_bus.ttl_secs,
        config.message_bus.enabled,
    ));
    let events = EventBus::new();
    let sessions = Arc::new(SessionManager::new(
        config.server.auth_bearer_token.clone(),
        config.session.concurrency_max as usize,
        config.session.timeout_secs,
        config.session.max_concurrent as usize,
    ));
    let connections = Arc::new(ConnectionManager::new(config.server.connection_concurrency_max as usize));

    let (tool_registry, workflow_tools) = build_tool_registry();
    let simple_frame = Arc::new(SimpleToolFrame::new(
        providers.clone(),
        continuity.clone(),
        config.routing.context_threshold_tokens as usize,
        config.routing.complexity_threshold,
        config.routing.context_threshold_tokens as usize,
    ));
    let workflow_engine = Arc::new(WorkflowEngine::new(
        providers.clone(),
        true,
        config.expert_analysis.include_files,
        Duration::from_secs(config.session.timeout_secs),
    ));

    let state = Arc::new(AppState {
        sessions: sessions.clone(),
        connections,
        tool_registry: Arc::new(tool_registry),
        workflow_tools,
        simple_frame,
        workflow_engine,
        bus,
        events: events.clone(),
        tool_timeout: config.timeouts.tool(),
        daemon_timeout: config.timeouts.daemon(),
        max_queue_depth: config.server.max_queue_depth,
        queue_depth: std::sync::atomic::AtomicU64::new(0),
        in_flight: dashmap::DashMap::new(),
        in_flight_workflows: dashmap::DashMap::new(),
    });

    let bind_addr = format!("127.0.0.1:{}", config.server.websocket_port);
    let server = Server::builder().build(bind_addr).await?;
    let addr = server.local_addr()?;

    let rpc_impl = RpcImpl { state: state.clone() };
    let handle = server.start(rpc_impl.into_rpc());
    info!(%addr, "conduit daemon listening");

    let session_sweeper = conduit_runtime::spawn_sweeper(
        sessions,
        events.clone(),
        Duration::from_secs(config.session.cleanup_interval_secs),
    );
    let continuity_sweeper = conduit_continuity::spawn_sweeper(continuity, Duration::from_secs(config.session.cleanup_interval_secs));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    handle.stop()?;
    session_sweeper.abort();
    continuity_sweeper.abort();
    handle.stopped().await;

    Ok(())
}
