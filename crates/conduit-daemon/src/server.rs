//! `ConduitRpc` server implementation: the request handler glue of spec
//! §4.10, wired onto the jsonrpsee transport set up in `main.rs`.

use crate::rpc::{
    error_codes, CallToolRequest, CallToolResponse, CancelRequest, ConduitRpcServer, HelloRequest, HelloResponse,
    PingResponse, PointerEnvelope, RetrieveRequest, RetrieveResponse,
};
use conduit_bus::{MessageBusClient, RouteDecision};
use conduit_core::{ClientError, CorrelationId, ErrorKind, TransactionId};
use conduit_events::{ConduitEvent, EventBus};
use conduit_runtime::connection::{Connection, ConnectionPermit};
use conduit_runtime::frame::{SimpleRequest, SimpleToolFrame, WorkflowStepArgs};
use conduit_runtime::session::SessionPermit;
use conduit_runtime::{ConnectionManager, SessionManager, WorkflowEngine};
use conduit_tools::{ToolContext, ToolRegistry, WorkflowTool};
use dashmap::DashMap;
use jsonrpsee::core::async_trait;
use jsonrpsee::types::ErrorObjectOwned;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn busy_response(request_id: &str) -> CallToolResponse {
    CallToolResponse {
        request_id: request_id.to_string(),
        status: "busy".to_string(),
        payload: None,
        pointer: None,
        error: Some(to_client_error(ErrorKind::Busy, "server is at capacity", request_id)),
    }
}

fn to_client_error(kind: ErrorKind, message: impl Into<String>, request_id: &str) -> ClientError {
    ClientError::new(kind, message, CorrelationId::new()).with_request_id(request_id.to_string())
}

fn error_code_for(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::AuthFailed => error_codes::AUTH_FAILED,
        ErrorKind::Busy => error_codes::BUSY,
        ErrorKind::UnknownTool | ErrorKind::ToolDisabled => error_codes::UNKNOWN_TOOL,
        ErrorKind::UnknownContinuation => error_codes::NOT_FOUND,
        _ => error_codes::INTERNAL_ERROR,
    }
}

fn to_error_object(err: &ClientError) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(error_code_for(err.kind), err.message.clone(), Some(serde_json::to_value(err).unwrap_or_default()))
}

pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub connections: Arc<ConnectionManager>,
    pub tool_registry: Arc<ToolRegistry>,
    pub workflow_tools: HashMap<String, Arc<dyn WorkflowTool>>,
    pub simple_frame: Arc<SimpleToolFrame>,
    pub workflow_engine: Arc<WorkflowEngine>,
    pub bus: Arc<MessageBusClient>,
    pub events: EventBus,
    pub tool_timeout: Duration,
    pub daemon_timeout: Duration,
    pub max_queue_depth: u64,
    pub queue_depth: AtomicU64,
    pub in_flight: DashMap<String, CancellationToken>,
    pub in_flight_workflows: DashMap<String, conduit_core::ContinuationId>,
}

pub struct RpcImpl {
    pub state: Arc<AppState>,
}

impl RpcImpl {
    fn tool_category_of(&self, tool: &str, request_id: &str) -> Result<conduit_tools::ToolCategory, ClientError> {
        let descriptor = self
            .state
            .tool_registry
            .get(tool)
            .map_err(|e| {
                let message = e.to_string();
                to_client_error(e.into(), message, request_id)
            })?
            .descriptor();
        Ok(descriptor.category)
    }

    async fn dispatch_simple(&self, req: &CallToolRequest, continuation_id: Option<conduit_core::ContinuationId>) -> Result<CallToolResponse, ClientError> {
        let descriptor = self
            .state
            .tool_registry
            .get(&req.tool)
            .map_err(|e| {
                let message = e.to_string();
                to_client_error(e.into(), message, &req.request_id)
            })?
            .descriptor()
            .clone();

        let simple_req = SimpleRequest {
            descriptor: &descriptor,
            arguments: req.arguments.clone(),
            continuation_id,
            explicit_model: None,
            file_count: 0,
            complexity_hint: None,
        };

        let envelope = self
            .state
            .simple_frame
            .execute(simple_req, self.state.tool_timeout)
            .await
            .map_err(|e| {
                let message = e.to_string();
                to_client_error(e.into(), message, &req.request_id)
            })?;

        self.envelope_response(req, envelope).await
    }

    async fn dispatch_workflow(&self, req: &CallToolRequest) -> Result<CallToolResponse, ClientError> {
        let tool = self
            .state
            .workflow_tools
            .get(&req.tool)
            .ok_or_else(|| to_client_error(ErrorKind::UnknownTool, format!("unknown workflow tool: {}", req.tool), &req.request_id))?
            .clone();

        let args: WorkflowStepArgs = serde_json::from_value(req.arguments.clone())
            .map_err(|e| to_client_error(ErrorKind::InvalidInput, format!("malformed workflow arguments: {e}"), &req.request_id))?;

        let ctx = ToolContext {
            session_id: req.session_id.clone(),
            continuation_id: args.continuation_id.clone(),
        };

        let envelope = self
            .state
            .workflow_engine
            .step(tool.as_ref(), &req.tool, args, &ctx)
            .await
            .map_err(|e| {
                let message = e.to_string();
                to_client_error(e.into(), message, &req.request_id)
            })?;

        self.envelope_response(req, envelope).await
    }

    /// Admits a waiting acquire into the shared queue-depth budget (spec
    /// §4.10 step 4). Returns `Err(busy)` immediately if the queue is
    /// already at `max_queue_depth` rather than growing it unbounded.
    async fn acquire_session_or_queue<'a>(&self, session: &'a conduit_runtime::Session, request_id: &str) -> Result<SessionPermit<'a>, CallToolResponse> {
        match self.state.sessions.acquire(session).await {
            Ok(permit) => Ok(permit),
            Err(_) => {
                let depth = self.state.queue_depth.fetch_add(1, Ordering::AcqRel) + 1;
                if depth > self.state.max_queue_depth {
                    self.state.queue_depth.fetch_sub(1, Ordering::AcqRel);
                    return Err(busy_response(request_id));
                }
                let permit = self.state.sessions.acquire_waiting(session).await;
                self.state.queue_depth.fetch_sub(1, Ordering::AcqRel);
                Ok(permit)
            }
        }
    }

    async fn acquire_connection_or_queue<'a>(&self, connection: &'a Connection, request_id: &str) -> Result<ConnectionPermit<'a>, CallToolResponse> {
        match self.state.connections.acquire(connection).await {
            Ok(permit) => Ok(permit),
            Err(_) => {
                let depth = self.state.queue_depth.fetch_add(1, Ordering::AcqRel) + 1;
                if depth > self.state.max_queue_depth {
                    self.state.queue_depth.fetch_sub(1, Ordering::AcqRel);
                    return Err(busy_response(request_id));
                }
                let permit = self.state.connections.acquire_waiting(connection).await;
                self.state.queue_depth.fetch_sub(1, Ordering::AcqRel);
                Ok(permit)
            }
        }
    }

    async fn envelope_response(&self, req: &CallToolRequest, envelope: conduit_runtime::FrameEnvelope) -> Result<CallToolResponse, ClientError> {
        let status = match &envelope {
            conduit_runtime::FrameEnvelope::Ok { .. } => "ok",
            conduit_runtime::FrameEnvelope::WorkflowPaused { .. } => "workflow_paused",
        };
        let payload = serde_json::to_vec(&envelope).unwrap_or_default();

        match self.state.bus.route(payload.clone(), "application/json").await {
            Ok(RouteDecision::Inline(bytes)) => Ok(CallToolResponse {
                request_id: req.request_id.clone(),
                status: status.to_string(),
                payload: serde_json::from_slice(&bytes).ok(),
                pointer: None,
                error: None,
            }),
            Ok(RouteDecision::Pointer { transaction_id, size, sha256 }) => Ok(CallToolResponse {
                request_id: req.request_id.clone(),
                status: status.to_string(),
                payload: None,
                pointer: Some(PointerEnvelope {
                    pointer: transaction_id.as_str().to_string(),
                    size,
                    sha256,
                    content_type: "application/json".to_string(),
                }),
                error: None,
            }),
            Err(_) => Err(to_client_error(
                ErrorKind::PayloadTooLargeBusDown,
                "payload too large and message bus is unavailable",
                &req.request_id,
            )),
        }
    }
}

#[async_trait]
impl ConduitRpcServer for RpcImpl {
    async fn hello(&self, req: HelloRequest) -> Result<HelloResponse, ErrorObjectOwned> {
        let session = self.state.sessions.open(&req.auth_token).await.map_err(|e| {
            let kind: ErrorKind = e.into();
            to_error_object(&to_client_error(kind, "authentication failed", ""))
        })?;
        let connection = self.state.connections.open().await;
        self.state.events.publish(ConduitEvent::SessionOpened { session_id: session.id.clone() });
        self.state
            .events
            .publish(ConduitEvent::ConnectionAttached { connection_id: connection.id.clone(), session_id: session.id.clone() });
        Ok(HelloResponse { session_id: session.id.clone(), connection_id: connection.id.clone() })
    }

    async fn call_tool(&self, req: CallToolRequest) -> Result<CallToolResponse, ErrorObjectOwned> {
        self.state.sessions.touch(&req.session_id).await.map_err(|e| {
            let kind: ErrorKind = e.into();
            to_error_object(&to_client_error(kind, "session not found", &req.request_id))
        })?;

        let session = self.state.sessions.get(&req.session_id).await.map_err(|e| {
            let kind: ErrorKind = e.into();
            to_error_object(&to_client_error(kind, "session not found", &req.request_id))
        })?;

        let connection = self.state.connections.get(&req.connection_id).await.map_err(|e| {
            let kind: ErrorKind = e.into();
            to_error_object(&to_client_error(kind, "connection not found", &req.request_id))
        })?;

        let session_permit = match self.acquire_session_or_queue(&session, &req.request_id).await {
            Ok(permit) => permit,
            Err(busy) => return Ok(busy),
        };
        let connection_permit = match self.acquire_connection_or_queue(&connection, &req.request_id).await {
            Ok(permit) => permit,
            Err(busy) => return Ok(busy),
        };

        let token = CancellationToken::new();
        self.state.in_flight.insert(req.request_id.clone(), token.clone());

        let category = match self.tool_category_of(&req.tool, &req.request_id) {
            Ok(category) => category,
            Err(client_err) => {
                self.state.in_flight.remove(&req.request_id);
                return Ok(CallToolResponse {
                    request_id: req.request_id.clone(),
                    status: "error".to_string(),
                    payload: None,
                    pointer: None,
                    error: Some(client_err),
                });
            }
        };
        let continuation_id = req.continuation_id.clone().map(conduit_core::ContinuationId::from);
        if category == conduit_tools::ToolCategory::Workflow {
            if let Some(id) = &continuation_id {
                self.state.in_flight_workflows.insert(req.request_id.clone(), id.clone());
            }
        }

        let result = tokio::select! {
            result = async {
                match category {
                    conduit_tools::ToolCategory::Workflow => self.dispatch_workflow(&req).await,
                    _ => self.dispatch_simple(&req, continuation_id).await,
                }
            } => result,
            () = token.cancelled() => Err(to_client_error(ErrorKind::Cancelled, "request cancelled", &req.request_id)),
        };

        self.state.in_flight.remove(&req.request_id);
        self.state.in_flight_workflows.remove(&req.request_id);
        drop(session_permit);
        drop(connection_permit);

        result.or_else(|client_err| {
            Ok(CallToolResponse {
                request_id: req.request_id.clone(),
                status: "error".to_string(),
                payload: None,
                pointer: None,
                error: Some(client_err),
            })
        })
    }

    async fn cancel(&self, req: CancelRequest) -> Result<(), ErrorObjectOwned> {
        if let Some((_, token)) = self.state.in_flight.remove(&req.request_id) {
            token.cancel();
        }
        if let Some((_, continuation_id)) = self.state.in_flight_workflows.remove(&req.request_id) {
            self.state.workflow_engine.cancel(&continuation_id).await;
        }
        Ok(())
    }

    async fn retrieve(&self, req: RetrieveRequest) -> Result<RetrieveResponse, ErrorObjectOwned> {
        let id = TransactionId::from(req.transaction_id);
        let txn = self.state.bus.fetch(&id).await.map_err(|e| {
            let kind: ErrorKind = e.into();
            to_error_object(&to_client_error(kind, "transaction not found", ""))
        })?;
        use base64::Engine;
        Ok(RetrieveResponse {
            bytes_b64: base64::engine::general_purpose::STANDARD.encode(&txn.payload),
            sha256: txn.sha256,
        })
    }

    async fn ping(&self) -> Result<PingResponse, ErrorObjectOwned> {
        Ok(PingResponse { pong: true })
    }
}
