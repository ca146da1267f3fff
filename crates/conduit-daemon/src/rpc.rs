//! Wire protocol (spec §6): JSON opcodes over a jsonrpsee WebSocket
//! connection. Each opcode is an RPC method; `request_id` is carried
//! explicitly in params/results rather than relying on the JSON-RPC
//! envelope's own id, so it survives into `cancel` and `retrieve` calls
//! issued on a separate round trip.

use conduit_core::{ConnectionId, SessionId};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloRequest {
    pub auth_token: String,
    pub client_info: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloResponse {
    pub session_id: SessionId,
    pub connection_id: ConnectionId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolRequest {
    pub request_id: String,
    pub session_id: SessionId,
    pub connection_id: ConnectionId,
    pub tool: String,
    pub arguments: Value,
    pub continuation_id: Option<String>,
}

/// `{request_id, status, payload | pointer}`. `status` is one of
/// `ok | workflow_paused | error | busy`; `payload` carries the frame's
/// envelope inline, `pointer` replaces it when the message bus took the
/// payload out of band.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolResponse {
    pub request_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<PointerEnvelope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<conduit_core::ClientError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointerEnvelope {
    pub pointer: String,
    pub size: u64,
    pub sha256: String,
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelRequest {
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveRequest {
    pub transaction_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveResponse {
    pub bytes_b64: String,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
    pub pong: bool,
}

/// JSON-RPC error codes, one per taxonomy kind a transport-level failure
/// (as opposed to an in-envelope `{status: ..., ...}` response) can
/// surface. `hello` and `retrieve` fail this way since they have no
/// envelope of their own. `call_tool` does have an envelope
/// (`CallToolResponse`) and uses it for everything it can attribute to a
/// `request_id` — including `busy` and an unknown tool — but a session or
/// connection that doesn't exist yet fails this way too, since there is no
/// session/connection context to hang a well-formed envelope off of.
pub mod error_codes {
    pub const AUTH_FAILED: i32 = -32001;
    pub const SESSION_NOT_FOUND: i32 = -32002;
    pub const BUSY: i32 = -32003;
    pub const UNKNOWN_TOOL: i32 = -32004;
    pub const NOT_FOUND: i32 = -32005;
    pub const INTERNAL_ERROR: i32 = -32006;
}

#[rpc(server, client, namespace = "conduit")]
pub trait ConduitRpc {
    #[method(name = "hello")]
    async fn hello(&self, req: HelloRequest) -> Result<HelloResponse, ErrorObjectOwned>;

    #[method(name = "callTool")]
    async fn call_tool(&self, req: CallToolRequest) -> Result<CallToolResponse, ErrorObjectOwned>;

    #[method(name = "cancel")]
    async fn cancel(&self, req: CancelRequest) -> Result<(), ErrorObjectOwned>;

    #[method(name = "retrieve")]
    async fn retrieve(&self, req: RetrieveRequest) -> Result<RetrieveResponse, ErrorObjectOwned>;

    #[method(name = "ping")]
    async fn ping(&self) -> Result<PingResponse, ErrorObjectOwned>;
}
