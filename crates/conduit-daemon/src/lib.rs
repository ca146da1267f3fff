//! WebSocket-fronted tool dispatch daemon: wire protocol, request-handler
//! glue, and the built-in tool bodies needed to exercise both frames.
//! `conduitd` (`src/main.rs`) is a thin binary wrapper around this library.

pub mod rpc;
pub mod server;
pub mod tools;

pub use rpc::{ConduitRpcClient, ConduitRpcServer};
pub use server::{AppState, RpcImpl};
