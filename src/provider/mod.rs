//! Session provider trait — the abstraction over the external media server
//!
//! Both backends (the OpenVidu REST client and the in-memory one used for
//! development and tests) implement `SessionProvider` to give the rest of
//! the service a uniform API for session, connection, and signal operations.

use crate::error::Result;
use async_trait::async_trait;

pub mod memory;
pub mod openvidu;

/// A session as reported by the provider
#[derive(Debug, Clone)]
pub struct ProviderSession {
    /// Session id; equal to the room id that named it
    pub id: String,
}

/// A connection as reported by the provider
#[derive(Debug, Clone)]
pub struct ProviderConnection {
    /// Connection id
    pub id: String,

    /// Opaque metadata attached at creation time
    pub data: String,

    /// Stream id of the connection's first publisher, if it publishes
    pub stream_id: Option<String>,
}

/// A freshly created connection: its id plus the join token
#[derive(Debug, Clone)]
pub struct CreatedConnection {
    pub id: String,
    pub token: String,
}

/// Bandwidth constraints attached to a credential request, in kbps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandwidthLimits {
    pub max_recv: u32,
    pub min_recv: u32,
    pub max_send: u32,
    pub min_send: u32,
}

/// Core trait for session provider backends
///
/// Sessions are identified by the room id that named them. NotFound and
/// conflict outcomes are part of the contract, not transport failures:
/// callers branch on them.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Fetch a session by room id; `Error::SessionNotFound` when absent
    async fn get_session(&self, room: &str) -> Result<ProviderSession>;

    /// Create the session for a room; `Error::SessionConflict` when one
    /// already exists
    async fn create_session(&self, room: &str) -> Result<ProviderSession>;

    /// Create a connection in a session, returning its id and join token
    async fn create_connection(
        &self,
        session_id: &str,
        data: &str,
        limits: Option<BandwidthLimits>,
    ) -> Result<CreatedConnection>;

    /// List the session's connections in the provider's own order
    async fn list_connections(&self, session_id: &str) -> Result<Vec<ProviderConnection>>;

    /// Fetch one connection; `Error::ConnectionNotFound` when absent
    async fn get_connection(
        &self,
        session_id: &str,
        connection_id: &str,
    ) -> Result<ProviderConnection>;

    /// Broadcast an application-level signal to every connection in a session
    async fn send_signal(&self, session_id: &str, kind: &str, data: &str) -> Result<()>;

    /// Backend name (e.g. "openvidu", "memory")
    fn name(&self) -> &str;
}
