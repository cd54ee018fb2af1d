//! In-memory session provider
//!
//! Backs development and tests without a running media server. Sessions and
//! connections live in process memory, tokens are fabricated, and broadcast
//! signals are recorded so tests can assert on them. Error semantics match
//! the OpenVidu backend: missing session, missing connection, and duplicate
//! create map to the same variants.

use super::{
    BandwidthLimits, CreatedConnection, ProviderConnection, ProviderSession, SessionProvider,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A signal captured by the memory backend
#[derive(Debug, Clone)]
pub struct RecordedSignal {
    pub session_id: String,
    pub kind: String,
    pub data: String,
}

#[derive(Debug, Clone)]
struct MemoryConnection {
    id: String,
    data: String,
    stream_id: Option<String>,
    limits: Option<BandwidthLimits>,
}

/// In-memory `SessionProvider` backend
#[derive(Default)]
pub struct MemorySessionProvider {
    sessions: RwLock<HashMap<String, Vec<MemoryConnection>>>,
    signals: RwLock<Vec<RecordedSignal>>,
}

impl MemorySessionProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals broadcast so far, oldest first
    pub async fn signals(&self) -> Vec<RecordedSignal> {
        self.signals.read().await.clone()
    }

    /// Bandwidth limits recorded for a connection at creation, if any
    pub async fn limits_for(
        &self,
        session_id: &str,
        connection_id: &str,
    ) -> Option<BandwidthLimits> {
        self.sessions
            .read()
            .await
            .get(session_id)?
            .iter()
            .find(|c| c.id == connection_id)?
            .limits
    }

    /// Mark a connection as publishing a media stream
    pub async fn publish_stream(
        &self,
        session_id: &str,
        connection_id: &str,
        stream_id: &str,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let connections = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        let connection = connections
            .iter_mut()
            .find(|c| c.id == connection_id)
            .ok_or_else(|| Error::ConnectionNotFound(connection_id.to_string()))?;
        connection.stream_id = Some(stream_id.to_string());
        Ok(())
    }
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    async fn get_session(&self, room: &str) -> Result<ProviderSession> {
        if self.sessions.read().await.contains_key(room) {
            Ok(ProviderSession {
                id: room.to_string(),
            })
        } else {
            Err(Error::SessionNotFound(room.to_string()))
        }
    }

    async fn create_session(&self, room: &str) -> Result<ProviderSession> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(room) {
            return Err(Error::SessionConflict(room.to_string()));
        }
        sessions.insert(room.to_string(), Vec::new());
        Ok(ProviderSession {
            id: room.to_string(),
        })
    }

    async fn create_connection(
        &self,
        session_id: &str,
        data: &str,
        limits: Option<BandwidthLimits>,
    ) -> Result<CreatedConnection> {
        let mut sessions = self.sessions.write().await;
        let connections = sessions
            .get_mut(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;

        let id = format!("con_{}", Uuid::new_v4().simple());
        connections.push(MemoryConnection {
            id: id.clone(),
            data: data.to_string(),
            stream_id: None,
            limits,
        });

        Ok(CreatedConnection {
            id,
            token: format!("tok_{}", Uuid::new_v4().simple()),
        })
    }

    async fn list_connections(&self, session_id: &str) -> Result<Vec<ProviderConnection>> {
        let sessions = self.sessions.read().await;
        let connections = sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        Ok(connections
            .iter()
            .map(|c| ProviderConnection {
                id: c.id.clone(),
                data: c.data.clone(),
                stream_id: c.stream_id.clone(),
            })
            .collect())
    }

    async fn get_connection(
        &self,
        session_id: &str,
        connection_id: &str,
    ) -> Result<ProviderConnection> {
        let sessions = self.sessions.read().await;
        let connections = sessions
            .get(session_id)
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        connections
            .iter()
            .find(|c| c.id == connection_id)
            .map(|c| ProviderConnection {
                id: c.id.clone(),
                data: c.data.clone(),
                stream_id: c.stream_id.clone(),
            })
            .ok_or_else(|| Error::ConnectionNotFound(connection_id.to_string()))
    }

    async fn send_signal(&self, session_id: &str, kind: &str, data: &str) -> Result<()> {
        if !self.sessions.read().await.contains_key(session_id) {
            return Err(Error::SessionNotFound(session_id.to_string()));
        }
        self.signals.write().await.push(RecordedSignal {
            session_id: session_id.to_string(),
            kind: kind.to_string(),
            data: data.to_string(),
        });
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
