//! Room-level session coordination
//!
//! `RoomGateway` wraps the session provider with the room semantics the API
//! exposes: resolve-or-create with creator marking, credential issuance with
//! per-connection metadata, participant enumeration, and signal broadcast.
//! Sessions are never cached locally; the provider is the single source of
//! truth, and every operation re-resolves by room id.

use crate::error::{Error, Result};
use crate::provider::{
    BandwidthLimits, ProviderConnection, ProviderSession, SessionProvider,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Bandwidth profile attached to potato-mode credentials, in kbps
pub const POTATO_LIMITS: BandwidthLimits = BandwidthLimits {
    max_recv: 400,
    min_recv: 150,
    max_send: 500,
    min_send: 150,
};

/// Signal type used for MOTD announcements
pub const MOTD_SIGNAL: &str = "MOTD";

/// Immutable metadata embedded in a connection at creation time
///
/// Fields default individually so connections written by an older build of
/// the service still parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionMeta {
    /// Sanitized display name
    #[serde(default)]
    pub username: String,

    /// Join time, unix seconds
    #[serde(default)]
    pub join_time: i64,

    /// Whether this connection's join created the session
    #[serde(default)]
    pub is_creator: bool,

    /// Whether this is a screen-share connection
    #[serde(default)]
    pub screenshare: bool,
}

impl ConnectionMeta {
    /// Metadata for a joining participant, stamped with the current time
    pub fn new(username: impl Into<String>, is_creator: bool, screenshare: bool) -> Self {
        Self {
            username: username.into(),
            join_time: Utc::now().timestamp(),
            is_creator,
            screenshare,
        }
    }
}

/// A participant in a room: connection id, metadata, optional media stream
#[derive(Debug, Clone)]
pub struct Participant {
    pub id: String,
    pub meta: ConnectionMeta,
    pub stream_id: Option<String>,
}

/// Room-level operations over the session provider
#[derive(Clone)]
pub struct RoomGateway {
    provider: Arc<dyn SessionProvider>,
}

impl RoomGateway {
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        Self { provider }
    }

    /// Resolve the session for a room, creating it on first access.
    ///
    /// Returns the session and whether this call created it. This is the
    /// only place creation happens implicitly. A concurrent joiner can
    /// create the session between our fetch and our create; that conflict
    /// is folded back into a fetch, and this joiner is not the creator.
    pub async fn resolve_or_create(&self, room: &str) -> Result<(ProviderSession, bool)> {
        match self.provider.get_session(room).await {
            Ok(session) => Ok((session, false)),
            Err(Error::SessionNotFound(_)) => match self.provider.create_session(room).await {
                Ok(session) => {
                    tracing::info!("Created session for room '{}'", room);
                    Ok((session, true))
                }
                Err(Error::SessionConflict(_)) => {
                    let session = self.provider.get_session(room).await?;
                    Ok((session, false))
                }
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// Session for a room; `Error::SessionNotFound` when the room has none.
    /// Read paths use this and surface the miss instead of creating.
    pub async fn get_session(&self, room: &str) -> Result<ProviderSession> {
        self.provider.get_session(room).await
    }

    /// Issue a join token carrying the participant metadata
    pub async fn issue_credential(
        &self,
        session: &ProviderSession,
        meta: &ConnectionMeta,
        potato_mode: bool,
    ) -> Result<String> {
        let data = serde_json::to_string(meta)?;
        let limits = potato_mode.then_some(POTATO_LIMITS);
        let created = self
            .provider
            .create_connection(&session.id, &data, limits)
            .await?;
        Ok(created.token)
    }

    /// Participants of a session, in the provider's order
    pub async fn list_participants(&self, session: &ProviderSession) -> Result<Vec<Participant>> {
        let connections = self.provider.list_connections(&session.id).await?;
        connections.into_iter().map(participant_from).collect()
    }

    /// One participant by connection id
    pub async fn get_participant(
        &self,
        session: &ProviderSession,
        connection_id: &str,
    ) -> Result<Participant> {
        let connection = self
            .provider
            .get_connection(&session.id, connection_id)
            .await?;
        participant_from(connection)
    }

    /// Fire-and-forget broadcast to every connection in the session
    pub async fn broadcast(&self, session: &ProviderSession, kind: &str, data: &str) -> Result<()> {
        self.provider.send_signal(&session.id, kind, data).await
    }
}

fn participant_from(connection: ProviderConnection) -> Result<Participant> {
    // Metadata this service did not write (or wrote before a format change)
    // is an upstream-data problem, never a NotFound.
    let meta = serde_json::from_str(&connection.data).map_err(|_| {
        Error::Upstream(format!(
            "unreadable metadata on connection '{}'",
            connection.id
        ))
    })?;
    Ok(Participant {
        id: connection.id,
        meta,
        stream_id: connection.stream_id,
    })
}
