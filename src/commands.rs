//! In-room command execution
//!
//! Commands are short imperative actions a participant runs against a room
//! (`ping`, `motd`, `list`). Unlike the read endpoints, commands address a
//! room the caller believes is live, so a missing session is an input error
//! rather than a missing resource.

use crate::cache::RoomCache;
use crate::error::{Error, Result};
use crate::provider::ProviderSession;
use crate::rooms::{RoomGateway, MOTD_SIGNAL};
use crate::sanitize;

/// Commands accepted by the command endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Liveness check, touches nothing
    Ping,
    /// Replace the room MOTD and announce it
    Motd,
    /// Show the current roster
    List,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ping" => Some(Self::Ping),
            "motd" => Some(Self::Motd),
            "list" => Some(Self::List),
            _ => None,
        }
    }
}

/// Resolves command names and runs them against a room
#[derive(Clone)]
pub struct CommandDispatcher {
    rooms: RoomGateway,
    cache: RoomCache,
}

impl CommandDispatcher {
    pub fn new(rooms: RoomGateway, cache: RoomCache) -> Self {
        Self { rooms, cache }
    }

    /// Run a command by name. `args` is expected to be pre-sanitized by the
    /// endpoint; commands with stricter needs re-clean it themselves.
    pub async fn dispatch(&self, name: &str, room: &str, args: &str) -> Result<String> {
        let command =
            Command::from_name(name).ok_or_else(|| Error::UnknownCommand(name.to_string()))?;

        match command {
            Command::Ping => Ok("pong".to_string()),
            Command::Motd => self.apply_motd(room, args).await,
            Command::List => self.list_roster(room).await,
        }
    }

    async fn apply_motd(&self, room: &str, args: &str) -> Result<String> {
        // MOTD limits are tighter than the general argument limits
        let motd = sanitize::clean(args, sanitize::MAX_MOTD_LEN, sanitize::MOTD_TAGS);
        if motd.is_empty() {
            return Err(Error::InvalidInput("motd is empty".to_string()));
        }

        let session = self.live_session(room).await?;
        self.cache.set_motd(room, &motd).await?;
        self.rooms.broadcast(&session, MOTD_SIGNAL, &motd).await?;
        tracing::info!("Updated motd for room '{}' via command", room);
        Ok("motd applied".to_string())
    }

    async fn list_roster(&self, room: &str) -> Result<String> {
        let session = self.live_session(room).await?;
        let participants = self.rooms.list_participants(&session).await?;
        let lines: Vec<String> = participants
            .iter()
            .map(|p| format!("ID: {} NAME: {}", p.id, p.meta.username))
            .collect();
        Ok(lines.join("\n"))
    }

    async fn live_session(&self, room: &str) -> Result<ProviderSession> {
        match self.rooms.get_session(room).await {
            Err(Error::SessionNotFound(_)) => Err(Error::InvalidInput(format!(
                "room '{}' has no active session",
                room
            ))),
            other => other,
        }
    }
}
