//! usher - control plane for room-based media sessions
//!
//! usher sits between browser clients and a media session provider. Clients
//! never talk to the provider directly; they ask usher for a join token and
//! usher creates the room's session on demand, embeds sanitized participant
//! metadata, and hands back a one-time credential. Per-room side state (the
//! message of the day) lives in redis with a bounded lifetime and is torn
//! down when the provider reports the session destroyed.
//!
//! ## Architecture
//!
//! ```text
//!               ┌──────────────────────────────────┐
//! clients ────▶ │              usher               │
//!               │  ┌──────────┐    ┌────────────┐  │
//!               │  │  rooms   │    │   cache    │  │
//!               │  │ gateway  │    │   (motd)   │  │
//!               │  └────┬─────┘    └─────┬──────┘  │
//!               └───────┼────────────────┼─────────┘
//!                       ▼                ▼
//!             session provider         redis
//!             (OpenVidu REST API)
//! ```
//!
//! ## Modules
//!
//! - [`api`]: HTTP router, handlers, and the shared error envelope
//! - [`rooms`]: Room-level session coordination and credential issuance
//! - [`provider`]: Session provider abstraction with OpenVidu and in-memory backends
//! - [`cache`]: MOTD side state over redis or an in-memory store
//! - [`commands`]: In-room commands (`ping`, `motd`, `list`)
//! - [`sanitize`]: Text sanitization for user-supplied strings
//! - [`webhook`]: Provider lifecycle event intake
//! - [`config`]: Configuration management

pub mod api;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;
pub mod provider;
pub mod rooms;
pub mod sanitize;
pub mod webhook;

pub use config::UsherConfig;
pub use error::{Error, Result};
