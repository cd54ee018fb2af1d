//! Unified HTTP API for usher
//!
//! Merges the room router and the provider webhook into a single axum
//! `Router` with CORS, request tracing, and a shared error envelope.
//!
//! ## Endpoint Map
//!
//! | Route                            | Method   | Description                     |
//! |----------------------------------|----------|---------------------------------|
//! | `/health`                        | GET      | Load balancer health probe      |
//! | `/api/room/:room/token`          | POST     | Join a room, returns a token    |
//! | `/api/room/:room/connections`    | GET      | Connections with metadata       |
//! | `/api/room/:room/connections/:id`| GET      | Single connection               |
//! | `/api/room/:room/motd`           | GET/POST | Room message of the day         |
//! | `/api/room/:room/cmd/:cmd`       | POST     | Run an in-room command          |
//! | `/internal/webhook`              | POST     | Session provider events         |

use crate::cache::RoomCache;
use crate::commands::CommandDispatcher;
use crate::error::Error;
use crate::rooms::{ConnectionMeta, RoomGateway, MOTD_SIGNAL};
use crate::sanitize;
use crate::webhook::{webhook_router, WebhookState};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Longest accepted room id, matching the provider's session id limits
const MAX_ROOM_LEN: usize = 64;

/// Combined application state shared by the room handlers
#[derive(Clone)]
pub struct AppState {
    pub rooms: RoomGateway,
    pub cache: RoomCache,
    pub commands: CommandDispatcher,
}

impl AppState {
    pub fn new(rooms: RoomGateway, cache: RoomCache) -> Self {
        let commands = CommandDispatcher::new(rooms.clone(), cache.clone());
        Self {
            rooms,
            cache,
            commands,
        }
    }
}

/// Build the complete usher HTTP application
///
/// Merges the room and webhook routers, adds tracing and CORS middleware,
/// and returns a single `Router` ready to be served by `axum::serve`.
pub fn build_app(state: AppState, webhook: WebhookState, cors_origins: &[String]) -> Router {
    let cors = build_cors(cors_origins);

    Router::new()
        .route("/health", get(health_check))
        .merge(room_router(state))
        .merge(webhook_router(webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn room_router(state: AppState) -> Router {
    Router::new()
        .route("/api/room/:room/token", post(issue_token))
        .route("/api/room/:room/connections", get(list_connections))
        .route("/api/room/:room/connections/:id", get(get_connection))
        .route("/api/room/:room/motd", get(get_motd).post(update_motd))
        .route("/api/room/:room/cmd/:cmd", post(run_command))
        .with_state(state)
}

// =============================================================================
// Root handlers
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Room handlers
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenRequest {
    username: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    potato_mode: bool,
    #[serde(default, deserialize_with = "lenient_bool")]
    screenshare: bool,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
}

/// POST /api/room/:room/token
///
/// Joins the room, creating its session on first join. The first joiner is
/// recorded as the creator in connection metadata.
async fn issue_token(
    State(state): State<AppState>,
    Path(room): Path<String>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, ErrorResponse> {
    validate_room(&room)?;
    let Json(request) = body.map_err(bad_body)?;

    let username = sanitize::clean_username(&request.username);
    if username.is_empty() {
        return Err(error_reply(Error::InvalidInput(
            "username is empty after sanitization".to_string(),
        )));
    }

    let (session, is_creator) = state
        .rooms
        .resolve_or_create(&room)
        .await
        .map_err(error_reply)?;
    let meta = ConnectionMeta::new(username, is_creator, request.screenshare);
    let token = state
        .rooms
        .issue_credential(&session, &meta, request.potato_mode)
        .await
        .map_err(error_reply)?;

    Ok(Json(TokenResponse { token }))
}

#[derive(Serialize)]
struct ConnectionEntry {
    id: String,
    data: ConnectionMeta,
    stream_id: Option<String>,
}

/// GET /api/room/:room/connections
async fn list_connections(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<Vec<ConnectionEntry>>, ErrorResponse> {
    validate_room(&room)?;
    let session = state.rooms.get_session(&room).await.map_err(error_reply)?;
    let participants = state
        .rooms
        .list_participants(&session)
        .await
        .map_err(error_reply)?;

    let entries = participants
        .into_iter()
        .map(|p| ConnectionEntry {
            id: p.id,
            data: p.meta,
            stream_id: p.stream_id,
        })
        .collect();
    Ok(Json(entries))
}

#[derive(Serialize)]
struct ConnectionDetail {
    id: String,
    stream_id: Option<String>,
}

/// GET /api/room/:room/connections/:id
async fn get_connection(
    State(state): State<AppState>,
    Path((room, id)): Path<(String, String)>,
) -> Result<Json<ConnectionDetail>, ErrorResponse> {
    validate_room(&room)?;
    let session = state.rooms.get_session(&room).await.map_err(error_reply)?;
    let participant = state
        .rooms
        .get_participant(&session, &id)
        .await
        .map_err(error_reply)?;

    Ok(Json(ConnectionDetail {
        id: participant.id,
        stream_id: participant.stream_id,
    }))
}

#[derive(Debug, Deserialize)]
struct MotdRequest {
    motd: String,
}

#[derive(Serialize)]
struct MotdResponse {
    motd: Option<String>,
}

/// GET /api/room/:room/motd
async fn get_motd(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<MotdResponse>, ErrorResponse> {
    validate_room(&room)?;
    state.rooms.get_session(&room).await.map_err(error_reply)?;
    let motd = state.cache.get_motd(&room).await.map_err(error_reply)?;
    Ok(Json(MotdResponse { motd }))
}

/// POST /api/room/:room/motd
///
/// Stores the sanitized MOTD and announces it to the room. Sanitization
/// happens before the session lookup, so an empty-after-cleaning message is
/// a 400 even for rooms with no session.
async fn update_motd(
    State(state): State<AppState>,
    Path(room): Path<String>,
    body: Result<Json<MotdRequest>, JsonRejection>,
) -> Result<Json<MotdResponse>, ErrorResponse> {
    validate_room(&room)?;
    let Json(request) = body.map_err(bad_body)?;

    let motd = sanitize::clean(&request.motd, sanitize::MAX_MOTD_LEN, sanitize::MOTD_TAGS);
    if motd.is_empty() {
        return Err(error_reply(Error::InvalidInput(
            "motd is empty after sanitization".to_string(),
        )));
    }

    let session = state.rooms.get_session(&room).await.map_err(error_reply)?;
    state
        .cache
        .set_motd(&room, &motd)
        .await
        .map_err(error_reply)?;
    state
        .rooms
        .broadcast(&session, MOTD_SIGNAL, &motd)
        .await
        .map_err(error_reply)?;
    tracing::info!("Updated motd for room '{}'", room);

    Ok(Json(MotdResponse { motd: Some(motd) }))
}

#[derive(Debug, Deserialize)]
struct CommandRequest {
    args: String,
}

#[derive(Serialize)]
struct CommandResponse {
    output: String,
}

/// POST /api/room/:room/cmd/:cmd
async fn run_command(
    State(state): State<AppState>,
    Path((room, cmd)): Path<(String, String)>,
    body: Result<Json<CommandRequest>, JsonRejection>,
) -> Result<Json<CommandResponse>, ErrorResponse> {
    validate_room(&room)?;
    let Json(request) = body.map_err(bad_body)?;

    let args = sanitize::clean(&request.args, sanitize::MAX_ARGS_LEN, &[]);
    let output = state
        .commands
        .dispatch(&cmd, &room, &args)
        .await
        .map_err(error_reply)?;

    Ok(Json(CommandResponse { output }))
}

// =============================================================================
// Error envelope
// =============================================================================

/// Error reply shape shared by every handler
pub type ErrorResponse = (StatusCode, Json<ApiError>);

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

/// API error detail
#[derive(Debug, Serialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn with_code(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_code("NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_code("BAD_REQUEST", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::with_code("UNAUTHORIZED", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::with_code("CONFLICT", message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::with_code("UPSTREAM_ERROR", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_code("INTERNAL_ERROR", message)
    }
}

/// Map a service error to its HTTP reply.
///
/// Provider and cache failures become 502 with a generic message; the cause
/// is logged, never echoed to the client. A missing session or connection is
/// only ever a 404, upstream outages must not masquerade as one.
pub(crate) fn error_reply(err: Error) -> ErrorResponse {
    match err {
        Error::InvalidInput(message) => {
            (StatusCode::BAD_REQUEST, Json(ApiError::bad_request(message)))
        }
        Error::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(ApiError::unauthorized("invalid credentials")),
        ),
        Error::SessionNotFound(room) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!(
                "no session for room '{}'",
                room
            ))),
        ),
        Error::ConnectionNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("connection '{}' not found", id))),
        ),
        Error::UnknownCommand(name) => (
            StatusCode::NOT_FOUND,
            Json(ApiError::not_found(format!("unknown command '{}'", name))),
        ),
        Error::SessionConflict(room) => (
            StatusCode::CONFLICT,
            Json(ApiError::conflict(format!(
                "session for room '{}' already exists",
                room
            ))),
        ),
        Error::Upstream(message) => {
            tracing::error!("Upstream failure: {}", message);
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiError::upstream("session provider request failed")),
            )
        }
        Error::Http(e) => {
            tracing::error!("Provider transport failure: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiError::upstream("session provider unreachable")),
            )
        }
        Error::Cache(e) => {
            tracing::error!("Cache failure: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiError::upstream("cache unavailable")),
            )
        }
        other => {
            tracing::error!("Internal error: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::internal("internal error")),
            )
        }
    }
}

fn bad_body(rejection: JsonRejection) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::bad_request(rejection.body_text())),
    )
}

/// Room ids travel into provider request paths, so only the provider's
/// session id alphabet is accepted.
fn validate_room(room: &str) -> Result<(), ErrorResponse> {
    let valid = !room.is_empty()
        && room.len() <= MAX_ROOM_LEN
        && room
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(error_reply(Error::InvalidInput(format!(
            "invalid room id '{}'",
            room
        ))))
    }
}

/// Accept JSON `true` and nothing else; clients send all kinds of values
/// for the optional flags.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(matches!(value, serde_json::Value::Bool(true)))
}

// =============================================================================
// CORS
// =============================================================================

fn build_cors(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        let parsed: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryStore};
    use crate::provider::memory::MemorySessionProvider;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn make_app() -> (Router, Arc<MemorySessionProvider>, RoomCache) {
        let provider = Arc::new(MemorySessionProvider::new());
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let cache = RoomCache::new(store);
        let rooms = RoomGateway::new(provider.clone());
        let state = AppState::new(rooms, cache.clone());
        let webhook = WebhookState {
            cache: cache.clone(),
            secret: "hook-secret".to_string(),
        };
        (build_app(state, webhook, &[]), provider, cache)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 1024 * 64)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let (app, _, _) = make_app();
        let resp = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_token_requires_a_json_body() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/room/lobby/token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_token_requires_a_username() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"potato_mode": true}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_token_rejects_markup_only_username() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "<b></b>"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_first_join_creates_session_and_marks_creator() {
        let (app, _, _) = make_app();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "ann"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json["token"].as_str().unwrap().starts_with("tok_"));

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "bob"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(get_request("/api/room/lobby/connections"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["data"]["username"], "ann");
        assert_eq!(entries[0]["data"]["is_creator"], true);
        assert_eq!(entries[1]["data"]["username"], "bob");
        assert_eq!(entries[1]["data"]["is_creator"], false);
    }

    #[tokio::test]
    async fn test_token_sanitizes_username() {
        let (app, _, _) = make_app();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "a<script>x</script>nn%/"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(get_request("/api/room/lobby/connections"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json[0]["data"]["username"], "axnn");
    }

    #[tokio::test]
    async fn test_token_flags_accept_only_json_true() {
        let (app, provider, _) = make_app();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "ann", "potato_mode": "yes", "screenshare": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(get_request("/api/room/lobby/connections"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json[0]["data"]["screenshare"], false);

        let id = json[0]["id"].as_str().unwrap();
        assert_eq!(provider.limits_for("lobby", id).await, None);
    }

    #[tokio::test]
    async fn test_potato_mode_limits_bandwidth() {
        let (app, provider, _) = make_app();

        app.clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "ann", "potato_mode": true}),
            ))
            .await
            .unwrap();

        let resp = app
            .oneshot(get_request("/api/room/lobby/connections"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        let id = json[0]["id"].as_str().unwrap();
        assert_eq!(
            provider.limits_for("lobby", id).await,
            Some(crate::rooms::POTATO_LIMITS)
        );
    }

    #[tokio::test]
    async fn test_invalid_room_id_is_rejected() {
        let (app, _, _) = make_app();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/room/bad%20room/token",
                serde_json::json!({"username": "ann"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let long_room = "r".repeat(MAX_ROOM_LEN + 1);
        let resp = app
            .oneshot(get_request(&format!("/api/room/{}/motd", long_room)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_connections_of_unknown_room_is_404() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(get_request("/api/room/lobby/connections"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_single_connection_detail() {
        let (app, provider, _) = make_app();

        app.clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "ann"}),
            ))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(get_request("/api/room/lobby/connections"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        let id = json[0]["id"].as_str().unwrap().to_string();

        provider.publish_stream("lobby", &id, "str_CAM").await.unwrap();

        let resp = app
            .clone()
            .oneshot(get_request(&format!("/api/room/lobby/connections/{}", id)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["id"], id);
        assert_eq!(json["stream_id"], "str_CAM");

        let resp = app
            .oneshot(get_request("/api/room/lobby/connections/con_missing"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_motd_roundtrip_with_allowed_tags() {
        let (app, provider, _) = make_app();

        app.clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "ann"}),
            ))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/room/lobby/motd",
                serde_json::json!({"motd": "hi <b>all</b> <script>x</script>"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["motd"], "hi <b>all</b> x");

        let resp = app
            .oneshot(get_request("/api/room/lobby/motd"))
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["motd"], "hi <b>all</b> x");

        let signals = provider.signals().await;
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].kind, "MOTD");
        assert_eq!(signals[0].data, "hi <b>all</b> x");
    }

    #[tokio::test]
    async fn test_motd_is_null_until_set() {
        let (app, _, _) = make_app();

        app.clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "ann"}),
            ))
            .await
            .unwrap();

        let resp = app
            .oneshot(get_request("/api/room/lobby/motd"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json["motd"].is_null());
    }

    #[tokio::test]
    async fn test_motd_of_unknown_room_is_404() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(get_request("/api/room/lobby/motd"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_motd_is_400_even_without_a_session() {
        // Sanitization runs before the session lookup
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/motd",
                serde_json::json!({"motd": "<marquee>"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_post_motd_to_unknown_room_is_404() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/motd",
                serde_json::json!({"motd": "hello"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ping_command() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/cmd/ping",
                serde_json::json!({"args": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["output"], "pong");
    }

    #[tokio::test]
    async fn test_unknown_command_is_404() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/cmd/reboot",
                serde_json::json!({"args": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_command_requires_args_field() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/cmd/ping",
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_command_args_are_sanitized_before_dispatch() {
        let (app, _, cache) = make_app();

        app.clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "ann"}),
            ))
            .await
            .unwrap();

        // Tags are stripped from args at the endpoint, so none survive into
        // a command-applied motd.
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/cmd/motd",
                serde_json::json!({"args": "hi <b>all</b>"}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["output"], "motd applied");
        assert_eq!(
            cache.get_motd("lobby").await.unwrap().as_deref(),
            Some("hi all")
        );
    }

    #[tokio::test]
    async fn test_command_on_dead_room_is_400() {
        let (app, _, _) = make_app();
        let resp = app
            .oneshot(post_json(
                "/api/room/lobby/cmd/list",
                serde_json::json!({"args": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_room_lifecycle_end_to_end() {
        let (app, _, _) = make_app();

        // Join, set a motd, inspect the roster
        app.clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "ann"}),
            ))
            .await
            .unwrap();
        app.clone()
            .oneshot(post_json(
                "/api/room/lobby/motd",
                serde_json::json!({"motd": "welcome"}),
            ))
            .await
            .unwrap();

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/room/lobby/cmd/list",
                serde_json::json!({"args": ""}),
            ))
            .await
            .unwrap();
        let json = body_json(resp).await;
        let output = json["output"].as_str().unwrap();
        assert!(output.contains("NAME: ann"));

        // Provider tears the session down, the webhook clears the motd
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/internal/webhook")
                    .header("authorization", "hook-secret")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"event":"sessionDestroyed","sessionId":"lobby"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        // The next joiner of the same room starts without a motd
        app.clone()
            .oneshot(post_json(
                "/api/room/lobby/token",
                serde_json::json!({"username": "bea"}),
            ))
            .await
            .unwrap();
        let resp = app
            .oneshot(get_request("/api/room/lobby/motd"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json["motd"].is_null());
    }

    #[test]
    fn test_build_cors_empty_origins() {
        let _cors = build_cors(&[]);
    }

    #[test]
    fn test_build_cors_with_origins() {
        let _cors = build_cors(&[
            "http://localhost:1420".to_string(),
            "https://rooms.example.com".to_string(),
        ]);
    }
}
