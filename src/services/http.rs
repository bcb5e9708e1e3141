//! HTTP/JSON game service client using `reqwest`.
//!
//! Endpoints:
//!
//! | Operation          | Request                             |
//! |--------------------|-------------------------------------|
//! | create session     | `POST   /games`                     |
//! | fetch state        | `GET    /games/{id}`                |
//! | submit move        | `POST   /games/{id}/move`           |
//! | request AI move    | `POST   /games/{id}/algo-move`      |
//! | advance one move   | `POST   /games/{id}/auto-step`      |
//! | delete session     | `DELETE /games/{id}`                |
//!
//! Non-success statuses are mapped to [`CubeFourError::Http`] carrying the
//! body's `detail` (or `message`) text; `404` becomes
//! [`CubeFourError::SessionNotFound`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{CubeFourError, Result};
use crate::protocol::{
    AlgoMoveRequest, AlgoMoveResponse, AutoStepRequest, GameState, MoveRequest, MoveResponse,
    NewGameResponse, SessionId,
};
use crate::service::GameService;

/// Error body shape produced by the service (`{"detail": ...}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

/// A [`GameService`] backed by the HTTP API.
///
/// Cheap to clone; clones share the underlying connection pool.
///
/// # Cancel Safety
///
/// Dropping any returned future aborts the in-flight request, so the
/// controller's cancellation scope interrupts calls at the transport level.
#[derive(Debug, Clone)]
pub struct HttpGameService {
    client: Client,
    base_url: String,
}

impl HttpGameService {
    /// Create a service client for `base_url` (e.g. `http://localhost:8001`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Create a service client reusing an existing `reqwest::Client`
    /// (custom TLS, proxies, default timeouts).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { client, base_url }
    }

    /// Returns the base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn game_url(&self, session: &str, suffix: &str) -> String {
        format!("{}/games/{session}{suffix}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        if !status.is_success() {
            let message = error_message(status, &body);
            tracing::debug!(status = status.as_u16(), %message, "game service returned an error");
            if status == StatusCode::NOT_FOUND {
                return Err(CubeFourError::SessionNotFound);
            }
            return Err(CubeFourError::Http {
                status: status.as_u16(),
                message,
            });
        }

        if body.is_empty() {
            return Ok(serde_json::from_slice(b"{}")?);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl GameService for HttpGameService {
    async fn create_session(&self) -> Result<SessionId> {
        let url = format!("{}/games", self.base_url);
        let created: NewGameResponse = self.send(self.client.post(url)).await?;
        match created.game_id {
            Some(id) if !id.is_empty() => {
                tracing::info!(session = %id, "game session created");
                Ok(id)
            }
            _ => Err(CubeFourError::InvalidResponse(
                "game service did not return a game_id".into(),
            )),
        }
    }

    async fn fetch_state(&self, session: &str) -> Result<GameState> {
        self.send(self.client.get(self.game_url(session, ""))).await
    }

    async fn submit_move(&self, session: &str, mv: MoveRequest) -> Result<MoveResponse> {
        let request = self.client.post(self.game_url(session, "/move")).json(&mv);
        self.send(request).await
    }

    async fn request_ai_move(
        &self,
        session: &str,
        req: AlgoMoveRequest,
    ) -> Result<AlgoMoveResponse> {
        let request = self
            .client
            .post(self.game_url(session, "/algo-move"))
            .json(&req);
        self.send(request).await
    }

    async fn advance_one_move(&self, session: &str, req: AutoStepRequest) -> Result<MoveResponse> {
        let request = self
            .client
            .post(self.game_url(session, "/auto-step"))
            .json(&req);
        self.send(request).await
    }

    async fn delete_session(&self, session: &str) -> Result<()> {
        let _: serde_json::Value = self
            .send(self.client.delete(self.game_url(session, "")))
            .await?;
        tracing::debug!(session = %session, "game session deleted");
        Ok(())
    }
}

fn map_reqwest_error(e: reqwest::Error) -> CubeFourError {
    if e.is_timeout() {
        CubeFourError::Timeout
    } else {
        CubeFourError::Transport(e.to_string())
    }
}

/// Extracts a human-readable message from an error response body.
fn error_message(status: StatusCode, body: &[u8]) -> String {
    let parsed = serde_json::from_slice::<ErrorBody>(body).ok();
    let from_body = parsed.and_then(|b| match b.detail {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Null) | None => b.message,
        Some(other) => Some(other.to_string()),
    });
    from_body
        .filter(|m| !m.is_empty())
        .or_else(|| status.canonical_reason().map(str::to_owned))
        .unwrap_or_else(|| "Network error".to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slashes_are_trimmed() {
        let service = HttpGameService::new("http://localhost:8001//");
        assert_eq!(service.base_url(), "http://localhost:8001");
        assert_eq!(
            service.game_url("abc", "/move"),
            "http://localhost:8001/games/abc/move"
        );
    }

    #[test]
    fn error_message_prefers_detail_string() {
        let msg = error_message(
            StatusCode::REQUEST_TIMEOUT,
            br#"{"detail":"AI timeout: 30s"}"#,
        );
        assert_eq!(msg, "AI timeout: 30s");
    }

    #[test]
    fn error_message_falls_back_to_message_then_reason_phrase() {
        let msg = error_message(StatusCode::BAD_REQUEST, br#"{"message":"bad column"}"#);
        assert_eq!(msg, "bad column");
        let msg = error_message(StatusCode::BAD_GATEWAY, b"<html>");
        assert_eq!(msg, "Bad Gateway");
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let msg = error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"detail":[{"loc":["body","x"]}]}"#,
        );
        assert!(msg.contains("loc"));
    }
}
