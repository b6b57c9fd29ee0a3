//! Request authentication.
//!
//! Every `/api/v1` route sits behind [`require_token`]. The token comes from
//! an `Authorization: Bearer` header, or from the `token` query parameter on
//! a WebSocket handshake, where browsers cannot set headers. The resolved
//! [`OwnerId`](crate::OwnerId) is stored in the request extensions for handlers to extract.

use axum::extract::{Query, Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;

use super::error::ApiError;
use super::handlers::AppState;
use super::request::StreamParams;

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

fn presented_token(request: &Request) -> String {
    if let Some(token) = bearer_token(request.headers()) {
        return token.to_string();
    }
    if is_websocket_upgrade(request.headers()) {
        if let Ok(Query(params)) = Query::<StreamParams>::try_from_uri(request.uri()) {
            return params.token.unwrap_or_default();
        }
    }
    String::new()
}

/// Authentication middleware for API routes.
pub(crate) async fn require_token(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = presented_token(&request);
    match state.log.credentials().authenticate(&token).await {
        Ok(owner) => {
            request.extensions_mut().insert(owner);
            Ok(next.run(request).await)
        }
        Err(err) => {
            tracing::warn!(
                "Rejected unauthenticated {} {}",
                request.method(),
                request.uri().path()
            );
            Err(ApiError(err))
        }
    }
}
