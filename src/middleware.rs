//! Middlewares for routes.

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::Result;
use crate::token::Claims;
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";

/// Middleware requiring a valid bearer token on the request.
///
/// Decoded [`Claims`] are exposed to handlers through request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .map(|header| header.strip_prefix(BEARER).unwrap_or(header))
        .ok_or(ServerError::Unauthorized)?;

    let claims = state.token.decode(token)?;
    req.extensions_mut().insert::<Claims>(claims);

    Ok(next.run(req).await)
}
