// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Session extraction for the server.
//!
//! This module provides an Axum extractor for validating session tokens
//! and enforcing authentication at the server boundary.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use lastmile_api::AuthenticatedActor;
use tracing::{debug, warn};

use crate::AppState;

/// The actor behind a request's bearer token.
///
/// Extracting this validates the `Authorization: Bearer <token>` header
/// against the session service; handlers that take it never see an
/// unauthenticated request. Missing, malformed, or rejected tokens
/// answer with 401 before the handler runs.
pub struct SessionActor(pub AuthenticatedActor);

impl FromRequestParts<AppState> for SessionActor {
    type Rejection = SessionError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .ok_or_else(|| {
                debug!("Request carried no Authorization header");
                SessionError::NoToken
            })?
            .to_str()
            .map_err(|_| {
                warn!("Authorization header was not valid UTF-8");
                SessionError::NotBearer
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            warn!("Authorization header was not a bearer token");
            SessionError::NotBearer
        })?;

        let mut sessions = state.sessions.lock().await;
        let actor: AuthenticatedActor = sessions.validate(token).map_err(|e| {
            warn!(error = %e, "Session validation failed");
            SessionError::Rejected(e.to_string())
        })?;
        drop(sessions);

        debug!(actor_id = %actor.id, role = actor.role.as_str(), "Session validated");

        Ok(Self(actor))
    }
}

/// Why the session boundary refused a request.
///
/// Every variant maps to HTTP 401; the message tells the caller which
/// part of the bearer handshake went wrong.
#[derive(Debug)]
pub enum SessionError {
    /// No token accompanied the request.
    NoToken,
    /// The Authorization header was not a bearer token.
    NotBearer,
    /// The token was unknown, expired, or revoked.
    Rejected(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        let message: String = match self {
            Self::NoToken => String::from("A bearer session token is required"),
            Self::NotBearer => String::from("Send the token as 'Authorization: Bearer <token>'"),
            Self::Rejected(reason) => format!("Session refused: {reason}"),
        };

        (StatusCode::UNAUTHORIZED, message).into_response()
    }
}
