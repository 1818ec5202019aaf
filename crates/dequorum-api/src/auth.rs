//! Requester identity as handed over by the upstream authenticator.
//!
//! The authenticator sets a trusted header (`auth.user_header`) on every
//! request it lets through. A missing or blank header means anonymous.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;
use std::sync::Arc;

use crate::state::AppState;

/// The requester, if signed in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaybeUser(pub Option<String>);

/// A signed-in requester. Anonymous requests are redirected to the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireUser(pub String);

/// Rejection for [`RequireUser`]: `303` to the login page carrying `next`
#[derive(Debug)]
pub struct LoginRedirect {
    pub location: String,
}

impl IntoResponse for LoginRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.location).into_response()
    }
}

pub fn user_from_headers(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .map(str::to_string)
}

/// `login_url` with the original path and query appended as `next`
pub fn login_location(login_url: &str, next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!("{}{}next={}", login_url, separator, encoded)
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        Ok(Self(user_from_headers(&parts.headers, &state.config.auth.user_header)))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = LoginRedirect;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match user_from_headers(&parts.headers, &state.config.auth.user_header) {
            Some(user) => Ok(Self(user)),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                tracing::debug!(next = %next, "Anonymous request needs a login");
                Err(LoginRedirect {
                    location: login_location(&state.config.auth.login_url, next),
                })
            }
        }
    }
}
