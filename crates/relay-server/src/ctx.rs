use crate::error::{ApiError, Result};
use axum::{extract::FromRequestParts, http::request::Parts};

/// Name of the participant acting on a request, taken from the `User` header.
#[derive(Clone, Debug)]
pub struct User(pub String);

impl User {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for User
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .headers
            .get("user")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| User(v.to_string()))
            .ok_or(ApiError::MissingUserHeader)
    }
}
