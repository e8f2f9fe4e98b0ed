use crate::config::AppState;
use crate::ctx::User;
use crate::error::Result;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    Json,
};
use relay_core::{Message, MessageKind};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostInput {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// GET /messages?limit=N
pub async fn list_messages(
    State(state): State<AppState>,
    user: User,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Message>>> {
    let limit = query.limit.as_deref().and_then(parse_limit);
    let messages = state.chat.list_messages(user.name(), limit).await?;
    Ok(Json(messages))
}

/// POST /messages
pub async fn post_message(
    State(state): State<AppState>,
    user: User,
    input: std::result::Result<Json<PostInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>)> {
    let Json(input) = input?;
    info!("POST /messages - {} -> {} ({})", user.name(), input.to, input.kind);

    let kind: MessageKind = input.kind.parse()?;
    let message = state
        .chat
        .post_message(user.name(), &input.to, &input.text, kind)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

/// Leading integer of `raw`, like a lenient `parseInt`; `None` if there is none.
fn parse_limit(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    let digits_start = usize::from(raw.starts_with(['-', '+']));
    let end = raw[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(raw.len(), |i| i + digits_start);
    raw[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::parse_limit;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit("10"), Some(10));
        assert_eq!(parse_limit(" 3 "), Some(3));
        assert_eq!(parse_limit("2abc"), Some(2));
        assert_eq!(parse_limit("-4"), Some(-4));
        assert_eq!(parse_limit("abc"), None);
        assert_eq!(parse_limit(""), None);
        assert_eq!(parse_limit("-"), None);
    }
}
