//! HTTP handlers and router
//!
//! Thin adapters from HTTP requests onto the chat service.

use crate::config::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub mod messages;
pub mod participants;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/participants",
            get(participants::list_participants).post(participants::join),
        )
        .route("/status", post(participants::heartbeat))
        .route(
            "/messages",
            get(messages::list_messages).post(messages::post_message),
        )
        .route("/health", get(health_check))
}

async fn health_check() -> &'static str {
    "OK - Chat Relay"
}
