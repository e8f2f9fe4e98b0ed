//! Which messages a viewer may see.

use crate::models::Message;

/// Reserved recipient meaning "everyone in the room".
pub const BROADCAST_TARGET: &str = "Todos";

/// A message is visible to its sender, its recipient, and to everyone when
/// it targets [`BROADCAST_TARGET`].
pub fn is_visible(message: &Message, viewer: &str) -> bool {
    message.from == viewer || message.to == viewer || message.to == BROADCAST_TARGET
}
