use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RelayError;
use crate::visibility::BROADCAST_TARGET;

/// Text of the notice posted when a participant joins.
pub const JOIN_NOTICE: &str = "entra na sala...";
/// Text of the notice posted when a participant is evicted.
pub const LEAVE_NOTICE: &str = "sai da sala...";

/// A registered participant and the last time it signaled liveness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    #[serde(rename = "lastStatus", with = "chrono::serde::ts_milliseconds")]
    pub last_seen: DateTime<Utc>,
}

impl Participant {
    pub fn new(name: impl Into<String>, last_seen: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            last_seen,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "message")]
    Broadcast,
    #[serde(rename = "private_message")]
    Private,
    /// System-generated join/leave notice.
    #[serde(rename = "status")]
    Status,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Broadcast => "message",
            MessageKind::Private => "private_message",
            MessageKind::Status => "status",
        }
    }

    /// Whether a client may post messages of this kind.
    pub fn is_client_postable(&self) -> bool {
        !matches!(self, MessageKind::Status)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(MessageKind::Broadcast),
            "private_message" => Ok(MessageKind::Private),
            "status" => Ok(MessageKind::Status),
            other => Err(RelayError::validation(format!(
                "unknown message type: {other:?}"
            ))),
        }
    }
}

/// A stored chat message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub from: String,
    pub to: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub time: String,
}

/// A message that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from: String,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
    pub time: Option<String>,
}

impl NewMessage {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        text: impl Into<String>,
        kind: MessageKind,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind,
            time: None,
        }
    }

    /// Status notice from `name` addressed to everyone.
    pub fn status(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, BROADCAST_TARGET, text, MessageKind::Status)
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Freeze into a stored message, stamping `at` if no time was given.
    pub fn into_message(self, at: DateTime<Utc>) -> Message {
        Message {
            from: self.from,
            to: self.to,
            text: self.text,
            kind: self.kind,
            time: self.time.unwrap_or_else(|| format_time(at)),
        }
    }
}

/// Format a timestamp the way messages carry it: `HH:MM:SS`.
pub fn format_time(at: DateTime<Utc>) -> String {
    at.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_participant_wire_format() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let json = serde_json::to_value(Participant::new("alice", at)).unwrap();
        assert_eq!(json["name"], "alice");
        assert_eq!(json["lastStatus"], 1_700_000_000_123_i64);
    }

    #[test]
    fn test_message_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&MessageKind::Private).unwrap(),
            "\"private_message\""
        );
        assert_eq!("message".parse::<MessageKind>().unwrap(), MessageKind::Broadcast);
        assert!("shout".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_time_is_stamped_only_when_absent() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 7).unwrap();
        let stamped = NewMessage::new("a", "b", "hi", MessageKind::Private).into_message(at);
        assert_eq!(stamped.time, "09:05:07");

        let kept = NewMessage::new("a", "b", "hi", MessageKind::Private)
            .with_time("23:59:59")
            .into_message(at);
        assert_eq!(kept.time, "23:59:59");
    }

    #[test]
    fn test_status_notice_targets_everyone() {
        let notice = NewMessage::status("bob", LEAVE_NOTICE);
        assert_eq!(notice.to, BROADCAST_TARGET);
        assert_eq!(notice.kind, MessageKind::Status);
        assert!(!notice.kind.is_client_postable());
    }
}
