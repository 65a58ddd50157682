use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a chat participant (e.g. `34600111222@c.us`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MemberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque identifier of a group chat (e.g. `120363000000000000@g.us`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Group metadata needed to compose a welcome message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub name: String,
}

/// A single welcome delivery attempt. Built per send, never persisted.
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub id: Uuid,
    pub group_id: GroupId,
    pub member_id: MemberId,
    pub timestamp: DateTime<Local>,
    pub text: String,
}

/// Result of notifying one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Welcome delivered and recorded in the ledger.
    Sent,
    /// Member was already in the ledger.
    Skipped,
    /// Lookup or delivery failed; member stays eligible.
    Failed,
}

/// Counters for one pass over a roster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl BatchReport {
    pub fn add(&mut self, outcome: NotifyOutcome) {
        match outcome {
            NotifyOutcome::Sent => self.sent += 1,
            NotifyOutcome::Skipped => self.skipped += 1,
            NotifyOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.sent + self.skipped + self.failed
    }
}

/// Triggers delivered by the bridge connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupEvent {
    /// Session (re)established; the full roster should be examined.
    ConnectionOpen,
    /// Members joined a group.
    MemberAdded {
        group_id: GroupId,
        members: Vec<MemberId>,
    },
    /// The bot itself was added to a group by `added_by`.
    #[serde(rename = "bot_added")]
    BotAddedToGroup { group_id: GroupId, added_by: MemberId },
    /// Session lost.
    ConnectionClosed {
        #[serde(default)]
        reason: String,
    },
}

impl std::fmt::Display for GroupEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupEvent::ConnectionOpen => write!(f, "connection_open"),
            GroupEvent::MemberAdded { .. } => write!(f, "member_added"),
            GroupEvent::BotAddedToGroup { .. } => write!(f, "bot_added"),
            GroupEvent::ConnectionClosed { .. } => write!(f, "connection_closed"),
        }
    }
}
