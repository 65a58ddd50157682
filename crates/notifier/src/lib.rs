//! Membership notifier — decides who gets a welcome DM and delivers it.
//!
//! The notifier consumes roster triggers from the connection layer, checks
//! each member against the ledger and sends the welcome text through a
//! [`GroupClient`]. Members are only recorded after a confirmed send, so a
//! failed delivery is retried on the next event or restart.

pub mod membership;
pub mod message;

use async_trait::async_trait;

use subbot_common::error::AppError;
use subbot_common::types::{GroupId, GroupInfo, MemberId};

pub use membership::MembershipNotifier;
pub use message::compose_welcome;

/// Operations the notifier needs from the chat connection.
#[async_trait]
pub trait GroupClient: Send + Sync {
    /// Group metadata. Fails with [`AppError::NotFound`] for unknown groups.
    async fn group_info(&self, group_id: &GroupId) -> Result<GroupInfo, AppError>;

    /// Current roster, in the order the connection reports it. May be empty.
    async fn group_members(&self, group_id: &GroupId) -> Result<Vec<MemberId>, AppError>;

    /// Deliver `text` as a private message to `recipient`.
    async fn send_direct_message(&self, recipient: &MemberId, text: &str) -> Result<(), AppError>;
}
