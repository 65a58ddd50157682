//! Per-member welcome delivery.
//!
//! For each member:
//! 1. Skip if the ledger already holds them
//! 2. Look up the group name and compose the welcome text
//! 3. Send the DM through the [`GroupClient`]
//! 4. Record the member only if the send succeeded
//!
//! Batches run strictly in roster order, one send at a time.

use chrono::Local;
use uuid::Uuid;

use subbot_common::types::{
    BatchReport, GroupEvent, GroupId, MemberId, NotificationEvent, NotifyOutcome,
};
use subbot_ledger::NotificationLedger;

use crate::GroupClient;
use crate::message::compose_welcome;

/// Welcomes members of one configured group, exactly once each.
pub struct MembershipNotifier<C> {
    client: C,
    ledger: NotificationLedger,
    group_id: GroupId,
}

impl<C: GroupClient> MembershipNotifier<C> {
    pub fn new(client: C, ledger: NotificationLedger, group_id: GroupId) -> Self {
        Self {
            client,
            ledger,
            group_id,
        }
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn ledger(&self) -> &NotificationLedger {
        &self.ledger
    }

    /// Welcome `member_id` unless they were welcomed before.
    ///
    /// Lookup and send failures are logged and reported as
    /// [`NotifyOutcome::Failed`]; the member is left unrecorded.
    pub async fn notify_member(&mut self, group_id: &GroupId, member_id: &MemberId) -> NotifyOutcome {
        if self.ledger.contains(member_id) {
            tracing::debug!(member_id = %member_id, "Member already welcomed, skipping");
            return NotifyOutcome::Skipped;
        }

        let info = match self.client.group_info(group_id).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(
                    group_id = %group_id,
                    member_id = %member_id,
                    error = %e,
                    "Group lookup failed, member not notified"
                );
                return NotifyOutcome::Failed;
            }
        };

        let timestamp = Local::now();
        let event = NotificationEvent {
            id: Uuid::new_v4(),
            group_id: group_id.clone(),
            member_id: member_id.clone(),
            text: compose_welcome(&info.name, &timestamp),
            timestamp,
        };

        if let Err(e) = self
            .client
            .send_direct_message(&event.member_id, &event.text)
            .await
        {
            tracing::warn!(
                notification_id = %event.id,
                member_id = %event.member_id,
                error = %e,
                "Welcome message failed, member stays eligible"
            );
            return NotifyOutcome::Failed;
        }

        if let Err(e) = self.ledger.record(event.member_id.clone()) {
            tracing::warn!(
                notification_id = %event.id,
                member_id = %event.member_id,
                error = %e,
                "Welcome sent but ledger write failed"
            );
        }

        tracing::info!(
            notification_id = %event.id,
            group_id = %event.group_id,
            member_id = %event.member_id,
            sent_at = %event.timestamp.to_rfc3339(),
            "Welcome message sent"
        );
        NotifyOutcome::Sent
    }

    /// Welcome every current member of `group_id` not yet in the ledger.
    pub async fn notify_all_current_members(&mut self, group_id: &GroupId) -> BatchReport {
        let members = match self.client.group_members(group_id).await {
            Ok(members) => members,
            Err(e) => {
                tracing::warn!(group_id = %group_id, error = %e, "Could not fetch group roster");
                return BatchReport::default();
            }
        };

        tracing::info!(group_id = %group_id, members = members.len(), "Checking group roster");
        self.notify_members(group_id, &members).await
    }

    /// Welcome each of `members` in order. A failure never stops the batch.
    pub async fn notify_members(&mut self, group_id: &GroupId, members: &[MemberId]) -> BatchReport {
        let mut report = BatchReport::default();
        for member_id in members {
            let outcome = self.notify_member(group_id, member_id).await;
            report.add(outcome);
        }

        if report.total() > 0 {
            tracing::info!(
                group_id = %group_id,
                sent = report.sent,
                skipped = report.skipped,
                failed = report.failed,
                "Roster pass complete"
            );
        }
        report
    }

    /// React to a connection trigger.
    ///
    /// Returns `None` for events that involve no roster pass, including
    /// events for groups other than the configured one.
    pub async fn handle_event(&mut self, event: GroupEvent) -> Option<BatchReport> {
        match event {
            GroupEvent::ConnectionOpen => {
                let group_id = self.group_id.clone();
                Some(self.notify_all_current_members(&group_id).await)
            }
            GroupEvent::MemberAdded { group_id, members } => {
                if group_id != self.group_id {
                    tracing::debug!(group_id = %group_id, "Ignoring event for other group");
                    return None;
                }
                Some(self.notify_members(&group_id, &members).await)
            }
            GroupEvent::BotAddedToGroup { group_id, added_by } => {
                if group_id != self.group_id {
                    tracing::debug!(group_id = %group_id, "Ignoring event for other group");
                    return None;
                }
                tracing::info!(group_id = %group_id, added_by = %added_by, "Bot added to group");
                let mut report = BatchReport::default();
                report.add(self.notify_member(&group_id, &added_by).await);
                Some(report)
            }
            GroupEvent::ConnectionClosed { reason } => {
                tracing::warn!(reason = %reason, "Connection closed");
                None
            }
        }
    }
}
