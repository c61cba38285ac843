//! Email notification for mission changes.
//!
//! Watchers are the assignee plus the CC list, minus whoever performed the
//! edit. A notification goes out when there is something to say (a change
//! line or a new comment) and someone to say it to. Delivery is one-shot:
//! no retries, no confirmation.

use std::sync::Mutex;

use crate::db::{CrmDb, DbMission};
use crate::error::CrmError;

/// A composed, ready-to-send message.
#[derive(Debug, Clone, PartialEq)]
pub struct MailMessage {
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}

/// Outbound mail seam. The CLI wires in [`LogMailer`]; tests use
/// [`MemoryMailer`] to observe what would have been sent.
pub trait Mailer {
    fn send(&self, message: &MailMessage) -> Result<(), CrmError>;
}

/// Writes the message to the log instead of a wire. Stands in until an
/// SMTP relay is configured.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &MailMessage) -> Result<(), CrmError> {
        log::info!(
            "mail to {}: {} ({} lines)",
            message.to.join(", "),
            message.subject,
            message.body.lines().count()
        );
        log::debug!("mail body:\n{}", message.body);
        Ok(())
    }
}

/// Test double capturing every message.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().expect("mailer lock").clone()
    }
}

impl Mailer for MemoryMailer {
    fn send(&self, message: &MailMessage) -> Result<(), CrmError> {
        self.sent.lock().expect("mailer lock").push(message.clone());
        Ok(())
    }
}

/// Watcher ids for a mission: the set of assignee + CC, minus the editor,
/// in first-occurrence order.
pub fn watchers(mission: &DbMission, editor: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in mission.assignee.iter().chain(mission.cc.iter()) {
        if id != editor && !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids
}

/// Compose the notification for a mission change, or None when there is
/// nothing to send: no changes and no comment, or nobody to notify.
///
/// Recipient ids resolve to email addresses through the user directory;
/// ids without a directory entry are dropped from the recipient list.
pub fn mission_notification(
    db: &CrmDb,
    mission: &DbMission,
    editor: &str,
    changes: &[String],
    comment: Option<&str>,
    created: bool,
) -> Result<Option<MailMessage>, CrmError> {
    let has_comment = comment.is_some_and(|c| !c.trim().is_empty());
    if changes.is_empty() && !has_comment {
        return Ok(None);
    }

    let mut to = Vec::new();
    for id in watchers(mission, editor) {
        if let Some(user) = db.get_user(&id)? {
            to.push(user.email);
        }
    }
    if to.is_empty() {
        return Ok(None);
    }

    let subject = if created {
        format!("[CRM] New mission: {}", mission.title)
    } else {
        format!("[CRM] Mission updated: {}", mission.title)
    };

    let mut body = String::new();
    for change in changes {
        body.push_str(change);
        body.push('\n');
    }
    if let Some(comment) = comment {
        let comment = comment.trim();
        if !comment.is_empty() {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str("Comment:\n");
            body.push_str(comment);
            body.push('\n');
        }
    }

    Ok(Some(MailMessage { to, subject, body }))
}
