//! Change tracking for mission edits.
//!
//! An edit form is diffed against the stored snapshot to produce ordered,
//! human-readable change lines. A few fields need special rendering:
//! the assignee resolves to a display name, the CC list reports a set
//! difference, the status shows its label, and an attachment shows only
//! its filename.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::db::DbMission;
use crate::types::MissionStatus;
use crate::util::attachment_filename;

/// Submitted mission edit. `comment` and the alert/attachment payload ride
/// along with the field values, as on the original edit form.
#[derive(Debug, Clone)]
pub struct MissionUpdate {
    pub title: String,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub probability: Option<i64>,
    pub deadline: Option<NaiveDate>,
    pub status: MissionStatus,
    pub assignee: Option<String>,
    pub cc: Vec<String>,
    pub comment: Option<String>,
    pub attachment: Option<String>,
    pub alert_at: Option<NaiveDateTime>,
    pub next_action: Option<String>,
}

impl MissionUpdate {
    /// An update that leaves every field of `mission` as it is.
    pub fn unchanged(mission: &DbMission) -> MissionUpdate {
        MissionUpdate {
            title: mission.title.clone(),
            description: mission.description.clone(),
            amount: mission.amount,
            probability: mission.probability,
            deadline: mission
                .deadline
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            status: mission.status,
            assignee: mission.assignee.clone(),
            cc: mission.cc.clone(),
            comment: None,
            attachment: None,
            alert_at: None,
            next_action: None,
        }
    }
}

/// Resolve a user id to a display name, silently falling back to the raw
/// id when the directory has no entry for it.
fn user_name<'a>(users: &'a HashMap<String, String>, id: &'a str) -> &'a str {
    users.get(id).map(String::as_str).unwrap_or(id)
}

fn blank_or(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "(empty)",
    }
}

/// Diff a stored mission against a submitted edit.
///
/// Returns one line per changed field, in schema order. Editing nothing
/// returns an empty list; callers use that to suppress notification.
pub fn get_changes(
    old: &DbMission,
    update: &MissionUpdate,
    users: &HashMap<String, String>,
) -> Vec<String> {
    let mut changes = Vec::new();

    if old.title != update.title {
        changes.push(format!(
            "Title changed from \"{}\" to \"{}\"",
            old.title, update.title
        ));
    }
    if old.description != update.description {
        changes.push(format!(
            "Description changed from \"{}\" to \"{}\"",
            blank_or(old.description.as_deref()),
            blank_or(update.description.as_deref()),
        ));
    }
    if old.amount != update.amount {
        changes.push(format!(
            "Amount changed from {} to {}",
            old.amount.map_or_else(|| "0".to_string(), |a| format!("{a}")),
            update.amount.map_or_else(|| "0".to_string(), |a| format!("{a}")),
        ));
    }
    if old.probability != update.probability {
        changes.push(format!(
            "Probability changed from {} to {}",
            old.probability.unwrap_or(0),
            update.probability.unwrap_or(0),
        ));
    }
    let new_deadline = update.deadline.map(|d| d.format("%Y-%m-%d").to_string());
    if old.deadline != new_deadline {
        changes.push(format!(
            "Deadline changed from {} to {}",
            blank_or(old.deadline.as_deref()),
            blank_or(new_deadline.as_deref()),
        ));
    }
    if old.status != update.status {
        changes.push(format!(
            "Status changed from {} to {}",
            old.status.label(),
            update.status.label()
        ));
    }
    if old.assignee != update.assignee {
        let old_name = old
            .assignee
            .as_deref()
            .map(|id| user_name(users, id))
            .unwrap_or("(Not Assigned)");
        let new_name = update
            .assignee
            .as_deref()
            .map(|id| user_name(users, id))
            .unwrap_or("(Not Assigned)");
        changes.push(format!("Assigned to {new_name} (was {old_name})"));
    }
    for added in update.cc.iter().filter(|id| !old.cc.contains(id)) {
        changes.push(format!("CC: {} added", user_name(users, added)));
    }
    for removed in old.cc.iter().filter(|id| !update.cc.contains(id)) {
        changes.push(format!("CC: {} removed", user_name(users, removed)));
    }
    if let Some(attachment) = update.attachment.as_deref() {
        changes.push(format!(
            "New attachment: {}",
            attachment_filename(attachment)
        ));
    }

    changes
}

/// Change lines for a freshly created mission: every set field, same
/// rendering as an edit.
pub fn initial_changes(update: &MissionUpdate, users: &HashMap<String, String>) -> Vec<String> {
    let mut changes = vec![format!("Title: \"{}\"", update.title)];
    if let Some(description) = update.description.as_deref() {
        changes.push(format!("Description: \"{description}\""));
    }
    if let Some(amount) = update.amount {
        changes.push(format!("Amount: {amount}"));
    }
    if let Some(probability) = update.probability {
        changes.push(format!("Probability: {probability}"));
    }
    if let Some(deadline) = update.deadline {
        changes.push(format!("Deadline: {}", deadline.format("%Y-%m-%d")));
    }
    changes.push(format!("Status: {}", update.status.label()));
    if let Some(assignee) = update.assignee.as_deref() {
        changes.push(format!("Assigned to {}", user_name(users, assignee)));
    }
    for cc in &update.cc {
        changes.push(format!("CC: {}", user_name(users, cc)));
    }
    if let Some(attachment) = update.attachment.as_deref() {
        changes.push(format!(
            "New attachment: {}",
            attachment_filename(attachment)
        ));
    }
    changes
}
