//! Scheduled reminders attached to mission comments.
//!
//! An alert is a comment with an alert datetime. Listing scans the comment
//! log, classifies each alert against "now", and orders the result the way
//! the alert screen wants it: today's alerts first, then upcoming ones,
//! with overdue alerts parked at the bottom.

use chrono::{NaiveDateTime, ParseError};
use serde::Serialize;

use crate::db::CrmDb;
use crate::error::CrmError;
use crate::types::EntityKind;

/// Storage format for alert datetimes.
pub const ALERT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// How urgent an alert is relative to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertUrgency {
    /// The alert day is over.
    Late,
    /// Due earlier today.
    Due,
    /// Still in the future.
    Upcoming,
}

impl AlertUrgency {
    fn classify(alert_at: NaiveDateTime, now: NaiveDateTime) -> AlertUrgency {
        if alert_at.date() < now.date() {
            AlertUrgency::Late
        } else if alert_at < now {
            AlertUrgency::Due
        } else {
            AlertUrgency::Upcoming
        }
    }
}

/// One alert, denormalized for display.
#[derive(Debug, Clone, Serialize)]
pub struct AlertItem {
    pub alert_at: NaiveDateTime,
    pub urgency: AlertUrgency,
    pub mission_code: String,
    pub mission_title: String,
    pub comment_id: i64,
    pub comment: String,
    pub next_action: Option<String>,
}

fn parse_alert(value: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(value, ALERT_FORMAT)
}

/// List every pending alert across all missions.
///
/// Ordering: alerts for today first, then future ones, both soonest first;
/// overdue alerts go to the bottom.
pub fn list_alerts(db: &CrmDb, now: NaiveDateTime) -> Result<Vec<AlertItem>, CrmError> {
    let mut current = Vec::new();
    let mut past = Vec::new();

    for comment in db.comments_with_alerts()? {
        if comment.entity_kind != EntityKind::Mission {
            continue;
        }
        let Some(raw) = comment.alert_at.as_deref() else {
            continue;
        };
        let alert_at = match parse_alert(raw) {
            Ok(dt) => dt,
            Err(e) => {
                log::warn!("skipping unparsable alert on comment {}: {e}", comment.id);
                continue;
            }
        };
        let Some(mission) = db.get_mission(&comment.entity_code)? else {
            continue;
        };

        let item = AlertItem {
            alert_at,
            urgency: AlertUrgency::classify(alert_at, now),
            mission_code: mission.code,
            mission_title: mission.title,
            comment_id: comment.id,
            comment: comment.body,
            next_action: comment.next_action,
        };
        if item.urgency == AlertUrgency::Late {
            past.push(item);
        } else {
            current.push(item);
        }
    }

    // comments_with_alerts returns rows sorted by alert_at already; keep
    // that order within each bucket.
    current.extend(past);
    Ok(current)
}

/// Alerts of one mission only, same ordering as [`list_alerts`].
pub fn mission_alerts(
    db: &CrmDb,
    mission_code: &str,
    now: NaiveDateTime,
) -> Result<Vec<AlertItem>, CrmError> {
    let mut alerts = list_alerts(db, now)?;
    alerts.retain(|a| a.mission_code == mission_code);
    Ok(alerts)
}

/// Cancel an alert: the datetime is cleared, the comment stays.
pub fn cancel_alert(db: &CrmDb, comment_id: i64) -> Result<(), CrmError> {
    if !db.clear_alert(comment_id)? {
        return Err(CrmError::NotFound {
            kind: "comment",
            code: comment_id.to_string(),
        });
    }
    log::info!("alert cancelled on comment {comment_id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{sample_contact, sample_mission, test_db};
    use crate::db::NewComment;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 30)
            .expect("date")
            .and_hms_opt(12, 0, 0)
            .expect("time")
    }

    fn add_alert(db: &CrmDb, mission: &str, alert_at: &str, body: &str) -> i64 {
        db.add_comment(&NewComment {
            entity_kind: EntityKind::Mission,
            entity_code: mission,
            author: "jdoe",
            body,
            attachment: None,
            alert_at: Some(alert_at),
            next_action: Some("follow up"),
        })
        .expect("add comment")
    }

    fn seeded_db() -> CrmDb {
        let db = test_db();
        db.upsert_contact(&sample_contact("c000000", "Durand"))
            .expect("contact");
        db.upsert_mission(&sample_mission("m000000", "Big deal", "c000000"))
            .expect("mission");
        db
    }

    #[test]
    fn test_ordering_today_future_then_past() {
        let db = seeded_db();
        add_alert(&db, "m000000", "2026-08-28T09:00:00", "late");
        add_alert(&db, "m000000", "2026-08-30T09:00:00", "due today");
        add_alert(&db, "m000000", "2026-09-15T09:00:00", "upcoming");

        let alerts = list_alerts(&db, now()).expect("list");
        let bodies: Vec<&str> = alerts.iter().map(|a| a.comment.as_str()).collect();
        assert_eq!(bodies, vec!["due today", "upcoming", "late"]);
        assert_eq!(alerts[0].urgency, AlertUrgency::Due);
        assert_eq!(alerts[1].urgency, AlertUrgency::Upcoming);
        assert_eq!(alerts[2].urgency, AlertUrgency::Late);
    }

    #[test]
    fn test_later_today_is_upcoming() {
        let db = seeded_db();
        add_alert(&db, "m000000", "2026-08-30T18:30:00", "tonight");

        let alerts = list_alerts(&db, now()).expect("list");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].urgency, AlertUrgency::Upcoming);
        assert_eq!(alerts[0].next_action.as_deref(), Some("follow up"));
    }

    #[test]
    fn test_cancel_alert_removes_from_listing() {
        let db = seeded_db();
        let id = add_alert(&db, "m000000", "2026-09-15T09:00:00", "to cancel");

        cancel_alert(&db, id).expect("cancel");
        assert!(list_alerts(&db, now()).expect("list").is_empty());

        // The comment survives its alert.
        let comment = db.get_comment(id).expect("get").expect("present");
        assert_eq!(comment.body, "to cancel");
        assert!(comment.alert_at.is_none());

        assert!(matches!(
            cancel_alert(&db, 9999),
            Err(CrmError::NotFound { .. })
        ));
    }

    #[test]
    fn test_mission_alerts_filters_by_code() {
        let db = seeded_db();
        db.upsert_mission(&sample_mission("m000001", "Other deal", "c000000"))
            .expect("mission");
        add_alert(&db, "m000000", "2026-09-01T09:00:00", "mine");
        add_alert(&db, "m000001", "2026-09-02T09:00:00", "other");

        let alerts = mission_alerts(&db, "m000000", now()).expect("list");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].comment, "mine");
    }
}
