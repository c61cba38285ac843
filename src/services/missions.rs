//! Mission creation and edit flows: validation, code allocation, change
//! tracking, the comment log and watcher notification.

use std::collections::HashMap;

use chrono::Utc;

use crate::alerts::ALERT_FORMAT;
use crate::changelog::{get_changes, initial_changes, MissionUpdate};
use crate::db::{CrmDb, DbMission, NewComment};
use crate::error::CrmError;
use crate::notify::{mission_notification, Mailer};
use crate::types::EntityKind;
use crate::util::generate_code;

/// The user directory as an id-to-name map, for rendering change lines.
pub fn user_directory(db: &CrmDb) -> Result<HashMap<String, String>, CrmError> {
    let mut users = HashMap::new();
    for user in db.list_users()? {
        users.insert(user.id, user.name);
    }
    Ok(users)
}

fn validate(update: &MissionUpdate) -> Result<(), CrmError> {
    if update.title.trim().is_empty() {
        return Err(CrmError::mandatory("title"));
    }
    if let Some(probability) = update.probability {
        if !(0..=100).contains(&probability) {
            return Err(CrmError::Validation {
                field: "probability",
                reason: format!("must be between 0 and 100, got {probability}"),
            });
        }
    }
    if let Some(amount) = update.amount {
        if amount < 0.0 {
            return Err(CrmError::Validation {
                field: "amount",
                reason: format!("must not be negative, got {amount}"),
            });
        }
    }
    Ok(())
}

fn check_contacts_exist(db: &CrmDb, contacts: &[String]) -> Result<(), CrmError> {
    for code in contacts {
        if db.get_contact(code)?.is_none() {
            return Err(CrmError::Validation {
                field: "contacts",
                reason: format!("unknown contact: {code}"),
            });
        }
    }
    Ok(())
}

fn mission_row(
    code: &str,
    update: &MissionUpdate,
    contacts: Vec<String>,
    created_at: String,
) -> DbMission {
    DbMission {
        code: code.to_string(),
        title: update.title.trim().to_string(),
        description: update.description.clone(),
        amount: update.amount,
        probability: update.probability,
        deadline: update.deadline.map(|d| d.format("%Y-%m-%d").to_string()),
        status: update.status,
        assignee: update.assignee.clone(),
        cc: update.cc.clone(),
        contacts,
        created_at,
        updated_at: Utc::now().to_rfc3339(),
    }
}

/// Write the comment log entry for a create or edit.
///
/// A written comment carries the alert/attachment/next-action payload with
/// it. A payload without comment text amends the previous comment instead
/// of creating an empty one; with no previous comment an empty-bodied row
/// is written so the payload is not lost.
fn record_comment(db: &CrmDb, code: &str, editor: &str, update: &MissionUpdate) -> Result<(), CrmError> {
    let alert_at = update.alert_at.map(|dt| dt.format(ALERT_FORMAT).to_string());
    let attachment = update.attachment.as_deref();
    let next_action = update.next_action.as_deref();
    let body = update.comment.as_deref().unwrap_or("").trim();

    let has_payload = alert_at.is_some() || attachment.is_some() || next_action.is_some();
    if body.is_empty() && !has_payload {
        return Ok(());
    }

    if body.is_empty()
        && db.amend_last_comment(
            EntityKind::Mission,
            code,
            attachment,
            alert_at.as_deref(),
            next_action,
        )?
    {
        return Ok(());
    }

    db.add_comment(&NewComment {
        entity_kind: EntityKind::Mission,
        entity_code: code,
        author: editor,
        body,
        attachment,
        alert_at: alert_at.as_deref(),
        next_action,
    })?;
    Ok(())
}

fn notify(
    db: &CrmDb,
    mailer: &dyn Mailer,
    mission: &DbMission,
    editor: &str,
    changes: &[String],
    comment: Option<&str>,
    created: bool,
) -> Result<(), CrmError> {
    if let Some(message) = mission_notification(db, mission, editor, changes, comment, created)? {
        mailer.send(&message)?;
    }
    Ok(())
}

/// Create a mission linked to `contacts` and return its allocated code.
/// Watchers are notified of the initial field values.
pub fn create_mission(
    db: &CrmDb,
    mailer: &dyn Mailer,
    editor: &str,
    update: MissionUpdate,
    contacts: Vec<String>,
) -> Result<String, CrmError> {
    validate(&update)?;
    if contacts.is_empty() {
        return Err(CrmError::LastContact);
    }
    check_contacts_exist(db, &contacts)?;

    let code = db.with_transaction(|db| {
        let code = generate_code(&db.mission_codes()?, 'm');
        let now = Utc::now().to_rfc3339();
        db.upsert_mission(&mission_row(&code, &update, contacts, now))?;
        record_comment(db, &code, editor, &update)?;
        log::info!("mission {code} created by {editor}");
        Ok::<_, CrmError>(code)
    })?;

    let mission = db.get_mission(&code)?.ok_or_else(|| CrmError::NotFound {
        kind: "mission",
        code: code.clone(),
    })?;
    let users = user_directory(db)?;
    let changes = initial_changes(&update, &users);
    notify(
        db,
        mailer,
        &mission,
        editor,
        &changes,
        update.comment.as_deref(),
        true,
    )?;
    Ok(code)
}

/// Edit a mission and return the change lines that were reported.
///
/// Submitting the form untouched with no comment is a no-notification
/// no-op apart from the row update itself.
pub fn edit_mission(
    db: &CrmDb,
    mailer: &dyn Mailer,
    editor: &str,
    code: &str,
    update: MissionUpdate,
) -> Result<Vec<String>, CrmError> {
    validate(&update)?;
    let old = db.get_mission(code)?.ok_or_else(|| CrmError::NotFound {
        kind: "mission",
        code: code.to_string(),
    })?;

    let users = user_directory(db)?;
    let changes = get_changes(&old, &update, &users);

    db.with_transaction(|db| {
        db.upsert_mission(&mission_row(
            code,
            &update,
            old.contacts.clone(),
            old.created_at.clone(),
        ))?;
        record_comment(db, code, editor, &update)?;
        Ok::<_, CrmError>(())
    })?;

    let mission = db.get_mission(code)?.ok_or_else(|| CrmError::NotFound {
        kind: "mission",
        code: code.to_string(),
    })?;
    notify(
        db,
        mailer,
        &mission,
        editor,
        &changes,
        update.comment.as_deref(),
        false,
    )?;
    Ok(changes)
}

/// Link another contact to a mission. Linking an already linked contact is
/// a no-op.
pub fn add_mission_contact(db: &CrmDb, code: &str, contact: &str) -> Result<(), CrmError> {
    let mission = get_mission(db, code)?;
    if db.get_contact(contact)?.is_none() {
        return Err(CrmError::Validation {
            field: "contacts",
            reason: format!("unknown contact: {contact}"),
        });
    }
    if mission.contacts.iter().any(|c| c == contact) {
        return Ok(());
    }
    let mut contacts = mission.contacts;
    contacts.push(contact.to_string());
    db.set_mission_contacts(code, &contacts)?;
    Ok(())
}

/// Unlink a contact from a mission. The last link cannot be removed.
pub fn remove_mission_contact(db: &CrmDb, code: &str, contact: &str) -> Result<(), CrmError> {
    let mission = get_mission(db, code)?;
    let contacts: Vec<String> = mission
        .contacts
        .into_iter()
        .filter(|c| c != contact)
        .collect();
    if contacts.is_empty() {
        return Err(CrmError::LastContact);
    }
    db.set_mission_contacts(code, &contacts)?;
    Ok(())
}

/// Look up a mission, erroring when the code is unknown.
pub fn get_mission(db: &CrmDb, code: &str) -> Result<DbMission, CrmError> {
    db.get_mission(code)?.ok_or_else(|| CrmError::NotFound {
        kind: "mission",
        code: code.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{sample_contact, test_db};
    use crate::db::DbUser;
    use crate::notify::MemoryMailer;
    use crate::types::MissionStatus;
    use chrono::NaiveDate;

    fn seeded_db() -> CrmDb {
        let db = test_db();
        db.upsert_contact(&sample_contact("c000000", "Durand"))
            .expect("contact");
        for (id, name, email) in [
            ("jdoe", "Jane Doe", "jane@example.com"),
            ("asmith", "Alan Smith", "alan@example.com"),
        ] {
            db.upsert_user(&DbUser {
                id: id.to_string(),
                name: name.to_string(),
                email: email.to_string(),
            })
            .expect("seed user");
        }
        db
    }

    fn update(title: &str) -> MissionUpdate {
        MissionUpdate {
            title: title.to_string(),
            description: None,
            amount: None,
            probability: None,
            deadline: None,
            status: MissionStatus::Opportunity,
            assignee: None,
            cc: Vec::new(),
            comment: None,
            attachment: None,
            alert_at: None,
            next_action: None,
        }
    }

    #[test]
    fn test_create_validates_fields() {
        let db = seeded_db();
        let mailer = MemoryMailer::new();

        let err = create_mission(&db, &mailer, "jdoe", update(" "), vec!["c000000".into()])
            .expect_err("blank title");
        assert!(matches!(err, CrmError::Validation { field: "title", .. }));

        let mut bad = update("Deal");
        bad.probability = Some(150);
        let err = create_mission(&db, &mailer, "jdoe", bad, vec!["c000000".into()])
            .expect_err("probability out of range");
        assert!(matches!(
            err,
            CrmError::Validation {
                field: "probability",
                ..
            }
        ));

        let err = create_mission(&db, &mailer, "jdoe", update("Deal"), vec![])
            .expect_err("no contacts");
        assert!(matches!(err, CrmError::LastContact));

        let err = create_mission(&db, &mailer, "jdoe", update("Deal"), vec!["c999999".into()])
            .expect_err("unknown contact");
        assert!(matches!(
            err,
            CrmError::Validation {
                field: "contacts",
                ..
            }
        ));
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn test_create_notifies_watchers_with_initial_values() {
        let db = seeded_db();
        let mailer = MemoryMailer::new();

        let mut new = update("Big deal");
        new.assignee = Some("jdoe".to_string());
        new.amount = Some(1000.0);
        let code = create_mission(&db, &mailer, "asmith", new, vec!["c000000".into()])
            .expect("create");
        assert_eq!(code, "m000000");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["jane@example.com".to_string()]);
        assert_eq!(sent[0].subject, "[CRM] New mission: Big deal");
        assert!(sent[0].body.contains("Amount: 1000"));
        assert!(sent[0].body.contains("Assigned to Jane Doe"));
    }

    #[test]
    fn test_create_by_assignee_notifies_nobody() {
        let db = seeded_db();
        let mailer = MemoryMailer::new();

        let mut new = update("Solo deal");
        new.assignee = Some("jdoe".to_string());
        create_mission(&db, &mailer, "jdoe", new, vec!["c000000".into()]).expect("create");
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn test_edit_reports_and_mails_single_change_line() {
        let db = seeded_db();
        let mailer = MemoryMailer::new();

        let mut new = update("Big deal");
        new.assignee = Some("jdoe".to_string());
        let code =
            create_mission(&db, &mailer, "jdoe", new, vec!["c000000".into()]).expect("create");

        let mission = get_mission(&db, &code).expect("get");
        let mut edit = MissionUpdate::unchanged(&mission);
        edit.status = MissionStatus::Project;
        let changes = edit_mission(&db, &mailer, "asmith", &code, edit).expect("edit");

        assert_eq!(changes, vec!["Status changed from Opportunity to Project"]);
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "[CRM] Mission updated: Big deal");
        assert!(sent[0].body.contains("Status changed from Opportunity to Project"));

        let stored = get_mission(&db, &code).expect("get");
        assert_eq!(stored.status, MissionStatus::Project);
        assert_eq!(stored.created_at, mission.created_at);
        assert_eq!(stored.contacts, vec!["c000000".to_string()]);
    }

    #[test]
    fn test_untouched_edit_notifies_nobody() {
        let db = seeded_db();
        let mailer = MemoryMailer::new();

        let mut new = update("Quiet deal");
        new.assignee = Some("jdoe".to_string());
        let code =
            create_mission(&db, &mailer, "jdoe", new, vec!["c000000".into()]).expect("create");

        let mission = get_mission(&db, &code).expect("get");
        let changes = edit_mission(
            &db,
            &mailer,
            "asmith",
            &code,
            MissionUpdate::unchanged(&mission),
        )
        .expect("edit");
        assert!(changes.is_empty());
        assert!(mailer.sent().is_empty());
    }

    #[test]
    fn test_payload_only_edit_amends_last_comment() {
        let db = seeded_db();
        let mailer = MemoryMailer::new();

        let mut new = update("Deal");
        new.comment = Some("kickoff call".to_string());
        let code =
            create_mission(&db, &mailer, "jdoe", new, vec!["c000000".into()]).expect("create");

        let mission = get_mission(&db, &code).expect("get");
        let mut edit = MissionUpdate::unchanged(&mission);
        edit.alert_at = NaiveDate::from_ymd_opt(2026, 9, 15)
            .expect("date")
            .and_hms_opt(9, 0, 0);
        edit_mission(&db, &mailer, "jdoe", &code, edit).expect("edit");

        let comments = db.comments_for(EntityKind::Mission, &code).expect("list");
        assert_eq!(comments.len(), 1, "payload rides on the existing comment");
        assert_eq!(comments[0].body, "kickoff call");
        assert_eq!(
            comments[0].alert_at.as_deref(),
            Some("2026-09-15T09:00:00")
        );
    }

    #[test]
    fn test_edit_with_comment_appends_comment_with_payload() {
        let db = seeded_db();
        let mailer = MemoryMailer::new();
        let code = create_mission(&db, &mailer, "jdoe", update("Deal"), vec!["c000000".into()])
            .expect("create");

        let mission = get_mission(&db, &code).expect("get");
        let mut edit = MissionUpdate::unchanged(&mission);
        edit.comment = Some("sent the offer".to_string());
        edit.attachment = Some("uploads/offer.pdf".to_string());
        edit_mission(&db, &mailer, "jdoe", &code, edit).expect("edit");

        let comments = db.comments_for(EntityKind::Mission, &code).expect("list");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "sent the offer");
        assert_eq!(comments[0].attachment.as_deref(), Some("uploads/offer.pdf"));
    }

    #[test]
    fn test_contact_links_guard_the_last_one() {
        let db = seeded_db();
        db.upsert_contact(&sample_contact("c000001", "Lemoine"))
            .expect("contact");
        let mailer = MemoryMailer::new();
        let code = create_mission(&db, &mailer, "jdoe", update("Deal"), vec!["c000000".into()])
            .expect("create");

        add_mission_contact(&db, &code, "c000001").expect("add");
        // Adding twice changes nothing.
        add_mission_contact(&db, &code, "c000001").expect("add again");
        let mission = get_mission(&db, &code).expect("get");
        assert_eq!(mission.contacts.len(), 2);

        remove_mission_contact(&db, &code, "c000000").expect("remove");
        assert!(matches!(
            remove_mission_contact(&db, &code, "c000001"),
            Err(CrmError::LastContact)
        ));
    }

    #[test]
    fn test_edit_unknown_mission_fails() {
        let db = seeded_db();
        let mailer = MemoryMailer::new();
        assert!(matches!(
            edit_mission(&db, &mailer, "jdoe", "m999999", update("Ghost")),
            Err(CrmError::NotFound { .. })
        ));
    }
}
