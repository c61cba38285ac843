//! Contact creation, edits and the detail view with its pipeline rollup.

use chrono::Utc;

use crate::db::{CrmDb, DbComment, DbContact, DbMission, NewComment};
use crate::error::CrmError;
use crate::rollup::Rollup;
use crate::types::{ContactStatus, EntityKind};
use crate::util::generate_code;

/// Field values for a contact create or edit form.
#[derive(Debug, Clone)]
pub struct ContactForm {
    pub company: Option<String>,
    pub lastname: String,
    pub firstname: Option<String>,
    pub phone: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
    pub position: Option<String>,
    pub description: Option<String>,
    pub status: ContactStatus,
}

/// Everything the contact screen shows: the record, its company title,
/// the freshly computed rollup, linked missions and the comment log.
#[derive(Debug)]
pub struct ContactDetail {
    pub contact: DbContact,
    pub company_title: Option<String>,
    pub rollup: Rollup,
    pub missions: Vec<DbMission>,
    pub comments: Vec<DbComment>,
}

fn validate(db: &CrmDb, form: &ContactForm) -> Result<(), CrmError> {
    if form.lastname.trim().is_empty() {
        return Err(CrmError::mandatory("lastname"));
    }
    if let Some(company) = form.company.as_deref() {
        if db.get_company(company)?.is_none() {
            return Err(CrmError::Validation {
                field: "company",
                reason: format!("unknown company: {company}"),
            });
        }
    }
    Ok(())
}

fn append_comment(
    db: &CrmDb,
    code: &str,
    author: &str,
    comment: Option<&str>,
) -> Result<(), CrmError> {
    let Some(body) = comment else { return Ok(()) };
    let body = body.trim();
    if body.is_empty() {
        return Ok(());
    }
    db.add_comment(&NewComment {
        entity_kind: EntityKind::Contact,
        entity_code: code,
        author,
        body,
        attachment: None,
        alert_at: None,
        next_action: None,
    })?;
    Ok(())
}

/// Create a contact and return its allocated code.
pub fn create_contact(
    db: &CrmDb,
    author: &str,
    form: ContactForm,
    comment: Option<&str>,
) -> Result<String, CrmError> {
    validate(db, &form)?;

    db.with_transaction(|db| {
        let code = generate_code(&db.contact_codes()?, 'c');
        let now = Utc::now().to_rfc3339();
        db.upsert_contact(&DbContact {
            code: code.clone(),
            company: form.company,
            lastname: form.lastname.trim().to_string(),
            firstname: form.firstname,
            phone: form.phone,
            mobile: form.mobile,
            email: form.email,
            position: form.position,
            description: form.description,
            status: form.status,
            created_at: now.clone(),
            updated_at: now,
        })?;
        append_comment(db, &code, author, comment)?;
        log::info!("contact {code} created by {author}");
        Ok(code)
    })
}

/// Edit a contact in place, appending the comment if one was written.
pub fn update_contact(
    db: &CrmDb,
    author: &str,
    code: &str,
    form: ContactForm,
    comment: Option<&str>,
) -> Result<(), CrmError> {
    validate(db, &form)?;
    let old = db.get_contact(code)?.ok_or_else(|| CrmError::NotFound {
        kind: "contact",
        code: code.to_string(),
    })?;

    db.with_transaction(|db| {
        db.upsert_contact(&DbContact {
            code: code.to_string(),
            company: form.company,
            lastname: form.lastname.trim().to_string(),
            firstname: form.firstname,
            phone: form.phone,
            mobile: form.mobile,
            email: form.email,
            position: form.position,
            description: form.description,
            status: form.status,
            created_at: old.created_at,
            updated_at: Utc::now().to_rfc3339(),
        })?;
        append_comment(db, code, author, comment)?;
        Ok(())
    })
}

/// Display title: "Lastname Firstname (Company)".
pub fn contact_title(db: &CrmDb, contact: &DbContact) -> Result<String, CrmError> {
    let mut title = contact.display_name();
    if let Some(company_code) = contact.company.as_deref() {
        // A dangling company reference renders without the parenthesis.
        if let Some(company) = db.get_company(company_code)? {
            title.push_str(&format!(" ({})", company.title));
        }
    }
    Ok(title)
}

/// Assemble the contact detail: record, company, rollup (recomputed from
/// scratch on every call), missions and comments.
pub fn contact_detail(db: &CrmDb, code: &str) -> Result<ContactDetail, CrmError> {
    let contact = db.get_contact(code)?.ok_or_else(|| CrmError::NotFound {
        kind: "contact",
        code: code.to_string(),
    })?;

    let company_title = match contact.company.as_deref() {
        Some(company_code) => db.get_company(company_code)?.map(|c| c.title),
        None => None,
    };
    let missions = db.missions_for_contact(code)?;
    let rollup = Rollup::compute(code, &missions);
    let comments = db.comments_for(EntityKind::Contact, code)?;

    Ok(ContactDetail {
        contact,
        company_title,
        rollup,
        missions,
        comments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{sample_company, sample_mission, test_db};
    use crate::types::MissionStatus;

    fn form(lastname: &str) -> ContactForm {
        ContactForm {
            company: None,
            lastname: lastname.to_string(),
            firstname: None,
            phone: None,
            mobile: None,
            email: None,
            position: None,
            description: None,
            status: ContactStatus::Lead,
        }
    }

    #[test]
    fn test_lastname_is_mandatory() {
        let db = test_db();
        let err = create_contact(&db, "jdoe", form(""), None).expect_err("should fail");
        assert!(matches!(
            err,
            CrmError::Validation {
                field: "lastname",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_company_is_rejected() {
        let db = test_db();
        let mut contact = form("Durand");
        contact.company = Some("c999999".to_string());
        let err = create_contact(&db, "jdoe", contact, None).expect_err("should fail");
        assert!(matches!(
            err,
            CrmError::Validation {
                field: "company",
                ..
            }
        ));
    }

    #[test]
    fn test_create_and_title_with_company() {
        let db = test_db();
        db.upsert_company(&sample_company("c000000", "Acme"))
            .expect("company");

        let mut new = form("Durand");
        new.firstname = Some("Marie".to_string());
        new.company = Some("c000000".to_string());
        let code = create_contact(&db, "jdoe", new, Some("intro call")).expect("create");
        assert_eq!(code, "c000000"); // contacts have their own sequence

        let contact = db.get_contact(&code).expect("get").expect("present");
        assert_eq!(
            contact_title(&db, &contact).expect("title"),
            "Durand Marie (Acme)"
        );
    }

    #[test]
    fn test_detail_recomputes_rollup_every_call() {
        let db = test_db();
        let code = create_contact(&db, "jdoe", form("Durand"), None).expect("create");

        let mut mission = sample_mission("m000000", "Deal A", &code);
        mission.status = MissionStatus::Project;
        mission.amount = Some(1000.0);
        db.upsert_mission(&mission).expect("mission");

        let detail = contact_detail(&db, &code).expect("detail");
        assert_eq!(detail.rollup.assured, 1000.0);
        assert_eq!(detail.missions.len(), 1);

        // A status flip is visible on the very next read: nothing is cached.
        mission.status = MissionStatus::NoGo;
        db.upsert_mission(&mission).expect("mission");
        let detail = contact_detail(&db, &code).expect("detail");
        assert_eq!(detail.rollup.assured, 0.0);
        assert_eq!(detail.rollup.nogo, 1);
    }

    #[test]
    fn test_update_appends_comment_history() {
        let db = test_db();
        let code =
            create_contact(&db, "jdoe", form("Durand"), Some("first touch")).expect("create");

        let mut edited = form("Durand");
        edited.status = ContactStatus::Client;
        update_contact(&db, "jdoe", &code, edited, Some("signed")).expect("update");

        let detail = contact_detail(&db, &code).expect("detail");
        assert_eq!(detail.contact.status, ContactStatus::Client);
        let bodies: Vec<&str> = detail.comments.iter().map(|c| c.body.as_str()).collect();
        assert_eq!(bodies, vec!["first touch", "signed"]);
    }
}
