//! Company creation and edit flows.

use chrono::Utc;

use crate::db::{CrmDb, DbCompany, NewComment};
use crate::error::CrmError;
use crate::types::EntityKind;
use crate::util::generate_code;

/// Field values for a company create or edit form.
#[derive(Debug, Clone, Default)]
pub struct CompanyForm {
    pub title: String,
    pub address_1: Option<String>,
    pub address_2: Option<String>,
    pub zipcode: Option<String>,
    pub town: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub website: Option<String>,
    pub activity: Option<String>,
    pub description: Option<String>,
    pub logo: Option<String>,
}

fn validate(form: &CompanyForm) -> Result<(), CrmError> {
    if form.title.trim().is_empty() {
        return Err(CrmError::mandatory("title"));
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
        entity_kind: EntityKind::Company,
        entity_code: code,
        author,
        body,
        attachment: None,
        alert_at: None,
        next_action: None,
    })?;
    Ok(())
}

/// Create a company and return its allocated code.
pub fn create_company(
    db: &CrmDb,
    author: &str,
    form: CompanyForm,
    comment: Option<&str>,
) -> Result<String, CrmError> {
    validate(&form)?;

    db.with_transaction(|db| {
        let code = generate_code(&db.company_codes()?, 'c');
        let now = Utc::now().to_rfc3339();
        db.upsert_company(&DbCompany {
            code: code.clone(),
            title: form.title.trim().to_string(),
            address_1: form.address_1,
            address_2: form.address_2,
            zipcode: form.zipcode,
            town: form.town,
            country: form.country,
            phone: form.phone,
            fax: form.fax,
            website: form.website,
            activity: form.activity,
            description: form.description,
            logo: form.logo,
            created_at: now.clone(),
            updated_at: now,
        })?;
        append_comment(db, &code, author, comment)?;
        log::info!("company {code} created by {author}");
        Ok(code)
    })
}

/// Edit a company in place, appending the comment if one was written.
pub fn update_company(
    db: &CrmDb,
    author: &str,
    code: &str,
    form: CompanyForm,
    comment: Option<&str>,
) -> Result<(), CrmError> {
    validate(&form)?;
    let old = db.get_company(code)?.ok_or_else(|| CrmError::NotFound {
        kind: "company",
        code: code.to_string(),
    })?;

    db.with_transaction(|db| {
        db.upsert_company(&DbCompany {
            code: code.to_string(),
            title: form.title.trim().to_string(),
            address_1: form.address_1,
            address_2: form.address_2,
            zipcode: form.zipcode,
            town: form.town,
            country: form.country,
            phone: form.phone,
            fax: form.fax,
            website: form.website,
            activity: form.activity,
            description: form.description,
            logo: form.logo.or(old.logo),
            created_at: old.created_at,
            updated_at: Utc::now().to_rfc3339(),
        })?;
        append_comment(db, code, author, comment)?;
        Ok(())
    })
}

/// Look up a company, erroring when the code is unknown.
pub fn get_company(db: &CrmDb, code: &str) -> Result<DbCompany, CrmError> {
    db.get_company(code)?.ok_or_else(|| CrmError::NotFound {
        kind: "company",
        code: code.to_string(),
    })
}
