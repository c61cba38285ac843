//! Queries for the `companies` table.

use rusqlite::{params, Row};

use super::{CrmDb, DbCompany, DbError};

const COMPANY_COLUMNS: &str = "code, title, address_1, address_2, zipcode, town, country,
     phone, fax, website, activity, description, logo, created_at, updated_at";

fn map_company(row: &Row<'_>) -> rusqlite::Result<DbCompany> {
    Ok(DbCompany {
        code: row.get(0)?,
        title: row.get(1)?,
        address_1: row.get(2)?,
        address_2: row.get(3)?,
        zipcode: row.get(4)?,
        town: row.get(5)?,
        country: row.get(6)?,
        phone: row.get(7)?,
        fax: row.get(8)?,
        website: row.get(9)?,
        activity: row.get(10)?,
        description: row.get(11)?,
        logo: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}

impl CrmDb {
    /// Insert or replace a company row.
    pub fn upsert_company(&self, company: &DbCompany) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO companies (code, title, address_1, address_2, zipcode, town,
                country, phone, fax, website, activity, description, logo,
                created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(code) DO UPDATE SET
                title = ?2, address_1 = ?3, address_2 = ?4, zipcode = ?5, town = ?6,
                country = ?7, phone = ?8, fax = ?9, website = ?10, activity = ?11,
                description = ?12, logo = ?13, updated_at = ?15",
            params![
                company.code,
                company.title,
                company.address_1,
                company.address_2,
                company.zipcode,
                company.town,
                company.country,
                company.phone,
                company.fax,
                company.website,
                company.activity,
                company.description,
                company.logo,
                company.created_at,
                company.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Look up a single company by code.
    pub fn get_company(&self, code: &str) -> Result<Option<DbCompany>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies WHERE code = ?1"
        ))?;
        let mut rows = stmt.query_map(params![code], map_company)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// List all companies ordered by title.
    pub fn list_companies(&self) -> Result<Vec<DbCompany>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMPANY_COLUMNS} FROM companies ORDER BY title"
        ))?;
        let rows = stmt.query_map([], map_company)?;

        let mut companies = Vec::new();
        for row in rows {
            companies.push(row?);
        }
        Ok(companies)
    }

    /// All company codes, for code allocation.
    pub fn company_codes(&self) -> Result<Vec<String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT code FROM companies")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        let mut codes = Vec::new();
        for row in rows {
            codes.push(row?);
        }
        Ok(codes)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{sample_company, test_db};

    #[test]
    fn test_company_round_trip() {
        let db = test_db();
        let mut company = sample_company("c000000", "Acme");
        company.town = Some("Paris".to_string());
        db.upsert_company(&company).expect("upsert");

        let found = db.get_company("c000000").expect("get").expect("present");
        assert_eq!(found.title, "Acme");
        assert_eq!(found.town.as_deref(), Some("Paris"));
        assert!(db.get_company("c999999").expect("get").is_none());
    }

    #[test]
    fn test_upsert_updates_existing() {
        let db = test_db();
        let mut company = sample_company("c000000", "Acme");
        db.upsert_company(&company).expect("first upsert");

        company.title = "Acme International".to_string();
        db.upsert_company(&company).expect("second upsert");

        let companies = db.list_companies().expect("list");
        assert_eq!(companies.len(), 1);
        assert_eq!(companies[0].title, "Acme International");
    }

    #[test]
    fn test_list_ordered_by_title() {
        let db = test_db();
        db.upsert_company(&sample_company("c000000", "Zenith"))
            .expect("upsert");
        db.upsert_company(&sample_company("c000001", "Acme"))
            .expect("upsert");

        let companies = db.list_companies().expect("list");
        assert_eq!(companies[0].title, "Acme");
        assert_eq!(companies[1].title, "Zenith");

        let codes = db.company_codes().expect("codes");
        assert_eq!(codes.len(), 2);
    }
}
