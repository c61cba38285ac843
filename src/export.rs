//! CSV export of the mission pipeline.
//!
//! The output contract: a header row of column titles, then one row per
//! mission. The editor preset decides encoding and separator (OpenOffice
//! wants UTF-8 and commas, Excel wants Windows-1252 and semicolons).
//! Enumerated fields render their display label, not their storage code.

use crate::db::{CrmDb, DbContact};
use crate::error::CrmError;
use crate::types::CsvEditor;
use crate::util::csv_amount;

/// Exported columns, in order.
pub const CSV_COLUMNS: [&str; 9] = [
    "lastname",
    "firstname",
    "company",
    "contact's status",
    "mission's title",
    "amount",
    "probability",
    "mission's status",
    "deadline",
];

/// Quote a field when it contains the separator, a quote or a line break;
/// embedded quotes are doubled.
fn quote_field(value: &str, separator: char) -> String {
    if value.contains(separator)
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Encode a string as Windows-1252. Characters outside the code page
/// degrade to '?'.
fn encode_windows_1252(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        let byte = match code {
            // ASCII and the Latin-1 range shared with cp1252.
            0x00..=0x7F | 0xA0..=0xFF => code as u8,
            // The 0x80-0x9F block, where cp1252 diverges from Latin-1.
            0x20AC => 0x80, // €
            0x201A => 0x82,
            0x0192 => 0x83,
            0x201E => 0x84,
            0x2026 => 0x85, // …
            0x2020 => 0x86,
            0x2021 => 0x87,
            0x02C6 => 0x88,
            0x2030 => 0x89,
            0x0160 => 0x8A,
            0x2039 => 0x8B,
            0x0152 => 0x8C, // Œ
            0x017D => 0x8E,
            0x2018 => 0x91,
            0x2019 => 0x92, // ’
            0x201C => 0x93,
            0x201D => 0x94,
            0x2022 => 0x95,
            0x2013 => 0x96,
            0x2014 => 0x97,
            0x02DC => 0x98,
            0x2122 => 0x99, // ™
            0x0161 => 0x9A,
            0x203A => 0x9B,
            0x0153 => 0x9C, // œ
            0x017E => 0x9E,
            0x0178 => 0x9F,
            _ => b'?',
        };
        bytes.push(byte);
    }
    bytes
}

/// Serialize rows into the final byte stream for the chosen editor.
fn encode_rows(rows: &[Vec<String>], editor: CsvEditor) -> Vec<u8> {
    let separator = editor.separator();
    let mut out = Vec::new();
    for row in rows {
        let line = row
            .iter()
            .map(|field| quote_field(field, separator))
            .collect::<Vec<_>>()
            .join(&separator.to_string());
        if editor.windows_1252() {
            out.extend(encode_windows_1252(&line));
        } else {
            out.extend(line.as_bytes());
        }
        out.push(b'\n');
    }
    out
}

fn company_title(db: &CrmDb, contact: &DbContact) -> Result<String, CrmError> {
    let Some(company_code) = contact.company.as_deref() else {
        return Ok(String::new());
    };
    Ok(db
        .get_company(company_code)?
        .map(|c| c.title)
        .unwrap_or_default())
}

/// Export every mission as CSV. Errors with [`CrmError::NoData`] when the
/// pipeline is empty.
///
/// A mission row carries its first linked contact (missions keep at least
/// one); contact columns are blank if that contact record is gone.
pub fn export_missions(db: &CrmDb, editor: CsvEditor) -> Result<Vec<u8>, CrmError> {
    let missions = db.list_missions(None)?;
    if missions.is_empty() {
        return Err(CrmError::NoData);
    }

    let mut rows = Vec::with_capacity(missions.len() + 1);
    rows.push(CSV_COLUMNS.iter().map(|c| c.to_string()).collect());

    for mission in &missions {
        let contact = match mission.contacts.first() {
            Some(code) => db.get_contact(code)?,
            None => None,
        };

        let (lastname, firstname, company, contact_status) = match &contact {
            Some(contact) => (
                contact.lastname.clone(),
                contact.firstname.clone().unwrap_or_default(),
                company_title(db, contact)?,
                contact.status.label().to_string(),
            ),
            None => Default::default(),
        };

        rows.push(vec![
            lastname,
            firstname,
            company,
            contact_status,
            mission.title.clone(),
            mission.amount.map(csv_amount).unwrap_or_default(),
            mission
                .probability
                .map(|p| p.to_string())
                .unwrap_or_default(),
            mission.status.label().to_string(),
            mission.deadline.clone().unwrap_or_default(),
        ]);
    }

    log::info!(
        "exporting {} missions as CSV ({})",
        missions.len(),
        editor.label()
    );
    Ok(encode_rows(&rows, editor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{sample_company, sample_contact, sample_mission, test_db};
    use crate::types::{ContactStatus, MissionStatus};

    fn seeded_db(n_missions: usize) -> CrmDb {
        let db = test_db();
        db.upsert_company(&sample_company("c000000", "Acme"))
            .expect("company");
        let mut contact = sample_contact("c000000", "Durand");
        contact.firstname = Some("Marie".to_string());
        contact.company = Some("c000000".to_string());
        contact.status = ContactStatus::Client;
        db.upsert_contact(&contact).expect("contact");

        for i in 0..n_missions {
            let mut mission =
                sample_mission(&format!("m{i:06}"), &format!("Deal {i}"), "c000000");
            mission.amount = Some(1000.0 + i as f64);
            mission.probability = Some(50);
            mission.status = MissionStatus::Opportunity;
            mission.deadline = Some("2026-12-01".to_string());
            db.upsert_mission(&mission).expect("mission");
        }
        db
    }

    #[test]
    fn test_row_and_column_counts() {
        let db = seeded_db(3);
        for editor in [CsvEditor::OpenOffice, CsvEditor::Excel] {
            let bytes = export_missions(&db, editor).expect("export");
            let text = String::from_utf8(bytes).expect("all-ASCII fixture");
            let lines: Vec<&str> = text.lines().collect();
            assert_eq!(lines.len(), 3 + 1, "header plus one row per mission");
            for line in lines {
                let fields = line.split(editor.separator()).count();
                assert_eq!(fields, CSV_COLUMNS.len());
            }
        }
    }

    #[test]
    fn test_enumerated_fields_render_labels() {
        let db = seeded_db(1);
        let bytes = export_missions(&db, CsvEditor::OpenOffice).expect("export");
        let text = String::from_utf8(bytes).expect("utf8");
        let row = text.lines().nth(1).expect("data row");
        assert!(row.contains("Client"), "contact status label: {row}");
        assert!(row.contains("Opportunity"), "mission status label: {row}");
        assert!(!row.contains("opportunity"), "no raw codes: {row}");
    }

    #[test]
    fn test_row_content() {
        let db = seeded_db(1);
        let bytes = export_missions(&db, CsvEditor::OpenOffice).expect("export");
        let text = String::from_utf8(bytes).expect("utf8");
        assert_eq!(
            text.lines().nth(1).expect("data row"),
            "Durand,Marie,Acme,Client,Deal 0,1000,50,Opportunity,2026-12-01"
        );
    }

    #[test]
    fn test_empty_pipeline_is_an_error() {
        let db = test_db();
        assert!(matches!(
            export_missions(&db, CsvEditor::Excel),
            Err(CrmError::NoData)
        ));
    }

    #[test]
    fn test_excel_export_encodes_windows_1252() {
        let db = seeded_db(0);
        let mut mission = sample_mission("m000000", "Devis n°4 — 10 000 €", "c000000");
        mission.status = MissionStatus::Project;
        db.upsert_mission(&mission).expect("mission");

        let bytes = export_missions(&db, CsvEditor::Excel).expect("export");
        assert!(bytes.contains(&0x80), "euro sign maps to 0x80");
        assert!(bytes.contains(&0x97), "em dash maps to 0x97");
        assert!(bytes.contains(&0xB0), "degree sign stays Latin-1");
    }

    #[test]
    fn test_separator_inside_field_is_quoted() {
        let db = seeded_db(0);
        db.upsert_mission(&sample_mission("m000000", "Deal; phase 1", "c000000"))
            .expect("mission");

        let bytes = export_missions(&db, CsvEditor::Excel).expect("export");
        let text: String = bytes.iter().map(|&b| b as char).collect();
        assert!(text.contains("\"Deal; phase 1\""), "{text}");
    }

    #[test]
    fn test_line_breaks_inside_field_are_quoted() {
        assert_eq!(quote_field("line\nbreak", ','), "\"line\nbreak\"");
        assert_eq!(quote_field("carriage\rreturn", ','), "\"carriage\rreturn\"");
    }

    #[test]
    fn test_unmappable_character_degrades_to_question_mark() {
        assert_eq!(encode_windows_1252("naïve 日本"), b"na\xefve ??");
    }
}
