//! Small helpers shared across services: code generation and amount
//! formatting.

/// Generate an entity code with a one-letter prefix and a six-digit
/// counter, skipping over codes already in use.
///
/// Example: `generate_code(&["m000000", "m000002"], 'm')` → "m000003"
/// (the index starts at the collection size and climbs past collisions).
pub fn generate_code(names: &[String], prefix: char) -> String {
    let mut index = names.len();
    let mut code = format!("{prefix}{index:06}");
    while names.iter().any(|n| n == &code) {
        index += 1;
        code = format!("{prefix}{index:06}");
    }
    code
}

/// Format a monetary amount for display: two decimals, euro sign.
///
/// Example: `format_amount(1234.5)` → "1234.50 €"
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2} €")
}

/// Format an amount for CSV cells: no unit, no trailing zero decimals.
pub fn csv_amount(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount}")
    }
}

/// Strip the directory part of an attachment path, keeping the filename.
pub fn attachment_filename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_empty() {
        assert_eq!(generate_code(&[], 'c'), "c000000");
    }

    #[test]
    fn test_generate_code_sequential() {
        let names = vec!["m000000".to_string(), "m000001".to_string()];
        assert_eq!(generate_code(&names, 'm'), "m000002");
    }

    #[test]
    fn test_generate_code_skips_collisions() {
        // Two names but the slot at index 2 is taken.
        let names = vec!["m000001".to_string(), "m000002".to_string()];
        assert_eq!(generate_code(&names, 'm'), "m000003");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1000.0), "1000.00 €");
        assert_eq!(format_amount(99.9), "99.90 €");
    }

    #[test]
    fn test_csv_amount() {
        assert_eq!(csv_amount(1000.0), "1000");
        assert_eq!(csv_amount(1000.5), "1000.5");
    }

    #[test]
    fn test_attachment_filename() {
        assert_eq!(attachment_filename("files/q3/report.pdf"), "report.pdf");
        assert_eq!(attachment_filename("report.pdf"), "report.pdf");
    }
}
