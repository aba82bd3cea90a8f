//! Tenant list: one `store name|lot code` pair per line.
//!
//! Blank lines and `#` comments are skipped. Store names are matched against
//! the POS verbatim, so only surrounding whitespace is trimmed.

use std::path::Path;

use crate::codec::FIELD_DELIMITER;
use crate::error::CoreError;
use crate::model::Tenant;

pub const DEFAULT_TENANT_FILE: &str = "tenant.txt";

pub fn parse_tenants(text: &str) -> Result<Vec<Tenant>, CoreError> {
    let mut tenants = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split(FIELD_DELIMITER).map(str::trim).collect();
        let [name, lot_code] = fields.as_slice() else {
            return Err(CoreError::TenantLine {
                line: idx + 1,
                message: format!("expected 'name|lot', found {} field(s)", fields.len()),
            });
        };
        if name.is_empty() || lot_code.is_empty() {
            return Err(CoreError::TenantLine {
                line: idx + 1,
                message: "store name and lot code must not be empty".into(),
            });
        }

        tenants.push(Tenant::new(*name, *lot_code));
    }

    Ok(tenants)
}

pub fn load_tenants(path: &Path) -> Result<Vec<Tenant>, CoreError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CoreError::Io(format!("cannot read {}: {}", path.display(), e)))?;
    parse_tenants(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_in_order() {
        let tenants = parse_tenants("Store A|LOT001\nKopi Corner | G-12 \n").unwrap();
        assert_eq!(
            tenants,
            vec![Tenant::new("Store A", "LOT001"), Tenant::new("Kopi Corner", "G-12")]
        );
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let tenants = parse_tenants("# mall B\n\nStore A|LOT001\r\n   \n").unwrap();
        assert_eq!(tenants, vec![Tenant::new("Store A", "LOT001")]);
    }

    #[test]
    fn rejects_missing_lot() {
        let err = parse_tenants("Store A|LOT001\nStore B\n").unwrap_err();
        assert_eq!(
            err,
            CoreError::TenantLine {
                line: 2,
                message: "expected 'name|lot', found 1 field(s)".into(),
            }
        );
    }

    #[test]
    fn rejects_empty_field() {
        let err = parse_tenants("Store A|\n").unwrap_err();
        assert!(matches!(err, CoreError::TenantLine { line: 1, .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_TENANT_FILE);
        std::fs::write(&path, "Store A|LOT001\n").unwrap();
        assert_eq!(load_tenants(&path).unwrap().len(), 1);
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tenants(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, CoreError::Io(_)));
    }
}
