// ── Delimited-text export ──
//
// Inverse of the delimited reader: the output re-imports to equivalent
// vouchers. Cells containing the delimiter are quoted. Quotes and line
// breaks have no representation in the format, so they fail the export.

use std::borrow::Cow;

use chrono::SecondsFormat;
use thiserror::Error;

use super::delimited::{QUOTE, check_delimiter};
use crate::model::Voucher;

pub const EXPORT_COLUMNS: [&str; 9] = [
    "code",
    "packageKey",
    "valueKES",
    "durationSeconds",
    "type",
    "active",
    "maxUses",
    "usedCount",
    "expiresAt",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("voucher {code}: {column} contains a quote or line break")]
    Unrepresentable { code: String, column: &'static str },

    #[error("{0:?} cannot be used as a delimiter")]
    Delimiter(char),
}

fn cell<'a>(
    value: &'a str,
    delimiter: char,
    code: &str,
    column: &'static str,
) -> Result<Cow<'a, str>, ExportError> {
    if value.contains([QUOTE, '\n', '\r']) {
        return Err(ExportError::Unrepresentable {
            code: code.to_owned(),
            column,
        });
    }
    if value.contains(delimiter) {
        Ok(Cow::Owned(format!("{QUOTE}{value}{QUOTE}")))
    } else {
        Ok(Cow::Borrowed(value))
    }
}

/// Render `vouchers` as a header line plus one line per voucher.
pub fn export_vouchers(vouchers: &[Voucher], delimiter: char) -> Result<String, ExportError> {
    check_delimiter(delimiter).map_err(|_| ExportError::Delimiter(delimiter))?;

    let sep = delimiter.to_string();
    let mut out = EXPORT_COLUMNS.join(&sep);
    out.push('\n');

    for voucher in vouchers {
        let values: [String; 9] = [
            voucher.code.clone(),
            voucher.package_key.clone(),
            voucher.value.to_string(),
            voucher
                .duration_seconds
                .map(|d| d.to_string())
                .unwrap_or_default(),
            voucher.voucher_type.to_string(),
            voucher.active.to_string(),
            voucher.max_uses.to_string(),
            voucher.used_count.to_string(),
            voucher
                .expires_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                .unwrap_or_default(),
        ];

        let cells = values
            .iter()
            .zip(EXPORT_COLUMNS)
            .map(|(value, column)| cell(value, delimiter, &voucher.code, column))
            .collect::<Result<Vec<_>, _>>()?;
        out.push_str(&cells.join(&sep));
        out.push('\n');
    }

    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::voucher::tests::voucher;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    #[test]
    fn renders_header_and_rows() {
        let mut v = voucher("VOUCHER_AB12CD");
        v.value = Decimal::new(1250, 2);
        v.duration_seconds = Some(86_400);
        v.expires_at = Some(Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 0).unwrap());

        let out = export_vouchers(&[v], ',').unwrap();
        assert_eq!(
            out,
            "code,packageKey,valueKES,durationSeconds,type,active,maxUses,usedCount,expiresAt\n\
             VOUCHER_AB12CD,daily,12.50,86400,single,true,1,0,2025-12-31T23:59:00Z\n"
        );
    }

    #[test]
    fn keeps_sub_second_expiry() {
        let mut v = voucher("A_1");
        v.expires_at = Some(
            Utc.with_ymd_and_hms(2026, 1, 31, 18, 30, 0).unwrap()
                + chrono::Duration::milliseconds(250),
        );
        let out = export_vouchers(&[v], ',').unwrap();
        assert!(out.ends_with(",2026-01-31T18:30:00.250Z\n"), "{out}");
    }

    #[test]
    fn quotes_cells_containing_the_delimiter() {
        let mut v = voucher("A_1");
        v.package_key = "daily,promo".into();
        let out = export_vouchers(&[v], ',').unwrap();
        assert!(out.contains("A_1,\"daily,promo\",50,"));
    }

    #[test]
    fn quote_in_a_cell_fails() {
        let mut v = voucher("A_1");
        v.package_key = "say \"hi\"".into();
        assert_eq!(
            export_vouchers(&[v], ','),
            Err(ExportError::Unrepresentable {
                code: "A_1".into(),
                column: "packageKey"
            })
        );
    }

    #[test]
    fn semicolon_delimiter() {
        let out = export_vouchers(&[voucher("A_1")], ';').unwrap();
        assert!(out.starts_with("code;packageKey;"));
        assert!(out.contains("A_1;daily;50;;single;true;1;0;\n"));
    }
}
