// ── Import schema ──
//
// One entry per recognized column: its accepted header names and the
// typed parser for its cells. Anything a parser does not recognize is a
// row error; nothing is silently coerced.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;

use crate::command::CreateVoucherRequest;
use crate::model::VoucherType;

/// A cell as read from the file, before any typing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCell {
    Text(String),
    Bool(bool),
    Number(serde_json::Number),
    Null,
    /// JSON array or object.
    Nested,
}

/// One input record, keyed by column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1-based position among the file's records.
    pub row: usize,
    pub cells: IndexMap<String, RawCell>,
}

/// What became of a record after the schema ran.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Accepted(Box<CreateVoucherRequest>),
    /// No package key: skipped without counting as an error.
    Dropped,
    Rejected {
        code: Option<String>,
        message: String,
    },
}

// ── Column table ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    PackageKey,
    Code,
    Value,
    Active,
    ExpiresAt,
    MaxUses,
    UsedCount,
    DurationSeconds,
    Type,
    Notes,
}

/// Header names per column; the first is canonical.
const SCHEMA: &[(Column, &[&str])] = &[
    (Column::PackageKey, &["packageKey"]),
    (Column::Code, &["code"]),
    (Column::Value, &["valueKES", "value"]),
    (Column::Active, &["active"]),
    (Column::ExpiresAt, &["expiresAt"]),
    (Column::MaxUses, &["maxUses"]),
    (Column::UsedCount, &["usedCount"]),
    (Column::DurationSeconds, &["durationSeconds"]),
    (Column::Type, &["type"]),
    (Column::Notes, &["notes"]),
];

#[derive(Default)]
struct RowFields {
    package_key: Option<String>,
    code: Option<String>,
    value: Option<Decimal>,
    active: Option<bool>,
    expires_at: Option<DateTime<Utc>>,
    max_uses: Option<u64>,
    used_count: Option<u64>,
    duration_seconds: Option<u64>,
    voucher_type: Option<VoucherType>,
    notes: Option<String>,
}

impl Column {
    fn apply(self, cell: &RawCell, row: &mut RowFields) -> Result<(), String> {
        match self {
            Self::PackageKey => row.package_key = text(cell)?,
            Self::Code => row.code = code(cell)?,
            Self::Value => row.value = decimal(cell)?,
            Self::Active => row.active = boolean(cell)?,
            Self::ExpiresAt => row.expires_at = timestamp(cell)?,
            Self::MaxUses => row.max_uses = count(cell)?,
            Self::UsedCount => row.used_count = count(cell)?,
            Self::DurationSeconds => row.duration_seconds = count(cell)?,
            Self::Type => row.voucher_type = voucher_type(cell)?,
            Self::Notes => row.notes = text(cell)?,
        }
        Ok(())
    }
}

fn lookup<'a>(record: &'a RawRecord, names: &[&str]) -> Option<&'a RawCell> {
    names.iter().find_map(|name| {
        record
            .cells
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, cell)| cell)
    })
}

// ── Cell parsers ────────────────────────────────────────────────────

const NESTED: &str = "nested values are not supported";

fn text(cell: &RawCell) -> Result<Option<String>, String> {
    match cell {
        RawCell::Text(s) => {
            let s = s.trim();
            Ok((!s.is_empty()).then(|| s.to_owned()))
        }
        RawCell::Number(n) => Ok(Some(n.to_string())),
        RawCell::Null => Ok(None),
        RawCell::Bool(_) => Err("expected text".into()),
        RawCell::Nested => Err(NESTED.into()),
    }
}

/// Codes must arrive as text: a JSON number would lose leading zeros.
fn code(cell: &RawCell) -> Result<Option<String>, String> {
    match cell {
        RawCell::Number(_) => Err("expected text".into()),
        other => text(other),
    }
}

fn decimal(cell: &RawCell) -> Result<Option<Decimal>, String> {
    let raw = match cell {
        RawCell::Text(s) if s.trim().is_empty() => return Ok(None),
        RawCell::Text(s) => s.trim().to_owned(),
        RawCell::Number(n) => n.to_string(),
        RawCell::Null => return Ok(None),
        RawCell::Bool(_) => return Err("expected a number".into()),
        RawCell::Nested => return Err(NESTED.into()),
    };
    let value = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|_| format!("{raw:?} is not a number"))?;
    if value < Decimal::ZERO {
        return Err("must not be negative".into());
    }
    Ok(Some(value))
}

fn boolean(cell: &RawCell) -> Result<Option<bool>, String> {
    match cell {
        RawCell::Bool(b) => Ok(Some(*b)),
        RawCell::Null => Ok(None),
        RawCell::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            other => Err(format!("{other:?} is not a boolean")),
        },
        RawCell::Number(n) => match n.as_u64() {
            Some(1) => Ok(Some(true)),
            Some(0) => Ok(Some(false)),
            _ => Err(format!("{n} is not a boolean")),
        },
        RawCell::Nested => Err(NESTED.into()),
    }
}

fn timestamp(cell: &RawCell) -> Result<Option<DateTime<Utc>>, String> {
    let raw = match cell {
        RawCell::Text(s) => s.trim(),
        RawCell::Null => return Ok(None),
        RawCell::Nested => return Err(NESTED.into()),
        RawCell::Bool(_) | RawCell::Number(_) => {
            return Err("expected an RFC 3339 timestamp or YYYY-MM-DD".into());
        }
    };
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(at.with_timezone(&Utc)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Some(midnight.and_utc()))
        .ok_or_else(|| format!("{raw:?} is not an RFC 3339 timestamp or YYYY-MM-DD"))
}

fn count(cell: &RawCell) -> Result<Option<u64>, String> {
    match cell {
        RawCell::Text(s) if s.trim().is_empty() => Ok(None),
        RawCell::Text(s) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| format!("{:?} is not a non-negative integer", s.trim())),
        RawCell::Number(n) => n
            .as_u64()
            .map(Some)
            .ok_or_else(|| format!("{n} is not a non-negative integer")),
        RawCell::Null => Ok(None),
        RawCell::Bool(_) => Err("expected an integer".into()),
        RawCell::Nested => Err(NESTED.into()),
    }
}

fn voucher_type(cell: &RawCell) -> Result<Option<VoucherType>, String> {
    match text(cell)? {
        None => Ok(None),
        Some(raw) => VoucherType::from_str(&raw)
            .map(Some)
            .map_err(|_| format!("{raw:?} is not single or bulk")),
    }
}

// ── Record normalization ────────────────────────────────────────────

/// Run every column parser over `record` and build the creation request.
pub fn normalize_record(record: &RawRecord) -> RowOutcome {
    let mut fields = RowFields::default();
    let mut errors: Vec<(Column, String)> = Vec::new();

    for (column, names) in SCHEMA {
        if let Some(cell) = lookup(record, names) {
            if let Err(message) = column.apply(cell, &mut fields) {
                errors.push((*column, format!("{}: {message}", names[0])));
            }
        }
    }

    let package_key_failed = errors.iter().any(|(c, _)| *c == Column::PackageKey);
    let Some(package_key) = fields.package_key.take() else {
        if !package_key_failed {
            return RowOutcome::Dropped;
        }
        return reject(fields.code, &errors);
    };

    let max_uses = fields.max_uses.unwrap_or(1);
    let used_count = fields.used_count.unwrap_or(0);
    let mut extra = Vec::new();

    if max_uses < 1 {
        extra.push("maxUses: must be at least 1".to_owned());
    }
    let max_uses_u32 = u32::try_from(max_uses).unwrap_or_else(|_| {
        extra.push("maxUses: too large".to_owned());
        u32::MAX
    });
    if used_count > max_uses {
        extra.push(format!("usedCount: {used_count} exceeds maxUses {max_uses}"));
    }
    let voucher_type = fields
        .voucher_type
        .unwrap_or_else(|| VoucherType::for_max_uses(max_uses_u32));
    if voucher_type == VoucherType::Bulk && max_uses < 2 {
        extra.push("type: bulk vouchers need maxUses of at least 2".to_owned());
    }

    if !errors.is_empty() || !extra.is_empty() {
        let mut messages: Vec<String> = errors.into_iter().map(|(_, m)| m).collect();
        messages.extend(extra);
        return RowOutcome::Rejected {
            code: fields.code,
            message: messages.join("; "),
        };
    }

    RowOutcome::Accepted(Box::new(CreateVoucherRequest {
        code: fields.code,
        package_key,
        value: fields.value,
        voucher_type,
        active: fields.active.unwrap_or(true),
        max_uses: max_uses_u32,
        used_count: u32::try_from(used_count).unwrap_or(max_uses_u32),
        duration_seconds: fields.duration_seconds,
        expires_at: fields.expires_at,
        notes: fields.notes,
    }))
}

fn reject(code: Option<String>, errors: &[(Column, String)]) -> RowOutcome {
    RowOutcome::Rejected {
        code,
        message: errors
            .iter()
            .map(|(_, m)| m.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    }
}
