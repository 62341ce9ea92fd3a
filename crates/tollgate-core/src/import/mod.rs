// ── Import pipeline ──
//
// Best-effort ingestion of externally supplied voucher files. A file is
// parsed into raw records (delimited text or JSON), each record runs
// through the column schema, and surviving rows are created one at a
// time. Only an unreadable file fails the whole import; everything else
// is counted in the report.

pub mod delimited;
pub mod export;
pub mod schema;
pub mod structured;

use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

pub use export::{EXPORT_COLUMNS, ExportError, export_vouchers};
pub use schema::{RawCell, RawRecord, RowOutcome, normalize_record};

use crate::command::CreateVoucherRequest;
use crate::model::Voucher;
use crate::queue::SubmissionQueue;
use crate::store::EntityStore;

/// Input file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Delimited { delimiter: char },
    Structured,
}

impl ImportFormat {
    /// `.json` files are structured records; anything else is delimited.
    pub fn for_path(path: &Path, delimiter: char) -> Self {
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::Structured
        } else {
            Self::Delimited { delimiter }
        }
    }
}

/// The file could not be read as records at all. Nothing was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed JSON: {0}")]
    Json(String),

    #[error("expected a JSON object or an array of objects")]
    NotRecords,

    #[error("expected a header line and at least one data line")]
    MissingRows,

    #[error("{0:?} cannot be used as a delimiter")]
    Delimiter(char),

    #[error("column {0:?} appears more than once in the header")]
    DuplicateColumn(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowError {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported_count: usize,
    pub error_count: usize,
    pub errors: Vec<RowError>,
    /// Rows skipped for lacking a package key.
    pub dropped: usize,
}

/// A row that passed the schema, ready to submit.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRow {
    pub row: usize,
    pub request: CreateVoucherRequest,
}

/// Result of parsing and normalizing a file, before submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedImport {
    pub rows: Vec<PreparedRow>,
    pub errors: Vec<RowError>,
    pub dropped: usize,
}

pub fn parse_records(raw: &str, format: ImportFormat) -> Result<Vec<RawRecord>, ParseError> {
    match format {
        ImportFormat::Delimited { delimiter } => delimited::parse(raw, delimiter),
        ImportFormat::Structured => structured::parse(raw),
    }
}

/// Parse and normalize without touching any store.
pub fn prepare(raw: &str, format: ImportFormat) -> Result<PreparedImport, ParseError> {
    let mut prepared = PreparedImport::default();
    for record in parse_records(raw, format)? {
        match normalize_record(&record) {
            RowOutcome::Accepted(request) => prepared.rows.push(PreparedRow {
                row: record.row,
                request: *request,
            }),
            RowOutcome::Dropped => prepared.dropped += 1,
            RowOutcome::Rejected { code, message } => prepared.errors.push(RowError {
                row: record.row,
                code,
                message,
            }),
        }
    }
    Ok(prepared)
}

// ── Pipeline ────────────────────────────────────────────────────────

pub struct ImportPipeline<'a, S> {
    store: &'a S,
}

impl<'a, S: EntityStore> ImportPipeline<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn import_file(
        &self,
        raw: &str,
        format: ImportFormat,
    ) -> Result<ImportReport, ParseError> {
        let prepared = prepare(raw, format)?;
        let mut report = ImportReport {
            dropped: prepared.dropped,
            errors: prepared.errors,
            ..ImportReport::default()
        };

        let queue: SubmissionQueue<PreparedRow> = prepared.rows.into_iter().collect();
        let outcomes = queue
            .run(|row| self.store.create_entity::<Voucher>(row.request))
            .await;

        for outcome in outcomes {
            match outcome.result {
                Ok(_) => report.imported_count += 1,
                Err(err) => report.errors.push(RowError {
                    row: outcome.item.row,
                    code: outcome.item.request.code,
                    message: err.to_string(),
                }),
            }
        }
        report.errors.sort_by_key(|e| e.row);
        report.error_count = report.errors.len();

        info!(
            imported = report.imported_count,
            errors = report.error_count,
            dropped = report.dropped,
            "voucher import finished"
        );
        Ok(report)
    }
}
