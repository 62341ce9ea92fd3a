//! Voucher command handlers.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tabled::Tabled;

use tollgate_core::{
    Command as CoreCommand, CommandResult, Console, CoreError, CreateVoucherRequest, EntityStore,
    ImportFormat, ImportReport, IssueReport, IssueRequest, Voucher, VoucherPatch, VoucherType,
    time_remaining, view,
};

use crate::cli::{GlobalOpts, VoucherSpec, VouchersArgs, VouchersCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct VoucherRow {
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "KES")]
    value: String,
    #[tabled(rename = "Type")]
    voucher_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Uses")]
    uses: String,
    #[tabled(rename = "Expires")]
    expires: String,
}

impl VoucherRow {
    fn new(v: &Voucher, now: DateTime<Utc>) -> Self {
        Self {
            code: v.code.clone(),
            package: v.package_key.clone(),
            value: v.value.to_string(),
            voucher_type: v.voucher_type.to_string(),
            status: v.status(now).to_string(),
            uses: format!("{}/{}", v.used_count, v.max_uses),
            expires: output::timestamp(v.expires_at),
        }
    }
}

#[derive(Tabled)]
struct RowErrorRow {
    #[tabled(rename = "Row")]
    row: usize,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Error")]
    message: String,
}

fn detail(v: &Voucher) -> String {
    let now = Utc::now();
    [
        format!("ID:          {}", v.id),
        format!("Code:        {}", v.code),
        format!("Package:     {}", v.package_key),
        format!("Value:       KES {}", v.value),
        format!("Type:        {}", v.voucher_type),
        format!("Status:      {}", v.status(now)),
        format!(
            "Uses:        {}/{} ({} left)",
            v.used_count,
            v.max_uses,
            v.remaining_uses()
        ),
        format!("Used By:     {}", v.used_by.as_deref().unwrap_or("-")),
        format!("Used At:     {}", output::timestamp(v.used_at)),
        format!("Duration:    {}", output::cell(v.duration_seconds.map(|s| format!("{s}s")))),
        format!("Expires:     {}", output::timestamp(v.expires_at)),
        format!("Remaining:   {}", time_remaining(v.expires_at, now)),
        format!("Created:     {}", output::timestamp(Some(v.created_at))),
        format!("Notes:       {}", v.notes.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

fn issue_detail(report: &IssueReport) -> String {
    let now = Utc::now();
    let rows: Vec<VoucherRow> = report
        .issued
        .iter()
        .map(|v| VoucherRow::new(v, now))
        .collect();
    let mut lines = vec![output::render_table(&rows)];
    lines.extend(
        report
            .failures
            .iter()
            .map(|f| format!("failed {}: {}", f.code, f.message)),
    );
    lines.join("\n")
}

fn import_detail(report: &ImportReport) -> String {
    let mut lines = vec![
        format!("Imported:    {}", report.imported_count),
        format!("Errors:      {}", report.error_count),
        format!("Skipped:     {} (no package)", report.dropped),
    ];
    if !report.errors.is_empty() {
        let rows: Vec<RowErrorRow> = report
            .errors
            .iter()
            .map(|e| RowErrorRow {
                row: e.row,
                code: output::cell(e.code.as_deref()),
                message: e.message.clone(),
            })
            .collect();
        lines.push(output::render_table(&rows));
    }
    lines.join("\n")
}

fn voucher_of(result: CommandResult) -> Result<Voucher, CliError> {
    match result {
        CommandResult::Voucher(v) => Ok(*v),
        other => Err(CliError::ApiError {
            code: "internal".into(),
            message: format!("expected a voucher, got {other:?}"),
        }),
    }
}

fn print_voucher(v: &Voucher, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(global.output, v, detail, |v| v.code.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn parse_value(raw: &str) -> Result<Decimal, CliError> {
    let value: Decimal = util::parse_arg("value", raw)?;
    if value < Decimal::ZERO {
        return Err(CliError::Validation {
            field: "value".into(),
            reason: "must not be negative".into(),
        });
    }
    Ok(value)
}

fn parse_expiry(spec: &VoucherSpec) -> Result<Option<DateTime<Utc>>, CliError> {
    spec.expires
        .as_deref()
        .map(|raw| util::parse_datetime("expires", raw))
        .transpose()
}

fn resolve_delimiter(raw: Option<&str>, fallback: char) -> Result<char, CliError> {
    match raw {
        Some(raw) => Ok(tollgate_config::parse_delimiter(raw)?),
        None => Ok(fallback),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<S: EntityStore>(
    console: &Console<S>,
    args: VouchersArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        VouchersCommand::List {
            view: flags,
            voucher_type,
        } => {
            let query = util::view_query::<Voucher>(&flags, &voucher_type)?;
            let vouchers = console.vouchers().await?;
            let now = Utc::now();
            let rows = view(&vouchers, &query, now);
            let out = output::render_list(
                global.output,
                &rows,
                |v| VoucherRow::new(v, now),
                |v| v.code.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        VouchersCommand::Get { voucher } => {
            let v = console.find_voucher(&voucher).await?;
            print_voucher(&v, global)
        }

        VouchersCommand::Create { spec, code, prefix } => {
            let code = code.unwrap_or_else(|| console.generate_code(prefix.as_deref()));
            let request = CreateVoucherRequest {
                code: Some(code),
                package_key: spec.package.clone(),
                value: Some(parse_value(&spec.value)?),
                voucher_type: VoucherType::for_max_uses(spec.max_uses),
                active: !spec.inactive,
                max_uses: spec.max_uses,
                used_count: 0,
                duration_seconds: spec.duration_seconds,
                expires_at: parse_expiry(&spec)?,
                notes: spec.notes.clone(),
            };
            let v = voucher_of(console.execute(CoreCommand::CreateVoucher(request)).await?)?;
            output::success(global, &format!("Voucher {} created", v.code));
            print_voucher(&v, global)
        }

        VouchersCommand::Issue {
            spec,
            count,
            prefix,
            suffix,
        } => {
            let prefix =
                prefix.unwrap_or_else(|| console.settings().codes.default_prefix.clone());
            let mut request = IssueRequest::new(spec.package.clone(), count, prefix);
            request.suffix = suffix;
            request.value = parse_value(&spec.value)?;
            request.max_uses = spec.max_uses;
            request.duration_seconds = spec.duration_seconds;
            request.expires_at = parse_expiry(&spec)?;
            request.active = !spec.inactive;
            request.notes = spec.notes.clone();

            let progress = output::spinner(global, format!("Issuing {count} vouchers"));
            let report = console.issue_batch(&request).await;
            progress.finish_and_clear();
            let report = report?;

            let out = output::render_single(global.output, &report, issue_detail, |r| {
                r.issued
                    .iter()
                    .map(|v| v.code.as_str())
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            output::print_output(&out, global.quiet);

            if !report.is_complete() {
                return Err(CliError::PartialFailure {
                    operation: "issue".into(),
                    failed: report.failures.len(),
                    total: report.issued.len() + report.failures.len(),
                });
            }
            output::success(global, &format!("{} vouchers issued", report.issued.len()));
            Ok(())
        }

        VouchersCommand::Import { file, delimiter } => {
            import(console, &file, delimiter.as_deref(), global).await
        }

        VouchersCommand::Export {
            view: flags,
            voucher_type,
            out,
            delimiter,
        } => {
            let query = util::view_query::<Voucher>(&flags, &voucher_type)?;
            let delimiter = resolve_delimiter(delimiter.as_deref(), console.settings().delimiter)?;
            let vouchers = console.vouchers().await?;
            let selected: Vec<Voucher> = view(&vouchers, &query, Utc::now())
                .into_iter()
                .cloned()
                .collect();
            let text = tollgate_core::import::export_vouchers(&selected, delimiter)
                .map_err(CoreError::from)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, text)?;
                    output::success(
                        global,
                        &format!("Exported {} vouchers to {}", selected.len(), path.display()),
                    );
                }
                None => print!("{text}"),
            }
            Ok(())
        }

        VouchersCommand::Redeem { code, user } => {
            let v = voucher_of(
                console
                    .execute(CoreCommand::RedeemVoucher {
                        code,
                        user_id: user,
                    })
                    .await?,
            )?;
            output::success(
                global,
                &format!(
                    "Voucher {} redeemed ({} uses left)",
                    v.code,
                    v.remaining_uses()
                ),
            );
            print_voucher(&v, global)
        }

        VouchersCommand::Enable { voucher } => set_active(console, &voucher, true, global).await,
        VouchersCommand::Disable { voucher } => set_active(console, &voucher, false, global).await,

        VouchersCommand::Delete { voucher } => {
            let v = console.find_voucher(&voucher).await?;
            if !util::confirm(
                &format!("Delete voucher {}? Its code can never be reused.", v.code),
                "vouchers delete",
                global.yes,
            )? {
                return Ok(());
            }
            console
                .execute(CoreCommand::DeleteVoucher { id: v.id.clone() })
                .await?;
            output::success(global, &format!("Voucher {} deleted", v.code));
            Ok(())
        }
    }
}

async fn set_active<S: EntityStore>(
    console: &Console<S>,
    id_or_code: &str,
    active: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let current = console.find_voucher(id_or_code).await?;
    let v = voucher_of(
        console
            .execute(CoreCommand::UpdateVoucher {
                id: current.id,
                patch: VoucherPatch::set_active(active),
            })
            .await?,
    )?;
    let verb = if active { "enabled" } else { "disabled" };
    output::success(global, &format!("Voucher {} {verb}", v.code));
    print_voucher(&v, global)
}

async fn import<S: EntityStore>(
    console: &Console<S>,
    file: &Path,
    delimiter: Option<&str>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let raw = std::fs::read_to_string(file)?;
    let delimiter = resolve_delimiter(delimiter, console.settings().delimiter)?;
    let format = ImportFormat::for_path(file, delimiter);

    let progress = output::spinner(global, format!("Importing {}", file.display()));
    let report = console.import_file(&raw, format).await;
    progress.finish_and_clear();
    let report = report?;

    let out = output::render_single(global.output, &report, import_detail, |r| {
        r.imported_count.to_string()
    })?;
    output::print_output(&out, global.quiet);

    if report.error_count > 0 {
        return Err(CliError::PartialFailure {
            operation: "import".into(),
            failed: report.error_count,
            total: report.imported_count + report.error_count,
        });
    }
    output::success(
        global,
        &format!("{} vouchers imported", report.imported_count),
    );
    Ok(())
}
