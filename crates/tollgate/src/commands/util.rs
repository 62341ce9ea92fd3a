//! Shared helpers for command handlers.

use std::fmt::Display;
use std::io::IsTerminal;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};

use tollgate_core::{Selector, SortOrder, ViewQuery, Viewable};

use crate::cli::{SortDirection, ViewArgs};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, refuses instead of guessing.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

/// Parse a flag value, reporting failures against `field`.
pub fn parse_arg<T>(field: &str, raw: &str) -> Result<T, CliError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| CliError::Validation {
        field: field.into(),
        reason: format!("{raw:?}: {e}"),
    })
}

/// RFC 3339 timestamp, or a bare `YYYY-MM-DD` meaning midnight UTC.
pub fn parse_datetime(field: &str, raw: &str) -> Result<DateTime<Utc>, CliError> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| CliError::Validation {
            field: field.into(),
            reason: format!("{raw:?} is not an RFC 3339 timestamp or YYYY-MM-DD date"),
        })
}

/// Build a display query from the shared list flags plus a kind filter.
pub fn view_query<V>(view: &ViewArgs, kind: &str) -> Result<ViewQuery<V>, CliError>
where
    V: Viewable,
    V::Status: FromStr,
    <V::Status as FromStr>::Err: Display,
    V::Kind: FromStr,
    <V::Kind as FromStr>::Err: Display,
    V::SortKey: FromStr,
    <V::SortKey as FromStr>::Err: Display,
{
    let mut query = ViewQuery::default()
        .status(parse_arg::<Selector<V::Status>>("status", &view.status)?)
        .kind(parse_arg::<Selector<V::Kind>>("kind", kind)?);
    if let Some(ref term) = view.search {
        query = query.search(term.clone());
    }
    if let Some(ref key) = view.sort {
        let order = match view.order {
            SortDirection::Asc => SortOrder::Asc,
            SortDirection::Desc => SortOrder::Desc,
        };
        query = query.sort(parse_arg::<V::SortKey>("sort", key)?, order);
    }
    Ok(query)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tollgate_core::{Voucher, VoucherStatus, VoucherType};

    fn args(status: &str, sort: Option<&str>) -> ViewArgs {
        ViewArgs {
            search: None,
            status: status.into(),
            sort: sort.map(Into::into),
            order: SortDirection::Desc,
        }
    }

    #[test]
    fn dates_accept_both_forms() {
        let midnight = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_datetime("end", "2025-07-01").unwrap(), midnight);
        assert_eq!(
            parse_datetime("end", "2025-07-01T03:00:00+03:00").unwrap(),
            midnight
        );
        assert!(parse_datetime("end", "next week").is_err());
    }

    #[test]
    fn query_parses_filters_and_sort() {
        let query: ViewQuery<Voucher> =
            view_query(&args("expired", Some("expires-at")), "bulk").unwrap();
        assert_eq!(query.status, Selector::Only(VoucherStatus::Expired));
        assert_eq!(query.kind, Selector::Only(VoucherType::Bulk));
        assert!(matches!(query.sort, Some((_, SortOrder::Desc))));
    }

    #[test]
    fn unknown_status_is_a_usage_error() {
        let err = view_query::<Voucher>(&args("pending", None), "all").unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "status"));
    }

    #[test]
    fn unknown_sort_key_is_rejected() {
        let err = view_query::<Voucher>(&args("all", Some("colour")), "all").unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "sort"));
    }
}
