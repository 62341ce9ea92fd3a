// ── Bulk voucher issuance ──
//
// Validate a batch request, generate `count` distinct codes, then create
// one voucher per code through the submission queue. Per-code failures
// are collected; they never abort the rest of the batch.

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::codegen::CodeTemplate;
use crate::command::CreateVoucherRequest;
use crate::config::CodeSettings;
use crate::error::{CoreError, ValidationErrors};
use crate::model::{Voucher, VoucherType};
use crate::queue::SubmissionQueue;
use crate::store::EntityStore;

/// Largest batch a single request may issue.
pub const MAX_BATCH_SIZE: u32 = 1000;

fn default_max_uses() -> u32 {
    1
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    pub package_key: String,
    #[serde(default)]
    pub value: Decimal,
    pub count: u32,
    pub prefix: String,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "default_max_uses")]
    pub max_uses: u32,
    #[serde(default)]
    pub duration_seconds: Option<u64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl IssueRequest {
    /// Free, active, single-use vouchers with no expiry.
    pub fn new(package_key: impl Into<String>, count: u32, prefix: impl Into<String>) -> Self {
        Self {
            package_key: package_key.into(),
            value: Decimal::ZERO,
            count,
            prefix: prefix.into(),
            suffix: None,
            expires_at: None,
            active: true,
            max_uses: 1,
            duration_seconds: None,
            notes: None,
        }
    }

    fn voucher_for(&self, code: String) -> CreateVoucherRequest {
        CreateVoucherRequest {
            code: Some(code),
            package_key: self.package_key.trim().to_owned(),
            value: Some(self.value),
            voucher_type: VoucherType::for_max_uses(self.max_uses),
            active: self.active,
            max_uses: self.max_uses,
            used_count: 0,
            duration_seconds: self.duration_seconds,
            expires_at: self.expires_at,
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueFailure {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueReport {
    pub issued: Vec<Voucher>,
    pub failures: Vec<IssueFailure>,
}

impl IssueReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

// ── Code generation ─────────────────────────────────────────────────

/// `count` distinct codes in generation order.
///
/// Collisions are discarded and regenerated, so the template's code space
/// must hold at least `count` codes.
pub fn generate_unique_codes<R: Rng + ?Sized>(
    template: &CodeTemplate,
    count: usize,
    rng: &mut R,
) -> Vec<String> {
    let mut codes = IndexSet::with_capacity(count);
    while codes.len() < count {
        codes.insert(template.generate_with(rng));
    }
    codes.into_iter().collect()
}

// ── Issuer ──────────────────────────────────────────────────────────

pub struct BulkIssuer<'a, S> {
    store: &'a S,
    settings: &'a CodeSettings,
}

impl<'a, S: EntityStore> BulkIssuer<'a, S> {
    pub fn new(store: &'a S, settings: &'a CodeSettings) -> Self {
        Self { store, settings }
    }

    /// Check every field; on success return the template codes are drawn from.
    pub fn validate(&self, request: &IssueRequest) -> Result<CodeTemplate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if request.package_key.trim().is_empty() {
            errors.add("packageKey", "is required");
        }
        let prefix = request.prefix.trim();
        if prefix.is_empty() {
            errors.add("prefix", "is required");
        }
        if request.count == 0 || request.count > MAX_BATCH_SIZE {
            errors.add("count", format!("must be between 1 and {MAX_BATCH_SIZE}"));
        }
        if request.value < Decimal::ZERO {
            errors.add("value", "must not be negative");
        }
        if request.max_uses < 1 {
            errors.add("maxUses", "must be at least 1");
        }

        let template = CodeTemplate::new(prefix)
            .with_suffix(request.suffix.as_ref().map(|s| s.trim().to_owned()))
            .with_body(self.settings.charset.clone(), self.settings.body_length);

        let space = template.code_space();
        if space < u128::from(request.count) {
            errors.add(
                "count",
                format!("the code template only allows {space} distinct codes"),
            );
        }

        errors.into_result().map(|()| template)
    }

    pub async fn issue_batch(&self, request: &IssueRequest) -> Result<IssueReport, CoreError> {
        let template = self.validate(request)?;
        let codes = generate_unique_codes(&template, count_of(request), &mut rand::thread_rng());
        Ok(self.submit(request, codes).await)
    }

    /// Same as [`issue_batch`](Self::issue_batch) with a caller-supplied RNG.
    pub async fn issue_batch_with<R: Rng + ?Sized>(
        &self,
        request: &IssueRequest,
        rng: &mut R,
    ) -> Result<IssueReport, CoreError> {
        let template = self.validate(request)?;
        let codes = generate_unique_codes(&template, count_of(request), rng);
        Ok(self.submit(request, codes).await)
    }

    async fn submit(&self, request: &IssueRequest, codes: Vec<String>) -> IssueReport {
        let queue: SubmissionQueue<String> = codes.into_iter().collect();
        let outcomes = queue
            .run(|code| {
                self.store
                    .create_entity::<Voucher>(request.voucher_for(code))
            })
            .await;

        let mut report = IssueReport::default();
        for outcome in outcomes {
            match outcome.result {
                Ok(voucher) => report.issued.push(voucher),
                Err(err) => report.failures.push(IssueFailure {
                    code: outcome.item,
                    message: err.to_string(),
                }),
            }
        }

        info!(
            package = %request.package_key,
            requested = request.count,
            issued = report.issued.len(),
            failed = report.failures.len(),
            "voucher batch submitted"
        );
        report
    }
}

fn count_of(request: &IssueRequest) -> usize {
    usize::try_from(request.count).unwrap_or(usize::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codegen::Charset;
    use crate::model::EntityId;
    use crate::store::MemoryStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn is_default_code(code: &str, prefix: &str) -> bool {
        code.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .is_some_and(|body| {
                body.len() == 6
                    && body
                        .chars()
                        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            })
    }

    #[tokio::test]
    async fn issues_ten_unique_codes() {
        let store = MemoryStore::new();
        let settings = CodeSettings::default();
        let issuer = BulkIssuer::new(&store, &settings);

        let report = issuer
            .issue_batch(&IssueRequest::new("P", 10, "VOUCHER"))
            .await
            .unwrap();

        assert!(report.is_complete());
        assert_eq!(report.issued.len(), 10);
        let codes: HashSet<_> = report.issued.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes.len(), 10);
        assert!(codes.iter().all(|c| is_default_code(c, "VOUCHER")));
        assert!(report.issued.iter().all(|v| v.voucher_type == VoucherType::Single));
    }

    #[tokio::test]
    async fn oversized_batch_submits_nothing() {
        let store = MemoryStore::new();
        let settings = CodeSettings::default();
        let issuer = BulkIssuer::new(&store, &settings);

        let err = issuer
            .issue_batch(&IssueRequest::new("P", 1001, "VOUCHER"))
            .await
            .unwrap_err();

        let CoreError::Validation(errors) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(errors.get("count").is_some());
        assert_eq!(store.calls().create, 0);
    }

    #[test]
    fn validation_collects_every_field() {
        let store = MemoryStore::new();
        let settings = CodeSettings::default();
        let issuer = BulkIssuer::new(&store, &settings);

        let mut request = IssueRequest::new("  ", 0, "");
        request.value = Decimal::new(-5, 0);
        request.max_uses = 0;

        let errors = issuer.validate(&request).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, ["packageKey", "prefix", "count", "value", "maxUses"]);
    }

    #[test]
    fn code_space_must_fit_the_batch() {
        let store = MemoryStore::new();
        let settings = CodeSettings {
            charset: Charset::new("AB").unwrap(),
            body_length: 1,
            ..CodeSettings::default()
        };
        let issuer = BulkIssuer::new(&store, &settings);

        assert!(issuer.validate(&IssueRequest::new("P", 2, "X")).is_ok());
        let errors = issuer
            .validate(&IssueRequest::new("P", 3, "X"))
            .unwrap_err();
        assert!(errors.get("count").unwrap().contains("2 distinct codes"));
    }

    #[test]
    fn collisions_are_regenerated() {
        let template = CodeTemplate::new("X").with_body(Charset::new("AB").unwrap(), 1);
        let mut rng = StdRng::seed_from_u64(1);
        let mut codes = generate_unique_codes(&template, 2, &mut rng);
        codes.sort();
        assert_eq!(codes, ["X_A", "X_B"]);
    }

    #[tokio::test]
    async fn failures_do_not_abort_siblings() {
        let store = MemoryStore::new();
        store
            .reserve_code("X_A", &EntityId::from("someone-else"))
            .unwrap();
        let settings = CodeSettings {
            charset: Charset::new("AB").unwrap(),
            body_length: 1,
            ..CodeSettings::default()
        };
        let issuer = BulkIssuer::new(&store, &settings);

        let mut request = IssueRequest::new("P", 2, "X");
        request.max_uses = 5;
        let report = issuer.issue_batch(&request).await.unwrap();

        assert_eq!(store.calls().create, 2);
        assert_eq!(report.issued.len(), 1);
        assert_eq!(report.issued[0].code, "X_B");
        assert_eq!(report.issued[0].voucher_type, VoucherType::Bulk);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].code, "X_A");
    }
}
