// ── Console facade ──
//
// Single entry point for administrators. Routes typed `Command`s and the
// aggregate operations (issue, import, export, list) to an `EntityStore`.
// Holds no cached state: every read goes to the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::codegen::CodeTemplate;
use crate::command::{
    Command, CommandResult, CreateVoucherRequest, SubscriptionPatch, VoucherPatch,
};
use crate::config::{ConsoleConfig, ConsoleSettings};
use crate::error::{CoreError, ValidationErrors};
use crate::import::{ImportFormat, ImportPipeline, ImportReport, export_vouchers};
use crate::issue::{BulkIssuer, IssueReport, IssueRequest};
use crate::model::{EntityId, Payment, Subscription, Voucher, VoucherType};
use crate::store::{EntityStore, RemoteStore};

pub struct Console<S> {
    store: S,
    settings: ConsoleSettings,
}

impl Console<RemoteStore> {
    /// Console over the HTTP backend described by `config`.
    pub fn connect(config: &ConsoleConfig) -> Result<Self, CoreError> {
        let client = tollgate_api::ApiClient::from_api_key(
            config.url.as_str(),
            &config.api_key,
            &config.transport(),
        )?;
        debug!(base_url = %client.base_url(), "backend client ready");
        Ok(Self::new(RemoteStore::new(client), config.settings.clone()))
    }
}

impl<S: EntityStore> Console<S> {
    pub fn new(store: S, settings: ConsoleSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &ConsoleSettings {
        &self.settings
    }

    /// One code from the configured template, `prefix` overriding the default.
    pub fn generate_code(&self, prefix: Option<&str>) -> String {
        let codes = &self.settings.codes;
        CodeTemplate::new(prefix.unwrap_or(&codes.default_prefix).trim())
            .with_body(codes.charset.clone(), codes.body_length)
            .generate()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub async fn vouchers(&self) -> Result<Vec<Voucher>, CoreError> {
        self.store.list_entities().await
    }

    pub async fn subscriptions(&self) -> Result<Vec<Subscription>, CoreError> {
        self.store.list_entities().await
    }

    pub async fn payments(&self) -> Result<Vec<Payment>, CoreError> {
        self.store.list_entities().await
    }

    /// Look a voucher up by id or by exact code.
    pub async fn find_voucher(&self, id_or_code: &str) -> Result<Voucher, CoreError> {
        let id = EntityId::from(id_or_code);
        self.vouchers()
            .await?
            .into_iter()
            .find(|v| v.id == id || v.code == id_or_code)
            .ok_or_else(|| CoreError::not_found("voucher", id_or_code))
    }

    pub async fn find_subscription(&self, id: &EntityId) -> Result<Subscription, CoreError> {
        self.subscriptions()
            .await?
            .into_iter()
            .find(|s| &s.id == id)
            .ok_or_else(|| CoreError::not_found("subscription", id))
    }

    // ── Aggregate operations ─────────────────────────────────────────

    pub async fn issue_batch(&self, request: &IssueRequest) -> Result<IssueReport, CoreError> {
        BulkIssuer::new(&self.store, &self.settings.codes)
            .issue_batch(request)
            .await
    }

    pub async fn import_file(
        &self,
        raw: &str,
        format: ImportFormat,
    ) -> Result<ImportReport, CoreError> {
        Ok(ImportPipeline::new(&self.store)
            .import_file(raw, format)
            .await?)
    }

    /// Delimited text for `vouchers`, in the configured delimiter.
    pub fn export_vouchers(&self, vouchers: &[Voucher]) -> Result<String, CoreError> {
        Ok(export_vouchers(vouchers, self.settings.delimiter)?)
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        self.execute_at(cmd, Utc::now()).await
    }

    /// Execute with an explicit clock.
    pub async fn execute_at(
        &self,
        cmd: Command,
        now: DateTime<Utc>,
    ) -> Result<CommandResult, CoreError> {
        match cmd {
            // ── Vouchers ─────────────────────────────────────────────
            Command::CreateVoucher(request) => {
                let request = checked_voucher(request)?;
                let voucher: Voucher = self.store.create_entity(request).await?;
                info!(code = %voucher.code, "voucher created");
                Ok(CommandResult::Voucher(Box::new(voucher)))
            }
            Command::IssueVouchers(request) => {
                Ok(CommandResult::Issued(self.issue_batch(&request).await?))
            }
            Command::UpdateVoucher { id, patch } => {
                let voucher: Voucher = self.store.update_entity(&id, patch).await?;
                Ok(CommandResult::Voucher(Box::new(voucher)))
            }
            Command::RedeemVoucher { code, user_id } => {
                let mut voucher = self.find_voucher(&code).await?;
                voucher.redeem(&user_id, now)?;
                let updated: Voucher = self
                    .store
                    .update_entity(&voucher.id, VoucherPatch::redemption(&voucher))
                    .await?;
                info!(
                    code = %updated.code,
                    used_count = updated.used_count,
                    max_uses = updated.max_uses,
                    "voucher redeemed"
                );
                Ok(CommandResult::Voucher(Box::new(updated)))
            }
            Command::DeleteVoucher { id } => {
                self.store.delete_entity::<Voucher>(&id).await?;
                Ok(CommandResult::Ok)
            }

            // ── Subscriptions ────────────────────────────────────────
            Command::CreateSubscription(request) => {
                if request.package_key.trim().is_empty() {
                    let mut errors = ValidationErrors::new();
                    errors.add("packageKey", "is required");
                    return Err(errors.into());
                }
                let subscription: Subscription = self.store.create_entity(request).await?;
                Ok(CommandResult::Subscription(Box::new(subscription)))
            }
            Command::UpdateSubscription { id, patch } => {
                let subscription: Subscription = self.store.update_entity(&id, patch).await?;
                Ok(CommandResult::Subscription(Box::new(subscription)))
            }
            Command::SuspendSubscription { id } => {
                let patch = SubscriptionPatch {
                    suspended: Some(true),
                    ..SubscriptionPatch::default()
                };
                let subscription: Subscription = self.store.update_entity(&id, patch).await?;
                Ok(CommandResult::Subscription(Box::new(subscription)))
            }
            Command::ResumeSubscription { id } => {
                let current = self.find_subscription(&id).await?;
                if current.end_at.is_some_and(|end| end <= now) {
                    return Err(CoreError::Rejected {
                        message: format!("subscription {id} has ended; extend it instead"),
                    });
                }
                let patch = SubscriptionPatch {
                    suspended: Some(false),
                    active: Some(true),
                    ..SubscriptionPatch::default()
                };
                let subscription: Subscription = self.store.update_entity(&id, patch).await?;
                Ok(CommandResult::Subscription(Box::new(subscription)))
            }
            Command::ExtendSubscription { id, until } => {
                if until <= now {
                    let mut errors = ValidationErrors::new();
                    errors.add("endAt", "must be in the future");
                    return Err(errors.into());
                }
                let patch = SubscriptionPatch {
                    end_at: Some(until),
                    active: Some(true),
                    ..SubscriptionPatch::default()
                };
                let subscription: Subscription = self.store.update_entity(&id, patch).await?;
                info!(%id, end_at = %until, "subscription extended");
                Ok(CommandResult::Subscription(Box::new(subscription)))
            }
            Command::DeleteSubscription { id } => {
                self.store.delete_entity::<Subscription>(&id).await?;
                Ok(CommandResult::Ok)
            }
        }
    }
}

/// Field checks for a single creation; the type always follows `maxUses`.
fn checked_voucher(mut request: CreateVoucherRequest) -> Result<CreateVoucherRequest, CoreError> {
    let mut errors = ValidationErrors::new();
    request.package_key = request.package_key.trim().to_owned();
    if request.package_key.is_empty() {
        errors.add("packageKey", "is required");
    }
    if request.value.is_some_and(|v| v < Decimal::ZERO) {
        errors.add("value", "must not be negative");
    }
    if request.max_uses < 1 {
        errors.add("maxUses", "must be at least 1");
    }
    if request.used_count > request.max_uses {
        errors.add("usedCount", "must not exceed maxUses");
    }
    if request.code.as_deref().is_some_and(|c| c.trim().is_empty()) {
        request.code = None;
    }
    errors.into_result()?;
    request.voucher_type = VoucherType::for_max_uses(request.max_uses);
    Ok(request)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::command::CreateSubscriptionRequest;
    use crate::status::SubscriptionStatus;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn console() -> Console<MemoryStore> {
        Console::new(MemoryStore::new(), ConsoleSettings::default())
    }

    async fn subscription_ending(
        console: &Console<MemoryStore>,
        end_at: Option<DateTime<Utc>>,
    ) -> Subscription {
        let request = CreateSubscriptionRequest {
            user_id: EntityId::from("user-1"),
            package_key: "monthly".into(),
            active: true,
            suspended: false,
            start_at: None,
            end_at,
            notes: None,
        };
        match console
            .execute_at(Command::CreateSubscription(request), now())
            .await
            .unwrap()
        {
            CommandResult::Subscription(s) => *s,
            other => panic!("unexpected result {other:?}"),
        }
    }

    fn voucher_of(result: CommandResult) -> Voucher {
        match result {
            CommandResult::Voucher(v) => *v,
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_infers_type_from_max_uses() {
        let console = console();
        let mut request = CreateVoucherRequest::new("daily");
        request.code = Some("DAY_AAAAAA".into());
        request.max_uses = 4;

        let voucher = voucher_of(
            console
                .execute(Command::CreateVoucher(request))
                .await
                .unwrap(),
        );
        assert_eq!(voucher.voucher_type, VoucherType::Bulk);
        assert_eq!(voucher.code, "DAY_AAAAAA");
    }

    #[tokio::test]
    async fn create_rejects_blank_package() {
        let console = console();
        let err = console
            .execute(Command::CreateVoucher(CreateVoucherRequest::new("  ")))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(console.store().calls().create, 0);
    }

    #[tokio::test]
    async fn redeem_by_code_until_exhausted() {
        let console = console();
        let mut request = CreateVoucherRequest::new("daily");
        request.code = Some("TWO_AAAAAA".into());
        request.max_uses = 2;
        console
            .execute(Command::CreateVoucher(request))
            .await
            .unwrap();

        for expected in 1..=2 {
            let v = voucher_of(
                console
                    .execute_at(
                        Command::RedeemVoucher {
                            code: "TWO_AAAAAA".into(),
                            user_id: "u1".into(),
                        },
                        now(),
                    )
                    .await
                    .unwrap(),
            );
            assert_eq!(v.used_count, expected);
        }

        let err = console
            .execute_at(
                Command::RedeemVoucher {
                    code: "TWO_AAAAAA".into(),
                    user_id: "u1".into(),
                },
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Redeem(_)));

        let stored = console.find_voucher("TWO_AAAAAA").await.unwrap();
        assert_eq!(stored.used_count, 2);
        assert!(stored.used);
    }

    #[tokio::test]
    async fn suspend_then_resume() {
        let console = console();
        let sub = subscription_ending(&console, Some(now() + Duration::days(5))).await;

        console
            .execute_at(Command::SuspendSubscription { id: sub.id.clone() }, now())
            .await
            .unwrap();
        let suspended = console.find_subscription(&sub.id).await.unwrap();
        assert_eq!(suspended.status(now()), SubscriptionStatus::Suspended);

        console
            .execute_at(Command::ResumeSubscription { id: sub.id.clone() }, now())
            .await
            .unwrap();
        let resumed = console.find_subscription(&sub.id).await.unwrap();
        assert_eq!(resumed.status(now()), SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn resume_after_end_is_rejected() {
        let console = console();
        let sub = subscription_ending(&console, Some(now() - Duration::days(1))).await;

        let err = console
            .execute_at(Command::ResumeSubscription { id: sub.id }, now())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[tokio::test]
    async fn extend_needs_a_future_date() {
        let console = console();
        let sub = subscription_ending(&console, Some(now() - Duration::days(1))).await;

        let err = console
            .execute_at(
                Command::ExtendSubscription {
                    id: sub.id.clone(),
                    until: now(),
                },
                now(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let until = sub.extended_end(30, now());
        console
            .execute_at(Command::ExtendSubscription { id: sub.id.clone(), until }, now())
            .await
            .unwrap();
        let extended = console.find_subscription(&sub.id).await.unwrap();
        assert_eq!(extended.end_at, Some(now() + Duration::days(30)));
        assert_eq!(extended.status(now()), SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn missing_voucher_is_not_found() {
        let err = console().find_voucher("NOPE").await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn generated_code_uses_settings() {
        let code = console().generate_code(Some("PROMO"));
        assert!(code.starts_with("PROMO_"));
        assert_eq!(code.len(), "PROMO_".len() + 6);
    }
}
