// ── Voucher domain types ──

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use super::entity_id::EntityId;
use crate::status::{VoucherStatus, derive_voucher_status};

/// Whether a code may be redeemed once or several times.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VoucherType {
    #[default]
    Single,
    Bulk,
}

impl VoucherType {
    /// `bulk` exactly when the voucher allows more than one use.
    pub fn for_max_uses(max_uses: u32) -> Self {
        if max_uses >= 2 {
            Self::Bulk
        } else {
            Self::Single
        }
    }
}

fn default_max_uses() -> u32 {
    1
}

/// Redeemable access code granting one package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: EntityId,
    pub code: String,
    pub package_key: String,
    #[serde(default, alias = "valueKES")]
    pub value: Decimal,
    #[serde(rename = "type", default)]
    pub voucher_type: VoucherType,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub used: bool,
    #[serde(default = "default_max_uses")]
    pub max_uses: u32,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Why a voucher refused to be redeemed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedeemError {
    #[error("voucher {code} has no uses left")]
    Exhausted { code: String },

    #[error("voucher {code} has expired")]
    Expired { code: String },

    #[error("voucher {code} is not active")]
    Inactive { code: String },
}

impl Voucher {
    pub fn status(&self, now: DateTime<Utc>) -> VoucherStatus {
        derive_voucher_status(self, now)
    }

    pub fn remaining_uses(&self) -> u32 {
        self.max_uses.saturating_sub(self.used_count)
    }

    /// Record one redemption by `user_id`.
    ///
    /// Only an `active` voucher can be redeemed. On success `used_count`
    /// grows by one, never past `max_uses`, and `used` flips once the last
    /// use is consumed.
    pub fn redeem(&mut self, user_id: &str, now: DateTime<Utc>) -> Result<(), RedeemError> {
        let code = self.code.clone();
        match self.status(now) {
            VoucherStatus::Used => return Err(RedeemError::Exhausted { code }),
            VoucherStatus::Expired => return Err(RedeemError::Expired { code }),
            VoucherStatus::Inactive => return Err(RedeemError::Inactive { code }),
            VoucherStatus::Active => {}
        }

        self.used_count += 1;
        self.used_at = Some(now);
        self.used_by = Some(user_id.to_owned());
        if self.used_count >= self.max_uses {
            self.used = true;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    pub(crate) fn voucher(code: &str) -> Voucher {
        Voucher {
            id: EntityId::from(format!("id-{code}")),
            code: code.to_owned(),
            package_key: "daily".into(),
            value: Decimal::new(50, 0),
            voucher_type: VoucherType::Single,
            active: true,
            used: false,
            max_uses: 1,
            used_count: 0,
            used_by: None,
            duration_seconds: None,
            used_at: None,
            expires_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
            notes: None,
        }
    }

    #[test]
    fn type_follows_max_uses() {
        assert_eq!(VoucherType::for_max_uses(1), VoucherType::Single);
        assert_eq!(VoucherType::for_max_uses(2), VoucherType::Bulk);
    }

    #[test]
    fn deserializes_backend_shape() {
        let json = serde_json::json!({
            "id": "abc",
            "code": "VOUCHER_AB12CD",
            "packageKey": "weekly",
            "valueKES": 250,
            "type": "bulk",
            "active": true,
            "maxUses": 5,
            "usedCount": 2,
            "createdAt": "2025-03-01T08:00:00Z"
        });
        let v: Voucher = serde_json::from_value(json).unwrap();
        assert_eq!(v.value, Decimal::new(250, 0));
        assert_eq!(v.voucher_type, VoucherType::Bulk);
        assert_eq!(v.remaining_uses(), 3);
        assert!(!v.used);
    }

    #[test]
    fn single_use_redeem_marks_used() {
        let now = Utc::now();
        let mut v = voucher("ONE_AAAAAA");
        v.redeem("user-1", now).unwrap();

        assert_eq!(v.used_count, 1);
        assert!(v.used);
        assert_eq!(v.used_by.as_deref(), Some("user-1"));
        assert_eq!(v.status(now), VoucherStatus::Used);
    }

    #[test]
    fn redeem_never_exceeds_max_uses() {
        let now = Utc::now();
        let mut v = voucher("MULTI_BBBBBB");
        v.max_uses = 3;
        v.voucher_type = VoucherType::Bulk;

        for _ in 0..3 {
            v.redeem("user-2", now).unwrap();
            assert!(v.used_count <= v.max_uses);
        }
        assert!(v.used);

        let err = v.redeem("user-3", now).unwrap_err();
        assert_eq!(
            err,
            RedeemError::Exhausted {
                code: "MULTI_BBBBBB".into()
            }
        );
        assert_eq!(v.used_count, 3);
    }

    #[test]
    fn redeem_refuses_expired_and_inactive() {
        let now = Utc::now();

        let mut expired = voucher("OLD_CCCCCC");
        expired.expires_at = Some(now - Duration::hours(1));
        assert!(matches!(
            expired.redeem("u", now),
            Err(RedeemError::Expired { .. })
        ));
        assert_eq!(expired.used_count, 0);

        let mut inactive = voucher("OFF_DDDDDD");
        inactive.active = false;
        assert!(matches!(
            inactive.redeem("u", now),
            Err(RedeemError::Inactive { .. })
        ));
    }
}
