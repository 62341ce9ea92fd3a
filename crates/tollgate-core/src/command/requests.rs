// ── Typed request structs for Command payloads ──
//
// Creation bodies and partial-update patches, serialized straight onto
// the backend's camelCase JSON. Absent options are omitted so a patch
// only touches what it names.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::model::{EntityId, Voucher, VoucherType};

// ── Voucher ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateVoucherRequest {
    /// Omitted to let the backend generate one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub package_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,
    #[serde(rename = "type")]
    pub voucher_type: VoucherType,
    pub active: bool,
    pub max_uses: u32,
    pub used_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl CreateVoucherRequest {
    /// Active, single-use, unused voucher for `package_key`.
    pub fn new(package_key: impl Into<String>) -> Self {
        Self {
            code: None,
            package_key: package_key.into(),
            value: None,
            voucher_type: VoucherType::Single,
            active: true,
            max_uses: 1,
            used_count: 0,
            duration_seconds: None,
            expires_at: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl VoucherPatch {
    pub fn set_active(active: bool) -> Self {
        Self {
            active: Some(active),
            ..Self::default()
        }
    }

    /// Usage fields of an already-redeemed voucher.
    pub fn redemption(voucher: &Voucher) -> Self {
        Self {
            used: Some(voucher.used),
            used_count: Some(voucher.used_count),
            used_by: voucher.used_by.clone(),
            used_at: voucher.used_at,
            ..Self::default()
        }
    }
}

// ── Subscription ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub user_id: EntityId,
    pub package_key: String,
    pub active: bool,
    pub suspended: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspended: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_voucher_omits_absent_fields() {
        let req = CreateVoucherRequest::new("daily");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "packageKey": "daily",
                "type": "single",
                "active": true,
                "maxUses": 1,
                "usedCount": 0
            })
        );
    }

    #[test]
    fn patch_only_names_what_changes() {
        let patch = VoucherPatch::set_active(false);
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "active": false }));
    }
}
