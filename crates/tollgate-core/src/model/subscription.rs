// ── Subscription domain types ──

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use crate::status::{SubscriptionStatus, derive_subscription_status};

/// Display summary of the subscribed user, embedded by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Continuous, date-bounded access for a known user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: EntityId,
    pub user_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
    pub package_key: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub suspended: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn status(&self, now: DateTime<Utc>) -> SubscriptionStatus {
        derive_subscription_status(self, now)
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }

    pub fn user_phone(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.phone.as_deref())
    }

    /// New end date after adding `days`.
    ///
    /// Time still left is kept; an already-ended subscription restarts
    /// its count from `now`.
    pub fn extended_end(&self, days: u32, now: DateTime<Utc>) -> DateTime<Utc> {
        let base = match self.end_at {
            Some(end) if end > now => end,
            _ => now,
        };
        base + Duration::days(i64::from(days))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn subscription(id: &str, phone: &str) -> Subscription {
        Subscription {
            id: EntityId::from(id),
            user_id: EntityId::from(format!("user-{id}")),
            user: Some(UserSummary {
                name: Some(format!("User {id}")),
                phone: Some(phone.to_owned()),
            }),
            package_key: "monthly".into(),
            active: true,
            suspended: false,
            start_at: None,
            end_at: None,
            notes: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn extend_keeps_remaining_time() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut s = subscription("s1", "0712000001");
        s.end_at = Some(now + Duration::days(3));

        assert_eq!(s.extended_end(30, now), now + Duration::days(33));
    }

    #[test]
    fn extend_after_expiry_counts_from_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let mut s = subscription("s1", "0712000001");
        s.end_at = Some(now - Duration::days(10));

        assert_eq!(s.extended_end(7, now), now + Duration::days(7));
    }

    #[test]
    fn embedded_user_is_optional() {
        let json = serde_json::json!({
            "id": "s9",
            "userId": "u9",
            "packageKey": "weekly",
            "active": true,
            "createdAt": "2025-02-01T00:00:00Z"
        });
        let s: Subscription = serde_json::from_value(json).unwrap();
        assert!(s.user_phone().is_none());
        assert!(!s.suspended);
    }
}
