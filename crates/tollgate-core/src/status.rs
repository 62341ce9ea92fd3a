// ── Status derivation ──
//
// Entitlements store booleans and dates; the lifecycle status shown to
// administrators is derived from them here and nowhere else. Every
// function is pure and total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::model::{Subscription, Voucher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VoucherStatus {
    Used,
    Expired,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    Suspended,
    Active,
    Expired,
}

/// First matching rule wins: used, expired, active, inactive.
pub fn derive_voucher_status(voucher: &Voucher, now: DateTime<Utc>) -> VoucherStatus {
    if voucher.used || voucher.used_count >= voucher.max_uses {
        return VoucherStatus::Used;
    }
    if voucher.expires_at.is_some_and(|at| at < now) {
        return VoucherStatus::Expired;
    }
    if voucher.active {
        VoucherStatus::Active
    } else {
        VoucherStatus::Inactive
    }
}

/// Suspension overrides everything; otherwise active only while the end
/// date (if any) lies in the future.
pub fn derive_subscription_status(
    subscription: &Subscription,
    now: DateTime<Utc>,
) -> SubscriptionStatus {
    if subscription.suspended {
        return SubscriptionStatus::Suspended;
    }
    let within_term = subscription.end_at.is_none_or(|end| end > now);
    if subscription.active && within_term {
        SubscriptionStatus::Active
    } else {
        SubscriptionStatus::Expired
    }
}

// ── Time remaining ──────────────────────────────────────────────────

/// Structured time left until an end or expiry date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Remaining {
    NoExpiry,
    Expired,
    Left { days: u64, hours: u64, minutes: u64 },
}

impl std::fmt::Display for Remaining {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoExpiry => f.write_str("no expiry"),
            Self::Expired => f.write_str("expired"),
            Self::Left {
                days,
                hours,
                minutes,
            } => {
                if *days > 0 {
                    write!(f, "{days}d {hours}h")
                } else if *hours > 0 {
                    write!(f, "{hours}h {minutes}m")
                } else {
                    write!(f, "{minutes}m")
                }
            }
        }
    }
}

/// An end equal to `now` has already passed.
pub fn time_remaining(end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Remaining {
    let Some(end) = end else {
        return Remaining::NoExpiry;
    };
    if end <= now {
        return Remaining::Expired;
    }
    let total_minutes = u64::try_from((end - now).num_minutes()).unwrap_or(0);
    Remaining::Left {
        days: total_minutes / (24 * 60),
        hours: (total_minutes / 60) % 24,
        minutes: total_minutes % 60,
    }
}
