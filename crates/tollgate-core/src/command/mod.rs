// ── Command API ──
//
// Every write operation is a `Command`. The console routes each variant
// to the entity store; aggregate operations (issue) return their report.

pub mod requests;

use chrono::{DateTime, Utc};

use crate::issue::{IssueReport, IssueRequest};
use crate::model::{EntityId, Subscription, Voucher};

pub use requests::{
    CreateSubscriptionRequest, CreateVoucherRequest, SubscriptionPatch, VoucherPatch,
};

/// All write operations against the entitlement backend.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Voucher operations ───────────────────────────────────────────
    CreateVoucher(CreateVoucherRequest),
    IssueVouchers(IssueRequest),
    UpdateVoucher {
        id: EntityId,
        patch: VoucherPatch,
    },
    RedeemVoucher {
        code: String,
        user_id: String,
    },
    DeleteVoucher {
        id: EntityId,
    },

    // ── Subscription operations ──────────────────────────────────────
    CreateSubscription(CreateSubscriptionRequest),
    UpdateSubscription {
        id: EntityId,
        patch: SubscriptionPatch,
    },
    SuspendSubscription {
        id: EntityId,
    },
    ResumeSubscription {
        id: EntityId,
    },
    ExtendSubscription {
        id: EntityId,
        until: DateTime<Utc>,
    },
    DeleteSubscription {
        id: EntityId,
    },
}

/// Result of a successfully executed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    Voucher(Box<Voucher>),
    Issued(IssueReport),
    Subscription(Box<Subscription>),
}
