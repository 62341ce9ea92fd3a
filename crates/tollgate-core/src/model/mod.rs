// ── Domain model ──
//
// Canonical entitlement records. Field names follow the backend's
// camelCase JSON so the same types travel over the wire unchanged.

pub mod entity_id;
pub mod payment;
pub mod subscription;
pub mod voucher;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity_id::EntityId;
pub use payment::{Payment, PaymentStatus};
pub use subscription::{Subscription, UserSummary};
pub use voucher::{RedeemError, Voucher, VoucherType};
