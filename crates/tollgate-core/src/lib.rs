// tollgate-core: entitlement lifecycle, bulk issuance, and import/export
// between tollgate-api and its consumers.

pub mod codegen;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod import;
pub mod issue;
pub mod model;
pub mod queue;
pub mod status;
pub mod store;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use codegen::{Charset, CharsetError, CodeTemplate};
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{CodeSettings, ConsoleConfig, ConsoleSettings, TlsVerification};
pub use console::Console;
pub use error::{CoreError, ValidationErrors};
pub use import::{ExportError, ImportFormat, ImportPipeline, ImportReport, ParseError, RowError};
pub use issue::{BulkIssuer, IssueFailure, IssueReport, IssueRequest, MAX_BATCH_SIZE};
pub use queue::{Submission, SubmissionQueue};
pub use status::{
    Remaining, SubscriptionStatus, VoucherStatus, derive_subscription_status,
    derive_voucher_status, time_remaining,
};
pub use store::{CallCounts, EntityKind, EntityStore, MemoryStore, RemoteStore};
pub use view::{Selector, SortOrder, ViewQuery, Viewable, view};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    EntityId, Payment, PaymentStatus, RedeemError, Subscription, UserSummary, Voucher,
    VoucherType,
};
