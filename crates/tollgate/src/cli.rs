//! Clap derive structures for the `tollgate` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! Only clap types appear here so `build.rs` can include this file.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tollgate -- administer vouchers and subscriptions from the command line
#[derive(Debug, Parser)]
#[command(
    name = "tollgate",
    version,
    about = "Manage hotspot vouchers and subscriptions from the command line",
    long_about = "Administer the entitlements of a subscription service.\n\n\
        Issue and import voucher batches, redeem codes, and suspend, resume,\n\
        or extend subscriptions against a tollgate backend.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend profile to use
    #[arg(long, short = 'p', env = "TOLLGATE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Backend URL (overrides profile)
    #[arg(long, short = 'b', env = "TOLLGATE_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Backend API key
    #[arg(long, env = "TOLLGATE_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TOLLGATE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "TOLLGATE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "TOLLGATE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortDirection {
    Asc,
    Desc,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage vouchers
    #[command(alias = "v")]
    Vouchers(VouchersArgs),

    /// Manage subscriptions
    #[command(alias = "subs")]
    Subscriptions(SubscriptionsArgs),

    /// View payments
    Payments(PaymentsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared View Arguments ────────────────────────────────────────────

/// Search, status filter, and sort shared by all list commands.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Case-insensitive search term
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Status filter ("all" disables it)
    #[arg(long, default_value = "all")]
    pub status: String,

    /// Sort key (e.g. "code", "expires-at", "created-at")
    #[arg(long)]
    pub sort: Option<String>,

    /// Sort order
    #[arg(long, default_value = "asc")]
    pub order: SortDirection,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  VOUCHERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct VouchersArgs {
    #[command(subcommand)]
    pub command: VouchersCommand,
}

/// Fields shared by single creation and batch issuance.
#[derive(Debug, Args)]
pub struct VoucherSpec {
    /// Package the voucher grants
    #[arg(long, required = true)]
    pub package: String,

    /// Price in KES
    #[arg(long, default_value = "0")]
    pub value: String,

    /// Redemptions allowed per voucher
    #[arg(long, default_value = "1")]
    pub max_uses: u32,

    /// Package duration in seconds
    #[arg(long)]
    pub duration_seconds: Option<u64>,

    /// Expiry (RFC 3339 or YYYY-MM-DD)
    #[arg(long)]
    pub expires: Option<String>,

    /// Create the voucher disabled
    #[arg(long)]
    pub inactive: bool,

    /// Free-form notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum VouchersCommand {
    /// List vouchers
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        view: ViewArgs,

        /// Type filter: single, bulk, or all
        #[arg(long = "type", default_value = "all")]
        voucher_type: String,
    },

    /// Get voucher details
    Get {
        /// Voucher ID or code
        voucher: String,
    },

    /// Create a single voucher
    Create {
        #[command(flatten)]
        spec: VoucherSpec,

        /// Explicit code (generated when omitted)
        #[arg(long)]
        code: Option<String>,

        /// Prefix for the generated code
        #[arg(long, conflicts_with = "code")]
        prefix: Option<String>,
    },

    /// Issue a batch of vouchers with generated codes
    Issue {
        #[command(flatten)]
        spec: VoucherSpec,

        /// Number of vouchers (1-1000)
        #[arg(long, required = true)]
        count: u32,

        /// Code prefix (profile default when omitted)
        #[arg(long)]
        prefix: Option<String>,

        /// Code suffix
        #[arg(long)]
        suffix: Option<String>,
    },

    /// Import vouchers from a CSV or JSON file
    Import {
        /// File to import (.json is read as records, anything else as delimited text)
        file: PathBuf,

        /// Column delimiter (profile default when omitted)
        #[arg(long)]
        delimiter: Option<String>,
    },

    /// Export vouchers as delimited text
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Type filter: single, bulk, or all
        #[arg(long = "type", default_value = "all")]
        voucher_type: String,

        /// Write to a file instead of stdout
        #[arg(long = "out", short = 'O')]
        out: Option<PathBuf>,

        /// Column delimiter (profile default when omitted)
        #[arg(long)]
        delimiter: Option<String>,
    },

    /// Redeem a voucher for a user
    Redeem {
        /// Voucher code
        code: String,

        /// Redeeming user
        #[arg(long, required = true)]
        user: String,
    },

    /// Enable a voucher
    Enable {
        /// Voucher ID or code
        voucher: String,
    },

    /// Disable a voucher
    Disable {
        /// Voucher ID or code
        voucher: String,
    },

    /// Delete a voucher
    Delete {
        /// Voucher ID or code
        voucher: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SUBSCRIPTIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SubscriptionsArgs {
    #[command(subcommand)]
    pub command: SubscriptionsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SubscriptionsCommand {
    /// List subscriptions
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        view: ViewArgs,

        /// Package filter ("all" disables it)
        #[arg(long, default_value = "all")]
        package: String,
    },

    /// Get subscription details
    Get {
        /// Subscription ID
        id: String,
    },

    /// Create a subscription
    #[command(group(ArgGroup::new("term").args(["end", "days"])))]
    Create {
        /// Subscribing user ID
        #[arg(long, required = true)]
        user: String,

        /// Package key
        #[arg(long, required = true)]
        package: String,

        /// Start (RFC 3339 or YYYY-MM-DD, default now)
        #[arg(long)]
        start: Option<String>,

        /// End (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Length in days from the start
        #[arg(long)]
        days: Option<u32>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Suspend a subscription
    Suspend {
        /// Subscription ID
        id: String,
    },

    /// Resume a suspended subscription
    Resume {
        /// Subscription ID
        id: String,
    },

    /// Extend a subscription
    #[command(group(ArgGroup::new("extension").args(["days", "until"]).required(true)))]
    Extend {
        /// Subscription ID
        id: String,

        /// Days to add (remaining time is kept)
        #[arg(long)]
        days: Option<u32>,

        /// New end date (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        until: Option<String>,
    },

    /// Delete a subscription
    Delete {
        /// Subscription ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PAYMENTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PaymentsArgs {
    #[command(subcommand)]
    pub command: PaymentsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PaymentsCommand {
    /// List payments
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        view: ViewArgs,

        /// Provider filter ("all" disables it)
        #[arg(long, default_value = "all")]
        provider: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (e.g. "backend", "voucher_prefix", "delimiter")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store an API key in the system keyring
    SetKey {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
