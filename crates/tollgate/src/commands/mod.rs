//! Command handlers, one module per top-level resource.

pub mod config_cmd;
pub mod payments;
pub mod subscriptions;
pub mod util;
pub mod vouchers;

use tollgate_core::{Console, EntityStore};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a backend-bound command to its handler.
pub async fn dispatch<S: EntityStore>(
    cmd: Command,
    console: &Console<S>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Vouchers(args) => vouchers::handle(console, args, global).await,
        Command::Subscriptions(args) => subscriptions::handle(console, args, global).await,
        Command::Payments(args) => payments::handle(console, args, global).await,
        // Handled in main before a console exists.
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
