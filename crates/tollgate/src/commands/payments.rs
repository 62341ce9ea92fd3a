//! Payment command handlers. Payments are read-only.

use chrono::Utc;
use tabled::Tabled;

use tollgate_core::{Console, EntityStore, Payment, view};

use crate::cli::{GlobalOpts, PaymentsArgs, PaymentsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct PaymentRow {
    #[tabled(rename = "Transaction")]
    transaction: String,
    #[tabled(rename = "Provider")]
    provider: String,
    #[tabled(rename = "KES")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Payment> for PaymentRow {
    fn from(p: &Payment) -> Self {
        Self {
            transaction: output::cell(p.transaction_id.as_deref()),
            provider: p.provider.clone(),
            amount: p.amount_kes.to_string(),
            status: p.status.to_string(),
            phone: output::cell(p.phone.as_deref()),
            created: output::timestamp(Some(p.created_at)),
        }
    }
}

pub async fn handle<S: EntityStore>(
    console: &Console<S>,
    args: PaymentsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PaymentsCommand::List {
            view: flags,
            provider,
        } => {
            let query = util::view_query::<Payment>(&flags, &provider)?;
            let payments = console.payments().await?;
            let rows = view(&payments, &query, Utc::now());
            let out = output::render_list(
                global.output,
                &rows,
                |p| PaymentRow::from(*p),
                |p| p.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
