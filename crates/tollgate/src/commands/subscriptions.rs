//! Subscription command handlers.

use chrono::{DateTime, Duration, Utc};
use tabled::Tabled;

use tollgate_core::{
    Command as CoreCommand, CommandResult, Console, CreateSubscriptionRequest, EntityId,
    EntityStore, Subscription, time_remaining, view,
};

use crate::cli::{GlobalOpts, SubscriptionsArgs, SubscriptionsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct SubscriptionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Package")]
    package: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Ends")]
    ends: String,
    #[tabled(rename = "Left")]
    left: String,
}

impl SubscriptionRow {
    fn new(s: &Subscription, now: DateTime<Utc>) -> Self {
        Self {
            id: s.id.to_string(),
            user: s.user_name().unwrap_or("-").into(),
            phone: s.user_phone().unwrap_or("-").into(),
            package: s.package_key.clone(),
            status: s.status(now).to_string(),
            ends: output::timestamp(s.end_at),
            left: time_remaining(s.end_at, now).to_string(),
        }
    }
}

fn detail(s: &Subscription) -> String {
    let now = Utc::now();
    [
        format!("ID:          {}", s.id),
        format!("User ID:     {}", s.user_id),
        format!("User:        {}", s.user_name().unwrap_or("-")),
        format!("Phone:       {}", s.user_phone().unwrap_or("-")),
        format!("Package:     {}", s.package_key),
        format!("Status:      {}", s.status(now)),
        format!("Starts:      {}", output::timestamp(s.start_at)),
        format!("Ends:        {}", output::timestamp(s.end_at)),
        format!("Remaining:   {}", time_remaining(s.end_at, now)),
        format!("Created:     {}", output::timestamp(Some(s.created_at))),
        format!("Notes:       {}", s.notes.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

fn print_subscription(result: CommandResult, global: &GlobalOpts) -> Result<(), CliError> {
    let s = match result {
        CommandResult::Subscription(s) => s,
        other => {
            return Err(CliError::ApiError {
                code: "internal".into(),
                message: format!("expected a subscription, got {other:?}"),
            });
        }
    };
    let out = output::render_single(global.output, &*s, detail, |s| s.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle<S: EntityStore>(
    console: &Console<S>,
    args: SubscriptionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        SubscriptionsCommand::List {
            view: flags,
            package,
        } => {
            let query = util::view_query::<Subscription>(&flags, &package)?;
            let subscriptions = console.subscriptions().await?;
            let now = Utc::now();
            let rows = view(&subscriptions, &query, now);
            let out = output::render_list(
                global.output,
                &rows,
                |s| SubscriptionRow::new(s, now),
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SubscriptionsCommand::Get { id } => {
            let s = console.find_subscription(&EntityId::from(id)).await?;
            let out = output::render_single(global.output, &s, detail, |s| s.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        SubscriptionsCommand::Create {
            user,
            package,
            start,
            end,
            days,
            notes,
        } => {
            let start_at = match start {
                Some(raw) => util::parse_datetime("start", &raw)?,
                None => Utc::now(),
            };
            let end_at = match (end, days) {
                (Some(raw), _) => Some(util::parse_datetime("end", &raw)?),
                (None, Some(days)) => Some(start_at + Duration::days(i64::from(days))),
                (None, None) => None,
            };
            if end_at.is_some_and(|end| end <= start_at) {
                return Err(CliError::Validation {
                    field: "end".into(),
                    reason: "must be after the start".into(),
                });
            }
            let request = CreateSubscriptionRequest {
                user_id: EntityId::from(user),
                package_key: package,
                active: true,
                suspended: false,
                start_at: Some(start_at),
                end_at,
                notes,
            };
            let result = console
                .execute(CoreCommand::CreateSubscription(request))
                .await?;
            output::success(global, "Subscription created");
            print_subscription(result, global)
        }

        SubscriptionsCommand::Suspend { id } => {
            let id = EntityId::from(id);
            if !util::confirm(
                &format!("Suspend subscription {id}? The user loses access."),
                "subscriptions suspend",
                global.yes,
            )? {
                return Ok(());
            }
            let result = console
                .execute(CoreCommand::SuspendSubscription { id: id.clone() })
                .await?;
            output::success(global, &format!("Subscription {id} suspended"));
            print_subscription(result, global)
        }

        SubscriptionsCommand::Resume { id } => {
            let id = EntityId::from(id);
            let result = console
                .execute(CoreCommand::ResumeSubscription { id: id.clone() })
                .await?;
            output::success(global, &format!("Subscription {id} resumed"));
            print_subscription(result, global)
        }

        SubscriptionsCommand::Extend { id, days, until } => {
            let id = EntityId::from(id);
            let until = match (until, days) {
                (Some(raw), _) => util::parse_datetime("until", &raw)?,
                (None, Some(days)) => console
                    .find_subscription(&id)
                    .await?
                    .extended_end(days, Utc::now()),
                (None, None) => {
                    return Err(CliError::Validation {
                        field: "extend".into(),
                        reason: "pass --days or --until".into(),
                    });
                }
            };
            let result = console
                .execute(CoreCommand::ExtendSubscription {
                    id: id.clone(),
                    until,
                })
                .await?;
            output::success(
                global,
                &format!("Subscription {id} runs until {}", until.format("%Y-%m-%d %H:%M")),
            );
            print_subscription(result, global)
        }

        SubscriptionsCommand::Delete { id } => {
            let id = EntityId::from(id);
            if !util::confirm(
                &format!("Delete subscription {id}?"),
                "subscriptions delete",
                global.yes,
            )? {
                return Ok(());
            }
            console
                .execute(CoreCommand::DeleteSubscription { id: id.clone() })
                .await?;
            output::success(global, &format!("Subscription {id} deleted"));
            Ok(())
        }
    }
}
