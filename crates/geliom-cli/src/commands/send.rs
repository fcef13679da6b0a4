//! `send`: dispatch one notification through the full fan-out.

use clap::Args;

use geliom_core::config::AppConfig;
use geliom_core::error::AppError;
use geliom_core::types::{GroupId, UserId};
use geliom_entity::notification::{NotificationPayload, NotificationType};
use geliom_service::DispatchError;

use crate::output::{self, OutputFormat};

/// Arguments for `send`
#[derive(Debug, Args)]
pub struct SendArgs {
    /// Receiving user (repeat for several)
    #[arg(short, long = "receiver", required = true)]
    pub receivers: Vec<UserId>,
    /// Sending user; omit for a system notification that skips rate limits
    #[arg(short, long)]
    pub sender: Option<UserId>,
    /// Group the notification concerns
    #[arg(short, long)]
    pub group: GroupId,
    /// Group display name (push heading)
    #[arg(long)]
    pub group_name: String,
    /// Title carried in the routing metadata
    #[arg(short, long)]
    pub title: String,
    /// Push body
    #[arg(short, long)]
    pub message: String,
    /// Notification type, e.g. status_update
    #[arg(long = "type", default_value = "status_update")]
    pub notification_type: NotificationType,
}

/// Execute `send`
pub async fn execute(args: &SendArgs, config: AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let pool = super::create_db_pool(&config).await?;
    let state = geliom_api::app::build_state(config, pool);

    let payload = NotificationPayload {
        receiver_ids: args.receivers.clone(),
        sender_id: args.sender,
        group_id: args.group,
        group_name: args.group_name.clone(),
        title: args.title.clone(),
        message: args.message.clone(),
        notification_type: args.notification_type,
    };

    let report = state.dispatcher.send(payload).await.map_err(into_app_error)?;

    match format {
        OutputFormat::Json => output::print_json(&report),
        OutputFormat::Table => {
            output::print_success("Notification dispatched");
            output::print_kv("id", report.id.as_deref().unwrap_or("-"));
            output::print_kv("recipients", &report.recipients.to_string());
            if let Some(errors) = &report.errors {
                output::print_warning(&format!("Provider reported errors: {errors}"));
            }
        }
    }
    Ok(())
}

fn into_app_error(err: DispatchError) -> AppError {
    let message = err.to_string();
    match err {
        DispatchError::Validation(_) | DispatchError::NoValidRecipients => {
            AppError::validation(message)
        }
        DispatchError::RateLimited {
            wait_seconds: Some(seconds),
            ..
        } => AppError::rate_limited(format!("{message}; retry in {seconds}s")),
        DispatchError::RateLimited { .. } => AppError::rate_limited(message),
        DispatchError::Provider { status, body, .. } => {
            AppError::external_service(format!("{message}: {status} {body}"))
        }
        DispatchError::Configuration(e) | DispatchError::Internal(e) => e,
    }
}
