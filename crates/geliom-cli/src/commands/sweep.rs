//! `sweep`: process every due pending notification once.

use chrono::Utc;
use serde::Serialize;
use tabled::Tabled;

use geliom_core::config::AppConfig;
use geliom_core::error::AppError;
use geliom_service::notification::RowOutcome;

use crate::output::{self, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Row")]
    id: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

/// Execute `sweep`
pub async fn execute(config: AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let pool = super::create_db_pool(&config).await?;
    let state = geliom_api::app::build_state(config, pool);

    let report = state.sweeper.sweep(Utc::now()).await?;

    if format == OutputFormat::Json {
        output::print_json(&report);
        return Ok(());
    }

    if report.total == 0 {
        output::print_success("No pending notifications to process");
        return Ok(());
    }

    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|row| {
            let (outcome, detail) = match &row.outcome {
                RowOutcome::Delivered => ("delivered", String::new()),
                RowOutcome::Discarded { reason } => ("discarded", reason.clone()),
                RowOutcome::Rescheduled { until } => ("rescheduled", until.to_rfc3339()),
                RowOutcome::Dropped { error } => ("dropped", error.clone()),
                RowOutcome::StoreFailed { error } => ("store failed", error.clone()),
            };
            OutcomeRow {
                id: row.id.to_string(),
                outcome: outcome.to_string(),
                detail,
            }
        })
        .collect();
    output::print_list(&rows, format);
    output::print_kv("processed", &report.processed.to_string());
    output::print_kv("errors", &report.errors.to_string());
    output::print_kv("total", &report.total.to_string());
    Ok(())
}
