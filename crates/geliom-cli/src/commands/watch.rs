//! `watch`: fetch a group dashboard, subscribe to the group's tables and
//! reprint the dashboard whenever the cache changes.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use geliom_cache::{MemoizedLookup, QueryCache, QueryData, QueryKey, Scope};
use geliom_core::config::AppConfig;
use geliom_core::error::AppError;
use geliom_core::types::{GroupId, UserId};
use geliom_database::DashboardSource;
use geliom_database::repositories::{DashboardRepository, LookupRepository};
use geliom_entity::group::{DashboardData, JoinRequestView};
use geliom_realtime::{CacheSynchronizer, PgChangeFeed, SubscriptionManager};

use crate::output::{self, OutputFormat};

/// Arguments for `watch`
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Group to follow
    #[arg(short, long)]
    pub group: GroupId,
    /// Viewing user; their own changes are not applied from the feed
    #[arg(short, long)]
    pub user: UserId,
    /// How often to check the cache for changes, in milliseconds
    #[arg(long, default_value = "500")]
    pub refresh_ms: u64,
}

#[derive(Debug, Serialize, Tabled)]
struct MemberRow {
    #[tabled(rename = "Member")]
    member: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Mood")]
    mood: String,
}

#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    dashboard: DashboardData,
    requests: Vec<JoinRequestView>,
}

/// Execute `watch`
pub async fn execute(args: &WatchArgs, config: AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let pool = super::create_db_pool(&config).await?;
    let dashboards = DashboardRepository::new(pool.pool().clone());
    let lookups = Arc::new(MemoizedLookup::new(
        Arc::new(LookupRepository::new(pool.pool().clone())),
        &config.cache,
    ));
    let cache = Arc::new(QueryCache::new());
    let sync = Arc::new(CacheSynchronizer::new(args.user, Arc::clone(&cache), lookups));
    let feed = Arc::new(PgChangeFeed::new(pool.pool().clone(), &config.realtime));
    let manager = SubscriptionManager::new(feed.clone(), sync);

    let started = manager.ensure_group(args.group);
    tracing::info!(group = %args.group, subscriptions = started, "Watching group");

    let mut last: Option<Snapshot> = None;
    let mut ticker = tokio::time::interval(Duration::from_millis(args.refresh_ms.max(50)));
    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            _ = ticker.tick() => {}
        }

        let snapshot = match fetch(&cache, &dashboards, args.group, args.user).await {
            Ok(snapshot) => snapshot,
            Err(e) => break Err(e),
        };
        if last.as_ref() != Some(&snapshot) {
            print_snapshot(&snapshot, format);
            last = Some(snapshot);
        }
    };

    manager.release_scope(Scope::Group(args.group)).await;
    feed.shutdown();
    pool.close().await;
    result
}

async fn fetch(
    cache: &QueryCache,
    source: &DashboardRepository,
    group: GroupId,
    viewer: UserId,
) -> Result<Snapshot, AppError> {
    let dashboard = cache
        .get_or_fetch(QueryKey::dashboard(group), || async move {
            Ok(QueryData::Dashboard(source.dashboard(group, viewer).await?))
        })
        .await?;
    let requests = cache
        .get_or_fetch(QueryKey::join_requests(group), || async move {
            Ok(QueryData::JoinRequests(
                source.pending_join_requests(group).await?,
            ))
        })
        .await?;

    match (dashboard, requests) {
        (QueryData::Dashboard(dashboard), QueryData::JoinRequests(requests)) => {
            Ok(Snapshot { dashboard, requests })
        }
        _ => Err(AppError::internal("Cached query holds the wrong kind of data")),
    }
}

fn print_snapshot(snapshot: &Snapshot, format: OutputFormat) {
    let rows: Vec<MemberRow> = snapshot
        .dashboard
        .members
        .iter()
        .map(|member| MemberRow {
            member: member.label().to_string(),
            status: member
                .status
                .as_ref()
                .map(|s| with_emoji(s.emoji.as_deref(), &s.text))
                .unwrap_or_default(),
            mood: member
                .mood
                .as_ref()
                .map(|m| with_emoji(m.emoji.as_deref(), &m.text))
                .unwrap_or_default(),
        })
        .collect();

    if format == OutputFormat::Table {
        println!("\n{}", snapshot.dashboard.group.name);
    }
    output::print_list(&rows, format);
    if !snapshot.requests.is_empty() {
        let names: Vec<&str> = snapshot
            .requests
            .iter()
            .map(|r| r.requester.name_or("?"))
            .collect();
        output::print_kv("pending requests", &names.join(", "));
    }
}

fn with_emoji(emoji: Option<&str>, text: &str) -> String {
    match emoji {
        Some(emoji) => format!("{emoji} {text}"),
        None => text.to_string(),
    }
}
