use crate::config::dashboard::DashboardConfig;
use crate::config::database::Database;
use crate::error::AppResult;
use crate::models::ComplaintModel;
use crate::services::complaint::{CategoryFilter, ComplaintService};
use crate::services::feed::{Feed, SnapshotSource};
use crate::services::stats::{self, CategoryStat, StatKey};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub type DashboardFeed = Feed<StoreSnapshotSource>;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardSnapshot {
    pub total_count: u64,
    pub anonymous_count: u64,
    pub category_stats: Vec<CategoryStat>,
    pub priority_stats: Vec<CategoryStat>,
    pub top_category: Option<CategoryStat>,
    pub recent: Vec<ComplaintModel>,
    pub generated_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// `complaints` must already be ordered newest first.
    pub fn build(complaints: &[ComplaintModel], recent_limit: usize) -> Self {
        let category_stats = stats::aggregate(complaints, StatKey::Category);
        let priority_stats = stats::aggregate(complaints, StatKey::Priority);
        let top_category = stats::top(&category_stats).cloned();

        Self {
            total_count: complaints.len() as u64,
            anonymous_count: complaints.iter().filter(|c| c.is_anonymous).count() as u64,
            category_stats,
            priority_stats,
            top_category,
            recent: complaints.iter().take(recent_limit).cloned().collect(),
            generated_at: Utc::now(),
        }
    }
}

/// Loads dashboard snapshots straight from the complaint store.
pub struct StoreSnapshotSource {
    db: Database,
    recent_limit: usize,
}

impl StoreSnapshotSource {
    pub fn new(db: Database, config: &DashboardConfig) -> Self {
        Self {
            db,
            recent_limit: config.recent_limit as usize,
        }
    }
}

impl SnapshotSource for StoreSnapshotSource {
    type Snapshot = DashboardSnapshot;

    async fn load(&self) -> AppResult<DashboardSnapshot> {
        let service = ComplaintService::new(self.db.conn()?.clone());
        let complaints = service.list_all(&CategoryFilter::All).await?;
        Ok(DashboardSnapshot::build(&complaints, self.recent_limit))
    }
}
