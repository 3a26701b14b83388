//! Keeps the last good snapshot of some remote data and refreshes it with at
//! most one load in flight.
//!
//! Every refresh takes a ticket. Starting a refresh aborts the load it
//! replaces, and a finished load only lands if its ticket is newer than the
//! one already applied, so results never arrive out of order.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;
use utoipa::ToSchema;

pub trait SnapshotSource: Send + Sync + 'static {
    type Snapshot: Send + Sync + 'static;

    fn load(&self) -> impl Future<Output = AppResult<Self::Snapshot>> + Send;
}

/// Why the last refresh failed. Kept next to the previous snapshot rather
/// than replacing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FeedError {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
    pub occurred_at: DateTime<Utc>,
}

impl FeedError {
    fn from_app_error(err: &AppError) -> Self {
        let message = match err {
            AppError::Database(_) => "Failed to load complaint data, please try again".to_string(),
            other => other.to_string(),
        };
        Self {
            kind: err.code().to_string(),
            message,
            retryable: err.is_retryable(),
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    Failed(FeedError),
    /// A newer refresh started before this one finished.
    Superseded,
}

#[derive(Debug, Clone)]
pub struct FeedView<T> {
    pub snapshot: Option<Arc<T>>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub last_error: Option<FeedError>,
    pub refreshing: bool,
}

impl<T> FeedView<T> {
    /// True until the first load attempt settles either way.
    pub fn is_pristine(&self) -> bool {
        self.snapshot.is_none() && self.last_error.is_none()
    }
}

struct FeedState<T> {
    snapshot: Option<Arc<T>>,
    refreshed_at: Option<DateTime<Utc>>,
    applied_ticket: u64,
    last_error: Option<FeedError>,
}

#[derive(Default)]
struct InFlight {
    next_ticket: u64,
    current: Option<(u64, AbortHandle)>,
}

pub struct Feed<S: SnapshotSource> {
    source: Arc<S>,
    state: RwLock<FeedState<S::Snapshot>>,
    in_flight: Mutex<InFlight>,
}

impl<S: SnapshotSource> Feed<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            state: RwLock::new(FeedState {
                snapshot: None,
                refreshed_at: None,
                applied_ticket: 0,
                last_error: None,
            }),
            in_flight: Mutex::new(InFlight::default()),
        }
    }

    pub async fn view(&self) -> FeedView<S::Snapshot> {
        let (snapshot, refreshed_at, last_error) = {
            let state = self.state.read().await;
            (
                state.snapshot.clone(),
                state.refreshed_at,
                state.last_error.clone(),
            )
        };
        let refreshing = self.in_flight.lock().await.current.is_some();

        FeedView {
            snapshot,
            refreshed_at,
            last_error,
            refreshing,
        }
    }

    /// Starts a load, superseding any load still running, and waits for it.
    pub async fn refresh(self: &Arc<Self>) -> RefreshOutcome {
        let handle = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight.next_ticket += 1;
            let ticket = in_flight.next_ticket;

            if let Some((previous, abort)) = in_flight.current.take() {
                tracing::debug!(previous, ticket, "Superseding in-flight refresh");
                abort.abort();
            }

            let feed = Arc::clone(self);
            let handle: JoinHandle<RefreshOutcome> = tokio::spawn(async move {
                let result = feed.source.load().await;
                feed.settle(ticket, result).await
            });
            in_flight.current = Some((ticket, handle.abort_handle()));
            handle
        };

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => RefreshOutcome::Superseded,
            Err(e) => {
                tracing::error!("Refresh task panicked: {}", e);
                let err = AppError::Internal(anyhow::anyhow!("refresh task failed"));
                RefreshOutcome::Failed(FeedError::from_app_error(&err))
            }
        }
    }

    async fn settle(&self, ticket: u64, result: AppResult<S::Snapshot>) -> RefreshOutcome {
        let outcome = {
            let mut state = self.state.write().await;
            if ticket <= state.applied_ticket {
                tracing::debug!(ticket, applied = state.applied_ticket, "Discarding stale refresh");
                RefreshOutcome::Superseded
            } else {
                state.applied_ticket = ticket;
                match result {
                    Ok(snapshot) => {
                        state.snapshot = Some(Arc::new(snapshot));
                        state.refreshed_at = Some(Utc::now());
                        state.last_error = None;
                        RefreshOutcome::Applied
                    }
                    Err(err) => {
                        tracing::warn!("Refresh failed, keeping previous snapshot: {}", err);
                        let feed_error = FeedError::from_app_error(&err);
                        state.last_error = Some(feed_error.clone());
                        RefreshOutcome::Failed(feed_error)
                    }
                }
            }
        };

        let mut in_flight = self.in_flight.lock().await;
        if matches!(in_flight.current, Some((current, _)) if current == ticket) {
            in_flight.current = None;
        }
        outcome
    }
}

/// Periodic refresh that stops when the handle is stopped or dropped.
#[derive(Debug)]
pub struct AutoRefresh {
    handle: JoinHandle<()>,
}

impl AutoRefresh {
    pub fn stop(self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// The first tick fires immediately; ticks missed while a load runs long
/// are skipped rather than bunched up.
pub fn spawn_auto_refresh<S: SnapshotSource>(feed: &Arc<Feed<S>>, every: Duration) -> AutoRefresh {
    let feed = Arc::clone(feed);
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let RefreshOutcome::Failed(err) = feed.refresh().await {
                tracing::debug!(kind = %err.kind, "Scheduled refresh failed");
            }
        }
    });
    AutoRefresh { handle }
}
