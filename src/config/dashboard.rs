use super::{parse_bool_env, parse_env};
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct DashboardConfig {
    /// `None` disables the background re-poll.
    pub refresh_interval: Option<Duration>,
    pub page_size: u64,
    pub max_page_size: u64,
    pub recent_limit: u64,
    pub csv_bom: bool,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Some(Duration::from_secs(60)),
            page_size: 50,
            max_page_size: 100,
            recent_limit: 10,
            csv_bom: true,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let refresh_secs: u64 = parse_env("DASHBOARD_REFRESH_SECONDS", 60);
        let max_page_size = parse_env("COMPLAINTS_MAX_PAGE_SIZE", defaults.max_page_size).max(1);
        let page_size = parse_env("COMPLAINTS_PAGE_SIZE", defaults.page_size).clamp(1, max_page_size);

        Self {
            refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
            page_size,
            max_page_size,
            recent_limit: parse_env("DASHBOARD_RECENT_LIMIT", defaults.recent_limit),
            csv_bom: parse_bool_env("CSV_INCLUDE_BOM", defaults.csv_bom),
        }
    }

    /// Resolves the requested page size against the configured bounds.
    pub fn per_page(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.page_size)
            .clamp(1, self.max_page_size)
    }
}
