use std::{env, sync::OnceLock};

pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Water",
    "Electricity",
    "Noise",
    "Security",
    "Academics",
    "Facilities",
    "Others",
];

pub const PRIORITIES: [&str; 4] = ["Low", "Medium", "High", "Critical"];

#[derive(Debug, Clone)]
pub struct ComplaintConfig {
    pub categories: Vec<String>,
}

impl Default for ComplaintConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl ComplaintConfig {
    /// `COMPLAINT_CATEGORIES=Water,Hostel,...` replaces the default set.
    pub fn from_env() -> Self {
        match env::var("COMPLAINT_CATEGORIES") {
            Ok(raw) => {
                let categories = parse_categories(&raw);
                if categories.is_empty() {
                    tracing::warn!("COMPLAINT_CATEGORIES is empty, using defaults");
                    Self::default()
                } else {
                    Self { categories }
                }
            }
            Err(_) => Self::default(),
        }
    }

    pub fn is_known_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

pub fn is_known_priority(priority: &str) -> bool {
    PRIORITIES.contains(&priority)
}

pub fn complaint_config() -> &'static ComplaintConfig {
    static CONFIG: OnceLock<ComplaintConfig> = OnceLock::new();
    CONFIG.get_or_init(ComplaintConfig::from_env)
}

fn parse_categories(raw: &str) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !categories.iter().any(|c| c == label) {
            categories.push(label.to_string());
        }
    }
    categories
}
