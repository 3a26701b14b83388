//! Grouped counts and percentages over a snapshot of complaints.

use crate::models::ComplaintModel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

/// Label used for complaints that carry no priority.
pub const UNSPECIFIED: &str = "Unspecified";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CategoryStat {
    pub label: String,
    pub count: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StatKey {
    #[default]
    Category,
    Priority,
}

impl StatKey {
    pub fn label(self, complaint: &ComplaintModel) -> &str {
        match self {
            StatKey::Category => &complaint.category,
            StatKey::Priority => complaint.priority.as_deref().unwrap_or(UNSPECIFIED),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatKey::Category => "category",
            StatKey::Priority => "priority",
        }
    }
}

/// How per-label percentages are rounded.
///
/// `Independent` rounds every label on its own, so the column may sum to
/// 99 or 101. `LargestRemainder` hands out the leftover points to the labels
/// with the largest fractional parts so a non-empty result sums to 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    #[default]
    Independent,
    LargestRemainder,
}

pub fn aggregate(complaints: &[ComplaintModel], key: StatKey) -> Vec<CategoryStat> {
    aggregate_by(complaints, |c| key.label(c), RoundingPolicy::Independent)
}

pub fn aggregate_with(
    complaints: &[ComplaintModel],
    key: StatKey,
    rounding: RoundingPolicy,
) -> Vec<CategoryStat> {
    aggregate_by(complaints, |c| key.label(c), rounding)
}

/// Counts each distinct label returned by `selector`, ordered by count
/// descending. Equal counts keep the order in which labels first appeared.
pub fn aggregate_by<T, F>(items: &[T], selector: F, rounding: RoundingPolicy) -> Vec<CategoryStat>
where
    F: Fn(&T) -> &str,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, u64)> = Vec::new();

    for item in items {
        let label = selector(item);
        match index.get(label) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(label, counts.len());
                counts.push((label, 1));
            }
        }
    }

    // Vec::sort_by is stable, which keeps first-occurrence order for ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total = items.len() as u64;
    let percentages = match rounding {
        RoundingPolicy::Independent => counts
            .iter()
            .map(|&(_, count)| rounded_percentage(count, total))
            .collect(),
        RoundingPolicy::LargestRemainder => {
            largest_remainder(&counts.iter().map(|&(_, c)| c).collect::<Vec<_>>(), total)
        }
    };

    counts
        .into_iter()
        .zip(percentages)
        .map(|((label, count), percentage)| CategoryStat {
            label: label.to_string(),
            count,
            percentage,
        })
        .collect()
}

/// `round(count / total * 100)` with halves rounded up; 0 when `total` is 0.
pub fn rounded_percentage(count: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    ((count * 200 + total) / (total * 2)) as u32
}

fn largest_remainder(counts: &[u64], total: u64) -> Vec<u32> {
    if total == 0 {
        return vec![0; counts.len()];
    }

    let mut floors: Vec<u32> = counts.iter().map(|&c| (c * 100 / total) as u32).collect();
    let assigned: u32 = floors.iter().sum();
    let leftover = 100u32.saturating_sub(assigned) as usize;

    let mut by_remainder: Vec<usize> = (0..counts.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = counts[a] * 100 % total;
        let rb = counts[b] * 100 % total;
        rb.cmp(&ra)
    });

    for &i in by_remainder.iter().take(leftover) {
        floors[i] += 1;
    }
    floors
}

/// The most frequent label, i.e. the dashboard's "top issue".
pub fn top(stats: &[CategoryStat]) -> Option<&CategoryStat> {
    stats.first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn complaint(category: &str, priority: Option<&str>) -> ComplaintModel {
        ComplaintModel {
            id: Uuid::new_v4(),
            category: category.to_string(),
            title: "t".to_string(),
            details: "d".to_string(),
            priority: priority.map(str::to_string),
            is_anonymous: true,
            student_name: None,
            student_email: None,
            student_id: None,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    fn by_category(labels: &[&str]) -> Vec<ComplaintModel> {
        labels.iter().map(|l| complaint(l, None)).collect()
    }

    #[test]
    fn empty_input_yields_empty_result() {
        assert!(aggregate(&[], StatKey::Category).is_empty());
        assert!(aggregate_with(&[], StatKey::Priority, RoundingPolicy::LargestRemainder).is_empty());
    }

    #[test]
    fn counts_sum_to_input_size() {
        let input = by_category(&["Water", "Noise", "Water", "Security", "Noise", "Water"]);
        let stats = aggregate(&input, StatKey::Category);
        assert_eq!(stats.iter().map(|s| s.count).sum::<u64>(), input.len() as u64);
    }

    #[test]
    fn sorted_descending_with_first_occurrence_ties() {
        let input = by_category(&["Noise", "Water", "Security", "Water", "Security", "Others"]);
        let stats = aggregate(&input, StatKey::Category);
        let labels: Vec<&str> = stats.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Water", "Security", "Noise", "Others"]);
        assert!(stats.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn grouping_is_case_sensitive() {
        let input = by_category(&["Water", "water", "Water"]);
        let stats = aggregate(&input, StatKey::Category);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].label, "Water");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[1].label, "water");
    }

    #[test]
    fn percentages_round_half_up() {
        assert_eq!(rounded_percentage(1, 8), 13); // 12.5
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(5, 0), 0);
        assert_eq!(rounded_percentage(4, 4), 100);
    }

    #[test]
    fn independent_rounding_may_overshoot() {
        // 1/3 rounded three ways: 33 + 33 + 33 = 99
        let input = by_category(&["Water", "Noise", "Security"]);
        let stats = aggregate(&input, StatKey::Category);
        assert_eq!(stats.iter().map(|s| s.percentage).sum::<u32>(), 99);
    }

    #[test]
    fn largest_remainder_sums_to_hundred() {
        let input = by_category(&["Water", "Noise", "Security"]);
        let stats = aggregate_with(&input, StatKey::Category, RoundingPolicy::LargestRemainder);
        assert_eq!(stats.iter().map(|s| s.percentage).sum::<u32>(), 100);
        assert_eq!(stats[0].percentage, 34);

        let input = by_category(&["A", "A", "A", "B", "B", "C", "D"]);
        let stats = aggregate_with(&input, StatKey::Category, RoundingPolicy::LargestRemainder);
        assert_eq!(stats.iter().map(|s| s.percentage).sum::<u32>(), 100);
    }

    #[test]
    fn missing_priority_is_grouped_as_unspecified() {
        let input = vec![
            complaint("Water", Some("High")),
            complaint("Water", None),
            complaint("Noise", None),
        ];
        let stats = aggregate(&input, StatKey::Priority);
        assert_eq!(stats[0].label, UNSPECIFIED);
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[1].label, "High");
        assert_eq!(stats[1].percentage, 33);
    }

    #[test]
    fn top_is_the_most_frequent_label() {
        let input = by_category(&["Noise", "Water", "Water"]);
        let stats = aggregate(&input, StatKey::Category);
        assert_eq!(top(&stats).map(|s| s.label.as_str()), Some("Water"));
        assert_eq!(top(&[]), None);
    }

    #[test]
    fn aggregate_by_accepts_any_selector() {
        let words = ["b", "a", "b"];
        let stats = aggregate_by(&words, |w| *w, RoundingPolicy::Independent);
        assert_eq!(stats[0].label, "b");
        assert_eq!(stats[0].percentage, 67);
    }
}
