//! CSV and plain-text renderings of complaint data.
//!
//! Everything here is a pure function of its input; handlers only attach
//! download headers.

use crate::models::ComplaintModel;
use crate::services::complaint::CategoryFilter;
use crate::services::stats::{self, CategoryStat, StatKey, UNSPECIFIED};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::fmt::Write as _;

/// Rendered in place of every identity field of an anonymous complaint.
pub const ANONYMOUS: &str = "Anonymous";

const UTF8_BOM: &str = "\u{feff}";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const COMPLAINT_HEADER: [&str; 10] = [
    "ID",
    "Category",
    "Title",
    "Details",
    "Priority",
    "Anonymous",
    "Student Name",
    "Student ID",
    "Student Email",
    "Created At",
];

const STATS_HEADER: [&str; 3] = ["Label", "Count", "Percentage"];

#[derive(Debug, Clone, Copy)]
pub struct CsvOptions {
    /// Prefix the output with a UTF-8 byte order mark so spreadsheet
    /// programs pick the right encoding.
    pub bom: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { bom: true }
    }
}

fn render_rows<I>(header: &[&str], rows: I, options: CsvOptions) -> Result<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(header).context("Failed to write CSV header")?;
    for row in rows {
        writer.write_record(&row).context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e.error()))?;
    let body = String::from_utf8(bytes).context("CSV output is not valid UTF-8")?;

    Ok(if options.bom {
        format!("{UTF8_BOM}{body}")
    } else {
        body
    })
}

fn identity_field(complaint: &ComplaintModel, value: &Option<String>) -> String {
    if complaint.is_anonymous {
        ANONYMOUS.to_string()
    } else {
        value.clone().unwrap_or_default()
    }
}

fn complaint_row(c: &ComplaintModel) -> Vec<String> {
    vec![
        c.id.to_string(),
        c.category.clone(),
        c.title.clone(),
        c.details.clone(),
        c.priority.clone().unwrap_or_else(|| UNSPECIFIED.to_string()),
        if c.is_anonymous { "Yes" } else { "No" }.to_string(),
        identity_field(c, &c.student_name),
        identity_field(c, &c.student_id),
        identity_field(c, &c.student_email),
        c.created_at.format(TIMESTAMP_FORMAT).to_string(),
    ]
}

pub fn complaints_to_csv(complaints: &[ComplaintModel], options: CsvOptions) -> Result<String> {
    render_rows(
        &COMPLAINT_HEADER,
        complaints.iter().map(complaint_row),
        options,
    )
}

pub fn stats_to_csv(stats: &[CategoryStat], options: CsvOptions) -> Result<String> {
    render_rows(
        &STATS_HEADER,
        stats
            .iter()
            .map(|s| vec![s.label.clone(), s.count.to_string(), s.percentage.to_string()]),
        options,
    )
}

pub fn summary_report(complaints: &[ComplaintModel], generated_at: NaiveDateTime) -> String {
    let by_category = stats::aggregate(complaints, StatKey::Category);
    let by_priority = stats::aggregate(complaints, StatKey::Priority);
    let anonymous = complaints.iter().filter(|c| c.is_anonymous).count();

    let mut out = String::new();
    let _ = writeln!(out, "Complaint Summary Report");
    let _ = writeln!(out, "Generated: {} UTC", generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out);

    let _ = writeln!(out, "By category:");
    write_stat_lines(&mut out, &by_category);
    let _ = writeln!(out);

    let _ = writeln!(out, "By priority:");
    write_stat_lines(&mut out, &by_priority);
    let _ = writeln!(out);

    if let Some(top) = stats::top(&by_category) {
        let _ = writeln!(out, "Top issue: {} ({} complaints)", top.label, top.count);
    }
    let _ = writeln!(out, "Anonymous submissions: {anonymous}");
    let _ = writeln!(out, "Total: {}", complaints.len());
    out
}

fn write_stat_lines(out: &mut String, stats: &[CategoryStat]) {
    if stats.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    for s in stats {
        let _ = writeln!(out, "  {}: {} ({}%)", s.label, s.count, s.percentage);
    }
}

/// `water_complaints.csv`, `all_complaints_page_2.csv`, ...
pub fn csv_filename(filter: &CategoryFilter, page: Option<u64>) -> String {
    let stem = match filter {
        CategoryFilter::All => "all".to_string(),
        CategoryFilter::Only(label) => filename_safe(label),
    };
    match page {
        Some(page) => format!("{stem}_complaints_page_{page}.csv"),
        None => format!("{stem}_complaints.csv"),
    }
}

pub fn stats_filename(key: StatKey) -> String {
    format!("complaint_stats_by_{}.csv", key.as_str())
}

pub fn summary_filename(date: NaiveDate) -> String {
    format!("complaint_summary_{}.txt", date.format("%Y-%m-%d"))
}

fn filename_safe(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "category".to_string()
    } else {
        cleaned
    }
}
