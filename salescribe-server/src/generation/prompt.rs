//! Prompt construction from a data summary

use super::personas::persona;
use salescribe_common::human_format::{format_count, format_currency};
use salescribe_common::models::{AgentKind, DataSummary, UNKNOWN};
use salescribe_common::time;
use chrono::NaiveDate;

/// Top products named in the prompt context
const PROMPT_TOP_PRODUCTS: usize = 2;

const LENGTH_INSTRUCTION: &str = "Length: 200-300 words.";

/// Persona instructions plus data context for one agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: AgentKind,
    pub instruction: &'static str,
    pub context: String,
}

impl Prompt {
    pub fn build(kind: AgentKind, summary: &DataSummary) -> Self {
        Self {
            kind,
            instruction: persona(kind).instruction,
            context: context(summary),
        }
    }

    /// Full text sent to the generator
    pub fn render(&self) -> String {
        format!(
            "{}\n\nUse the following data:\n{}\n\n{}",
            self.instruction, self.context, LENGTH_INSTRUCTION
        )
    }
}

/// One-line summary of the figures
pub fn summary_line(summary: &DataSummary) -> String {
    let mut parts = vec![
        format!("Total Sales: {}", format_currency(summary.total_sales)),
        format!("Transactions: {}", format_count(summary.record_count)),
        format!("Average Order: {}", format_currency(summary.average_sales)),
        format!("Product Portfolio: {} products", summary.unique_products),
        format!("Market Coverage: {} regions", summary.unique_regions),
    ];
    if let Some(range) = &summary.date_range {
        parts.push(format!("Period: {} to {}", range.start, range.end));
    }
    parts.join(" | ")
}

fn context(summary: &DataSummary) -> String {
    let mut lines = vec![format!("Summary: {}", summary_line(summary))];

    let named: Vec<String> = summary
        .top_products
        .iter()
        .filter(|p| !p.product.is_empty() && !p.product.eq_ignore_ascii_case(UNKNOWN))
        .take(PROMPT_TOP_PRODUCTS)
        .map(|p| format!("{} ({})", p.product, format_currency(p.total_sales)))
        .collect();
    if !named.is_empty() {
        lines.push(format!("Top Products: {}", named.join(", ")));
    }

    if let Some(range) = &summary.date_range {
        lines.push(format!("Date Range: {} to {}", range.start, range.end));
    }

    lines.join("\n")
}

/// `"{Display Name} Report - {Month YYYY}"`
pub fn article_title(kind: AgentKind, date: NaiveDate) -> String {
    format!("{} Report - {}", persona(kind).display_name, time::month_label(date))
}
