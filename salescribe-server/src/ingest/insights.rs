//! Human-readable notes attached to an upload response

use salescribe_common::human_format::{format_count, format_currency, format_percent};
use salescribe_common::models::DataSummary;

/// Observations returned per summary
const MAX_OBSERVATIONS: usize = 4;

/// Note returned instead of insights for a repeated upload
pub const DUPLICATE_UPLOAD_NOTE: &str = "File already uploaded previously - skipping duplicate";

/// Insights for a completed upload
///
/// `dropped` and `accepted` describe the upload itself; `summary` covers the
/// whole scope after the upload was stored.
pub fn upload_insights(dropped: u64, accepted: usize, summary: &DataSummary) -> Vec<String> {
    let mut insights = Vec::new();

    if dropped > 0 {
        insights.push(format!(
            "Data cleaning: {} incomplete rows removed",
            format_count(dropped)
        ));
    }
    if accepted > 0 {
        insights.push("Date column successfully parsed and standardized".to_string());
    }

    if summary.record_count > 0 {
        insights.push(format!(
            "Processed {} sales transactions",
            format_count(summary.record_count)
        ));
        insights.push(format!("Total revenue: {}", format_currency(summary.total_sales)));
        insights.push(format!(
            "Average transaction: {}",
            format_currency(summary.average_sales)
        ));
        if summary.unique_products > 1 {
            insights.push(format!(
                "Product diversity: {} unique products",
                summary.unique_products
            ));
        }
        if summary.unique_regions > 1 {
            insights.push(format!(
                "Geographic spread: {} regions covered",
                summary.unique_regions
            ));
        }
        if let (Some(top), Some(share)) = (summary.top_products.first(), summary.top_product_share()) {
            insights.push(format!(
                "Top product '{}' contributes {} of total sales",
                top.product,
                format_percent(share)
            ));
        }
    }

    insights.extend(summary_observations(summary));
    insights
}

/// Heuristic observations about a scope's data, at most four
pub fn summary_observations(summary: &DataSummary) -> Vec<String> {
    if summary.record_count == 0 {
        return Vec::new();
    }

    let mut observations = Vec::new();

    match summary.unique_products {
        1 => observations
            .push("Single product focus - consider diversification opportunities".to_string()),
        n if n > 10 => observations
            .push("High product diversity - monitor for portfolio optimization".to_string()),
        _ => {}
    }

    if summary.average_sales > 1000.0 {
        observations
            .push("High-value transactions indicate premium customer segment".to_string());
    } else if summary.average_sales < 50.0 {
        observations
            .push("Low transaction values suggest volume-based business model".to_string());
    }

    match summary.unique_regions {
        1 => observations
            .push("Single region operation - expansion potential exists".to_string()),
        n if n > 5 => observations
            .push("Multi-region presence provides market diversification".to_string()),
        _ => {}
    }

    if let Some(share) = summary.top_product_share().filter(|share| *share > 50.0) {
        observations.push(format!(
            "High concentration risk: top product represents {} of sales",
            format_percent(share)
        ));
    }

    observations.truncate(MAX_OBSERVATIONS);
    observations
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use salescribe_common::models::SalesRow;

    fn rows(entries: &[(&str, i64, &str)]) -> Vec<SalesRow> {
        entries.iter()
            .map(|(product, amount, region)| SalesRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                product: product.to_string(),
                category: "General".to_string(),
                amount: Decimal::from(*amount),
                quantity: 1,
                region: region.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_empty_summary_has_no_observations() {
        assert!(summary_observations(&DataSummary::empty()).is_empty());
        assert!(upload_insights(0, 0, &DataSummary::empty()).is_empty());
    }

    #[test]
    fn test_upload_insights_content() {
        let data = rows(&[("Widget", 3000, "North"), ("Gadget", 1000, "South")]);
        let summary = DataSummary::from_rows(&data);
        let insights = upload_insights(2, 2, &summary);

        assert_eq!(insights[0], "Data cleaning: 2 incomplete rows removed");
        assert_eq!(insights[1], "Date column successfully parsed and standardized");
        assert!(insights.contains(&"Processed 2 sales transactions".to_string()));
        assert!(insights.contains(&"Total revenue: $4,000.00".to_string()));
        assert!(insights.contains(&"Average transaction: $2,000.00".to_string()));
        assert!(insights.contains(&"Top product 'Widget' contributes 75.0% of total sales".to_string()));
        assert!(insights
            .iter()
            .any(|i| i.starts_with("High concentration risk: top product represents 75.0%")));
    }

    #[test]
    fn test_observations_capped_at_four() {
        let data = rows(&[("Solo", 5000, "Only")]);
        let summary = DataSummary::from_rows(&data);
        let observations = summary_observations(&summary);

        // single product, premium, single region, concentration
        assert_eq!(observations.len(), 4);
        assert!(observations[0].starts_with("Single product focus"));
        assert!(observations[1].starts_with("High-value transactions"));
        assert!(observations[2].starts_with("Single region operation"));
        assert!(observations[3].starts_with("High concentration risk"));
    }

    #[test]
    fn test_low_value_volume_model() {
        let data = rows(&[("A", 10, "N"), ("B", 20, "S"), ("C", 30, "E")]);
        let observations = summary_observations(&DataSummary::from_rows(&data));
        assert_eq!(
            observations,
            vec!["Low transaction values suggest volume-based business model".to_string()]
        );
    }
}
