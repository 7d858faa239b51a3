//! Aggregate view over a scope's records
//!
//! Sums are accumulated as exact decimals and only converted to `f64` for the
//! reported figures, so totals match the uploaded data to the cent.

use super::SalesRow;
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Number of products listed in [`DataSummary::top_products`]
pub const TOP_PRODUCT_LIMIT: usize = 5;

/// Sales total for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTotal {
    pub product: String,
    pub total_sales: f64,
}

/// Inclusive span of record dates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Read-only summary computed once per generation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSummary {
    pub total_sales: f64,
    pub average_sales: f64,
    pub record_count: u64,
    pub top_products: Vec<ProductTotal>,
    pub unique_products: usize,
    pub unique_regions: usize,
    pub date_range: Option<DateRange>,
    /// Records per product
    pub product_counts: BTreeMap<String, u64>,
    /// Records per region
    pub region_counts: BTreeMap<String, u64>,
}

impl DataSummary {
    /// Summary of no records
    pub fn empty() -> Self {
        Self {
            total_sales: 0.0,
            average_sales: 0.0,
            record_count: 0,
            top_products: Vec::new(),
            unique_products: 0,
            unique_regions: 0,
            date_range: None,
            product_counts: BTreeMap::new(),
            region_counts: BTreeMap::new(),
        }
    }

    /// Aggregate a set of rows
    pub fn from_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a SalesRow>,
    {
        let mut total = Decimal::ZERO;
        let mut count: u64 = 0;
        let mut product_sales: HashMap<&str, Decimal> = HashMap::new();
        let mut product_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut region_counts: BTreeMap<String, u64> = BTreeMap::new();
        let mut start: Option<NaiveDate> = None;
        let mut end: Option<NaiveDate> = None;

        for row in rows {
            count += 1;
            total += row.amount;
            *product_sales.entry(row.product.as_str()).or_insert(Decimal::ZERO) += row.amount;
            *product_counts.entry(row.product.clone()).or_insert(0) += 1;
            *region_counts.entry(row.region.clone()).or_insert(0) += 1;
            start = Some(start.map_or(row.date, |d| d.min(row.date)));
            end = Some(end.map_or(row.date, |d| d.max(row.date)));
        }

        if count == 0 {
            return Self::empty();
        }

        let mut ranked: Vec<(&str, Decimal)> = product_sales.into_iter().collect();
        // Highest total first; name breaks ties so the order is deterministic
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let top_products = ranked
            .into_iter()
            .take(TOP_PRODUCT_LIMIT)
            .map(|(product, sales)| ProductTotal {
                product: product.to_string(),
                total_sales: to_f64(sales),
            })
            .collect();

        let average = total / Decimal::from(count);

        Self {
            total_sales: to_f64(total),
            average_sales: to_f64(average),
            record_count: count,
            top_products,
            unique_products: product_counts.len(),
            unique_regions: region_counts.len(),
            date_range: start.zip(end).map(|(start, end)| DateRange { start, end }),
            product_counts,
            region_counts,
        }
    }

    /// Share of total sales held by the top product, in percent
    pub fn top_product_share(&self) -> Option<f64> {
        let top = self.top_products.first()?;
        if self.total_sales <= 0.0 {
            return None;
        }
        Some(top.total_sales / self.total_sales * 100.0)
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn row(date: &str, product: &str, amount: &str, region: &str) -> SalesRow {
        SalesRow {
            date: NaiveDate::from_str(date).unwrap(),
            product: product.to_string(),
            category: "Hardware".to_string(),
            amount: Decimal::from_str(amount).unwrap(),
            quantity: 1,
            region: region.to_string(),
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = DataSummary::from_rows(&Vec::<SalesRow>::new());
        assert_eq!(summary, DataSummary::empty());
        assert!(summary.top_product_share().is_none());
    }

    #[test]
    fn test_totals_and_ranges() {
        let rows = vec![
            row("2024-03-02", "Widget", "100.10", "North"),
            row("2024-01-15", "Gadget", "50.20", "South"),
            row("2024-02-01", "Widget", "49.70", "North"),
        ];
        let summary = DataSummary::from_rows(&rows);

        assert_eq!(summary.record_count, 3);
        assert_eq!(summary.total_sales, 200.0);
        assert!((summary.average_sales - 66.666_666).abs() < 1e-4);
        assert_eq!(summary.unique_products, 2);
        assert_eq!(summary.unique_regions, 2);
        assert_eq!(summary.product_counts["Widget"], 2);
        assert_eq!(summary.region_counts["South"], 1);

        let range = summary.date_range.as_ref().unwrap();
        assert_eq!(range.start.to_string(), "2024-01-15");
        assert_eq!(range.end.to_string(), "2024-03-02");

        assert_eq!(summary.top_products[0].product, "Widget");
        assert_eq!(summary.top_products[0].total_sales, 149.8);
        assert!((summary.top_product_share().unwrap() - 74.9).abs() < 1e-9);
    }

    #[test]
    fn test_top_products_capped_and_tie_broken_by_name() {
        let rows: Vec<SalesRow> = ["F", "E", "D", "C", "B", "A"]
            .iter()
            .map(|p| row("2024-01-01", p, "10", "North"))
            .collect();
        let summary = DataSummary::from_rows(&rows);

        let names: Vec<&str> = summary.top_products.iter().map(|p| p.product.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    }
}
