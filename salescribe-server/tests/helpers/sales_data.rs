//! Deterministic sample sales data

use chrono::{Duration, NaiveDate};

/// Data rows in [`sales_csv`]
pub const SAMPLE_ROW_COUNT: usize = 60;

/// Sum of the amount column in [`sales_csv`]
pub const SAMPLE_TOTAL: f64 = 927_422.50;

const PRODUCTS: [&str; 4] = ["Laptop", "Monitor", "Keyboard", "Headset"];
const REGIONS: [&str; 3] = ["North", "South", "East"];

/// Sixty sales rows whose amounts total 927,422.50
///
/// `header` supplies the column names for date, product, category, amount,
/// quantity and region, in that order.
pub fn sales_csv(delimiter: char, header: [&str; 6]) -> String {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let d = delimiter.to_string();
    let mut out = header.join(&d);
    out.push('\n');

    for i in 1..=SAMPLE_ROW_COUNT {
        // Rows 1..=59 sum to 891,932.50; the last row makes up the rest
        let amount = if i < SAMPLE_ROW_COUNT {
            format!("{:.2}", 14_000.0 + 37.25 * i as f64)
        } else {
            "35490.00".to_string()
        };
        let date = start + Duration::days(i as i64 - 1);
        let fields = [
            date.format("%Y-%m-%d").to_string(),
            PRODUCTS[i % PRODUCTS.len()].to_string(),
            if i % 2 == 0 { "Electronics" } else { "Accessories" }.to_string(),
            amount,
            (i % 5 + 1).to_string(),
            REGIONS[i % REGIONS.len()].to_string(),
        ];
        out.push_str(&fields.join(&d));
        out.push('\n');
    }
    out
}

/// Canonical header names
pub const CANONICAL_HEADER: [&str; 6] = ["date", "product", "category", "amount", "quantity", "region"];
