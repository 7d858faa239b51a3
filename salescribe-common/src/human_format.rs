//! Human-readable number formatting
//!
//! Used for insight strings and prompt context, e.g. `$927,422.50`.

/// Format a count with thousands separators (`1234567` → `1,234,567`)
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format a currency amount with two decimals and thousands separators
///
/// # Examples
///
/// ```
/// use salescribe_common::human_format::format_currency;
///
/// assert_eq!(format_currency(927422.5), "$927,422.50");
/// assert_eq!(format_currency(12.0), "$12.00");
/// assert_eq!(format_currency(-1500.25), "-$1,500.25");
/// ```
pub fn format_currency(amount: f64) -> String {
    let is_negative = amount < 0.0;
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let formatted = format!("${}.{}", group_thousands(whole), cents);
    if is_negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Format a percentage with one decimal (`52.345` → `52.3%`)
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_currency_rounds_to_cents() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(0.005), "$0.01");
        assert_eq!(format_currency(1000000.0), "$1,000,000.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(52.345), "52.3%");
        assert_eq!(format_percent(100.0), "100.0%");
    }
}
