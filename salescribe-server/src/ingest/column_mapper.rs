//! Header-to-canonical-field mapping
//!
//! Driven by a static synonym table. Mapping is a pure function of the
//! header row.

use super::IngestError;
use serde::Serialize;

/// Canonical sales fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Date,
    Product,
    Category,
    Amount,
    Quantity,
    Region,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 6] = [
        CanonicalField::Date,
        CanonicalField::Product,
        CanonicalField::Category,
        CanonicalField::Amount,
        CanonicalField::Quantity,
        CanonicalField::Region,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Date => "date",
            CanonicalField::Product => "product",
            CanonicalField::Category => "category",
            CanonicalField::Amount => "amount",
            CanonicalField::Quantity => "quantity",
            CanonicalField::Region => "region",
        }
    }

    /// Accepted header names, already normalized
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Date => &[
                "date",
                "order_date",
                "transaction_date",
                "sale_date",
                "sales_date",
                "day",
            ],
            CanonicalField::Product => &["product", "product_name", "item", "sku"],
            CanonicalField::Category => &["category", "product_category", "segment"],
            CanonicalField::Amount => &[
                "amount",
                "sales_amount",
                "revenue",
                "total_sales",
                "value",
                "sales",
                "total",
            ],
            CanonicalField::Quantity => &["quantity", "qty", "units", "orders", "count"],
            CanonicalField::Region => &["region", "location", "market", "territory"],
        }
    }

    fn slot(self) -> usize {
        self as usize
    }

    /// Required fields, in the order they are checked
    pub const REQUIRED: [CanonicalField; 2] = [CanonicalField::Date, CanonicalField::Amount];
}

/// Column index per canonical field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    indices: [Option<usize>; 6],
}

impl ColumnMapping {
    /// Column index mapped to `field`
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.indices[field.slot()]
    }

    /// Number of canonical fields that found a column
    pub fn mapped_count(&self) -> usize {
        self.indices.iter().filter(|i| i.is_some()).count()
    }

    /// Cell of `record` holding `field`, if mapped and present
    pub fn cell<'r>(&self, field: CanonicalField, record: &'r csv::StringRecord) -> Option<&'r str> {
        self.get(field).and_then(|index| record.get(index))
    }
}

/// Lowercase, trim, drop a BOM and collapse spaces/hyphens to `_`
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Map header cells to canonical fields. The first matching column wins.
pub fn map_columns<S: AsRef<str>>(header: &[S]) -> Result<ColumnMapping, IngestError> {
    let mut mapping = ColumnMapping::default();

    for (index, raw) in header.iter().enumerate() {
        let name = normalize_header(raw.as_ref());
        let field = CanonicalField::ALL
            .into_iter()
            .find(|field| field.synonyms().contains(&name.as_str()));
        if let Some(field) = field {
            let slot = &mut mapping.indices[field.slot()];
            if slot.is_none() {
                *slot = Some(index);
            }
        }
    }

    for field in CanonicalField::REQUIRED {
        if mapping.get(field).is_none() {
            return Err(IngestError::RequiredColumnMissing {
                field: field.as_str(),
            });
        }
    }

    Ok(mapping)
}
