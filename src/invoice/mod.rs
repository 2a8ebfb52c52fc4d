//! # Invoice Document
//!
//! The read-only snapshot the renderer consumes. It is assembled upstream
//! from persisted invoice, line-item and customer records and handed over
//! fully resolved; nothing in this crate queries a database.
//!
//! ```
//! use proforma::invoice::InvoiceDocument;
//!
//! let doc = InvoiceDocument::sample();
//! doc.validate().unwrap();
//! ```

pub mod money;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use money::{ItemTotals, item_totals, round2};

/// Tolerance allowed between the stored grand total and its components.
pub const TOTALS_TOLERANCE: f64 = 0.01;

/// Violations of the document's arithmetic contract.
#[derive(Debug, Error, PartialEq)]
pub enum InvoiceError {
    #[error("Totals mismatch: expected grand total {expected:.2}, document says {actual:.2}")]
    TotalsMismatch { expected: f64, actual: f64 },

    #[error("Invalid line item {sequence}: {reason}")]
    InvalidLineItem { sequence: u32, reason: String },
}

/// The business issuing the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Issuer {
    pub name: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    /// Logo reference (URL, `data:` URL or file path).
    #[serde(default)]
    pub logo: Option<String>,
}

/// The customer the document is addressed to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counterparty {
    pub name: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    #[serde(default)]
    pub gstin: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Delivery address when it differs from the billing address.
    #[serde(default)]
    pub shipping_address: Vec<String>,
}

/// Document number, date and reference fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMeta {
    pub number: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub way_bill_number: Option<String>,
    #[serde(default)]
    pub supplier_ref_number: Option<String>,
    #[serde(default)]
    pub supplier_ref_date: Option<NaiveDate>,
    #[serde(default)]
    pub reference: Option<String>,
}

/// One row of the items table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub sequence: u32,
    pub description: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub serial_numbers: Vec<String>,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
    /// Unit price, tax-inclusive.
    pub unit_price: f64,
    /// Tax rate in percent.
    #[serde(default)]
    pub tax_rate: f64,
    /// Informational discount already reflected in `unit_price`.
    #[serde(default)]
    pub discount_percent: Option<f64>,
    /// Product image reference.
    #[serde(default)]
    pub image: Option<String>,
}

impl LineItem {
    /// A single-unit item with no price. Mostly useful with struct update syntax.
    pub fn new(sequence: u32, description: impl Into<String>) -> Self {
        Self {
            sequence,
            description: description.into(),
            brand: None,
            serial_numbers: Vec::new(),
            quantity: 1.0,
            unit: "Nos".to_string(),
            unit_price: 0.0,
            tax_rate: 0.0,
            discount_percent: None,
            image: None,
        }
    }
}

/// Totals as computed and stored upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: f64,
    #[serde(default)]
    pub discount_amount: f64,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub tax_amount: f64,
    #[serde(default)]
    pub tax_rate: f64,
    #[serde(default)]
    pub rounding: f64,
    pub grand_total: f64,
}

impl Totals {
    /// `subtotal - discount + tax + rounding`.
    pub fn expected_grand_total(&self) -> f64 {
        round2(self.subtotal - self.discount_amount + self.tax_amount + self.rounding)
    }
}

/// Immutable snapshot used for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDocument {
    pub issuer: Issuer,
    pub counterparty: Counterparty,
    pub meta: DocumentMeta,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub totals: Totals,
    #[serde(default)]
    pub total_quantity: f64,
    /// Grand total spelled out, e.g. "Rupees One Thousand Only".
    #[serde(default)]
    pub amount_in_words: Option<String>,
}

impl InvoiceDocument {
    /// Check the document's arithmetic contract.
    ///
    /// The renderer displays the totals it is given, so inconsistent data has
    /// to be rejected here rather than masked later.
    pub fn validate(&self) -> Result<(), InvoiceError> {
        for item in &self.items {
            if !item.quantity.is_finite() || item.quantity < 0.0 {
                return Err(InvoiceError::InvalidLineItem {
                    sequence: item.sequence,
                    reason: format!("quantity {} is not a non-negative number", item.quantity),
                });
            }
            if !item.unit_price.is_finite() || !item.tax_rate.is_finite() || item.tax_rate < 0.0 {
                return Err(InvoiceError::InvalidLineItem {
                    sequence: item.sequence,
                    reason: "price and tax rate must be finite, tax rate non-negative".to_string(),
                });
            }
        }

        let expected = self.totals.expected_grand_total();
        let actual = self.totals.grand_total;
        if (expected - actual).abs() > TOTALS_TOLERANCE + 1e-9 {
            return Err(InvoiceError::TotalsMismatch { expected, actual });
        }
        Ok(())
    }

    /// Compare the stored totals with the line-item breakup.
    ///
    /// Returns the breakup. A disagreement is logged, never corrected.
    pub fn reconcile(&self) -> ItemTotals {
        let derived = item_totals(&self.items);
        let stored_taxable = round2(self.totals.subtotal - self.totals.discount_amount);
        if (derived.taxable - stored_taxable).abs() > TOTALS_TOLERANCE + 1e-9
            || (derived.tax - self.totals.tax_amount).abs() > TOTALS_TOLERANCE + 1e-9
        {
            tracing::warn!(
                document = %self.meta.number,
                derived_taxable = derived.taxable,
                derived_tax = derived.tax,
                stored_taxable,
                stored_tax = self.totals.tax_amount,
                "stored totals disagree with line-item breakup"
            );
        }
        derived
    }

    /// Sum of item quantities, or the stored value when present.
    pub fn quantity_total(&self) -> f64 {
        if self.total_quantity > 0.0 {
            self.total_quantity
        } else {
            self.items.iter().map(|i| i.quantity).sum()
        }
    }

    /// A complete demo document, consistent by construction.
    pub fn sample() -> Self {
        let items = vec![
            LineItem {
                brand: Some("Voltas".to_string()),
                serial_numbers: vec!["VX19-2231".to_string(), "VX19-2232".to_string()],
                quantity: 2.0,
                unit_price: 38_940.0,
                tax_rate: 28.0,
                ..LineItem::new(1, "1.5 Ton 5 Star Inverter Split AC")
            },
            LineItem {
                brand: Some("Havells".to_string()),
                quantity: 4.0,
                unit_price: 2_360.0,
                tax_rate: 18.0,
                ..LineItem::new(2, "Copper piping kit, 3m with insulation")
            },
            LineItem {
                quantity: 2.0,
                unit: "Job".to_string(),
                unit_price: 1_500.0,
                tax_rate: 18.0,
                ..LineItem::new(3, "Installation and commissioning")
            },
        ];

        let derived = item_totals(&items);
        let before_rounding = round2(derived.taxable + derived.tax);
        let grand_total = before_rounding.round();
        let total_quantity = items.iter().map(|i| i.quantity).sum();

        Self {
            issuer: Issuer {
                name: "Shree Ganesh Cooling Solutions".to_string(),
                address_lines: vec![
                    "14, Industrial Estate, Phase II".to_string(),
                    "Peenya, Bengaluru 560058".to_string(),
                ],
                phones: vec!["+91 98450 12345".to_string(), "080 2839 1122".to_string()],
                gstin: Some("29ABCDE1234F1Z5".to_string()),
                state: Some("Karnataka".to_string()),
                state_code: Some("29".to_string()),
                email: Some("sales@sgcooling.example".to_string()),
                website: Some("www.sgcooling.example".to_string()),
                logo: None,
            },
            counterparty: Counterparty {
                name: "Lakeview Residency Owners Association".to_string(),
                address_lines: vec![
                    "Block C, Lakeview Residency".to_string(),
                    "Hebbal, Bengaluru 560024".to_string(),
                ],
                gstin: Some("29AAAAL9876Q1Z2".to_string()),
                state: Some("Karnataka".to_string()),
                state_code: Some("29".to_string()),
                phone: Some("+91 99000 55555".to_string()),
                email: Some("office@lakeview.example".to_string()),
                shipping_address: Vec::new(),
            },
            meta: DocumentMeta {
                number: "QT/2026/0142".to_string(),
                date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap_or_default(),
                way_bill_number: None,
                supplier_ref_number: Some("PO-7781".to_string()),
                supplier_ref_date: NaiveDate::from_ymd_opt(2026, 10, 12),
                reference: Some("Summer maintenance contract".to_string()),
            },
            items,
            totals: Totals {
                subtotal: derived.taxable,
                discount_amount: 0.0,
                discount_percent: 0.0,
                tax_amount: derived.tax,
                tax_rate: 0.0,
                rounding: round2(grand_total - before_rounding),
                grand_total,
            },
            total_quantity,
            amount_in_words: Some(money::amount_in_words(grand_total)),
        }
    }
}
