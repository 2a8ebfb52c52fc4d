//! # Money Arithmetic
//!
//! Rounding, reverse-GST tax breakup and currency formatting shared by the
//! layout renderer and the invoice invariant checks.
//!
//! ## Two-stage rounding
//!
//! Line prices are stored tax-inclusive. The table shows them split into a
//! base price and a tax component:
//!
//! ```text
//! base = round2(price / (1 + rate / 100))
//! tax  = round2(price - price / (1 + rate / 100))
//! ```
//!
//! Aggregates multiply the *rounded* per-unit values by the quantity, sum
//! across lines, and round once more. Stored invoice totals were produced the
//! same way, so both stages have to be reproduced exactly.

use super::LineItem;

/// Round to two decimal places, halves rounding up.
///
/// Values like `1.005` are stored as `1.00499999...` in binary; the small
/// nudge before flooring keeps them on the "half" side.
pub fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    (scaled + 0.5 + 1e-9).floor() / 100.0
}

/// Per-unit split of a tax-inclusive price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxBreakup {
    /// Price before tax, rounded to 2 decimals.
    pub base_price: f64,
    /// Tax portion of the price, rounded to 2 decimals.
    pub tax_amount: f64,
}

/// Reverse a tax-inclusive unit price into base price and tax amount.
///
/// ## Example
///
/// ```
/// use proforma::invoice::money::tax_breakup;
///
/// let b = tax_breakup(118.0, 18.0);
/// assert_eq!(b.base_price, 100.0);
/// assert_eq!(b.tax_amount, 18.0);
/// ```
pub fn tax_breakup(inclusive_price: f64, tax_percent: f64) -> TaxBreakup {
    let divisor = 1.0 + tax_percent / 100.0;
    let base = if divisor.abs() < f64::EPSILON {
        inclusive_price
    } else {
        inclusive_price / divisor
    };
    TaxBreakup {
        base_price: round2(base),
        tax_amount: round2(inclusive_price - base),
    }
}

/// Aggregate of the per-line breakups across an item list.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemTotals {
    /// Sum of `quantity × base_price`, rounded.
    pub taxable: f64,
    /// Sum of `quantity × tax_amount`, rounded.
    pub tax: f64,
}

impl ItemTotals {
    /// Taxable value plus tax.
    pub fn total(&self) -> f64 {
        round2(self.taxable + self.tax)
    }
}

/// Sum the line breakups (second rounding stage).
pub fn item_totals(items: &[LineItem]) -> ItemTotals {
    let (taxable, tax) = items.iter().fold((0.0, 0.0), |(taxable, tax), item| {
        let b = tax_breakup(item.unit_price, item.tax_rate);
        (
            taxable + item.quantity * b.base_price,
            tax + item.quantity * b.tax_amount,
        )
    });
    ItemTotals {
        taxable: round2(taxable),
        tax: round2(tax),
    }
}

/// Line amounts shown in the items table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineAmounts {
    pub breakup: TaxBreakup,
    /// `quantity × base_price`, rounded.
    pub taxable: f64,
    /// `quantity × tax_amount`, rounded.
    pub tax: f64,
}

impl LineAmounts {
    pub fn for_item(item: &LineItem) -> Self {
        let breakup = tax_breakup(item.unit_price, item.tax_rate);
        Self {
            breakup,
            taxable: round2(item.quantity * breakup.base_price),
            tax: round2(item.quantity * breakup.tax_amount),
        }
    }

    pub fn total(&self) -> f64 {
        round2(self.taxable + self.tax)
    }
}

// ============================================================================
// FORMATTING
// ============================================================================

/// Prefix used for currency amounts in rendered documents.
pub const CURRENCY_PREFIX: &str = "Rs. ";

/// Format an amount with Indian digit grouping and two fraction digits.
///
/// The last three integer digits form one group; every group above that
/// has two digits (lakh/crore grouping).
///
/// ```
/// use proforma::invoice::money::format_amount;
///
/// assert_eq!(format_amount(12345678.9), "1,23,45,678.90");
/// assert_eq!(format_amount(999.0), "999.00");
/// assert_eq!(format_amount(-1500.5), "-1,500.50");
/// ```
pub fn format_amount(amount: f64) -> String {
    let paise = (round2(amount.abs()) * 100.0).round() as u64;
    let rupees = paise / 100;
    let fraction = paise % 100;
    let negative = amount < 0.0 && paise > 0;

    let digits = rupees.to_string();
    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    format!(
        "{}{}.{:02}",
        if negative { "-" } else { "" },
        grouped,
        fraction
    )
}

/// Format an amount with the currency prefix.
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("-{}{}", CURRENCY_PREFIX, format_amount(-amount))
    } else {
        format!("{}{}", CURRENCY_PREFIX, format_amount(amount))
    }
}

/// Format a percentage without trailing zeros (`18%`, `2.5%`).
pub fn format_percent(value: f64) -> String {
    let rounded = round2(value);
    if (rounded - rounded.trunc()).abs() < 1e-9 {
        format!("{}%", rounded as i64)
    } else {
        let s = format!("{:.2}", rounded);
        format!("{}%", s.trim_end_matches('0'))
    }
}

/// Format a quantity: integers without decimals, fractions with up to 3.
pub fn format_quantity(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        let s = format!("{:.3}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// ============================================================================
// AMOUNT IN WORDS
// ============================================================================

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

fn below_hundred(n: u64) -> String {
    let n = n as usize;
    if n < 20 {
        ONES[n].to_string()
    } else if n % 10 == 0 {
        TENS[n / 10].to_string()
    } else {
        format!("{} {}", TENS[n / 10], ONES[n % 10])
    }
}

fn below_thousand(n: u64) -> String {
    let hundreds = n / 100;
    let rest = n % 100;
    match (hundreds, rest) {
        (0, r) => below_hundred(r),
        (h, 0) => format!("{} Hundred", ONES[h as usize]),
        (h, r) => format!("{} Hundred {}", ONES[h as usize], below_hundred(r)),
    }
}

/// Spell a whole number using the Indian system (crore, lakh, thousand).
fn indian_words(n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }

    let crore = n / 10_000_000;
    let lakh = (n / 100_000) % 100;
    let thousand = (n / 1_000) % 100;
    let rest = n % 1_000;

    let mut parts = Vec::new();
    if crore > 0 {
        parts.push(format!("{} Crore", indian_words(crore)));
    }
    if lakh > 0 {
        parts.push(format!("{} Lakh", below_hundred(lakh)));
    }
    if thousand > 0 {
        parts.push(format!("{} Thousand", below_hundred(thousand)));
    }
    if rest > 0 {
        parts.push(below_thousand(rest));
    }
    parts.join(" ")
}

/// Spell an amount in rupees and paise.
///
/// ```
/// use proforma::invoice::money::amount_in_words;
///
/// assert_eq!(
///     amount_in_words(123456.78),
///     "Rupees One Lakh Twenty Three Thousand Four Hundred Fifty Six and Seventy Eight Paise Only"
/// );
/// ```
pub fn amount_in_words(amount: f64) -> String {
    let paise_total = (round2(amount.abs()) * 100.0).round() as u64;
    let rupees = paise_total / 100;
    let paise = paise_total % 100;

    if paise == 0 {
        format!("Rupees {} Only", indian_words(rupees))
    } else {
        format!(
            "Rupees {} and {} Paise Only",
            indian_words(rupees),
            below_hundred(paise)
        )
    }
}
