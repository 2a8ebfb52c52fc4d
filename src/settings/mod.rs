//! # Template Settings
//!
//! User-owned configuration for the document template: palette, typography,
//! spacing tiers, labels, bank details, visibility flags, section order and
//! the optional freeform overlay payload.
//!
//! ## Persisted shape
//!
//! Settings persist as one flat record (one key per field), which is also
//! the unit of the default-merge in [`resolve`]. The Rust type groups the
//! fields into sub-structs that are flattened on (de)serialization:
//!
//! ```text
//! { "primary_color": "#1e3a8a", "font_size": "normal", "show_logo": true,
//!   "section_order": ["header", "customer_details", ...], ... }
//! ```
//!
//! Color values are free-form strings. They are stored and rendered
//! verbatim; an unparseable color simply paints nothing.

pub mod resolve;
pub mod store;

pub use resolve::{PartialSettings, move_section, repair_section_order, resolve, update_field};
pub use store::{MemorySettingsStore, SettingsChange, SettingsStore};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Maximum number of terms lines rendered.
pub const MAX_TERMS_LINES: usize = 6;

/// Errors from settings updates and the persistence boundary.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("Unknown settings field: {0}")]
    UnknownField(String),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Settings store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTIONS
// ============================================================================

/// Identifier of a reorderable document section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Header,
    CustomerDetails,
    ItemsTable,
    Totals,
    BankDetails,
    Terms,
    Signature,
}

impl SectionId {
    /// All section ids in canonical order.
    pub const CANONICAL: [SectionId; 7] = [
        SectionId::Header,
        SectionId::CustomerDetails,
        SectionId::ItemsTable,
        SectionId::Totals,
        SectionId::BankDetails,
        SectionId::Terms,
        SectionId::Signature,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionId::Header => "header",
            SectionId::CustomerDetails => "customer_details",
            SectionId::ItemsTable => "items_table",
            SectionId::Totals => "totals",
            SectionId::BankDetails => "bank_details",
            SectionId::Terms => "terms",
            SectionId::Signature => "signature",
        }
    }

    /// Parse a stored id. Unknown ids return `None`.
    pub fn parse(s: &str) -> Option<SectionId> {
        Self::CANONICAL.into_iter().find(|id| id.as_str() == s)
    }
}

fn default_section_order() -> Vec<SectionId> {
    SectionId::CANONICAL.to_vec()
}

/// Stored orders are repaired on read, so a stale list never reaches layout.
fn deserialize_section_order<'de, D>(deserializer: D) -> Result<Vec<SectionId>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored: Vec<String> = Vec::deserialize(deserializer)?;
    Ok(repair_section_order(&stored))
}

/// The overlay payload may arrive either as a JSON string or as the scene
/// object itself; it is kept as an opaque string.
fn deserialize_canvas<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

// ============================================================================
// TIERS
// ============================================================================

/// Font size tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeScale {
    Small,
    #[default]
    Normal,
    Large,
}

/// Padding/spacing tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    Compact,
    #[default]
    Normal,
    Relaxed,
}

/// Arrangement of the header band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderLayout {
    #[default]
    Centered,
    LeftAligned,
    Split,
}

/// Logo box size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoSize {
    Small,
    #[default]
    Medium,
    Large,
    Xlarge,
}

/// Table and box border weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderStyle {
    None,
    #[default]
    Subtle,
    Medium,
    Bold,
}

// ============================================================================
// FIELD GROUPS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub header_text_color: String,
    pub table_header_bg: String,
    pub table_header_text: String,
    pub table_text_color: String,
    pub grand_total_bg: String,
    pub grand_total_text: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            primary_color: "#1e3a8a".to_string(),
            secondary_color: "#64748b".to_string(),
            accent_color: "#2563eb".to_string(),
            header_text_color: "#ffffff".to_string(),
            table_header_bg: "#1e3a8a".to_string(),
            table_header_text: "#ffffff".to_string(),
            table_text_color: "#1f2937".to_string(),
            grand_total_bg: "#1e3a8a".to_string(),
            grand_total_text: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Typography {
    pub heading_font: String,
    pub body_font: String,
    pub mono_font: String,
    pub font_size: SizeScale,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            heading_font: "Inter".to_string(),
            body_font: "Inter".to_string(),
            mono_font: "JetBrains Mono".to_string(),
            font_size: SizeScale::Normal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub header_padding: Spacing,
    pub header_layout: HeaderLayout,
    pub logo_size: LogoSize,
    pub section_spacing: Spacing,
    pub row_padding: Spacing,
    pub footer_padding: Spacing,
    pub border_style: BorderStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    pub document_title: String,
    pub bill_to_label: String,
    pub invoice_details_label: String,
    /// Terms and conditions, one entry per line. Only the first
    /// [`MAX_TERMS_LINES`] non-empty lines render.
    pub terms: Vec<String>,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            document_title: "PROFORMA INVOICE".to_string(),
            bill_to_label: "Bill To".to_string(),
            invoice_details_label: "Quotation Details".to_string(),
            terms: vec![
                "Prices are valid for 15 days from the date of quotation.".to_string(),
                "Delivery within 7 working days of confirmed order.".to_string(),
                "Payment: 50% advance, balance before dispatch.".to_string(),
            ],
        }
    }
}

/// Bank details block. A missing bank name hides the whole block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankDetails {
    pub bank_name: Option<String>,
    pub bank_account_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_ifsc: Option<String>,
    pub bank_branch: Option<String>,
}

/// One boolean per optional element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visibility {
    pub show_logo: bool,
    pub show_gstin_in_header: bool,
    pub show_contact_in_header: bool,
    pub show_company_state: bool,
    pub show_shipping_address: bool,
    pub show_customer_email: bool,
    pub show_customer_phone: bool,
    pub show_image_column: bool,
    pub show_brand_column: bool,
    pub show_unit_column: bool,
    pub show_serial_numbers: bool,
    pub show_discount_column: bool,
    pub show_terms: bool,
    pub show_signature: bool,
    pub show_amount_in_words: bool,
    pub show_invoice_title: bool,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            show_logo: true,
            show_gstin_in_header: true,
            show_contact_in_header: true,
            show_company_state: true,
            show_shipping_address: true,
            show_customer_email: true,
            show_customer_phone: true,
            show_image_column: false,
            show_brand_column: true,
            show_unit_column: true,
            show_serial_numbers: true,
            show_discount_column: false,
            show_terms: true,
            show_signature: true,
            show_amount_in_words: true,
            show_invoice_title: true,
        }
    }
}

/// Optional document elements governed by a visibility flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Logo,
    GstinInHeader,
    ContactInHeader,
    CompanyState,
    ShippingAddress,
    CustomerEmail,
    CustomerPhone,
    ImageColumn,
    BrandColumn,
    UnitColumn,
    SerialNumbers,
    DiscountColumn,
    Terms,
    Signature,
    AmountInWords,
    InvoiceTitle,
}

impl Toggle {
    pub const ALL: [Toggle; 16] = [
        Toggle::Logo,
        Toggle::GstinInHeader,
        Toggle::ContactInHeader,
        Toggle::CompanyState,
        Toggle::ShippingAddress,
        Toggle::CustomerEmail,
        Toggle::CustomerPhone,
        Toggle::ImageColumn,
        Toggle::BrandColumn,
        Toggle::UnitColumn,
        Toggle::SerialNumbers,
        Toggle::DiscountColumn,
        Toggle::Terms,
        Toggle::Signature,
        Toggle::AmountInWords,
        Toggle::InvoiceTitle,
    ];

    /// Persisted key of the governing flag.
    pub fn key(self) -> &'static str {
        match self {
            Toggle::Logo => "show_logo",
            Toggle::GstinInHeader => "show_gstin_in_header",
            Toggle::ContactInHeader => "show_contact_in_header",
            Toggle::CompanyState => "show_company_state",
            Toggle::ShippingAddress => "show_shipping_address",
            Toggle::CustomerEmail => "show_customer_email",
            Toggle::CustomerPhone => "show_customer_phone",
            Toggle::ImageColumn => "show_image_column",
            Toggle::BrandColumn => "show_brand_column",
            Toggle::UnitColumn => "show_unit_column",
            Toggle::SerialNumbers => "show_serial_numbers",
            Toggle::DiscountColumn => "show_discount_column",
            Toggle::Terms => "show_terms",
            Toggle::Signature => "show_signature",
            Toggle::AmountInWords => "show_amount_in_words",
            Toggle::InvoiceTitle => "show_invoice_title",
        }
    }
}

impl Visibility {
    pub fn get(&self, toggle: Toggle) -> bool {
        *self.flag(toggle)
    }

    pub fn set(&mut self, toggle: Toggle, on: bool) {
        *self.flag_mut(toggle) = on;
    }

    fn flag(&self, toggle: Toggle) -> &bool {
        match toggle {
            Toggle::Logo => &self.show_logo,
            Toggle::GstinInHeader => &self.show_gstin_in_header,
            Toggle::ContactInHeader => &self.show_contact_in_header,
            Toggle::CompanyState => &self.show_company_state,
            Toggle::ShippingAddress => &self.show_shipping_address,
            Toggle::CustomerEmail => &self.show_customer_email,
            Toggle::CustomerPhone => &self.show_customer_phone,
            Toggle::ImageColumn => &self.show_image_column,
            Toggle::BrandColumn => &self.show_brand_column,
            Toggle::UnitColumn => &self.show_unit_column,
            Toggle::SerialNumbers => &self.show_serial_numbers,
            Toggle::DiscountColumn => &self.show_discount_column,
            Toggle::Terms => &self.show_terms,
            Toggle::Signature => &self.show_signature,
            Toggle::AmountInWords => &self.show_amount_in_words,
            Toggle::InvoiceTitle => &self.show_invoice_title,
        }
    }

    fn flag_mut(&mut self, toggle: Toggle) -> &mut bool {
        match toggle {
            Toggle::Logo => &mut self.show_logo,
            Toggle::GstinInHeader => &mut self.show_gstin_in_header,
            Toggle::ContactInHeader => &mut self.show_contact_in_header,
            Toggle::CompanyState => &mut self.show_company_state,
            Toggle::ShippingAddress => &mut self.show_shipping_address,
            Toggle::CustomerEmail => &mut self.show_customer_email,
            Toggle::CustomerPhone => &mut self.show_customer_phone,
            Toggle::ImageColumn => &mut self.show_image_column,
            Toggle::BrandColumn => &mut self.show_brand_column,
            Toggle::UnitColumn => &mut self.show_unit_column,
            Toggle::SerialNumbers => &mut self.show_serial_numbers,
            Toggle::DiscountColumn => &mut self.show_discount_column,
            Toggle::Terms => &mut self.show_terms,
            Toggle::Signature => &mut self.show_signature,
            Toggle::AmountInWords => &mut self.show_amount_in_words,
            Toggle::InvoiceTitle => &mut self.show_invoice_title,
        }
    }
}

// ============================================================================
// TEMPLATE SETTINGS
// ============================================================================

/// Fully-populated template configuration.
///
/// Obtain one from [`resolve`] (stored partial record) or from a preset;
/// `Default` gives the hardcoded defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    #[serde(flatten)]
    pub palette: Palette,
    #[serde(flatten)]
    pub typography: Typography,
    #[serde(flatten)]
    pub layout: LayoutOptions,
    #[serde(flatten)]
    pub labels: Labels,
    #[serde(flatten)]
    pub bank: BankDetails,
    #[serde(flatten)]
    pub visibility: Visibility,
    #[serde(deserialize_with = "deserialize_section_order")]
    pub section_order: Vec<SectionId>,
    #[serde(default, deserialize_with = "deserialize_canvas")]
    pub freeform_canvas: Option<String>,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            palette: Palette::default(),
            typography: Typography::default(),
            layout: LayoutOptions::default(),
            labels: Labels::default(),
            bank: BankDetails::default(),
            visibility: Visibility::default(),
            section_order: default_section_order(),
            freeform_canvas: None,
        }
    }
}

impl TemplateSettings {
    /// Terms lines that render: non-empty, at most [`MAX_TERMS_LINES`].
    pub fn terms_lines(&self) -> Vec<&str> {
        self.labels
            .terms
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .take(MAX_TERMS_LINES)
            .collect()
    }

    /// The section order, repaired against the canonical id set.
    pub fn ordered_sections(&self) -> Vec<SectionId> {
        let ids: Vec<&str> = self.section_order.iter().map(|id| id.as_str()).collect();
        repair_section_order(&ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_id_round_trips_through_str() {
        for id in SectionId::CANONICAL {
            assert_eq!(SectionId::parse(id.as_str()), Some(id));
        }
        assert_eq!(SectionId::parse("footer"), None);
    }

    #[test]
    fn toggle_keys_match_serialized_fields() {
        let value = serde_json::to_value(TemplateSettings::default()).unwrap();
        let map = value.as_object().unwrap();
        for toggle in Toggle::ALL {
            assert!(map.contains_key(toggle.key()), "missing {}", toggle.key());
        }
    }

    #[test]
    fn visibility_get_set() {
        let mut v = Visibility::default();
        for toggle in Toggle::ALL {
            v.set(toggle, false);
            assert!(!v.get(toggle));
            v.set(toggle, true);
            assert!(v.get(toggle));
        }
    }

    #[test]
    fn serialized_record_is_flat() {
        let value = serde_json::to_value(TemplateSettings::default()).unwrap();
        let map = value.as_object().unwrap();
        assert_eq!(map["primary_color"], "#1e3a8a");
        assert_eq!(map["font_size"], "normal");
        assert_eq!(map["header_layout"], "centered");
        assert_eq!(map["section_order"][0], "header");
        assert!(map["freeform_canvas"].is_null());
        assert!(!map.contains_key("palette"));
    }

    #[test]
    fn canvas_accepts_object_payload() {
        let mut value = serde_json::to_value(TemplateSettings::default()).unwrap();
        value["freeform_canvas"] = serde_json::json!({"objects": []});
        let settings: TemplateSettings = serde_json::from_value(value).unwrap();
        assert_eq!(settings.freeform_canvas.as_deref(), Some(r#"{"objects":[]}"#));
    }

    #[test]
    fn terms_lines_skip_blank_and_cap() {
        let mut settings = TemplateSettings::default();
        settings.labels.terms = vec![
            "one".into(),
            "  ".into(),
            "two".into(),
            "three".into(),
            "four".into(),
            "five".into(),
            "six".into(),
            "seven".into(),
        ];
        assert_eq!(
            settings.terms_lines(),
            vec!["one", "two", "three", "four", "five", "six"]
        );
    }
}
