//! # Template Presets
//!
//! A fixed catalog of complete, named settings bundles. Applying a preset
//! replaces the active settings wholesale, so nothing from the previously
//! active template leaks through.
//!
//! ```
//! use proforma::presets;
//!
//! let preset = presets::by_name("modern").unwrap();
//! let settings = presets::apply_preset(preset);
//! assert_eq!(settings, preset.settings);
//! ```

use std::sync::OnceLock;

use serde::Serialize;

use crate::settings::{
    BankDetails, BorderStyle, HeaderLayout, Labels, LayoutOptions, LogoSize, Palette, SectionId,
    SizeScale, Spacing, TemplateSettings, Typography, Visibility,
};

/// A read-only catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatePreset {
    pub name: &'static str,
    pub description: &'static str,
    /// Colors shown in the preset picker: primary, secondary, accent.
    pub swatch: [&'static str; 3],
    pub tags: &'static [&'static str],
    pub settings: TemplateSettings,
}

/// Copy the preset's settings verbatim.
pub fn apply_preset(preset: &TemplatePreset) -> TemplateSettings {
    preset.settings.clone()
}

/// All presets in display order.
pub fn catalog() -> &'static [TemplatePreset] {
    static CATALOG: OnceLock<Vec<TemplatePreset>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// Preset names in display order.
pub fn list_presets() -> Vec<&'static str> {
    catalog().iter().map(|p| p.name).collect()
}

/// Look up a preset by name (case-insensitive).
pub fn by_name(name: &str) -> Option<&'static TemplatePreset> {
    let wanted = name.to_lowercase();
    catalog().iter().find(|p| p.name == wanted)
}

// ============================================================================
// CATALOG
// ============================================================================

fn palette(colors: [&str; 9]) -> Palette {
    let [
        primary_color,
        secondary_color,
        accent_color,
        header_text_color,
        table_header_bg,
        table_header_text,
        table_text_color,
        grand_total_bg,
        grand_total_text,
    ] = colors.map(str::to_string);
    Palette {
        primary_color,
        secondary_color,
        accent_color,
        header_text_color,
        table_header_bg,
        table_header_text,
        table_text_color,
        grand_total_bg,
        grand_total_text,
    }
}

fn typography(heading: &str, body: &str, mono: &str, font_size: SizeScale) -> Typography {
    Typography {
        heading_font: heading.to_string(),
        body_font: body.to_string(),
        mono_font: mono.to_string(),
        font_size,
    }
}

fn labels(title: &str, bill_to: &str, details: &str, terms: &[&str]) -> Labels {
    Labels {
        document_title: title.to_string(),
        bill_to_label: bill_to.to_string(),
        invoice_details_label: details.to_string(),
        terms: terms.iter().map(|s| s.to_string()).collect(),
    }
}

fn no_bank() -> BankDetails {
    BankDetails {
        bank_name: None,
        bank_account_name: None,
        bank_account_number: None,
        bank_ifsc: None,
        bank_branch: None,
    }
}

fn all_visible() -> Visibility {
    Visibility {
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

const STANDARD_TERMS: &[&str] = &[
    "Prices are valid for 15 days from the date of quotation.",
    "Delivery within 7 working days of confirmed order.",
    "Payment: 50% advance, balance before dispatch.",
    "Warranty as per manufacturer terms.",
];

fn build_catalog() -> Vec<TemplatePreset> {
    vec![
        TemplatePreset {
            name: "classic",
            description: "Navy header band, bordered table, everything visible",
            swatch: ["#1e3a8a", "#64748b", "#2563eb"],
            tags: &["default", "formal"],
            settings: TemplateSettings {
                palette: palette([
                    "#1e3a8a", "#64748b", "#2563eb", "#ffffff", "#1e3a8a", "#ffffff", "#1f2937",
                    "#1e3a8a", "#ffffff",
                ]),
                typography: typography("Inter", "Inter", "JetBrains Mono", SizeScale::Normal),
                layout: LayoutOptions {
                    header_padding: Spacing::Normal,
                    header_layout: HeaderLayout::Centered,
                    logo_size: LogoSize::Medium,
                    section_spacing: Spacing::Normal,
                    row_padding: Spacing::Normal,
                    footer_padding: Spacing::Normal,
                    border_style: BorderStyle::Subtle,
                },
                labels: labels("PROFORMA INVOICE", "Bill To", "Quotation Details", STANDARD_TERMS),
                bank: no_bank(),
                visibility: all_visible(),
                section_order: SectionId::CANONICAL.to_vec(),
                freeform_canvas: None,
            },
        },
        TemplatePreset {
            name: "modern",
            description: "Split header, teal accents, product images in the table",
            swatch: ["#0f766e", "#94a3b8", "#14b8a6"],
            tags: &["colorful", "images"],
            settings: TemplateSettings {
                palette: palette([
                    "#0f766e", "#94a3b8", "#14b8a6", "#f0fdfa", "#ccfbf1", "#134e4a", "#0f172a",
                    "#0f766e", "#f0fdfa",
                ]),
                typography: typography("Poppins", "Inter", "Fira Code", SizeScale::Normal),
                layout: LayoutOptions {
                    header_padding: Spacing::Relaxed,
                    header_layout: HeaderLayout::Split,
                    logo_size: LogoSize::Large,
                    section_spacing: Spacing::Relaxed,
                    row_padding: Spacing::Normal,
                    footer_padding: Spacing::Relaxed,
                    border_style: BorderStyle::None,
                },
                labels: labels("QUOTATION", "Prepared For", "Quote Summary", STANDARD_TERMS),
                bank: no_bank(),
                visibility: Visibility {
                    show_image_column: true,
                    ..all_visible()
                },
                section_order: SectionId::CANONICAL.to_vec(),
                freeform_canvas: None,
            },
        },
        TemplatePreset {
            name: "minimal",
            description: "Monochrome, left-aligned, no logo or signature",
            swatch: ["#111827", "#9ca3af", "#374151"],
            tags: &["monochrome", "print-friendly"],
            settings: TemplateSettings {
                palette: palette([
                    "#111827", "#9ca3af", "#374151", "#111827", "#f3f4f6", "#111827", "#111827",
                    "#f3f4f6", "#111827",
                ]),
                typography: typography("Inter", "Inter", "IBM Plex Mono", SizeScale::Small),
                layout: LayoutOptions {
                    header_padding: Spacing::Compact,
                    header_layout: HeaderLayout::LeftAligned,
                    logo_size: LogoSize::Small,
                    section_spacing: Spacing::Compact,
                    row_padding: Spacing::Compact,
                    footer_padding: Spacing::Compact,
                    border_style: BorderStyle::Subtle,
                },
                labels: labels(
                    "Proforma Invoice",
                    "Customer",
                    "Details",
                    &["Prices valid for 15 days."],
                ),
                bank: no_bank(),
                visibility: Visibility {
                    show_logo: false,
                    show_brand_column: false,
                    show_serial_numbers: false,
                    show_signature: false,
                    ..all_visible()
                },
                section_order: SectionId::CANONICAL.to_vec(),
                freeform_canvas: None,
            },
        },
        TemplatePreset {
            name: "bold",
            description: "Large type, heavy borders, totals ahead of the items table",
            swatch: ["#b91c1c", "#1f2937", "#f59e0b"],
            tags: &["high-contrast"],
            settings: TemplateSettings {
                palette: palette([
                    "#b91c1c", "#1f2937", "#f59e0b", "#ffffff", "#1f2937", "#ffffff", "#111827",
                    "#b91c1c", "#ffffff",
                ]),
                typography: typography("Montserrat", "Inter", "JetBrains Mono", SizeScale::Large),
                layout: LayoutOptions {
                    header_padding: Spacing::Relaxed,
                    header_layout: HeaderLayout::LeftAligned,
                    logo_size: LogoSize::Xlarge,
                    section_spacing: Spacing::Normal,
                    row_padding: Spacing::Relaxed,
                    footer_padding: Spacing::Normal,
                    border_style: BorderStyle::Bold,
                },
                labels: labels("PROFORMA INVOICE", "BILL TO", "DETAILS", STANDARD_TERMS),
                bank: no_bank(),
                visibility: Visibility {
                    show_discount_column: true,
                    ..all_visible()
                },
                section_order: vec![
                    SectionId::Header,
                    SectionId::CustomerDetails,
                    SectionId::Totals,
                    SectionId::ItemsTable,
                    SectionId::BankDetails,
                    SectionId::Terms,
                    SectionId::Signature,
                ],
                freeform_canvas: None,
            },
        },
        TemplatePreset {
            name: "compact",
            description: "Dense rows for long quotations; unit and brand columns hidden",
            swatch: ["#334155", "#cbd5e1", "#0ea5e9"],
            tags: &["dense", "long-documents"],
            settings: TemplateSettings {
                palette: palette([
                    "#334155", "#cbd5e1", "#0ea5e9", "#f8fafc", "#e2e8f0", "#0f172a", "#1e293b",
                    "#334155", "#f8fafc",
                ]),
                typography: typography("Roboto", "Roboto", "Roboto Mono", SizeScale::Small),
                layout: LayoutOptions {
                    header_padding: Spacing::Compact,
                    header_layout: HeaderLayout::Split,
                    logo_size: LogoSize::Small,
                    section_spacing: Spacing::Compact,
                    row_padding: Spacing::Compact,
                    footer_padding: Spacing::Compact,
                    border_style: BorderStyle::Medium,
                },
                labels: labels("QUOTATION", "Bill To", "Reference", STANDARD_TERMS),
                bank: no_bank(),
                visibility: Visibility {
                    show_brand_column: false,
                    show_unit_column: false,
                    show_contact_in_header: false,
                    ..all_visible()
                },
                section_order: vec![
                    SectionId::Header,
                    SectionId::CustomerDetails,
                    SectionId::ItemsTable,
                    SectionId::Totals,
                    SectionId::Terms,
                    SectionId::BankDetails,
                    SectionId::Signature,
                ],
                freeform_canvas: None,
            },
        },
    ]
}
