//! Typed style table.
//!
//! Every settings field that affects rendering maps to exactly one attribute
//! here. Sizes and paddings come from fixed tiers, never from continuous
//! values, so the preview and the export target lay out identically.

use crate::settings::{BorderStyle, LogoSize, SizeScale, Spacing, TemplateSettings};

/// Font sizes for one [`SizeScale`] tier, in layout units (CSS px).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub title: f32,
    pub heading: f32,
    pub body: f32,
    pub small: f32,
}

impl FontSizes {
    pub fn for_scale(scale: SizeScale) -> Self {
        match scale {
            SizeScale::Small => Self {
                title: 20.0,
                heading: 14.0,
                body: 10.0,
                small: 8.0,
            },
            SizeScale::Normal => Self {
                title: 24.0,
                heading: 16.0,
                body: 12.0,
                small: 10.0,
            },
            SizeScale::Large => Self {
                title: 28.0,
                heading: 18.0,
                body: 14.0,
                small: 12.0,
            },
        }
    }
}

/// Role a piece of text plays, which picks its font family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontRole {
    Heading,
    Body,
    /// Amounts and quantities.
    Mono,
}

/// The three typography families.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFamilies {
    pub heading: String,
    pub body: String,
    pub mono: String,
}

impl FontFamilies {
    pub fn get(&self, role: FontRole) -> &str {
        match role {
            FontRole::Heading => &self.heading,
            FontRole::Body => &self.body,
            FontRole::Mono => &self.mono,
        }
    }
}

/// Spacing tiers: `(compact, normal, relaxed)`.
const HEADER_PADDING: (f32, f32, f32) = (12.0, 20.0, 28.0);
const SECTION_GAP: (f32, f32, f32) = (8.0, 16.0, 24.0);
const ROW_PADDING: (f32, f32, f32) = (3.0, 6.0, 9.0);
const FOOTER_PADDING: (f32, f32, f32) = (8.0, 16.0, 24.0);

fn tier(spacing: Spacing, values: (f32, f32, f32)) -> f32 {
    match spacing {
        Spacing::Compact => values.0,
        Spacing::Normal => values.1,
        Spacing::Relaxed => values.2,
    }
}

pub fn border_width(style: BorderStyle) -> f32 {
    match style {
        BorderStyle::None => 0.0,
        BorderStyle::Subtle => 1.0,
        BorderStyle::Medium => 2.0,
        BorderStyle::Bold => 3.0,
    }
}

pub fn logo_box(size: LogoSize) -> f32 {
    match size {
        LogoSize::Small => 40.0,
        LogoSize::Medium => 60.0,
        LogoSize::Large => 80.0,
        LogoSize::Xlarge => 100.0,
    }
}

/// Everything the section builders read from the settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub fonts: FontSizes,
    pub families: FontFamilies,
    pub header_padding: f32,
    pub section_gap: f32,
    pub row_padding: f32,
    pub footer_padding: f32,
    pub border_width: f32,
    pub logo_box: f32,

    pub header_bg: String,
    pub header_text: String,
    pub label_color: String,
    /// Borders, rules and muted text.
    pub secondary_color: String,
    pub text_color: String,
    pub table_header_bg: String,
    pub table_header_text: String,
    pub grand_total_bg: String,
    pub grand_total_text: String,
}

impl ResolvedStyle {
    pub fn from_settings(settings: &TemplateSettings) -> Self {
        let layout = &settings.layout;
        let palette = &settings.palette;
        Self {
            fonts: FontSizes::for_scale(settings.typography.font_size),
            families: FontFamilies {
                heading: settings.typography.heading_font.clone(),
                body: settings.typography.body_font.clone(),
                mono: settings.typography.mono_font.clone(),
            },
            header_padding: tier(layout.header_padding, HEADER_PADDING),
            section_gap: tier(layout.section_spacing, SECTION_GAP),
            row_padding: tier(layout.row_padding, ROW_PADDING),
            footer_padding: tier(layout.footer_padding, FOOTER_PADDING),
            border_width: border_width(layout.border_style),
            logo_box: logo_box(layout.logo_size),

            header_bg: palette.primary_color.clone(),
            header_text: palette.header_text_color.clone(),
            label_color: palette.accent_color.clone(),
            secondary_color: palette.secondary_color.clone(),
            text_color: palette.table_text_color.clone(),
            table_header_bg: palette.table_header_bg.clone(),
            table_header_text: palette.table_header_text.clone(),
            grand_total_bg: palette.grand_total_bg.clone(),
            grand_total_text: palette.grand_total_text.clone(),
        }
    }
}
