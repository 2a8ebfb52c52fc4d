//! # Layout Renderer
//!
//! Turns an [`InvoiceDocument`] plus [`TemplateSettings`] into a
//! [`RenderedDocument`]: a list of positioned, styled sections.
//!
//! ## Architecture
//!
//! ```text
//! InvoiceDocument + TemplateSettings
//!         ↓ ResolvedStyle (typed style table)
//!         ↓ section builders, in repaired section order
//! RenderedDocument { sections: [Section { nodes: [Text | Fill | Rule | Image] }] }
//!         ↓
//! raster::paint (preview, thumbnail, export capture)
//! ```
//!
//! `render` is pure. The same output feeds every consumer; only the raster
//! scale differs between them.
//!
//! ## Example
//!
//! ```
//! use proforma::invoice::InvoiceDocument;
//! use proforma::layout::render;
//! use proforma::settings::{SectionId, TemplateSettings};
//!
//! let doc = render(&InvoiceDocument::sample(), &TemplateSettings::default());
//! assert_eq!(doc.sections[0].id, SectionId::Header);
//! ```

mod sections;
pub mod style;
pub mod text;

pub use style::ResolvedStyle;

use serde::Serialize;

use crate::invoice::InvoiceDocument;
use crate::overlay::{self, OverlayScene};
use crate::settings::{SectionId, TemplateSettings, Toggle};

/// Layout width of an A4 page in CSS px at 96 DPI.
pub const PAGE_WIDTH: f32 = 794.0;

/// Horizontal margin between the page edge and section content.
pub const CONTENT_MARGIN: f32 = 32.0;

/// Axis-aligned rectangle in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    #[default]
    Regular,
    Bold,
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// One line of text, aligned inside the node rect.
    Text {
        text: String,
        size: f32,
        color: String,
        weight: Weight,
        align: Align,
        /// Font family from the typography settings.
        font: String,
    },
    /// Solid background.
    Fill { color: String },
    /// Solid line; the rect is the line's extent.
    Rule { color: String },
    /// Image slot, resolved against preloaded assets at capture time.
    Image { source: String },
}

/// A positioned drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub rect: Rect,
    pub kind: NodeKind,
    /// Visibility flag that governs this node, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toggle: Option<Toggle>,
}

impl Node {
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// A rendered section. Sections without content are never emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub id: SectionId,
    pub frame: Rect,
    pub nodes: Vec<Node>,
}

/// The styled, positioned document tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedDocument {
    pub width: f32,
    pub height: f32,
    /// Page background.
    pub background: String,
    pub sections: Vec<Section>,
    /// Document number, used for artifact naming.
    pub document_number: String,
    /// Freeform overlay scene, when the stored payload parsed.
    #[serde(skip)]
    pub overlay: Option<OverlayScene>,
}

impl RenderedDocument {
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn section_ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id).collect()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.sections.iter().flat_map(|s| s.nodes.iter())
    }

    /// Nodes governed by `toggle`.
    pub fn nodes_for(&self, toggle: Toggle) -> impl Iterator<Item = &Node> {
        self.nodes().filter(move |n| n.toggle == Some(toggle))
    }

    /// Distinct image references, in document order.
    pub fn image_sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for node in self.nodes() {
            if let NodeKind::Image { source } = &node.kind
                && !sources.contains(source)
            {
                sources.push(source.clone());
            }
        }
        sources
    }

    /// Whether any text node contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.nodes()
            .filter_map(Node::text)
            .any(|t| t.contains(needle))
    }
}

/// Render a document with the given settings.
///
/// Never fails: a document without line items yields a header-only table,
/// and an unparseable overlay payload is dropped with a warning.
pub fn render(doc: &InvoiceDocument, settings: &TemplateSettings) -> RenderedDocument {
    let style = ResolvedStyle::from_settings(settings);
    let ctx = sections::BuildContext {
        doc,
        settings,
        style: &style,
    };

    let mut rendered = Vec::new();
    let mut y = 0.0f32;

    for id in settings.ordered_sections() {
        // Full-bleed header band starts at the page edge; other sections
        // are separated by the section gap.
        let top = if rendered.is_empty() && id == SectionId::Header {
            y
        } else {
            y + style.section_gap
        };

        let Some(section) = sections::build(id, &ctx, top) else {
            continue;
        };
        y = section.frame.bottom();
        rendered.push(section);
    }

    let overlay = settings
        .freeform_canvas
        .as_deref()
        .and_then(|payload| match overlay::parse_scene(payload) {
            Ok(scene) => Some(scene),
            Err(e) => {
                tracing::warn!(document = %doc.meta.number, error = %e, "discarding freeform overlay");
                None
            }
        });

    RenderedDocument {
        width: PAGE_WIDTH,
        height: (y + style.footer_padding).ceil(),
        background: "#ffffff".to_string(),
        sections: rendered,
        document_number: doc.meta.number.clone(),
        overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::LineItem;
    use crate::settings::{BorderStyle, SizeScale, Spacing, move_section};
    use pretty_assertions::assert_eq;

    /// Sample document with every optional field filled, so every toggle
    /// has something to govern.
    fn full_document() -> InvoiceDocument {
        let mut doc = InvoiceDocument::sample();
        doc.issuer.logo = Some("https://assets.example/logo.png".to_string());
        doc.counterparty.shipping_address = vec!["Site office, Gate 2".to_string()];
        doc.items[0].image = Some("https://assets.example/ac.png".to_string());
        doc.items[1].discount_percent = Some(5.0);
        doc
    }

    fn all_on() -> TemplateSettings {
        let mut settings = TemplateSettings::default();
        for toggle in Toggle::ALL {
            settings.visibility.set(toggle, true);
        }
        settings
    }

    #[test]
    fn default_order_is_canonical() {
        let doc = render(&InvoiceDocument::sample(), &TemplateSettings::default());
        // bank details are absent from the default settings
        assert_eq!(
            doc.section_ids(),
            vec![
                SectionId::Header,
                SectionId::CustomerDetails,
                SectionId::ItemsTable,
                SectionId::Totals,
                SectionId::Terms,
                SectionId::Signature,
            ]
        );
    }

    #[test]
    fn sections_follow_settings_order() {
        let mut settings = TemplateSettings::default();
        settings.section_order = move_section(&settings.section_order, SectionId::Signature, 0);
        settings.section_order = move_section(&settings.section_order, SectionId::Totals, 1);
        let doc = render(&InvoiceDocument::sample(), &settings);
        let ids = doc.section_ids();
        assert_eq!(ids[0], SectionId::Signature);
        assert_eq!(ids[1], SectionId::Totals);
    }

    #[test]
    fn sections_do_not_overlap() {
        let doc = render(&full_document(), &all_on());
        for pair in doc.sections.windows(2) {
            assert!(pair[0].frame.bottom() <= pair[1].frame.y, "{:?}", pair[1].id);
        }
        assert!(doc.height >= doc.sections.last().unwrap().frame.bottom());
    }

    #[test]
    fn nodes_stay_inside_their_section() {
        let doc = render(&full_document(), &all_on());
        for section in &doc.sections {
            for node in &section.nodes {
                assert!(node.rect.y >= section.frame.y - 0.01, "{:?}", node);
                assert!(node.rect.bottom() <= section.frame.bottom() + 0.01, "{:?}", node);
            }
        }
    }

    #[test]
    fn every_toggle_removes_only_its_element() {
        let doc = full_document();
        let settings = all_on();
        let baseline = render(&doc, &settings);
        for toggle in Toggle::ALL {
            assert!(
                baseline.nodes_for(toggle).count() > 0,
                "{:?} has nothing to govern",
                toggle
            );
        }

        for toggle in Toggle::ALL {
            let mut off = settings.clone();
            off.visibility.set(toggle, false);
            let rendered = render(&doc, &off);

            assert_eq!(rendered.nodes_for(toggle).count(), 0, "{:?} still rendered", toggle);
            for other in Toggle::ALL.into_iter().filter(|t| *t != toggle) {
                assert!(
                    rendered.nodes_for(other).count() > 0,
                    "turning off {:?} removed {:?}",
                    toggle,
                    other
                );
            }
            for section in &rendered.sections {
                assert!(!section.nodes.is_empty(), "empty {:?} left behind", section.id);
            }
        }
    }

    #[test]
    fn hidden_sections_leave_no_gap() {
        let doc = InvoiceDocument::sample();
        let mut settings = TemplateSettings::default();
        settings.visibility.show_terms = false;
        let without = render(&doc, &settings);
        assert!(without.section(SectionId::Terms).is_none());

        let totals = without.section(SectionId::Totals).unwrap();
        let signature = without.section(SectionId::Signature).unwrap();
        let gap = signature.frame.y - totals.frame.bottom();
        assert_eq!(gap, ResolvedStyle::from_settings(&settings).section_gap);
    }

    #[test]
    fn missing_bank_name_hides_block() {
        let doc = InvoiceDocument::sample();
        let mut settings = TemplateSettings::default();
        settings.bank.bank_account_number = Some("001122334455".to_string());
        assert!(render(&doc, &settings).section(SectionId::BankDetails).is_none());

        settings.bank.bank_name = Some("State Bank of India".to_string());
        let rendered = render(&doc, &settings);
        assert!(rendered.section(SectionId::BankDetails).is_some());
        assert!(rendered.contains_text("001122334455"));
        // unset fields render no label
        assert!(!rendered.contains_text("IFSC"));
    }

    #[test]
    fn empty_items_render_header_row_only() {
        let mut doc = InvoiceDocument::sample();
        doc.items.clear();
        let rendered = render(&doc, &TemplateSettings::default());
        let table = rendered.section(SectionId::ItemsTable).unwrap();
        assert!(table.nodes.iter().any(|n| n.text() == Some("Description")));
        assert!(!table.nodes.iter().any(|n| n.text() == Some("1")));
    }

    #[test]
    fn totals_render_stored_values() {
        let mut doc = InvoiceDocument::sample();
        // stored totals deliberately disagree with the items
        doc.totals.subtotal = 1.0;
        doc.totals.tax_amount = 2.0;
        doc.totals.rounding = 0.0;
        doc.totals.grand_total = 3.0;
        let rendered = render(&doc, &TemplateSettings::default());
        let totals = rendered.section(SectionId::Totals).unwrap();
        let texts: Vec<&str> = totals.nodes.iter().filter_map(Node::text).collect();
        assert!(texts.contains(&"1.00"));
        assert!(texts.contains(&"Rs. 3.00"));
    }

    #[test]
    fn line_breakup_appears_in_table() {
        let mut doc = InvoiceDocument::sample();
        doc.items = vec![LineItem {
            quantity: 2.0,
            unit_price: 118.0,
            tax_rate: 18.0,
            ..LineItem::new(1, "Widget")
        }];
        let rendered = render(&doc, &TemplateSettings::default());
        let table = rendered.section(SectionId::ItemsTable).unwrap();
        let texts: Vec<&str> = table.nodes.iter().filter_map(Node::text).collect();
        assert!(texts.contains(&"100.00"), "{:?}", texts);
        assert!(texts.contains(&"36.00"), "{:?}", texts);
        assert!(texts.contains(&"236.00"), "{:?}", texts);
    }

    #[test]
    fn size_tiers_change_text_size() {
        let doc = InvoiceDocument::sample();
        let mut small = TemplateSettings::default();
        small.typography.font_size = SizeScale::Small;
        let mut large = TemplateSettings::default();
        large.typography.font_size = SizeScale::Large;
        assert!(render(&doc, &small).height < render(&doc, &large).height);
    }

    #[test]
    fn no_border_emits_no_rules_in_table() {
        let doc = InvoiceDocument::sample();
        let mut settings = TemplateSettings::default();
        settings.layout.border_style = BorderStyle::None;
        settings.layout.row_padding = Spacing::Compact;
        let rendered = render(&doc, &settings);
        let table = rendered.section(SectionId::ItemsTable).unwrap();
        assert!(!table.nodes.iter().any(|n| matches!(n.kind, NodeKind::Rule { .. })));
    }

    #[test]
    fn malformed_overlay_is_dropped() {
        let mut settings = TemplateSettings::default();
        settings.freeform_canvas = Some("{not json".to_string());
        let rendered = render(&InvoiceDocument::sample(), &settings);
        assert!(rendered.overlay.is_none());
        assert!(!rendered.sections.is_empty());
    }

    #[test]
    fn valid_overlay_is_kept() {
        let mut settings = TemplateSettings::default();
        settings.freeform_canvas =
            Some(r#"{"objects":[{"type":"rect","left":10,"top":10,"width":50,"height":20,"fill":"red"}]}"#.to_string());
        let rendered = render(&InvoiceDocument::sample(), &settings);
        assert_eq!(rendered.overlay.as_ref().map(|s| s.objects.len()), Some(1));
    }

    #[test]
    fn image_sources_are_distinct() {
        let mut doc = full_document();
        doc.items[1].image = doc.items[0].image.clone();
        let rendered = render(&doc, &all_on());
        assert_eq!(
            rendered.image_sources(),
            vec![
                "https://assets.example/logo.png".to_string(),
                "https://assets.example/ac.png".to_string(),
            ]
        );
    }
}
