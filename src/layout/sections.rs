//! Section builders.
//!
//! Each builder lays its content out from `top` and returns the bottom edge,
//! or `None` when the section has nothing to show. Optional elements are
//! tagged with the [`Toggle`] that governs them.

use chrono::NaiveDate;

use super::style::{FontFamilies, FontRole, ResolvedStyle};
use super::text::{line_height, wrap};
use super::{Align, CONTENT_MARGIN, Node, NodeKind, PAGE_WIDTH, Rect, Section, Weight};
use crate::invoice::InvoiceDocument;
use crate::invoice::money::{
    LineAmounts, format_amount, format_currency, format_percent, format_quantity, item_totals,
};
use crate::settings::{HeaderLayout, SectionId, TemplateSettings, Toggle};

/// Horizontal padding inside table cells.
const CELL_PADDING: f32 = 4.0;

/// Width of the totals block.
const TOTALS_WIDTH: f32 = 300.0;

/// Width of the signature block.
const SIGNATURE_WIDTH: f32 = 240.0;

/// Blank space left for a handwritten signature.
const SIGNING_SPACE: f32 = 40.0;

pub(super) struct BuildContext<'a> {
    pub doc: &'a InvoiceDocument,
    pub settings: &'a TemplateSettings,
    pub style: &'a ResolvedStyle,
}

pub(super) fn build(id: SectionId, ctx: &BuildContext<'_>, top: f32) -> Option<Section> {
    let mut nodes = Vec::new();
    let bottom = match id {
        SectionId::Header => header(ctx, top, &mut nodes),
        SectionId::CustomerDetails => customer_details(ctx, top, &mut nodes),
        SectionId::ItemsTable => items_table(ctx, top, &mut nodes),
        SectionId::Totals => totals(ctx, top, &mut nodes),
        SectionId::BankDetails => bank_details(ctx, top, &mut nodes),
        SectionId::Terms => terms(ctx, top, &mut nodes),
        SectionId::Signature => signature(ctx, top, &mut nodes),
    }?;

    if nodes.is_empty() {
        return None;
    }

    Some(Section {
        id,
        frame: Rect::new(0.0, top, PAGE_WIDTH, bottom - top),
        nodes,
    })
}

// ============================================================================
// PRIMITIVES
// ============================================================================

#[allow(clippy::too_many_arguments)]
fn text_node(
    rect: Rect,
    text: impl Into<String>,
    size: f32,
    font: &str,
    color: &str,
    weight: Weight,
    align: Align,
    toggle: Option<Toggle>,
) -> Node {
    Node {
        rect,
        kind: NodeKind::Text {
            text: text.into(),
            size,
            color: color.to_string(),
            weight,
            align,
            font: font.to_string(),
        },
        toggle,
    }
}

fn fill(rect: Rect, color: &str) -> Node {
    Node {
        rect,
        kind: NodeKind::Fill {
            color: color.to_string(),
        },
        toggle: None,
    }
}

fn rule(rect: Rect, color: &str, toggle: Option<Toggle>) -> Node {
    Node {
        rect,
        kind: NodeKind::Rule {
            color: color.to_string(),
        },
        toggle,
    }
}

fn image(rect: Rect, source: &str, toggle: Toggle) -> Node {
    Node {
        rect,
        kind: NodeKind::Image {
            source: source.to_string(),
        },
        toggle: Some(toggle),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// A column of stacked, wrapped text lines.
struct Flow {
    x: f32,
    width: f32,
    y: f32,
    align: Align,
    families: FontFamilies,
    nodes: Vec<Node>,
}

impl Flow {
    fn new(x: f32, y: f32, width: f32, align: Align, families: &FontFamilies) -> Self {
        Self {
            x,
            width,
            y,
            align,
            families: families.clone(),
            nodes: Vec::new(),
        }
    }

    /// Body text.
    fn line(&mut self, text: &str, size: f32, color: &str, weight: Weight, toggle: Option<Toggle>) {
        self.push(FontRole::Body, text, size, color, weight, toggle);
    }

    /// Bold text in the heading family.
    fn heading(&mut self, text: &str, size: f32, color: &str, toggle: Option<Toggle>) {
        self.push(FontRole::Heading, text, size, color, Weight::Bold, toggle);
    }

    fn push(&mut self, role: FontRole, text: &str, size: f32, color: &str, weight: Weight, toggle: Option<Toggle>) {
        let h = line_height(size);
        for line in wrap(text, size, self.width) {
            self.nodes.push(text_node(
                Rect::new(self.x, self.y, self.width, h),
                line,
                size,
                self.families.get(role),
                color,
                weight,
                self.align,
                toggle,
            ));
            self.y += h;
        }
    }

    fn space(&mut self, h: f32) {
        self.y += h;
    }
}

// ============================================================================
// HEADER
// ============================================================================

fn contact_lines(doc: &InvoiceDocument) -> Vec<String> {
    let issuer = &doc.issuer;
    let mut lines = Vec::new();
    let phones: Vec<&str> = issuer
        .phones
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if !phones.is_empty() {
        lines.push(format!("Ph: {}", phones.join(", ")));
    }
    let online: Vec<&str> = [non_empty(&issuer.email), non_empty(&issuer.website)]
        .into_iter()
        .flatten()
        .collect();
    if !online.is_empty() {
        lines.push(online.join(" | "));
    }
    lines
}

fn state_line(state: &Option<String>, code: &Option<String>) -> Option<String> {
    let state = non_empty(state)?;
    Some(match non_empty(code) {
        Some(code) => format!("State: {} (Code: {})", state, code),
        None => format!("State: {}", state),
    })
}

/// Issuer identity lines: address, contact, GSTIN and state.
fn issuer_details(ctx: &BuildContext<'_>, flow: &mut Flow) {
    let s = ctx.style;
    let v = &ctx.settings.visibility;
    let issuer = &ctx.doc.issuer;

    for line in &issuer.address_lines {
        flow.line(line, s.fonts.small, &s.header_text, Weight::Regular, None);
    }
    if v.show_contact_in_header {
        for line in contact_lines(ctx.doc) {
            flow.line(&line, s.fonts.small, &s.header_text, Weight::Regular, Some(Toggle::ContactInHeader));
        }
    }
    if v.show_gstin_in_header
        && let Some(gstin) = non_empty(&issuer.gstin)
    {
        flow.line(
            &format!("GSTIN: {}", gstin),
            s.fonts.small,
            &s.header_text,
            Weight::Bold,
            Some(Toggle::GstinInHeader),
        );
    }
    if v.show_company_state
        && let Some(line) = state_line(&issuer.state, &issuer.state_code)
    {
        flow.line(&line, s.fonts.small, &s.header_text, Weight::Regular, Some(Toggle::CompanyState));
    }
}

fn title(ctx: &BuildContext<'_>, flow: &mut Flow) {
    let s = ctx.style;
    let label = ctx.settings.labels.document_title.trim();
    if ctx.settings.visibility.show_invoice_title && !label.is_empty() {
        flow.heading(label, s.fonts.heading, &s.header_text, Some(Toggle::InvoiceTitle));
    }
}

fn header(ctx: &BuildContext<'_>, top: f32, nodes: &mut Vec<Node>) -> Option<f32> {
    let s = ctx.style;
    let issuer = &ctx.doc.issuer;
    let pad = s.header_padding;
    let inner_width = PAGE_WIDTH - 2.0 * CONTENT_MARGIN;
    let y0 = top + pad;

    let logo = if ctx.settings.visibility.show_logo {
        non_empty(&issuer.logo)
    } else {
        None
    };
    let logo_box = s.logo_box;

    let mut content = Vec::new();
    let mut bottom = y0;

    match ctx.settings.layout.header_layout {
        HeaderLayout::Centered => {
            let mut y = y0;
            if let Some(src) = logo {
                let rect = Rect::new((PAGE_WIDTH - logo_box) / 2.0, y, logo_box, logo_box);
                content.push(image(rect, src, Toggle::Logo));
                y += logo_box + 8.0;
            }
            let mut flow = Flow::new(CONTENT_MARGIN, y, inner_width, Align::Center, &s.families);
            flow.heading(&issuer.name, s.fonts.title, &s.header_text, None);
            issuer_details(ctx, &mut flow);
            flow.space(6.0);
            title(ctx, &mut flow);
            bottom = bottom.max(flow.y);
            content.append(&mut flow.nodes);
        }
        HeaderLayout::LeftAligned => {
            let mut x = CONTENT_MARGIN;
            if let Some(src) = logo {
                content.push(image(Rect::new(x, y0, logo_box, logo_box), src, Toggle::Logo));
                x += logo_box + 16.0;
                bottom = bottom.max(y0 + logo_box);
            }
            let mut flow = Flow::new(x, y0, PAGE_WIDTH - CONTENT_MARGIN - x, Align::Left, &s.families);
            flow.heading(&issuer.name, s.fonts.title, &s.header_text, None);
            issuer_details(ctx, &mut flow);
            flow.space(6.0);
            title(ctx, &mut flow);
            bottom = bottom.max(flow.y);
            content.append(&mut flow.nodes);
        }
        HeaderLayout::Split => {
            let half = inner_width / 2.0;
            let mut x = CONTENT_MARGIN;
            if let Some(src) = logo {
                content.push(image(Rect::new(x, y0, logo_box, logo_box), src, Toggle::Logo));
                x += logo_box + 12.0;
                bottom = bottom.max(y0 + logo_box);
            }
            let mut left = Flow::new(x, y0, CONTENT_MARGIN + half - x, Align::Left, &s.families);
            left.heading(&issuer.name, s.fonts.heading, &s.header_text, None);
            for line in &issuer.address_lines {
                left.line(line, s.fonts.small, &s.header_text, Weight::Regular, None);
            }

            let mut right = Flow::new(CONTENT_MARGIN + half, y0, half, Align::Right, &s.families);
            title(ctx, &mut right);
            let v = &ctx.settings.visibility;
            if v.show_contact_in_header {
                for line in contact_lines(ctx.doc) {
                    right.line(&line, s.fonts.small, &s.header_text, Weight::Regular, Some(Toggle::ContactInHeader));
                }
            }
            if v.show_gstin_in_header
                && let Some(gstin) = non_empty(&issuer.gstin)
            {
                right.line(
                    &format!("GSTIN: {}", gstin),
                    s.fonts.small,
                    &s.header_text,
                    Weight::Bold,
                    Some(Toggle::GstinInHeader),
                );
            }
            if v.show_company_state
                && let Some(line) = state_line(&issuer.state, &issuer.state_code)
            {
                right.line(&line, s.fonts.small, &s.header_text, Weight::Regular, Some(Toggle::CompanyState));
            }

            bottom = bottom.max(left.y).max(right.y);
            content.append(&mut left.nodes);
            content.append(&mut right.nodes);
        }
    }

    let bottom = bottom + pad;
    nodes.push(fill(Rect::new(0.0, top, PAGE_WIDTH, bottom - top), &s.header_bg));
    nodes.append(&mut content);
    Some(bottom)
}

// ============================================================================
// CUSTOMER DETAILS
// ============================================================================

fn customer_details(ctx: &BuildContext<'_>, top: f32, nodes: &mut Vec<Node>) -> Option<f32> {
    let s = ctx.style;
    let v = &ctx.settings.visibility;
    let labels = &ctx.settings.labels;
    let party = &ctx.doc.counterparty;
    let meta = &ctx.doc.meta;
    let column = (PAGE_WIDTH - 2.0 * CONTENT_MARGIN - 24.0) / 2.0;
    let body = s.fonts.body;
    let small = s.fonts.small;

    let mut left = Flow::new(CONTENT_MARGIN, top, column, Align::Left, &s.families);
    left.heading(&labels.bill_to_label, body, &s.label_color, None);
    left.line(&party.name, body, &s.text_color, Weight::Bold, None);
    for line in &party.address_lines {
        left.line(line, small, &s.text_color, Weight::Regular, None);
    }
    if let Some(gstin) = non_empty(&party.gstin) {
        left.line(&format!("GSTIN: {}", gstin), small, &s.text_color, Weight::Regular, None);
    }
    if let Some(line) = state_line(&party.state, &party.state_code) {
        left.line(&line, small, &s.text_color, Weight::Regular, None);
    }
    if v.show_customer_phone
        && let Some(phone) = non_empty(&party.phone)
    {
        left.line(&format!("Phone: {}", phone), small, &s.text_color, Weight::Regular, Some(Toggle::CustomerPhone));
    }
    if v.show_customer_email
        && let Some(email) = non_empty(&party.email)
    {
        left.line(&format!("Email: {}", email), small, &s.text_color, Weight::Regular, Some(Toggle::CustomerEmail));
    }
    let shipping: Vec<&str> = party
        .shipping_address
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();
    if v.show_shipping_address && !shipping.is_empty() {
        left.space(4.0);
        left.heading("Ship To", small, &s.label_color, Some(Toggle::ShippingAddress));
        for line in shipping {
            left.line(line, small, &s.text_color, Weight::Regular, Some(Toggle::ShippingAddress));
        }
    }

    let mut right = Flow::new(PAGE_WIDTH - CONTENT_MARGIN - column, top, column, Align::Left, &s.families);
    right.heading(&labels.invoice_details_label, body, &s.label_color, None);
    right.line(&format!("Number: {}", meta.number), small, &s.text_color, Weight::Bold, None);
    right.line(&format!("Date: {}", format_date(meta.date)), small, &s.text_color, Weight::Regular, None);
    if let Some(way_bill) = non_empty(&meta.way_bill_number) {
        right.line(&format!("Way Bill No: {}", way_bill), small, &s.text_color, Weight::Regular, None);
    }
    if let Some(number) = non_empty(&meta.supplier_ref_number) {
        let line = match meta.supplier_ref_date {
            Some(date) => format!("Supplier Ref: {} dated {}", number, format_date(date)),
            None => format!("Supplier Ref: {}", number),
        };
        right.line(&line, small, &s.text_color, Weight::Regular, None);
    }
    if let Some(reference) = non_empty(&meta.reference) {
        right.line(&format!("Reference: {}", reference), small, &s.text_color, Weight::Regular, None);
    }

    let bottom = left.y.max(right.y);
    nodes.append(&mut left.nodes);
    nodes.append(&mut right.nodes);
    Some(bottom)
}

// ============================================================================
// ITEMS TABLE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Sequence,
    Image,
    Description,
    Brand,
    Quantity,
    Unit,
    Rate,
    Discount,
    TaxRate,
    TaxAmount,
    Amount,
}

impl Column {
    const ALL: [Column; 11] = [
        Column::Sequence,
        Column::Image,
        Column::Description,
        Column::Brand,
        Column::Quantity,
        Column::Unit,
        Column::Rate,
        Column::Discount,
        Column::TaxRate,
        Column::TaxAmount,
        Column::Amount,
    ];

    fn title(self) -> &'static str {
        match self {
            Column::Sequence => "#",
            Column::Image => "Image",
            Column::Description => "Description",
            Column::Brand => "Brand",
            Column::Quantity => "Qty",
            Column::Unit => "Unit",
            Column::Rate => "Rate",
            Column::Discount => "Disc.",
            Column::TaxRate => "GST %",
            Column::TaxAmount => "GST Amt",
            Column::Amount => "Amount",
        }
    }

    /// Fixed width; `None` takes the remaining space.
    fn width(self) -> Option<f32> {
        match self {
            Column::Sequence => Some(28.0),
            Column::Image => Some(56.0),
            Column::Description => None,
            Column::Brand => Some(80.0),
            Column::Quantity | Column::Unit => Some(44.0),
            Column::Rate | Column::TaxAmount => Some(76.0),
            Column::Discount | Column::TaxRate => Some(48.0),
            Column::Amount => Some(84.0),
        }
    }

    fn align(self) -> Align {
        match self {
            Column::Sequence | Column::Quantity | Column::Unit => Align::Center,
            Column::Image | Column::Description | Column::Brand => Align::Left,
            _ => Align::Right,
        }
    }

    fn toggle(self) -> Option<Toggle> {
        match self {
            Column::Image => Some(Toggle::ImageColumn),
            Column::Brand => Some(Toggle::BrandColumn),
            Column::Unit => Some(Toggle::UnitColumn),
            Column::Discount => Some(Toggle::DiscountColumn),
            _ => None,
        }
    }
}

/// A laid-out column: `x` and `width` of the whole cell.
struct Cell {
    column: Column,
    x: f32,
    width: f32,
}

impl Cell {
    fn inner_x(&self) -> f32 {
        self.x + CELL_PADDING
    }

    fn inner_width(&self) -> f32 {
        (self.width - 2.0 * CELL_PADDING).max(1.0)
    }
}

fn table_columns(settings: &TemplateSettings) -> Vec<Cell> {
    let visible: Vec<Column> = Column::ALL
        .into_iter()
        .filter(|c| c.toggle().is_none_or(|t| settings.visibility.get(t)))
        .collect();

    let inner_width = PAGE_WIDTH - 2.0 * CONTENT_MARGIN;
    let fixed: f32 = visible.iter().filter_map(|c| c.width()).sum();
    let flexible = (inner_width - fixed).max(60.0);

    let mut x = CONTENT_MARGIN;
    visible
        .into_iter()
        .map(|column| {
            let width = column.width().unwrap_or(flexible);
            let cell = Cell { column, x, width };
            x += width;
            cell
        })
        .collect()
}

/// Lay out one cell's wrapped text starting at `y`; returns the content bottom.
#[allow(clippy::too_many_arguments)]
fn cell_text(
    nodes: &mut Vec<Node>,
    s: &ResolvedStyle,
    cell: &Cell,
    y: f32,
    text: &str,
    size: f32,
    color: &str,
    weight: Weight,
    toggle: Option<Toggle>,
) -> f32 {
    let mut flow = Flow::new(cell.inner_x(), y, cell.inner_width(), cell.column.align(), &s.families);
    let role = match cell.column {
        Column::Quantity
        | Column::Rate
        | Column::Discount
        | Column::TaxRate
        | Column::TaxAmount
        | Column::Amount => FontRole::Mono,
        _ => FontRole::Body,
    };
    flow.push(role, text, size, color, weight, toggle);
    nodes.append(&mut flow.nodes);
    flow.y
}

fn items_table(ctx: &BuildContext<'_>, top: f32, nodes: &mut Vec<Node>) -> Option<f32> {
    let s = ctx.style;
    let doc = ctx.doc;
    let cells = table_columns(ctx.settings);
    let pad = s.row_padding;
    let border = s.border_width;
    let left = CONTENT_MARGIN;
    let width = PAGE_WIDTH - 2.0 * CONTENT_MARGIN;

    // Header row
    let header_height = line_height(s.fonts.small) + 2.0 * pad;
    nodes.push(fill(Rect::new(left, top, width, header_height), &s.table_header_bg));
    for cell in &cells {
        let mut flow = Flow::new(cell.inner_x(), top + pad, cell.inner_width(), cell.column.align(), &s.families);
        flow.heading(cell.column.title(), s.fonts.small, &s.table_header_text, cell.column.toggle());
        nodes.append(&mut flow.nodes);
    }
    let mut y = top + header_height;

    if doc.items.is_empty() {
        return Some(y);
    }

    for item in &doc.items {
        let amounts = LineAmounts::for_item(item);
        let row_top = y + pad;
        let mut row_bottom = row_top + line_height(s.fonts.body);

        for cell in &cells {
            let toggle = cell.column.toggle();
            let value = match cell.column {
                Column::Sequence => item.sequence.to_string(),
                Column::Image => {
                    if let Some(src) = non_empty(&item.image) {
                        let side = (cell.inner_width()).min(48.0);
                        nodes.push(image(Rect::new(cell.inner_x(), row_top, side, side), src, Toggle::ImageColumn));
                        row_bottom = row_bottom.max(row_top + side);
                    }
                    continue;
                }
                Column::Description => {
                    let mut bottom = cell_text(
                        nodes,
                        s,
                        cell,
                        row_top,
                        &item.description,
                        s.fonts.body,
                        &s.text_color,
                        Weight::Regular,
                        None,
                    );
                    let serials: Vec<&str> = item
                        .serial_numbers
                        .iter()
                        .map(|n| n.trim())
                        .filter(|n| !n.is_empty())
                        .collect();
                    if ctx.settings.visibility.show_serial_numbers && !serials.is_empty() {
                        bottom = cell_text(
                            nodes,
                            s,
                            cell,
                            bottom,
                            &format!("S/N: {}", serials.join(", ")),
                            s.fonts.small,
                            &s.secondary_color,
                            Weight::Regular,
                            Some(Toggle::SerialNumbers),
                        );
                    }
                    row_bottom = row_bottom.max(bottom);
                    continue;
                }
                Column::Brand => item.brand.clone().unwrap_or_default(),
                Column::Quantity => format_quantity(item.quantity),
                Column::Unit => item.unit.clone(),
                Column::Rate => format_amount(amounts.breakup.base_price),
                Column::Discount => item
                    .discount_percent
                    .map(format_percent)
                    .unwrap_or_else(|| "-".to_string()),
                Column::TaxRate => format_percent(item.tax_rate),
                Column::TaxAmount => format_amount(amounts.tax),
                Column::Amount => format_amount(amounts.total()),
            };
            let bottom = cell_text(
                nodes,
                s,
                cell,
                row_top,
                &value,
                s.fonts.body,
                &s.text_color,
                Weight::Regular,
                toggle,
            );
            row_bottom = row_bottom.max(bottom);
        }

        y = row_bottom + pad;
        if border > 0.0 {
            nodes.push(rule(Rect::new(left, y, width, border), &s.secondary_color, None));
            y += border;
        }
    }

    // Footer row with derived totals
    let derived = item_totals(&doc.items);
    let row_top = y + pad;
    let mut row_bottom = row_top + line_height(s.fonts.body);
    for cell in &cells {
        let value = match cell.column {
            Column::Description => "Total".to_string(),
            Column::Quantity => format_quantity(doc.quantity_total()),
            Column::TaxAmount => format_amount(derived.tax),
            Column::Amount => format_amount(derived.total()),
            _ => continue,
        };
        let bottom = cell_text(
            nodes,
            s,
            cell,
            row_top,
            &value,
            s.fonts.body,
            &s.text_color,
            Weight::Bold,
            None,
        );
        row_bottom = row_bottom.max(bottom);
    }
    y = row_bottom + pad;
    if border > 0.0 {
        nodes.push(rule(Rect::new(left, y, width, border), &s.secondary_color, None));
        y += border;
    }

    Some(y)
}

// ============================================================================
// TOTALS
// ============================================================================

fn totals(ctx: &BuildContext<'_>, top: f32, nodes: &mut Vec<Node>) -> Option<f32> {
    let s = ctx.style;
    let t = &ctx.doc.totals;
    let pad = s.row_padding;
    let x = PAGE_WIDTH - CONTENT_MARGIN - TOTALS_WIDTH;
    let half = TOTALS_WIDTH / 2.0;
    let row_height = line_height(s.fonts.body) + 2.0 * pad;

    let mut rows: Vec<(String, String)> = vec![("Subtotal".to_string(), format_amount(t.subtotal))];
    if t.discount_amount.abs() > f64::EPSILON {
        let label = if t.discount_percent > 0.0 {
            format!("Discount ({})", format_percent(t.discount_percent))
        } else {
            "Discount".to_string()
        };
        rows.push((label, format!("-{}", format_amount(t.discount_amount))));
    }
    let tax_label = if t.tax_rate > 0.0 {
        format!("GST ({})", format_percent(t.tax_rate))
    } else {
        "GST".to_string()
    };
    rows.push((tax_label, format_amount(t.tax_amount)));
    if t.rounding.abs() > f64::EPSILON {
        rows.push(("Round Off".to_string(), format_amount(t.rounding)));
    }

    let mut y = top;
    for (label, value) in rows {
        let rect = Rect::new(x + CELL_PADDING, y + pad, half - CELL_PADDING, line_height(s.fonts.body));
        nodes.push(text_node(
            rect,
            label,
            s.fonts.body,
            &s.families.body,
            &s.text_color,
            Weight::Regular,
            Align::Left,
            None,
        ));
        let rect = Rect::new(x + half, y + pad, half - CELL_PADDING, line_height(s.fonts.body));
        nodes.push(text_node(
            rect,
            value,
            s.fonts.body,
            &s.families.mono,
            &s.text_color,
            Weight::Regular,
            Align::Right,
            None,
        ));
        y += row_height;
    }

    if s.border_width > 0.0 {
        nodes.push(rule(Rect::new(x, y, TOTALS_WIDTH, s.border_width), &s.secondary_color, None));
        y += s.border_width;
    }

    let grand_height = line_height(s.fonts.heading) + 2.0 * pad;
    nodes.push(fill(Rect::new(x, y, TOTALS_WIDTH, grand_height), &s.grand_total_bg));
    let rect = Rect::new(x + CELL_PADDING, y + pad, half - CELL_PADDING, line_height(s.fonts.heading));
    nodes.push(text_node(
        rect,
        "Grand Total",
        s.fonts.heading,
        &s.families.heading,
        &s.grand_total_text,
        Weight::Bold,
        Align::Left,
        None,
    ));
    let rect = Rect::new(x + half, y + pad, half - CELL_PADDING, line_height(s.fonts.heading));
    nodes.push(text_node(
        rect,
        format_currency(t.grand_total),
        s.fonts.heading,
        &s.families.mono,
        &s.grand_total_text,
        Weight::Bold,
        Align::Right,
        None,
    ));
    y += grand_height;

    if ctx.settings.visibility.show_amount_in_words {
        let words = ctx
            .doc
            .amount_in_words
            .clone()
            .filter(|w| !w.trim().is_empty())
            .unwrap_or_else(|| crate::invoice::money::amount_in_words(t.grand_total));
        let mut flow = Flow::new(CONTENT_MARGIN, y + pad, PAGE_WIDTH - 2.0 * CONTENT_MARGIN, Align::Left, &s.families);
        flow.line(
            &format!("Amount in words: {}", words),
            s.fonts.small,
            &s.text_color,
            Weight::Regular,
            Some(Toggle::AmountInWords),
        );
        y = flow.y;
        nodes.append(&mut flow.nodes);
    }

    Some(y)
}

// ============================================================================
// BANK DETAILS, TERMS, SIGNATURE
// ============================================================================

fn bank_details(ctx: &BuildContext<'_>, top: f32, nodes: &mut Vec<Node>) -> Option<f32> {
    let s = ctx.style;
    let bank = &ctx.settings.bank;
    let name = non_empty(&bank.bank_name)?;

    let mut flow = Flow::new(CONTENT_MARGIN, top, (PAGE_WIDTH - 2.0 * CONTENT_MARGIN) / 2.0, Align::Left, &s.families);
    flow.heading("Bank Details", s.fonts.body, &s.label_color, None);
    flow.line(&format!("Bank: {}", name), s.fonts.small, &s.text_color, Weight::Regular, None);
    let fields = [
        ("A/c Name", &bank.bank_account_name),
        ("A/c No.", &bank.bank_account_number),
        ("IFSC", &bank.bank_ifsc),
        ("Branch", &bank.bank_branch),
    ];
    for (label, value) in fields {
        if let Some(value) = non_empty(value) {
            flow.line(&format!("{}: {}", label, value), s.fonts.small, &s.text_color, Weight::Regular, None);
        }
    }

    let bottom = flow.y;
    nodes.append(&mut flow.nodes);
    Some(bottom)
}

fn terms(ctx: &BuildContext<'_>, top: f32, nodes: &mut Vec<Node>) -> Option<f32> {
    let s = ctx.style;
    if !ctx.settings.visibility.show_terms {
        return None;
    }
    let lines = ctx.settings.terms_lines();
    if lines.is_empty() {
        return None;
    }

    let toggle = Some(Toggle::Terms);
    let mut flow = Flow::new(CONTENT_MARGIN, top, PAGE_WIDTH - 2.0 * CONTENT_MARGIN, Align::Left, &s.families);
    flow.heading("Terms & Conditions", s.fonts.body, &s.label_color, toggle);
    for (i, line) in lines.iter().enumerate() {
        flow.line(&format!("{}. {}", i + 1, line), s.fonts.small, &s.text_color, Weight::Regular, toggle);
    }

    let bottom = flow.y;
    nodes.append(&mut flow.nodes);
    Some(bottom)
}

fn signature(ctx: &BuildContext<'_>, top: f32, nodes: &mut Vec<Node>) -> Option<f32> {
    let s = ctx.style;
    if !ctx.settings.visibility.show_signature {
        return None;
    }

    let toggle = Some(Toggle::Signature);
    let x = PAGE_WIDTH - CONTENT_MARGIN - SIGNATURE_WIDTH;
    let mut flow = Flow::new(x, top, SIGNATURE_WIDTH, Align::Center, &s.families);
    flow.line(
        &format!("For {}", ctx.doc.issuer.name),
        s.fonts.body,
        &s.text_color,
        Weight::Bold,
        toggle,
    );
    flow.space(SIGNING_SPACE);
    let stroke = s.border_width.max(1.0);
    flow.nodes.push(rule(Rect::new(x, flow.y, SIGNATURE_WIDTH, stroke), &s.secondary_color, toggle));
    flow.space(stroke + 2.0);
    flow.line("Authorised Signatory", s.fonts.small, &s.secondary_color, Weight::Regular, toggle);

    let bottom = flow.y;
    nodes.append(&mut flow.nodes);
    Some(bottom)
}
