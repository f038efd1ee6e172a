//! Layout engine – uses Taffy to place a [`VisualDocument`] on an off-screen
//! canvas, then converts the result into a tree of positioned boxes that the
//! rasterizer paints.
//!
//! The geometry mirrors the stylesheet emitted by [`crate::html`]: an 8.5in
//! wide sheet at 96 px/in with half-inch padding, sections separated by the
//! variant's divider, a right-aligned totals block at 45% width.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::assets::image_aspect;
use crate::document::{
    Align, Divider, Emphasis, FieldRow, Fill, HeaderSection, ItemsTable, Logo, PartiesSection,
    PartyBlock, RenderMode, Section, TotalRow, VisualDocument,
};
use crate::error::Result;
use crate::fonts::{wrap_text, FontBook};
use crate::labels::LabelKey;
use crate::palette::{Palette, Rgb, Rgba};

/// Canvas width in CSS px (8.5in at 96 px/in).
pub const DOC_WIDTH: f32 = 816.0;
/// Sheet padding in CSS px (0.5in).
pub const DOC_PADDING: f32 = 48.0;
pub const LINE_HEIGHT: f32 = 1.45;

const BODY_SIZE: f32 = 13.0;
const SMALL_SIZE: f32 = 11.0;
const TITLE_SIZE: f32 = 28.0;
const STRONG_TOTAL_SIZE: f32 = 15.0;
const SECTION_PAD: f32 = 16.0;
const CELL_PAD_X: f32 = 10.0;
const CELL_PAD_Y: f32 = 8.0;
const MAX_LOGO_WIDTH: f32 = 240.0;

// ---------------------------------------------------------------------------
// Positioned tree
// ---------------------------------------------------------------------------

/// A horizontal line along the top or bottom edge of a box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    pub color: Rgba,
    pub width: f32,
    pub double: bool,
}

/// Paint attributes of a box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxDecor {
    pub fill: Option<Rgba>,
    pub radius: f32,
    pub top_rule: Option<Rule>,
    pub bottom_rule: Option<Rule>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub lines: Vec<String>,
    pub size: f32,
    pub bold: bool,
    pub color: Rgba,
    pub align: Align,
    pub family: String,
}

impl TextRun {
    pub fn line_height(&self) -> f32 {
        self.size * LINE_HEIGHT
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxContent {
    None,
    Text(TextRun),
    Image { src: String },
}

/// A positioned box in document coordinates.
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub decor: BoxDecor,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
}

impl PositionedBox {
    /// Visit this box and every descendant, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a PositionedBox)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentLayout {
    pub width: f32,
    pub height: f32,
    pub background: Rgb,
    pub boxes: Vec<PositionedBox>,
}

impl DocumentLayout {
    /// Every text line in paint order.
    pub fn text_lines(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for b in &self.boxes {
            b.walk(&mut |pb| {
                if let BoxContent::Text(run) = &pb.content {
                    out.extend(run.lines.iter().map(String::as_str));
                }
            });
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Build Taffy tree from the visual document
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontBook,
    family: String,
    palette: &'a Palette,
    mode: RenderMode,
    node_decor: HashMap<NodeId, BoxDecor>,
    node_content: HashMap<NodeId, BoxContent>,
}

fn pad(top: f32, right: f32, bottom: f32, left: f32) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(top),
        right: LengthPercentage::Length(right),
        bottom: LengthPercentage::Length(bottom),
        left: LengthPercentage::Length(left),
    }
}

fn gap(row: f32, column: f32) -> Size<LengthPercentage> {
    Size {
        width: LengthPercentage::Length(column),
        height: LengthPercentage::Length(row),
    }
}

fn fixed_width(width: f32) -> Size<Dimension> {
    Size {
        width: Dimension::Length(width),
        height: Dimension::Auto,
    }
}

fn column_style(width: f32, row_gap: f32) -> Style {
    Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: fixed_width(width),
        gap: gap(row_gap, 0.0),
        ..Default::default()
    }
}

fn row_style(width: f32, column_gap: f32) -> Style {
    Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Row,
        size: fixed_width(width),
        gap: gap(0.0, column_gap),
        align_items: Some(taffy::AlignItems::FlexStart),
        ..Default::default()
    }
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontBook, doc: &'a VisualDocument) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            family: doc.font_family.clone(),
            palette: &doc.palette,
            mode: doc.mode,
            node_decor: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    fn fg(&self) -> Rgba {
        Rgba::opaque(self.palette.foreground)
    }

    fn divider_rule(&self, divider: Divider) -> Option<Rule> {
        match divider {
            Divider::None => None,
            Divider::Hairline => Some(Rule {
                color: self.palette.border,
                width: 1.0,
                double: false,
            }),
            Divider::Double => Some(Rule {
                color: self.palette.border,
                width: 3.0,
                double: true,
            }),
        }
    }

    fn hairline(&self) -> Rule {
        Rule {
            color: self.palette.border,
            width: 1.0,
            double: false,
        }
    }

    /// Background and text color for a skin fill.
    fn fill_colors(&self, fill: Fill) -> (Option<Rgba>, Rgba) {
        match fill {
            Fill::Solid => (
                Some(Rgba::opaque(self.palette.header)),
                Rgba::opaque(self.palette.header_foreground),
            ),
            Fill::Overlay => (
                Some(Rgba::opaque(self.palette.header_overlay)),
                Rgba::opaque(self.palette.header_overlay_foreground),
            ),
            Fill::None => (None, self.fg()),
        }
    }

    /// A wrapped text leaf exactly `width` wide.
    fn text(
        &mut self,
        text: &str,
        size: f32,
        bold: bool,
        color: Rgba,
        align: Align,
        width: f32,
    ) -> Result<NodeId> {
        let lines = wrap_text(text, size, bold, &self.family, width, self.fonts);
        let height = lines.len() as f32 * size * LINE_HEIGHT;
        let node = self.taffy.new_leaf(Style {
            size: Size {
                width: Dimension::Length(width),
                height: Dimension::Length(height),
            },
            flex_shrink: 0.0,
            ..Default::default()
        })?;
        self.node_content.insert(
            node,
            BoxContent::Text(TextRun {
                lines,
                size,
                bold,
                color,
                align,
                family: self.family.clone(),
            }),
        );
        Ok(node)
    }

    /// A text leaf sized to its content (single line, no wrapping).
    fn inline_text(&mut self, text: &str, size: f32, bold: bool, color: Rgba) -> Result<NodeId> {
        let width = self.fonts.measure(text, size, bold, &self.family).ceil();
        self.text(text, size, bold, color, Align::Left, width.max(1.0))
    }

    /// Image leaf at the logo's height, with its width. Logos that are not
    /// decodable data URIs are skipped.
    fn image(&mut self, logo: &Logo) -> Result<Option<(NodeId, f32)>> {
        let Some(aspect) = image_aspect(&logo.src) else {
            log::warn!("Skipping logo that is not a decodable data URI");
            return Ok(None);
        };
        let height = logo.height_px as f32;
        let width = (height * aspect).min(MAX_LOGO_WIDTH);
        let node = self.taffy.new_leaf(Style {
            size: Size {
                width: Dimension::Length(width),
                height: Dimension::Length(height),
            },
            flex_shrink: 0.0,
            ..Default::default()
        })?;
        self.node_content.insert(
            node,
            BoxContent::Image {
                src: logo.src.clone(),
            },
        );
        Ok(Some((node, width)))
    }

    fn container(&mut self, style: Style, children: &[NodeId], decor: BoxDecor) -> Result<NodeId> {
        let node = self.taffy.new_with_children(style, children)?;
        if decor != BoxDecor::default() {
            self.node_decor.insert(node, decor);
        }
        Ok(node)
    }

    /// Standard section wrapper: vertical padding plus the divider below.
    fn section(&mut self, children: &[NodeId], width: f32, divider: Divider) -> Result<NodeId> {
        let style = Style {
            padding: pad(SECTION_PAD, 0.0, SECTION_PAD, 0.0),
            ..column_style(width, 12.0)
        };
        let decor = BoxDecor {
            bottom_rule: self.divider_rule(divider),
            ..Default::default()
        };
        self.container(style, children, decor)
    }

    /// Display value for a row; empty interactive slots show their label muted.
    fn slot_value<'r>(&self, row: &'r FieldRow) -> (&'r str, bool) {
        if row.value.is_empty() && self.mode == RenderMode::Interactive {
            (row.label.as_str(), true)
        } else {
            (row.value.as_str(), false)
        }
    }

    fn build_header(&mut self, h: &HeaderSection, doc: &VisualDocument, width: f32) -> Result<NodeId> {
        let skin = doc.skin;
        let (fill, color) = self.fill_colors(skin.header_fill);
        let pad_x = if fill.is_some() { 24.0 } else { 0.0 };
        let inner = width - 2.0 * pad_x;

        let mut children = Vec::new();
        let mut logo_width = 0.0;
        if let Some(logo) = &h.logo {
            if let Some((node, w)) = self.image(logo)? {
                children.push(node);
                logo_width = w + 16.0;
            }
        }
        let title_width = (inner - logo_width).max(1.0);
        let title = self.text(&h.title, TITLE_SIZE, true, color, Align::Left, title_width)?;
        let mut heading = vec![title];
        if self.mode == RenderMode::Interactive || !h.number.value.is_empty() {
            let line = format!("{} {}", h.number.label, h.number.value);
            heading.push(self.text(line.trim(), BODY_SIZE, false, color, Align::Left, title_width)?);
        }
        let heading = self.container(column_style(title_width, 2.0), &heading, BoxDecor::default())?;
        children.push(heading);

        let style = Style {
            padding: pad(20.0, pad_x, 20.0, pad_x),
            align_items: Some(taffy::AlignItems::Center),
            ..row_style(width, 16.0)
        };
        let decor = BoxDecor {
            fill,
            radius: skin.border_radius,
            bottom_rule: if fill.is_none() {
                self.divider_rule(skin.divider)
            } else {
                None
            },
            ..Default::default()
        };
        self.container(style, &children, decor)
    }

    fn build_party(&mut self, block: &PartyBlock, width: f32) -> Result<NodeId> {
        let muted = self.palette.muted;
        let mut nodes = vec![self.text(
            &block.heading.to_uppercase(),
            SMALL_SIZE,
            true,
            muted,
            Align::Left,
            width,
        )?];
        for (i, row) in block.rows.iter().enumerate() {
            let (value, placeholder) = self.slot_value(row);
            let value = if row.key == LabelKey::Attention && !placeholder {
                format!("{}: {value}", row.label)
            } else {
                value.to_string()
            };
            let color = if placeholder { muted } else { self.fg() };
            nodes.push(self.text(&value, BODY_SIZE, i == 0, color, Align::Left, width)?);
        }
        self.container(column_style(width, 2.0), &nodes, BoxDecor::default())
    }

    fn build_parties(&mut self, p: &PartiesSection, divider: Divider, width: f32) -> Result<NodeId> {
        let blocks: Vec<&PartyBlock> = std::iter::once(&p.sender)
            .chain(std::iter::once(&p.client))
            .chain(p.ship_to.iter())
            .collect();
        let col_gap = 24.0;
        let block_width =
            (width - col_gap * (blocks.len().saturating_sub(1)) as f32) / blocks.len().max(1) as f32;
        let mut columns = Vec::with_capacity(blocks.len());
        for block in blocks {
            columns.push(self.build_party(block, block_width)?);
        }
        let row = self.container(row_style(width, col_gap), &columns, BoxDecor::default())?;

        let mut children = Vec::new();
        if let Some(logo) = &p.logo {
            if let Some((node, _)) = self.image(logo)? {
                children.push(node);
            }
        }
        children.push(row);
        self.section(&children, width, divider)
    }

    fn build_meta(&mut self, rows: &[FieldRow], divider: Divider, width: f32) -> Result<NodeId> {
        let muted = self.palette.muted;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let (value, placeholder) = self.slot_value(row);
            let label = self.inline_text(&row.label, BODY_SIZE, false, muted)?;
            let color = if placeholder { muted } else { self.fg() };
            let value = if placeholder { "" } else { value };
            let value = self.inline_text(value, BODY_SIZE, false, color)?;
            items.push(self.container(row_style_auto(6.0), &[label, value], BoxDecor::default())?);
        }
        let style = Style {
            flex_wrap: taffy::FlexWrap::Wrap,
            gap: gap(8.0, 32.0),
            ..row_style(width, 32.0)
        };
        let wrap = self.container(style, &items, BoxDecor::default())?;
        self.section(&[wrap], width, divider)
    }

    fn build_items(&mut self, table: &ItemsTable, doc: &VisualDocument, width: f32) -> Result<NodeId> {
        let skin = doc.skin;
        let (head_fill, head_color) = self.fill_colors(skin.table_header_fill);
        let widths: Vec<f32> = table.columns.iter().map(|c| c.width * width).collect();
        let cell_style = |w: f32| Style {
            padding: pad(CELL_PAD_Y, CELL_PAD_X, CELL_PAD_Y, CELL_PAD_X),
            ..column_style(w, 2.0)
        };

        let mut head_cells = Vec::with_capacity(table.columns.len());
        for (col, &w) in table.columns.iter().zip(&widths) {
            let text = self.text(
                &col.label.to_uppercase(),
                SMALL_SIZE,
                true,
                head_color,
                col.align,
                (w - 2.0 * CELL_PAD_X).max(1.0),
            )?;
            head_cells.push(self.container(cell_style(w), &[text], BoxDecor::default())?);
        }
        let head_decor = BoxDecor {
            fill: head_fill,
            radius: skin.border_radius,
            bottom_rule: Some(self.hairline()),
            ..Default::default()
        };
        let mut rows = vec![self.container(row_style(width, 0.0), &head_cells, head_decor)?];

        let align = |i: usize| table.columns.get(i).map(|c| c.align).unwrap_or(Align::Left);
        let muted = self.palette.muted;
        for (index, item) in table.rows.iter().enumerate() {
            let mut cells = Vec::with_capacity(4);
            let values = [&item.name, &item.quantity, &item.rate, &item.amount];
            for (i, (value, &w)) in values.iter().zip(&widths).enumerate() {
                let inner = (w - 2.0 * CELL_PAD_X).max(1.0);
                let mut content = vec![self.text(value, BODY_SIZE, false, self.fg(), align(i), inner)?];
                if i == 0 && !item.description.is_empty() {
                    content.push(self.text(&item.description, 12.0, false, muted, align(i), inner)?);
                }
                cells.push(self.container(cell_style(w), &content, BoxDecor::default())?);
            }
            let decor = BoxDecor {
                fill: (index % 2 == 1).then_some(self.palette.muted_bg),
                bottom_rule: Some(self.hairline()),
                ..Default::default()
            };
            rows.push(self.container(row_style(width, 0.0), &cells, decor)?);
        }

        let table_node = self.container(column_style(width, 0.0), &rows, BoxDecor::default())?;
        self.section(&[table_node], width, skin.divider)
    }

    fn build_totals(&mut self, rows: &[TotalRow], divider: Divider, width: f32) -> Result<NodeId> {
        let block_width = (width * 0.45).round();
        let mut nodes = Vec::with_capacity(rows.len());
        for row in rows {
            let strong = row.emphasis == Emphasis::Strong;
            let size = if strong { STRONG_TOTAL_SIZE } else { BODY_SIZE };
            let half = block_width / 2.0;
            let fg = self.fg();
            let label = self.text(&row.label, size, strong, fg, Align::Left, half)?;
            let amount = self.text(&row.amount, size, strong, fg, Align::Right, half)?;
            let style = Style {
                padding: pad(if strong { 8.0 } else { 4.0 }, 0.0, 4.0, 0.0),
                justify_content: Some(taffy::JustifyContent::SpaceBetween),
                ..row_style(block_width, 0.0)
            };
            let decor = BoxDecor {
                top_rule: strong.then(|| self.hairline()),
                ..Default::default()
            };
            nodes.push(self.container(style, &[label, amount], decor)?);
        }
        let block = self.container(
            Style {
                align_self: Some(taffy::AlignSelf::FlexEnd),
                ..column_style(block_width, 0.0)
            },
            &nodes,
            BoxDecor::default(),
        )?;
        let style = Style {
            padding: pad(SECTION_PAD, 0.0, SECTION_PAD, 0.0),
            align_items: Some(taffy::AlignItems::FlexEnd),
            ..column_style(width, 0.0)
        };
        let decor = BoxDecor {
            bottom_rule: self.divider_rule(divider),
            ..Default::default()
        };
        self.container(style, &[block], decor)
    }

    fn build_notes(&mut self, blocks: &[FieldRow], width: f32) -> Result<NodeId> {
        let muted = self.palette.muted;
        let mut nodes = Vec::new();
        for block in blocks {
            let (value, placeholder) = self.slot_value(block);
            nodes.push(self.text(&block.label.to_uppercase(), SMALL_SIZE, true, muted, Align::Left, width)?);
            let color = if placeholder { muted } else { self.fg() };
            let value = if placeholder { "" } else { value };
            nodes.push(self.text(value, BODY_SIZE, false, color, Align::Left, width)?);
        }
        self.section(&nodes, width, Divider::None)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox> {
        let layout = self.taffy.layout(node)?;
        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            decor: self.node_decor.get(&node).cloned().unwrap_or_default(),
            content: self
                .node_content
                .get(&node)
                .cloned()
                .unwrap_or(BoxContent::None),
            children,
        })
    }
}

/// Row sized to its content.
fn row_style_auto(column_gap: f32) -> Style {
    Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Row,
        gap: gap(0.0, column_gap),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Lay out the whole invoice on a single tall canvas.
pub fn compute_layout(doc: &VisualDocument, fonts: &FontBook) -> Result<DocumentLayout> {
    let content_width = DOC_WIDTH - 2.0 * DOC_PADDING;
    let mut builder = LayoutBuilder::new(fonts, doc);
    let divider = doc.skin.divider;

    let mut child_ids = Vec::new();
    for section in &doc.sections {
        let id = match section {
            Section::Header(h) => builder.build_header(h, doc, content_width)?,
            Section::Parties(p) => builder.build_parties(p, divider, content_width)?,
            Section::Meta { rows } if rows.is_empty() => continue,
            Section::Meta { rows } => builder.build_meta(rows, divider, content_width)?,
            Section::Items(t) => builder.build_items(t, doc, content_width)?,
            Section::Totals { rows } => builder.build_totals(rows, divider, content_width)?,
            Section::Notes { blocks } if blocks.is_empty() => continue,
            Section::Notes { blocks } => builder.build_notes(blocks, content_width)?,
        };
        child_ids.push(id);
    }

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: fixed_width(DOC_WIDTH),
        padding: pad(DOC_PADDING, DOC_PADDING, DOC_PADDING, DOC_PADDING),
        ..Default::default()
    };
    let root = builder.taffy.new_with_children(root_style, &child_ids)?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(DOC_WIDTH),
            height: AvailableSpace::MaxContent,
        },
    )?;

    let root_box = builder.extract(root, 0.0, 0.0)?;
    log::debug!(
        "laid out {} sections into {}x{} px",
        root_box.children.len(),
        root_box.width,
        root_box.height
    );
    Ok(DocumentLayout {
        width: root_box.width,
        height: root_box.height,
        background: doc.palette.background,
        boxes: root_box.children,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InvoiceDocument, LineItem, TemplateVariant};
    use crate::palette::resolve_palette;
    use crate::templates::render_document;
    use crate::totals::compute_totals;

    fn visual(items: usize, variant: TemplateVariant) -> VisualDocument {
        let mut doc = InvoiceDocument::default();
        doc.meta.invoice_number = "INV-1".to_string();
        doc.sender.name = "Acme".to_string();
        doc.client.name = "Globex".to_string();
        doc.items = (0..items)
            .map(|i| LineItem::new(&format!("i{i}"), &format!("Item {i}"), "1", "10"))
            .collect();
        let totals = compute_totals(&doc.items, &doc.fees);
        let palette = resolve_palette("#ffffff", "#1d4ed8");
        render_document(&doc, &totals, &palette, variant, RenderMode::Export)
    }

    #[test]
    fn layout_spans_full_width() {
        let layout = compute_layout(&visual(2, TemplateVariant::Modern), &FontBook::new()).unwrap();
        assert_eq!(layout.width, DOC_WIDTH);
        assert!(layout.height > 2.0 * DOC_PADDING);
        for b in &layout.boxes {
            assert!((b.x - DOC_PADDING).abs() < 0.01);
            assert!(b.x + b.width <= DOC_WIDTH - DOC_PADDING + 0.01);
        }
    }

    #[test]
    fn sections_stack_without_overlap() {
        let layout = compute_layout(&visual(3, TemplateVariant::Classic), &FontBook::new()).unwrap();
        for pair in layout.boxes.windows(2) {
            assert!(pair[1].y >= pair[0].y + pair[0].height - 0.01);
        }
    }

    #[test]
    fn more_items_make_a_taller_canvas() {
        let fonts = FontBook::new();
        let short = compute_layout(&visual(2, TemplateVariant::Minimal), &fonts).unwrap();
        let long = compute_layout(&visual(60, TemplateVariant::Minimal), &fonts).unwrap();
        assert!(long.height > short.height + 1000.0);
    }

    #[test]
    fn text_content_is_present() {
        let layout = compute_layout(&visual(1, TemplateVariant::Modern), &FontBook::new()).unwrap();
        let lines = layout.text_lines();
        assert!(lines.contains(&"INVOICE"));
        assert!(lines.contains(&"Globex"));
        assert!(lines.contains(&"Item 0"));
        assert!(lines.contains(&"$10.00"));
    }

    #[test]
    fn modern_header_is_filled_with_radius() {
        let layout = compute_layout(&visual(1, TemplateVariant::Modern), &FontBook::new()).unwrap();
        let header = &layout.boxes[0];
        assert_eq!(header.decor.radius, 8.0);
        assert_eq!(header.decor.fill.map(|f| f.rgb.to_hex()), Some("#1d4ed8".to_string()));

        let minimal = compute_layout(&visual(1, TemplateVariant::Minimal), &FontBook::new()).unwrap();
        assert!(minimal.boxes[0].decor.fill.is_none());
        assert!(minimal.boxes[0].decor.bottom_rule.is_some());
    }

    fn image_boxes(layout: &DocumentLayout) -> Vec<(f32, f32)> {
        let mut out = Vec::new();
        for b in &layout.boxes {
            b.walk(&mut |pb| {
                if let BoxContent::Image { .. } = pb.content {
                    out.push((pb.width, pb.height));
                }
            });
        }
        out
    }

    #[test]
    fn logo_boxes_follow_size_and_skip_bad_sources() {
        const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";
        let mut doc = InvoiceDocument::default();
        doc.logo = Some(PIXEL.to_string());
        let totals = compute_totals(&doc.items, &doc.fees);
        let palette = resolve_palette("#ffffff", "#e5e7eb");
        let v = render_document(&doc, &totals, &palette, TemplateVariant::Modern, RenderMode::Export);
        let layout = compute_layout(&v, &FontBook::new()).unwrap();
        let height = doc.style.logo_size.height_px() as f32;
        assert_eq!(image_boxes(&layout), [(height, height)]);

        doc.logo = Some("https://example.com/logo.png".to_string());
        let v = render_document(&doc, &totals, &palette, TemplateVariant::Modern, RenderMode::Export);
        let layout = compute_layout(&v, &FontBook::new()).unwrap();
        assert!(image_boxes(&layout).is_empty());
    }
}
