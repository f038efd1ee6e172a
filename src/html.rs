//! Standalone HTML serialization of a [`VisualDocument`].
//!
//! The output is a complete document (doctype, `@page` rules, one embedded
//! style block, body) with no external references apart from the logo
//! source, which callers inline beforehand when they need a self-contained
//! file (see [`crate::assets`]). Serialization is deterministic: the same
//! visual tree always yields the same bytes.

use std::fmt::Write as _;

use crate::document::{
    Align, Divider, Emphasis, FieldRow, Fill, HeaderSection, ItemsTable, Logo, PartiesSection,
    PartyBlock, RenderMode, Section, TotalRow, VisualDocument,
};
use crate::palette::{Palette, Rgb};

/// `@page` settings for the print engine.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintSettings {
    /// CSS page size keyword.
    pub page_size: String,
    pub margin_in: f32,
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self {
            page_size: "Letter".to_string(),
            margin_in: 0.5,
        }
    }
}

/// Escape text for element content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Escaped text with line breaks preserved.
fn multiline(text: &str) -> String {
    escape_html(text).replace('\n', "<br>")
}

/// Font stack with the user's family first; characters that could break out
/// of the declaration are dropped.
pub fn css_font_stack(family: &str) -> String {
    let clean: String = family
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let clean = clean.trim();
    if clean.is_empty() {
        "Helvetica, Arial, sans-serif".to_string()
    } else {
        format!("'{clean}', Helvetica, Arial, sans-serif")
    }
}

fn fill_colors(fill: Fill, palette: &Palette) -> (String, Rgb) {
    match fill {
        Fill::Solid => (palette.header.to_hex(), palette.header_foreground),
        Fill::Overlay => (palette.header_overlay.to_hex(), palette.header_overlay_foreground),
        Fill::None => ("transparent".to_string(), palette.foreground),
    }
}

fn divider_css(divider: Divider, palette: &Palette) -> String {
    match divider {
        Divider::None => "none".to_string(),
        Divider::Hairline => format!("1px solid {}", palette.border.css()),
        Divider::Double => format!("3px double {}", palette.border.css()),
    }
}

fn stylesheet(doc: &VisualDocument, print: &PrintSettings) -> String {
    let p = &doc.palette;
    let skin = &doc.skin;
    let (header_bg, header_fg) = fill_colors(skin.header_fill, p);
    let (thead_bg, thead_fg) = fill_colors(skin.table_header_fill, p);
    let divider = divider_css(skin.divider, p);
    let radius = skin.border_radius;

    let mut css = String::new();
    let _ = write!(
        css,
        "@page {{ size: {size}; margin: {margin}in; }}\n\
         * {{ box-sizing: border-box; -webkit-print-color-adjust: exact; print-color-adjust: exact; }}\n\
         html, body {{ margin: 0; padding: 0; background: {bg}; }}\n\
         .invoice {{ font-family: {font}; font-size: 13px; line-height: 1.45; color: {fg}; background: {bg}; max-width: 8.5in; margin: 0 auto; padding: 0.5in; }}\n\
         @media print {{ .invoice {{ padding: 0; max-width: none; box-shadow: none; }} }}\n\
         @media screen {{ .invoice {{ box-shadow: 0 4px 24px {shadow}; }} }}\n\
         .inv-header {{ display: flex; justify-content: space-between; align-items: center; gap: 16px; padding: 20px 24px; border-radius: {radius}px; background: {header_bg}; color: {header_fg}; box-shadow: 0 1px 2px {header_shadow}; }}\n\
         .inv-header h1 {{ margin: 0; font-size: 28px; letter-spacing: 0.04em; }}\n\
         .inv-number {{ font-size: 13px; }}\n\
         .inv-number .label {{ opacity: 0.8; margin-right: 6px; }}\n\
         .logo {{ display: block; object-fit: contain; }}\n\
         .logo--prominent {{ margin-bottom: 16px; }}\n\
         .inv-section {{ padding: 16px 0; border-bottom: {divider}; }}\n\
         .parties {{ display: flex; gap: 24px; }}\n\
         .party {{ flex: 1; }}\n\
         .party h2, .notes h2 {{ margin: 0 0 6px; font-size: 11px; text-transform: uppercase; letter-spacing: 0.08em; color: {muted}; }}\n\
         .party .primary {{ font-weight: 600; }}\n\
         .meta {{ display: flex; flex-wrap: wrap; gap: 8px 32px; }}\n\
         .meta .label {{ color: {muted}; margin-right: 6px; }}\n\
         table.items {{ width: 100%; border-collapse: separate; border-spacing: 0; }}\n\
         table.items thead {{ display: table-header-group; }}\n\
         table.items th {{ padding: 8px 10px; font-size: 11px; text-transform: uppercase; letter-spacing: 0.06em; background: {thead_bg}; color: {thead_fg}; border-bottom: 1px solid {border}; }}\n\
         table.items th:first-child {{ border-top-left-radius: {radius}px; border-bottom-left-radius: {radius}px; }}\n\
         table.items th:last-child {{ border-top-right-radius: {radius}px; border-bottom-right-radius: {radius}px; }}\n\
         table.items td {{ padding: 8px 10px; vertical-align: top; border-bottom: 1px solid {border}; }}\n\
         table.items tr {{ break-inside: avoid; page-break-inside: avoid; }}\n\
         table.items tbody tr:nth-child(even) td {{ background: {muted_bg}; }}\n\
         .left {{ text-align: left; }}\n\
         .right {{ text-align: right; }}\n\
         .desc {{ color: {muted}; font-size: 12px; }}\n\
         .totals {{ margin-left: auto; width: 45%; break-inside: avoid; page-break-inside: avoid; break-before: avoid; page-break-before: avoid; }}\n\
         .total-row {{ display: flex; justify-content: space-between; padding: 4px 0; }}\n\
         .total-row.strong {{ font-weight: 700; font-size: 15px; border-top: 1px solid {border}; padding-top: 8px; }}\n\
         .notes h2 {{ margin-top: 8px; }}\n\
         .notes p {{ margin: 0 0 8px; white-space: pre-wrap; }}\n\
         [contenteditable] {{ min-width: 2em; min-height: 1em; display: inline-block; outline: 1px dashed {border}; }}\n",
        size = print.page_size,
        margin = print.margin_in,
        bg = p.background.to_hex(),
        fg = p.foreground.to_hex(),
        font = css_font_stack(&doc.font_family),
        shadow = p.background_shadow.css(),
        radius = radius,
        header_bg = header_bg,
        header_fg = header_fg.to_hex(),
        header_shadow = p.header_shadow.css(),
        divider = divider,
        muted = p.muted.css(),
        muted_bg = p.muted_bg.css(),
        border = p.border.css(),
        thead_bg = thead_bg,
        thead_fg = thead_fg.to_hex(),
    );
    css
}

/// Attributes that turn a span into an editable slot in interactive mode.
fn slot_attrs(mode: RenderMode, field: &str) -> String {
    match mode {
        RenderMode::Interactive => format!(
            " data-field=\"{}\" contenteditable=\"true\"",
            escape_html(field)
        ),
        RenderMode::Export => String::new(),
    }
}

fn write_logo(out: &mut String, logo: &Logo, class: &str) {
    let _ = writeln!(
        out,
        "<img class=\"logo {class}\" src=\"{}\" alt=\"\" style=\"height: {}px\">",
        escape_html(&logo.src),
        logo.height_px
    );
}

fn write_header(out: &mut String, h: &HeaderSection, mode: RenderMode) {
    out.push_str("<header class=\"inv-header\">\n");
    if let Some(logo) = &h.logo {
        write_logo(out, logo, "logo--tucked");
    }
    let _ = writeln!(out, "<h1>{}</h1>", escape_html(&h.title));
    if mode == RenderMode::Interactive || !h.number.value.is_empty() {
        let _ = writeln!(
            out,
            "<div class=\"inv-number\"><span class=\"label\">{}</span><span{}>{}</span></div>",
            escape_html(&h.number.label),
            slot_attrs(mode, &h.number.field),
            escape_html(&h.number.value)
        );
    }
    out.push_str("</header>\n");
}

fn write_party(out: &mut String, block: &PartyBlock, class: &str, mode: RenderMode) {
    let _ = writeln!(out, "<div class=\"party {class}\">");
    let _ = writeln!(out, "<h2>{}</h2>", escape_html(&block.heading));
    for (i, row) in block.rows.iter().enumerate() {
        let primary = if i == 0 { " class=\"primary\"" } else { "" };
        let _ = writeln!(
            out,
            "<div{primary}><span{}>{}</span></div>",
            slot_attrs(mode, &row.field),
            multiline(&row.value)
        );
    }
    out.push_str("</div>\n");
}

fn write_parties(out: &mut String, p: &PartiesSection, mode: RenderMode) {
    out.push_str("<section class=\"inv-section\">\n");
    if let Some(logo) = &p.logo {
        write_logo(out, logo, "logo--prominent");
    }
    out.push_str("<div class=\"parties\">\n");
    write_party(out, &p.sender, "party--sender", mode);
    write_party(out, &p.client, "party--client", mode);
    if let Some(ship) = &p.ship_to {
        write_party(out, ship, "party--ship", mode);
    }
    out.push_str("</div>\n</section>\n");
}

fn write_meta(out: &mut String, rows: &[FieldRow], mode: RenderMode) {
    if rows.is_empty() {
        return;
    }
    out.push_str("<section class=\"inv-section meta\">\n");
    for row in rows {
        let _ = writeln!(
            out,
            "<div><span class=\"label\">{}</span><span{}>{}</span></div>",
            escape_html(&row.label),
            slot_attrs(mode, &row.field),
            escape_html(&row.value)
        );
    }
    out.push_str("</section>\n");
}

fn align_class(align: Align) -> &'static str {
    match align {
        Align::Left => "left",
        Align::Right => "right",
    }
}

fn write_items(out: &mut String, table: &ItemsTable, mode: RenderMode) {
    out.push_str("<section class=\"inv-section\">\n<table class=\"items\">\n<thead>\n<tr>");
    for col in &table.columns {
        let _ = write!(
            out,
            "<th class=\"{}\" style=\"width: {:.0}%\">{}</th>",
            align_class(col.align),
            col.width * 100.0,
            escape_html(&col.label)
        );
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    let align = |i: usize| {
        table
            .columns
            .get(i)
            .map(|c| align_class(c.align))
            .unwrap_or("left")
    };
    for row in &table.rows {
        let _ = write!(out, "<tr data-item=\"{}\">", escape_html(&row.id));
        let _ = write!(
            out,
            "<td class=\"{}\"><div>{}</div>",
            align(0),
            escape_html(&row.name)
        );
        if !row.description.is_empty() {
            let _ = write!(out, "<div class=\"desc\">{}</div>", multiline(&row.description));
        }
        out.push_str("</td>");
        let _ = write!(out, "<td class=\"{}\">{}</td>", align(1), escape_html(&row.quantity));
        let _ = write!(out, "<td class=\"{}\">{}</td>", align(2), escape_html(&row.rate));
        let _ = writeln!(out, "<td class=\"{}\">{}</td></tr>", align(3), escape_html(&row.amount));
    }
    if table.rows.is_empty() && mode == RenderMode::Interactive {
        out.push_str("<tr class=\"empty\"><td colspan=\"4\"></td></tr>\n");
    }
    out.push_str("</tbody>\n</table>\n</section>\n");
}

fn write_totals(out: &mut String, rows: &[TotalRow]) {
    out.push_str("<section class=\"inv-section\">\n<div class=\"totals\">\n");
    for row in rows {
        let class = match row.emphasis {
            Emphasis::Strong => "total-row strong",
            Emphasis::Normal => "total-row",
        };
        let _ = writeln!(
            out,
            "<div class=\"{class}\" data-total=\"{}\"><span>{}</span><span>{}</span></div>",
            row.key.as_str(),
            escape_html(&row.label),
            escape_html(&row.amount)
        );
    }
    out.push_str("</div>\n</section>\n");
}

fn write_notes(out: &mut String, blocks: &[FieldRow], mode: RenderMode) {
    if blocks.is_empty() {
        return;
    }
    out.push_str("<section class=\"inv-section notes\">\n");
    for block in blocks {
        let _ = writeln!(
            out,
            "<h2>{}</h2>\n<p{}>{}</p>",
            escape_html(&block.label),
            slot_attrs(mode, &block.field),
            escape_html(&block.value)
        );
    }
    out.push_str("</section>\n");
}

/// The invoice body alone, for embedding in a host page.
pub fn render_fragment(doc: &VisualDocument) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<div class=\"invoice invoice--{}\" id=\"invoice-{}\">",
        doc.variant.as_str(),
        escape_html(&doc.id)
    );
    for section in &doc.sections {
        match section {
            Section::Header(h) => write_header(&mut out, h, doc.mode),
            Section::Parties(p) => write_parties(&mut out, p, doc.mode),
            Section::Meta { rows } => write_meta(&mut out, rows, doc.mode),
            Section::Items(t) => write_items(&mut out, t, doc.mode),
            Section::Totals { rows } => write_totals(&mut out, rows),
            Section::Notes { blocks } => write_notes(&mut out, blocks, doc.mode),
        }
    }
    out.push_str("</div>\n");
    out
}

/// Complete standalone document.
pub fn render_html(doc: &VisualDocument, print: &PrintSettings) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let title = match doc.sections.first() {
        Some(Section::Header(h)) if !h.number.value.is_empty() => {
            format!("{} {}", doc.title, h.number.value)
        }
        _ => doc.title.clone(),
    };
    let _ = writeln!(out, "<title>{}</title>", escape_html(&title));
    let _ = write!(out, "<style>\n{}</style>\n", stylesheet(doc, print));
    out.push_str("</head>\n<body>\n");
    out.push_str(&render_fragment(doc));
    out.push_str("</body>\n</html>\n");
    out
}
