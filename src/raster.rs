//! Off-screen rasterization of a visual document.
//!
//! The laid-out tree is drawn as an SVG scene and rendered with resvg at a
//! configurable device scale, either as one tall bitmap or band by band.

use std::fmt::Write as _;
use std::sync::Arc;

use image::{Rgba as Pixel, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{fontdb, Options, Tree};

use crate::document::{Align, VisualDocument};
use crate::error::{ExportError, Result};
use crate::fonts::FontBook;
use crate::html::{css_font_stack, escape_html};
use crate::layout::{compute_layout, BoxContent, DocumentLayout, PositionedBox, Rule};
use crate::pagination::{page_height_px, plan_bands, slice_bands};
use crate::palette::Rgba;

/// Largest bitmap edge we are willing to allocate in one pixmap.
const MAX_EDGE_PX: f32 = 60_000.0;

/// Produces a bitmap of a visual document.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, doc: &VisualDocument, scale: f32) -> Result<RgbaImage>;

    /// The document cut into page-height bands for pages of the given size.
    ///
    /// The default renders the whole bitmap and slices it.
    fn rasterize_bands(
        &self,
        doc: &VisualDocument,
        scale: f32,
        page_width_pt: f32,
        page_height_pt: f32,
    ) -> Result<Vec<RgbaImage>> {
        let full = self.rasterize(doc, scale)?;
        let page_px = page_height_px(full.width(), page_width_pt, page_height_pt);
        Ok(slice_bands(&full, page_px))
    }
}

pub struct SvgRasterizer {
    fonts: FontBook,
    fontdb: Arc<fontdb::Database>,
}

impl Default for SvgRasterizer {
    fn default() -> Self {
        Self::new(FontBook::new(), true)
    }
}

impl SvgRasterizer {
    /// `system_fonts` also makes installed fonts available for glyph drawing.
    pub fn new(fonts: FontBook, system_fonts: bool) -> Self {
        let mut db = fontdb::Database::new();
        if system_fonts {
            db.load_system_fonts();
        }
        for data in fonts.font_data() {
            db.load_font_data(data.to_vec());
        }
        if db.is_empty() {
            log::warn!("No fonts available to the rasterizer, text will not be drawn");
        }
        Self {
            fonts,
            fontdb: Arc::new(db),
        }
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    /// Parsed scene plus its device size in px.
    fn scene(&self, doc: &VisualDocument, scale: f32) -> Result<(Tree, u32, u32)> {
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ExportError::Raster(format!("invalid scale {scale}")));
        }
        let layout = compute_layout(doc, &self.fonts)?;
        if layout.width <= 0.0 || layout.height <= 0.0 {
            return Err(ExportError::RenderTarget(
                "invoice laid out to an empty area".to_string(),
            ));
        }
        let svg = layout_to_svg(&layout, &self.fonts);

        let mut opts = Options::default();
        opts.fontdb = Arc::clone(&self.fontdb);
        let tree = Tree::from_str(&svg, &opts)
            .map_err(|e| ExportError::Raster(format!("SVG parsing failed: {e}")))?;

        let width = (layout.width * scale).ceil();
        if width > MAX_EDGE_PX {
            return Err(ExportError::Raster(format!("bitmap width {width} px is too large")));
        }
        let height = (layout.height * scale).ceil().min(u32::MAX as f32);
        Ok((tree, width as u32, height as u32))
    }
}

fn new_pixmap(width: u32, height: u32) -> Result<Pixmap> {
    if height as f32 > MAX_EDGE_PX {
        return Err(ExportError::Raster(format!(
            "bitmap of {width}x{height} px is too large"
        )));
    }
    Pixmap::new(width, height)
        .ok_or_else(|| ExportError::Raster(format!("Failed to create pixmap ({width}x{height})")))
}

impl Rasterizer for SvgRasterizer {
    fn rasterize(&self, doc: &VisualDocument, scale: f32) -> Result<RgbaImage> {
        let (tree, width, height) = self.scene(doc, scale)?;
        let mut pixmap = new_pixmap(width, height)?;
        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        log::debug!("rasterized {} at {}x{} px", doc.id, width, height);

        Ok(pixmap_to_rgba_image(&pixmap))
    }

    /// Each band gets its own pixmap, so no single allocation spans the
    /// whole invoice.
    fn rasterize_bands(
        &self,
        doc: &VisualDocument,
        scale: f32,
        page_width_pt: f32,
        page_height_pt: f32,
    ) -> Result<Vec<RgbaImage>> {
        let (tree, width, height) = self.scene(doc, scale)?;
        let page_px = page_height_px(width, page_width_pt, page_height_pt);

        let mut bands = Vec::new();
        for band in plan_bands(height, page_px) {
            let mut pixmap = new_pixmap(width, band.height)?;
            let transform =
                Transform::from_scale(scale, scale).post_translate(0.0, -(band.offset as f32));
            resvg::render(&tree, transform, &mut pixmap.as_mut());
            bands.push(pixmap_to_rgba_image(&pixmap));
        }
        log::debug!(
            "rasterized {} at {}x{} px in {} band(s)",
            doc.id,
            width,
            height,
            bands.len()
        );
        Ok(bands)
    }
}

fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let width = pixmap.width();
    let mut img = RgbaImage::new(width, pixmap.height());
    for (i, p) in pixmap.pixels().iter().enumerate() {
        let c = p.demultiply();
        let (x, y) = (i as u32 % width, i as u32 / width);
        img.put_pixel(x, y, Pixel([c.red(), c.green(), c.blue(), c.alpha()]));
    }
    img
}

fn paint_attr(name: &str, color: Rgba) -> String {
    if color.a >= 1.0 {
        format!("{name}=\"{}\"", color.rgb.to_hex())
    } else {
        format!(
            "{name}=\"{}\" {name}-opacity=\"{:.2}\"",
            color.rgb.to_hex(),
            color.a
        )
    }
}

fn write_rule(svg: &mut String, b: &PositionedBox, rule: Rule, top: bool) {
    let edge = if top { b.y } else { b.y + b.height - rule.width };
    if rule.double {
        // Two 1px strokes at the outer edges of the rule.
        for y in [edge, edge + rule.width - 1.0] {
            let _ = writeln!(
                svg,
                r#"<rect x="{:.2}" y="{y:.2}" width="{:.2}" height="1" {}/>"#,
                b.x,
                b.width,
                paint_attr("fill", rule.color)
            );
        }
    } else {
        let _ = writeln!(
            svg,
            r#"<rect x="{:.2}" y="{edge:.2}" width="{:.2}" height="{:.2}" {}/>"#,
            b.x,
            b.width,
            rule.width,
            paint_attr("fill", rule.color)
        );
    }
}

fn write_box(svg: &mut String, b: &PositionedBox, fonts: &FontBook) {
    if let Some(fill) = b.decor.fill {
        let _ = writeln!(
            svg,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{:.2}" {}/>"#,
            b.x,
            b.y,
            b.width,
            b.height,
            b.decor.radius,
            paint_attr("fill", fill)
        );
    }
    if let Some(rule) = b.decor.top_rule {
        write_rule(svg, b, rule, true);
    }
    if let Some(rule) = b.decor.bottom_rule {
        write_rule(svg, b, rule, false);
    }

    match &b.content {
        BoxContent::None => {}
        BoxContent::Text(run) => {
            let lh = run.line_height();
            let baseline =
                (lh - run.size) / 2.0 + fonts.ascender(run.size, run.bold, &run.family);
            let (x, anchor) = match run.align {
                Align::Left => (b.x, "start"),
                Align::Right => (b.x + b.width, "end"),
            };
            let weight = if run.bold { "bold" } else { "normal" };
            let family = escape_html(&css_font_stack(&run.family));
            for (i, line) in run.lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    svg,
                    r#"<text x="{x:.2}" y="{:.2}" font-family="{family}" font-size="{}" font-weight="{weight}" text-anchor="{anchor}" {} xml:space="preserve">{}</text>"#,
                    b.y + i as f32 * lh + baseline,
                    run.size,
                    paint_attr("fill", run.color),
                    escape_html(line)
                );
            }
        }
        BoxContent::Image { src } => {
            let _ = writeln!(
                svg,
                r#"<image x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" preserveAspectRatio="xMinYMid meet" xlink:href="{}"/>"#,
                b.x,
                b.y,
                b.width,
                b.height,
                escape_html(src)
            );
        }
    }

    for child in &b.children {
        write_box(svg, child, fonts);
    }
}

/// Serialize a laid-out document as a standalone SVG scene.
pub fn layout_to_svg(layout: &DocumentLayout, fonts: &FontBook) -> String {
    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = layout.width,
        h = layout.height
    );
    let _ = writeln!(
        svg,
        r#"<rect x="0" y="0" width="{}" height="{}" fill="{}"/>"#,
        layout.width,
        layout.height,
        layout.background.to_hex()
    );
    for b in &layout.boxes {
        write_box(&mut svg, b, fonts);
    }
    svg.push_str("</svg>\n");
    svg
}
