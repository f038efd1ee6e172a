//! Text measurement for the off-screen layout.
//!
//! Without loaded faces, widths come from a Helvetica-like average advance so
//! layout stays reproducible on machines without fonts. Faces loaded with
//! [`FontBook::load_font`] are measured glyph by glyph with `ttf-parser` and
//! are also handed to the rasterizer.

use std::collections::HashMap;

/// Metrics extracted from a parsed face.
#[derive(Clone)]
struct Face {
    bytes: Vec<u8>,
    units_per_em: f32,
    ascender: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FaceKey {
    family: String,
    bold: bool,
}

#[derive(Clone, Default)]
pub struct FontBook {
    faces: HashMap<FaceKey, Face>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TTF/OTF face under `family`.
    pub fn load_font(&mut self, family: &str, bold: bool, bytes: Vec<u8>) -> Result<(), String> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| format!("Failed to parse font {family:?}: {e}"))?;
        let face = Face {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            bytes,
        };
        self.faces.insert(
            FaceKey {
                family: family.to_ascii_lowercase(),
                bold,
            },
            face,
        );
        Ok(())
    }

    fn face(&self, family: &str, bold: bool) -> Option<&Face> {
        let family = family.to_ascii_lowercase();
        self.faces
            .get(&FaceKey {
                family: family.clone(),
                bold,
            })
            .or_else(|| self.faces.get(&FaceKey { family, bold: !bold }))
    }

    /// Raw bytes of every loaded face.
    pub fn font_data(&self) -> impl Iterator<Item = &[u8]> {
        self.faces.values().map(|f| f.bytes.as_slice())
    }

    /// Width of `text` in px at `size`.
    pub fn measure(&self, text: &str, size: f32, bold: bool, family: &str) -> f32 {
        if let Some(face) = self.face(family, bold) {
            if let Ok(parsed) = ttf_parser::Face::parse(&face.bytes, 0) {
                let scale = size / face.units_per_em;
                return text
                    .chars()
                    .map(|ch| {
                        parsed
                            .glyph_index(ch)
                            .and_then(|gid| parsed.glyph_hor_advance(gid))
                            .map(|adv| adv as f32 * scale)
                            .unwrap_or(size * 0.5)
                    })
                    .sum();
            }
        }
        // Bold runs about 10% wider.
        let avg = if bold { 0.55 } else { 0.5 };
        text.chars().count() as f32 * size * avg
    }

    /// Baseline offset from the top of a line box.
    pub fn ascender(&self, size: f32, bold: bool, family: &str) -> f32 {
        match self.face(family, bold) {
            Some(face) => face.ascender * size / face.units_per_em,
            None => size * 0.75,
        }
    }
}

/// Greedy word wrap to `max_width`. Explicit newlines always break; a single
/// word wider than the line stays whole on its own line.
pub fn wrap_text(
    text: &str,
    size: f32,
    bold: bool,
    family: &str,
    max_width: f32,
    fonts: &FontBook,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if max_width > 0.0 && fonts.measure(&candidate, size, bold, family) > max_width {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
            } else {
                current = candidate;
            }
        }
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_width() {
        let book = FontBook::new();
        // 5 chars × 16 × 0.5 = 40
        assert!((book.measure("Hello", 16.0, false, "Helvetica") - 40.0).abs() < 0.01);
        assert!(book.measure("Hello", 16.0, true, "Helvetica") > 40.0);
    }

    #[test]
    fn wraps_on_width_and_newlines() {
        let book = FontBook::new();
        let lines = wrap_text("Hello world foo bar", 16.0, false, "Helvetica", 60.0, &book);
        assert!(lines.len() >= 2, "{lines:?}");
        let lines = wrap_text("123 Main St\nSpringfield", 12.0, false, "x", 1000.0, &book);
        assert_eq!(lines, ["123 Main St", "Springfield"]);
    }

    #[test]
    fn rejects_garbage_font() {
        let mut book = FontBook::new();
        assert!(book.load_font("Broken", false, vec![0, 1, 2]).is_err());
        assert_eq!(book.font_data().count(), 0);
    }
}
