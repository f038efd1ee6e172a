//! Palette resolver – derives every display color from the two user-chosen
//! base colors.
//!
//! One luminance formula and one overlay constant are shared by the HTML
//! preview and the rasterized export, so both renderings pick identical
//! colors for a given document.

use serde::Serialize;

/// Relative luminance above which text switches to the dark color.
pub const CONTRAST_THRESHOLD: f64 = 0.179;

/// Weight of the header color when blending it over the background.
pub const HEADER_OVERLAY_ALPHA: f64 = 0.25;

pub const DARK_TEXT: Rgb = Rgb::new(0x11, 0x18, 0x27);
pub const LIGHT_TEXT: Rgb = Rgb::new(0xf9, 0xfa, 0xfb);

const MUTED_ALPHA: f32 = 0.65;
const BORDER_ALPHA: f32 = 0.15;
const MUTED_BG_ALPHA: f32 = 0.05;
const SHADOW_ALPHA: f32 = 0.12;
const HEADER_SHADOW_ALPHA: f32 = 0.25;

/// Opaque 8-bit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse any user input; see [`normalize_hex`].
    pub fn from_hex(input: &str) -> Self {
        let hex = normalize_hex(input);
        // `normalize_hex` always yields `#` + six hex digits.
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        Self::new(channel(1), channel(3), channel(5))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// WCAG relative luminance in `0.0..=1.0`.
    pub fn relative_luminance(self) -> f64 {
        fn linear(c: u8) -> f64 {
            let s = c as f64 / 255.0;
            if s <= 0.03928 {
                s / 12.92
            } else {
                ((s + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * linear(self.r) + 0.7152 * linear(self.g) + 0.0722 * linear(self.b)
    }

    pub fn is_light(self) -> bool {
        self.relative_luminance() > CONTRAST_THRESHOLD
    }

    /// Readable text color for this background.
    pub fn contrast_text(self) -> Rgb {
        if self.is_light() {
            DARK_TEXT
        } else {
            LIGHT_TEXT
        }
    }

    /// `self` painted at `alpha` over `base`, rounded per channel.
    pub fn over(self, base: Rgb, alpha: f64) -> Rgb {
        let mix = |top: u8, bottom: u8| -> u8 {
            (top as f64 * alpha + bottom as f64 * (1.0 - alpha))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r, base.r), mix(self.g, base.g), mix(self.b, base.b))
    }

    pub fn with_alpha(self, a: f32) -> Rgba {
        Rgba { rgb: self, a }
    }
}

/// Color with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub a: f32,
}

impl Rgba {
    pub fn opaque(rgb: Rgb) -> Self {
        Self { rgb, a: 1.0 }
    }

    /// CSS form; opaque colors print as hex so the output stays compact.
    pub fn css(&self) -> String {
        if self.a >= 1.0 {
            self.rgb.to_hex()
        } else {
            format!(
                "rgba({}, {}, {}, {:.2})",
                self.rgb.r, self.rgb.g, self.rgb.b, self.a
            )
        }
    }

    /// Flatten onto an opaque base.
    pub fn over(&self, base: Rgb) -> Rgb {
        self.rgb.over(base, self.a as f64)
    }
}

impl Serialize for Rgba {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.css())
    }
}

impl Serialize for Rgb {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

/// Coerce arbitrary input into `#rrggbb`.
///
/// Non-hex characters are dropped; nothing left means white; three digits
/// expand by doubling; anything else is right-padded with `0` and cut to six.
pub fn normalize_hex(input: &str) -> String {
    let digits: String = input
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let six = match digits.len() {
        0 => "ffffff".to_string(),
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        _ => {
            let mut padded: String = digits.chars().take(6).collect();
            while padded.len() < 6 {
                padded.push('0');
            }
            padded
        }
    };
    format!("#{six}")
}

/// The full set of derived display colors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub background: Rgb,
    pub foreground: Rgb,
    pub muted: Rgba,
    pub border: Rgba,
    pub muted_bg: Rgba,
    pub header: Rgb,
    pub header_overlay: Rgb,
    pub header_foreground: Rgb,
    pub header_overlay_foreground: Rgb,
    pub header_shadow: Rgba,
    pub background_shadow: Rgba,
}

impl Palette {
    /// True when the document reads as a light page.
    pub fn is_light(&self) -> bool {
        self.background.is_light()
    }
}

pub fn resolve_palette(background_color: &str, header_color: &str) -> Palette {
    let background = Rgb::from_hex(background_color);
    let header = Rgb::from_hex(header_color);
    let foreground = background.contrast_text();
    let header_foreground = header.contrast_text();
    let header_overlay = header.over(background, HEADER_OVERLAY_ALPHA);

    Palette {
        background,
        foreground,
        muted: foreground.with_alpha(MUTED_ALPHA),
        border: foreground.with_alpha(BORDER_ALPHA),
        muted_bg: foreground.with_alpha(MUTED_BG_ALPHA),
        header,
        header_overlay,
        header_foreground,
        header_overlay_foreground: header_overlay.contrast_text(),
        header_shadow: header_foreground.with_alpha(HEADER_SHADOW_ALPHA),
        background_shadow: foreground.with_alpha(SHADOW_ALPHA),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_never_fails() {
        assert_eq!(normalize_hex("#FFFFFF"), "#ffffff");
        assert_eq!(normalize_hex("abc"), "#aabbcc");
        assert_eq!(normalize_hex("#1"), "#100000");
        assert_eq!(normalize_hex("zzz"), "#ffffff");
        assert_eq!(normalize_hex(""), "#ffffff");
        assert_eq!(normalize_hex("12345678"), "#123456");
        assert_eq!(normalize_hex("#12 34"), "#123400");
    }

    #[test]
    fn luminance_extremes() {
        assert!((Rgb::WHITE.relative_luminance() - 1.0).abs() < 1e-9);
        assert_eq!(Rgb::new(0, 0, 0).relative_luminance(), 0.0);
    }

    #[test]
    fn black_header_on_white_page() {
        let p = resolve_palette("#FFFFFF", "#000000");
        assert_eq!(p.header_foreground, LIGHT_TEXT);
        assert_eq!(p.foreground, DARK_TEXT);
    }

    #[test]
    fn overlay_blends_toward_background() {
        let p = resolve_palette("#ffffff", "#000000");
        // 0.25 × 0 + 0.75 × 255 = 191.25
        assert_eq!(p.header_overlay, Rgb::new(191, 191, 191));
        assert_eq!(p.header_overlay_foreground, DARK_TEXT);
    }

    #[test]
    fn dark_background_uses_light_overlays() {
        let p = resolve_palette("#0f172a", "#1e293b");
        assert_eq!(p.foreground, LIGHT_TEXT);
        assert_eq!(p.muted.rgb, LIGHT_TEXT);
        assert!(p.muted.a < 1.0);
        assert!(!p.is_light());
    }

    #[test]
    fn idempotent() {
        for input in ["zzz", "", "#1", "#abc", "not a color"] {
            assert_eq!(resolve_palette(input, input), resolve_palette(input, input));
        }
    }

    #[test]
    fn css_forms() {
        assert_eq!(Rgba::opaque(Rgb::new(1, 2, 3)).css(), "#010203");
        assert_eq!(Rgb::new(0, 0, 0).with_alpha(0.5).css(), "rgba(0, 0, 0, 0.50)");
    }
}
