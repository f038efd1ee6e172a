//! Pagination – splits one tall invoice bitmap into page-height bands.
//!
//! Each band becomes one PDF page. Bands are contiguous: the first starts at
//! row 0, every next band starts where the previous one ended, and the walk
//! stops as soon as the cumulative offset reaches the bitmap height. The last
//! band may be shorter than a page.

use image::{imageops, RgbaImage};

/// How the client strategy turns a bitmap into pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaginationMode {
    /// One page when the bitmap fits a page, bands otherwise.
    #[default]
    Auto,
    /// Always one page whose height follows the bitmap's aspect ratio.
    SinglePage,
    /// Always page-height bands.
    Banded,
}

impl PaginationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(PaginationMode::Auto),
            "single" | "single-page" => Some(PaginationMode::SinglePage),
            "banded" | "bands" => Some(PaginationMode::Banded),
            _ => None,
        }
    }

    /// Settle `Auto` for a bitmap of `height` px and pages of `page_height` px.
    pub fn resolve(self, height: u32, page_height: u32) -> Self {
        match self {
            PaginationMode::Auto if height <= page_height => PaginationMode::SinglePage,
            PaginationMode::Auto => PaginationMode::Banded,
            other => other,
        }
    }
}

/// One horizontal strip of the source bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub index: usize,
    pub offset: u32,
    pub height: u32,
}

/// Page height in bitmap pixels when a `width_px` wide bitmap spans the
/// page width.
pub fn page_height_px(width_px: u32, page_width_pt: f32, page_height_pt: f32) -> u32 {
    if page_width_pt <= 0.0 {
        return width_px.max(1);
    }
    ((width_px as f64 * page_height_pt as f64 / page_width_pt as f64).round() as u32).max(1)
}

/// Bands covering `total_height` rows, `page_height` rows each.
pub fn plan_bands(total_height: u32, page_height: u32) -> Vec<Band> {
    let page_height = page_height.max(1);
    let mut bands = Vec::with_capacity(total_height.div_ceil(page_height) as usize);
    let mut offset = 0u32;
    while offset < total_height {
        let height = page_height.min(total_height - offset);
        bands.push(Band {
            index: bands.len(),
            offset,
            height,
        });
        offset += height;
    }
    bands
}

/// Cut `image` into bands of `page_height` rows.
pub fn slice_bands(image: &RgbaImage, page_height: u32) -> Vec<RgbaImage> {
    plan_bands(image.height(), page_height)
        .into_iter()
        .map(|band| {
            imageops::crop_imm(image, 0, band.offset, image.width(), band.height).to_image()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn page_count_is_ceiling() {
        assert_eq!(plan_bands(0, 100).len(), 0);
        assert_eq!(plan_bands(1, 100).len(), 1);
        assert_eq!(plan_bands(100, 100).len(), 1);
        assert_eq!(plan_bands(101, 100).len(), 2);
        assert_eq!(plan_bands(2500, 1000).len(), 3);
    }

    #[test]
    fn bands_are_contiguous() {
        let bands = plan_bands(2500, 1000);
        assert_eq!(bands[0].offset, 0);
        for pair in bands.windows(2) {
            assert_eq!(pair[0].offset + pair[0].height, pair[1].offset);
        }
        let last = bands[bands.len() - 1];
        assert_eq!(last.offset + last.height, 2500);
        assert_eq!(last.height, 500);
    }

    #[test]
    fn letter_page_height() {
        // 8.5in at 2x of 96 px/in → 11in.
        assert_eq!(page_height_px(1632, 612.0, 792.0), 2112);
        assert_eq!(page_height_px(816, 612.0, 792.0), 1056);
    }

    #[test]
    fn slicing_reconstructs_every_row() {
        let mut img = RgbaImage::new(3, 25);
        for (_, y, px) in img.enumerate_pixels_mut() {
            *px = Rgba([y as u8, 0, 0, 255]);
        }
        let bands = slice_bands(&img, 10);
        assert_eq!(bands.len(), 3);
        let rows: Vec<u8> = bands
            .iter()
            .flat_map(|b| (0..b.height()).map(move |y| b.get_pixel(0, y).0[0]))
            .collect();
        assert_eq!(rows, (0..25).collect::<Vec<u8>>());
    }

    #[test]
    fn auto_resolves_by_fit() {
        assert_eq!(PaginationMode::Auto.resolve(900, 1000), PaginationMode::SinglePage);
        assert_eq!(PaginationMode::Auto.resolve(1001, 1000), PaginationMode::Banded);
        assert_eq!(PaginationMode::Banded.resolve(10, 1000), PaginationMode::Banded);
        assert_eq!(PaginationMode::parse("single"), Some(PaginationMode::SinglePage));
    }
}
