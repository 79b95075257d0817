//! # Barcode Rendering
//!
//! Draws an [`EncodedSymbol`] as SVG, as a grayscale raster, or as PNG bytes.
//!
//! ## Canvas Geometry
//! ```text
//!  ◄─ quiet ─►◄──────── modules × module_width ────────►◄─ quiet ─►
//! ┌──────────────────────────────────────────────────────────────────┐  ▲
//! │                                                                  │  top_margin
//! │           █ ██ █  ██ ███ █ █  ██ █ ███  █ █ ██ ███ █             │  ▲
//! │           █ ██ █  ██ ███ █ █  ██ █ ███  █ █ ██ ███ █             │  bar_height
//! │           █ ██ █  ██ ███ █ █  ██ █ ███  █ █ ██ ███ █             │  ▼
//! │                          1 2 3 4 5 6                             │  text_height
//! └──────────────────────────────────────────────────────────────────┘  ▼
//! ```
//!
//! A dark module paints a `module_width` wide bar over the full bar height; a
//! light module only advances x. Canvases beyond [`MAX_CANVAS_SIDE`] pixels
//! are refused rather than partially drawn.

use base64::{engine::general_purpose, Engine as _};
use image::{GrayImage, ImageFormat, Luma};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::Cursor;
use tracing::debug;

use super::font;
use super::{BarcodeError, BarcodeResult, EncodedSymbol};

/// Largest width or height we will allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

const INK: Luma<u8> = Luma([0]);
const PAPER: Luma<u8> = Luma([255]);

// =============================================================================
// Layout
// =============================================================================

/// Pixel geometry of a rendered barcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelLayout {
    /// Width of one module in pixels.
    pub module_width: u32,
    pub bar_height: u32,
    /// Blank margin left and right of the bars.
    pub quiet_zone: u32,
    /// Blank band above the bars.
    pub top_margin: u32,
    /// Band below the bars holding the human-readable text.
    pub text_height: u32,
    /// Pixel size of one font dot.
    pub font_scale: u32,
    pub show_text: bool,
}

impl Default for LabelLayout {
    fn default() -> Self {
        LabelLayout {
            module_width: 3,
            bar_height: 100,
            quiet_zone: 50,
            top_margin: 25,
            text_height: 45,
            font_scale: 2,
            show_text: true,
        }
    }
}

impl LabelLayout {
    /// Every dimension multiplied by `factor` (print-resolution export).
    pub fn scaled(&self, factor: u32) -> Self {
        LabelLayout {
            module_width: self.module_width.saturating_mul(factor),
            bar_height: self.bar_height.saturating_mul(factor),
            quiet_zone: self.quiet_zone.saturating_mul(factor),
            top_margin: self.top_margin.saturating_mul(factor),
            text_height: self.text_height.saturating_mul(factor),
            font_scale: self.font_scale.saturating_mul(factor),
            show_text: self.show_text,
        }
    }

    pub fn with_module_width(mut self, module_width: u32) -> Self {
        self.module_width = module_width;
        self
    }

    pub fn with_bar_height(mut self, bar_height: u32) -> Self {
        self.bar_height = bar_height;
        self
    }

    pub fn with_text(mut self, show_text: bool) -> Self {
        self.show_text = show_text;
        self
    }

    fn text_band(&self) -> u32 {
        if self.show_text {
            self.text_height
        } else {
            0
        }
    }

    /// `(width, height)` of the canvas for `symbol`.
    pub fn canvas_size(&self, symbol: &EncodedSymbol) -> BarcodeResult<(u32, u32)> {
        if symbol.is_empty() {
            return Err(BarcodeError::RenderingUnavailable("symbol has no modules".to_string()));
        }
        if self.module_width == 0 || self.bar_height == 0 {
            return Err(BarcodeError::RenderingUnavailable(
                "module width and bar height must be non-zero".to_string(),
            ));
        }

        let too_large = || {
            BarcodeError::RenderingUnavailable(format!(
                "canvas exceeds {} pixels per side",
                MAX_CANVAS_SIDE
            ))
        };

        let width = u32::try_from(symbol.len())
            .ok()
            .and_then(|n| n.checked_mul(self.module_width))
            .and_then(|w| w.checked_add(self.quiet_zone.checked_mul(2)?))
            .ok_or_else(too_large)?;
        let height = self
            .top_margin
            .checked_add(self.bar_height)
            .and_then(|h| h.checked_add(self.text_band()))
            .ok_or_else(too_large)?;

        if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(too_large());
        }
        Ok((width, height))
    }

    /// Top edge of the text glyphs.
    fn text_top(&self) -> u32 {
        let glyph_h = font::GLYPH_HEIGHT * self.font_scale;
        self.top_margin + self.bar_height + self.text_height.saturating_sub(glyph_h) / 2
    }
}

// =============================================================================
// SVG
// =============================================================================

/// Renders `symbol` as a standalone SVG document.
pub fn render_svg(symbol: &EncodedSymbol, layout: &LabelLayout) -> BarcodeResult<String> {
    let (width, height) = layout.canvas_size(symbol)?;
    let mut svg = String::with_capacity(256 + symbol.len() * 16);

    // Writing into a String cannot fail.
    let _ = write!(
        svg,
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"##,
        w = width,
        h = height
    );
    let _ = write!(svg, r##"<rect width="{}" height="{}" fill="#ffffff"/>"##, width, height);

    for (start, run) in symbol.bars() {
        let _ = write!(
            svg,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#000000"/>"##,
            layout.quiet_zone + start as u32 * layout.module_width,
            layout.top_margin,
            run as u32 * layout.module_width,
            layout.bar_height
        );
    }

    if layout.show_text && !symbol.text.is_empty() {
        let baseline = layout.text_top() + font::GLYPH_HEIGHT * layout.font_scale;
        let _ = write!(
            svg,
            r##"<text x="{}" y="{}" text-anchor="middle" font-family="monospace" font-size="{}" fill="#000000">{}</text>"##,
            width / 2,
            baseline,
            layout.font_scale * 9,
            escape_xml(&symbol.text)
        );
    }

    svg.push_str("</svg>");
    Ok(svg)
}

// =============================================================================
// Raster
// =============================================================================

/// Draws `symbol` onto a white grayscale canvas.
pub fn rasterize(symbol: &EncodedSymbol, layout: &LabelLayout) -> BarcodeResult<GrayImage> {
    let (width, height) = layout.canvas_size(symbol)?;
    let mut img = GrayImage::from_pixel(width, height, PAPER);

    for (start, run) in symbol.bars() {
        let x0 = layout.quiet_zone + start as u32 * layout.module_width;
        let x1 = x0 + run as u32 * layout.module_width;
        for x in x0..x1 {
            for y in layout.top_margin..layout.top_margin + layout.bar_height {
                img.put_pixel(x, y, INK);
            }
        }
    }

    if layout.show_text && layout.font_scale > 0 {
        draw_text(&mut img, &symbol.text, layout);
    }

    Ok(img)
}

/// Centers `text` horizontally in the text band, clipping at the edges.
fn draw_text(img: &mut GrayImage, text: &str, layout: &LabelLayout) {
    let scale = layout.font_scale;
    let (width, height) = img.dimensions();
    let origin_x = (width as i64 - font::text_width(text, scale) as i64) / 2;
    let origin_y = layout.text_top() as i64;

    for (i, ch) in text.chars().enumerate() {
        let glyph_x = origin_x + (i as u32 * font::ADVANCE * scale) as i64;
        for col in 0..font::GLYPH_WIDTH {
            for row in 0..font::GLYPH_HEIGHT {
                if !font::pixel(ch, col, row) {
                    continue;
                }
                for dx in 0..scale {
                    for dy in 0..scale {
                        let x = glyph_x + (col * scale + dx) as i64;
                        let y = origin_y + (row * scale + dy) as i64;
                        if (0..width as i64).contains(&x) && (0..height as i64).contains(&y) {
                            img.put_pixel(x as u32, y as u32, INK);
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// PNG
// =============================================================================

/// Renders `symbol` to PNG bytes.
pub fn render_png(symbol: &EncodedSymbol, layout: &LabelLayout) -> BarcodeResult<Vec<u8>> {
    let img = rasterize(symbol, layout)?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| BarcodeError::RenderingUnavailable(e.to_string()))?;

    debug!(
        symbology = %symbol.symbology,
        width = img.width(),
        height = img.height(),
        bytes = bytes.len(),
        "Rendered barcode PNG"
    );
    Ok(bytes)
}

/// `data:image/png;base64,...` for embedding in HTML.
pub fn png_data_url(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", general_purpose::STANDARD.encode(png))
}

pub(crate) fn escape_xml(text: &str) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::barcode::{encode, Symbology};

    #[test]
    fn test_canvas_size_formula() {
        let symbol = encode("1234", Symbology::Code128).unwrap();
        let layout = LabelLayout::default();
        assert_eq!(layout.canvas_size(&symbol).unwrap(), (57 * 3 + 100, 170));

        let no_text = layout.with_text(false);
        assert_eq!(no_text.canvas_size(&symbol).unwrap(), (271, 125));
    }

    #[test]
    fn test_scaled_layout() {
        let layout = LabelLayout::default().scaled(3);
        assert_eq!(layout.module_width, 9);
        assert_eq!(layout.quiet_zone, 150);
        assert_eq!(layout.font_scale, 6);
    }

    #[test]
    fn test_oversized_canvas_is_refused() {
        let symbol = encode("SHAM-200", Symbology::Code128).unwrap();
        let layout = LabelLayout::default().with_module_width(1000);
        assert!(matches!(
            rasterize(&symbol, &layout),
            Err(BarcodeError::RenderingUnavailable(_))
        ));
        let layout = LabelLayout::default().with_bar_height(0);
        assert!(render_png(&symbol, &layout).is_err());
    }

    #[test]
    fn test_raster_follows_modules() {
        let symbol = encode("1234567890128", Symbology::Ean13).unwrap();
        let layout = LabelLayout::default();
        let img = rasterize(&symbol, &layout).unwrap();

        let y = layout.top_margin + layout.bar_height / 2;
        for (i, dark) in symbol.modules.iter().enumerate() {
            let x0 = layout.quiet_zone + i as u32 * layout.module_width;
            for x in x0..x0 + layout.module_width {
                let expected = if *dark { 0 } else { 255 };
                assert_eq!(img.get_pixel(x, y)[0], expected, "module {i}");
            }
        }
        // quiet zone and top margin stay white
        assert_eq!(img.get_pixel(0, y)[0], 255);
        assert_eq!(img.get_pixel(layout.quiet_zone, 0)[0], 255);
    }

    #[test]
    fn test_text_is_drawn_below_bars() {
        let symbol = encode("1234", Symbology::Code128).unwrap();
        let layout = LabelLayout::default();
        let img = rasterize(&symbol, &layout).unwrap();
        let band = layout.top_margin + layout.bar_height..img.height();
        let inked = img
            .enumerate_pixels()
            .filter(|(_, y, p)| band.contains(y) && p[0] == 0)
            .count();
        assert!(inked > 0);

        let hidden = rasterize(&symbol, &layout.with_text(false)).unwrap();
        assert_eq!(hidden.height(), layout.top_margin + layout.bar_height);
    }

    #[test]
    fn test_png_round_trip_dimensions() {
        let symbol = encode("SHAM-200", Symbology::Code128).unwrap();
        let layout = LabelLayout::default();
        let png = render_png(&symbol, &layout).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

        let decoded = image::load_from_memory(&png).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), layout.canvas_size(&symbol).unwrap());
        assert_eq!(decoded.get_pixel(layout.quiet_zone, layout.top_margin)[0], 0);
    }

    #[test]
    fn test_svg_contains_one_rect_per_bar() {
        let symbol = encode("1234", Symbology::Code128).unwrap();
        let svg = render_svg(&symbol, &LabelLayout::default()).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("fill=\"#000000\"/>").count(), symbol.bars().len());
        assert!(svg.contains(">1234</text>"));
    }

    #[test]
    fn test_svg_escapes_text() {
        let symbol = encode("A<B&C", Symbology::Code128).unwrap();
        let svg = render_svg(&symbol, &LabelLayout::default()).unwrap();
        assert!(svg.contains("A&lt;B&amp;C"));
    }

    #[test]
    fn test_data_url_prefix() {
        assert_eq!(png_data_url(&[1, 2, 3]), "data:image/png;base64,AQID");
    }
}
