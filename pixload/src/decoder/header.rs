//! Header inspection and pixel-format normalization plan

use png::{BitDepth, ColorType, Transformations};

/// The part of a PNG header the normalization plan depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Header {
    pub width: u32,
    pub height: u32,
    pub bit_depth: BitDepth,
    pub color_type: ColorType,
    pub has_trns: bool,
    pub interlaced: bool,
}

impl Header {
    pub fn from_info(info: &png::Info) -> Self {
        Self {
            width: info.width,
            height: info.height,
            bit_depth: info.bit_depth,
            color_type: info.color_type,
            has_trns: info.trns.is_some(),
            interlaced: info.interlaced,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Normalization steps needed to turn any PNG into `[a, r, g, b]` bytes, in
/// the order they apply.
///
/// Each flag depends only on the header, never on another flag. The first
/// five are carried out by the decoder, the last three while a scanline is
/// copied into its destination row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct Transforms {
    pub palette_to_rgb: bool,
    pub gray_to_8: bool,
    pub trns_to_alpha: bool,
    pub strip_16: bool,
    pub unpack: bool,
    pub filler_before: bool,
    pub gray_to_rgb: bool,
    pub swap_alpha: bool,
}

impl Transforms {
    /// Requested from the decoder up front, before the header is known. Each
    /// one is a no-op for images that don't need it, so the decoder ends up
    /// applying exactly the first five steps of the plan.
    pub const DECODER: Transformations = Transformations::EXPAND.union(Transformations::STRIP_16);

    pub fn for_header(header: &Header) -> Self {
        let color = header.color_type;
        let depth = header.bit_depth as u8;
        let has_alpha =
            header.has_trns || matches!(color, ColorType::GrayscaleAlpha | ColorType::Rgba);

        Self {
            palette_to_rgb: color == ColorType::Indexed,
            gray_to_8: color == ColorType::Grayscale && depth < 8,
            trns_to_alpha: header.has_trns,
            strip_16: depth == 16,
            unpack: depth < 8,
            filler_before: !has_alpha,
            gray_to_rgb: matches!(color, ColorType::Grayscale | ColorType::GrayscaleAlpha),
            swap_alpha: has_alpha,
        }
    }

    /// Color type and depth the decoder hands back once its share of the
    /// plan is applied
    pub fn decoded_format(&self, header: &Header) -> (ColorType, BitDepth) {
        let color = match header.color_type {
            ColorType::Indexed if self.palette_to_rgb => ColorType::Rgb,
            other => other,
        };
        let color = match color {
            ColorType::Grayscale if self.trns_to_alpha => ColorType::GrayscaleAlpha,
            ColorType::Rgb if self.trns_to_alpha => ColorType::Rgba,
            other => other,
        };

        let depth = if self.strip_16 || self.unpack || self.gray_to_8 || self.palette_to_rgb {
            BitDepth::Eight
        } else {
            header.bit_depth
        };

        (color, depth)
    }

    /// Samples per pixel in a decoded scanline
    pub fn decoded_channels(&self) -> usize {
        let color = if self.gray_to_rgb { 1 } else { 3 };
        color + usize::from(self.swap_alpha)
    }
}
