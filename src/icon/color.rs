//! Color resolver: raw pixel value (+ optional mask bit) → ARGB.
//!
//! Monochrome and palette-indexed icon sources only carry "ink" or "no
//! ink" in practice; server colormap lookups for them return misleading
//! colors across window managers, so both use a fixed black/white rule.
//! Direct-color sources have their channels shifted out of the native
//! pixel encoding using the visual's channel masks.

use x11rb::protocol::xproto::{Visualtype, VisualClass};

/// Opaque alpha value.
const OPAQUE: u8 = 0xff;

/// Transparent alpha value.
const TRANSPARENT: u8 = 0x00;

/// Red/green/blue channel masks of a direct-color pixel encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMasks {
    pub red: u32,
    pub green: u32,
    pub blue: u32,
}

impl ChannelMasks {
    /// Masks for the common 24/32-bit `0x00RRGGBB` layout.
    pub const RGB888: Self = Self {
        red: 0x00ff_0000,
        green: 0x0000_ff00,
        blue: 0x0000_00ff,
    };

    /// Masks for 16-bit `RGB565`.
    pub const RGB565: Self = Self {
        red: 0xf800,
        green: 0x07e0,
        blue: 0x001f,
    };

    /// Masks for 15-bit `RGB555`.
    pub const RGB555: Self = Self {
        red: 0x7c00,
        green: 0x03e0,
        blue: 0x001f,
    };
}

/// How the pixel values of a raster snapshot are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    /// 1-bit source.
    Monochrome,
    /// Palette source (PseudoColor, StaticColor, gray scales).
    Indexed,
    /// TrueColor / DirectColor source.
    Direct(ChannelMasks),
}

impl ColorModel {
    /// Pick the color model for a raster of `depth` bits.
    ///
    /// `visual` is the visual the image was fetched with, if the server
    /// reported one (pixmaps have none). Without a visual, well-known
    /// direct-color depths get their conventional masks and everything
    /// else is treated as indexed.
    pub fn for_depth(depth: u8, visual: Option<&Visualtype>) -> Self {
        if depth == 1 {
            return ColorModel::Monochrome;
        }

        if let Some(visual) = visual {
            return match visual.class {
                VisualClass::TRUE_COLOR | VisualClass::DIRECT_COLOR => {
                    ColorModel::Direct(ChannelMasks {
                        red: visual.red_mask,
                        green: visual.green_mask,
                        blue: visual.blue_mask,
                    })
                }
                _ => ColorModel::Indexed,
            };
        }

        match depth {
            24 | 32 => ColorModel::Direct(ChannelMasks::RGB888),
            16 => ColorModel::Direct(ChannelMasks::RGB565),
            15 => ColorModel::Direct(ChannelMasks::RGB555),
            _ => ColorModel::Indexed,
        }
    }
}

/// Resolve one pixel into `[A, R, G, B]`.
///
/// `mask` is the pixel's value in the mask raster: `Some(0)` is
/// transparent, any other `Some` is opaque, and `None` (no mask at all)
/// is opaque.
pub fn resolve(pixel: u32, model: ColorModel, mask: Option<u32>) -> [u8; 4] {
    let alpha = match mask {
        Some(0) => TRANSPARENT,
        _ => OPAQUE,
    };

    let [r, g, b] = match model {
        // Ink rule: nothing set is paper (white), anything set is ink.
        ColorModel::Monochrome | ColorModel::Indexed => {
            if pixel == 0 {
                [0xff, 0xff, 0xff]
            } else {
                [0x00, 0x00, 0x00]
            }
        }
        ColorModel::Direct(masks) => [
            channel(pixel, masks.red),
            channel(pixel, masks.green),
            channel(pixel, masks.blue),
        ],
    };

    [alpha, r, g, b]
}

/// Extract one channel and scale it to 8 bits.
fn channel(pixel: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }

    let shift = mask.trailing_zeros();
    let bits = (mask >> shift).count_ones();
    let value = (pixel & mask) >> shift;

    if bits >= 8 {
        (value >> (bits - 8)) as u8
    } else {
        let max = (1u32 << bits) - 1;
        ((value * 255 + max / 2) / max) as u8
    }
}
