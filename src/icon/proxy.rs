//! Image proxy: uniform, on-demand ARGB pixel source.
//!
//! Whatever convention an icon came from, consumers see a fixed-size
//! image and one operation: fill a caller-owned buffer with `(A, R, G, B)`
//! bytes for a sub-rectangle, row-major. No conversion happens until a
//! fill is requested.

use std::fmt;

use super::color;
use super::raster::RasterSnapshot;

/// Bytes per output pixel.
pub const ARGB_BYTES: usize = 4;

/// Proxy contract violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProxyError {
    #[error("rectangle {rect} outside {width}x{height} image")]
    OutOfBounds { rect: Rect, width: u32, height: u32 },
    #[error("buffer holds {actual} bytes, {expected} required")]
    BufferSize { expected: usize, actual: usize },
}

/// A sub-rectangle of an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Number of bytes an ARGB fill of this rectangle produces.
    pub fn argb_len(&self) -> usize {
        self.width as usize * self.height as usize * ARGB_BYTES
    }

    /// Whether the rectangle lies within `[0, width) x [0, height)`.
    ///
    /// The origin must be a pixel of the image, even for an empty rect.
    fn fits(&self, width: u32, height: u32) -> bool {
        self.x < width
            && self.y < height
            && u64::from(self.x) + u64::from(self.width) <= u64::from(width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(height)
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// Icon pixels from any of the supported sources.
#[derive(Debug)]
pub enum ImageProxy {
    /// Server raster (icon window or icon pixmap) plus optional mask.
    RasterPair(RasterPairProxy),
    /// `_NET_WM_ICON` pixels, already ARGB.
    PackedArgb(PackedArgbProxy),
}

impl ImageProxy {
    pub fn width(&self) -> u32 {
        match self {
            ImageProxy::RasterPair(p) => p.width(),
            ImageProxy::PackedArgb(p) => p.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            ImageProxy::RasterPair(p) => p.height(),
            ImageProxy::PackedArgb(p) => p.height(),
        }
    }

    /// The whole image.
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width(), self.height())
    }

    /// Write ARGB bytes for `rect` into `buf`.
    ///
    /// `buf` must be exactly `rect.width * rect.height * 4` bytes and
    /// `rect` must lie inside the image; otherwise nothing is written.
    pub fn fill_argb(&self, rect: Rect, buf: &mut [u8]) -> Result<(), ProxyError> {
        if !rect.fits(self.width(), self.height()) {
            return Err(ProxyError::OutOfBounds {
                rect,
                width: self.width(),
                height: self.height(),
            });
        }
        if buf.len() != rect.argb_len() {
            return Err(ProxyError::BufferSize {
                expected: rect.argb_len(),
                actual: buf.len(),
            });
        }

        match self {
            ImageProxy::RasterPair(p) => p.fill(rect, buf),
            ImageProxy::PackedArgb(p) => p.fill(rect, buf),
        }
        Ok(())
    }

    /// ARGB bytes of the full image.
    pub fn to_argb(&self) -> Vec<u8> {
        let rect = self.bounds();
        let mut buf = vec![0u8; rect.argb_len()];
        // The full extent with a buffer sized from it cannot violate the contract.
        if let Err(e) = self.fill_argb(rect, &mut buf) {
            tracing::error!(error = %e, "full-extent fill rejected");
        }
        buf
    }
}

/// Raster-backed proxy: resolves each pixel through the color resolver
/// on every fill.
#[derive(Debug)]
pub struct RasterPairProxy {
    icon: RasterSnapshot,
    mask: Option<RasterSnapshot>,
}

impl RasterPairProxy {
    pub fn new(icon: RasterSnapshot, mask: Option<RasterSnapshot>) -> Self {
        Self { icon, mask }
    }

    pub fn width(&self) -> u32 {
        u32::from(self.icon.width())
    }

    pub fn height(&self) -> u32 {
        u32::from(self.icon.height())
    }

    fn fill(&self, rect: Rect, buf: &mut [u8]) {
        if rect.width == 0 {
            return;
        }
        let model = self.icon.model();
        let rows = buf.chunks_exact_mut(rect.width as usize * ARGB_BYTES);

        for (row, y) in rows.zip(rect.y..rect.y + rect.height) {
            for (out, x) in row
                .chunks_exact_mut(ARGB_BYTES)
                .zip(rect.x..rect.x + rect.width)
            {
                // In bounds of the icon, which is at most u16::MAX wide.
                let (x, y) = (x as u16, y as u16);
                let mask = self.mask.as_ref().map(|m| mask_value(m, x, y));
                out.copy_from_slice(&color::resolve(self.icon.pixel(x, y), model, mask));
            }
        }
    }
}

/// Mask bit at `(x, y)`; pixels beyond a smaller mask are transparent.
fn mask_value(mask: &RasterSnapshot, x: u16, y: u16) -> u32 {
    if x < mask.width() && y < mask.height() {
        mask.pixel(x, y)
    } else {
        0
    }
}

/// Proxy over an in-memory ARGB buffer; fills are row copies.
pub struct PackedArgbProxy {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PackedArgbProxy {
    /// Build from 32-bit `0xAARRGGBB` words, row-major.
    ///
    /// Returns `None` for a zero dimension or if `words` does not hold
    /// exactly `width * height` pixels.
    pub fn from_words(width: u32, height: u32, words: &[u32]) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let count = (width as usize).checked_mul(height as usize)?;
        if words.len() != count {
            return None;
        }
        let pixels = words.iter().flat_map(|w| w.to_be_bytes()).collect();
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn fill(&self, rect: Rect, buf: &mut [u8]) {
        let stride = self.width as usize * ARGB_BYTES;
        let row_len = rect.width as usize * ARGB_BYTES;
        if row_len == 0 {
            return;
        }

        for (i, out) in buf.chunks_exact_mut(row_len).enumerate() {
            let start = (rect.y as usize + i) * stride + rect.x as usize * ARGB_BYTES;
            out.copy_from_slice(&self.pixels[start..start + row_len]);
        }
    }
}

impl fmt::Debug for PackedArgbProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedArgbProxy")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
