//! Notification text and icon payload for a bell event.
//!
//! Bell records carry raw bytes in the client's encoding; D-Bus strings
//! must be UTF-8, so text is converted lossily here and nowhere earlier.

use crate::bell::BellEvent;
use crate::icon::ImageProxy;
use crate::icon::proxy::ARGB_BYTES;

/// Summary used when a bell has neither a window title nor a name.
const FALLBACK_SUMMARY: &str = "Bell";

/// Pixel payload of the freedesktop `image-data` hint, signature
/// `(iiibiiay)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: i32,
    pub height: i32,
    pub rowstride: i32,
    pub has_alpha: bool,
    pub bits_per_sample: i32,
    pub channels: i32,
    /// RGBA bytes, row-major.
    pub data: Vec<u8>,
}

/// Summary line: window title, else bell name, else a fixed word.
pub fn summary(event: &BellEvent) -> String {
    event
        .title()
        .filter(|t| !t.is_empty())
        .or(Some(event.name()).filter(|n| !n.is_empty()))
        .map(|text| String::from_utf8_lossy(text).into_owned())
        .unwrap_or_else(|| FALLBACK_SUMMARY.to_string())
}

/// Body: bell name, originating host and volume, one per line.
pub fn body(event: &BellEvent) -> String {
    let mut lines = Vec::new();

    if !event.name().is_empty() {
        lines.push(format!("bell: {}", String::from_utf8_lossy(event.name())));
    }
    if let Some(host) = event.host().filter(|h| !h.is_empty()) {
        lines.push(format!("on {}", String::from_utf8_lossy(host)));
    }
    lines.push(format!("volume {}%", clamp_percent(event.percent())));

    lines.join("\n")
}

/// Bell volume clamped to the protocol range.
pub fn clamp_percent(percent: i32) -> i32 {
    percent.clamp(-100, 100)
}

/// Pull the proxy's pixels and repack them as `image-data`.
///
/// Returns `None` for images too large to describe with `i32` sizes.
pub fn image_data(proxy: &ImageProxy) -> Option<ImageData> {
    let width = i32::try_from(proxy.width()).ok()?;
    let height = i32::try_from(proxy.height()).ok()?;
    let rowstride = width.checked_mul(ARGB_BYTES as i32)?;

    Some(ImageData {
        width,
        height,
        rowstride,
        has_alpha: true,
        bits_per_sample: 8,
        channels: ARGB_BYTES as i32,
        data: argb_to_rgba(proxy.to_argb()),
    })
}

/// Reorder `(A, R, G, B)` pixels to `(R, G, B, A)` in place.
fn argb_to_rgba(mut pixels: Vec<u8>) -> Vec<u8> {
    for px in pixels.chunks_exact_mut(ARGB_BYTES) {
        px.rotate_left(1);
    }
    pixels
}
