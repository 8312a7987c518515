//! `WM_HINTS` decoding: icon-related part of the ICCCM hint
//! structure.

use x11rb::protocol::xproto::{Pixmap, Window};

/// `IconPixmapHint` flag bit.
pub const ICON_PIXMAP_HINT: u32 = 1 << 2;
/// `IconWindowHint` flag bit.
pub const ICON_WINDOW_HINT: u32 = 1 << 3;
/// `IconMaskHint` flag bit.
pub const ICON_MASK_HINT: u32 = 1 << 5;

/// Fields of `WM_HINTS` this crate reads.
///
/// A handle is only `Some` when its flag is set and the handle is not
/// `None` (zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WmHints {
    pub icon_pixmap: Option<Pixmap>,
    pub icon_window: Option<Window>,
    pub icon_mask: Option<Pixmap>,
}

impl WmHints {
    /// Decode the 32-bit words of a `WM_HINTS` property.
    ///
    /// Pre-ICCCM clients write 8 words (no window group); anything
    /// shorter is rejected.
    pub fn parse(values: &[u32]) -> Option<Self> {
        if values.len() < 8 {
            return None;
        }
        let flags = values[0];
        let flagged = |bit: u32, handle: u32| (flags & bit != 0 && handle != 0).then_some(handle);

        Some(Self {
            icon_pixmap: flagged(ICON_PIXMAP_HINT, values[3]),
            icon_window: flagged(ICON_WINDOW_HINT, values[4]),
            icon_mask: flagged(ICON_MASK_HINT, values[7]),
        })
    }
}
