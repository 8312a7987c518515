//! Icon extraction and pixel normalization.
//!
//! X clients publish icons through three conventions: a packed ARGB
//! property (`_NET_WM_ICON`), an icon window, or an icon pixmap with an
//! optional mask (both from `WM_HINTS`). [`select::select_icon`] finds
//! the one that applies and wraps it in an [`ImageProxy`], which hands
//! out ARGB bytes on demand whatever the source encoding.

pub mod color;
pub mod hints;
pub mod packed;
pub mod proxy;
pub mod raster;
pub mod select;

pub use proxy::ImageProxy;
