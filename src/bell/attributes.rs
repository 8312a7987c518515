//! Window attribute extractor: title, owning host and icon of the
//! window a bell was rung for.
//!
//! Title and host are best-effort: a failed or missing lookup is logged
//! and leaves the field empty, never aborting the rest.

use x11rb::protocol::xproto::{Atom, AtomEnum, Window};

use crate::display::WindowServer;
use crate::icon::{self, ImageProxy};

/// Metadata gathered from one window.
#[derive(Debug)]
pub struct WindowAttributes {
    /// `WM_NAME` (or `_NET_WM_NAME`) bytes, in the client's encoding.
    pub title: Option<Vec<u8>>,
    /// `WM_CLIENT_MACHINE` bytes.
    pub host: Option<Vec<u8>>,
    pub icon: Option<ImageProxy>,
}

/// Gather title, host and icon of `window`.
pub fn extract<S: WindowServer + ?Sized>(
    server: &S,
    window: Window,
    icon_size: u32,
) -> WindowAttributes {
    let atoms = *server.atoms();

    let title = text_property(server, window, AtomEnum::WM_NAME.into(), AtomEnum::ANY.into())
        .or_else(|| text_property(server, window, atoms.net_wm_name, atoms.utf8_string));
    if title.is_none() {
        tracing::warn!(window = format_args!("0x{window:x}"), "could not retrieve window name");
    }

    let host = text_property(
        server,
        window,
        AtomEnum::WM_CLIENT_MACHINE.into(),
        AtomEnum::ANY.into(),
    );
    if host.is_none() {
        tracing::warn!(window = format_args!("0x{window:x}"), "could not get client machine");
    }

    let icon = icon::select::select_icon(server, window, icon_size);

    WindowAttributes { title, host, icon }
}

/// Fetch an 8-bit text property; empty values count as absent.
fn text_property<S: WindowServer + ?Sized>(
    server: &S,
    window: Window,
    property: Atom,
    type_: Atom,
) -> Option<Vec<u8>> {
    match server.property(window, property, type_) {
        Ok(Some(prop)) => prop
            .value8()
            .filter(|text| !text.is_empty())
            .map(<[u8]>::to_vec),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(
                window = format_args!("0x{window:x}"),
                property,
                error = %e,
                "text property query failed"
            );
            None
        }
    }
}
