//! Window server seam: property, atom and raster queries the icon
//! selector and attribute extractor issue.
//!
//! The live implementation is [`DisplaySession`](super::DisplaySession);
//! tests substitute in-memory fakes.

use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::protocol::xproto::{self, Atom, Drawable, Window};

use crate::icon::raster::{self, RasterError, RasterSnapshot};

use super::DisplaySession;

/// Property and atom query errors.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("X11 connection: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X11 reply: {0}")]
    Reply(#[from] ReplyError),
}

/// Atoms that are not predefined by the core protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Atoms {
    pub net_wm_icon: Atom,
    pub net_wm_name: Atom,
    pub utf8_string: Atom,
}

/// A fetched window property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub type_: Atom,
    pub format: u8,
    /// Raw value bytes; 32-bit items are in native byte order.
    pub value: Vec<u8>,
}

impl Property {
    /// The value as 32-bit items, or `None` if the format is not 32.
    pub fn value32(&self) -> Option<Vec<u32>> {
        if self.format != 32 {
            return None;
        }
        Some(
            self.value
                .chunks_exact(4)
                .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    /// The value as bytes, or `None` if the format is not 8.
    ///
    /// A single trailing NUL, which some clients include, is dropped.
    pub fn value8(&self) -> Option<&[u8]> {
        if self.format != 8 {
            return None;
        }
        Some(self.value.strip_suffix(&[0]).unwrap_or(&self.value[..]))
    }
}

/// Queries against the display server, issued synchronously.
pub trait WindowServer {
    /// Atoms interned at connection time.
    fn atoms(&self) -> &Atoms;

    /// Root window of the default screen.
    fn root(&self) -> Window;

    /// Read `property` of `window`, accepting any type when `type_` is
    /// `AnyPropertyType`. `Ok(None)` when the property does not exist or
    /// has a different type.
    fn property(&self, window: Window, property: Atom, type_: Atom)
    -> Result<Option<Property>, QueryError>;

    /// Name of `atom`, `Ok(None)` for the `None` atom.
    fn atom_name(&self, atom: Atom) -> Result<Option<Vec<u8>>, QueryError>;

    /// Client-side snapshot of `drawable`'s pixels.
    fn fetch_raster(&self, drawable: Drawable) -> Result<RasterSnapshot, RasterError>;
}

impl WindowServer for DisplaySession {
    fn atoms(&self) -> &Atoms {
        &self.atoms
    }

    fn root(&self) -> Window {
        self.root
    }

    fn property(
        &self,
        window: Window,
        property: Atom,
        type_: Atom,
    ) -> Result<Option<Property>, QueryError> {
        let reply = xproto::get_property(&self.conn, false, window, property, type_, 0, u32::MAX)?
            .reply()?;

        // A type mismatch returns the actual type with an empty value.
        if reply.type_ == x11rb::NONE
            || (type_ != u32::from(xproto::AtomEnum::ANY) && reply.type_ != type_)
        {
            return Ok(None);
        }

        Ok(Some(Property {
            type_: reply.type_,
            format: reply.format,
            value: reply.value,
        }))
    }

    fn atom_name(&self, atom: Atom) -> Result<Option<Vec<u8>>, QueryError> {
        if atom == x11rb::NONE {
            return Ok(None);
        }
        let reply = xproto::get_atom_name(&self.conn, atom)?.reply()?;
        Ok(Some(reply.name))
    }

    fn fetch_raster(&self, drawable: Drawable) -> Result<RasterSnapshot, RasterError> {
        raster::fetch_raster(&self.conn, drawable)
    }
}

/// Intern the non-predefined atoms in one round trip.
pub(super) fn intern_atoms(conn: &impl Connection) -> Result<Atoms, QueryError> {
    let net_wm_icon = xproto::intern_atom(conn, false, b"_NET_WM_ICON")?;
    let net_wm_name = xproto::intern_atom(conn, false, b"_NET_WM_NAME")?;
    let utf8_string = xproto::intern_atom(conn, false, b"UTF8_STRING")?;

    Ok(Atoms {
        net_wm_icon: net_wm_icon.reply()?.atom,
        net_wm_name: net_wm_name.reply()?.atom,
        utf8_string: utf8_string.reply()?.atom,
    })
}
