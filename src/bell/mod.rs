//! Bell event records.
//!
//! One [`BellEvent`] is built per XKB bell notification, populated
//! synchronously from the window the bell was rung for, handed to the
//! notifier, then dropped, which releases any icon pixels it holds.

pub mod attributes;

use x11rb::protocol::xkb::BellNotifyEvent;
use x11rb::protocol::xproto::{Atom, Window};

use crate::display::WindowServer;
use crate::icon::ImageProxy;

pub use attributes::WindowAttributes;

/// Raw fields of an XKB `BellNotify` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BellNotify {
    pub name: Atom,
    /// Window the bell was rung for, `0` if none.
    pub window: Window,
    pub pitch: i32,
    pub percent: i32,
    pub duration: i32,
    pub bell_class: i32,
    pub bell_id: i32,
    pub event_only: bool,
}

impl From<&BellNotifyEvent> for BellNotify {
    fn from(ev: &BellNotifyEvent) -> Self {
        Self {
            name: ev.name,
            window: ev.window,
            pitch: i32::from(ev.pitch),
            // Requested as INT8, echoed back as CARD8.
            percent: i32::from(ev.percent as i8),
            duration: i32::from(ev.duration),
            bell_class: i32::from(u8::from(ev.bell_class)),
            bell_id: i32::from(ev.bell_id),
            event_only: ev.event_only,
        }
    }
}

/// Everything known about one bell occurrence.
///
/// Immutable once built. Owns its icon; nothing here outlives one
/// iteration of the listen loop.
#[derive(Debug)]
pub struct BellEvent {
    name: Vec<u8>,
    window: Window,
    title: Option<Vec<u8>>,
    host: Option<Vec<u8>>,
    pitch: i32,
    percent: i32,
    duration: i32,
    bell_class: i32,
    bell_id: i32,
    event_only: bool,
    icon: Option<ImageProxy>,
}

impl BellEvent {
    /// Build the record for `notify`, inspecting its window or, when the
    /// bell names none, the root window of the default screen.
    pub fn capture<S: WindowServer + ?Sized>(server: &S, notify: &BellNotify, icon_size: u32) -> Self {
        let name = match server.atom_name(notify.name) {
            Ok(name) => name.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(atom = notify.name, error = %e, "could not resolve bell name");
                Vec::new()
            }
        };

        let window = if notify.window == x11rb::NONE {
            server.root()
        } else {
            notify.window
        };

        let WindowAttributes { title, host, icon } = attributes::extract(server, window, icon_size);

        Self {
            name,
            window,
            title,
            host,
            pitch: notify.pitch,
            percent: notify.percent,
            duration: notify.duration,
            bell_class: notify.bell_class,
            bell_id: notify.bell_id,
            event_only: notify.event_only,
            icon,
        }
    }

    /// Bell name (atom name, ISO Latin-1), empty for unnamed bells.
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Window whose attributes were read.
    pub fn window(&self) -> Window {
        self.window
    }

    pub fn title(&self) -> Option<&[u8]> {
        self.title.as_deref()
    }

    pub fn host(&self) -> Option<&[u8]> {
        self.host.as_deref()
    }

    pub fn pitch(&self) -> i32 {
        self.pitch
    }

    /// Volume as sent; nominally -100..=100 but not validated.
    pub fn percent(&self) -> i32 {
        self.percent
    }

    pub fn duration(&self) -> i32 {
        self.duration
    }

    pub fn bell_class(&self) -> i32 {
        self.bell_class
    }

    pub fn bell_id(&self) -> i32 {
        self.bell_id
    }

    pub fn event_only(&self) -> bool {
        self.event_only
    }

    pub fn icon(&self) -> Option<&ImageProxy> {
        self.icon.as_ref()
    }
}
