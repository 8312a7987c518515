//! Display session: X11 connection, XKB negotiation, and the wait for
//! the next bell.
//!
//! Owns the connection for the lifetime of the daemon. Every bell event
//! record borrows the session (through [`WindowServer`]) only while it
//! is being populated.

pub mod server;

use std::os::fd::{AsRawFd, RawFd};

use tokio::io::Interest;
use tokio::io::unix::AsyncFd;
use x11rb::connection::{Connection, RequestConnection};
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::Event;
use x11rb::protocol::xkb::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{self, Window};
use x11rb::rust_connection::RustConnection;

use crate::bell::BellNotify;

pub use server::WindowServer;
use server::{Atoms, QueryError};

/// XKB protocol version this client speaks.
const XKB_MAJOR: u16 = 1;
const XKB_MINOR: u16 = 0;

/// Volume used for bells rung by `ring`.
const RING_PERCENT: i8 = 100;

/// Display session errors. All of these are fatal for the daemon.
#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("could not connect to display: {0}")]
    Connect(#[from] ConnectError),
    #[error("X11 server does not support XKB")]
    NonXkbServer,
    #[error("XKB {XKB_MAJOR}.{XKB_MINOR} refused, server has {server_major}.{server_minor}")]
    XkbVersion { server_major: u16, server_minor: u16 },
    #[error("could not select XKB bell events: {0}")]
    SelectEvents(#[source] ReplyError),
    #[error("X11 connection: {0}")]
    Connection(#[from] ConnectionError),
    #[error("X11 reply: {0}")]
    Reply(#[from] ReplyError),
    #[error("X11 query: {0}")]
    Query(#[from] QueryError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// `(clear, select_all)` event masks for `XkbSelectEvents`: nothing
/// cleared, bell notifications selected without details.
fn bell_selection() -> (xkb::EventType, xkb::EventType) {
    (xkb::EventType::from(0u16), xkb::EventType::BELL_NOTIFY)
}

/// Raw fd of the X11 socket, registered with the tokio reactor.
struct ConnectionFd(RawFd);

impl ConnectionFd {
    /// Register `fd` with the reactor for read readiness.
    fn watch(fd: RawFd) -> std::io::Result<AsyncFd<Self>> {
        AsyncFd::try_with_interest(Self(fd), Interest::READABLE).map_err(|e| e.into_parts().1)
    }
}

impl AsRawFd for ConnectionFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

/// Connected display with XKB bell events selected.
pub struct DisplaySession {
    // Deregistered from the reactor before the socket closes.
    readable: AsyncFd<ConnectionFd>,
    conn: RustConnection,
    screen_num: usize,
    root: Window,
    atoms: Atoms,
}

impl DisplaySession {
    /// Connect to `display` (or `$DISPLAY`), negotiate XKB and select
    /// bell notifications on the core keyboard.
    ///
    /// Must be called from within the tokio runtime.
    pub fn connect(display: Option<&str>) -> Result<Self, DisplayError> {
        let (conn, screen_num) = RustConnection::connect(display)?;
        let root = conn.setup().roots[screen_num].root;

        if conn.extension_information(xkb::X11_EXTENSION_NAME)?.is_none() {
            return Err(DisplayError::NonXkbServer);
        }

        let version = conn.xkb_use_extension(XKB_MAJOR, XKB_MINOR)?.reply()?;
        if !version.supported {
            return Err(DisplayError::XkbVersion {
                server_major: version.server_major,
                server_minor: version.server_minor,
            });
        }
        tracing::debug!(
            server_major = version.server_major,
            server_minor = version.server_minor,
            "XKB negotiated"
        );

        let (clear, select_all) = bell_selection();
        conn.xkb_select_events(
            xkb::ID::USE_CORE_KBD.into(),
            clear,
            select_all,
            xkb::MapPart::from(0u16),
            xkb::MapPart::from(0u16),
            &xkb::SelectEventsAux::new(),
        )?
        .check()
        .map_err(DisplayError::SelectEvents)?;

        let atoms = server::intern_atoms(&conn)?;
        let readable = ConnectionFd::watch(conn.stream().as_raw_fd())?;

        Ok(Self {
            readable,
            conn,
            screen_num,
            root,
            atoms,
        })
    }

    pub fn screen_num(&self) -> usize {
        self.screen_num
    }

    /// Wait for the next XKB bell notification.
    ///
    /// Other events are discarded. This is the only point at which the
    /// daemon suspends.
    pub async fn next_bell(&self) -> Result<BellNotify, DisplayError> {
        loop {
            self.conn.flush()?;

            while let Some(event) = self.conn.poll_for_event()? {
                match event {
                    Event::XkbBellNotify(bell) => return Ok(BellNotify::from(&bell)),
                    Event::Error(e) => {
                        tracing::debug!(error = ?e.error_kind, request = ?e.request_name, "X11 error event");
                    }
                    other => tracing::trace!(event = ?other, "ignoring event"),
                }
            }

            let mut guard = self.readable.readable().await?;
            guard.clear_ready();
        }
    }

    /// Emit a named XKB bell event (no sound) on the core keyboard.
    pub fn ring(&self, name: &str) -> Result<(), DisplayError> {
        let atom = xproto::intern_atom(&self.conn, false, name.as_bytes())?
            .reply()?
            .atom;

        self.conn
            .xkb_bell(
                xkb::ID::USE_CORE_KBD.into(),
                xkb::ID::DFLT_XI_CLASS.into(),
                xkb::ID::DFLT_XI_ID.into(),
                RING_PERCENT,
                false,
                true,
                0,
                0,
                atom,
                x11rb::NONE,
            )?
            .check()?;

        tracing::info!(name, atom, "bell event sent");
        Ok(())
    }
}
