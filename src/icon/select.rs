//! Icon source selector.
//!
//! Strategies are tried in a fixed priority order and the first one that
//! yields pixels wins:
//!
//! 1. `_NET_WM_ICON` packed ARGB property (no raster fetch needed)
//! 2. `WM_HINTS` icon window
//! 3. `WM_HINTS` icon pixmap, with its mask if one is flagged
//!
//! A strategy that is absent, malformed or whose fetch fails falls
//! through to the next. If none succeeds the window has no icon.

use std::fmt;

use x11rb::protocol::xproto::{AtomEnum, Window};

use super::hints::WmHints;
use super::packed;
use super::proxy::{ImageProxy, PackedArgbProxy, RasterPairProxy};
use crate::display::WindowServer;

/// Where an icon came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconSource {
    PackedProperty,
    IconWindow,
    IconPixmap,
}

impl fmt::Display for IconSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IconSource::PackedProperty => "_NET_WM_ICON",
            IconSource::IconWindow => "icon window",
            IconSource::IconPixmap => "icon pixmap",
        })
    }
}

/// Find the icon of `window`.
///
/// `preferred_size` picks among multiple `_NET_WM_ICON` entries.
pub fn select_icon<S: WindowServer + ?Sized>(
    server: &S,
    window: Window,
    preferred_size: u32,
) -> Option<ImageProxy> {
    let selected = packed_icon(server, window, preferred_size)
        .map(|proxy| (IconSource::PackedProperty, proxy))
        .or_else(|| {
            let hints = wm_hints(server, window)?;
            icon_window(server, &hints)
                .map(|proxy| (IconSource::IconWindow, proxy))
                .or_else(|| icon_pixmap(server, &hints).map(|proxy| (IconSource::IconPixmap, proxy)))
        });

    match selected {
        Some((source, proxy)) => {
            tracing::debug!(
                window = format_args!("0x{window:x}"),
                %source,
                width = proxy.width(),
                height = proxy.height(),
                "icon selected"
            );
            Some(proxy)
        }
        None => {
            tracing::debug!(window = format_args!("0x{window:x}"), "window has no icon");
            None
        }
    }
}

/// Strategy 1: `_NET_WM_ICON`.
fn packed_icon<S: WindowServer + ?Sized>(
    server: &S,
    window: Window,
    preferred_size: u32,
) -> Option<ImageProxy> {
    let property = match server.property(
        window,
        server.atoms().net_wm_icon,
        AtomEnum::CARDINAL.into(),
    ) {
        Ok(Some(property)) => property,
        Ok(None) => return None,
        Err(e) => {
            tracing::debug!(error = %e, "_NET_WM_ICON query failed");
            return None;
        }
    };

    let Some(values) = property.value32() else {
        tracing::warn!(format = property.format, "_NET_WM_ICON is not 32-bit, ignoring");
        return None;
    };

    let entries = match packed::parse_entries(&values) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                window = format_args!("0x{window:x}"),
                error = %e,
                "malformed _NET_WM_ICON, ignoring"
            );
            return None;
        }
    };

    let entry = packed::closest_to_size(&entries, preferred_size)?;
    PackedArgbProxy::from_words(entry.width, entry.height, entry.pixels(&values))
        .map(ImageProxy::PackedArgb)
}

/// Read `WM_HINTS`, once per selection.
fn wm_hints<S: WindowServer + ?Sized>(server: &S, window: Window) -> Option<WmHints> {
    let hints_atom = AtomEnum::WM_HINTS.into();
    match server.property(window, hints_atom, hints_atom) {
        Ok(Some(property)) => property.value32().as_deref().and_then(WmHints::parse),
        Ok(None) => None,
        Err(e) => {
            tracing::debug!(error = %e, "WM_HINTS query failed");
            None
        }
    }
}

/// Strategy 2: icon window, never masked.
fn icon_window<S: WindowServer + ?Sized>(server: &S, hints: &WmHints) -> Option<ImageProxy> {
    let icon_window = hints.icon_window?;
    match server.fetch_raster(icon_window) {
        Ok(raster) => Some(ImageProxy::RasterPair(RasterPairProxy::new(raster, None))),
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch icon window");
            None
        }
    }
}

/// Strategy 3: icon pixmap, plus mask when flagged.
///
/// A mask that cannot be fetched degrades to an unmasked icon.
fn icon_pixmap<S: WindowServer + ?Sized>(server: &S, hints: &WmHints) -> Option<ImageProxy> {
    let pixmap = hints.icon_pixmap?;
    let raster = match server.fetch_raster(pixmap) {
        Ok(raster) => raster,
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch icon pixmap");
            return None;
        }
    };

    let mask = hints.icon_mask.and_then(|mask| match server.fetch_raster(mask) {
        Ok(mask) => Some(mask),
        Err(e) => {
            tracing::warn!(error = %e, "failed to fetch icon mask, using none");
            None
        }
    });

    Some(ImageProxy::RasterPair(RasterPairProxy::new(raster, mask)))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use x11rb::protocol::xproto::{Atom, Drawable};

    use super::*;
    use crate::display::server::{Atoms, Property, QueryError};
    use crate::icon::hints::{ICON_MASK_HINT, ICON_PIXMAP_HINT, ICON_WINDOW_HINT};
    use crate::icon::proxy::tests::{mono_raster, rgb_raster};
    use crate::icon::raster::{RasterError, RasterSnapshot};

    pub(crate) const NET_WM_ICON: Atom = 300;
    pub(crate) const NET_WM_NAME: Atom = 301;
    pub(crate) const UTF8_STRING: Atom = 302;
    pub(crate) const ROOT: Window = 0x2a;

    type RasterFactory = Box<dyn Fn() -> RasterSnapshot>;

    /// Server query issued against a [`FakeServer`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum Query {
        Property(Window, Atom),
        Raster(Drawable),
    }

    /// In-memory window server that records every query.
    pub(crate) struct FakeServer {
        atoms: Atoms,
        properties: HashMap<(Window, Atom), Property>,
        rasters: HashMap<Drawable, RasterFactory>,
        atom_names: HashMap<Atom, Vec<u8>>,
        pub(crate) fail_properties: bool,
        pub(crate) queries: RefCell<Vec<Query>>,
    }

    impl FakeServer {
        pub(crate) fn new() -> Self {
            Self {
                atoms: Atoms {
                    net_wm_icon: NET_WM_ICON,
                    net_wm_name: NET_WM_NAME,
                    utf8_string: UTF8_STRING,
                },
                properties: HashMap::new(),
                rasters: HashMap::new(),
                atom_names: HashMap::new(),
                fail_properties: false,
                queries: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn set_text(&mut self, window: Window, property: Atom, type_: Atom, text: &[u8]) {
            self.properties.insert(
                (window, property),
                Property {
                    type_,
                    format: 8,
                    value: text.to_vec(),
                },
            );
        }

        pub(crate) fn set_words(&mut self, window: Window, property: Atom, type_: Atom, words: &[u32]) {
            self.properties.insert(
                (window, property),
                Property {
                    type_,
                    format: 32,
                    value: words.iter().flat_map(|w| w.to_ne_bytes()).collect(),
                },
            );
        }

        pub(crate) fn set_hints(&mut self, window: Window, hints: [u32; 9]) {
            let atom = AtomEnum::WM_HINTS.into();
            self.set_words(window, atom, atom, &hints);
        }

        pub(crate) fn set_raster(&mut self, drawable: Drawable, raster: impl Fn() -> RasterSnapshot + 'static) {
            self.rasters.insert(drawable, Box::new(raster));
        }

        pub(crate) fn set_atom_name(&mut self, atom: Atom, name: &[u8]) {
            self.atom_names.insert(atom, name.to_vec());
        }

        pub(crate) fn raster_fetches(&self) -> Vec<Drawable> {
            self.queries
                .borrow()
                .iter()
                .filter_map(|q| match q {
                    Query::Raster(d) => Some(*d),
                    Query::Property(..) => None,
                })
                .collect()
        }

        pub(crate) fn property_queries(&self, atom: Atom) -> usize {
            self.queries
                .borrow()
                .iter()
                .filter(|q| matches!(q, Query::Property(_, a) if *a == atom))
                .count()
        }
    }

    impl WindowServer for FakeServer {
        fn atoms(&self) -> &Atoms {
            &self.atoms
        }

        fn root(&self) -> Window {
            ROOT
        }

        fn property(
            &self,
            window: Window,
            property: Atom,
            type_: Atom,
        ) -> Result<Option<Property>, QueryError> {
            self.queries.borrow_mut().push(Query::Property(window, property));
            if self.fail_properties {
                return Err(QueryError::Connection(
                    x11rb::errors::ConnectionError::UnknownError,
                ));
            }
            Ok(self
                .properties
                .get(&(window, property))
                .filter(|p| type_ == u32::from(AtomEnum::ANY) || p.type_ == type_)
                .cloned())
        }

        fn atom_name(&self, atom: Atom) -> Result<Option<Vec<u8>>, QueryError> {
            Ok(self.atom_names.get(&atom).cloned())
        }

        fn fetch_raster(&self, drawable: Drawable) -> Result<RasterSnapshot, RasterError> {
            self.queries.borrow_mut().push(Query::Raster(drawable));
            self.rasters
                .get(&drawable)
                .map(|make| make())
                .ok_or(RasterError::NotMapped(drawable))
        }
    }

    const WIN: Window = 0x100;
    const ICON_WIN: Window = 0x201;
    const PIXMAP: Drawable = 0x202;
    const MASK: Drawable = 0x203;

    fn cardinal() -> Atom {
        AtomEnum::CARDINAL.into()
    }

    fn hints(flags: u32) -> [u32; 9] {
        [flags, 0, 0, PIXMAP, ICON_WIN, 0, 0, MASK, 0]
    }

    #[test]
    fn packed_2x2_icon_unchanged() {
        let mut server = FakeServer::new();
        server.set_words(
            WIN,
            NET_WM_ICON,
            cardinal(),
            &[2, 2, 0xffff_0000, 0xff00_ff00, 0xff00_00ff, 0xffff_ffff],
        );

        let proxy = select_icon(&server, WIN, 64).expect("icon");
        assert_eq!((proxy.width(), proxy.height()), (2, 2));
        assert_eq!(
            proxy.to_argb(),
            vec![
                0xff, 0xff, 0x00, 0x00, //
                0xff, 0x00, 0xff, 0x00, //
                0xff, 0x00, 0x00, 0xff, //
                0xff, 0xff, 0xff, 0xff,
            ]
        );
    }

    #[test]
    fn packed_icon_short_circuits() {
        let mut server = FakeServer::new();
        server.set_words(WIN, NET_WM_ICON, cardinal(), &[1, 1, 0xff00_0000]);
        server.set_hints(WIN, hints(ICON_WINDOW_HINT | ICON_PIXMAP_HINT));
        server.set_raster(ICON_WIN, || mono_raster(4, 4, |_, _| true));
        server.set_raster(PIXMAP, || mono_raster(4, 4, |_, _| true));

        let proxy = select_icon(&server, WIN, 64).expect("icon");
        assert!(matches!(proxy, ImageProxy::PackedArgb(_)));
        assert_eq!(server.property_queries(AtomEnum::WM_HINTS.into()), 0);
        assert!(server.raster_fetches().is_empty());
    }

    #[test]
    fn picks_packed_entry_closest_to_preferred_size() {
        let mut server = FakeServer::new();
        let mut words = vec![1, 1, 0xff00_0000];
        words.extend([2, 2]);
        words.extend([0xff11_1111; 4]);
        server.set_words(WIN, NET_WM_ICON, cardinal(), &words);

        assert_eq!(select_icon(&server, WIN, 2).unwrap().width(), 2);
        assert_eq!(select_icon(&server, WIN, 1).unwrap().width(), 1);
    }

    #[test]
    fn mismatched_packed_icon_falls_back_to_hints() {
        let mut server = FakeServer::new();
        // Declares 2x2 but carries three pixels.
        server.set_words(WIN, NET_WM_ICON, cardinal(), &[2, 2, 1, 2, 3]);
        server.set_hints(WIN, hints(ICON_PIXMAP_HINT));
        server.set_raster(PIXMAP, || mono_raster(8, 8, |_, _| false));

        let proxy = select_icon(&server, WIN, 64).expect("icon");
        assert!(matches!(proxy, ImageProxy::RasterPair(_)));
        assert_eq!(server.raster_fetches(), vec![PIXMAP]);
    }

    #[test]
    fn wrong_format_packed_icon_ignored() {
        let mut server = FakeServer::new();
        server.set_text(WIN, NET_WM_ICON, cardinal(), &[2, 2, 0, 0]);
        assert!(select_icon(&server, WIN, 64).is_none());
    }

    #[test]
    fn icon_window_preferred_over_pixmap() {
        let mut server = FakeServer::new();
        server.set_hints(WIN, hints(ICON_WINDOW_HINT | ICON_PIXMAP_HINT | ICON_MASK_HINT));
        server.set_raster(ICON_WIN, || rgb_raster(3, 3, |_, _| 0x00ff_0000));
        server.set_raster(PIXMAP, || mono_raster(8, 8, |_, _| true));
        server.set_raster(MASK, || mono_raster(8, 8, |_, _| true));

        let proxy = select_icon(&server, WIN, 64).expect("icon");
        assert_eq!(proxy.width(), 3);
        assert!(proxy.to_argb().chunks_exact(4).all(|px| px == [0xff, 0xff, 0, 0]));
        assert_eq!(server.raster_fetches(), vec![ICON_WIN]);
        assert_eq!(server.property_queries(AtomEnum::WM_HINTS.into()), 1);
    }

    #[test]
    fn unfetchable_icon_window_falls_back_to_pixmap() {
        let mut server = FakeServer::new();
        server.set_hints(WIN, hints(ICON_WINDOW_HINT | ICON_PIXMAP_HINT));
        server.set_raster(PIXMAP, || mono_raster(8, 8, |_, _| true));

        let proxy = select_icon(&server, WIN, 64).expect("icon");
        assert_eq!(proxy.width(), 8);
        assert_eq!(server.raster_fetches(), vec![ICON_WIN, PIXMAP]);
        assert_eq!(server.property_queries(AtomEnum::WM_HINTS.into()), 1);
    }

    #[test]
    fn mono_pixmap_without_mask() {
        let mut server = FakeServer::new();
        server.set_hints(WIN, hints(ICON_PIXMAP_HINT));
        server.set_raster(PIXMAP, || mono_raster(8, 8, |x, y| x == y));

        let proxy = select_icon(&server, WIN, 64).expect("icon");
        assert_eq!((proxy.width(), proxy.height()), (8, 8));

        let argb = proxy.to_argb();
        for (i, px) in argb.chunks_exact(4).enumerate() {
            let (x, y) = (i % 8, i / 8);
            assert_eq!(px[0], 0xff);
            let expected = if x == y { [0, 0, 0] } else { [0xff, 0xff, 0xff] };
            assert_eq!(px[1..], expected, "pixel ({x}, {y})");
        }
        // Mask not flagged, so never fetched.
        assert_eq!(server.raster_fetches(), vec![PIXMAP]);
    }

    #[test]
    fn pixmap_with_mask() {
        let mut server = FakeServer::new();
        server.set_hints(WIN, hints(ICON_PIXMAP_HINT | ICON_MASK_HINT));
        server.set_raster(PIXMAP, || mono_raster(2, 1, |_, _| true));
        server.set_raster(MASK, || mono_raster(2, 1, |x, _| x == 1));

        let proxy = select_icon(&server, WIN, 64).expect("icon");
        let alphas: Vec<u8> = proxy.to_argb().chunks_exact(4).map(|px| px[0]).collect();
        assert_eq!(alphas, vec![0x00, 0xff]);
        assert_eq!(server.raster_fetches(), vec![PIXMAP, MASK]);
    }

    #[test]
    fn unfetchable_mask_degrades_to_opaque() {
        let mut server = FakeServer::new();
        server.set_hints(WIN, hints(ICON_PIXMAP_HINT | ICON_MASK_HINT));
        server.set_raster(PIXMAP, || mono_raster(2, 2, |_, _| true));

        let proxy = select_icon(&server, WIN, 64).expect("icon");
        assert!(proxy.to_argb().chunks_exact(4).all(|px| px[0] == 0xff));
    }

    #[test]
    fn no_icon_sources() {
        let server = FakeServer::new();
        assert!(select_icon(&server, WIN, 64).is_none());
        assert!(server.raster_fetches().is_empty());
    }

    #[test]
    fn hints_without_icon_flags() {
        let mut server = FakeServer::new();
        server.set_hints(WIN, hints(0));
        server.set_raster(ICON_WIN, || mono_raster(1, 1, |_, _| true));
        server.set_raster(PIXMAP, || mono_raster(1, 1, |_, _| true));

        assert!(select_icon(&server, WIN, 64).is_none());
        assert!(server.raster_fetches().is_empty());
    }

    #[test]
    fn unfetchable_pixmap_means_no_icon() {
        let mut server = FakeServer::new();
        server.set_hints(WIN, hints(ICON_PIXMAP_HINT | ICON_MASK_HINT));
        server.set_raster(MASK, || mono_raster(1, 1, |_, _| true));

        assert!(select_icon(&server, WIN, 64).is_none());
        assert_eq!(server.raster_fetches(), vec![PIXMAP]);
    }
}
