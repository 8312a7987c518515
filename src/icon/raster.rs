//! Geometry & raster fetcher.
//!
//! Copies a drawable's pixels to the client: geometry first (size and
//! depth), then a full-resolution ZPixmap image. Knows nothing about
//! icons; callers decide what an absent raster means.

use std::fmt;

use x11rb::connection::Connection;
use x11rb::errors::{ConnectionError, ReplyError};
use x11rb::image::Image;
use x11rb::protocol::xproto::{ConnectionExt as _, Depth, Drawable, Setup, Visualid, Visualtype};

use super::color::ColorModel;

/// Raster fetch errors.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// Geometry or image query rejected (destroyed, unmapped, bad handle).
    #[error("drawable 0x{0:x} cannot be queried")]
    NotMapped(Drawable),
    #[error("drawable 0x{0:x} has zero size")]
    Empty(Drawable),
    #[error("X11 connection: {0}")]
    Connection(#[from] ConnectionError),
}

/// Client-side copy of a drawable's pixels.
///
/// Owns the pixel buffer; dropping the snapshot releases it.
pub struct RasterSnapshot {
    image: Image<'static>,
    depth: u8,
    model: ColorModel,
}

impl RasterSnapshot {
    pub fn new(image: Image<'static>, depth: u8, model: ColorModel) -> Self {
        Self {
            image,
            depth,
            model,
        }
    }

    pub fn width(&self) -> u16 {
        self.image.width()
    }

    pub fn height(&self) -> u16 {
        self.image.height()
    }

    pub fn model(&self) -> ColorModel {
        self.model
    }

    /// Raw pixel value at `(x, y)`. Coordinates must be in bounds.
    pub fn pixel(&self, x: u16, y: u16) -> u32 {
        self.image.get_pixel(x, y)
    }
}

impl fmt::Debug for RasterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterSnapshot")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("depth", &self.depth)
            .field("model", &self.model)
            .finish()
    }
}

/// Fetch a full-resolution snapshot of `drawable`.
///
/// Any X11 error on the geometry or image request maps to
/// [`RasterError::NotMapped`]; only a broken connection is reported as
/// such. There are no retries.
pub fn fetch_raster(conn: &impl Connection, drawable: Drawable) -> Result<RasterSnapshot, RasterError> {
    let geometry = match conn.get_geometry(drawable)?.reply() {
        Ok(geometry) => geometry,
        Err(ReplyError::X11Error(e)) => {
            tracing::debug!(
                drawable = format_args!("0x{drawable:x}"),
                error = ?e.error_kind,
                "GetGeometry failed"
            );
            return Err(RasterError::NotMapped(drawable));
        }
        Err(ReplyError::ConnectionError(e)) => return Err(e.into()),
    };

    if geometry.width == 0 || geometry.height == 0 {
        return Err(RasterError::Empty(drawable));
    }

    // GetImage fails with BadMatch for windows that are not viewable.
    let (image, visual) = match Image::get(conn, drawable, 0, 0, geometry.width, geometry.height) {
        Ok(fetched) => fetched,
        Err(ReplyError::X11Error(e)) => {
            tracing::debug!(
                drawable = format_args!("0x{drawable:x}"),
                error = ?e.error_kind,
                "GetImage failed"
            );
            return Err(RasterError::NotMapped(drawable));
        }
        Err(ReplyError::ConnectionError(e)) => return Err(e.into()),
    };

    let model = color_model(conn.setup(), geometry.depth, visual);

    tracing::debug!(
        drawable = format_args!("0x{drawable:x}"),
        width = geometry.width,
        height = geometry.height,
        depth = geometry.depth,
        ?model,
        "raster fetched"
    );

    Ok(RasterSnapshot::new(image, geometry.depth, model))
}

/// Color model for pixels of `depth` fetched with `visual`.
fn color_model(setup: &Setup, depth: u8, visual: Visualid) -> ColorModel {
    let depths = setup.roots.iter().flat_map(|screen| screen.allowed_depths.iter());
    ColorModel::for_depth(depth, find_visual(depths, depth, visual))
}

/// Look up the visual describing pixels of `depth`.
///
/// Windows report their visual; pixmaps report none (`0`), in which case
/// the first visual the server advertises at that depth is used.
fn find_visual<'a, I>(depths: I, depth: u8, visual: Visualid) -> Option<&'a Visualtype>
where
    I: Iterator<Item = &'a Depth> + Clone,
{
    if visual != x11rb::NONE
        && let Some(found) = depths
            .clone()
            .flat_map(|d| d.visuals.iter())
            .find(|v| v.visual_id == visual)
    {
        return Some(found);
    }

    depths
        .filter(|d| d.depth == depth)
        .flat_map(|d| d.visuals.iter())
        .next()
}
