//! `_NET_WM_ICON` parsing.
//!
//! The property is a CARDINAL array of one or more entries, each
//! `width, height, width * height` ARGB words. The array must be consumed
//! exactly by whole entries; anything else is malformed and the icon
//! strategy falls through.

/// Largest icon edge accepted, in pixels.
pub const MAX_ICON_DIMENSION: u32 = 4096;

/// Why a packed icon property was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MalformedIcon {
    #[error("property holds no icon")]
    Empty,
    #[error("entry at word {offset} has no height")]
    MissingHeight { offset: usize },
    #[error("entry at word {offset} has invalid size {width}x{height}")]
    BadDimension {
        offset: usize,
        width: u32,
        height: u32,
    },
    #[error("entry at word {offset} declares {declared} pixels, {available} present")]
    Truncated {
        offset: usize,
        declared: usize,
        available: usize,
    },
}

/// Location of one icon inside the property array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconEntry {
    pub width: u32,
    pub height: u32,
    /// Index of the first pixel word.
    pub pixel_offset: usize,
}

impl IconEntry {
    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// The entry's pixel words.
    pub fn pixels<'a>(&self, values: &'a [u32]) -> &'a [u32] {
        &values[self.pixel_offset..self.pixel_offset + self.pixel_count()]
    }
}

/// Split a `_NET_WM_ICON` array into its entries.
pub fn parse_entries(values: &[u32]) -> Result<Vec<IconEntry>, MalformedIcon> {
    let mut entries = Vec::new();
    let mut offset = 0;

    while offset < values.len() {
        let width = values[offset];
        let height = *values
            .get(offset + 1)
            .ok_or(MalformedIcon::MissingHeight { offset })?;

        if width == 0 || height == 0 || width > MAX_ICON_DIMENSION || height > MAX_ICON_DIMENSION {
            return Err(MalformedIcon::BadDimension {
                offset,
                width,
                height,
            });
        }

        let pixel_offset = offset + 2;
        let declared = width as usize * height as usize;
        let available = values.len() - pixel_offset;
        if declared > available {
            return Err(MalformedIcon::Truncated {
                offset,
                declared,
                available,
            });
        }

        entries.push(IconEntry {
            width,
            height,
            pixel_offset,
        });
        offset = pixel_offset + declared;
    }

    if entries.is_empty() {
        return Err(MalformedIcon::Empty);
    }
    Ok(entries)
}

/// Pick the entry closest to `target` pixels square.
///
/// Preference: exact match, then the smallest entry larger than the
/// target, then the largest entry overall.
pub fn closest_to_size(entries: &[IconEntry], target: u32) -> Option<&IconEntry> {
    let mut best_larger: Option<&IconEntry> = None;
    let mut largest: Option<&IconEntry> = None;

    for entry in entries {
        let edge = entry.width.max(entry.height);

        if entry.width == target && entry.height == target {
            return Some(entry);
        }

        if entry.width > target
            && entry.height > target
            && best_larger.is_none_or(|b| edge < b.width.max(b.height))
        {
            best_larger = Some(entry);
        }

        if largest.is_none_or(|b| edge > b.width.max(b.height)) {
            largest = Some(entry);
        }
    }

    best_larger.or(largest)
}
