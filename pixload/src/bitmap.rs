//! Destination bitmaps: 4 bytes per pixel, one packed `u32` per pixel

use std::collections::TryReserveError;

pub const BYTES_PER_PIXEL: usize = 4;

/// Pack channels into the canonical pixel value.
///
/// Layout is `0xAARRGGBB`; in memory the value is stored in native byte order.
#[inline(always)]
pub const fn pack_rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (b as u32) | ((g as u32) << 8) | ((r as u32) << 16) | ((a as u32) << 24)
}

/// Inverse of [`pack_rgba`], returns `[r, g, b, a]`
#[inline(always)]
pub const fn unpack(pixel: u32) -> [u8; 4] {
    [
        (pixel >> 16) as u8,
        (pixel >> 8) as u8,
        pixel as u8,
        (pixel >> 24) as u8,
    ]
}

/// Row-addressable 32-bit pixel storage.
///
/// Memory row 0 is the visual top of the image unless [`Bitmap::is_flipped`]
/// returns true, in which case memory row 0 is the visual bottom.
pub trait Bitmap {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Resize the pixel storage, discarding its contents.
    ///
    /// Returns false if the bitmap could not take the new size; callers should
    /// still check `width()`/`height()` afterwards.
    fn resize(&mut self, width: u32, height: u32) -> bool;

    /// Distance in bytes between the starts of consecutive memory rows
    fn row_span(&self) -> usize;

    fn is_flipped(&self) -> bool {
        false
    }

    fn bits(&self) -> &[u8];

    fn bits_mut(&mut self) -> &mut [u8];

    /// Packed pixel at visual position `(x, y)`, `y == 0` being the top row
    fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let row = if self.is_flipped() {
            self.height() - 1 - y
        } else {
            y
        };
        let offset = row as usize * self.row_span() + x as usize * BYTES_PER_PIXEL;
        let bytes = self.bits().get(offset..offset + BYTES_PER_PIXEL)?;
        Some(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// Heap-backed bitmap with tightly packed rows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemBitmap {
    width: u32,
    height: u32,
    flipped: bool,
    bits: Vec<u8>,
}

impl MemBitmap {
    /// Top-down bitmap filled with transparent black
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            flipped: false,
            bits: vec![0; width as usize * BYTES_PER_PIXEL * height as usize],
        }
    }

    /// Bottom-up bitmap: memory row 0 holds the last visual row
    pub fn new_flipped(width: u32, height: u32) -> Self {
        let mut bitmap = Self::new(width, height);
        bitmap.flipped = true;
        bitmap
    }

    /// Visual-order iterator over the packed pixels, top row first
    pub fn pixels(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).filter_map(move |x| self.pixel(x, y))
        })
    }

    /// Top-down `[r, g, b, a]` bytes, e.g. for dumping raw frames
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels().flat_map(unpack).collect()
    }

    fn try_alloc(len: usize) -> Result<Vec<u8>, TryReserveError> {
        let mut bits = Vec::new();
        bits.try_reserve_exact(len)?;
        bits.resize(len, 0);
        Ok(bits)
    }
}

impl Bitmap for MemBitmap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == self.width && height == self.height {
            return true;
        }

        let Some(len) = (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .and_then(|span| span.checked_mul(height as usize))
        else {
            return false;
        };

        match Self::try_alloc(len) {
            Ok(bits) => {
                self.bits = bits;
                self.width = width;
                self.height = height;
                true
            }
            Err(e) => {
                log::warn!("Failed to allocate {width}x{height} bitmap: {e}");
                false
            }
        }
    }

    fn row_span(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    fn is_flipped(&self) -> bool {
        self.flipped
    }

    fn bits(&self) -> &[u8] {
        &self.bits
    }

    fn bits_mut(&mut self) -> &mut [u8] {
        &mut self.bits
    }
}

/// Fixed-size bitmap over caller-owned memory, e.g. a framebuffer or a
/// sub-rectangle of a larger surface. Rows may be padded.
#[derive(Debug)]
pub struct SliceBitmap<'a> {
    width: u32,
    height: u32,
    row_span: usize,
    flipped: bool,
    bits: &'a mut [u8],
}

impl<'a> SliceBitmap<'a> {
    /// Returns `None` if `bits` cannot hold `height` rows of `row_span` bytes,
    /// or if a row of `width` pixels does not fit in `row_span`.
    pub fn new(bits: &'a mut [u8], width: u32, height: u32, row_span: usize) -> Option<Self> {
        let row_bytes = (width as usize).checked_mul(BYTES_PER_PIXEL)?;
        if row_bytes > row_span {
            return None;
        }
        let required = match height {
            0 => 0,
            h => row_span.checked_mul(h as usize - 1)?.checked_add(row_bytes)?,
        };
        if bits.len() < required {
            return None;
        }

        Some(Self {
            width,
            height,
            row_span,
            flipped: false,
            bits,
        })
    }

    pub fn flipped(mut self, flipped: bool) -> Self {
        self.flipped = flipped;
        self
    }
}

impl Bitmap for SliceBitmap<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    // Caller-owned memory cannot grow or shrink.
    fn resize(&mut self, width: u32, height: u32) -> bool {
        width == self.width && height == self.height
    }

    fn row_span(&self) -> usize {
        self.row_span
    }

    fn is_flipped(&self) -> bool {
        self.flipped
    }

    fn bits(&self) -> &[u8] {
        &*self.bits
    }

    fn bits_mut(&mut self) -> &mut [u8] {
        &mut *self.bits
    }
}

#[test]
fn pack_layout() {
    assert_eq!(pack_rgba(0x11, 0x22, 0x33, 0x44), 0x4411_2233);
    assert_eq!(unpack(0x4411_2233), [0x11, 0x22, 0x33, 0x44]);
}

#[test]
fn flipped_pixel_lookup_reads_last_memory_row_for_top() {
    let mut bitmap = MemBitmap::new_flipped(1, 3);
    let last_row = 2 * bitmap.row_span();
    bitmap.bits_mut()[last_row..last_row + 4].copy_from_slice(&0xDEAD_BEEFu32.to_ne_bytes());

    assert_eq!(bitmap.pixel(0, 0), Some(0xDEAD_BEEF));
    assert_eq!(bitmap.pixel(0, 2), Some(0));
    assert_eq!(bitmap.pixel(0, 3), None);
}

#[test]
fn resize_reallocates_and_keeps_orientation() {
    let mut bitmap = MemBitmap::new_flipped(2, 2);
    assert!(bitmap.resize(5, 3));
    assert_eq!((bitmap.width(), bitmap.height()), (5, 3));
    assert_eq!(bitmap.bits().len(), 5 * 3 * 4);
    assert!(bitmap.is_flipped());
}

#[test]
fn slice_bitmap_rejects_short_storage_and_resizes() {
    let mut storage = vec![0u8; 40];
    assert!(SliceBitmap::new(&mut storage, 3, 3, 12).is_some());
    assert!(SliceBitmap::new(&mut storage, 3, 4, 12).is_none());
    assert!(SliceBitmap::new(&mut storage, 4, 1, 12).is_none());

    let mut bitmap = SliceBitmap::new(&mut storage, 2, 2, 16).unwrap();
    assert!(bitmap.resize(2, 2));
    assert!(!bitmap.resize(3, 2));
    assert_eq!((bitmap.width(), bitmap.height()), (2, 2));
}
