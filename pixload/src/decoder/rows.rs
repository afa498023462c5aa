//! Row addressing into destination storage and the per-pixel byte shuffles

use crate::bitmap::{pack_rgba, BYTES_PER_PIXEL};
use crate::error::LoadError;

use super::header::Transforms;

/// Byte offset of every image row inside the destination storage, image row 0
/// first. Consecutive entries differ by exactly one row span, upwards for
/// bottom-up storage.
#[derive(Debug)]
pub(super) struct RowTable {
    offsets: Vec<usize>,
    row_bytes: usize,
}

impl RowTable {
    pub fn new(
        width: u32,
        height: u32,
        row_span: usize,
        flipped: bool,
        storage_len: usize,
    ) -> Result<Self, LoadError> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let required = match height as usize {
            0 => 0,
            h => row_span
                .checked_mul(h - 1)
                .and_then(|n| n.checked_add(row_bytes))
                .unwrap_or(usize::MAX),
        };
        if row_span < row_bytes || storage_len < required {
            return Err(LoadError::DestinationStorage {
                required,
                available: storage_len,
            });
        }

        let last = (height as usize).saturating_sub(1);
        let offsets = (0..height as usize)
            .map(|row| {
                let memory_row = if flipped { last - row } else { row };
                memory_row * row_span
            })
            .collect();

        Ok(Self { offsets, row_bytes })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Destination bytes of image row `row`, `width * 4` long
    pub fn row_mut<'a>(&self, bits: &'a mut [u8], row: usize) -> &'a mut [u8] {
        let start = self.offsets[row];
        &mut bits[start..start + self.row_bytes]
    }

    /// Rewrite every `[a, r, g, b]` pixel as its packed value, in place
    pub fn pack_all(&self, bits: &mut [u8]) {
        for row in 0..self.len() {
            pack_row(self.row_mut(bits, row));
        }
    }
}

/// Copy one decoded scanline into `dst` as `[a, r, g, b]` bytes, following the
/// adapter's share of `plan`: filler alpha first, gray spread over R, G and B,
/// and a trailing alpha moved to the front.
pub(super) fn write_argb_row(plan: &Transforms, src: &[u8], dst: &mut [u8]) {
    let channels = plan.decoded_channels();
    let src = src.chunks_exact(channels);
    let dst = dst.chunks_exact_mut(BYTES_PER_PIXEL);

    for (s, d) in src.zip(dst) {
        let (color, alpha) = if plan.swap_alpha {
            s.split_at(channels - 1)
        } else {
            (s, &[][..])
        };

        d[0] = match alpha.first() {
            Some(&a) if !plan.filler_before => a,
            _ => 0xff,
        };
        if plan.gray_to_rgb {
            d[1..].fill(color[0]);
        } else {
            d[1..].copy_from_slice(color);
        }
    }
}

fn pack_row(row: &mut [u8]) {
    for px in row.chunks_exact_mut(BYTES_PER_PIXEL) {
        let [a, r, g, b] = [px[0], px[1], px[2], px[3]];
        px.copy_from_slice(&pack_rgba(r, g, b, a).to_ne_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_step_by_one_row_span() {
        let table = RowTable::new(3, 4, 16, false, 64).unwrap();
        assert_eq!(table.offsets, vec![0, 16, 32, 48]);

        let table = RowTable::new(3, 4, 16, true, 64).unwrap();
        assert_eq!(table.offsets, vec![48, 32, 16, 0]);
        assert!(table
            .offsets
            .windows(2)
            .all(|pair| pair[0] - pair[1] == 16));
    }

    #[test]
    fn short_storage_is_rejected() {
        // last row only needs 12 of its 16 bytes
        assert!(RowTable::new(3, 4, 16, false, 60).is_ok());
        assert!(matches!(
            RowTable::new(3, 4, 16, false, 59),
            Err(LoadError::DestinationStorage {
                required: 60,
                available: 59
            })
        ));
        assert!(RowTable::new(5, 1, 16, false, 64).is_err());
    }

    #[test]
    fn empty_image_has_no_rows() {
        let table = RowTable::new(0, 0, 0, true, 0).unwrap();
        assert_eq!(table.len(), 0);
    }

    fn plan(gray: bool, alpha: bool) -> Transforms {
        Transforms {
            filler_before: !alpha,
            gray_to_rgb: gray,
            swap_alpha: alpha,
            ..Transforms::default()
        }
    }

    #[test]
    fn argb_rows_for_every_decoded_format() {
        let mut dst = [0u8; 8];

        write_argb_row(&plan(true, false), &[7, 9], &mut dst);
        assert_eq!(dst, [0xff, 7, 7, 7, 0xff, 9, 9, 9]);

        write_argb_row(&plan(true, true), &[7, 1, 9, 2], &mut dst);
        assert_eq!(dst, [1, 7, 7, 7, 2, 9, 9, 9]);

        write_argb_row(&plan(false, false), &[1, 2, 3, 4, 5, 6], &mut dst);
        assert_eq!(dst, [0xff, 1, 2, 3, 0xff, 4, 5, 6]);

        write_argb_row(&plan(false, true), &[1, 2, 3, 4, 5, 6, 7, 8], &mut dst);
        assert_eq!(dst, [4, 1, 2, 3, 8, 5, 6, 7]);
    }

    #[test]
    fn packing_leaves_row_padding_alone() {
        let mut bits = vec![0xaa; 24];
        let table = RowTable::new(1, 2, 12, false, bits.len()).unwrap();
        table.row_mut(&mut bits, 0).copy_from_slice(&[0x80, 1, 2, 3]);
        table.row_mut(&mut bits, 1).copy_from_slice(&[0xff, 4, 5, 6]);

        table.pack_all(&mut bits);

        assert_eq!(bits[0..4], pack_rgba(1, 2, 3, 0x80).to_ne_bytes());
        assert_eq!(bits[4..12], [0xaa; 8]);
        assert_eq!(bits[12..16], pack_rgba(4, 5, 6, 0xff).to_ne_bytes());
    }
}
