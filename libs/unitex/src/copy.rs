// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Pitch-aware row copy into mapped texture memory.

use crate::{FrameBuffer, Result, UnitexError};

/// Result of a [`fill_buffer`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillOutcome {
    /// All rows were written.
    Copied { rows: u32 },
    /// Source and destination sizes differ; nothing was written.
    DimensionMismatch {
        destination: (u32, u32),
        source: (u32, u32),
    },
}

/// Copy `src` into `dst`, a `width` x `height` RGBA8 surface whose rows are
/// `dst_pitch` bytes apart.
///
/// Only the first `width * 4` bytes of each destination row are written;
/// driver padding past that is left alone.
pub fn fill_buffer(
    dst: &mut [u8],
    dst_pitch: usize,
    src: &FrameBuffer<'_>,
    width: u32,
    height: u32,
) -> Result<FillOutcome> {
    if src.dimensions() != (width, height) {
        return Ok(FillOutcome::DimensionMismatch {
            destination: (width, height),
            source: src.dimensions(),
        });
    }

    let row_bytes = src.pitch();
    if dst_pitch < row_bytes {
        return Err(UnitexError::Texture(format!(
            "destination pitch {} is smaller than a {}-pixel row ({} bytes)",
            dst_pitch, width, row_bytes
        )));
    }

    let required = mapped_len(dst_pitch, width, height)?;
    if dst.len() < required {
        return Err(UnitexError::Texture(format!(
            "destination holds {} bytes, {}x{} at pitch {} needs {}",
            dst.len(),
            width,
            height,
            dst_pitch,
            required
        )));
    }

    for (y, src_row) in src.rows().enumerate() {
        let offset = y * dst_pitch;
        dst[offset..offset + row_bytes].copy_from_slice(src_row);
    }

    Ok(FillOutcome::Copied { rows: height })
}

/// [`fill_buffer`] over a raw mapped pointer.
///
/// A null `dst` is a no-op and yields `Ok(None)`.
///
/// # Safety
///
/// A non-null `dst` must be writable for
/// `dst_pitch * (height - 1) + width * 4` bytes and not aliased for the
/// duration of the call.
pub(crate) unsafe fn fill_buffer_raw(
    dst: *mut u8,
    dst_pitch: usize,
    src: &FrameBuffer<'_>,
    width: u32,
    height: u32,
) -> Result<Option<FillOutcome>> {
    if dst.is_null() {
        return Ok(None);
    }

    let len = mapped_len(dst_pitch, width, height)?;
    // SAFETY: caller guarantees `len` writable bytes at `dst`.
    let dst = unsafe { std::slice::from_raw_parts_mut(dst, len) };
    fill_buffer(dst, dst_pitch, src, width, height).map(Some)
}

/// Bytes touched when writing `height` rows `pitch` apart; the last row is
/// not padded.
pub(crate) fn mapped_len(pitch: usize, width: u32, height: u32) -> Result<usize> {
    if height == 0 {
        return Ok(0);
    }

    pitch
        .checked_mul(height as usize - 1)
        .and_then(|rows| rows.checked_add(width as usize * crate::BYTES_PER_PIXEL))
        .ok_or_else(|| {
            UnitexError::Texture(format!(
                "{}x{} surface at pitch {} does not fit in memory",
                width, height, pitch
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..FrameBuffer::byte_len(width, height).unwrap())
            .map(|i| (i % 251) as u8)
            .collect()
    }

    #[test]
    fn test_copies_rows_at_destination_pitch() {
        let pixels = gradient(3, 2);
        let frame = FrameBuffer::new(3, 2, &pixels).unwrap();
        let mut dst = vec![0xAAu8; 16 * 2];

        let outcome = fill_buffer(&mut dst, 16, &frame, 3, 2).unwrap();

        assert_eq!(outcome, FillOutcome::Copied { rows: 2 });
        assert_eq!(&dst[0..12], &pixels[0..12]);
        assert_eq!(&dst[16..28], &pixels[12..24]);
        // padding untouched
        assert!(dst[12..16].iter().all(|&b| b == 0xAA));
        assert!(dst[28..32].iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn test_mismatch_writes_nothing() {
        let pixels = gradient(2, 2);
        let frame = FrameBuffer::new(2, 2, &pixels).unwrap();
        let mut dst = vec![0u8; 64];

        let outcome = fill_buffer(&mut dst, 16, &frame, 4, 4).unwrap();

        assert_eq!(
            outcome,
            FillOutcome::DimensionMismatch {
                destination: (4, 4),
                source: (2, 2)
            }
        );
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_pitch_smaller_than_row_is_error() {
        let pixels = gradient(4, 1);
        let frame = FrameBuffer::new(4, 1, &pixels).unwrap();
        let mut dst = vec![0u8; 64];

        assert!(fill_buffer(&mut dst, 8, &frame, 4, 1).is_err());
        assert!(dst.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_short_destination_is_error() {
        let pixels = gradient(2, 3);
        let frame = FrameBuffer::new(2, 3, &pixels).unwrap();
        // needs 16 * 2 + 8 = 40
        let mut dst = vec![0u8; 39];

        assert!(fill_buffer(&mut dst, 16, &frame, 2, 3).is_err());
    }

    #[test]
    fn test_last_row_needs_no_padding() {
        let pixels = gradient(2, 2);
        let frame = FrameBuffer::new(2, 2, &pixels).unwrap();
        let mut dst = vec![0u8; 24];

        let outcome = fill_buffer(&mut dst, 16, &frame, 2, 2).unwrap();
        assert_eq!(outcome, FillOutcome::Copied { rows: 2 });
        assert_eq!(&dst[16..24], &pixels[8..16]);
    }

    #[test]
    fn test_raw_null_destination_is_noop() {
        let pixels = gradient(1, 1);
        let frame = FrameBuffer::new(1, 1, &pixels).unwrap();
        let outcome = unsafe { fill_buffer_raw(std::ptr::null_mut(), 4, &frame, 1, 1) }.unwrap();
        assert_eq!(outcome, None);
    }

    #[test]
    fn test_raw_copies_into_pointer() {
        let pixels = gradient(2, 2);
        let frame = FrameBuffer::new(2, 2, &pixels).unwrap();
        let mut dst = vec![0u8; 32];
        let outcome = unsafe { fill_buffer_raw(dst.as_mut_ptr(), 16, &frame, 2, 2) }.unwrap();
        assert_eq!(outcome, Some(FillOutcome::Copied { rows: 2 }));
        assert_eq!(&dst[16..24], &pixels[8..16]);
    }

    #[test]
    fn test_overflowing_pitch_is_error() {
        assert!(mapped_len(usize::MAX, 1, 3).is_err());
        assert_eq!(mapped_len(16, 2, 0).unwrap(), 0);
        assert_eq!(mapped_len(16, 2, 3).unwrap(), 40);
    }
}
