// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! RGBA8 source pixels handed over by the host.

use crate::{Result, UnitexError};

/// Bytes per RGBA8 pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Borrowed, tightly packed RGBA8 pixels.
///
/// Rows are contiguous: `pitch() == width * 4`. The slice is trimmed to
/// exactly `width * height * 4` bytes at construction so every upload path
/// can hand `data()` straight to a driver call.
#[derive(Clone, Copy)]
pub struct FrameBuffer<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> FrameBuffer<'a> {
    /// Wrap `data` as a `width` x `height` RGBA8 frame.
    pub fn new(width: u32, height: u32, data: &'a [u8]) -> Result<Self> {
        let required = Self::required_len(width, height)?;
        if data.len() < required {
            return Err(UnitexError::Frame(format!(
                "{}x{} RGBA8 frame needs {} bytes, got {}",
                width,
                height,
                required,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data: &data[..required],
        })
    }

    /// Wrap a raw pixel pointer coming across the C ABI.
    ///
    /// Returns `Ok(None)` for a null pointer, which callers treat as "nothing
    /// to upload", and an error when the size does not fit in memory.
    ///
    /// # Safety
    ///
    /// A non-null `pixels` must point at `width * height * 4` readable bytes
    /// that stay valid and unmodified for `'a`.
    pub unsafe fn from_raw_parts(
        pixels: *const u8,
        width: u32,
        height: u32,
    ) -> Result<Option<Self>> {
        if pixels.is_null() {
            return Ok(None);
        }

        let len = Self::required_len(width, height)?;
        // SAFETY: non-null and sized by the caller contract above.
        let data = unsafe { std::slice::from_raw_parts(pixels, len) };
        Ok(Some(Self {
            width,
            height,
            data,
        }))
    }

    /// Byte length of a packed RGBA8 frame of the given size, `None` if it
    /// is larger than a slice can address.
    pub fn byte_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(BYTES_PER_PIXEL)
            .filter(|&len| len <= isize::MAX as usize)
    }

    fn required_len(width: u32, height: u32) -> Result<usize> {
        Self::byte_len(width, height).ok_or_else(|| {
            UnitexError::Frame(format!(
                "{}x{} RGBA8 frame does not fit in memory",
                width, height
            ))
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Source row stride in bytes.
    pub fn pitch(&self) -> usize {
        self.width as usize * BYTES_PER_PIXEL
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Iterate over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + use<'a> {
        let pitch = self.pitch().max(1);
        self.data.chunks_exact(pitch).take(self.height as usize)
    }

    /// Copy the pixels out so they can outlive the host's buffer.
    pub fn to_owned_frame(&self) -> OwnedFrame {
        OwnedFrame {
            width: self.width,
            height: self.height,
            pixels: self.data.to_vec(),
        }
    }
}

impl std::fmt::Debug for FrameBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Owned copy of a frame, parked until the render thread picks it up.
#[derive(Clone, PartialEq, Eq)]
pub struct OwnedFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl OwnedFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let len = FrameBuffer::new(width, height, &pixels)?.data().len();
        let mut pixels = pixels;
        pixels.truncate(len);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn as_frame(&self) -> FrameBuffer<'_> {
        FrameBuffer {
            width: self.width,
            height: self.height,
            data: &self.pixels,
        }
    }
}

impl std::fmt::Debug for OwnedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_short_slice() {
        let data = vec![0u8; 15];
        let err = FrameBuffer::new(2, 2, &data).unwrap_err();
        assert!(matches!(err, UnitexError::Frame(_)));
    }

    #[test]
    fn test_new_trims_to_exact_length() {
        let data = vec![7u8; 40];
        let frame = FrameBuffer::new(3, 3, &data).unwrap();
        assert_eq!(frame.data().len(), 36);
        assert_eq!(frame.pitch(), 12);
        assert_eq!(frame.rows().count(), 3);
    }

    #[test]
    fn test_from_raw_parts_null_is_none() {
        let frame = unsafe { FrameBuffer::from_raw_parts(std::ptr::null(), 4, 4) }.unwrap();
        assert!(frame.is_none());
    }

    #[test]
    fn test_from_raw_parts_reads_pixels() {
        let data: Vec<u8> = (0..16).collect();
        let frame = unsafe { FrameBuffer::from_raw_parts(data.as_ptr(), 2, 2) }
            .unwrap()
            .unwrap();
        assert_eq!(frame.data(), &data[..]);
        let rows: Vec<&[u8]> = frame.rows().collect();
        assert_eq!(rows[1], &[8, 9, 10, 11, 12, 13, 14, 15]);
    }

    #[test]
    fn test_owned_frame_round_trips_view() {
        let owned = OwnedFrame::new(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
        let view = owned.as_frame();
        assert_eq!(view.dimensions(), (1, 2));
        assert_eq!(view.data(), &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(view.to_owned_frame(), owned);
    }

    #[test]
    fn test_overflowing_size_is_rejected() {
        assert_eq!(FrameBuffer::byte_len(u32::MAX, u32::MAX), None);
        assert!(matches!(
            FrameBuffer::new(u32::MAX, u32::MAX, &[]),
            Err(UnitexError::Frame(_))
        ));

        // The size is rejected before the pointer is ever read.
        let byte = 0u8;
        let frame = unsafe { FrameBuffer::from_raw_parts(&byte, u32::MAX, u32::MAX) };
        assert!(matches!(frame, Err(UnitexError::Frame(_))));

        // Largest size the C ABI can pass: fits in u64 but not in a slice.
        let max = i32::MAX as u32;
        assert_eq!(FrameBuffer::byte_len(max, max), None);
    }

    #[test]
    fn test_zero_sized_frame_has_no_rows() {
        let frame = FrameBuffer::new(0, 4, &[]).unwrap();
        assert_eq!(frame.rows().count(), 0);
    }
}
