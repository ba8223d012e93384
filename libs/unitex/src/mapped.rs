// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Lock / copy / unlock uploads for textures whose memory can be mapped.

use crate::copy::fill_buffer_raw;
use crate::{FillOutcome, FrameBuffer, Result, SkipReason, SurfaceDesc, UploadOutcome};

/// CPU-visible view of a locked surface.
#[derive(Debug, Clone, Copy)]
pub struct MappedRows {
    pub data: *mut u8,
    /// Bytes between row starts, including driver padding.
    pub pitch: usize,
}

/// A texture level that can be locked for CPU writes.
pub trait MappedSurface {
    /// Size and format of the level being written, as the graphics API
    /// reports it.
    fn describe(&self) -> Result<SurfaceDesc>;

    /// Lock the level for writing.
    ///
    /// # Safety
    ///
    /// Must be paired with [`unlock`](MappedSurface::unlock); `data` is only
    /// valid in between.
    unsafe fn lock(&mut self) -> Result<MappedRows>;

    /// # Safety
    ///
    /// Only after a successful [`lock`](MappedSurface::lock).
    unsafe fn unlock(&mut self) -> Result<()>;
}

/// Upload `frame` through a lockable surface.
///
/// Surfaces that are not RGBA8 are never locked. Otherwise the surface is
/// unlocked whether or not the copy happened; a null mapping is a no-op.
///
/// # Safety
///
/// A non-null pointer returned by `surface.lock()` must cover
/// `pitch * (height - 1) + width * 4` writable bytes.
pub unsafe fn upload_mapped<S: MappedSurface + ?Sized>(
    surface: &mut S,
    frame: &FrameBuffer<'_>,
) -> Result<UploadOutcome> {
    let desc = surface.describe()?;
    if let crate::TexelFormat::Other(format) = desc.format {
        return Ok(UploadOutcome::Skipped(SkipReason::UnsupportedFormat(format)));
    }

    let rows = unsafe { surface.lock()? };
    let filled = unsafe { fill_buffer_raw(rows.data, rows.pitch, frame, desc.width, desc.height) };
    let unlocked = unsafe { surface.unlock() };
    let filled = filled?;
    unlocked?;

    Ok(match filled {
        None => UploadOutcome::Skipped(SkipReason::NoDestination),
        Some(FillOutcome::Copied { .. }) => UploadOutcome::Copied,
        Some(FillOutcome::DimensionMismatch {
            destination,
            source,
        }) => UploadOutcome::mismatch(destination, source),
    })
}

#[cfg(any(test, feature = "test-support"))]
pub use host::HostTexture;

#[cfg(any(test, feature = "test-support"))]
mod host {
    use super::{MappedRows, MappedSurface};
    use crate::{Result, SurfaceDesc, TexelFormat, UnitexError};

    /// RGBA8 surface in host memory with a padded row pitch.
    ///
    /// Behaves like a driver-allocated texture level: rows are `pitch` bytes
    /// apart and must be locked before writing.
    #[derive(Debug, Clone)]
    pub struct HostTexture {
        width: u32,
        height: u32,
        pitch: usize,
        format: TexelFormat,
        pixels: Vec<u8>,
        locked: bool,
        lock_count: u32,
    }

    impl HostTexture {
        /// Fill byte for memory no upload has written.
        pub const CLEAR_BYTE: u8 = 0xCD;

        pub fn new(width: u32, height: u32, pitch: usize) -> Result<Self> {
            let row = width as usize * crate::BYTES_PER_PIXEL;
            if pitch < row {
                return Err(UnitexError::Texture(format!(
                    "pitch {} too small for {} pixels",
                    pitch, width
                )));
            }

            Ok(Self {
                width,
                height,
                pitch,
                format: TexelFormat::Rgba8,
                pixels: vec![Self::CLEAR_BYTE; pitch * height as usize],
                locked: false,
                lock_count: 0,
            })
        }

        /// Report `format` instead of RGBA8.
        pub fn with_format(mut self, format: TexelFormat) -> Self {
            self.format = format;
            self
        }

        pub fn bytes(&self) -> &[u8] {
            &self.pixels
        }

        pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
            let offset = y as usize * self.pitch + x as usize * crate::BYTES_PER_PIXEL;
            let mut px = [0u8; 4];
            px.copy_from_slice(&self.pixels[offset..offset + 4]);
            px
        }

        pub fn is_locked(&self) -> bool {
            self.locked
        }

        pub fn lock_count(&self) -> u32 {
            self.lock_count
        }
    }

    impl MappedSurface for HostTexture {
        fn describe(&self) -> Result<SurfaceDesc> {
            Ok(SurfaceDesc {
                width: self.width,
                height: self.height,
                format: self.format,
            })
        }

        unsafe fn lock(&mut self) -> Result<MappedRows> {
            if self.locked {
                return Err(UnitexError::Texture("surface already locked".into()));
            }
            self.locked = true;
            self.lock_count += 1;
            Ok(MappedRows {
                data: self.pixels.as_mut_ptr(),
                pitch: self.pitch,
            })
        }

        unsafe fn unlock(&mut self) -> Result<()> {
            if !self.locked {
                return Err(UnitexError::Texture("surface not locked".into()));
            }
            self.locked = false;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TexelFormat;

    /// Driver that succeeds at locking but hands back no memory.
    #[derive(Default)]
    struct NullMapping {
        unlocked: bool,
    }

    impl MappedSurface for NullMapping {
        fn describe(&self) -> Result<SurfaceDesc> {
            Ok(SurfaceDesc {
                width: 2,
                height: 2,
                format: TexelFormat::Rgba8,
            })
        }

        unsafe fn lock(&mut self) -> Result<MappedRows> {
            Ok(MappedRows {
                data: std::ptr::null_mut(),
                pitch: 8,
            })
        }

        unsafe fn unlock(&mut self) -> Result<()> {
            self.unlocked = true;
            Ok(())
        }
    }

    #[test]
    fn test_upload_unlocks_after_copy() {
        let mut texture = HostTexture::new(2, 2, 12).unwrap();
        let pixels: Vec<u8> = (1..=16).collect();
        let frame = FrameBuffer::new(2, 2, &pixels).unwrap();

        let outcome = unsafe { upload_mapped(&mut texture, &frame) }.unwrap();

        assert_eq!(outcome, UploadOutcome::Copied);
        assert!(!texture.is_locked());
        assert_eq!(texture.lock_count(), 1);
        assert_eq!(texture.pixel(1, 1), [13, 14, 15, 16]);
        assert_eq!(&texture.bytes()[8..12], &[HostTexture::CLEAR_BYTE; 4]);
    }

    #[test]
    fn test_upload_unlocks_on_mismatch() {
        let mut texture = HostTexture::new(4, 4, 16).unwrap();
        let pixels = vec![9u8; 16];
        let frame = FrameBuffer::new(2, 2, &pixels).unwrap();

        let outcome = unsafe { upload_mapped(&mut texture, &frame) }.unwrap();

        assert_eq!(
            outcome,
            UploadOutcome::Skipped(SkipReason::DimensionMismatch {
                texture: (4, 4),
                frame: (2, 2)
            })
        );
        assert!(!texture.is_locked());
        assert!(texture.bytes().iter().all(|&b| b == HostTexture::CLEAR_BYTE));
    }

    #[test]
    fn test_null_mapping_is_noop() {
        let mut surface = NullMapping::default();
        let pixels = vec![1u8; 16];
        let frame = FrameBuffer::new(2, 2, &pixels).unwrap();

        let outcome = unsafe { upload_mapped(&mut surface, &frame) }.unwrap();

        assert_eq!(outcome, UploadOutcome::Skipped(SkipReason::NoDestination));
        assert!(surface.unlocked);
    }

    #[test]
    fn test_wide_format_is_never_locked() {
        // D3DFMT_A16B16G16R16F: 8 bytes per texel
        let mut texture = HostTexture::new(2, 2, 16)
            .unwrap()
            .with_format(TexelFormat::Other(113));
        let pixels = vec![1u8; 16];
        let frame = FrameBuffer::new(2, 2, &pixels).unwrap();

        let outcome = unsafe { upload_mapped(&mut texture, &frame) }.unwrap();

        assert_eq!(outcome, UploadOutcome::Skipped(SkipReason::UnsupportedFormat(113)));
        assert_eq!(texture.lock_count(), 0);
        assert!(texture.bytes().iter().all(|&b| b == HostTexture::CLEAR_BYTE));
    }

    #[test]
    fn test_rejects_pitch_below_row() {
        assert!(HostTexture::new(4, 1, 15).is_err());
    }
}
