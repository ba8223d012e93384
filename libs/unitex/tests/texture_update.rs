// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! End-to-end update through the mapped (lock / copy / unlock) path, with a
//! host-memory texture standing in for a driver surface.

use unitex::{
    FrameBuffer, GraphicsRenderer, HostTexture, NativeTexture, Result, SkipReason, TexelFormat,
    TextureUpdater, UploadBackend, UploadOutcome, upload_mapped,
};

/// Treats `NativeTexture` handles as `*mut HostTexture`.
struct HostBackend;

impl UploadBackend for HostBackend {
    fn renderer(&self) -> GraphicsRenderer {
        GraphicsRenderer::D3D9
    }

    unsafe fn upload(
        &mut self,
        texture: &NativeTexture,
        frame: &FrameBuffer<'_>,
    ) -> Result<UploadOutcome> {
        if texture.is_null() {
            return Ok(UploadOutcome::Skipped(SkipReason::NullTexture));
        }
        let surface = unsafe { &mut *(texture.as_ptr() as *mut HostTexture) };
        unsafe { upload_mapped(surface, frame) }
    }
}

fn checker(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(FrameBuffer::byte_len(width, height).unwrap());
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[x as u8, y as u8, (x ^ y) as u8, 0xFF]);
        }
    }
    pixels
}

fn handle(texture: &mut HostTexture, width: u32, height: u32) -> NativeTexture {
    NativeTexture::new(texture as *mut HostTexture as *mut _, width, height)
}

#[test]
fn test_every_pixel_copied_with_padded_pitch() {
    let (width, height) = (5, 3);
    // 5 * 4 = 20 bytes of pixels, 12 bytes of driver padding per row
    let mut surface = HostTexture::new(width, height, 32).unwrap();
    let native = handle(&mut surface, width, height);
    let pixels = checker(width, height);
    let frame = FrameBuffer::new(width, height, &pixels).unwrap();

    let mut updater = TextureUpdater::new(Box::new(HostBackend));
    let outcome = unsafe { updater.update(&native, Some(&frame)) }.unwrap();
    assert_eq!(outcome, UploadOutcome::Copied);

    for y in 0..height {
        for x in 0..width {
            assert_eq!(
                surface.pixel(x, y),
                [x as u8, y as u8, (x ^ y) as u8, 0xFF],
                "pixel ({}, {})",
                x,
                y
            );
        }
        let row_end = y as usize * 32 + 20;
        assert!(
            surface.bytes()[row_end..row_end + 12]
                .iter()
                .all(|&b| b == HostTexture::CLEAR_BYTE),
            "padding of row {} was written",
            y
        );
    }
    assert!(!surface.is_locked());
}

#[test]
fn test_null_source_leaves_texture_untouched() {
    let mut surface = HostTexture::new(4, 4, 16).unwrap();
    let native = handle(&mut surface, 4, 4);

    let mut updater = TextureUpdater::new(Box::new(HostBackend));
    let outcome = unsafe { updater.update(&native, None) }.unwrap();

    assert_eq!(outcome, UploadOutcome::Skipped(SkipReason::NoFrame));
    assert_eq!(surface.lock_count(), 0);
    assert!(surface.bytes().iter().all(|&b| b == HostTexture::CLEAR_BYTE));
}

#[test]
fn test_dimension_mismatch_copies_nothing() {
    let mut surface = HostTexture::new(4, 4, 16).unwrap();
    let native = handle(&mut surface, 4, 4);
    let pixels = checker(4, 3);
    let frame = FrameBuffer::new(4, 3, &pixels).unwrap();

    let mut updater = TextureUpdater::new(Box::new(HostBackend));
    let outcome = unsafe { updater.update(&native, Some(&frame)) }.unwrap();

    assert_eq!(
        outcome,
        UploadOutcome::Skipped(SkipReason::DimensionMismatch {
            texture: (4, 4),
            frame: (4, 3)
        })
    );
    // locked and released, never written
    assert_eq!(surface.lock_count(), 1);
    assert!(!surface.is_locked());
    assert!(surface.bytes().iter().all(|&b| b == HostTexture::CLEAR_BYTE));
}

#[test]
fn test_raw_host_pointer_round_trip() {
    let pixels = checker(2, 2);
    let frame = unsafe { FrameBuffer::from_raw_parts(pixels.as_ptr(), 2, 2) }.unwrap();
    let mut surface = HostTexture::new(2, 2, 8).unwrap();
    let native = handle(&mut surface, 2, 2);

    let mut updater = TextureUpdater::new(Box::new(HostBackend));
    let outcome = unsafe { updater.update(&native, frame.as_ref()) }.unwrap();

    assert_eq!(outcome, UploadOutcome::Copied);
    assert_eq!(surface.bytes(), &pixels[..]);
}

#[test]
fn test_wider_texel_format_is_not_written() {
    // D3DFMT_A32B32G32R32F: a 2x2 level spans 64 bytes, the frame only 16
    let format = TexelFormat::from_d3d9(116);
    let mut surface = HostTexture::new(2, 2, 32).unwrap().with_format(format);
    let native = handle(&mut surface, 2, 2);
    let pixels = checker(2, 2);
    let frame = FrameBuffer::new(2, 2, &pixels).unwrap();

    let mut updater = TextureUpdater::new(Box::new(HostBackend));
    let outcome = unsafe { updater.update(&native, Some(&frame)) }.unwrap();

    assert_eq!(outcome, UploadOutcome::Skipped(SkipReason::UnsupportedFormat(116)));
    assert_eq!(surface.lock_count(), 0);
    assert!(surface.bytes().iter().all(|&b| b == HostTexture::CLEAR_BYTE));
}
