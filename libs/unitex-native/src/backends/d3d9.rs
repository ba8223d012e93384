// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Direct3D 9 upload: lock level 0, copy rows, unlock.

use windows::Win32::Graphics::Direct3D9::{D3DLOCKED_RECT, D3DSURFACE_DESC, IDirect3DTexture9};
use windows::core::Interface;

use unitex::{
    FrameBuffer, GraphicsRenderer, MappedRows, MappedSurface, NativeTexture, Result, SkipReason,
    SurfaceDesc, TexelFormat, UnitexError, UploadBackend, UploadOutcome, upload_mapped,
};
use unitex_unity_abi::{IUnityGraphicsD3D9, UnityInterfaces};

use super::gpu_error;

pub struct D3D9Backend;

impl D3D9Backend {
    pub fn new(interfaces: &UnityInterfaces) -> Result<Self> {
        let d3d9 = interfaces
            .get::<IUnityGraphicsD3D9>()
            .ok_or_else(|| UnitexError::NotSupported("IUnityGraphicsD3D9 unavailable".into()))?;

        if unsafe { (d3d9.get_device)() }.is_null() {
            return Err(UnitexError::Gpu("Unity returned a null D3D9 device".into()));
        }

        tracing::info!("Direct3D 9 backend ready");
        Ok(Self)
    }
}

/// Mip level 0 of a D3D9 texture.
struct LevelZero<'a> {
    texture: &'a IDirect3DTexture9,
}

impl MappedSurface for LevelZero<'_> {
    fn describe(&self) -> Result<SurfaceDesc> {
        let mut desc = D3DSURFACE_DESC::default();
        unsafe { self.texture.GetLevelDesc(0, &mut desc) }
            .map_err(|e| gpu_error("GetLevelDesc", e))?;
        Ok(SurfaceDesc {
            width: desc.Width,
            height: desc.Height,
            format: TexelFormat::from_d3d9(desc.Format.0),
        })
    }

    unsafe fn lock(&mut self) -> Result<MappedRows> {
        let mut locked = D3DLOCKED_RECT::default();
        unsafe { self.texture.LockRect(0, &mut locked, std::ptr::null(), 0) }
            .map_err(|e| gpu_error("LockRect", e))?;
        Ok(MappedRows {
            data: locked.pBits as *mut u8,
            pitch: locked.Pitch.max(0) as usize,
        })
    }

    unsafe fn unlock(&mut self) -> Result<()> {
        unsafe { self.texture.UnlockRect(0) }.map_err(|e| gpu_error("UnlockRect", e))
    }
}

impl UploadBackend for D3D9Backend {
    fn renderer(&self) -> GraphicsRenderer {
        GraphicsRenderer::D3D9
    }

    unsafe fn upload(
        &mut self,
        texture: &NativeTexture,
        frame: &FrameBuffer<'_>,
    ) -> Result<UploadOutcome> {
        let raw = texture.as_ptr();
        let Some(d3d_texture) = (unsafe { IDirect3DTexture9::from_raw_borrowed(&raw) }) else {
            return Ok(UploadOutcome::Skipped(SkipReason::NullTexture));
        };

        let mut surface = LevelZero {
            texture: d3d_texture,
        };
        unsafe { upload_mapped(&mut surface, frame) }
    }
}
