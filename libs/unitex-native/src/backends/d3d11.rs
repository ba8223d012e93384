// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Direct3D 11 upload through `UpdateSubresource` on the immediate context.

use std::ffi::c_void;

use windows::Win32::Graphics::Direct3D11::{D3D11_TEXTURE2D_DESC, ID3D11Device, ID3D11Texture2D};
use windows::core::Interface;

use unitex::{
    FrameBuffer, GraphicsRenderer, NativeTexture, Result, SkipReason, TexelFormat, UnitexError,
    UploadBackend, UploadOutcome,
};
use unitex_unity_abi::{IUnityGraphicsD3D11, UnityInterfaces};

use super::gpu_error;

pub struct D3D11Backend {
    device: ID3D11Device,
}

// Unity's device is only used from the render thread the plugin is called on.
unsafe impl Send for D3D11Backend {}

impl D3D11Backend {
    pub fn new(interfaces: &UnityInterfaces) -> Result<Self> {
        let d3d11 = interfaces
            .get::<IUnityGraphicsD3D11>()
            .ok_or_else(|| UnitexError::NotSupported("IUnityGraphicsD3D11 unavailable".into()))?;

        let raw = unsafe { (d3d11.get_device)() };
        let device = unsafe { ID3D11Device::from_raw_borrowed(&raw) }
            .cloned()
            .ok_or_else(|| UnitexError::Gpu("Unity returned a null D3D11 device".into()))?;

        tracing::info!("Direct3D 11 backend ready");
        Ok(Self { device })
    }
}

impl UploadBackend for D3D11Backend {
    fn renderer(&self) -> GraphicsRenderer {
        GraphicsRenderer::D3D11
    }

    unsafe fn upload(
        &mut self,
        texture: &NativeTexture,
        frame: &FrameBuffer<'_>,
    ) -> Result<UploadOutcome> {
        let raw = texture.as_ptr();
        let Some(d3d_texture) = (unsafe { ID3D11Texture2D::from_raw_borrowed(&raw) }) else {
            return Ok(UploadOutcome::Skipped(SkipReason::NullTexture));
        };

        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { d3d_texture.GetDesc(&mut desc) };
        // UpdateSubresource reads rows of the texture's texel size, not ours.
        if let TexelFormat::Other(format) = TexelFormat::from_dxgi(desc.Format.0 as u32) {
            return Ok(UploadOutcome::Skipped(SkipReason::UnsupportedFormat(format)));
        }
        if (desc.Width, desc.Height) != frame.dimensions() {
            return Ok(UploadOutcome::Skipped(SkipReason::DimensionMismatch {
                texture: (desc.Width, desc.Height),
                frame: frame.dimensions(),
            }));
        }

        // Released when `context` drops at the end of the call.
        let context = unsafe { self.device.GetImmediateContext() }
            .map_err(|e| gpu_error("GetImmediateContext", e))?;

        unsafe {
            context.UpdateSubresource(
                d3d_texture,
                0,
                None,
                frame.data().as_ptr() as *const c_void,
                frame.pitch() as u32,
                0,
            );
        }

        Ok(UploadOutcome::Copied)
    }
}
