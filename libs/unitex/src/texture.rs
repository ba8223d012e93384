// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Unity-owned native texture handles.

use std::ffi::c_void;

/// Key a script uses to refer to a registered texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub i32);

impl std::fmt::Display for TextureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "texture#{}", self.0)
    }
}

/// Opaque GPU texture from `Texture.GetNativeTexturePtr()`.
///
/// What the pointer means depends on the renderer: `IDirect3DTexture9*`,
/// `ID3D11Texture2D*`, `ID3D12Resource*`, or on OpenGL the texture name
/// stored in the pointer value. The plugin never owns or releases it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct NativeTexture {
    handle: *mut c_void,
    width: u32,
    height: u32,
}

impl NativeTexture {
    pub fn new(handle: *mut c_void, width: u32, height: u32) -> Self {
        Self {
            handle,
            width,
            height,
        }
    }

    pub fn is_null(&self) -> bool {
        self.handle.is_null()
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.handle
    }

    /// GL texture name carried in the pointer value.
    pub fn gl_name(&self) -> u32 {
        self.handle as usize as u32
    }

    /// Size the script registered the texture with.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl std::fmt::Debug for NativeTexture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeTexture")
            .field("handle", &self.handle)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

// NativeTexture is only an address; the host keeps the object alive and all
// API calls on it happen on the render thread.
unsafe impl Send for NativeTexture {}
unsafe impl Sync for NativeTexture {}
