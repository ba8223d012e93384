// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Unity graphics renderer identification.
//!
//! Raw values ARE Unity's `UnityGfxRenderer` constants, so a value read from
//! `IUnityGraphics::GetRenderer` converts without a lookup table on the host
//! side.

/// Graphics API the host engine is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphicsRenderer {
    /// Legacy desktop OpenGL 2.x. `kUnityGfxRendererOpenGL = 0`
    OpenGL,
    /// `kUnityGfxRendererD3D9 = 1`
    D3D9,
    /// `kUnityGfxRendererD3D11 = 2`
    D3D11,
    /// No graphics device (batch mode, dedicated server). `kUnityGfxRendererNull = 4`
    Null,
    /// `kUnityGfxRendererOpenGLES20 = 8`
    OpenGLES20,
    /// `kUnityGfxRendererOpenGLES30 = 11`
    OpenGLES30,
    /// `kUnityGfxRendererMetal = 16`
    Metal,
    /// `kUnityGfxRendererOpenGLCore = 17`
    OpenGLCore,
    /// `kUnityGfxRendererD3D12 = 18`
    D3D12,
    /// `kUnityGfxRendererVulkan = 21`
    Vulkan,
    /// Console and future renderers this plugin does not know about.
    Other(i32),
}

/// How pixels reach the texture on a given renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadPath {
    /// Lock the texture's backing memory and copy row by row (Direct3D9).
    Mapped,
    /// One driver call uploads the whole buffer (Direct3D11, OpenGL).
    Direct,
    /// Record a copy into a command list, submit it, and signal a fence
    /// (Direct3D12).
    Deferred,
    /// There is no device; uploads are accepted and dropped.
    Discard,
}

impl GraphicsRenderer {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::OpenGL,
            1 => Self::D3D9,
            2 => Self::D3D11,
            4 => Self::Null,
            8 => Self::OpenGLES20,
            11 => Self::OpenGLES30,
            16 => Self::Metal,
            17 => Self::OpenGLCore,
            18 => Self::D3D12,
            21 => Self::Vulkan,
            other => Self::Other(other),
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            Self::OpenGL => 0,
            Self::D3D9 => 1,
            Self::D3D11 => 2,
            Self::Null => 4,
            Self::OpenGLES20 => 8,
            Self::OpenGLES30 => 11,
            Self::Metal => 16,
            Self::OpenGLCore => 17,
            Self::D3D12 => 18,
            Self::Vulkan => 21,
            Self::Other(raw) => *raw,
        }
    }

    /// Upload path for this renderer, `None` when the plugin cannot update
    /// textures on it.
    pub fn upload_path(&self) -> Option<UploadPath> {
        match self {
            Self::D3D9 => Some(UploadPath::Mapped),
            Self::D3D11 => Some(UploadPath::Direct),
            Self::OpenGL | Self::OpenGLES20 | Self::OpenGLES30 | Self::OpenGLCore => {
                Some(UploadPath::Direct)
            }
            Self::D3D12 => Some(UploadPath::Deferred),
            Self::Null => Some(UploadPath::Discard),
            Self::Metal | Self::Vulkan | Self::Other(_) => None,
        }
    }

    pub fn is_opengl(&self) -> bool {
        matches!(
            self,
            Self::OpenGL | Self::OpenGLES20 | Self::OpenGLES30 | Self::OpenGLCore
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenGL => "opengl",
            Self::D3D9 => "d3d9",
            Self::D3D11 => "d3d11",
            Self::Null => "null",
            Self::OpenGLES20 => "gles20",
            Self::OpenGLES30 => "gles30",
            Self::Metal => "metal",
            Self::OpenGLCore => "glcore",
            Self::D3D12 => "d3d12",
            Self::Vulkan => "vulkan",
            Self::Other(_) => "other",
        }
    }
}

impl std::fmt::Display for GraphicsRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(raw) => write!(f, "other({})", raw),
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_values_round_trip() {
        for raw in [0, 1, 2, 4, 8, 11, 16, 17, 18, 21, 22, 26] {
            assert_eq!(GraphicsRenderer::from_raw(raw).as_raw(), raw);
        }
        assert_eq!(GraphicsRenderer::from_raw(18), GraphicsRenderer::D3D12);
        assert_eq!(GraphicsRenderer::from_raw(22), GraphicsRenderer::Other(22));
    }

    #[test]
    fn test_upload_paths() {
        assert_eq!(GraphicsRenderer::D3D9.upload_path(), Some(UploadPath::Mapped));
        assert_eq!(GraphicsRenderer::D3D11.upload_path(), Some(UploadPath::Direct));
        assert_eq!(
            GraphicsRenderer::OpenGLCore.upload_path(),
            Some(UploadPath::Direct)
        );
        assert_eq!(
            GraphicsRenderer::D3D12.upload_path(),
            Some(UploadPath::Deferred)
        );
        assert_eq!(GraphicsRenderer::Null.upload_path(), Some(UploadPath::Discard));
        assert_eq!(GraphicsRenderer::Vulkan.upload_path(), None);
        assert_eq!(GraphicsRenderer::Other(99).upload_path(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(GraphicsRenderer::D3D11.to_string(), "d3d11");
        assert_eq!(GraphicsRenderer::OpenGLES30.to_string(), "gles30");
        assert_eq!(GraphicsRenderer::Other(25).to_string(), "other(25)");
    }
}
