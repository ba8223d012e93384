// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! What a graphics API reports about the texture level being written.

/// Texel layout of a native texture, as far as the RGBA8 upload cares.
///
/// Only 4-byte RGBA/BGRA UNORM formats (including sRGB and typeless
/// variants) accept a packed RGBA8 frame; anything wider would make the
/// driver read past the end of the source rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexelFormat {
    Rgba8,
    /// Native format value the upload cannot write.
    Other(u32),
}

impl TexelFormat {
    /// Classify a `DXGI_FORMAT` (Direct3D 11 and 12).
    pub fn from_dxgi(format: u32) -> Self {
        match format {
            // R8G8B8A8_{TYPELESS,UNORM,UNORM_SRGB}
            27..=29
            // B8G8R8A8_UNORM, B8G8R8X8_UNORM
            | 87 | 88
            // B8G8R8A8_{TYPELESS,UNORM_SRGB}, B8G8R8X8_{TYPELESS,UNORM_SRGB}
            | 90..=93 => Self::Rgba8,
            other => Self::Other(other),
        }
    }

    /// Classify a `D3DFORMAT` (Direct3D 9).
    pub fn from_d3d9(format: u32) -> Self {
        match format {
            // A8R8G8B8, X8R8G8B8, A8B8G8R8, X8B8G8R8
            21 | 22 | 32 | 33 => Self::Rgba8,
            other => Self::Other(other),
        }
    }
}

/// Size and format of level 0 of a native texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDesc {
    pub width: u32,
    pub height: u32,
    pub format: TexelFormat,
}

impl SurfaceDesc {
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dxgi_rgba8_family() {
        for format in [27, 28, 29, 87, 88, 90, 91, 92, 93] {
            assert_eq!(TexelFormat::from_dxgi(format), TexelFormat::Rgba8, "{}", format);
        }
    }

    #[test]
    fn test_dxgi_wide_formats_rejected() {
        // R32G32B32A32_FLOAT, R16G16B16A16_FLOAT, R10G10B10A2_UNORM, R8_UNORM
        for format in [2, 10, 24, 61] {
            assert_eq!(TexelFormat::from_dxgi(format), TexelFormat::Other(format));
        }
    }

    #[test]
    fn test_d3d9_formats() {
        assert_eq!(TexelFormat::from_d3d9(21), TexelFormat::Rgba8);
        assert_eq!(TexelFormat::from_d3d9(33), TexelFormat::Rgba8);
        // D3DFMT_A16B16G16R16F
        assert_eq!(TexelFormat::from_d3d9(113), TexelFormat::Other(113));
    }
}
