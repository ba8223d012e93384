// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Per-graphics-API upload seam.

use crate::{FrameBuffer, GraphicsRenderer, NativeTexture, Result};

/// Why an update did not write any pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The host passed no source buffer.
    NoFrame,
    /// The texture handle is null.
    NullTexture,
    /// The driver mapped no memory for the texture.
    NoDestination,
    /// The texture's texels are not 4-byte RGBA8; carries the native format.
    UnsupportedFormat(u32),
    /// Source and texture sizes differ.
    DimensionMismatch {
        texture: (u32, u32),
        frame: (u32, u32),
    },
    /// The running renderer has no upload path.
    Unsupported(GraphicsRenderer),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Copied,
    Skipped(SkipReason),
}

impl UploadOutcome {
    pub fn is_copied(&self) -> bool {
        matches!(self, Self::Copied)
    }

    pub(crate) fn mismatch(texture: (u32, u32), frame: (u32, u32)) -> Self {
        Self::Skipped(SkipReason::DimensionMismatch { texture, frame })
    }
}

/// Copies a frame into a native texture using one graphics API.
///
/// Implementations exist per renderer in the plugin crate. Each one does its
/// own null and size checks because the size has to come from the API
/// (`GetLevelDesc`, `GetDesc`, `glGetTexLevelParameteriv`) where it can.
pub trait UploadBackend: Send {
    fn renderer(&self) -> GraphicsRenderer;

    /// Upload `frame` into `texture`.
    ///
    /// # Safety
    ///
    /// A non-null `texture` must be a live object of this backend's renderer,
    /// and the call must happen on the thread that owns the graphics device.
    unsafe fn upload(
        &mut self,
        texture: &NativeTexture,
        frame: &FrameBuffer<'_>,
    ) -> Result<UploadOutcome>;

    /// Last fence value signalled for deferred submission, 0 otherwise.
    fn fence_value(&self) -> u64 {
        0
    }
}

/// Backend for Unity's Null device: accepts every upload and drops it.
#[derive(Debug, Default)]
pub struct DiscardBackend;

impl UploadBackend for DiscardBackend {
    fn renderer(&self) -> GraphicsRenderer {
        GraphicsRenderer::Null
    }

    unsafe fn upload(
        &mut self,
        _texture: &NativeTexture,
        _frame: &FrameBuffer<'_>,
    ) -> Result<UploadOutcome> {
        Ok(UploadOutcome::Copied)
    }
}
