// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Texture update entry point driven by the plugin.

use crate::{
    FrameBuffer, GraphicsRenderer, NativeTexture, Result, SkipReason, UploadBackend, UploadOutcome,
};

/// Copies frames into native textures through the active backend.
pub struct TextureUpdater {
    backend: Box<dyn UploadBackend>,
}

impl TextureUpdater {
    pub fn new(backend: Box<dyn UploadBackend>) -> Self {
        Self { backend }
    }

    pub fn renderer(&self) -> GraphicsRenderer {
        self.backend.renderer()
    }

    pub fn fence_value(&self) -> u64 {
        self.backend.fence_value()
    }

    /// Copy `frame` into `texture`.
    ///
    /// `None` is the host's null buffer: nothing is touched and the backend is
    /// not called.
    ///
    /// # Safety
    ///
    /// See [`UploadBackend::upload`].
    pub unsafe fn update(
        &mut self,
        texture: &NativeTexture,
        frame: Option<&FrameBuffer<'_>>,
    ) -> Result<UploadOutcome> {
        let Some(frame) = frame else {
            tracing::trace!("No source buffer, skipping update");
            return Ok(UploadOutcome::Skipped(SkipReason::NoFrame));
        };

        let outcome = unsafe { self.backend.upload(texture, frame) }?;

        match outcome {
            UploadOutcome::Copied => tracing::trace!(
                "[{}] uploaded {}x{} frame",
                self.backend.renderer(),
                frame.width(),
                frame.height()
            ),
            UploadOutcome::Skipped(SkipReason::DimensionMismatch {
                texture: (tex_w, tex_h),
                frame: (src_w, src_h),
            }) => {
                tracing::warn!(
                    "[{}] frame is {}x{} but texture is {}x{}, not copied",
                    self.backend.renderer(),
                    src_w,
                    src_h,
                    tex_w,
                    tex_h
                )
            }
            UploadOutcome::Skipped(reason) => {
                tracing::debug!("[{}] update skipped: {:?}", self.backend.renderer(), reason)
            }
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for TextureUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureUpdater")
            .field("renderer", &self.backend.renderer())
            .finish()
    }
}
