// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Uploads recorded on a reusable command list and executed on the host's
//! queue, as Direct3D 12 requires.
//!
//! The recorder owns one allocator, one list and one staging buffer, all
//! reused across updates. [`DeferredUploader`] guards that reuse with a
//! [`FenceTracker`]: every update first waits for the value signalled by the
//! previous one, and signals a new value whether or not it recorded a copy.

use crate::{
    FenceTracker, FillOutcome, FrameBuffer, GpuFence, GraphicsRenderer, NativeTexture, Result,
    SkipReason, StateTransition, SurfaceDesc, UploadBackend, UploadOutcome, fill_buffer,
    plan_copy_dest_transition,
};
use std::time::Duration;

/// Layout of level 0 in the staging buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyFootprint {
    /// Staging bytes between row starts, aligned as the API requires.
    pub row_pitch: usize,
    /// Staging bytes the copy reads.
    pub total_bytes: usize,
}

/// Command list, staging memory and queue of one graphics device.
///
/// Calls arrive in recording order: `describe`, `write_staging`, `reset`,
/// then an optional barrier, `copy_to_texture` and `execute`. `reset` and
/// `write_staging` are only called once the fence has reached every value
/// signalled so far.
pub trait CommandRecorder {
    type Fence: GpuFence;

    /// Fence signalled on the queue `execute` submits to.
    fn fence(&self) -> &Self::Fence;

    /// Size and format of level 0, and where its pixels go in staging memory.
    ///
    /// # Safety
    ///
    /// `texture` must be a live, non-null resource of this device.
    unsafe fn describe(&mut self, texture: &NativeTexture) -> Result<(SurfaceDesc, CopyFootprint)>;

    /// Map at least `footprint.total_bytes` of staging memory and hand it to
    /// `fill`. `None` if the driver mapped nothing.
    fn write_staging(
        &mut self,
        footprint: &CopyFootprint,
        fill: &mut dyn FnMut(&mut [u8]) -> Result<FillOutcome>,
    ) -> Result<Option<FillOutcome>>;

    /// Reset the allocator and reopen the list.
    fn reset(&mut self) -> Result<()>;

    /// State the host will have left `texture` in, `None` if untracked.
    ///
    /// # Safety
    ///
    /// As for [`describe`](CommandRecorder::describe).
    unsafe fn resource_state(&self, texture: &NativeTexture) -> Option<i32>;

    /// Tell the host which state `texture` is in after the list executes.
    ///
    /// # Safety
    ///
    /// As for [`describe`](CommandRecorder::describe).
    unsafe fn set_resource_state(&mut self, texture: &NativeTexture, state: i32);

    /// # Safety
    ///
    /// As for [`describe`](CommandRecorder::describe).
    unsafe fn record_barrier(
        &mut self,
        texture: &NativeTexture,
        transition: StateTransition,
    ) -> Result<()>;

    /// # Safety
    ///
    /// As for [`describe`](CommandRecorder::describe).
    unsafe fn copy_to_texture(
        &mut self,
        texture: &NativeTexture,
        footprint: &CopyFootprint,
    ) -> Result<()>;

    /// Close the list and submit it to the queue.
    fn execute(&mut self) -> Result<()>;
}

/// [`UploadBackend`] sequencing a [`CommandRecorder`] against its fence.
pub struct DeferredUploader<R: CommandRecorder> {
    recorder: R,
    tracker: FenceTracker,
}

impl<R: CommandRecorder> DeferredUploader<R> {
    /// `timeout` bounds every CPU wait on the fence; `None` waits forever.
    pub fn new(recorder: R, timeout: Option<Duration>) -> Self {
        Self {
            recorder,
            tracker: FenceTracker::new(timeout),
        }
    }

    /// Record and execute the copy. The fence is signalled by the caller.
    unsafe fn record(
        &mut self,
        texture: &NativeTexture,
        frame: &FrameBuffer<'_>,
    ) -> Result<UploadOutcome> {
        if texture.is_null() {
            return Ok(UploadOutcome::Skipped(SkipReason::NullTexture));
        }

        let (desc, footprint) = unsafe { self.recorder.describe(texture)? };
        if let crate::TexelFormat::Other(format) = desc.format {
            return Ok(UploadOutcome::Skipped(SkipReason::UnsupportedFormat(format)));
        }
        if desc.dimensions() != frame.dimensions() {
            return Ok(UploadOutcome::mismatch(desc.dimensions(), frame.dimensions()));
        }

        let filled = self.recorder.write_staging(&footprint, &mut |dst: &mut [u8]| {
            fill_buffer(dst, footprint.row_pitch, frame, desc.width, desc.height)
        })?;
        match filled {
            None => return Ok(UploadOutcome::Skipped(SkipReason::NoDestination)),
            Some(FillOutcome::DimensionMismatch {
                destination,
                source,
            }) => return Ok(UploadOutcome::mismatch(destination, source)),
            Some(FillOutcome::Copied { .. }) => {}
        }

        self.recorder.reset()?;

        if let Some(transition) =
            plan_copy_dest_transition(unsafe { self.recorder.resource_state(texture) })
        {
            unsafe {
                self.recorder.record_barrier(texture, transition)?;
                self.recorder.set_resource_state(texture, transition.after);
            }
        }

        unsafe { self.recorder.copy_to_texture(texture, &footprint)? };
        self.recorder.execute()?;

        Ok(UploadOutcome::Copied)
    }
}

impl<R: CommandRecorder + Send> UploadBackend for DeferredUploader<R> {
    fn renderer(&self) -> GraphicsRenderer {
        GraphicsRenderer::D3D12
    }

    unsafe fn upload(
        &mut self,
        texture: &NativeTexture,
        frame: &FrameBuffer<'_>,
    ) -> Result<UploadOutcome> {
        self.tracker.wait_idle(self.recorder.fence())?;

        let outcome = unsafe { self.record(texture, frame) };

        // Signalled whether or not anything was recorded.
        let value = self.tracker.advance(self.recorder.fence())?;
        tracing::trace!("Signalled fence value {}", value);

        outcome
    }

    fn fence_value(&self) -> u64 {
        self.tracker.value()
    }
}

impl<R: CommandRecorder> Drop for DeferredUploader<R> {
    fn drop(&mut self) {
        // The allocator and staging buffer may still be in flight.
        if let Err(e) = self.tracker.wait_idle(self.recorder.fence()) {
            tracing::warn!("Dropping deferred uploader before the GPU finished: {}", e);
        }
    }
}
