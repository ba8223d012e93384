// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Host-agnostic core of the unitex Unity texture updater.
//!
//! Unity hands a native plugin an opaque GPU texture pointer (an
//! `IDirect3DTexture9*`, `ID3D11Texture2D*`, `ID3D12Resource*` or a GL texture
//! name) and the plugin is expected to copy CPU pixels into it on the render
//! thread. This crate holds everything about that copy that does not touch a
//! graphics API directly:
//!
//! - [`FrameBuffer`]: borrowed RGBA8 source pixels
//! - [`fill_buffer`]: row copy honouring the destination pitch
//! - [`GraphicsRenderer`]: Unity's renderer ids and which upload path each uses
//! - [`UploadBackend`]: the seam each graphics API implements
//! - [`SurfaceDesc`]: size and texel format the API reports for a texture
//! - [`upload_mapped`]: lock / copy / unlock driver for mapped surfaces
//! - [`DeferredUploader`]: command-list recording sequenced on a fence
//! - [`TextureUpdater`] and [`TextureRegistry`]: what the plugin drives per call

mod backend;
mod config;
mod copy;
mod deferred;
mod error;
mod frame;
mod mapped;
mod registry;
mod renderer;
mod resource_state;
mod surface;
mod sync;
mod texture;
mod updater;

pub use backend::{DiscardBackend, SkipReason, UploadBackend, UploadOutcome};
pub use config::UnitexConfig;
pub use copy::{FillOutcome, fill_buffer};
pub use deferred::{CommandRecorder, CopyFootprint, DeferredUploader};
pub use error::{Result, UnitexError};
pub use frame::{BYTES_PER_PIXEL, FrameBuffer, OwnedFrame};
#[cfg(any(test, feature = "test-support"))]
pub use mapped::HostTexture;
pub use mapped::{MappedRows, MappedSurface, upload_mapped};
pub use registry::TextureRegistry;
pub use renderer::{GraphicsRenderer, UploadPath};
pub use resource_state::{RESOURCE_STATE_COPY_DEST, StateTransition, plan_copy_dest_transition};
pub use surface::{SurfaceDesc, TexelFormat};
pub use sync::{FenceTracker, GpuFence};
pub use texture::{NativeTexture, TextureId};
pub use updater::TextureUpdater;
