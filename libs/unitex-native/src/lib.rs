// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

// FFI cdylib: exported functions are called by Unity and C# scripts.
#![allow(clippy::missing_safety_doc)]

//! Unity native plugin that uploads CPU RGBA8 frames into Unity textures.
//!
//! Unity calls `UnityPluginLoad` / `UnityPluginUnload`. Scripts register a
//! texture's `GetNativeTexturePtr()` under an id, then either update it
//! synchronously with `unitex_texture_update` or queue a frame with
//! `unitex_texture_submit` and issue
//! `GL.IssuePluginEvent(unitex_get_render_event_func(), id)` so the upload
//! runs on Unity's render thread.
//!
//! Status codes: [`STATUS_OK`], [`STATUS_SKIPPED`], [`STATUS_ERROR`].

mod backends;
mod gl_loader;
mod logging;
mod plugin;

use std::ffi::c_void;

use unitex::{
    FrameBuffer, NativeTexture, Result, SkipReason, TextureId, UnitexError, UploadOutcome,
};
use unitex_unity_abi::{DeviceEventType, IUnityInterfaces, UnityRenderingEvent};

/// Pixels were written (or queued, for submit).
pub const STATUS_OK: i32 = 0;
/// Nothing was written: null buffer, null texture, unmapped texture memory,
/// unsupported texel format, size mismatch or no upload path for the renderer.
pub const STATUS_SKIPPED: i32 = 1;
/// The call failed; details are in the log.
pub const STATUS_ERROR: i32 = -1;

fn status(call: &str, result: Result<UploadOutcome>) -> i32 {
    match result {
        Ok(UploadOutcome::Copied) => STATUS_OK,
        Ok(UploadOutcome::Skipped(_)) => STATUS_SKIPPED,
        Err(e) => {
            tracing::error!("{}: {}", call, e);
            STATUS_ERROR
        }
    }
}

fn dimensions(width: i32, height: i32) -> Result<(u32, u32)> {
    match (u32::try_from(width), u32::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(UnitexError::Frame(format!(
            "invalid frame size {}x{}",
            width, height
        ))),
    }
}

// ============================================================================
// Unity plugin entry points
// ============================================================================

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "system" fn UnityPluginLoad(interfaces: *mut IUnityInterfaces) {
    if let Err(e) = unsafe { plugin::load(interfaces) } {
        tracing::error!("UnityPluginLoad: {}", e);
    }
}

#[unsafe(no_mangle)]
#[allow(non_snake_case)]
pub unsafe extern "system" fn UnityPluginUnload() {
    plugin::unload();
}

pub(crate) unsafe extern "system" fn on_graphics_device_event(event_type: i32) {
    match DeviceEventType::from_raw(event_type) {
        Some(event) => plugin::handle_device_event(event),
        None => tracing::debug!("Ignoring unknown device event {}", event_type),
    }
}

unsafe extern "system" fn on_render_event(event_id: i32) {
    match plugin::apply_pending(TextureId(event_id)) {
        Ok(Some(outcome)) => tracing::trace!("Render event {}: {:?}", event_id, outcome),
        Ok(None) => {}
        Err(e) => tracing::error!("Render event {}: {}", event_id, e),
    }
}

// ============================================================================
// C ABI: texture registry
// ============================================================================

/// Register `texture` (from `Texture.GetNativeTexturePtr()`) under `id`.
///
/// Returns 0 on success, -1 on failure.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn unitex_texture_register(
    id: i32,
    texture: *mut c_void,
    width: i32,
    height: i32,
) -> i32 {
    let result = dimensions(width, height).and_then(|(w, h)| {
        plugin::register_texture(TextureId(id), NativeTexture::new(texture, w, h))
    });
    match result {
        Ok(()) => STATUS_OK,
        Err(e) => {
            tracing::error!("unitex_texture_register: {}", e);
            STATUS_ERROR
        }
    }
}

/// Forget texture `id` and any frame queued for it.
///
/// Returns 0 on success, -1 if `id` was not registered.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn unitex_texture_unregister(id: i32) -> i32 {
    match plugin::unregister_texture(TextureId(id)) {
        Ok(()) => STATUS_OK,
        Err(e) => {
            tracing::warn!("unitex_texture_unregister: {}", e);
            STATUS_ERROR
        }
    }
}

// ============================================================================
// C ABI: uploads
// ============================================================================

/// Copy `width * height` RGBA8 pixels into texture `id` immediately.
///
/// Must be called on the render thread. A null `pixels` is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn unitex_texture_update(
    id: i32,
    pixels: *const u8,
    width: i32,
    height: i32,
) -> i32 {
    let result = dimensions(width, height).and_then(|(w, h)| {
        let frame = unsafe { FrameBuffer::from_raw_parts(pixels, w, h) }?;
        unsafe { plugin::update_texture(TextureId(id), frame.as_ref()) }
    });
    status("unitex_texture_update", result)
}

/// Copy the pixels into a pending slot for texture `id`. The upload happens
/// when the render event for `id` runs. A null `pixels` is a no-op.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn unitex_texture_submit(
    id: i32,
    pixels: *const u8,
    width: i32,
    height: i32,
) -> i32 {
    let result = dimensions(width, height).and_then(|(w, h)| {
        let Some(frame) = (unsafe { FrameBuffer::from_raw_parts(pixels, w, h) })? else {
            return Ok(UploadOutcome::Skipped(SkipReason::NoFrame));
        };
        plugin::submit_texture(TextureId(id), frame.to_owned_frame())
            .map(|()| UploadOutcome::Copied)
    });
    status("unitex_texture_submit", result)
}

/// Callback for `GL.IssuePluginEvent`; the event id is the texture id.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn unitex_get_render_event_func() -> UnityRenderingEvent {
    on_render_event
}

// ============================================================================
// C ABI: queries
// ============================================================================

/// `UnityGfxRenderer` of the current device, -1 when there is none.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn unitex_renderer() -> i32 {
    plugin::renderer().map_or(-1, |r| r.as_raw())
}

/// Last fence value signalled by the Direct3D 12 backend, 0 otherwise.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn unitex_fence_value() -> u64 {
    plugin::fence_value()
}
