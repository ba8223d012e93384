// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Process-wide plugin state between `UnityPluginLoad` and
//! `UnityPluginUnload`.

use parking_lot::Mutex;
use unitex::{
    FrameBuffer, GraphicsRenderer, NativeTexture, OwnedFrame, Result, SkipReason, TextureId,
    TextureRegistry, TextureUpdater, UnitexConfig, UnitexError, UploadOutcome,
};
use unitex_unity_abi::{DeviceEventType, IUnityInterfaces, UnityGraphics, UnityInterfaces};

use crate::{backends, logging};

struct PluginState {
    interfaces: UnityInterfaces,
    graphics: UnityGraphics,
    config: UnitexConfig,
    /// Renderer of the live device, `None` between Shutdown and Initialize.
    renderer: Option<GraphicsRenderer>,
    /// `None` when there is no device or it has no upload path.
    updater: Option<TextureUpdater>,
    registry: TextureRegistry,
}

static PLUGIN: Mutex<Option<PluginState>> = parking_lot::const_mutex(None);

fn with_state<T>(f: impl FnOnce(&mut PluginState) -> Result<T>) -> Result<T> {
    let mut guard = PLUGIN.lock();
    let state = guard
        .as_mut()
        .ok_or_else(|| UnitexError::NotSupported("plugin is not loaded".into()))?;
    f(state)
}

/// `UnityPluginLoad` body.
///
/// # Safety
///
/// `raw` must be the pointer Unity passes to `UnityPluginLoad`.
pub unsafe fn load(raw: *mut IUnityInterfaces) -> Result<()> {
    let config = logging::init(|key| std::env::var(key).ok());

    let interfaces = unsafe { UnityInterfaces::from_raw(raw) }
        .ok_or_else(|| UnitexError::NotSupported("UnityPluginLoad got null interfaces".into()))?;
    let graphics = interfaces
        .graphics()
        .ok_or_else(|| UnitexError::NotSupported("IUnityGraphics unavailable".into()))?;

    {
        let mut guard = PLUGIN.lock();
        if guard.is_some() {
            tracing::warn!("UnityPluginLoad called twice, replacing previous state");
        }
        *guard = Some(PluginState {
            interfaces,
            graphics,
            config,
            renderer: None,
            updater: None,
            registry: TextureRegistry::new(),
        });
    }

    // Unity may call back synchronously; the lock must not be held here.
    graphics.register_device_event_callback(crate::on_graphics_device_event);

    // The device already exists when the plugin loads after startup.
    handle_device_event(DeviceEventType::Initialize);

    tracing::info!("unitex {} loaded", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// `UnityPluginUnload` body.
pub fn unload() {
    let Some(state) = PLUGIN.lock().take() else {
        tracing::debug!("UnityPluginUnload without a loaded plugin");
        return;
    };

    state
        .graphics
        .unregister_device_event_callback(crate::on_graphics_device_event);

    tracing::info!(
        "unitex unloaded ({} textures registered)",
        state.registry.len()
    );
}

pub fn handle_device_event(event: DeviceEventType) {
    let mut guard = PLUGIN.lock();
    let Some(state) = guard.as_mut() else {
        return;
    };

    match event {
        DeviceEventType::Initialize => {
            let renderer = state.graphics.renderer();
            tracing::info!("Graphics device initialized: {}", renderer);
            state.renderer = Some(renderer);
            state.updater = match backends::create(renderer, &state.interfaces, &state.config) {
                Ok(backend) => backend.map(TextureUpdater::new),
                Err(e) => {
                    tracing::error!("Failed to create {} backend: {}", renderer, e);
                    None
                }
            };
        }
        DeviceEventType::Shutdown => {
            tracing::info!("Graphics device shut down");
            state.updater = None;
            state.renderer = None;
        }
        DeviceEventType::BeforeReset | DeviceEventType::AfterReset => {
            tracing::debug!("Graphics device event {:?}", event);
        }
    }
}

pub fn register_texture(id: TextureId, texture: NativeTexture) -> Result<()> {
    with_state(|state| {
        tracing::debug!("Registering {} as {:?}", id, texture);
        state.registry.register(id, texture);
        Ok(())
    })
}

pub fn unregister_texture(id: TextureId) -> Result<()> {
    with_state(|state| {
        state
            .registry
            .unregister(id)
            .map(|_| ())
            .ok_or_else(|| UnitexError::NotFound(format!("{} is not registered", id)))
    })
}

fn update_with(
    state: &mut PluginState,
    texture: &NativeTexture,
    frame: Option<&FrameBuffer<'_>>,
) -> Result<UploadOutcome> {
    let Some(renderer) = state.renderer else {
        return Err(UnitexError::NotSupported("no graphics device".into()));
    };
    match state.updater.as_mut() {
        Some(updater) => unsafe { updater.update(texture, frame) },
        None => Ok(UploadOutcome::Skipped(SkipReason::Unsupported(renderer))),
    }
}

/// Copy `frame` into texture `id` now, on the calling thread.
///
/// # Safety
///
/// Must run on the thread that owns the graphics device.
pub unsafe fn update_texture(
    id: TextureId,
    frame: Option<&FrameBuffer<'_>>,
) -> Result<UploadOutcome> {
    with_state(|state| {
        let texture = state.registry.texture(id)?;
        update_with(state, &texture, frame)
    })
}

/// Queue `frame` for texture `id` until its render event fires.
pub fn submit_texture(id: TextureId, frame: OwnedFrame) -> Result<()> {
    with_state(|state| state.registry.submit(id, frame))
}

/// Render-thread side of [`submit_texture`].
pub fn apply_pending(id: TextureId) -> Result<Option<UploadOutcome>> {
    with_state(|state| {
        let Some((texture, frame)) = state.registry.take_pending(id) else {
            tracing::trace!("{}: render event with no pending frame", id);
            return Ok(None);
        };
        update_with(state, &texture, Some(&frame.as_frame())).map(Some)
    })
}

pub fn renderer() -> Option<GraphicsRenderer> {
    PLUGIN.lock().as_ref().and_then(|state| state.renderer)
}

pub fn fence_value() -> u64 {
    PLUGIN
        .lock()
        .as_ref()
        .and_then(|state| state.updater.as_ref())
        .map_or(0, TextureUpdater::fence_value)
}
