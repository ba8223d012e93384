// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Upload backends for each graphics API Unity can run on.

mod opengl;

#[cfg(windows)]
mod d3d11;
#[cfg(windows)]
mod d3d12;
#[cfg(windows)]
mod d3d9;

pub use opengl::OpenGlBackend;

#[cfg(windows)]
pub use d3d9::D3D9Backend;
#[cfg(windows)]
pub use d3d11::D3D11Backend;

use unitex::{
    DiscardBackend, GraphicsRenderer, Result, UnitexConfig, UnitexError, UploadBackend, UploadPath,
};
use unitex_unity_abi::UnityInterfaces;

/// Build the backend for `renderer`.
///
/// `Ok(None)` means the renderer has no upload path (Metal, Vulkan) and
/// updates will be skipped.
pub fn create(
    renderer: GraphicsRenderer,
    interfaces: &UnityInterfaces,
    config: &UnitexConfig,
) -> Result<Option<Box<dyn UploadBackend>>> {
    let Some(path) = renderer.upload_path() else {
        tracing::warn!("Renderer {} has no texture upload path", renderer);
        return Ok(None);
    };

    tracing::debug!("Creating {:?} backend for {}", path, renderer);

    let backend: Box<dyn UploadBackend> = match (path, renderer) {
        (UploadPath::Discard, _) => Box::new(DiscardBackend),
        (UploadPath::Direct, r) if r.is_opengl() => Box::new(OpenGlBackend::new(r, config)?),
        _ => create_direct3d(renderer, interfaces, config)?,
    };

    Ok(Some(backend))
}

#[cfg(windows)]
fn create_direct3d(
    renderer: GraphicsRenderer,
    interfaces: &UnityInterfaces,
    config: &UnitexConfig,
) -> Result<Box<dyn UploadBackend>> {
    Ok(match renderer {
        GraphicsRenderer::D3D9 => Box::new(D3D9Backend::new(interfaces)?),
        GraphicsRenderer::D3D11 => Box::new(D3D11Backend::new(interfaces)?),
        GraphicsRenderer::D3D12 => Box::new(d3d12::create(interfaces, config)?),
        other => {
            return Err(UnitexError::NotSupported(format!(
                "{} is not a Direct3D renderer",
                other
            )));
        }
    })
}

#[cfg(not(windows))]
fn create_direct3d(
    renderer: GraphicsRenderer,
    _interfaces: &UnityInterfaces,
    _config: &UnitexConfig,
) -> Result<Box<dyn UploadBackend>> {
    Err(UnitexError::NotSupported(format!(
        "{} is only available on Windows",
        renderer
    )))
}

/// Wrap a `windows` crate error with the call that produced it.
#[cfg(windows)]
pub(crate) fn gpu_error(call: &str, e: windows::core::Error) -> UnitexError {
    UnitexError::Gpu(format!("{} failed: {}", call, e))
}
