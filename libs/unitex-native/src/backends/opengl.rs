// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! OpenGL, OpenGL Core and OpenGL ES upload via `glTexSubImage2D`.

use std::ffi::c_void;

use gl::types::{GLenum, GLint, GLsizei};
use unitex::{
    FrameBuffer, GraphicsRenderer, NativeTexture, Result, SkipReason, UnitexConfig, UnitexError,
    UploadBackend, UploadOutcome,
};

use crate::gl_loader;

pub struct OpenGlBackend {
    renderer: GraphicsRenderer,
    /// Read the texture size from the driver instead of the registration.
    query_size: bool,
}

impl OpenGlBackend {
    pub fn new(renderer: GraphicsRenderer, config: &UnitexConfig) -> Result<Self> {
        gl_loader::ensure_loaded()?;

        // ES 2/3 lack glGetTexLevelParameteriv before 3.1, and legacy GL
        // contexts are not reliably queryable from the plugin event.
        let query_size = config.query_gl_texture_size
            && renderer == GraphicsRenderer::OpenGLCore
            && gl_loader::can_query_texture_size();

        tracing::info!(
            "OpenGL backend ready for {} (size query: {})",
            renderer,
            query_size
        );
        Ok(Self {
            renderer,
            query_size,
        })
    }

    unsafe fn bound_texture_size(&self) -> (u32, u32) {
        let mut width: GLint = 0;
        let mut height: GLint = 0;
        unsafe {
            gl::GetTexLevelParameteriv(gl::TEXTURE_2D, 0, gl::TEXTURE_WIDTH, &mut width);
            gl::GetTexLevelParameteriv(gl::TEXTURE_2D, 0, gl::TEXTURE_HEIGHT, &mut height);
        }
        (width.max(0) as u32, height.max(0) as u32)
    }
}

/// Discard errors raised by earlier host GL calls.
unsafe fn drain_errors() {
    for _ in 0..16 {
        if unsafe { gl::GetError() } == gl::NO_ERROR {
            break;
        }
    }
}

unsafe fn check_error(call: &str) -> Result<()> {
    let code: GLenum = unsafe { gl::GetError() };
    if code == gl::NO_ERROR {
        return Ok(());
    }
    Err(UnitexError::Gpu(format!(
        "{} failed with GL error 0x{:04X}",
        call, code
    )))
}

impl UploadBackend for OpenGlBackend {
    fn renderer(&self) -> GraphicsRenderer {
        self.renderer
    }

    unsafe fn upload(
        &mut self,
        texture: &NativeTexture,
        frame: &FrameBuffer<'_>,
    ) -> Result<UploadOutcome> {
        // Name 0 is the default texture, never one Unity hands out.
        if texture.is_null() {
            return Ok(UploadOutcome::Skipped(SkipReason::NullTexture));
        }

        unsafe {
            drain_errors();
            gl::BindTexture(gl::TEXTURE_2D, texture.gl_name());
            check_error("glBindTexture")?;
        }

        let dimensions = if self.query_size {
            unsafe { self.bound_texture_size() }
        } else {
            texture.dimensions()
        };

        if dimensions != frame.dimensions() {
            return Ok(UploadOutcome::Skipped(SkipReason::DimensionMismatch {
                texture: dimensions,
                frame: frame.dimensions(),
            }));
        }

        let (width, height) = dimensions;
        unsafe {
            gl::TexSubImage2D(
                gl::TEXTURE_2D,
                0,
                0,
                0,
                width as GLsizei,
                height as GLsizei,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                frame.data().as_ptr() as *const c_void,
            );
            check_error("glTexSubImage2D")?;
        }

        Ok(UploadOutcome::Copied)
    }
}
