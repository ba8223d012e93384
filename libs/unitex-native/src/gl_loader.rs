// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Runtime loading of OpenGL entry points.
//!
//! Unity owns the GL context; the plugin only needs function pointers from
//! the driver library already mapped into the process. They are resolved
//! once and shared by every backend instance.

use std::ffi::{CString, c_char, c_void};
use std::sync::OnceLock;

use libloading::Library;
use unitex::{Result, UnitexError};

type GetProcAddress = unsafe extern "system" fn(name: *const c_char) -> *const c_void;

#[cfg(windows)]
const LIBRARY_CANDIDATES: &[&str] = &["opengl32.dll"];
#[cfg(target_os = "macos")]
const LIBRARY_CANDIDATES: &[&str] = &["/System/Library/Frameworks/OpenGL.framework/OpenGL"];
#[cfg(target_os = "android")]
const LIBRARY_CANDIDATES: &[&str] = &["libGLESv3.so", "libGLESv2.so"];
#[cfg(all(unix, not(target_os = "macos"), not(target_os = "android")))]
const LIBRARY_CANDIDATES: &[&str] = &["libGL.so.1", "libGL.so", "libGLESv2.so.2", "libGLESv2.so"];

#[cfg(windows)]
const PROC_LOADERS: &[&[u8]] = &[b"wglGetProcAddress\0"];
#[cfg(target_os = "macos")]
const PROC_LOADERS: &[&[u8]] = &[];
#[cfg(not(any(windows, target_os = "macos")))]
const PROC_LOADERS: &[&[u8]] = &[
    b"glXGetProcAddressARB\0",
    b"glXGetProcAddress\0",
    b"eglGetProcAddress\0",
];

struct GlLibrary {
    // Keeps the driver mapped; `get_proc` points into it.
    library: Library,
    get_proc: Option<GetProcAddress>,
    name: &'static str,
}

impl GlLibrary {
    fn open() -> Result<Self> {
        let mut failures = Vec::new();
        for &name in LIBRARY_CANDIDATES {
            // SAFETY: system GL libraries have no unsound initializers.
            match unsafe { Library::new(name) } {
                Ok(library) => {
                    let get_proc = PROC_LOADERS.iter().find_map(|symbol| {
                        // SAFETY: every loader in the list has this signature.
                        unsafe { library.get::<GetProcAddress>(symbol) }
                            .ok()
                            .map(|f| *f)
                    });
                    return Ok(Self {
                        library,
                        get_proc,
                        name,
                    });
                }
                Err(e) => failures.push(format!("{}: {}", name, e)),
            }
        }

        Err(UnitexError::NotSupported(format!(
            "No OpenGL library could be opened ({})",
            failures.join("; ")
        )))
    }

    fn symbol(&self, name: &str) -> *const c_void {
        let Ok(c_name) = CString::new(name) else {
            return std::ptr::null();
        };

        if let Some(get_proc) = self.get_proc {
            let ptr = unsafe { get_proc(c_name.as_ptr()) };
            // wglGetProcAddress returns small sentinel values instead of null
            // for entry points exported directly by opengl32.dll.
            if !matches!(ptr as isize, -1..=3) {
                return ptr;
            }
        }

        unsafe { self.library.get::<*const c_void>(c_name.as_bytes_with_nul()) }
            .map(|sym| *sym)
            .unwrap_or(std::ptr::null())
    }
}

static GL: OnceLock<std::result::Result<&'static str, String>> = OnceLock::new();
static LIBRARY: OnceLock<GlLibrary> = OnceLock::new();

/// Resolve the GL entry points the OpenGL backend calls.
///
/// Idempotent. Fails if no GL library is present or the upload entry points
/// are missing from it.
pub fn ensure_loaded() -> Result<()> {
    let loaded = GL.get_or_init(|| {
        let library = match GlLibrary::open() {
            Ok(library) => LIBRARY.get_or_init(|| library),
            Err(e) => return Err(e.to_string()),
        };

        gl::load_with(|symbol| library.symbol(symbol));

        if !gl::TexSubImage2D::is_loaded() || !gl::BindTexture::is_loaded() {
            return Err(format!("{} does not export glTexSubImage2D", library.name));
        }

        tracing::info!(
            "Loaded OpenGL entry points from {} (proc loader: {})",
            library.name,
            library.get_proc.is_some()
        );
        Ok(library.name)
    });

    match loaded {
        Ok(_) => Ok(()),
        Err(e) => Err(UnitexError::NotSupported(e.clone())),
    }
}

/// Whether `glGetTexLevelParameteriv` is available (absent on GLES 2).
pub fn can_query_texture_size() -> bool {
    gl::GetTexLevelParameteriv::is_loaded()
}
