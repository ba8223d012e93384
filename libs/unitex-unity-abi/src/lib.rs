// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! ABI mirrors of Unity's native plugin interface.
//!
//! Unity passes `IUnityInterfaces*` to `UnityPluginLoad`. Every other
//! interface is fetched from it by a 128-bit GUID and is a plain table of
//! function pointers. Only the leading entries this plugin calls are
//! declared; tables are always accessed through Unity's pointer, so the
//! shorter Rust struct is a valid prefix view.
//!
//! All function pointers use `extern "system"`, which is `__stdcall` on
//! 32-bit Windows and the C convention everywhere else, matching
//! `UNITY_INTERFACE_API`.

use std::ffi::c_void;
use std::ptr::NonNull;

use unitex::GraphicsRenderer;

/// `UnityInterfaceGUID`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnityInterfaceGuid {
    pub high: u64,
    pub low: u64,
}

impl UnityInterfaceGuid {
    pub const fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }
}

/// An interface table Unity hands out by GUID.
pub trait UnityInterface {
    const GUID: UnityInterfaceGuid;
}

/// `IUnityInterfaces`.
#[repr(C)]
pub struct IUnityInterfaces {
    pub get_interface: unsafe extern "system" fn(guid: UnityInterfaceGuid) -> *mut c_void,
    pub register_interface: unsafe extern "system" fn(guid: UnityInterfaceGuid, ptr: *mut c_void),
    pub get_interface_split: unsafe extern "system" fn(high: u64, low: u64) -> *mut c_void,
    pub register_interface_split:
        unsafe extern "system" fn(high: u64, low: u64, ptr: *mut c_void),
}

/// `IUnityGraphicsDeviceEventCallback`.
pub type GraphicsDeviceEventCallback = unsafe extern "system" fn(event_type: i32);

/// `UnityRenderingEvent`, the callback `GL.IssuePluginEvent` and
/// `CommandBuffer.IssuePluginEvent` invoke on the render thread.
pub type UnityRenderingEvent = unsafe extern "system" fn(event_id: i32);

/// `IUnityGraphics`.
#[repr(C)]
pub struct IUnityGraphics {
    pub get_renderer: unsafe extern "system" fn() -> i32,
    pub register_device_event_callback: unsafe extern "system" fn(GraphicsDeviceEventCallback),
    pub unregister_device_event_callback: unsafe extern "system" fn(GraphicsDeviceEventCallback),
    pub reserve_event_id_range: unsafe extern "system" fn(count: i32) -> i32,
}

impl UnityInterface for IUnityGraphics {
    const GUID: UnityInterfaceGuid = UnityInterfaceGuid::new(0x7CBA0A9CA4DDB544, 0x8C5AD4926EB17B11);
}

/// `IUnityGraphicsD3D9`. Pointers are `IDirect3D9*` / `IDirect3DDevice9*`.
#[repr(C)]
pub struct IUnityGraphicsD3D9 {
    pub get_d3d: unsafe extern "system" fn() -> *mut c_void,
    pub get_device: unsafe extern "system" fn() -> *mut c_void,
}

impl UnityInterface for IUnityGraphicsD3D9 {
    const GUID: UnityInterfaceGuid = UnityInterfaceGuid::new(0xE90746A523D53C4C, 0xAC825B19B6F82AC3);
}

/// `IUnityGraphicsD3D11` (leading entry only). Pointer is `ID3D11Device*`.
#[repr(C)]
pub struct IUnityGraphicsD3D11 {
    pub get_device: unsafe extern "system" fn() -> *mut c_void,
}

impl UnityInterface for IUnityGraphicsD3D11 {
    const GUID: UnityInterfaceGuid = UnityInterfaceGuid::new(0xAAB37EF87A87D748, 0xBF76967F07EFB177);
}

/// `IUnityGraphicsD3D12`.
///
/// Resource state accessors take `ID3D12Resource*` and
/// `D3D12_RESOURCE_STATES` as raw values.
#[repr(C)]
pub struct IUnityGraphicsD3D12 {
    pub get_device: unsafe extern "system" fn() -> *mut c_void,
    pub get_command_queue: unsafe extern "system" fn() -> *mut c_void,
    pub get_frame_fence: unsafe extern "system" fn() -> *mut c_void,
    pub get_next_frame_fence_value: unsafe extern "system" fn() -> u64,
    /// State the resource will be in after the command lists Unity queued
    /// before this plugin call have executed. Returns `false` if Unity does
    /// not track the resource.
    pub get_resource_state:
        unsafe extern "system" fn(resource: *mut c_void, out_state: *mut i32) -> bool,
    pub set_resource_state: unsafe extern "system" fn(resource: *mut c_void, state: i32),
}

impl UnityInterface for IUnityGraphicsD3D12 {
    const GUID: UnityInterfaceGuid = UnityInterfaceGuid::new(0xEF4CEC88A45F4C4C, 0xBD295B6F2A38D9DE);
}

/// `UnityGfxDeviceEventType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceEventType {
    Initialize,
    Shutdown,
    BeforeReset,
    AfterReset,
}

impl DeviceEventType {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Initialize),
            1 => Some(Self::Shutdown),
            2 => Some(Self::BeforeReset),
            3 => Some(Self::AfterReset),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> i32 {
        match self {
            Self::Initialize => 0,
            Self::Shutdown => 1,
            Self::BeforeReset => 2,
            Self::AfterReset => 3,
        }
    }
}

/// Checked handle to Unity's `IUnityInterfaces` registry.
#[derive(Clone, Copy)]
pub struct UnityInterfaces {
    raw: NonNull<IUnityInterfaces>,
}

impl UnityInterfaces {
    /// # Safety
    ///
    /// A non-null `raw` must be the registry Unity passed to
    /// `UnityPluginLoad`, valid until `UnityPluginUnload`.
    pub unsafe fn from_raw(raw: *mut IUnityInterfaces) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self { raw })
    }

    /// Fetch interface `T`, `None` if this Unity build does not provide it
    /// (e.g. the D3D12 table while running D3D11).
    pub fn get<T: UnityInterface>(&self) -> Option<&'static T> {
        // SAFETY: `from_raw` contract; Unity keeps interface tables alive
        // for the lifetime of the loaded plugin.
        unsafe {
            let table = self.raw.as_ref();
            let ptr = (table.get_interface_split)(T::GUID.high, T::GUID.low);
            (ptr as *const T).as_ref()
        }
    }

    pub fn graphics(&self) -> Option<UnityGraphics> {
        self.get::<IUnityGraphics>().map(|table| UnityGraphics { table })
    }
}

impl std::fmt::Debug for UnityInterfaces {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnityInterfaces")
            .field("raw", &self.raw)
            .finish()
    }
}

// Safety: the registry is process-global and Unity documents it as callable
// from any thread.
unsafe impl Send for UnityInterfaces {}
unsafe impl Sync for UnityInterfaces {}

/// Safe view over `IUnityGraphics`.
#[derive(Clone, Copy)]
pub struct UnityGraphics {
    table: &'static IUnityGraphics,
}

impl UnityGraphics {
    pub fn renderer(&self) -> GraphicsRenderer {
        GraphicsRenderer::from_raw(unsafe { (self.table.get_renderer)() })
    }

    pub fn register_device_event_callback(&self, callback: GraphicsDeviceEventCallback) {
        unsafe { (self.table.register_device_event_callback)(callback) }
    }

    pub fn unregister_device_event_callback(&self, callback: GraphicsDeviceEventCallback) {
        unsafe { (self.table.unregister_device_event_callback)(callback) }
    }
}

impl std::fmt::Debug for UnityGraphics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnityGraphics")
            .field("renderer", &self.renderer())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    static RENDERER: AtomicI32 = AtomicI32::new(2);
    static REGISTERED: AtomicUsize = AtomicUsize::new(0);

    unsafe extern "system" fn get_renderer() -> i32 {
        RENDERER.load(Ordering::SeqCst)
    }

    unsafe extern "system" fn register(_cb: GraphicsDeviceEventCallback) {
        REGISTERED.fetch_add(1, Ordering::SeqCst);
    }

    unsafe extern "system" fn unregister(_cb: GraphicsDeviceEventCallback) {
        REGISTERED.fetch_sub(1, Ordering::SeqCst);
    }

    unsafe extern "system" fn reserve(_count: i32) -> i32 {
        0
    }

    unsafe extern "system" fn on_event(_event: i32) {}

    static GRAPHICS: IUnityGraphics = IUnityGraphics {
        get_renderer,
        register_device_event_callback: register,
        unregister_device_event_callback: unregister,
        reserve_event_id_range: reserve,
    };

    unsafe extern "system" fn get_interface(guid: UnityInterfaceGuid) -> *mut c_void {
        unsafe { get_interface_split(guid.high, guid.low) }
    }

    unsafe extern "system" fn register_interface(_guid: UnityInterfaceGuid, _ptr: *mut c_void) {}

    unsafe extern "system" fn get_interface_split(high: u64, low: u64) -> *mut c_void {
        if UnityInterfaceGuid::new(high, low) == IUnityGraphics::GUID {
            &GRAPHICS as *const IUnityGraphics as *mut c_void
        } else {
            std::ptr::null_mut()
        }
    }

    unsafe extern "system" fn register_interface_split(_high: u64, _low: u64, _ptr: *mut c_void) {}

    static mut INTERFACES: IUnityInterfaces = IUnityInterfaces {
        get_interface,
        register_interface,
        get_interface_split,
        register_interface_split,
    };

    fn interfaces() -> UnityInterfaces {
        unsafe { UnityInterfaces::from_raw(&raw mut INTERFACES) }.unwrap()
    }

    #[test]
    fn test_null_registry_is_none() {
        assert!(unsafe { UnityInterfaces::from_raw(std::ptr::null_mut()) }.is_none());
    }

    #[test]
    fn test_graphics_lookup_and_calls() {
        let graphics = interfaces().graphics().unwrap();
        assert_eq!(graphics.renderer(), GraphicsRenderer::D3D11);

        RENDERER.store(17, Ordering::SeqCst);
        assert_eq!(graphics.renderer(), GraphicsRenderer::OpenGLCore);
        RENDERER.store(2, Ordering::SeqCst);

        graphics.register_device_event_callback(on_event);
        assert_eq!(REGISTERED.load(Ordering::SeqCst), 1);
        graphics.unregister_device_event_callback(on_event);
        assert_eq!(REGISTERED.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_interface_is_none() {
        assert!(interfaces().get::<IUnityGraphicsD3D12>().is_none());
        assert!(interfaces().get::<IUnityGraphicsD3D11>().is_none());
    }

    #[test]
    fn test_guids_are_distinct() {
        let guids = [
            IUnityGraphics::GUID,
            IUnityGraphicsD3D9::GUID,
            IUnityGraphicsD3D11::GUID,
            IUnityGraphicsD3D12::GUID,
        ];
        for (i, a) in guids.iter().enumerate() {
            for b in &guids[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_device_event_round_trip() {
        for raw in 0..4 {
            assert_eq!(DeviceEventType::from_raw(raw).unwrap().as_raw(), raw);
        }
        assert_eq!(DeviceEventType::from_raw(9), None);
    }
}
