// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Direct3D 12 command recording for `DeferredUploader`: a plugin-owned
//! allocator, list and upload buffer, executed on Unity's queue.

use std::ffi::c_void;
use std::mem::ManuallyDrop;
use std::time::Duration;

use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0, WAIT_TIMEOUT};
use windows::Win32::Graphics::Direct3D12::{
    D3D12_COMMAND_LIST_TYPE_DIRECT, D3D12_FENCE_FLAG_NONE, D3D12_HEAP_FLAG_NONE,
    D3D12_HEAP_PROPERTIES, D3D12_HEAP_TYPE_UPLOAD, D3D12_PLACED_SUBRESOURCE_FOOTPRINT,
    D3D12_RESOURCE_BARRIER, D3D12_RESOURCE_BARRIER_0, D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
    D3D12_RESOURCE_BARRIER_FLAG_NONE, D3D12_RESOURCE_BARRIER_TYPE_TRANSITION, D3D12_RESOURCE_DESC,
    D3D12_RESOURCE_DIMENSION_BUFFER, D3D12_RESOURCE_FLAG_NONE, D3D12_RESOURCE_STATE_GENERIC_READ,
    D3D12_RESOURCE_STATES, D3D12_RESOURCE_TRANSITION_BARRIER, D3D12_TEXTURE_COPY_LOCATION,
    D3D12_TEXTURE_COPY_LOCATION_0, D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT,
    D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX, D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
    ID3D12CommandAllocator, ID3D12CommandList, ID3D12CommandQueue, ID3D12Device, ID3D12Fence,
    ID3D12GraphicsCommandList, ID3D12PipelineState, ID3D12Resource,
};
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC};
use windows::Win32::System::Threading::{CreateEventW, INFINITE, WaitForSingleObject};
use windows::core::Interface;

use unitex::{
    CommandRecorder, CopyFootprint, DeferredUploader, FillOutcome, GpuFence, NativeTexture,
    Result, StateTransition, SurfaceDesc, TexelFormat, UnitexConfig, UnitexError,
};
use unitex_unity_abi::{IUnityGraphicsD3D12, UnityInterfaces};

use super::gpu_error;

/// Plugin fence plus the event used to wait on it.
pub struct D3D12Fence {
    fence: ID3D12Fence,
    queue: ID3D12CommandQueue,
    event: HANDLE,
}

impl D3D12Fence {
    fn new(device: &ID3D12Device, queue: ID3D12CommandQueue) -> Result<Self> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }
            .map_err(|e| gpu_error("CreateFence", e))?;
        let event = unsafe { CreateEventW(None, false, false, None) }
            .map_err(|e| gpu_error("CreateEventW", e))?;
        Ok(Self {
            fence,
            queue,
            event,
        })
    }
}

impl GpuFence for D3D12Fence {
    fn completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    fn wait_for(&self, value: u64, timeout: Option<Duration>) -> Result<()> {
        unsafe { self.fence.SetEventOnCompletion(value, self.event) }
            .map_err(|e| gpu_error("SetEventOnCompletion", e))?;

        let millis = timeout.map_or(INFINITE, |t| t.as_millis().min(u32::MAX as u128 - 1) as u32);
        let status = unsafe { WaitForSingleObject(self.event, millis) };
        if status == WAIT_OBJECT_0 {
            Ok(())
        } else if status == WAIT_TIMEOUT {
            Err(UnitexError::Gpu(format!(
                "Timed out after {}ms waiting for fence value {}",
                millis, value
            )))
        } else {
            Err(UnitexError::Gpu(format!(
                "WaitForSingleObject returned {:?} for fence value {}",
                status, value
            )))
        }
    }

    fn signal(&self, value: u64) -> Result<()> {
        unsafe { self.queue.Signal(&self.fence, value) }.map_err(|e| gpu_error("Signal", e))
    }
}

impl Drop for D3D12Fence {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.event) } {
            tracing::warn!("Failed to close fence event: {}", e);
        }
    }
}

/// Upload heap buffer reused while it is large enough.
struct UploadBuffer {
    resource: ID3D12Resource,
    size: u64,
}

pub struct D3D12Recorder {
    unity: &'static IUnityGraphicsD3D12,
    device: ID3D12Device,
    queue: ID3D12CommandQueue,
    allocator: ID3D12CommandAllocator,
    list: ID3D12GraphicsCommandList,
    fence: D3D12Fence,
    upload: Option<UploadBuffer>,
    /// Footprint of the texture last passed to `describe`.
    footprint: D3D12_PLACED_SUBRESOURCE_FOOTPRINT,
}

// All D3D12 objects here are only touched from the render thread.
unsafe impl Send for D3D12Recorder {}

/// The Direct3D 12 upload backend.
pub type D3D12Backend = DeferredUploader<D3D12Recorder>;

/// Build the Direct3D 12 backend on Unity's device and queue.
pub fn create(interfaces: &UnityInterfaces, config: &UnitexConfig) -> Result<D3D12Backend> {
    let recorder = D3D12Recorder::new(interfaces)?;
    tracing::info!(
        "Direct3D 12 backend ready (fence timeout: {:?})",
        config.fence_timeout()
    );
    Ok(DeferredUploader::new(recorder, config.fence_timeout()))
}

impl D3D12Recorder {
    pub fn new(interfaces: &UnityInterfaces) -> Result<Self> {
        let unity = interfaces
            .get::<IUnityGraphicsD3D12>()
            .ok_or_else(|| UnitexError::NotSupported("IUnityGraphicsD3D12 unavailable".into()))?;

        let raw_device = unsafe { (unity.get_device)() };
        let device = unsafe { ID3D12Device::from_raw_borrowed(&raw_device) }
            .cloned()
            .ok_or_else(|| UnitexError::Gpu("Unity returned a null D3D12 device".into()))?;

        let raw_queue = unsafe { (unity.get_command_queue)() };
        let queue = unsafe { ID3D12CommandQueue::from_raw_borrowed(&raw_queue) }
            .cloned()
            .ok_or_else(|| UnitexError::Gpu("Unity returned a null D3D12 queue".into()))?;

        let allocator: ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }
                .map_err(|e| gpu_error("CreateCommandAllocator", e))?;

        let list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(
                0,
                D3D12_COMMAND_LIST_TYPE_DIRECT,
                &allocator,
                None::<&ID3D12PipelineState>,
            )
        }
        .map_err(|e| gpu_error("CreateCommandList", e))?;

        // Lists are created open; the first update resets it.
        unsafe { list.Close() }.map_err(|e| gpu_error("Close", e))?;

        let fence = D3D12Fence::new(&device, queue.clone())?;

        Ok(Self {
            unity,
            device,
            queue,
            allocator,
            list,
            fence,
            upload: None,
            footprint: D3D12_PLACED_SUBRESOURCE_FOOTPRINT::default(),
        })
    }

    fn upload_buffer(&mut self, size: u64) -> Result<ID3D12Resource> {
        if let Some(buffer) = self.upload.as_ref().filter(|b| b.size >= size) {
            return Ok(buffer.resource.clone());
        }

        let heap = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_UPLOAD,
            ..Default::default()
        };
        let desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
            Alignment: 0,
            Width: size,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: DXGI_FORMAT_UNKNOWN,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            Flags: D3D12_RESOURCE_FLAG_NONE,
        };

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            self.device.CreateCommittedResource(
                &heap,
                D3D12_HEAP_FLAG_NONE,
                &desc,
                D3D12_RESOURCE_STATE_GENERIC_READ,
                None,
                &mut resource,
            )
        }
        .map_err(|e| gpu_error("CreateCommittedResource", e))?;

        let resource = resource
            .ok_or_else(|| UnitexError::Gpu("CreateCommittedResource returned nothing".into()))?;

        tracing::debug!("Allocated {} byte upload buffer", size);
        self.upload = Some(UploadBuffer {
            resource: resource.clone(),
            size,
        });
        Ok(resource)
    }
}

/// Take a reference to the resource behind `texture`.
///
/// # Safety
///
/// `texture` must be null or a live `ID3D12Resource`.
unsafe fn resource(texture: &NativeTexture) -> Result<ID3D12Resource> {
    let raw = texture.as_ptr();
    unsafe { ID3D12Resource::from_raw_borrowed(&raw) }
        .cloned()
        .ok_or_else(|| UnitexError::Texture("null D3D12 resource".into()))
}

/// Borrowing transition barrier; `pResource` holds no reference.
fn transition_barrier(
    resource: &ID3D12Resource,
    transition: StateTransition,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                StateBefore: D3D12_RESOURCE_STATES(transition.before),
                StateAfter: D3D12_RESOURCE_STATES(transition.after),
            }),
        },
    }
}

impl CommandRecorder for D3D12Recorder {
    type Fence = D3D12Fence;

    fn fence(&self) -> &D3D12Fence {
        &self.fence
    }

    unsafe fn describe(&mut self, texture: &NativeTexture) -> Result<(SurfaceDesc, CopyFootprint)> {
        let resource = unsafe { resource(texture)? };
        let desc = unsafe { resource.GetDesc() };

        let mut footprint = D3D12_PLACED_SUBRESOURCE_FOOTPRINT::default();
        let mut total_bytes = 0u64;
        unsafe {
            self.device.GetCopyableFootprints(
                &desc,
                0,
                1,
                0,
                Some(&mut footprint),
                None,
                None,
                Some(&mut total_bytes),
            );
        }
        self.footprint = footprint;

        let surface = SurfaceDesc {
            width: u32::try_from(desc.Width).unwrap_or(u32::MAX),
            height: desc.Height,
            format: TexelFormat::from_dxgi(desc.Format.0 as u32),
        };
        let layout = CopyFootprint {
            row_pitch: footprint.Footprint.RowPitch as usize,
            total_bytes: usize::try_from(total_bytes).map_err(|_| {
                UnitexError::Texture(format!("{} byte upload does not fit in memory", total_bytes))
            })?,
        };
        Ok((surface, layout))
    }

    fn write_staging(
        &mut self,
        footprint: &CopyFootprint,
        fill: &mut dyn FnMut(&mut [u8]) -> Result<FillOutcome>,
    ) -> Result<Option<FillOutcome>> {
        let upload = self.upload_buffer(footprint.total_bytes as u64)?;

        let mut mapped: *mut c_void = std::ptr::null_mut();
        unsafe { upload.Map(0, None, Some(&mut mapped)) }.map_err(|e| gpu_error("Map", e))?;
        let filled = if mapped.is_null() {
            None
        } else {
            // SAFETY: the buffer holds at least `total_bytes` mapped bytes.
            let dst = unsafe {
                std::slice::from_raw_parts_mut(mapped as *mut u8, footprint.total_bytes)
            };
            Some(fill(dst))
        };
        unsafe { upload.Unmap(0, None) };
        filled.transpose()
    }

    fn reset(&mut self) -> Result<()> {
        unsafe {
            self.allocator
                .Reset()
                .map_err(|e| gpu_error("ID3D12CommandAllocator::Reset", e))?;
            self.list
                .Reset(&self.allocator, None::<&ID3D12PipelineState>)
                .map_err(|e| gpu_error("ID3D12GraphicsCommandList::Reset", e))
        }
    }

    unsafe fn resource_state(&self, texture: &NativeTexture) -> Option<i32> {
        let mut state = 0i32;
        unsafe { (self.unity.get_resource_state)(texture.as_ptr(), &mut state) }.then_some(state)
    }

    unsafe fn set_resource_state(&mut self, texture: &NativeTexture, state: i32) {
        unsafe { (self.unity.set_resource_state)(texture.as_ptr(), state) };
    }

    unsafe fn record_barrier(
        &mut self,
        texture: &NativeTexture,
        transition: StateTransition,
    ) -> Result<()> {
        let resource = unsafe { resource(texture)? };
        unsafe {
            self.list
                .ResourceBarrier(&[transition_barrier(&resource, transition)])
        };
        Ok(())
    }

    unsafe fn copy_to_texture(
        &mut self,
        texture: &NativeTexture,
        _footprint: &CopyFootprint,
    ) -> Result<()> {
        let resource = unsafe { resource(texture)? };
        let upload = self
            .upload
            .as_ref()
            .map(|b| b.resource.clone())
            .ok_or_else(|| UnitexError::Gpu("copy recorded without an upload buffer".into()))?;

        let dst = D3D12_TEXTURE_COPY_LOCATION {
            pResource: unsafe { std::mem::transmute_copy(&resource) },
            Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
            Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                SubresourceIndex: 0,
            },
        };
        let src = D3D12_TEXTURE_COPY_LOCATION {
            pResource: unsafe { std::mem::transmute_copy(&upload) },
            Type: D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT,
            Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                PlacedFootprint: self.footprint,
            },
        };

        unsafe { self.list.CopyTextureRegion(&dst, 0, 0, 0, &src, None) };
        Ok(())
    }

    fn execute(&mut self) -> Result<()> {
        unsafe {
            self.list.Close().map_err(|e| gpu_error("Close", e))?;
            let list: ID3D12CommandList = self
                .list
                .cast()
                .map_err(|e| gpu_error("QueryInterface(ID3D12CommandList)", e))?;
            self.queue.ExecuteCommandLists(&[Some(list)]);
        }
        Ok(())
    }
}
