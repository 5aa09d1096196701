//! Metal backend (macOS).
//!
//! Compiles the probe kernel from source at runtime, allocates
//! `StorageModeShared` buffers, and commits one command buffer per dispatch.

use std::ptr::NonNull;

use objc2::rc::Retained;
use objc2::runtime::ProtocolObject;
use objc2_foundation::NSString;
use objc2_metal::{
    MTLBuffer, MTLCommandBuffer, MTLCommandBufferStatus, MTLCommandEncoder, MTLCommandQueue,
    MTLComputeCommandEncoder, MTLComputePipelineState, MTLCreateSystemDefaultDevice, MTLDevice,
    MTLLibrary, MTLResourceOptions, MTLSize,
};

use crate::backend::{BufferMode, ComputeBackend, DeviceInfo, WorkSize};
use crate::error::BackendError;
use crate::kernel::ProbeKernel;

pub struct MetalBuffer {
    buffer: Retained<ProtocolObject<dyn MTLBuffer>>,
    len: usize,
    mode: BufferMode,
}

/// A committed command buffer.
pub struct MetalCompletion {
    cmd: Retained<ProtocolObject<dyn MTLCommandBuffer>>,
}

pub struct MetalBackend {
    device: Retained<ProtocolObject<dyn MTLDevice>>,
    queue: Retained<ProtocolObject<dyn MTLCommandQueue>>,
    pipeline: Option<Retained<ProtocolObject<dyn MTLComputePipelineState>>>,
    params: Option<Retained<ProtocolObject<dyn MTLBuffer>>>,
    prepared: Option<ProbeKernel>,
    exact_tiling: bool,
}

impl MetalBackend {
    /// Acquire the system default device and a command queue.
    pub fn new() -> Result<Self, BackendError> {
        let device = MTLCreateSystemDefaultDevice().ok_or(BackendError::DeviceNotFound)?;
        let queue = device
            .newCommandQueue()
            .ok_or_else(|| BackendError::Dispatch("failed to create command queue".into()))?;
        Ok(Self {
            device,
            queue,
            pipeline: None,
            params: None,
            prepared: None,
            exact_tiling: false,
        })
    }

    /// Dispatch whole threadgroups only, rejecting partial tiles.
    pub fn exact_tiling(mut self, exact: bool) -> Self {
        self.exact_tiling = exact;
        self
    }

    fn shared_buffer(&self, bytes: usize) -> Option<Retained<ProtocolObject<dyn MTLBuffer>>> {
        self.device
            .newBufferWithLength_options(bytes.max(1), MTLResourceOptions::StorageModeShared)
    }

    fn shared_buffer_with<T: Copy>(
        &self,
        data: &[T],
    ) -> Option<Retained<ProtocolObject<dyn MTLBuffer>>> {
        let bytes = std::mem::size_of_val(data);
        if bytes == 0 {
            return self.shared_buffer(0);
        }
        let ptr = NonNull::new(data.as_ptr() as *mut std::ffi::c_void)?;
        unsafe {
            self.device.newBufferWithBytes_length_options(
                ptr,
                bytes,
                MTLResourceOptions::StorageModeShared,
            )
        }
    }
}

impl ComputeBackend for MetalBackend {
    type Buffer = MetalBuffer;
    type Completion = MetalCompletion;

    fn device_info(&self) -> DeviceInfo {
        let max_local_size = match &self.pipeline {
            Some(pso) => pso.maxTotalThreadsPerThreadgroup(),
            None => self.device.maxThreadsPerThreadgroup().width,
        };
        DeviceInfo {
            backend: "metal".to_string(),
            device_name: self.device.name().to_string(),
            max_local_size: Some(max_local_size),
            exact_tiling: self.exact_tiling,
        }
    }

    fn prepare_kernel(&mut self, kernel: &ProbeKernel) -> Result<(), BackendError> {
        let source = NSString::from_str(kernel.source());
        let library = self
            .device
            .newLibraryWithSource_options_error(&source, None)
            .map_err(|e| BackendError::KernelCompilation(format!("{e}")))?;

        let name = NSString::from_str(&kernel.entry_point);
        let function = library.newFunctionWithName(&name).ok_or_else(|| {
            BackendError::KernelCompilation(format!(
                "entry point '{}' not found",
                kernel.entry_point
            ))
        })?;

        let pipeline = self
            .device
            .newComputePipelineStateWithFunction_error(&function)
            .map_err(|e| BackendError::KernelCompilation(format!("{e}")))?;

        let params = self
            .shared_buffer_with(&[kernel.iterations])
            .ok_or_else(|| BackendError::Allocation {
                len: 1,
                reason: "kernel parameter buffer".into(),
            })?;

        self.pipeline = Some(pipeline);
        self.params = Some(params);
        self.prepared = Some(kernel.clone());
        Ok(())
    }

    fn allocate_buffer(&mut self, len: usize, mode: BufferMode) -> Result<MetalBuffer, BackendError> {
        let buffer = self
            .shared_buffer(len * std::mem::size_of::<f32>())
            .ok_or_else(|| BackendError::Allocation {
                len,
                reason: "newBufferWithLength returned nil".into(),
            })?;
        Ok(MetalBuffer { buffer, len, mode })
    }

    fn allocate_buffer_with_data(
        &mut self,
        data: &[f32],
        mode: BufferMode,
    ) -> Result<MetalBuffer, BackendError> {
        let buffer = self
            .shared_buffer_with(data)
            .ok_or_else(|| BackendError::Allocation {
                len: data.len(),
                reason: "newBufferWithBytes returned nil".into(),
            })?;
        Ok(MetalBuffer {
            buffer,
            len: data.len(),
            mode,
        })
    }

    fn dispatch(
        &mut self,
        kernel: &ProbeKernel,
        global: WorkSize,
        local: WorkSize,
        input: &MetalBuffer,
        output: &MetalBuffer,
    ) -> Result<MetalCompletion, BackendError> {
        let (Some(pipeline), Some(params)) = (&self.pipeline, &self.params) else {
            return Err(BackendError::Dispatch("kernel was not prepared".into()));
        };
        if self.prepared.as_ref() != Some(kernel) {
            return Err(BackendError::Dispatch(format!(
                "kernel '{}' does not match the prepared pipeline",
                kernel.entry_point
            )));
        }
        if input.mode != BufferMode::ReadOnly || output.mode != BufferMode::WriteOnly {
            return Err(BackendError::Dispatch(
                "expected a read-only input and a write-only output buffer".into(),
            ));
        }
        let max = pipeline.maxTotalThreadsPerThreadgroup();
        if local.total() == 0 || local.total() > max {
            return Err(BackendError::Dispatch(format!(
                "local size {} outside 1..={max}",
                local.total()
            )));
        }
        if self.exact_tiling && global.x % local.x != 0 {
            return Err(BackendError::Dispatch(format!(
                "global size {} is not a multiple of local size {}",
                global.x, local.x
            )));
        }
        if input.len != global.total() || output.len != global.total() {
            return Err(BackendError::Dispatch(format!(
                "buffers hold {}/{} elements, dispatch covers {}",
                input.len,
                output.len,
                global.total()
            )));
        }

        let cmd = self
            .queue
            .commandBuffer()
            .ok_or_else(|| BackendError::Dispatch("failed to create command buffer".into()))?;
        let enc = cmd
            .computeCommandEncoder()
            .ok_or_else(|| BackendError::Dispatch("failed to create compute encoder".into()))?;

        enc.setComputePipelineState(pipeline);
        unsafe {
            enc.setBuffer_offset_atIndex(Some(&*input.buffer), 0, 0);
            enc.setBuffer_offset_atIndex(Some(&*output.buffer), 0, 1);
            enc.setBuffer_offset_atIndex(Some(&**params), 0, 2);
        }

        let tg = MTLSize {
            width: local.x,
            height: local.y,
            depth: local.z,
        };
        if self.exact_tiling {
            let groups = MTLSize {
                width: global.x / local.x,
                height: 1,
                depth: 1,
            };
            enc.dispatchThreadgroups_threadsPerThreadgroup(groups, tg);
        } else {
            let grid = MTLSize {
                width: global.x,
                height: global.y,
                depth: global.z,
            };
            enc.dispatchThreads_threadsPerThreadgroup(grid, tg);
        }
        enc.endEncoding();
        cmd.commit();

        Ok(MetalCompletion { cmd })
    }

    fn wait(&mut self, token: MetalCompletion) -> Result<(), BackendError> {
        token.cmd.waitUntilCompleted();
        if token.cmd.status() == MTLCommandBufferStatus::Error {
            let detail = token
                .cmd
                .error()
                .map(|e| format!("{e}"))
                .unwrap_or_else(|| "command buffer completed with error status".into());
            return Err(BackendError::Wait(detail));
        }
        Ok(())
    }

    fn copy_to_host(&mut self, buffer: &MetalBuffer, dst: &mut [f32]) -> Result<(), BackendError> {
        if dst.len() != buffer.len {
            return Err(BackendError::Copy(format!(
                "destination holds {} elements, buffer {}",
                dst.len(),
                buffer.len
            )));
        }
        // Shared storage: contents() is host-visible once the dispatch completed.
        let src = unsafe {
            let ptr = buffer.buffer.contents().as_ptr() as *const f32;
            std::slice::from_raw_parts(ptr, buffer.len)
        };
        dst.copy_from_slice(src);
        Ok(())
    }
}
