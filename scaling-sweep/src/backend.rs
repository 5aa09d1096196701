//! The compute backend seam: buffers, dispatch, completion, readback.
//!
//! The engine drives any implementation of [`ComputeBackend`] through the
//! same five steps per trial: allocate, dispatch, wait, copy back, drop.

use serde::Serialize;

use crate::error::BackendError;
use crate::kernel::ProbeKernel;

/// Host/device access pattern of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// Device reads only; contents come from the host at allocation.
    ReadOnly,
    /// Device writes only; contents are read back after completion.
    WriteOnly,
}

/// A 3-D work size. The probe kernel is 1-D, so `y` and `z` stay 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WorkSize {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl WorkSize {
    pub const fn linear(x: usize) -> Self {
        Self { x, y: 1, z: 1 }
    }

    pub fn total(&self) -> usize {
        self.x * self.y * self.z
    }

    pub fn as_array(&self) -> [usize; 3] {
        [self.x, self.y, self.z]
    }
}

/// What a backend reports about the device it drives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub backend: String,
    pub device_name: String,
    /// Largest work-group size the device accepts, if known.
    pub max_local_size: Option<usize>,
    /// Whether the global size must be a multiple of the local size.
    pub exact_tiling: bool,
}

/// Buffer allocation, kernel dispatch, completion wait, and readback.
///
/// `Buffer` and `Completion` are backend-owned handles. Dropping a buffer
/// releases it.
pub trait ComputeBackend {
    type Buffer;
    type Completion;

    fn device_info(&self) -> DeviceInfo;

    /// Build whatever the backend needs to dispatch `kernel`. Called once
    /// before the first trial.
    fn prepare_kernel(&mut self, kernel: &ProbeKernel) -> Result<(), BackendError>;

    /// Allocate an uninitialised buffer of `len` floats.
    fn allocate_buffer(&mut self, len: usize, mode: BufferMode)
        -> Result<Self::Buffer, BackendError>;

    /// Allocate a buffer initialised with a copy of `data`.
    fn allocate_buffer_with_data(
        &mut self,
        data: &[f32],
        mode: BufferMode,
    ) -> Result<Self::Buffer, BackendError>;

    /// Submit one kernel invocation. Returns without waiting.
    fn dispatch(
        &mut self,
        kernel: &ProbeKernel,
        global: WorkSize,
        local: WorkSize,
        input: &Self::Buffer,
        output: &Self::Buffer,
    ) -> Result<Self::Completion, BackendError>;

    /// Block until the dispatch behind `token` has finished on the device.
    fn wait(&mut self, token: Self::Completion) -> Result<(), BackendError>;

    /// Copy `buffer` into `dst`. `dst.len()` must match the buffer length.
    fn copy_to_host(&mut self, buffer: &Self::Buffer, dst: &mut [f32]) -> Result<(), BackendError>;
}
