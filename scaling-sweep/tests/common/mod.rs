#![allow(dead_code)]

use std::time::Duration;

use scaling_sweep::{
    BackendError, BufferMode, ComputeBackend, DeviceInfo, ProbeKernel, WorkSize,
};

/// Everything the engine asked the mock to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Prepare,
    Alloc { id: usize, len: usize, mode: BufferMode },
    Dispatch { global: [usize; 3], local: [usize; 3], input: usize, output: usize },
    Wait { dispatch: usize },
    Copy { id: usize, len: usize },
}

pub struct MockBuffer {
    id: usize,
    data: Vec<f32>,
    mode: BufferMode,
}

pub struct MockToken {
    dispatch: usize,
}

/// Scripted backend with instantaneous dispatches and injectable failures.
///
/// Trial numbers in the `fail_*` knobs are 1-based, counted per call kind.
#[derive(Default)]
pub struct MockBackend {
    pub calls: Vec<Call>,
    pub exact_tiling: bool,
    pub max_local_size: Option<usize>,
    /// Limit reported once the kernel is prepared, as a compiled pipeline may.
    pub pipeline_max_local_size: Option<usize>,
    pub fail_prepare: bool,
    pub fail_wait_on: Option<usize>,
    pub fail_dispatch_on: Option<usize>,
    pub fail_alloc_on: Option<usize>,
    pub alloc_delay: Option<Duration>,
    pub copy_delay: Option<Duration>,
    pub next_buffer: usize,
    pub dispatches: usize,
    pub waits: usize,
    pub in_flight: usize,
    pub max_in_flight: usize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch_count(&self) -> usize {
        self.dispatches
    }

    pub fn alloc_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Alloc { .. }))
            .count()
    }

    fn next_alloc(&mut self, len: usize, mode: BufferMode) -> Result<usize, BackendError> {
        if let Some(d) = self.alloc_delay {
            std::thread::sleep(d);
        }
        let id = self.next_buffer;
        self.next_buffer += 1;
        if self.fail_alloc_on == Some(id + 1) {
            return Err(BackendError::Allocation {
                len,
                reason: "scripted allocation failure".into(),
            });
        }
        self.calls.push(Call::Alloc { id, len, mode });
        Ok(id)
    }
}

impl ComputeBackend for MockBackend {
    type Buffer = MockBuffer;
    type Completion = MockToken;

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            backend: "mock".into(),
            device_name: "scripted mock".into(),
            max_local_size: self.max_local_size,
            exact_tiling: self.exact_tiling,
        }
    }

    fn prepare_kernel(&mut self, _kernel: &ProbeKernel) -> Result<(), BackendError> {
        if self.fail_prepare {
            return Err(BackendError::KernelCompilation("scripted".into()));
        }
        if let Some(max) = self.pipeline_max_local_size {
            self.max_local_size = Some(max);
        }
        self.calls.push(Call::Prepare);
        Ok(())
    }

    fn allocate_buffer(&mut self, len: usize, mode: BufferMode) -> Result<MockBuffer, BackendError> {
        let id = self.next_alloc(len, mode)?;
        Ok(MockBuffer {
            id,
            data: vec![0.0; len],
            mode,
        })
    }

    fn allocate_buffer_with_data(
        &mut self,
        data: &[f32],
        mode: BufferMode,
    ) -> Result<MockBuffer, BackendError> {
        let id = self.next_alloc(data.len(), mode)?;
        Ok(MockBuffer {
            id,
            data: data.to_vec(),
            mode,
        })
    }

    fn dispatch(
        &mut self,
        _kernel: &ProbeKernel,
        global: WorkSize,
        local: WorkSize,
        input: &MockBuffer,
        output: &MockBuffer,
    ) -> Result<MockToken, BackendError> {
        self.dispatches += 1;
        if self.fail_dispatch_on == Some(self.dispatches) {
            return Err(BackendError::Dispatch("scripted dispatch failure".into()));
        }
        assert_eq!(input.mode, BufferMode::ReadOnly);
        assert_eq!(output.mode, BufferMode::WriteOnly);
        self.in_flight += 1;
        self.max_in_flight = self.max_in_flight.max(self.in_flight);
        self.calls.push(Call::Dispatch {
            global: global.as_array(),
            local: local.as_array(),
            input: input.id,
            output: output.id,
        });
        Ok(MockToken {
            dispatch: self.dispatches,
        })
    }

    fn wait(&mut self, token: MockToken) -> Result<(), BackendError> {
        self.waits += 1;
        self.in_flight -= 1;
        if self.fail_wait_on == Some(self.waits) {
            return Err(BackendError::Wait("scripted wait failure".into()));
        }
        self.calls.push(Call::Wait {
            dispatch: token.dispatch,
        });
        Ok(())
    }

    fn copy_to_host(&mut self, buffer: &MockBuffer, dst: &mut [f32]) -> Result<(), BackendError> {
        if let Some(d) = self.copy_delay {
            std::thread::sleep(d);
        }
        dst.copy_from_slice(&buffer.data);
        self.calls.push(Call::Copy {
            id: buffer.id,
            len: buffer.data.len(),
        });
        Ok(())
    }
}
