//! CPU backend: runs the probe kernel work-group by work-group on rayon.
//!
//! `dispatch` hands the invocation to a dedicated thread pool and returns a
//! completion token immediately; `wait` blocks on the token's channel. Each
//! work-group is one contiguous chunk of `local_size` items, processed by one
//! rayon task, so local ids restart at zero in every group.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use rayon::prelude::*;

use crate::backend::{BufferMode, ComputeBackend, DeviceInfo, WorkSize};
use crate::error::BackendError;
use crate::kernel::{probe_item, ProbeKernel};

/// Work-group limit most OpenCL/Metal devices report.
pub const DEFAULT_MAX_LOCAL_SIZE: usize = 1024;

/// A host-memory buffer shared with in-flight dispatches.
pub struct HostBuffer {
    data: Arc<Mutex<Vec<f32>>>,
    mode: BufferMode,
}

impl HostBuffer {
    fn len(&self) -> usize {
        self.data.lock().map(|d| d.len()).unwrap_or(0)
    }
}

/// Completion signal of one host dispatch.
pub struct HostCompletion {
    rx: Receiver<Result<(), BackendError>>,
}

pub struct HostBackend {
    pool: rayon::ThreadPool,
    exact_tiling: bool,
    max_local_size: usize,
    max_buffer_len: Option<usize>,
    wait_timeout: Option<Duration>,
    prepared: Option<ProbeKernel>,
}

impl HostBackend {
    /// Backend on a pool sized to the machine's logical cores.
    pub fn new() -> Result<Self, BackendError> {
        Self::with_threads(0)
    }

    /// Backend on a pool of `threads` workers (0 = rayon default).
    pub fn with_threads(threads: usize) -> Result<Self, BackendError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("host-device-{i}"))
            .build()
            .map_err(|e| BackendError::Dispatch(format!("thread pool: {e}")))?;
        Ok(Self {
            pool,
            exact_tiling: false,
            max_local_size: DEFAULT_MAX_LOCAL_SIZE,
            max_buffer_len: None,
            wait_timeout: None,
            prepared: None,
        })
    }

    /// Require `global % local == 0` on every dispatch.
    pub fn exact_tiling(mut self, exact: bool) -> Self {
        self.exact_tiling = exact;
        self
    }

    pub fn max_local_size(mut self, max: usize) -> Self {
        self.max_local_size = max;
        self
    }

    /// Refuse allocations longer than `len` elements.
    pub fn memory_limit(mut self, len: usize) -> Self {
        self.max_buffer_len = Some(len);
        self
    }

    /// Fail `wait` if a dispatch takes longer than `timeout`.
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    fn new_buffer(&self, data: Vec<f32>, mode: BufferMode) -> HostBuffer {
        HostBuffer {
            data: Arc::new(Mutex::new(data)),
            mode,
        }
    }

    fn reserve(&self, len: usize) -> Result<Vec<f32>, BackendError> {
        if let Some(limit) = self.max_buffer_len {
            if len > limit {
                return Err(BackendError::Allocation {
                    len,
                    reason: format!("exceeds host memory limit of {limit} elements"),
                });
            }
        }
        let mut v = Vec::new();
        v.try_reserve_exact(len)
            .map_err(|e| BackendError::Allocation {
                len,
                reason: e.to_string(),
            })?;
        Ok(v)
    }
}

impl ComputeBackend for HostBackend {
    type Buffer = HostBuffer;
    type Completion = HostCompletion;

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            backend: "host".to_string(),
            device_name: format!("host CPU ({} threads)", self.pool.current_num_threads()),
            max_local_size: Some(self.max_local_size),
            exact_tiling: self.exact_tiling,
        }
    }

    fn prepare_kernel(&mut self, kernel: &ProbeKernel) -> Result<(), BackendError> {
        self.prepared = Some(kernel.clone());
        Ok(())
    }

    fn allocate_buffer(&mut self, len: usize, mode: BufferMode) -> Result<HostBuffer, BackendError> {
        let mut v = self.reserve(len)?;
        v.resize(len, 0.0);
        Ok(self.new_buffer(v, mode))
    }

    fn allocate_buffer_with_data(
        &mut self,
        data: &[f32],
        mode: BufferMode,
    ) -> Result<HostBuffer, BackendError> {
        let mut v = self.reserve(data.len())?;
        v.extend_from_slice(data);
        Ok(self.new_buffer(v, mode))
    }

    fn dispatch(
        &mut self,
        kernel: &ProbeKernel,
        global: WorkSize,
        local: WorkSize,
        input: &HostBuffer,
        output: &HostBuffer,
    ) -> Result<HostCompletion, BackendError> {
        if self.prepared.as_ref() != Some(kernel) {
            return Err(BackendError::Dispatch(format!(
                "kernel '{}' was not prepared",
                kernel.entry_point
            )));
        }
        if input.mode != BufferMode::ReadOnly || output.mode != BufferMode::WriteOnly {
            return Err(BackendError::Dispatch(
                "expected a read-only input and a write-only output buffer".into(),
            ));
        }
        let (global_len, local_len) = (global.total(), local.total());
        if local_len == 0 || local_len > self.max_local_size {
            return Err(BackendError::Dispatch(format!(
                "local size {local_len} outside 1..={}",
                self.max_local_size
            )));
        }
        if self.exact_tiling && global_len % local_len != 0 {
            return Err(BackendError::Dispatch(format!(
                "global size {global_len} is not a multiple of local size {local_len}"
            )));
        }
        if input.len() != global_len || output.len() != global_len {
            return Err(BackendError::Dispatch(format!(
                "buffers hold {}/{} elements, dispatch covers {global_len}",
                input.len(),
                output.len()
            )));
        }

        let (tx, rx) = crossbeam_channel::bounded(1);
        let input = Arc::clone(&input.data);
        let output = Arc::clone(&output.data);
        let iterations = kernel.iterations;
        self.pool.spawn(move || {
            let result = run_groups(&input, &output, local_len, iterations);
            // The receiver may already be gone after a timed-out wait.
            let _ = tx.send(result);
        });
        Ok(HostCompletion { rx })
    }

    fn wait(&mut self, token: HostCompletion) -> Result<(), BackendError> {
        match self.wait_timeout {
            Some(timeout) => token.rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => {
                    BackendError::Wait(format!("no completion after {timeout:?}"))
                }
                RecvTimeoutError::Disconnected => {
                    BackendError::Wait("worker exited without signalling".into())
                }
            })?,
            None => token
                .rx
                .recv()
                .map_err(|_| BackendError::Wait("worker exited without signalling".into()))?,
        }
    }

    fn copy_to_host(&mut self, buffer: &HostBuffer, dst: &mut [f32]) -> Result<(), BackendError> {
        let data = buffer
            .data
            .lock()
            .map_err(|_| BackendError::Copy("buffer lock poisoned".into()))?;
        if data.len() != dst.len() {
            return Err(BackendError::Copy(format!(
                "destination holds {} elements, buffer {}",
                dst.len(),
                data.len()
            )));
        }
        dst.copy_from_slice(&data);
        Ok(())
    }
}

fn run_groups(
    input: &Mutex<Vec<f32>>,
    output: &Mutex<Vec<f32>>,
    local_size: usize,
    iterations: u32,
) -> Result<(), BackendError> {
    let input = input
        .lock()
        .map_err(|_| BackendError::Wait("input buffer lock poisoned".into()))?;
    let mut output = output
        .lock()
        .map_err(|_| BackendError::Wait("output buffer lock poisoned".into()))?;

    output
        .par_chunks_mut(local_size)
        .zip(input.par_chunks(local_size))
        .for_each(|(out, inp)| {
            for (lid, (o, &x)) in out.iter_mut().zip(inp).enumerate() {
                *o = probe_item(x, lid, iterations);
            }
        });
    Ok(())
}
