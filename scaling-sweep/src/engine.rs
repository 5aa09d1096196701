//! Sweep execution: one synchronous, timed dispatch per scheduled trial.
//!
//! Trials run strictly in raster order with no overlap: the host blocks on
//! each trial's completion before allocating the next trial's buffers. The
//! timer covers only dispatch-to-completion; allocation and readback fall
//! outside it. The first failing trial halts the sweep.

use tracing::{debug, error, info};

use crate::backend::{BufferMode, ComputeBackend, DeviceInfo, WorkSize};
use crate::error::{SweepError, SweepFailure};
use crate::input::TrialInputs;
use crate::kernel::ProbeKernel;
use crate::matrix::{ExecutionResult, ResultMatrix};
use crate::schedule::{SweepSchedule, Trial, TrialCoord, TrialCursor};
use crate::timing::TrialTimer;

/// Seed used for trial input data unless overridden.
pub const DEFAULT_SEED: u64 = 42;

/// Progress event emitted after each completed trial.
#[derive(Debug, Clone, Copy)]
pub struct TrialProgress {
    pub trial: Trial,
    pub total: usize,
    pub elapsed_ms: f64,
}

/// Outcome of a sweep that reached the terminal state.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub device: DeviceInfo,
    pub kernel: ProbeKernel,
    pub matrix: ResultMatrix,
    /// Output buffer of the final trial, copied back to the host.
    pub last_output: Vec<f32>,
}

/// Drives a [`ComputeBackend`] through every trial of a [`SweepSchedule`].
pub struct SweepEngine<'a, B: ComputeBackend> {
    backend: &'a mut B,
    kernel: ProbeKernel,
    inputs: TrialInputs,
}

impl<'a, B: ComputeBackend> SweepEngine<'a, B> {
    pub fn new(backend: &'a mut B, kernel: ProbeKernel) -> Self {
        Self::with_seed(backend, kernel, DEFAULT_SEED)
    }

    pub fn with_seed(backend: &'a mut B, kernel: ProbeKernel, seed: u64) -> Self {
        Self {
            backend,
            kernel,
            inputs: TrialInputs::new(seed),
        }
    }

    pub fn kernel(&self) -> &ProbeKernel {
        &self.kernel
    }

    /// Run the whole schedule.
    ///
    /// On failure the returned [`SweepFailure`] names the failing trial and
    /// carries the matrix as it stood, every earlier cell populated.
    pub fn run(
        &mut self,
        schedule: &SweepSchedule,
        progress_cb: Option<&dyn Fn(&TrialProgress)>,
    ) -> Result<SweepReport, SweepFailure> {
        let mut matrix = ResultMatrix::for_schedule(schedule);
        let total = schedule.len();

        if let Err(e) = self.backend.prepare_kernel(&self.kernel) {
            let coord = TrialCoord::new(0, 0);
            error!(%coord, error = %e, "kernel preparation failed");
            return Err(SweepFailure {
                coord,
                error: e.into(),
                matrix,
            });
        }

        // Limits can tighten once a pipeline exists.
        let device = self.backend.device_info();
        info!(
            backend = %device.backend,
            device = %device.device_name,
            max_local_size = ?device.max_local_size,
            local_sizes = ?schedule.local_sizes(),
            samples = schedule.samples_per_local_size(),
            step = schedule.step_multiplier(),
            iterations = self.kernel.iterations,
            "starting sweep of {total} trials"
        );

        let mut last_output = Vec::new();
        let mut cursor = TrialCursor::START;
        while let Some(trial) = schedule.trial_at(cursor) {
            let outcome = self
                .run_trial(&trial, &device)
                .and_then(|(result, output)| {
                    matrix.record(result)?;
                    Ok((result, output))
                });

            let (result, output) = match outcome {
                Ok(done) => done,
                Err(e) => {
                    error!(
                        coord = %trial.coord,
                        local_size = trial.local_size,
                        global_size = trial.global_size,
                        error = %e,
                        "trial failed, halting sweep"
                    );
                    return Err(SweepFailure {
                        coord: trial.coord,
                        error: e,
                        matrix,
                    });
                }
            };

            debug!(
                trial = trial.ordinal,
                local_size = trial.local_size,
                global_size = trial.global_size,
                elapsed_ms = result.elapsed_ms,
                "trial complete"
            );
            if let Some(cb) = progress_cb {
                cb(&TrialProgress {
                    trial,
                    total,
                    elapsed_ms: result.elapsed_ms,
                });
            }

            last_output = output;
            cursor = cursor.advance(schedule.samples_per_local_size());
        }

        info!(populated = matrix.populated(), "sweep complete");
        Ok(SweepReport {
            device,
            kernel: self.kernel.clone(),
            matrix,
            last_output,
        })
    }

    /// Allocate, dispatch, wait, copy back. Buffers drop on return.
    fn run_trial(
        &mut self,
        trial: &Trial,
        device: &DeviceInfo,
    ) -> Result<(ExecutionResult, Vec<f32>), SweepError> {
        check_work_size(trial.local_size, trial.global_size, device)?;

        let data = self.inputs.for_trial(trial);
        let input = self
            .backend
            .allocate_buffer_with_data(&data, BufferMode::ReadOnly)?;
        let output = self
            .backend
            .allocate_buffer(trial.global_size, BufferMode::WriteOnly)?;

        let global = WorkSize::linear(trial.global_size);
        let local = WorkSize::linear(trial.local_size);

        let timer = TrialTimer::open();
        let token = self
            .backend
            .dispatch(&self.kernel, global, local, &input, &output)?;
        self.backend.wait(token)?;
        let elapsed_ms = timer.elapsed_ms();

        let mut host = vec![0.0f32; trial.global_size];
        self.backend.copy_to_host(&output, &mut host)?;

        Ok((
            ExecutionResult {
                coord: trial.coord,
                global_size: trial.global_size,
                elapsed_ms,
            },
            host,
        ))
    }
}

/// Reject a `(local, global)` pair the device cannot run.
pub fn check_work_size(
    local_size: usize,
    global_size: usize,
    device: &DeviceInfo,
) -> Result<(), SweepError> {
    if let Some(max) = device.max_local_size {
        if local_size > max {
            return Err(SweepError::InvalidWorkSize {
                local_size,
                global_size,
                reason: format!("exceeds the device maximum work-group size {max}"),
            });
        }
    }
    if device.exact_tiling && global_size % local_size != 0 {
        return Err(SweepError::InvalidWorkSize {
            local_size,
            global_size,
            reason: "global size is not a multiple of local size".into(),
        });
    }
    Ok(())
}
