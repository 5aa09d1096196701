//! scaling-sweep: measure how a compute kernel's run time scales with
//! work-group (local) size and problem (global) size.
//!
//! A [`SweepSchedule`] fixes the grid of `(local_size, global_size)` pairs,
//! a [`SweepEngine`] dispatches one timed kernel invocation per pair through a
//! [`ComputeBackend`], and the timings land in a [`ResultMatrix`].
//!
//! ```no_run
//! use scaling_sweep::{HostBackend, ProbeKernel, SweepEngine, SweepSchedule};
//!
//! let schedule = SweepSchedule::new(vec![1, 2, 4, 8], 50, 2).unwrap();
//! let mut backend = HostBackend::new().unwrap();
//! let report = SweepEngine::new(&mut backend, ProbeKernel::new(10_000))
//!     .run(&schedule, None)
//!     .unwrap();
//! for (i, local) in schedule.local_sizes().iter().enumerate() {
//!     println!("local={local}: {:?}", report.matrix.series(i));
//! }
//! ```

pub mod backend;
pub mod engine;
pub mod error;
pub mod host;
pub mod input;
pub mod kernel;
pub mod matrix;
#[cfg(target_os = "macos")]
pub mod metal;
pub mod schedule;
pub mod timing;

pub use backend::{BufferMode, ComputeBackend, DeviceInfo, WorkSize};
pub use engine::{check_work_size, SweepEngine, SweepReport, TrialProgress, DEFAULT_SEED};
pub use error::{BackendError, SweepError, SweepFailure};
pub use host::HostBackend;
pub use input::TrialInputs;
pub use kernel::{ProbeKernel, DEFAULT_ITERATIONS};
pub use matrix::{ExecutionResult, ResultMatrix};
#[cfg(target_os = "macos")]
pub use metal::MetalBackend;
pub use schedule::{SweepSchedule, Trial, TrialCoord, TrialCursor};
pub use timing::TrialTimer;
