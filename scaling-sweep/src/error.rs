//! Error taxonomy for schedule construction, backend interaction, and sweeps.

use crate::matrix::ResultMatrix;
use crate::schedule::TrialCoord;

/// Failures reported by a [`ComputeBackend`](crate::backend::ComputeBackend).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BackendError {
    #[error("no compute device found")]
    DeviceNotFound,
    #[error("kernel compilation failed: {0}")]
    KernelCompilation(String),
    #[error("buffer allocation of {len} elements failed: {reason}")]
    Allocation { len: usize, reason: String },
    #[error("dispatch rejected: {0}")]
    Dispatch(String),
    #[error("wait for completion failed: {0}")]
    Wait(String),
    #[error("device-to-host copy failed: {0}")]
    Copy(String),
}

/// Errors raised while building a schedule or running a sweep.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SweepError {
    #[error("invalid sweep configuration: {0}")]
    InvalidConfiguration(String),
    #[error("invalid work size: local={local_size}, global={global_size}: {reason}")]
    InvalidWorkSize {
        local_size: usize,
        global_size: usize,
        reason: String,
    },
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),
    #[error("result cell {coord} recorded twice")]
    CellOverwrite { coord: TrialCoord },
}

/// A sweep that halted at `coord`.
///
/// `matrix` holds every trial completed before the failing one; the failing
/// cell and all cells after it stay unset.
#[derive(Debug, thiserror::Error)]
#[error("sweep halted at trial {coord}: {error}")]
pub struct SweepFailure {
    pub coord: TrialCoord,
    #[source]
    pub error: SweepError,
    pub matrix: ResultMatrix,
}

impl SweepFailure {
    /// True when the failure came from the device/backend layer.
    pub fn is_backend_failure(&self) -> bool {
        matches!(self.error, SweepError::Backend(_))
    }
}
