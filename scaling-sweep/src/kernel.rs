//! The probe kernel: a deliberately expensive, data-independent loop.
//!
//! Each work item multiplies its input by its local id `iterations` times and
//! writes its local id to the output. Device backends compile [`PROBE_SOURCE`];
//! the host backend runs [`probe_item`] directly.

use std::hint::black_box;

use serde::{Deserialize, Serialize};

/// Metal Shading Language source of the probe kernel.
pub const PROBE_SOURCE: &str = include_str!("../shaders/probe.metal");

/// Entry point inside [`PROBE_SOURCE`].
pub const PROBE_ENTRY_POINT: &str = "scale_probe";

/// Default probe loop count for device backends.
pub const DEFAULT_ITERATIONS: u32 = 1_000_000;

/// Description of the kernel every trial dispatches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeKernel {
    pub entry_point: String,
    pub iterations: u32,
}

impl ProbeKernel {
    pub fn new(iterations: u32) -> Self {
        Self {
            entry_point: PROBE_ENTRY_POINT.to_string(),
            iterations,
        }
    }

    pub fn source(&self) -> &'static str {
        PROBE_SOURCE
    }
}

impl Default for ProbeKernel {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

/// Host rendition of one work item. Returns the value written to `output[gid]`.
#[inline]
pub fn probe_item(input: f32, local_id: usize, iterations: u32) -> f32 {
    let factor = local_id as f32;
    let mut acc = input;
    for _ in 0..iterations {
        acc = black_box(acc * factor);
    }
    if acc < 0.0 {
        acc
    } else {
        factor
    }
}
