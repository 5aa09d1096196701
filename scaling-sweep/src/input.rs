//! Per-trial kernel input.
//!
//! Each trial gets a fresh input buffer of `global_size` floats. The values
//! come from one seeded stream consumed in trial order, so a rerun of the same
//! schedule with the same seed feeds every trial identical data.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::schedule::Trial;

pub struct TrialInputs {
    rng: StdRng,
}

impl TrialInputs {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Input for `trial`: one value in [0.0, 1.0) per work item.
    pub fn for_trial(&mut self, trial: &Trial) -> Vec<f32> {
        (0..trial.global_size).map(|_| self.rng.gen::<f32>()).collect()
    }
}
