//! Sweep schedule generation.
//!
//! A schedule is the static grid of `(local_size, global_size)` pairs to test.
//! Row `i` holds `samples_per_local_size` global sizes:
//!
//! ```text
//! global_size(i, j) = max(local_sizes) + j * step_multiplier * local_sizes[i]
//! ```
//!
//! Every row starts at the largest configured local size, not at its own, so
//! each trial can schedule at least one full group of the largest size.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SweepError;

/// Grid coordinate of one trial, both indices zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrialCoord {
    pub local_size_index: usize,
    pub sample_index: usize,
}

impl TrialCoord {
    pub const fn new(local_size_index: usize, sample_index: usize) -> Self {
        Self {
            local_size_index,
            sample_index,
        }
    }
}

impl fmt::Display for TrialCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.local_size_index, self.sample_index)
    }
}

/// One scheduled trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    pub coord: TrialCoord,
    /// Position in raster order, `0..schedule.len()`.
    pub ordinal: usize,
    pub local_size: usize,
    pub global_size: usize,
}

/// The explicit sweep state: which cell runs next.
///
/// Terminal once `local_size_index == rows`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialCursor {
    pub local_size_index: usize,
    pub sample_index: usize,
}

impl TrialCursor {
    pub const START: TrialCursor = TrialCursor {
        local_size_index: 0,
        sample_index: 0,
    };

    /// Transition taken after a trial completes.
    ///
    /// Bumps the sample index and wraps to the next row when it reaches
    /// `samples_per_row`.
    pub fn advance(self, samples_per_row: usize) -> TrialCursor {
        let sample_index = self.sample_index + 1;
        if sample_index == samples_per_row {
            TrialCursor {
                local_size_index: self.local_size_index + 1,
                sample_index: 0,
            }
        } else {
            TrialCursor {
                local_size_index: self.local_size_index,
                sample_index,
            }
        }
    }

    pub fn is_terminal(&self, rows: usize) -> bool {
        self.local_size_index >= rows
    }

    pub fn coord(&self) -> TrialCoord {
        TrialCoord::new(self.local_size_index, self.sample_index)
    }
}

/// Validated sweep parameters plus the precomputed global-size grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepSchedule {
    local_sizes: Vec<usize>,
    samples_per_local_size: usize,
    step_multiplier: usize,
    #[serde(skip)]
    global_sizes: Vec<Vec<usize>>,
}

impl SweepSchedule {
    /// Validate the parameters and generate the grid.
    ///
    /// Fails with [`SweepError::InvalidConfiguration`] on an empty or zero
    /// local size, zero samples, zero step, or a global size that overflows.
    pub fn new(
        local_sizes: Vec<usize>,
        samples_per_local_size: usize,
        step_multiplier: usize,
    ) -> Result<Self, SweepError> {
        if local_sizes.is_empty() {
            return Err(SweepError::InvalidConfiguration(
                "local_sizes must not be empty".into(),
            ));
        }
        if let Some(pos) = local_sizes.iter().position(|&l| l == 0) {
            return Err(SweepError::InvalidConfiguration(format!(
                "local_sizes[{pos}] must be positive"
            )));
        }
        if samples_per_local_size == 0 {
            return Err(SweepError::InvalidConfiguration(
                "samples_per_local_size must be positive".into(),
            ));
        }
        if step_multiplier == 0 {
            return Err(SweepError::InvalidConfiguration(
                "step_multiplier must be positive".into(),
            ));
        }

        let base = local_sizes.iter().copied().max().unwrap_or(0);
        let global_sizes = local_sizes
            .iter()
            .map(|&local| row_sizes(base, local, samples_per_local_size, step_multiplier))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            local_sizes,
            samples_per_local_size,
            step_multiplier,
            global_sizes,
        })
    }

    pub fn local_sizes(&self) -> &[usize] {
        &self.local_sizes
    }

    pub fn samples_per_local_size(&self) -> usize {
        self.samples_per_local_size
    }

    pub fn step_multiplier(&self) -> usize {
        self.step_multiplier
    }

    /// Number of local sizes (matrix rows).
    pub fn rows(&self) -> usize {
        self.local_sizes.len()
    }

    /// Total number of trials.
    pub fn len(&self) -> usize {
        self.rows() * self.samples_per_local_size
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Starting global size shared by every row.
    pub fn base_global_size(&self) -> usize {
        self.global_sizes[0][0]
    }

    /// Global sizes for row `local_size_index`.
    pub fn row(&self, local_size_index: usize) -> Option<&[usize]> {
        self.global_sizes.get(local_size_index).map(Vec::as_slice)
    }

    pub fn global_size(&self, coord: TrialCoord) -> Option<usize> {
        self.global_sizes
            .get(coord.local_size_index)?
            .get(coord.sample_index)
            .copied()
    }

    /// Look up the trial at `cursor`, or `None` once the cursor is terminal.
    pub fn trial_at(&self, cursor: TrialCursor) -> Option<Trial> {
        if cursor.is_terminal(self.rows()) {
            return None;
        }
        let coord = cursor.coord();
        Some(Trial {
            coord,
            ordinal: coord.local_size_index * self.samples_per_local_size + coord.sample_index,
            local_size: self.local_sizes[coord.local_size_index],
            global_size: self.global_size(coord)?,
        })
    }

    /// All trials in raster order.
    pub fn trials(&self) -> Trials<'_> {
        Trials {
            schedule: self,
            cursor: TrialCursor::START,
        }
    }
}

/// Iterator that walks a schedule by repeatedly advancing a [`TrialCursor`].
pub struct Trials<'a> {
    schedule: &'a SweepSchedule,
    cursor: TrialCursor,
}

impl Iterator for Trials<'_> {
    type Item = Trial;

    fn next(&mut self) -> Option<Trial> {
        let trial = self.schedule.trial_at(self.cursor)?;
        self.cursor = self.cursor.advance(self.schedule.samples_per_local_size);
        Some(trial)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let done = self.cursor.local_size_index * self.schedule.samples_per_local_size
            + self.cursor.sample_index;
        let remaining = self.schedule.len().saturating_sub(done);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Trials<'_> {}

fn row_sizes(
    base: usize,
    local: usize,
    samples: usize,
    step_multiplier: usize,
) -> Result<Vec<usize>, SweepError> {
    let overflow = || {
        SweepError::InvalidConfiguration(format!(
            "global size overflows for local size {local} after {samples} samples"
        ))
    };
    let stride = step_multiplier.checked_mul(local).ok_or_else(overflow)?;
    (0..samples)
        .map(|j| {
            j.checked_mul(stride)
                .and_then(|offset| base.checked_add(offset))
                .ok_or_else(overflow)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_for_largest_local_size() {
        let s = SweepSchedule::new(vec![1, 2, 4], 3, 2).unwrap();
        // max + j * step * local = 4 + j * 2 * 4
        assert_eq!(s.row(2).unwrap(), &[4, 12, 20]);
        assert_eq!(s.row(0).unwrap(), &[4, 6, 8]);
    }

    #[test]
    fn test_every_row_starts_at_max() {
        let s = SweepSchedule::new(vec![8, 2, 32, 4], 5, 1).unwrap();
        for i in 0..s.rows() {
            assert_eq!(s.row(i).unwrap()[0], 32);
        }
        assert_eq!(s.base_global_size(), 32);
        assert_eq!(s.row(1).unwrap(), &[32, 34, 36, 38, 40]);
    }

    #[test]
    fn test_seven_local_sizes_two_hundred_samples() {
        let s = SweepSchedule::new(vec![1, 2, 4, 8, 16, 32, 64], 200, 2).unwrap();
        assert_eq!(s.len(), 1400);
        assert_eq!(s.row(0).unwrap()[199], 64 + 199 * 2);
        assert_eq!(s.row(6).unwrap()[199], 64 + 199 * 2 * 64);
    }

    #[test]
    fn test_rejects_empty_local_sizes() {
        let err = SweepSchedule::new(vec![], 3, 2).unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_rejects_zero_local_size() {
        let err = SweepSchedule::new(vec![4, 0, 8], 3, 2).unwrap_err();
        match err {
            SweepError::InvalidConfiguration(msg) => assert!(msg.contains("local_sizes[1]")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_zero_samples_and_step() {
        assert!(matches!(
            SweepSchedule::new(vec![1], 0, 2),
            Err(SweepError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            SweepSchedule::new(vec![1], 3, 0),
            Err(SweepError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_overflow() {
        let err = SweepSchedule::new(vec![usize::MAX / 2], 3, 2).unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_cursor_wraps_rows() {
        let c = TrialCursor::START;
        let c = c.advance(2);
        assert_eq!(c, TrialCursor { local_size_index: 0, sample_index: 1 });
        let c = c.advance(2);
        assert_eq!(c, TrialCursor { local_size_index: 1, sample_index: 0 });
        assert!(!c.is_terminal(2));
        let c = c.advance(2).advance(2);
        assert!(c.is_terminal(2));
    }

    #[test]
    fn test_single_sample_rows() {
        let c = TrialCursor::START.advance(1);
        assert_eq!(c, TrialCursor { local_size_index: 1, sample_index: 0 });
    }

    #[test]
    fn test_trials_raster_order() {
        let s = SweepSchedule::new(vec![1, 2], 3, 1).unwrap();
        let trials: Vec<Trial> = s.trials().collect();
        assert_eq!(trials.len(), 6);
        assert_eq!(s.trials().len(), 6);
        for (n, t) in trials.iter().enumerate() {
            assert_eq!(t.ordinal, n);
            assert_eq!(t.coord.local_size_index, n / 3);
            assert_eq!(t.coord.sample_index, n % 3);
        }
        let globals: Vec<usize> = trials.iter().map(|t| t.global_size).collect();
        assert_eq!(globals, vec![2, 3, 4, 2, 4, 6]);
        assert_eq!(trials[4].local_size, 2);
    }

    #[test]
    fn test_trial_at_terminal_is_none() {
        let s = SweepSchedule::new(vec![1], 2, 1).unwrap();
        let end = TrialCursor { local_size_index: 1, sample_index: 0 };
        assert!(s.trial_at(end).is_none());
    }

    #[test]
    fn test_coord_display() {
        assert_eq!(TrialCoord::new(1, 4).to_string(), "(1, 4)");
    }
}
