//! Sweep results: one timing per (local size, sample) cell.

use serde::{Deserialize, Serialize};

use crate::error::SweepError;
use crate::schedule::{SweepSchedule, TrialCoord};

/// Timing of a single trial. Written once, never modified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub coord: TrialCoord,
    pub global_size: usize,
    /// Dispatch-to-completion wall-clock time in milliseconds.
    pub elapsed_ms: f64,
}

/// Two parallel grids shaped `[local_sizes][samples_per_local_size]`.
///
/// Unset cells are `None`; a complete matrix has none left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMatrix {
    local_sizes: Vec<usize>,
    global_sizes: Vec<Vec<Option<usize>>>,
    elapsed_ms: Vec<Vec<Option<f64>>>,
}

impl ResultMatrix {
    /// Empty matrix shaped for `schedule`.
    pub fn for_schedule(schedule: &SweepSchedule) -> Self {
        let rows = schedule.rows();
        let cols = schedule.samples_per_local_size();
        Self {
            local_sizes: schedule.local_sizes().to_vec(),
            global_sizes: vec![vec![None; cols]; rows],
            elapsed_ms: vec![vec![None; cols]; rows],
        }
    }

    /// Store a trial result. Each cell accepts exactly one write.
    pub fn record(&mut self, result: ExecutionResult) -> Result<(), SweepError> {
        let TrialCoord {
            local_size_index: i,
            sample_index: j,
        } = result.coord;
        let (rows, cols) = (self.rows(), self.cols());
        let slot = self
            .global_sizes
            .get_mut(i)
            .and_then(|row| row.get_mut(j))
            .ok_or_else(|| {
                SweepError::InvalidConfiguration(format!(
                    "cell {} outside {rows}x{cols} matrix",
                    result.coord
                ))
            })?;
        if slot.is_some() {
            return Err(SweepError::CellOverwrite {
                coord: result.coord,
            });
        }
        *slot = Some(result.global_size);
        self.elapsed_ms[i][j] = Some(result.elapsed_ms);
        Ok(())
    }

    pub fn local_sizes(&self) -> &[usize] {
        &self.local_sizes
    }

    pub fn rows(&self) -> usize {
        self.global_sizes.len()
    }

    pub fn cols(&self) -> usize {
        self.global_sizes.first().map_or(0, Vec::len)
    }

    pub fn global_size_grid(&self) -> &[Vec<Option<usize>>] {
        &self.global_sizes
    }

    pub fn elapsed_ms_grid(&self) -> &[Vec<Option<f64>>] {
        &self.elapsed_ms
    }

    pub fn get(&self, coord: TrialCoord) -> Option<ExecutionResult> {
        let i = coord.local_size_index;
        let j = coord.sample_index;
        let global_size = (*self.global_sizes.get(i)?.get(j)?)?;
        let elapsed_ms = self.elapsed_ms[i][j]?;
        Some(ExecutionResult {
            coord,
            global_size,
            elapsed_ms,
        })
    }

    pub fn populated(&self) -> usize {
        self.global_sizes
            .iter()
            .flatten()
            .filter(|c| c.is_some())
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.populated() == self.rows() * self.cols()
    }

    /// Coordinates of every unset cell, raster order.
    pub fn incomplete_cells(&self) -> Vec<TrialCoord> {
        self.global_sizes
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, c)| c.is_none())
                    .map(move |(j, _)| TrialCoord::new(i, j))
            })
            .collect()
    }

    /// Populated `(global_size, elapsed_ms)` points of one row, in sample order.
    pub fn series(&self, local_size_index: usize) -> Vec<(usize, f64)> {
        let Some(globals) = self.global_sizes.get(local_size_index) else {
            return Vec::new();
        };
        globals
            .iter()
            .zip(&self.elapsed_ms[local_size_index])
            .filter_map(|(g, t)| Some(((*g)?, (*t)?)))
            .collect()
    }

    /// All populated cells in raster order.
    pub fn results(&self) -> impl Iterator<Item = ExecutionResult> + '_ {
        (0..self.rows()).flat_map(move |i| {
            (0..self.cols()).filter_map(move |j| self.get(TrialCoord::new(i, j)))
        })
    }
}
