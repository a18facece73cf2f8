//! Heap-driven integration of a phase-gradient field.
//!
//! The plane is `width` time columns of `height` frequency bins, stored
//! column-major (`index = column * height + bin`). Integration starts from
//! the bins whose phase is already known and flood-fills the bins above the
//! tolerance in decreasing order of log-magnitude, each step applying the
//! trapezoidal rule to the gradient along the direction of the step:
//! `fgrad` between neighbouring bins of a column, `tgrad` between
//! neighbouring columns.

use crate::core::heap::PriorityHeap;
use crate::core::types::BinState;
use crate::error::{checked_len, try_zeroed, PhaseError};

/// Counts from one integration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Known bins pushed onto the heap as propagation seeds.
    pub seeded: usize,
    /// Bins that received a phase during the pass.
    pub propagated: usize,
    /// Bins left without a phase.
    pub unknown: usize,
}

/// Reusable state for integrating phase over a fixed-size plane.
#[derive(Debug, Clone)]
pub struct HeapIntTask {
    height: usize,
    width: usize,
    heap: PriorityHeap,
    mask: Vec<BinState>,
}

impl HeapIntTask {
    /// Creates a task for a plane of `width` columns of `height` bins.
    pub fn new(height: usize, width: usize) -> Result<Self, PhaseError> {
        if height == 0 || width == 0 {
            return Err(PhaseError::NotPositiveArgument(format!(
                "integration plane is {}x{}",
                height, width
            )));
        }
        let plane = checked_len(height, width)?;
        Ok(Self {
            height,
            width,
            heap: PriorityHeap::with_capacity(plane)?,
            mask: try_zeroed(plane)?,
        })
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Bin states after the last [`reset_mask`](Self::reset_mask) or
    /// [`execute`](Self::execute).
    #[inline]
    pub fn mask(&self) -> &[BinState] {
        &self.mask
    }

    /// Bin states of column `col`.
    #[inline]
    pub fn column_mask(&self, col: usize) -> &[BinState] {
        &self.mask[col * self.height..(col + 1) * self.height]
    }

    /// Prepares the mask for a new pass. Bins at or below `logtol` are
    /// `Unknown` whether known or not; of the rest, `known` bins are `Done`
    /// and the others `AboveTol`.
    pub fn reset_mask(
        &mut self,
        known: &[bool],
        logs: &[f64],
        logtol: f64,
    ) -> Result<(), PhaseError> {
        self.check_len(known.len())?;
        self.check_len(logs.len())?;
        for ((state, &is_known), &s) in self.mask.iter_mut().zip(known).zip(logs) {
            *state = if s <= logtol || s.is_nan() {
                BinState::Unknown
            } else if is_known {
                BinState::Done
            } else {
                BinState::AboveTol
            };
        }
        Ok(())
    }

    /// Integrates `tgrad`/`fgrad` into `phase`, starting from the `Done` bins
    /// that border an `AboveTol` bin.
    ///
    /// `logs` orders the propagation. Phases of known bins are read but never
    /// written. On return every bin is either `Done` or
    /// `Unknown`; `Unknown` bins keep whatever `phase` held.
    pub fn execute(
        &mut self,
        logs: &[f64],
        tgrad: &[f64],
        fgrad: &[f64],
        phase: &mut [f64],
    ) -> Result<PassStats, PhaseError> {
        self.check_len(logs.len())?;
        self.check_len(tgrad.len())?;
        self.check_len(fgrad.len())?;
        self.check_len(phase.len())?;

        let h = self.height;
        let w = self.width;
        let mask = &mut self.mask;
        let mut heap = self.heap.reset(logs);
        let mut stats = PassStats::default();

        for idx in 0..h * w {
            if mask[idx] == BinState::Done && borders_open_bin(mask, idx, h, w) {
                heap.insert(idx)?;
                stats.seeded += 1;
            }
        }

        while let Some(k) = heap.delete_max() {
            let bin = k % h;
            let col = k / h;

            if bin + 1 < h && mask[k + 1] == BinState::AboveTol {
                let n = k + 1;
                phase[n] = phase[k] + (fgrad[k] + fgrad[n]) / 2.0;
                mask[n] = BinState::Done;
                heap.insert(n)?;
                stats.propagated += 1;
            }
            if bin > 0 && mask[k - 1] == BinState::AboveTol {
                let n = k - 1;
                phase[n] = phase[k] - (fgrad[k] + fgrad[n]) / 2.0;
                mask[n] = BinState::Done;
                heap.insert(n)?;
                stats.propagated += 1;
            }
            if col + 1 < w && mask[k + h] == BinState::AboveTol {
                let n = k + h;
                phase[n] = phase[k] + (tgrad[k] + tgrad[n]) / 2.0;
                mask[n] = BinState::Done;
                heap.insert(n)?;
                stats.propagated += 1;
            }
            if col > 0 && mask[k - h] == BinState::AboveTol {
                let n = k - h;
                phase[n] = phase[k] - (tgrad[k] + tgrad[n]) / 2.0;
                mask[n] = BinState::Done;
                heap.insert(n)?;
                stats.propagated += 1;
            }
        }

        // Unreachable islands get no phase.
        for state in mask.iter_mut() {
            if *state != BinState::Done {
                *state = BinState::Unknown;
                stats.unknown += 1;
            }
        }

        Ok(stats)
    }

    fn check_len(&self, provided: usize) -> Result<(), PhaseError> {
        let expected = self.mask.len();
        if provided != expected {
            return Err(PhaseError::BadSize { expected, provided });
        }
        Ok(())
    }
}

/// Whether bin `idx` has an `AboveTol` neighbour in the 4-neighbourhood.
#[inline]
fn borders_open_bin(mask: &[BinState], idx: usize, h: usize, w: usize) -> bool {
    let bin = idx % h;
    let col = idx / h;
    let open = |n: usize| mask[n] == BinState::AboveTol;
    (bin + 1 < h && open(idx + 1))
        || (bin > 0 && open(idx - 1))
        || (col + 1 < w && open(idx + h))
        || (col > 0 && open(idx - h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const LOGTOL: f64 = -10.0;

    #[test]
    fn test_frequency_steps_from_single_seed() {
        let h = 7;
        let mut task = HeapIntTask::new(h, 1).unwrap();
        let mut known = vec![false; h];
        known[3] = true;
        let logs = vec![0.0; h];
        task.reset_mask(&known, &logs, LOGTOL).unwrap();

        let fgrad = vec![0.25; h];
        let tgrad = vec![0.0; h];
        let mut phase = vec![0.0; h];
        phase[3] = 1.0;
        let stats = task.execute(&logs, &tgrad, &fgrad, &mut phase).unwrap();

        assert_eq!(stats.seeded, 1);
        assert_eq!(stats.propagated, 6);
        for (bin, &p) in phase.iter().enumerate() {
            let expected = 1.0 + 0.25 * (bin as f64 - 3.0);
            assert_abs_diff_eq!(p, expected, epsilon = 1e-12);
        }
        assert!(task.mask().iter().all(|&s| s == BinState::Done));
    }

    #[test]
    fn test_time_steps_use_trapezoid_of_tgrad() {
        let (h, w) = (1, 4);
        let mut task = HeapIntTask::new(h, w).unwrap();
        let known = [true, false, false, false];
        let logs = [0.0, 1.0, 2.0, 3.0];
        task.reset_mask(&known, &logs, LOGTOL).unwrap();

        let tgrad = [1.0, 3.0, 5.0, 7.0];
        let fgrad = [0.0; 4];
        let mut phase = [0.5, 0.0, 0.0, 0.0];
        task.execute(&logs, &tgrad, &fgrad, &mut phase).unwrap();

        assert_abs_diff_eq!(phase[1], 0.5 + 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phase[2], 0.5 + 2.0 + 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phase[3], 0.5 + 2.0 + 4.0 + 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_strongest_bins_propagate_first() {
        // Column 0 is known; its middle bin is the strongest seed. The middle
        // bin of column 1 outranks the remaining seeds, so it assigns its
        // frequency neighbours before their own time neighbours can.
        let h = 3;
        let mut task = HeapIntTask::new(h, 2).unwrap();
        let known = [true, true, true, false, false, false];
        let logs = [0.0, 5.0, 0.0, 1.0, 1.0, 1.0];
        task.reset_mask(&known, &logs, LOGTOL).unwrap();

        let tgrad = [0.0, 0.2, 0.0, 0.0, 0.4, 0.0];
        let fgrad = [0.0, 0.0, 0.0, 0.1, 0.3, 0.5];
        let mut phase = [100.0, 10.0, 100.0, 0.0, 0.0, 0.0];
        task.execute(&logs, &tgrad, &fgrad, &mut phase).unwrap();

        let middle = 10.0 + (0.2 + 0.4) / 2.0;
        assert_abs_diff_eq!(phase[4], middle, epsilon = 1e-12);
        assert_abs_diff_eq!(phase[3], middle - (0.3 + 0.1) / 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(phase[5], middle + (0.3 + 0.5) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_known_phase_is_never_rewritten() {
        let (h, w) = (4, 3);
        let mut task = HeapIntTask::new(h, w).unwrap();
        let mut known = vec![false; h * w];
        known[..h].iter_mut().for_each(|k| *k = true);
        known[2 * h + 1] = true;
        let logs: Vec<f64> = (0..h * w).map(|i| (i % 5) as f64).collect();
        task.reset_mask(&known, &logs, LOGTOL).unwrap();

        let tgrad = vec![0.7; h * w];
        let fgrad = vec![-0.3; h * w];
        let mut phase: Vec<f64> = (0..h * w).map(|i| i as f64 * 11.0).collect();
        let before = phase.clone();
        task.execute(&logs, &tgrad, &fgrad, &mut phase).unwrap();

        for idx in 0..h * w {
            if known[idx] {
                assert_eq!(phase[idx], before[idx], "known bin {} rewritten", idx);
            }
            assert_eq!(task.mask()[idx], BinState::Done);
        }
    }

    #[test]
    fn test_isolated_bins_stay_unknown() {
        // Bin 4 is above tolerance but fenced off by below-tolerance bins.
        let h = 6;
        let mut task = HeapIntTask::new(h, 1).unwrap();
        let known = [true, false, false, false, false, false];
        let logs = [0.0, 0.0, -20.0, -20.0, 3.0, -20.0];
        task.reset_mask(&known, &logs, LOGTOL).unwrap();
        assert_eq!(task.mask()[4], BinState::AboveTol);

        let mut phase = [0.0, 0.0, 9.0, 9.0, 9.0, 9.0];
        let stats = task
            .execute(&logs, &[0.0; 6], &[1.0; 6], &mut phase)
            .unwrap();

        assert_eq!(
            task.mask(),
            &[
                BinState::Done,
                BinState::Done,
                BinState::Unknown,
                BinState::Unknown,
                BinState::Unknown,
                BinState::Unknown,
            ]
        );
        assert_eq!(stats.propagated, 1);
        assert_eq!(stats.unknown, 4);
        assert_eq!(&phase[2..], &[9.0; 4]);
    }

    #[test]
    fn test_known_bins_below_tolerance_are_not_seeds() {
        let h = 3;
        let mut task = HeapIntTask::new(h, 2).unwrap();
        let known = [true, true, true, false, false, false];
        let logs = [-700.0, -700.0, -700.0, -700.0, 0.0, -700.0];
        task.reset_mask(&known, &logs, LOGTOL).unwrap();
        assert_eq!(
            task.mask(),
            &[
                BinState::Unknown,
                BinState::Unknown,
                BinState::Unknown,
                BinState::Unknown,
                BinState::AboveTol,
                BinState::Unknown,
            ]
        );

        let mut phase = [0.0, 0.0, 0.0, 0.0, 7.0, 0.0];
        let stats = task
            .execute(&logs, &[1.0; 6], &[1.0; 6], &mut phase)
            .unwrap();
        assert_eq!(stats.seeded, 0);
        assert_eq!(stats.propagated, 0);
        assert_eq!(task.mask()[4], BinState::Unknown);
        assert_eq!(phase[4], 7.0);
    }

    #[test]
    fn test_tolerance_is_exclusive() {
        let mut task = HeapIntTask::new(3, 1).unwrap();
        let logs = [LOGTOL - 1e-9, LOGTOL, LOGTOL + 1e-9];
        task.reset_mask(&[false; 3], &logs, LOGTOL).unwrap();
        assert_eq!(
            task.mask(),
            &[BinState::Unknown, BinState::Unknown, BinState::AboveTol]
        );
    }

    #[test]
    fn test_without_seeds_nothing_is_integrated() {
        let mut task = HeapIntTask::new(3, 2).unwrap();
        let logs = [1.0; 6];
        task.reset_mask(&[false; 6], &logs, LOGTOL).unwrap();
        let mut phase = [0.0; 6];
        let stats = task
            .execute(&logs, &[1.0; 6], &[1.0; 6], &mut phase)
            .unwrap();
        assert_eq!(stats.seeded, 0);
        assert_eq!(stats.unknown, 6);
        assert_eq!(phase, [0.0; 6]);
    }

    #[test]
    fn test_mismatched_lengths() {
        let mut task = HeapIntTask::new(4, 2).unwrap();
        assert_eq!(
            task.reset_mask(&[false; 7], &[0.0; 8], LOGTOL),
            Err(PhaseError::BadSize {
                expected: 8,
                provided: 7
            })
        );
        let mut phase = [0.0; 8];
        assert!(task
            .execute(&[0.0; 8], &[0.0; 8], &[0.0; 3], &mut phase)
            .is_err());
    }

    #[test]
    fn test_empty_plane_is_rejected() {
        assert!(matches!(
            HeapIntTask::new(0, 2),
            Err(PhaseError::NotPositiveArgument(_))
        ));
    }
}
