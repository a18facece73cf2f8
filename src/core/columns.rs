//! Fixed-depth sliding window of spectral columns.

use crate::error::{checked_len, try_zeroed, PhaseError};

/// A window of `depth` columns of `height` values each, stored contiguously
/// from oldest (column 0) to newest (column `depth - 1`).
///
/// The only mutation that moves data is [`ColumnWindow::shift_in`], which
/// drops the oldest column and opens a new newest one. Memory is allocated
/// once at construction.
#[derive(Debug, Clone)]
pub struct ColumnWindow {
    data: Vec<f64>,
    height: usize,
    depth: usize,
}

impl ColumnWindow {
    /// Creates a window with every value set to `fill`.
    pub fn new(height: usize, depth: usize, fill: f64) -> Result<Self, PhaseError> {
        let mut data = try_zeroed(checked_len(height, depth)?)?;
        data.fill(fill);
        Ok(Self {
            data,
            height,
            depth,
        })
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Drops the oldest column and copies `newest` into the freed slot, or
    /// sets it to `fill` when no column is supplied.
    ///
    /// `newest` must hold exactly `height` values.
    pub fn shift_in(&mut self, newest: Option<&[f64]>, fill: f64) {
        let h = self.height;
        if self.depth > 1 {
            self.data.copy_within(h.., 0);
        }
        let slot = self.newest_mut();
        match newest {
            Some(col) => slot.copy_from_slice(&col[..h]),
            None => slot.fill(fill),
        }
    }

    /// Drops the oldest column and duplicates the previous newest one.
    pub fn repeat_newest(&mut self) {
        let h = self.height;
        if self.depth > 1 {
            self.data.copy_within(h.., 0);
            let last = (self.depth - 1) * h;
            self.data.copy_within(last - h..last, last);
        }
    }

    /// Column `idx`, 0 being the oldest.
    #[inline]
    pub fn column(&self, idx: usize) -> &[f64] {
        &self.data[idx * self.height..(idx + 1) * self.height]
    }

    #[inline]
    pub fn column_mut(&mut self, idx: usize) -> &mut [f64] {
        &mut self.data[idx * self.height..(idx + 1) * self.height]
    }

    /// Contiguous run of `count` columns starting at `first`.
    #[inline]
    pub fn columns(&self, first: usize, count: usize) -> &[f64] {
        &self.data[first * self.height..(first + count) * self.height]
    }

    #[inline]
    pub fn newest(&self) -> &[f64] {
        self.column(self.depth - 1)
    }

    #[inline]
    pub fn newest_mut(&mut self) -> &mut [f64] {
        self.column_mut(self.depth - 1)
    }

    /// Whole window, oldest column first.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Sets every value to `fill`.
    pub fn fill(&mut self, fill: f64) {
        self.data.fill(fill);
    }
}
