//! Index max-heap ordered by an externally owned priority array.
//!
//! The heap stores plane indices only. Priorities live in a slice owned by
//! the caller and are bound for the duration of one integration pass with
//! [`PriorityHeap::reset`], which is O(1) and never reallocates, so a single
//! heap serves every frame of a stream.

use std::cmp::Ordering;

use crate::error::{try_zeroed, PhaseError};

/// Growth factor applied when an insert finds the heap full.
const GROWTH_FACTOR: usize = 2;

/// Backing storage for an index max-heap.
#[derive(Debug, Clone)]
pub struct PriorityHeap {
    slots: Vec<usize>,
    len: usize,
}

impl PriorityHeap {
    /// Creates a heap able to hold `capacity` indices before growing.
    pub fn with_capacity(capacity: usize) -> Result<Self, PhaseError> {
        Ok(Self {
            slots: try_zeroed(capacity.max(1))?,
            len: 0,
        })
    }

    /// Number of indices the heap holds before it has to grow.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Empties the heap and binds it to a new priority array.
    pub fn reset<'a>(&'a mut self, priority: &'a [f64]) -> HeapCursor<'a> {
        self.len = 0;
        HeapCursor {
            heap: self,
            priority,
        }
    }

    /// Reallocates the backing storage to `factor` times its current
    /// capacity, keeping the stored indices.
    pub fn grow(&mut self, factor: usize) -> Result<(), PhaseError> {
        let factor = factor.max(2);
        let new_cap = self
            .capacity()
            .checked_mul(factor)
            .ok_or(PhaseError::AllocationFailure {
                requested: usize::MAX,
            })?;
        let extra = new_cap - self.slots.len();
        self.slots
            .try_reserve_exact(extra)
            .map_err(|_| PhaseError::AllocationFailure { requested: new_cap })?;
        self.slots.resize(new_cap, 0);
        Ok(())
    }
}

/// A [`PriorityHeap`] bound to the priority array of one integration pass.
#[derive(Debug)]
pub struct HeapCursor<'a> {
    heap: &'a mut PriorityHeap,
    priority: &'a [f64],
}

impl<'a> HeapCursor<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.heap.capacity()
    }

    /// The bound priority array.
    #[inline]
    pub fn priority(&self) -> &'a [f64] {
        self.priority
    }

    /// Index with the largest priority, without removing it.
    #[inline]
    pub fn peek(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.heap.slots[0])
        }
    }

    /// See [`PriorityHeap::grow`].
    pub fn grow(&mut self, factor: usize) -> Result<(), PhaseError> {
        self.heap.grow(factor)
    }

    /// Adds `key` and restores heap order by sifting it up.
    pub fn insert(&mut self, key: usize) -> Result<(), PhaseError> {
        if key >= self.priority.len() {
            return Err(PhaseError::CannotHappen(format!(
                "heap key {} outside priority array of {} entries",
                key,
                self.priority.len()
            )));
        }
        if self.heap.len == self.heap.capacity() {
            self.heap.grow(GROWTH_FACTOR)?;
        }

        let mut pos = self.heap.len;
        self.heap.len += 1;
        while pos > 0 {
            let parent = (pos - 1) / 2;
            let above = self.heap.slots[parent];
            if !self.outranks(key, above) {
                break;
            }
            self.heap.slots[pos] = above;
            pos = parent;
        }
        self.heap.slots[pos] = key;
        Ok(())
    }

    /// Removes and returns the index with the largest priority, or `None`
    /// when the heap is empty.
    pub fn delete_max(&mut self) -> Option<usize> {
        if self.heap.len == 0 {
            return None;
        }
        let top = self.heap.slots[0];
        self.heap.len -= 1;
        let len = self.heap.len;
        if len == 0 {
            return Some(top);
        }

        let last = self.heap.slots[len];
        let mut pos = 0;
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut child = left;
            if right < len && self.outranks(self.heap.slots[right], self.heap.slots[left]) {
                child = right;
            }
            if !self.outranks(self.heap.slots[child], last) {
                break;
            }
            self.heap.slots[pos] = self.heap.slots[child];
            pos = child;
        }
        self.heap.slots[pos] = last;
        Some(top)
    }

    /// Whether `a` belongs above `b`. Equal priorities go to the lower index.
    #[inline]
    fn outranks(&self, a: usize, b: usize) -> bool {
        match self.priority[a].total_cmp(&self.priority[b]) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => a < b,
        }
    }
}
