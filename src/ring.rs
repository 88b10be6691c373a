//! Cursor arithmetic for the four-region particle ring.
//!
//! The ring is split into contiguous (possibly wrapping) regions, in order:
//!
//! | Region | Range | Meaning |
//! |--------|-------|---------|
//! | retired | `retired..active` | expired, possibly still read by the GPU |
//! | active | `active..new` | alive and drawn |
//! | new | `new..free` | spawned since the last draw, not yet uploaded |
//! | free | `free..retired` | available for spawning |
//!
//! A slot's state is implied by the region it falls in; no per-slot tag is
//! stored. `free == retired` would be ambiguous, so spawning stops one slot
//! short of it and a ring of capacity N never holds more than N - 1 particles.

use std::ops::Range;

/// The four cursors delimiting the ring regions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RingCursors {
    /// First retired slot.
    pub retired: usize,
    /// First active slot.
    pub active: usize,
    /// First new slot.
    pub new: usize,
    /// First free slot.
    pub free: usize,
}

/// Index one past `index`, wrapping at `capacity`.
#[inline]
pub fn next(index: usize, capacity: usize) -> usize {
    let next = index + 1;
    if next >= capacity {
        0
    } else {
        next
    }
}

/// Number of slots walked going forward from `from` to `to`.
#[inline]
pub fn distance(from: usize, to: usize, capacity: usize) -> usize {
    if to >= from {
        to - from
    } else {
        capacity - from + to
    }
}

impl RingCursors {
    /// Slots waiting out the GPU latency delay.
    pub fn retired_len(&self, capacity: usize) -> usize {
        distance(self.retired, self.active, capacity)
    }

    /// Slots currently alive and drawable.
    pub fn active_len(&self, capacity: usize) -> usize {
        distance(self.active, self.new, capacity)
    }

    /// Slots spawned but not yet promoted.
    pub fn new_len(&self, capacity: usize) -> usize {
        distance(self.new, self.free, capacity)
    }

    /// Slots available for spawning, excluding the sentinel slot.
    ///
    /// `free == retired` only happens when every other region is empty.
    pub fn free_len(&self, capacity: usize) -> usize {
        (distance(self.free, self.retired, capacity) + capacity - 1) % capacity
    }

    /// Whether `retired <= active <= new <= free` holds modulo `capacity`.
    pub fn is_ordered(&self, capacity: usize) -> bool {
        let in_bounds = [self.retired, self.active, self.new, self.free]
            .iter()
            .all(|&c| c < capacity);

        in_bounds
            && self.retired_len(capacity) + self.active_len(capacity) + self.new_len(capacity)
                == distance(self.retired, self.free, capacity)
    }
}

/// A region of the ring as one range, or two when it wraps past the end.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlotRanges {
    head: Range<usize>,
    tail: Option<Range<usize>>,
}

impl SlotRanges {
    /// The slots from `start` up to (not including) `end`.
    pub fn between(start: usize, end: usize, capacity: usize) -> Self {
        if start <= end {
            Self {
                head: start..end,
                tail: None,
            }
        } else {
            Self {
                head: start..capacity,
                tail: (end > 0).then_some(0..end),
            }
        }
    }

    /// Total number of slots covered.
    pub fn len(&self) -> usize {
        self.head.len() + self.tail.as_ref().map_or(0, |t| t.len())
    }

    /// True if no slot is covered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the region wraps and needs two calls to cover.
    pub fn is_split(&self) -> bool {
        self.tail.is_some()
    }

    /// The non-empty ranges, in submission order.
    pub fn iter(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        std::iter::once(self.head.clone())
            .chain(self.tail.clone())
            .filter(|r| !r.is_empty())
    }
}
