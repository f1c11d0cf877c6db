//! Per-node bookkeeping for offsets that have already been resolved.

use simple_sds::raw_vector::{AccessRaw, RawVector};

//-----------------------------------------------------------------------------

/// One bit per offset in a node label.
///
/// The marker is sized once for the longest label in the graph and reused for every node.
/// A marked offset stays marked until the marker is drained or reset.
/// Marked offsets are only tallied when the marker is drained, so each offset is counted at most once per node.
///
/// # Examples
///
/// ```
/// use gloci::CoverageMarker;
///
/// let mut marker = CoverageMarker::new(10);
/// marker.mark(3);
/// marker.mark(7);
/// marker.mark(3);
/// assert!(marker.is_marked(3));
/// assert!(!marker.is_marked(4));
/// assert_eq!(marker.drain_count(), 2);
/// assert!(!marker.is_marked(3));
/// ```
#[derive(Clone, Debug)]
pub struct CoverageMarker {
    bits: RawVector,
    // Marked offsets in the order they were marked.
    marked: Vec<usize>,
}

impl CoverageMarker {
    /// Creates a marker for labels of up to `max_len` characters.
    pub fn new(max_len: usize) -> Self {
        CoverageMarker {
            bits: RawVector::with_len(max_len, false),
            marked: Vec::new(),
        }
    }

    /// Returns the maximum label length supported by the marker.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Returns the number of marked offsets.
    #[inline]
    pub fn count(&self) -> usize {
        self.marked.len()
    }

    /// Returns `true` if the offset has been marked.
    ///
    /// Offsets past the capacity are never marked.
    #[inline]
    pub fn is_marked(&self, offset: usize) -> bool {
        offset < self.bits.len() && self.bits.bit(offset)
    }

    /// Marks the offset.
    ///
    /// Marking an offset again has no effect.
    ///
    /// # Panics
    ///
    /// Will panic if `offset >= self.capacity()`.
    pub fn mark(&mut self, offset: usize) {
        assert!(offset < self.bits.len(), "Offset {} is outside the marker (capacity {})", offset, self.bits.len());
        if !self.bits.bit(offset) {
            self.bits.set_bit(offset, true);
            self.marked.push(offset);
        }
    }

    /// Returns the marked offsets in the order they were marked.
    pub fn marked(&self) -> &[usize] {
        &self.marked
    }

    /// Clears all marks.
    pub fn reset(&mut self) {
        for offset in self.marked.iter() {
            self.bits.set_bit(*offset, false);
        }
        self.marked.clear();
    }

    /// Returns the number of marked offsets and clears the marker.
    pub fn drain_count(&mut self) -> usize {
        let result = self.marked.len();
        self.reset();
        result
    }

    /// Returns the number of offsets marked here but not in `other` and clears both markers.
    ///
    /// If `offsets` is present, the counted offsets are appended to it in increasing order.
    pub fn drain_count_unless(&mut self, other: &mut CoverageMarker, offsets: Option<&mut Vec<usize>>) -> usize {
        let mut selected: Vec<usize> = self.marked.iter().copied().filter(|offset| !other.is_marked(*offset)).collect();
        let result = selected.len();
        if let Some(offsets) = offsets {
            selected.sort_unstable();
            offsets.extend(selected);
        }
        self.reset();
        other.reset();
        result
    }
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_marker() {
        let mut marker = CoverageMarker::new(0);
        assert_eq!(marker.capacity(), 0, "Wrong capacity");
        assert!(!marker.is_marked(0), "An empty marker has a marked offset");
        assert_eq!(marker.drain_count(), 0, "An empty marker has a non-zero count");
    }

    #[test]
    fn marks_are_counted_once() {
        let mut marker = CoverageMarker::new(16);
        for offset in [5, 2, 5, 15, 2, 2] {
            marker.mark(offset);
        }
        assert_eq!(marker.count(), 3, "Repeated marks were counted");
        assert_eq!(marker.marked(), &[5, 2, 15], "Wrong marked offsets");
        assert_eq!(marker.drain_count(), 3, "Wrong drained count");
        for offset in 0..marker.capacity() {
            assert!(!marker.is_marked(offset), "Offset {} is still marked after draining", offset);
        }
        assert_eq!(marker.drain_count(), 0, "Draining twice counted the offsets again");
    }

    #[test]
    fn reuse_after_reset() {
        let mut marker = CoverageMarker::new(8);
        marker.mark(7);
        marker.reset();
        assert!(!marker.is_marked(7), "Reset did not clear the mark");
        marker.mark(7);
        marker.mark(0);
        assert_eq!(marker.drain_count(), 2, "Wrong count after reuse");
    }

    #[test]
    fn difference_of_markers() {
        let mut absent = CoverageMarker::new(10);
        let mut present = CoverageMarker::new(10);
        for offset in [9, 4, 6, 1] {
            absent.mark(offset);
        }
        present.mark(4);
        present.mark(8);

        let mut offsets = Vec::new();
        let count = absent.drain_count_unless(&mut present, Some(&mut offsets));
        assert_eq!(count, 3, "Wrong number of offsets in the difference");
        assert_eq!(offsets, vec![1, 6, 9], "Wrong offsets in the difference");
        assert_eq!(absent.count() + present.count(), 0, "The markers were not cleared");
    }

    #[test]
    #[should_panic]
    fn mark_past_capacity() {
        let mut marker = CoverageMarker::new(4);
        marker.mark(4);
    }
}

//-----------------------------------------------------------------------------
