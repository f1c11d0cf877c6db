//! A bounded buffer for the sequence of a path prefix.

use std::ops::Range;

//-----------------------------------------------------------------------------

/// Concatenated sequence of the nodes on a path prefix.
///
/// The window always starts at the beginning of the first node on the path, so offsets in the first node are also offsets in the window.
/// Appending stops at the limit given to [`SequenceWindow::extend`], as characters beyond one seed past the end of the first node are never needed.
/// Retreating along the path truncates the most recently appended characters with [`SequenceWindow::trim_to`].
///
/// # Examples
///
/// ```
/// use gloci::SequenceWindow;
///
/// let mut window = SequenceWindow::new();
/// window.extend(b"GATT", 6);
/// window.extend(b"ACA", 6);
/// assert_eq!(window.len(), 6);
/// assert_eq!(window.slice(2..6), Some(b"TTAC".as_slice()));
///
/// window.trim_to(4);
/// assert_eq!(window.sequence(), b"GATT");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceWindow {
    sequence: Vec<u8>,
}

impl SequenceWindow {
    /// Creates an empty window.
    pub fn new() -> Self {
        SequenceWindow::default()
    }

    /// Returns the length of the window.
    #[inline]
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns `true` if the window is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Returns the sequence in the window.
    #[inline]
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Appends the label to the window without letting the window grow past `limit` characters.
    ///
    /// Returns the number of characters appended.
    pub fn extend(&mut self, label: &[u8], limit: usize) -> usize {
        let available = limit.saturating_sub(self.sequence.len());
        let count = label.len().min(available);
        self.sequence.extend_from_slice(&label[..count]);
        count
    }

    /// Truncates the window to at most `max_len` characters by dropping the newest characters from the end.
    ///
    /// The start of the window is kept, so offsets relative to the first node remain valid.
    /// Does nothing if the window is already short enough.
    pub fn trim_to(&mut self, max_len: usize) {
        self.sequence.truncate(max_len);
    }

    /// Returns the characters in the given range, or [`None`] if the range does not fit in the window.
    pub fn slice(&self, range: Range<usize>) -> Option<&[u8]> {
        self.sequence.get(range)
    }

    /// Empties the window.
    pub fn clear(&mut self) {
        self.sequence.clear();
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
