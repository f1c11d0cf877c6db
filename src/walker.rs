//! Depth-first traversal with explicit backtracking.

use crate::GraphStore;

use gbwt::support;

//-----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
struct Frame {
    handle: usize,
    successors: Vec<usize>,
    // Index of the next unexplored successor.
    next: usize,
    // Total sequence length of the path up to and including this node.
    len: usize,
}

impl Frame {
    fn new<G: GraphStore + ?Sized>(graph: &G, handle: usize, prefix_len: usize) -> Result<Self, String> {
        let node_id = support::node_id(handle);
        let node_len = graph.sequence_len(node_id).ok_or(
            format!("The graph does not contain node {}", node_id)
        )?;
        let successors = graph.successors(handle).ok_or(
            format!("The graph does not contain handle {}", handle)
        )?;
        Ok(Frame { handle, successors, next: 0, len: prefix_len + node_len })
    }

    #[inline]
    fn has_unexplored(&self) -> bool {
        self.next < self.successors.len()
    }
}

//-----------------------------------------------------------------------------

/// A depth-first walker over the paths starting from a node.
///
/// The walker keeps the current path as a stack of frames, one for each node.
/// [`Backtracker::step_forward`] follows the next unexplored successor of the last node.
/// [`Backtracker::step_back`] returns to the last branch point that still has unexplored successors.
/// Successors are explored in the order the graph lists them.
///
/// # Examples
///
/// ```
/// use gloci::{Backtracker, SeqGraph};
/// use gbwt::Orientation;
/// use gbwt::support;
///
/// // 1 -> {2, 3}
/// let mut graph = SeqGraph::new();
/// graph.add_node(1, b"A".to_vec()).unwrap();
/// graph.add_node(2, b"CC".to_vec()).unwrap();
/// graph.add_node(3, b"GGG".to_vec()).unwrap();
/// graph.add_edge((1, Orientation::Forward), (2, Orientation::Forward)).unwrap();
/// graph.add_edge((1, Orientation::Forward), (3, Orientation::Forward)).unwrap();
///
/// let handle = |id| support::encode_node(id, Orientation::Forward);
/// let mut walker = Backtracker::new();
/// walker.reset(&graph, handle(1)).unwrap();
/// assert_eq!(walker.step_forward(&graph).unwrap(), Some(handle(2)));
/// assert!(walker.at_dead_end());
/// assert_eq!(walker.path_len(), 3);
///
/// // Back to node 1, which still has an unexplored successor.
/// assert_eq!(walker.step_back(), Some(1));
/// assert_eq!(walker.step_forward(&graph).unwrap(), Some(handle(3)));
/// assert_eq!(walker.path(), vec![handle(1), handle(3)]);
/// assert_eq!(walker.step_back(), None);
/// assert!(walker.at_end());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Backtracker {
    stack: Vec<Frame>,
}

impl Backtracker {
    /// Creates a walker with an empty path.
    pub fn new() -> Self {
        Backtracker::default()
    }

    /// Starts a new traversal from the given handle.
    ///
    /// Returns an error if the graph does not contain the node.
    pub fn reset<G: GraphStore + ?Sized>(&mut self, graph: &G, start: usize) -> Result<(), String> {
        self.stack.clear();
        let frame = Frame::new(graph, start, 0)?;
        self.stack.push(frame);
        Ok(())
    }

    /// Returns `true` if the traversal has been exhausted.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.stack.is_empty()
    }

    /// Returns `true` if the last node on the path has no successors.
    pub fn at_dead_end(&self) -> bool {
        self.stack.last().map_or(true, |frame| frame.successors.is_empty())
    }

    /// Returns the number of nodes on the current path.
    #[inline]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Returns the handle of the last node on the current path.
    pub fn current(&self) -> Option<usize> {
        self.stack.last().map(|frame| frame.handle)
    }

    /// Returns the handles on the current path.
    pub fn path(&self) -> Vec<usize> {
        self.stack.iter().map(|frame| frame.handle).collect()
    }

    /// Returns the total sequence length of the current path.
    pub fn path_len(&self) -> usize {
        self.stack.last().map_or(0, |frame| frame.len)
    }

    /// Extends the path with the next unexplored successor of the last node.
    ///
    /// Returns the handle of the new node, or [`None`] if the last node has no unexplored successors.
    /// Returns an error if the successor is not in the graph.
    pub fn step_forward<G: GraphStore + ?Sized>(&mut self, graph: &G) -> Result<Option<usize>, String> {
        let (handle, prefix_len) = match self.stack.last_mut() {
            Some(frame) if frame.has_unexplored() => {
                let handle = frame.successors[frame.next];
                frame.next += 1;
                (handle, frame.len)
            },
            _ => return Ok(None),
        };
        let frame = Frame::new(graph, handle, prefix_len)?;
        self.stack.push(frame);
        Ok(Some(handle))
    }

    /// Removes the last node from the path and retreats to the last branch point.
    ///
    /// Returns the sequence length of the path ending at the branch point, or [`None`] if all paths have been explored.
    pub fn step_back(&mut self) -> Option<usize> {
        self.stack.pop();
        while let Some(frame) = self.stack.last() {
            if frame.has_unexplored() {
                return Some(frame.len);
            }
            self.stack.pop();
        }
        None
    }
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
