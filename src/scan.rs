//! Finding loci that are not covered by any seed in the index.
//!
//! A locus is a position in a node label.
//! The seed for a locus is the string of length `seed_len` starting at the locus and following a walk in the graph.
//! A locus is uncovered if its seed is absent from the index.
//!
//! The scan processes the nodes in rank order:
//!
//! * An *interior* locus has its seed fully inside the node, and a single query decides it.
//! * A *boundary* locus is within `seed_len - 1` bp of the end of the node.
//!   Its seed depends on the walk, and the walks are enumerated with a [`Backtracker`].
//!   See [`BranchPolicy`] and [`DeadEndPolicy`] for how the answers from different walks are combined.
//!
//! [`NodeScanner`] handles a single node, while [`GraphScan`] drives the entire scan and updates a shared [`ScanSession`].

use crate::{Backtracker, CoverageMarker, GraphStore, SeedIndex, SeedQuery, SequenceWindow};
use crate::graph::MAX_NODE_ID;

use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use gbwt::Orientation;
use gbwt::support;

use log::{debug, info};


//-----------------------------------------------------------------------------

/// How the answers for a boundary locus from different walks are combined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BranchPolicy {
    /// The locus is uncovered if the seed is absent on any walk.
    ///
    /// Once a locus has been found uncovered, it is not queried again on later walks.
    #[default]
    FirstAbsence,

    /// The locus is uncovered if the seed is absent on every walk that yields a full seed.
    ///
    /// Once a seed has been found on some walk, the locus is not queried again.
    AllAbsent,
}

/// How a boundary locus is treated when a walk reaches a dead end before the seed is complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DeadEndPolicy {
    /// The walk does not say anything about the locus.
    #[default]
    Skip,

    /// The truncated seed counts as an absent seed.
    Uncovered,
}

/// Parameters for the coverage scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanParams {
    /// Seed length in bp.
    pub seed_len: usize,

    /// Combining the answers from different walks.
    pub branch_policy: BranchPolicy,

    /// Handling walks that end before the seed is complete.
    pub dead_end_policy: DeadEndPolicy,
}

impl ScanParams {
    /// Returns parameters with the given seed length and the default policies.
    pub fn new(seed_len: usize) -> Self {
        ScanParams {
            seed_len,
            branch_policy: BranchPolicy::default(),
            dead_end_policy: DeadEndPolicy::default(),
        }
    }
}

//-----------------------------------------------------------------------------

// Boundary loci resolved so far in the current node.
struct Resolution {
    policy: BranchPolicy,
    uncovered: CoverageMarker,
    // Only used with `BranchPolicy::AllAbsent`.
    covered: CoverageMarker,
}

impl Resolution {
    fn new(policy: BranchPolicy, max_len: usize) -> Self {
        let covered_len = if policy == BranchPolicy::AllAbsent { max_len } else { 0 };
        Resolution {
            policy,
            uncovered: CoverageMarker::new(max_len),
            covered: CoverageMarker::new(covered_len),
        }
    }

    // Returns `true` if further walks cannot change the status of the offset.
    #[inline]
    fn is_resolved(&self, offset: usize) -> bool {
        match self.policy {
            BranchPolicy::FirstAbsence => self.uncovered.is_marked(offset),
            BranchPolicy::AllAbsent => self.covered.is_marked(offset),
        }
    }

    fn record(&mut self, offset: usize, found: bool) {
        if found {
            if self.policy == BranchPolicy::AllAbsent {
                self.covered.mark(offset);
            }
        } else {
            self.uncovered.mark(offset);
        }
    }

    // Returns the number of uncovered offsets and clears the markers.
    fn drain(&mut self, offsets: Option<&mut Vec<usize>>) -> usize {
        match self.policy {
            BranchPolicy::FirstAbsence => {
                if let Some(offsets) = offsets {
                    let start = offsets.len();
                    offsets.extend_from_slice(self.uncovered.marked());
                    offsets[start..].sort_unstable();
                }
                self.uncovered.drain_count()
            },
            BranchPolicy::AllAbsent => self.uncovered.drain_count_unless(&mut self.covered, offsets),
        }
    }
}

//-----------------------------------------------------------------------------

/// Counts the uncovered loci in a single node.
///
/// The scanner owns the sequence window, the walker, and the coverage markers, and reuses them for every node.
///
/// # Examples
///
/// ```
/// use gloci::{KmerIndex, NodeScanner, ScanParams, SeqGraph};
/// use gbwt::Orientation;
///
/// // 1 -> 2 with labels AAAA and TTTT.
/// let mut graph = SeqGraph::new();
/// graph.add_node(1, b"AAAA".to_vec()).unwrap();
/// graph.add_node(2, b"TTTT".to_vec()).unwrap();
/// graph.add_edge((1, Orientation::Forward), (2, Orientation::Forward)).unwrap();
///
/// // The index knows the seeds crossing the edge, except for the one starting at offset 1.
/// let index = KmerIndex::from_sequences(5, [b"AAAAT".as_slice(), b"AATTT", b"ATTTT", b"TTTT"]);
/// let mut scanner = NodeScanner::new(&graph, &index, ScanParams::new(5)).unwrap();
/// let mut offsets = Vec::new();
/// assert_eq!(scanner.scan_node(1, Some(&mut offsets)).unwrap(), 1);
/// assert_eq!(offsets, vec![1]);
/// ```
pub struct NodeScanner<'a, G: GraphStore + ?Sized, I: SeedIndex + ?Sized> {
    graph: &'a G,
    query: SeedQuery<'a, I>,
    params: ScanParams,
    window: SequenceWindow,
    walker: Backtracker,
    resolution: Resolution,
    queries: usize,
}

impl<'a, G: GraphStore + ?Sized, I: SeedIndex + ?Sized> NodeScanner<'a, G, I> {
    /// Creates a scanner for the graph and the index.
    ///
    /// Returns an error if the seed length is not compatible with the index.
    pub fn new(graph: &'a G, index: &'a I, params: ScanParams) -> Result<Self, String> {
        let query = SeedQuery::new(index, params.seed_len)?;
        let resolution = Resolution::new(params.branch_policy, graph.max_sequence_len());
        Ok(NodeScanner {
            graph,
            query,
            params,
            window: SequenceWindow::new(),
            walker: Backtracker::new(),
            resolution,
            queries: 0,
        })
    }

    /// Returns the parameters of the scan.
    #[inline]
    pub fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Returns the number of index queries made so far.
    #[inline]
    pub fn queries(&self) -> usize {
        self.queries
    }

    /// Returns the number of uncovered loci in the forward orientation of the node.
    ///
    /// If `offsets` is present, the uncovered offsets are appended to it.
    /// Interior offsets come first, followed by boundary offsets, both in increasing order.
    /// Returns an error if the node is not in the graph or the graph refers to missing nodes.
    pub fn scan_node(&mut self, node_id: usize, mut offsets: Option<&mut Vec<usize>>) -> Result<usize, String> {
        let graph = self.graph;
        if node_id > MAX_NODE_ID {
            return Err(format!("Node identifier {} is too large", node_id));
        }
        let handle = support::encode_node(node_id, Orientation::Forward);
        let label = graph.sequence(handle).ok_or(format!("The graph does not contain node {}", node_id))?;
        let node_len = label.len();
        if node_len == 0 {
            return Ok(0);
        }

        // Interior seeds.
        let seed_len = self.params.seed_len;
        let mut result = 0;
        if node_len >= seed_len {
            for offset in 0..=(node_len - seed_len) {
                self.queries += 1;
                if !self.query.seed_exists(&label, offset) {
                    result += 1;
                    if let Some(offsets) = offsets.as_mut() {
                        offsets.push(offset);
                    }
                }
            }
        }

        // Boundary seeds.
        if seed_len > 1 {
            result += self.scan_boundary(handle, &label, offsets)?;
        }

        Ok(result)
    }

    fn scan_boundary(&mut self, handle: usize, label: &[u8], offsets: Option<&mut Vec<usize>>) -> Result<usize, String> {
        let graph = self.graph;
        let node_len = label.len();
        let seed_len = self.params.seed_len;
        // Offsets `first..node_len` need characters from the successors.
        let first = node_len.saturating_sub(seed_len - 1);
        // The seed starting at the last offset ends here.
        let limit = node_len - 1 + seed_len;

        self.window.clear();
        self.window.extend(label, limit);
        self.walker.reset(graph, handle)?;
        let mut lower = first;
        loop {
            // Extend the window until it contains all seeds or the walk reaches a dead end.
            while self.window.len() < limit && self.walker.depth() <= limit {
                match self.walker.step_forward(graph)? {
                    Some(next) => {
                        let sequence = graph.sequence(next).ok_or(format!("The graph does not contain handle {}", next))?;
                        self.window.extend(&sequence, limit);
                    },
                    None => break,
                }
            }

            let sequence = self.window.sequence();
            for offset in lower..node_len {
                if self.resolution.is_resolved(offset) {
                    continue;
                }
                if offset + seed_len <= sequence.len() {
                    self.queries += 1;
                    let found = self.query.seed_exists(sequence, offset);
                    self.resolution.record(offset, found);
                } else if self.params.dead_end_policy == DeadEndPolicy::Uncovered {
                    self.resolution.record(offset, false);
                }
            }
            while lower < node_len && self.resolution.is_resolved(lower) {
                lower += 1;
            }
            if lower >= node_len {
                break;
            }

            match self.walker.step_back() {
                Some(len) => self.window.trim_to(len),
                None => break,
            }
        }

        Ok(self.resolution.drain(offsets))
    }
}

//-----------------------------------------------------------------------------

/// A snapshot of the scan progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub done_loci: usize,
    pub total_loci: usize,
    pub uncovered_loci: usize,
    pub elapsed: Duration,
}

impl Progress {
    /// Returns the processed fraction of loci as a percentage.
    pub fn percent(&self) -> usize {
        if self.total_loci == 0 {
            100
        } else {
            self.done_loci * 100 / self.total_loci
        }
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f, "Queried {} out of {} with {} uncovered loci in {:.3} seconds: {}% done.",
            self.done_loci, self.total_loci, self.uncovered_loci, self.elapsed.as_secs_f64(), self.percent()
        )
    }
}

/// Counters for a scan in progress.
///
/// The counters only increase, and only [`GraphScan`] updates them.
/// Other threads may read a snapshot at any time without locking, but the counters in a snapshot may be slightly out of sync.
///
/// # Examples
///
/// ```
/// use gloci::ScanSession;
///
/// let session = ScanSession::new(100);
/// session.add_node(40, 3);
/// let progress = session.snapshot();
/// assert_eq!(progress.done_loci, 40);
/// assert_eq!(progress.uncovered_loci, 3);
/// assert_eq!(progress.percent(), 40);
/// ```
#[derive(Debug)]
pub struct ScanSession {
    total_loci: AtomicUsize,
    done_loci: AtomicUsize,
    uncovered_loci: AtomicUsize,
    nodes: AtomicUsize,
    start: Instant,
}

impl ScanSession {
    /// Starts a new session for a graph with the given number of loci.
    pub fn new(total_loci: usize) -> Self {
        ScanSession {
            total_loci: AtomicUsize::new(total_loci),
            done_loci: AtomicUsize::new(0),
            uncovered_loci: AtomicUsize::new(0),
            nodes: AtomicUsize::new(0),
            start: Instant::now(),
        }
    }

    /// Records a processed node with the given number of loci and uncovered loci.
    pub fn add_node(&self, loci: usize, uncovered: usize) {
        self.done_loci.fetch_add(loci, Ordering::Relaxed);
        self.uncovered_loci.fetch_add(uncovered, Ordering::Relaxed);
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the total number of loci.
    pub fn total_loci(&self) -> usize {
        self.total_loci.load(Ordering::Relaxed)
    }

    /// Returns the number of processed loci.
    pub fn done_loci(&self) -> usize {
        self.done_loci.load(Ordering::Relaxed)
    }

    /// Returns the number of uncovered loci found so far.
    pub fn uncovered_loci(&self) -> usize {
        self.uncovered_loci.load(Ordering::Relaxed)
    }

    /// Returns the number of processed nodes.
    pub fn nodes(&self) -> usize {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Returns the time since the session started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns a snapshot of the counters.
    pub fn snapshot(&self) -> Progress {
        Progress {
            done_loci: self.done_loci(),
            total_loci: self.total_loci(),
            uncovered_loci: self.uncovered_loci(),
            elapsed: self.elapsed(),
        }
    }
}

//-----------------------------------------------------------------------------

/// Final results of a scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScanReport {
    pub nodes: usize,
    pub total_loci: usize,
    pub uncovered_loci: usize,
    pub queries: usize,
    pub seconds: f64,
}

impl ScanReport {
    /// Returns the fraction of uncovered loci, or `0.0` for an empty graph.
    pub fn uncovered_ratio(&self) -> f64 {
        if self.total_loci == 0 {
            0.0
        } else {
            self.uncovered_loci as f64 / self.total_loci as f64
        }
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Two decimal places rather than two significant digits.
        write!(
            f, "Found {} uncovered loci out of {} ({:.2}%).",
            self.uncovered_loci, self.total_loci, self.uncovered_ratio() * 100.0
        )
    }
}

/// Writes the header line for the uncovered loci.
pub fn write_loci_header<T: Write>(output: &mut T) -> io::Result<()> {
    output.write_all(b"#node_id\toffset\n")
}

/// Writes one line for each uncovered offset in the node.
pub fn write_loci<T: Write>(node_id: usize, offsets: &[usize], output: &mut T) -> io::Result<()> {
    let mut buffer: Vec<u8> = Vec::new();
    for offset in offsets.iter() {
        buffer.extend_from_slice(node_id.to_string().as_bytes());
        buffer.push(b'\t');
        buffer.extend_from_slice(offset.to_string().as_bytes());
        buffer.push(b'\n');
    }
    output.write_all(&buffer)
}

//-----------------------------------------------------------------------------

/// Scans all nodes of the graph in rank order.
///
/// # Examples
///
/// ```
/// use gloci::{GraphScan, KmerIndex, ScanParams, ScanSession, SeqGraph};
///
/// let mut graph = SeqGraph::new();
/// graph.add_node(1, b"ACGTACGT".to_vec()).unwrap();
///
/// // The index is missing CGTA.
/// let index = KmerIndex::from_sequences(4, [b"ACGT".as_slice(), b"GTAC", b"TACG"]);
/// let mut scan = GraphScan::new(&graph, &index, ScanParams::new(4)).unwrap();
/// let session = ScanSession::new(scan.total_loci());
/// let report = scan.run(&session, None).unwrap();
/// assert_eq!(report.total_loci, 8);
/// assert_eq!(report.uncovered_loci, 1);
/// ```
pub struct GraphScan<'a, G: GraphStore + ?Sized, I: SeedIndex + ?Sized> {
    graph: &'a G,
    scanner: NodeScanner<'a, G, I>,
}

impl<'a, G: GraphStore + ?Sized, I: SeedIndex + ?Sized> GraphScan<'a, G, I> {
    /// Prepares a scan of the graph against the index.
    ///
    /// Returns an error if the seed length is not compatible with the index.
    pub fn new(graph: &'a G, index: &'a I, params: ScanParams) -> Result<Self, String> {
        let scanner = NodeScanner::new(graph, index, params)?;
        Ok(GraphScan { graph, scanner })
    }

    /// Returns the total number of loci in the graph.
    pub fn total_loci(&self) -> usize {
        self.graph.total_loci()
    }

    /// Scans the graph and updates the session after each node.
    ///
    /// If `output` is present, the uncovered loci are written to it using [`write_loci`].
    /// Returns an error if the graph is inconsistent or writing the output fails.
    pub fn run(&mut self, session: &ScanSession, mut output: Option<&mut dyn Write>) -> Result<ScanReport, String> {
        let max_rank = self.graph.max_rank();
        info!("Scanning {} nodes with seed length {}", max_rank, self.scanner.params().seed_len);
        let queries_before = self.scanner.queries();

        if let Some(output) = output.as_mut() {
            write_loci_header(output).map_err(|x| x.to_string())?;
        }
        let mut offsets: Vec<usize> = Vec::new();
        let mut total_loci = 0;
        let mut uncovered_loci = 0;
        for rank in 1..=max_rank {
            let node_id = self.graph.rank_to_id(rank).ok_or(format!("The graph does not contain rank {}", rank))?;
            let node_len = self.graph.sequence_len(node_id).ok_or(format!("The graph does not contain node {}", node_id))?;
            offsets.clear();
            let sink = if output.is_some() { Some(&mut offsets) } else { None };
            let uncovered = self.scanner.scan_node(node_id, sink)?;
            if let Some(output) = output.as_mut() {
                write_loci(node_id, &offsets, output).map_err(|x| x.to_string())?;
            }
            total_loci += node_len;
            uncovered_loci += uncovered;
            session.add_node(node_len, uncovered);
        }

        let report = ScanReport {
            nodes: max_rank,
            total_loci,
            uncovered_loci,
            queries: self.scanner.queries() - queries_before,
            seconds: session.elapsed().as_secs_f64(),
        };
        debug!("Made {} index queries", report.queries);
        Ok(report)
    }
}

//-----------------------------------------------------------------------------
