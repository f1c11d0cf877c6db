//! Graph stores consumed by the coverage scan.
//!
//! The scan only needs node ranks, oriented node labels, and successor handles.
//! These are provided by the [`GraphStore`] trait, which has two implementations:
//!
//! * [`GBZGraph`] wraps a [`GBZ`] graph loaded from a `.gbz` file.
//! * [`SeqGraph`] is a plain in-memory graph, usually read from a GFA file.
//!
//! Nodes are accessed by handles, which are [`gbwt::GBWT`] node identifiers encoding both the node identifier and the orientation.
//! See [`gbwt::support::encode_node`].

use crate::gfa;

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use gbwt::{GBZ, Orientation};
use gbwt::support;

use log::info;
use simple_sds::serialize;


//-----------------------------------------------------------------------------

/// Largest node identifier that can be encoded as a handle in both orientations.
pub const MAX_NODE_ID: usize = usize::MAX / 2;

/// Read-only access to a bidirected sequence graph.
///
/// Ranks are dense integers `1..=max_rank()` defining the order in which the nodes are scanned.
pub trait GraphStore {
    /// Returns the largest node rank, which is also the number of nodes.
    fn max_rank(&self) -> usize;

    /// Returns the identifier of the node with the given rank, or [`None`] if there is no such rank.
    fn rank_to_id(&self, rank: usize) -> Option<usize>;

    /// Returns `true` if the graph contains the node.
    fn has_node(&self, node_id: usize) -> bool;

    /// Returns the length of the node label, or [`None`] if there is no such node.
    fn sequence_len(&self, node_id: usize) -> Option<usize>;

    /// Returns the label of the oriented node, or [`None`] if there is no such node.
    ///
    /// The label of a reverse orientation handle is the reverse complement of the forward label.
    fn sequence(&self, handle: usize) -> Option<Cow<'_, [u8]>>;

    /// Returns the handles following the oriented node, or [`None`] if there is no such node.
    fn successors(&self, handle: usize) -> Option<Vec<usize>>;

    /// Returns the length of the longest node label in the graph.
    fn max_sequence_len(&self) -> usize;

    /// Returns the total length of node labels, which is also the number of loci in the graph.
    fn total_loci(&self) -> usize {
        (1..=self.max_rank())
            .filter_map(|rank| self.rank_to_id(rank))
            .filter_map(|node_id| self.sequence_len(node_id))
            .sum()
    }
}

//-----------------------------------------------------------------------------

/// A [`GBZ`] graph with node ranks in increasing order of node identifiers.
///
/// # Examples
///
/// ```
/// use gloci::{GBZGraph, GraphStore};
/// use gbwt::GBZ;
/// use gbwt::support;
/// use simple_sds::serialize;
///
/// let filename = support::get_test_data("example.gbz");
/// let gbz: GBZ = serialize::load_from(&filename).unwrap();
/// let graph = GBZGraph::new(gbz);
/// assert_eq!(graph.max_rank(), graph.as_ref().nodes());
/// let first = graph.rank_to_id(1).unwrap();
/// assert!(graph.has_node(first));
/// assert!(graph.total_loci() >= graph.max_sequence_len());
/// ```
pub struct GBZGraph {
    graph: GBZ,
    ids: Vec<usize>,
    max_len: usize,
}

impl GBZGraph {
    /// Wraps the graph and determines the rank order.
    pub fn new(graph: GBZ) -> Self {
        let ids: Vec<usize> = graph.node_iter().collect();
        let max_len = ids.iter().filter_map(|id| graph.sequence_len(*id)).max().unwrap_or(0);
        GBZGraph { graph, ids, max_len }
    }

    /// Loads a GBZ graph from the file.
    pub fn load<P: AsRef<Path>>(filename: P) -> Result<Self, String> {
        let graph: GBZ = serialize::load_from(&filename).map_err(|x| {
            format!("Cannot load GBZ graph {}: {}", filename.as_ref().display(), x)
        })?;
        Ok(Self::new(graph))
    }
}

impl AsRef<GBZ> for GBZGraph {
    fn as_ref(&self) -> &GBZ {
        &self.graph
    }
}

impl GraphStore for GBZGraph {
    fn max_rank(&self) -> usize {
        self.ids.len()
    }

    fn rank_to_id(&self, rank: usize) -> Option<usize> {
        if rank == 0 {
            return None;
        }
        self.ids.get(rank - 1).copied()
    }

    fn has_node(&self, node_id: usize) -> bool {
        self.graph.has_node(node_id)
    }

    fn sequence_len(&self, node_id: usize) -> Option<usize> {
        self.graph.sequence_len(node_id)
    }

    fn sequence(&self, handle: usize) -> Option<Cow<'_, [u8]>> {
        let (node_id, orientation) = support::decode_node(handle);
        let sequence = self.graph.sequence(node_id)?;
        match orientation {
            Orientation::Forward => Some(Cow::Borrowed(sequence)),
            Orientation::Reverse => Some(Cow::Owned(support::reverse_complement(sequence))),
        }
    }

    fn successors(&self, handle: usize) -> Option<Vec<usize>> {
        let (node_id, orientation) = support::decode_node(handle);
        let iter = self.graph.successors(node_id, orientation)?;
        Some(iter.map(|(id, o)| support::encode_node(id, o)).collect())
    }

    fn max_sequence_len(&self) -> usize {
        self.max_len
    }
}

//-----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
struct SeqNode {
    id: usize,
    sequence: Vec<u8>,
    // Successor handles for the forward and reverse orientations.
    successors: [Vec<usize>; 2],
}

/// A simple in-memory bidirected sequence graph.
///
/// Nodes are ranked in the order they were added.
/// Adding an edge `(from, to)` also adds the reverse edge `(flip(to), flip(from))`.
///
/// # Examples
///
/// ```
/// use gloci::{GraphStore, SeqGraph};
/// use gbwt::Orientation;
/// use gbwt::support;
///
/// let mut graph = SeqGraph::new();
/// graph.add_node(1, b"GAT".to_vec()).unwrap();
/// graph.add_node(2, b"TACA".to_vec()).unwrap();
/// graph.add_edge((1, Orientation::Forward), (2, Orientation::Forward)).unwrap();
///
/// assert_eq!(graph.max_rank(), 2);
/// assert_eq!(graph.total_loci(), 7);
/// let handle = support::encode_node(1, Orientation::Forward);
/// assert_eq!(graph.successors(handle), Some(vec![support::encode_node(2, Orientation::Forward)]));
/// let handle = support::encode_node(2, Orientation::Reverse);
/// assert_eq!(graph.sequence(handle).unwrap().as_ref(), b"TGTA");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeqGraph {
    nodes: Vec<SeqNode>,
    id_to_index: HashMap<usize, usize>,
    max_len: usize,
}

impl SeqGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        SeqGraph::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the graph, counting each edge once.
    pub fn edges(&self) -> usize {
        let mut result = 0;
        for node in self.nodes.iter() {
            for (o, successors) in [Orientation::Forward, Orientation::Reverse].iter().zip(node.successors.iter()) {
                let from = support::encode_node(node.id, *o);
                for to in successors.iter() {
                    // Each edge is stored in both directions.
                    if (from, *to) <= (support::flip_node(*to), support::flip_node(from)) {
                        result += 1;
                    }
                }
            }
        }
        result
    }

    /// Adds a node with the given identifier and label.
    ///
    /// The node gets the next rank.
    /// Returns an error if the identifier is zero or larger than [`MAX_NODE_ID`], or if the node already exists.
    pub fn add_node(&mut self, node_id: usize, sequence: Vec<u8>) -> Result<(), String> {
        if node_id == gbwt::ENDMARKER || node_id > MAX_NODE_ID {
            return Err(format!("Invalid node identifier {}", node_id));
        }
        if self.id_to_index.contains_key(&node_id) {
            return Err(format!("Duplicate node {}", node_id));
        }
        self.max_len = self.max_len.max(sequence.len());
        self.id_to_index.insert(node_id, self.nodes.len());
        self.nodes.push(SeqNode {
            id: node_id,
            sequence,
            successors: [Vec::new(), Vec::new()],
        });
        Ok(())
    }

    /// Adds an edge between two oriented nodes.
    ///
    /// Adding an existing edge has no effect.
    /// Returns an error if either node does not exist.
    pub fn add_edge(&mut self, from: (usize, Orientation), to: (usize, Orientation)) -> Result<(), String> {
        for node_id in [from.0, to.0] {
            if !self.id_to_index.contains_key(&node_id) {
                return Err(format!("Edge refers to a missing node {}", node_id));
            }
        }
        let from = support::encode_node(from.0, from.1);
        let to = support::encode_node(to.0, to.1);
        self.add_successor(from, to);
        self.add_successor(support::flip_node(to), support::flip_node(from));
        Ok(())
    }

    fn add_successor(&mut self, from: usize, to: usize) {
        let (node_id, orientation) = support::decode_node(from);
        let index = self.id_to_index[&node_id];
        let successors = &mut self.nodes[index].successors[orientation as usize];
        if !successors.contains(&to) {
            successors.push(to);
        }
    }

    fn node(&self, node_id: usize) -> Option<&SeqNode> {
        let index = self.id_to_index.get(&node_id)?;
        self.nodes.get(*index)
    }
}

impl GraphStore for SeqGraph {
    fn max_rank(&self) -> usize {
        self.nodes.len()
    }

    fn rank_to_id(&self, rank: usize) -> Option<usize> {
        if rank == 0 {
            return None;
        }
        self.nodes.get(rank - 1).map(|node| node.id)
    }

    fn has_node(&self, node_id: usize) -> bool {
        self.id_to_index.contains_key(&node_id)
    }

    fn sequence_len(&self, node_id: usize) -> Option<usize> {
        self.node(node_id).map(|node| node.sequence.len())
    }

    fn sequence(&self, handle: usize) -> Option<Cow<'_, [u8]>> {
        let (node_id, orientation) = support::decode_node(handle);
        let node = self.node(node_id)?;
        match orientation {
            Orientation::Forward => Some(Cow::Borrowed(&node.sequence)),
            Orientation::Reverse => Some(Cow::Owned(support::reverse_complement(&node.sequence))),
        }
    }

    fn successors(&self, handle: usize) -> Option<Vec<usize>> {
        let (node_id, orientation) = support::decode_node(handle);
        let node = self.node(node_id)?;
        Some(node.successors[orientation as usize].clone())
    }

    fn max_sequence_len(&self) -> usize {
        self.max_len
    }
}

//-----------------------------------------------------------------------------

/// Returns `true` if the file name indicates a GBZ graph.
pub fn is_gbz_file<P: AsRef<Path>>(filename: P) -> bool {
    filename.as_ref().extension().map_or(false, |ext| ext == "gbz")
}

/// Loads a graph from the file, choosing the format by the file extension.
///
/// Files ending with `.gbz` are loaded as GBZ graphs.
/// Other files are read as GFA, which may be gzip-compressed.
pub fn load_graph<P: AsRef<Path>>(filename: P) -> Result<Box<dyn GraphStore>, String> {
    let filename = filename.as_ref();
    if is_gbz_file(filename) {
        info!("Loading GBZ graph {}", filename.display());
        let graph = GBZGraph::load(filename)?;
        Ok(Box::new(graph))
    } else {
        info!("Loading GFA graph {}", filename.display());
        let graph = gfa::read_gfa(filename)?;
        Ok(Box::new(graph))
    }
}

//-----------------------------------------------------------------------------
