use crate::{GraphStore, SeqGraph, SeedIndex};
use crate::gfa;

use gbwt::Orientation;
use gbwt::support;

use rand::Rng;

use std::collections::BTreeSet;

//-----------------------------------------------------------------------------

// Graph construction.

pub(crate) fn forward(node_id: usize) -> usize {
    support::encode_node(node_id, Orientation::Forward)
}

pub(crate) fn graph_from_gfa(text: &str) -> SeqGraph {
    let graph = gfa::parse_gfa(&mut text.as_bytes());
    assert!(graph.is_ok(), "Failed to parse GFA: {}", graph.unwrap_err());
    graph.unwrap()
}

// Builds a graph with forward edges between the given nodes.
pub(crate) fn linear_graph(nodes: &[(usize, &str)], edges: &[(usize, usize)]) -> SeqGraph {
    let mut graph = SeqGraph::new();
    for (node_id, sequence) in nodes.iter() {
        let result = graph.add_node(*node_id, sequence.as_bytes().to_vec());
        assert!(result.is_ok(), "Failed to add node {}: {}", node_id, result.unwrap_err());
    }
    for (from, to) in edges.iter() {
        let result = graph.add_edge((*from, Orientation::Forward), (*to, Orientation::Forward));
        assert!(result.is_ok(), "Failed to add edge ({}, {}): {}", from, to, result.unwrap_err());
    }
    graph
}

pub(crate) fn random_dna<R: Rng>(rng: &mut R, len: usize) -> Vec<u8> {
    const ALPHABET: &[u8] = b"ACGT";
    (0..len).map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())]).collect()
}

// Builds a random graph where most edges go forward in the rank order.
// A few edges change orientation or go backward, creating cycles.
pub(crate) fn random_graph<R: Rng>(rng: &mut R, nodes: usize, max_len: usize) -> SeqGraph {
    let mut graph = SeqGraph::new();
    for node_id in 1..=nodes {
        let len = rng.gen_range(1..=max_len);
        let result = graph.add_node(node_id, random_dna(rng, len));
        assert!(result.is_ok(), "Failed to add node {}: {}", node_id, result.unwrap_err());
    }
    for from in 1..=nodes {
        let edges = rng.gen_range(0..=2);
        for _ in 0..edges {
            let to = if rng.gen_bool(0.9) && from < nodes {
                rng.gen_range(from + 1..=nodes)
            } else {
                rng.gen_range(1..=nodes)
            };
            let orientation = if rng.gen_bool(0.9) { Orientation::Forward } else { Orientation::Reverse };
            let result = graph.add_edge((from, Orientation::Forward), (to, orientation));
            assert!(result.is_ok(), "Failed to add edge ({}, {}): {}", from, to, result.unwrap_err());
        }
    }
    graph
}

//-----------------------------------------------------------------------------

// Brute force enumeration of walk strings.

fn extend_walks<G: GraphStore + ?Sized>(graph: &G, handle: usize, mut prefix: Vec<u8>, len: usize, output: &mut BTreeSet<Vec<u8>>) {
    let sequence = graph.sequence(handle).unwrap();
    prefix.extend_from_slice(&sequence);
    if prefix.len() >= len {
        prefix.truncate(len);
        output.insert(prefix);
        return;
    }
    let successors = graph.successors(handle).unwrap();
    if successors.is_empty() {
        output.insert(prefix);
        return;
    }
    for successor in successors {
        extend_walks(graph, successor, prefix.clone(), len, output);
    }
}

// Returns all strings of length `len` starting at the offset of the oriented node.
// Walks that reach a dead end earlier give shorter strings.
pub(crate) fn walk_strings<G: GraphStore + ?Sized>(graph: &G, handle: usize, offset: usize, len: usize) -> BTreeSet<Vec<u8>> {
    let sequence = graph.sequence(handle).unwrap();
    let mut result = BTreeSet::new();
    let mut prefix = sequence[offset..].to_vec();
    if prefix.len() >= len {
        prefix.truncate(len);
        result.insert(prefix);
        return result;
    }
    let successors = graph.successors(handle).unwrap();
    if successors.is_empty() {
        result.insert(prefix);
        return result;
    }
    for successor in successors {
        extend_walks(graph, successor, prefix.clone(), len, &mut result);
    }
    result
}

// Returns all walk strings of length `len` starting from the forward orientations of the nodes.
pub(crate) fn all_walk_strings<G: GraphStore + ?Sized>(graph: &G, len: usize) -> BTreeSet<Vec<u8>> {
    let mut result = BTreeSet::new();
    for rank in 1..=graph.max_rank() {
        let node_id = graph.rank_to_id(rank).unwrap();
        for offset in 0..graph.sequence_len(node_id).unwrap() {
            result.extend(walk_strings(graph, forward(node_id), offset, len));
        }
    }
    result
}

//-----------------------------------------------------------------------------

// Brute force coverage.

// Classification of the walk strings starting at a locus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct LocusStatus {
    pub present: bool,
    pub absent: bool,
    pub short: bool,
}

pub(crate) fn locus_status<G: GraphStore + ?Sized, I: SeedIndex + ?Sized>(
    graph: &G, index: &I, node_id: usize, offset: usize, seed_len: usize
) -> LocusStatus {
    let mut status = LocusStatus::default();
    for string in walk_strings(graph, forward(node_id), offset, seed_len) {
        if string.len() < seed_len {
            status.short = true;
        } else if index.contains(&string) {
            status.present = true;
        } else {
            status.absent = true;
        }
    }
    status
}

//-----------------------------------------------------------------------------
