//! # gloci: seed coverage of loci in a variation graph.
//!
//! Given a sequence graph and a substring index over the graph, this crate finds the *loci* (positions in node labels) that are not covered by any seed of a fixed length.
//! The seed for a locus is the string of length `seed_len` starting at the locus and following a walk in the graph.
//! A locus is *uncovered* if its seed cannot be found in the index.
//! The result is the number of uncovered loci and the fraction of uncovered loci among all loci.
//!
//! The scan builds on the [`gbwt`] crate.
//!
//! ### Basic concepts
//!
//! Nodes are accessed by handles, which are [`gbwt::GBWT`] node identifiers.
//! A handle encodes both the identifier of the node in the underlying graph and its orientation.
//! The label of a node in reverse orientation is the reverse complement of the forward label.
//! Only the forward orientation of each node is scanned, but walks may continue through nodes in either orientation.
//!
//! Nodes are scanned in rank order.
//! Ranks are dense integers starting from 1.
//! In a GBZ graph, ranks follow node identifiers, while in a GFA graph, they follow the order of segment lines.
//!
//! See [`GraphStore`], [`GBZGraph`], and [`SeqGraph`] for graphs.
//! See [`SeedIndex`], [`KmerIndex`], and [`SeedQuery`] for the index.
//! See [`GraphScan`], [`NodeScanner`], and [`ScanSession`] for the scan itself.
//!
//! ### Seeds crossing node boundaries
//!
//! A seed starting within `seed_len - 1` bp of the end of a node continues into the successors.
//! The walks are enumerated depth-first with a [`Backtracker`], and the characters on the current walk are kept in a [`SequenceWindow`].
//! When the walks give different answers for the same locus, [`BranchPolicy`] decides the outcome.
//! When a walk ends before the seed is complete, [`DeadEndPolicy`] decides the outcome.
//! [`CoverageMarker`] ensures that each locus is counted at most once.

pub mod gfa;
pub mod graph;
pub mod marker;
pub mod scan;
pub mod seed_index;
pub mod utils;
pub mod walker;
pub mod window;

#[cfg(test)]
mod internal;

pub use graph::{GBZGraph, GraphStore, SeqGraph};
pub use marker::CoverageMarker;
pub use scan::{BranchPolicy, DeadEndPolicy, GraphScan, NodeScanner, Progress, ScanParams, ScanReport, ScanSession};
pub use seed_index::{KmerIndex, SeedIndex, SeedQuery};
pub use walker::Backtracker;
pub use window::SequenceWindow;
