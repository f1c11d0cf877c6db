//! Substring indexes for seed queries.
//!
//! The coverage scan only needs to know whether a seed occurs in the indexed graph.
//! This is abstracted by the [`SeedIndex`] trait, and [`SeedQuery`] binds an index to a fixed seed length.
//!
//! [`KmerIndex`] is the index used by the command line tools.
//! It stores all strings of length `order` that occur on walks in a graph, as well as shorter strings ending at dead ends.
//! A pattern of length at most `order` occurs in the graph if and only if it is a prefix of a stored string.

use crate::{Backtracker, GraphStore, SequenceWindow};

use std::collections::BTreeSet;
use std::io::{self, Error, ErrorKind, Read, Write};
use std::path::Path;

use gbwt::Orientation;
use gbwt::support;

use log::{debug, info};
use simple_sds::serialize::{self, Serialize};


//-----------------------------------------------------------------------------

/// An index that answers substring membership queries.
pub trait SeedIndex {
    /// Returns `true` if the pattern occurs in the indexed text.
    fn contains(&self, pattern: &[u8]) -> bool;

    /// Returns the length of the longest pattern the index can answer reliably.
    fn order(&self) -> usize;
}

//-----------------------------------------------------------------------------

/// A seed index bound to a seed length.
///
/// The query is created once before the scan, and any incompatibility between the seed length and the index is reported then.
///
/// # Examples
///
/// ```
/// use gloci::{KmerIndex, SeedQuery};
///
/// let index = KmerIndex::from_sequences(4, [b"ACGTACGT"]);
/// let query = SeedQuery::new(&index, 4).unwrap();
/// assert!(query.exists(b"TTACGTTT", 2, 4));
/// assert!(!query.exists(b"TTACGTTT", 3, 4));
/// assert!(!query.exists(b"TTACGTTT", 6, 4)); // Past the end.
/// assert!(SeedQuery::new(&index, 5).is_err());
/// ```
pub struct SeedQuery<'a, I: SeedIndex + ?Sized> {
    index: &'a I,
    seed_len: usize,
}

impl<'a, I: SeedIndex + ?Sized> SeedQuery<'a, I> {
    /// Binds the index to the given seed length.
    ///
    /// Returns an error if the seed length is zero or longer than the order of the index.
    pub fn new(index: &'a I, seed_len: usize) -> Result<Self, String> {
        if seed_len == 0 {
            return Err(String::from("Seed length must be positive"));
        }
        if seed_len > index.order() {
            return Err(format!("Seed length {} exceeds the index order {}", seed_len, index.order()));
        }
        Ok(SeedQuery { index, seed_len })
    }

    /// Returns the seed length.
    #[inline]
    pub fn seed_len(&self) -> usize {
        self.seed_len
    }

    /// Returns `true` if `seq[start..start + len]` occurs in the index.
    ///
    /// Returns `false` if the range does not fit in the sequence.
    pub fn exists(&self, seq: &[u8], start: usize, len: usize) -> bool {
        match seq.get(start..start + len) {
            Some(pattern) => self.index.contains(pattern),
            None => false,
        }
    }

    /// Returns `true` if the seed starting at `seq[start]` occurs in the index.
    #[inline]
    pub fn seed_exists(&self, seq: &[u8], start: usize) -> bool {
        self.exists(seq, start, self.seed_len)
    }
}

//-----------------------------------------------------------------------------

/// A sorted set of graph strings supporting prefix queries.
///
/// The strings are stored in lexicographic order as a concatenated byte vector with a vector of end offsets.
/// No stored string is a prefix of another stored string.
///
/// # Examples
///
/// ```
/// use gloci::{KmerIndex, SeedIndex};
///
/// let index = KmerIndex::from_sequences(3, [b"GATTACA".as_slice(), b"CAT".as_slice()]);
/// assert_eq!(index.order(), 3);
/// assert!(index.contains(b"TTA"));
/// assert!(index.contains(b"CA"));
/// assert!(index.contains(b"A"));
/// assert!(!index.contains(b"TAT"));
/// assert!(!index.contains(b"GATT")); // Longer than the order.
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KmerIndex {
    order: usize,
    sequences: Vec<u8>,
    ends: Vec<u64>,
}

impl KmerIndex {
    /// Identifier for the file format.
    pub const TAG: u64 = 0x5844_4949_434F_4C47; // "GLOCIIDX"

    /// Current version of the file format.
    pub const VERSION: u64 = 1;

    // Header: tag, version, order.
    const HEADER_WORDS: usize = 3;

    /// Builds an index of all strings of length `order` on the walks in the graph.
    ///
    /// Walks that reach a dead end contribute their shorter suffixes.
    /// If `both_strands` is set, walks starting from reverse orientation nodes are also included.
    /// Returns an error if the order is zero or the graph is inconsistent.
    pub fn build<G: GraphStore + ?Sized>(graph: &G, order: usize, both_strands: bool) -> Result<Self, String> {
        if order == 0 {
            return Err(String::from("Index order must be positive"));
        }
        info!("Building a substring index of order {} for {} nodes", order, graph.max_rank());

        let orientations: &[Orientation] = if both_strands {
            &[Orientation::Forward, Orientation::Reverse]
        } else {
            &[Orientation::Forward]
        };
        let mut strings: BTreeSet<Vec<u8>> = BTreeSet::new();
        let mut walker = Backtracker::new();
        let mut window = SequenceWindow::new();
        for rank in 1..=graph.max_rank() {
            let node_id = graph.rank_to_id(rank).ok_or(format!("The graph does not contain rank {}", rank))?;
            for &orientation in orientations {
                let handle = support::encode_node(node_id, orientation);
                collect_strings(graph, handle, order, &mut walker, &mut window, &mut strings)?;
            }
        }
        debug!("Found {} distinct strings", strings.len());

        Ok(Self::from_sorted(order, strings))
    }

    /// Builds an index of all substrings of length `order` in the given sequences.
    ///
    /// The suffixes shorter than `order` are also included.
    pub fn from_sequences<T: AsRef<[u8]>, I: IntoIterator<Item = T>>(order: usize, sequences: I) -> Self {
        let mut strings: BTreeSet<Vec<u8>> = BTreeSet::new();
        if order > 0 {
            for sequence in sequences {
                let sequence = sequence.as_ref();
                for start in 0..sequence.len() {
                    let end = (start + order).min(sequence.len());
                    strings.insert(sequence[start..end].to_vec());
                }
            }
        }
        Self::from_sorted(order, strings)
    }

    // Builds the index from sorted strings, dropping the strings that are prefixes of the next one.
    fn from_sorted(order: usize, strings: BTreeSet<Vec<u8>>) -> Self {
        let strings: Vec<Vec<u8>> = strings.into_iter().collect();
        let mut sequences: Vec<u8> = Vec::new();
        let mut ends: Vec<u64> = Vec::new();
        for (i, string) in strings.iter().enumerate() {
            if i + 1 < strings.len() && strings[i + 1].starts_with(string) {
                continue;
            }
            sequences.extend_from_slice(string);
            ends.push(sequences.len() as u64);
        }
        KmerIndex { order, sequences, ends }
    }

    /// Loads the index from a file.
    pub fn load_from<P: AsRef<Path>>(filename: P) -> Result<Self, String> {
        serialize::load_from(&filename).map_err(|x| {
            format!("Cannot load seed index {}: {}", filename.as_ref().display(), x)
        })
    }

    /// Writes the index to a file.
    pub fn save_to<P: AsRef<Path>>(&self, filename: P) -> Result<(), String> {
        serialize::serialize_to(self, &filename).map_err(|x| {
            format!("Cannot write seed index {}: {}", filename.as_ref().display(), x)
        })
    }

    /// Returns the number of stored strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Returns `true` if the index is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ends.is_empty()
    }

    /// Returns the total length of the stored strings.
    #[inline]
    pub fn total_len(&self) -> usize {
        self.sequences.len()
    }

    /// Returns the stored string with the given rank in lexicographic order.
    ///
    /// # Panics
    ///
    /// May panic if `i >= self.len()`.
    pub fn get(&self, i: usize) -> &[u8] {
        let start = if i == 0 { 0 } else { self.ends[i - 1] as usize };
        &self.sequences[start..self.ends[i] as usize]
    }

    /// Returns an iterator over the stored strings in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    // Returns the rank of the first stored string that is not smaller than the pattern.
    fn lower_bound(&self, pattern: &[u8]) -> usize {
        let mut low = 0;
        let mut high = self.len();
        while low < high {
            let mid = low + (high - low) / 2;
            if self.get(mid) < pattern {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low
    }

    fn check(&self) -> io::Result<()> {
        let mut prev = 0;
        for end in self.ends.iter() {
            if *end < prev {
                return Err(Error::new(ErrorKind::InvalidData, "KmerIndex: End offsets are not sorted"));
            }
            prev = *end;
        }
        if prev as usize != self.sequences.len() {
            return Err(Error::new(ErrorKind::InvalidData, "KmerIndex: End offsets do not match the sequence length"));
        }
        Ok(())
    }
}

impl SeedIndex for KmerIndex {
    fn contains(&self, pattern: &[u8]) -> bool {
        if pattern.len() > self.order {
            return false;
        }
        let rank = self.lower_bound(pattern);
        rank < self.len() && self.get(rank).starts_with(pattern)
    }

    fn order(&self) -> usize {
        self.order
    }
}

impl Serialize for KmerIndex {
    fn serialize_header<T: Write>(&self, writer: &mut T) -> io::Result<()> {
        let header: Vec<u64> = vec![Self::TAG, Self::VERSION, self.order as u64];
        header.serialize(writer)
    }

    fn serialize_body<T: Write>(&self, writer: &mut T) -> io::Result<()> {
        self.sequences.serialize(writer)?;
        self.ends.serialize(writer)?;
        Ok(())
    }

    fn load<T: Read>(reader: &mut T) -> io::Result<Self> {
        let header = Vec::<u64>::load(reader)?;
        if header.len() != Self::HEADER_WORDS || header[0] != Self::TAG {
            return Err(Error::new(ErrorKind::InvalidData, "KmerIndex: Invalid tag"));
        }
        if header[1] != Self::VERSION {
            let message = format!("KmerIndex: Expected version {}, got version {}", Self::VERSION, header[1]);
            return Err(Error::new(ErrorKind::InvalidData, message));
        }
        let order = header[2] as usize;
        let sequences = Vec::<u8>::load(reader)?;
        let ends = Vec::<u64>::load(reader)?;
        let result = KmerIndex { order, sequences, ends };
        result.check()?;
        Ok(result)
    }

    fn size_in_elements(&self) -> usize {
        let header: Vec<u64> = vec![0; Self::HEADER_WORDS];
        header.size_in_elements() + self.sequences.size_in_elements() + self.ends.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

// Collects the strings of length `order` starting in the node, extending them over all downstream walks.
fn collect_strings<G: GraphStore + ?Sized>(
    graph: &G,
    handle: usize,
    order: usize,
    walker: &mut Backtracker,
    window: &mut SequenceWindow,
    strings: &mut BTreeSet<Vec<u8>>
) -> Result<(), String> {
    let label = graph.sequence(handle).ok_or(format!("The graph does not contain handle {}", handle))?;
    let node_len = label.len();
    if node_len == 0 {
        return Ok(());
    }
    let limit = node_len - 1 + order;

    window.clear();
    window.extend(&label, limit);
    walker.reset(graph, handle)?;
    loop {
        while window.len() < limit && walker.depth() <= limit {
            match walker.step_forward(graph)? {
                Some(next) => {
                    let sequence = graph.sequence(next).ok_or(format!("The graph does not contain handle {}", next))?;
                    window.extend(&sequence, limit);
                },
                None => break,
            }
        }
        let sequence = window.sequence();
        for start in 0..node_len {
            let end = (start + order).min(sequence.len());
            strings.insert(sequence[start..end].to_vec());
        }
        match walker.step_back() {
            Some(len) => window.trim_to(len),
            None => break,
        }
    }

    Ok(())
}

//-----------------------------------------------------------------------------
