//! Reading GFA 1 graphs into a [`SeqGraph`].
//!
//! Only segment (`S`) and link (`L`) lines are used.
//! Segment names must be positive integers, as in graphs converted from GBZ.
//! Link overlaps are ignored, and all other line types are skipped.

use crate::SeqGraph;
use crate::graph::MAX_NODE_ID;
use crate::utils;

use std::io::BufRead;
use std::path::Path;
use std::str;

use gbwt::Orientation;

use log::debug;

//-----------------------------------------------------------------------------

/// Reads a GFA graph from the file, which may be gzip-compressed.
pub fn read_gfa<P: AsRef<Path>>(filename: P) -> Result<SeqGraph, String> {
    let mut reader = utils::open_file(&filename).map_err(|x| {
        format!("Cannot open GFA file {}: {}", filename.as_ref().display(), x)
    })?;
    parse_gfa(&mut reader)
}

/// Parses a GFA graph from the reader.
///
/// Links may appear before the segments they refer to.
/// The ranks of the nodes follow the order of the segment lines.
///
/// # Examples
///
/// ```
/// use gloci::{gfa, GraphStore};
///
/// let text = b"H\tVN:Z:1.0\nS\t1\tGAT\nS\t2\tTACA\nL\t1\t+\t2\t+\t0M\n";
/// let graph = gfa::parse_gfa(&mut &text[..]).unwrap();
/// assert_eq!(graph.nodes(), 2);
/// assert_eq!(graph.edges(), 1);
/// assert_eq!(graph.total_loci(), 7);
/// ```
pub fn parse_gfa<R: BufRead>(reader: &mut R) -> Result<SeqGraph, String> {
    let mut graph = SeqGraph::new();
    let mut links: Vec<((usize, Orientation), (usize, Orientation), usize)> = Vec::new();
    let mut line_num = 0;
    loop {
        let mut buf: Vec<u8> = Vec::new();
        let len = reader.read_until(b'\n', &mut buf).map_err(|x| x.to_string())?;
        if len == 0 {
            break;
        }
        line_num += 1;
        while buf.last() == Some(&b'\n') || buf.last() == Some(&b'\r') {
            buf.pop();
        }
        if buf.is_empty() {
            continue;
        }

        let fields: Vec<&[u8]> = buf.split(|&c| c == b'\t').collect();
        match fields[0] {
            b"S" => {
                let (node_id, sequence) = parse_segment(&fields).map_err(|x| {
                    format!("GFA line {}: {}", line_num, x)
                })?;
                graph.add_node(node_id, sequence).map_err(|x| {
                    format!("GFA line {}: {}", line_num, x)
                })?;
            },
            b"L" => {
                let (from, to) = parse_link(&fields).map_err(|x| {
                    format!("GFA line {}: {}", line_num, x)
                })?;
                links.push((from, to, line_num));
            },
            _ => {},
        }
    }

    for (from, to, line_num) in links {
        graph.add_edge(from, to).map_err(|x| format!("GFA line {}: {}", line_num, x))?;
    }
    debug!("Parsed {} segments and {} links from {} GFA lines", graph.nodes(), graph.edges(), line_num);

    Ok(graph)
}

//-----------------------------------------------------------------------------

fn parse_node_id(field: &[u8]) -> Result<usize, String> {
    let name = str::from_utf8(field).map_err(|x| x.to_string())?;
    let node_id = name.parse::<usize>().map_err(|_| {
        format!("Segment name {} is not a positive integer", name)
    })?;
    if node_id == 0 {
        return Err(String::from("Segment name 0 is not a positive integer"));
    }
    if node_id > MAX_NODE_ID {
        return Err(format!("Segment name {} exceeds the largest node identifier {}", name, MAX_NODE_ID));
    }
    Ok(node_id)
}

fn parse_orientation(field: &[u8]) -> Result<Orientation, String> {
    match field {
        b"+" => Ok(Orientation::Forward),
        b"-" => Ok(Orientation::Reverse),
        _ => Err(format!("Invalid orientation {}", String::from_utf8_lossy(field))),
    }
}

fn parse_segment(fields: &[&[u8]]) -> Result<(usize, Vec<u8>), String> {
    if fields.len() < 3 {
        return Err(String::from("Segment line with fewer than 3 fields"));
    }
    let node_id = parse_node_id(fields[1])?;
    if fields[2] == b"*" {
        return Err(format!("Segment {} has no sequence", node_id));
    }
    let sequence = fields[2].to_ascii_uppercase();
    Ok((node_id, sequence))
}

fn parse_link(fields: &[&[u8]]) -> Result<((usize, Orientation), (usize, Orientation)), String> {
    if fields.len() < 5 {
        return Err(String::from("Link line with fewer than 5 fields"));
    }
    let from = (parse_node_id(fields[1])?, parse_orientation(fields[2])?);
    let to = (parse_node_id(fields[3])?, parse_orientation(fields[4])?);
    Ok((from, to))
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
