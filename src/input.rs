use crate::error::PstError;
use hashbrown::HashSet;
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};

/// Successor and predecessor labels of one node, in the caller's order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeIo {
    pub out: Vec<String>,
    pub inc: Vec<String>,
}

/// Adjacency of the input control-flow graph, keyed by node label.
///
/// Iteration follows insertion order, which is what makes every id in the
/// output (DFS numbers, class ids, region ids) deterministic.
pub type Adjacency = IndexMap<String, NodeIo>;

/// Builds an adjacency from directed edge pairs.
///
/// Nodes are created in order of first mention. A duplicate ordered pair is
/// ignored: the input contract treats repeated edges as one.
pub fn from_edges<S: AsRef<str>>(edges: &[(S, S)]) -> Adjacency {
    let mut adj = Adjacency::new();
    let mut seen = HashSet::new();
    for (u, v) in edges {
        let (u, v) = (u.as_ref(), v.as_ref());
        if !seen.insert((u.to_string(), v.to_string())) {
            continue;
        }
        adj.entry(u.to_string()).or_default();
        adj.entry(v.to_string()).or_default();
        adj[u].out.push(v.to_string());
        adj[v].inc.push(u.to_string());
    }
    adj
}

/// This is equivalent to [`from_str`], but takes a file path as an input.
pub fn from_file(path: &str) -> Adjacency {
    let file = File::open(path).expect("File should exist and be readable");
    let reader = BufReader::new(file);
    parse_edge_lines(reader)
}

/// Reads a directed graph from a string.
///
/// One line, one edge in format "u,v". Labels are arbitrary (trimmed)
/// strings; blank lines are skipped.
///
/// Example input:
/// ```text
/// S,A
/// A,B
/// A,C
/// B,D
/// C,D
/// D,T
/// ```
pub fn from_str(input: &str) -> Adjacency {
    let cursor = Cursor::new(input);
    let reader = BufReader::new(cursor);
    parse_edge_lines(reader)
}

fn parse_edge_lines<R: BufRead>(reader: R) -> Adjacency {
    let mut edges = Vec::new();

    for line in reader.lines() {
        let line = line.expect("Line should be readable");
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parts: Vec<_> = line.split(',').collect();
        if parts.len() != 2 {
            panic!("Wrong format, expected 'u,v' for an edge");
        }
        edges.push((parts[0].trim().to_string(), parts[1].trim().to_string()));
    }

    from_edges(&edges)
}

/// Checks the input contract: non-empty, every referenced label declared,
/// and `v in out(u)` exactly when `u in in(v)`.
pub(crate) fn validate(adj: &Adjacency) -> Result<(), PstError> {
    if adj.is_empty() {
        return Err(PstError::InvalidInput("the adjacency is empty".into()));
    }

    let mut out_pairs = HashSet::new();
    let mut in_pairs = HashSet::new();
    for (u, io) in adj {
        for v in &io.out {
            if !adj.contains_key(v) {
                return Err(PstError::InvalidInput(format!(
                    "`{}` appears in out(`{}`) but has no entry of its own",
                    v, u
                )));
            }
            out_pairs.insert((u.as_str(), v.as_str()));
        }
        for p in &io.inc {
            if !adj.contains_key(p) {
                return Err(PstError::InvalidInput(format!(
                    "`{}` appears in in(`{}`) but has no entry of its own",
                    p, u
                )));
            }
            in_pairs.insert((p.as_str(), u.as_str()));
        }
    }

    if let Some(&(u, v)) = out_pairs.symmetric_difference(&in_pairs).next() {
        return Err(PstError::InvalidInput(format!(
            "edge `{}` -> `{}` is listed on only one side of the adjacency",
            u, v
        )));
    }

    Ok(())
}
