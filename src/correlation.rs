//! Weighted undirected topic-correlation graph.
//!
//! Pairs are canonicalized by sorting the two names, so the mirrored
//! rows a symmetric source matrix emits collide on one key. The first
//! occurrence of a canonical pair creates the edge and seeds both
//! endpoints' weights; later rows for the same pair are dropped
//! entirely, adding to neither the edge value nor the node weights.
//! Self-pairs carry a topic's own task count and feed only that node's
//! weight, never an edge.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::normalize::CorrelationRecord;

/// Display floor for node weights; keeps tiny topics visible in layout.
pub const WEIGHT_FLOOR: f64 = 100.0;

/// Default neighborhood size for the selected-node edge filter.
pub const DEFAULT_NEIGHBORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrNode {
    pub id: usize,
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrEdge {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationGraph {
    nodes: Vec<CorrNode>,
    edges: Vec<CorrEdge>,
    ids: HashMap<String, usize>,
}

fn intern(name: &str, nodes: &mut Vec<CorrNode>, ids: &mut HashMap<String, usize>) -> usize {
    if let Some(&id) = ids.get(name) {
        return id;
    }
    let id = nodes.len();
    ids.insert(name.to_string(), id);
    nodes.push(CorrNode {
        id,
        name: name.to_string(),
        weight: 0.0,
    });
    id
}

pub fn build(records: &[CorrelationRecord]) -> CorrelationGraph {
    let mut ids: HashMap<String, usize> = HashMap::new();
    let mut nodes: Vec<CorrNode> = Vec::new();
    let mut edges: Vec<CorrEdge> = Vec::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();

    for rec in records {
        if rec.topic1 == rec.topic2 {
            let id = intern(&rec.topic1, &mut nodes, &mut ids);
            if seen.insert((id, id)) {
                nodes[id].weight += rec.number_of_tasks;
            }
            continue;
        }

        // Canonical order by name so {a,b} and {b,a} key identically.
        let (lo_name, hi_name) = if rec.topic1 < rec.topic2 {
            (&rec.topic1, &rec.topic2)
        } else {
            (&rec.topic2, &rec.topic1)
        };
        let lo = intern(lo_name, &mut nodes, &mut ids);
        let hi = intern(hi_name, &mut nodes, &mut ids);

        if !seen.insert((lo, hi)) {
            // Duplicate canonical pair: dropped entirely. Summing here
            // would double every edge and node weight of a symmetric
            // source matrix.
            continue;
        }

        edges.push(CorrEdge {
            source: lo,
            target: hi,
            value: rec.number_of_tasks,
        });
        nodes[lo].weight += rec.number_of_tasks;
        nodes[hi].weight += rec.number_of_tasks;
    }

    for node in &mut nodes {
        node.weight = node.weight.max(WEIGHT_FLOOR);
    }

    CorrelationGraph { nodes, edges, ids }
}

impl CorrelationGraph {
    pub fn nodes(&self) -> &[CorrNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[CorrEdge] {
        &self.edges
    }

    pub fn node_id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// At most `k` edges touching `id`, by descending value; ties keep
    /// first-encountered order (stable sort). Keeps the rendered
    /// neighborhood legible.
    pub fn top_neighbors(&self, id: usize, k: usize) -> Vec<CorrEdge> {
        let mut touching: Vec<CorrEdge> = self
            .edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .copied()
            .collect();
        touching.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
        touching.truncate(k);
        touching
    }
}
