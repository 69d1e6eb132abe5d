//! Bipartite flow graph for the supertopic -> topic blog diagram.
//!
//! Every distinct name becomes exactly one node, keyed by the name string
//! alone, with a stable integer id assigned in first-seen order
//! (supertopic before topic within a record, records in input order). A
//! name appearing at both levels is still one node. Each input record
//! maps to exactly one directed link weighted by its blog count.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::BlogTopicRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowNode {
    pub id: usize,
    pub name: String,
    /// Whether this name ever appears on the coarse (supertopic) level.
    pub top_level: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowGraph {
    nodes: Vec<FlowNode>,
    links: Vec<FlowLink>,
    ids: HashMap<String, usize>,
}

/// What a renderer gets for one selection state: plain node and link
/// lists, no layout coordinates, no references back into the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowView {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

/// Per-supertopic aggregates (drives the hover card).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeStats {
    pub blogs: f64,
    pub children: usize,
}

fn intern(name: &str, nodes: &mut Vec<FlowNode>, ids: &mut HashMap<String, usize>) -> usize {
    if let Some(&id) = ids.get(name) {
        return id;
    }
    let id = nodes.len();
    ids.insert(name.to_string(), id);
    nodes.push(FlowNode {
        id,
        name: name.to_string(),
        top_level: false,
    });
    id
}

pub fn build(records: &[BlogTopicRecord]) -> FlowGraph {
    let mut ids: HashMap<String, usize> = HashMap::new();
    let mut nodes: Vec<FlowNode> = Vec::new();
    let mut links: Vec<FlowLink> = Vec::with_capacity(records.len());

    for rec in records {
        let source = intern(&rec.supertopic, &mut nodes, &mut ids);
        let target = intern(&rec.topic, &mut nodes, &mut ids);
        nodes[source].top_level = true;
        links.push(FlowLink {
            source,
            target,
            value: rec.number_of_blogs,
        });
    }

    FlowGraph { nodes, links, ids }
}

impl FlowGraph {
    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[FlowLink] {
        &self.links
    }

    pub fn node_id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// The render set for a selection. No selection: top-level nodes
    /// only, empty link set. With a selected top-level node: that node,
    /// its immediate children, and all other top-level nodes so the user
    /// can re-select; links are the selection's outgoing links. An
    /// unknown or non-top-level selection degrades to the no-selection
    /// node set (selection state is external and may lag a refresh).
    pub fn view(&self, selection: Option<&str>) -> FlowView {
        let selected = selection.and_then(|name| self.node_id(name));

        let links: Vec<FlowLink> = match selected {
            Some(id) => self
                .links
                .iter()
                .filter(|l| l.source == id)
                .copied()
                .collect(),
            None => Vec::new(),
        };

        let mut keep: Vec<bool> = self.nodes.iter().map(|n| n.top_level).collect();
        for link in &links {
            keep[link.target] = true;
        }

        let nodes = self
            .nodes
            .iter()
            .filter(|n| keep[n.id])
            .cloned()
            .collect();

        FlowView { nodes, links }
    }

    /// Blog total and child count for a top-level node; for a subtopic,
    /// the sum over its incoming links and zero children.
    pub fn stats(&self, name: &str) -> Option<NodeStats> {
        let id = self.node_id(name)?;
        let node = &self.nodes[id];
        if node.top_level {
            let outgoing: Vec<&FlowLink> =
                self.links.iter().filter(|l| l.source == id).collect();
            Some(NodeStats {
                blogs: outgoing.iter().map(|l| l.value).sum(),
                children: outgoing.len(),
            })
        } else {
            Some(NodeStats {
                blogs: self
                    .links
                    .iter()
                    .filter(|l| l.target == id)
                    .map(|l| l.value)
                    .sum(),
                children: 0,
            })
        }
    }
}
