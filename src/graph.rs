// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Coordinate, Edge, Node, NodeId};
use std::collections::btree_map::{BTreeMap, Entry};

/// Represents a road network as a set of [Nodes](Node)
/// and directed [Edges](Edge) between them.
///
/// A Graph is created by a [GraphBuilder](crate::GraphBuilder) and is immutable afterwards.
/// Every [Edge] points to a node which exists in the graph, and there is at most
/// one edge for every ordered pair of nodes.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph(BTreeMap<NodeId, (Node, Vec<Edge>)>);

impl Graph {
    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the total number of directed edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.0.values().map(|(_, edges)| edges.len()).sum()
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, in ascending [NodeId] order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.0.values().map(|(node, _)| node)
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: NodeId) -> Option<Node> {
        self.0.get(&id).map(|&(node, _)| node)
    }

    /// Finds the closest [Node] to the given position.
    ///
    /// This function requires computing the distance to every [Node] in the graph.
    /// If multiple nodes are equally close, the one with the smallest [NodeId] is returned.
    pub fn find_nearest_node(&self, target: Coordinate) -> Option<Node> {
        self.iter()
            .map(|&nd| (earth_distance(target, nd.coordinate()), nd))
            .fold(None, |best: Option<(f64, Node)>, (dist, nd)| match best {
                Some((best_dist, _)) if best_dist <= dist => best,
                _ => Some((dist, nd)),
            })
            .map(|(_, nd)| nd)
    }

    /// Gets all outgoing [Edges](Edge) from a node with a given id.
    pub fn get_edges(&self, from: NodeId) -> &[Edge] {
        self.0
            .get(&from)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Gets the weight of an [Edge] from one node to another.
    /// If such an edge doesn't exist, returns [f64::INFINITY].
    pub fn get_edge(&self, from: NodeId, to: NodeId) -> f64 {
        self.get_edges(from)
            .iter()
            .find_map(|edge| if edge.to == to { Some(edge.weight) } else { None })
            .unwrap_or(f64::INFINITY)
    }

    /// Creates a [Node] unless one with `node.id` already exists.
    pub(crate) fn insert_node(&mut self, node: Node) {
        if let Entry::Vacant(e) = self.0.entry(node.id) {
            e.insert((node, Vec::default()));
        }
    }

    /// Creates or updates an [Edge] from a node with a given id.
    ///
    /// Edges from or to unknown nodes, and self-loops, are ignored.
    pub(crate) fn set_edge(&mut self, from: NodeId, edge: Edge) {
        if from == edge.to || !self.0.contains_key(&edge.to) {
            return;
        }

        if let Some((_, edges)) = self.0.get_mut(&from) {
            if let Some(candidate) = edges.iter_mut().find(|e| e.to == edge.to) {
                *candidate = edge;
            } else {
                edges.push(edge);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(lat: f64, lon: f64) -> Node {
        Node::from_coordinate(Coordinate::new(lat, lon))
    }

    fn sample_graph() -> (Graph, Node, Node, Node) {
        let a = node(0.0, 0.0);
        let b = node(0.0, 0.001);
        let c = node(0.001, 0.001);

        let mut g = Graph::default();
        g.insert_node(a);
        g.insert_node(b);
        g.insert_node(c);
        g.set_edge(a.id, Edge { to: b.id, weight: 111.0 });
        g.set_edge(b.id, Edge { to: c.id, weight: 111.0 });
        (g, a, b, c)
    }

    #[test]
    fn edges() {
        let (g, a, b, c) = sample_graph();
        assert_eq!(g.len(), 3);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.get_edge(a.id, b.id), 111.0);
        assert!(g.get_edge(b.id, a.id).is_infinite());
        assert!(g.get_edge(a.id, c.id).is_infinite());
        assert!(g.get_edges(c.id).is_empty());
    }

    #[test]
    fn set_edge_replaces_existing() {
        let (mut g, a, b, _) = sample_graph();
        g.set_edge(a.id, Edge { to: b.id, weight: 50.0 });
        assert_eq!(g.get_edges(a.id).len(), 1);
        assert_eq!(g.get_edge(a.id, b.id), 50.0);
    }

    #[test]
    fn set_edge_ignores_unknown_nodes_and_loops() {
        let (mut g, a, _, _) = sample_graph();
        let unknown = node(10.0, 10.0);
        g.set_edge(a.id, Edge { to: unknown.id, weight: 1.0 });
        g.set_edge(unknown.id, Edge { to: a.id, weight: 1.0 });
        g.set_edge(a.id, Edge { to: a.id, weight: 0.0 });
        assert_eq!(g.edge_count(), 2);
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn insert_node_keeps_edges() {
        let (mut g, a, b, _) = sample_graph();
        g.insert_node(a);
        assert_eq!(g.get_edge(a.id, b.id), 111.0);
    }

    #[test]
    fn find_nearest_node() {
        let (g, a, b, c) = sample_graph();
        assert_eq!(g.find_nearest_node(Coordinate::new(0.0001, -0.0001)), Some(a));
        assert_eq!(g.find_nearest_node(Coordinate::new(-0.0001, 0.0009)), Some(b));
        assert_eq!(g.find_nearest_node(Coordinate::new(0.5, 0.5)), Some(c));
    }

    #[test]
    fn find_nearest_node_empty() {
        assert_eq!(Graph::default().find_nearest_node(Coordinate::new(0.0, 0.0)), None);
    }
}
