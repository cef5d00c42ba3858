// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{BTreeSet, HashMap};

use crate::{earth_distance, Edge, Graph, Node, NodeId, COORDINATE_PRECISION};

use super::{RoadSegment, SegmentId};

/// Default distance, in degrees along each axis, within which segment endpoints
/// at intersections are connected with other nodes. About 2 meters.
pub const DEFAULT_STITCH_TOLERANCE: f64 = 0.00002;

/// Additional controls for converting [road segments](RoadSegment) into a [Graph].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuilderOptions {
    /// Endpoints of segments at intersections are connected to all nodes whose
    /// latitude and longitude both differ by less than this many degrees.
    /// Stitching is disabled if this isn't a positive, finite number.
    pub stitch_tolerance: f64,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            stitch_tolerance: DEFAULT_STITCH_TOLERANCE,
        }
    }
}

/// Builds a [Graph] from the provided segments with the default [BuilderOptions].
pub fn build_graph(segments: &[RoadSegment]) -> Graph {
    let mut b = GraphBuilder::new(BuilderOptions::default());
    b.add_segments(segments);
    b.finish()
}

/// Segment with shape points resolved to [NodeIds](NodeId), waiting for edges to be created.
#[derive(Debug)]
struct PendingWay {
    id: SegmentId,
    nodes: Vec<NodeId>,
    oneway: bool,
}

/// Helper object used for storing state related to converting [road segments](RoadSegment)
/// into a [Graph].
///
/// Nodes are collected while segments are added; edges are only created in [GraphBuilder::finish],
/// once it is known which segments meet at every node. The resulting graph doesn't depend
/// on the order in which segments were added.
#[derive(Debug)]
pub struct GraphBuilder {
    g: Graph,
    options: BuilderOptions,
    ways: Vec<PendingWay>,
    node_segments: HashMap<NodeId, BTreeSet<SegmentId>>,
}

impl GraphBuilder {
    /// Create a new, empty graph builder.
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            g: Graph::default(),
            options,
            ways: Vec::default(),
            node_segments: HashMap::default(),
        }
    }

    pub fn add_segments<'s, I: IntoIterator<Item = &'s RoadSegment>>(&mut self, segments: I) {
        segments.into_iter().for_each(|s| self.add_segment(s));
    }

    /// Adds nodes of a segment to the graph and remembers
    /// the segment for creating edges later.
    pub fn add_segment(&mut self, s: &RoadSegment) {
        let nodes = self.get_segment_nodes(s);

        for &node_id in &nodes {
            self.node_segments
                .entry(node_id)
                .or_default()
                .insert(s.id.clone());
        }

        if nodes.len() >= 2 {
            self.ways.push(PendingWay {
                id: s.id.clone(),
                nodes,
                oneway: s.is_oneway(),
            });
        }
    }

    fn get_segment_nodes(&mut self, s: &RoadSegment) -> Vec<NodeId> {
        s.points
            .iter()
            .filter(|&p| {
                let valid = p.is_valid();
                if !valid {
                    log::warn!(
                        "segment {}: skipping invalid point ({}, {})",
                        s.id,
                        p.lat,
                        p.lon
                    );
                }
                valid
            })
            .map(|&p| {
                let node = Node::from_coordinate(p);
                self.g.insert_node(node);
                node.id
            })
            .collect()
    }

    /// Creates all edges and returns the complete graph.
    pub fn finish(mut self) -> Graph {
        let ways = std::mem::take(&mut self.ways);

        for way in &ways {
            self.create_edges(way);
        }

        let tolerance = self.stitch_tolerance_micro_degrees();
        if let Some(tolerance) = tolerance {
            let grid = NodeGrid::new(self.g.iter().map(|n| n.id), tolerance);
            ways.iter().for_each(|way| self.stitch_intersections(way, &grid));
        }

        log::debug!(
            "graph built from {} segments: {} nodes, {} edges{}",
            ways.len(),
            self.g.len(),
            self.g.edge_count(),
            if tolerance.is_none() { " (stitching disabled)" } else { "" },
        );

        self.g
    }

    fn stitch_tolerance_micro_degrees(&self) -> Option<f64> {
        let t = self.options.stitch_tolerance;
        if t.is_finite() && t > 0.0 {
            Some(t * COORDINATE_PRECISION)
        } else {
            if t != 0.0 {
                log::warn!("invalid stitch tolerance {t}, intersection stitching disabled");
            }
            None
        }
    }

    fn create_edges(&mut self, way: &PendingWay) {
        debug_assert!(way.nodes.len() >= 2);

        way.nodes.windows(2).for_each(|pair| {
            let (from, to) = (pair[0], pair[1]);
            let weight = earth_distance(from.coordinate(), to.coordinate());

            self.g.set_edge(from, Edge { to, weight });
            if !way.oneway {
                self.g.set_edge(to, Edge { to: from, weight });
            }
        });
    }

    /// Connects the first and last node of a way with all nearby nodes,
    /// provided that the endpoint is an intersection of multiple segments.
    fn stitch_intersections(&mut self, way: &PendingWay, grid: &NodeGrid) {
        let (first, last) = match (way.nodes.first(), way.nodes.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return,
        };

        for endpoint in [first, last] {
            let nearby = grid.nearby(endpoint);
            if !self.is_intersection(endpoint, &nearby) {
                continue;
            }

            for &other in &nearby {
                // Nodes already joined by a road keep their edges, so that
                // one-way segments never gain a reverse edge
                if other == endpoint || self.are_adjacent(endpoint, other) {
                    continue;
                }

                let weight = earth_distance(endpoint.coordinate(), other.coordinate());
                self.g.set_edge(endpoint, Edge { to: other, weight });
                self.g.set_edge(other, Edge { to: endpoint, weight });
            }

            log::trace!(
                "segment {}: stitched intersection {} with {} nearby nodes",
                way.id,
                endpoint,
                nearby.len().saturating_sub(1),
            );
        }
    }

    fn are_adjacent(&self, a: NodeId, b: NodeId) -> bool {
        self.g.get_edge(a, b).is_finite() || self.g.get_edge(b, a).is_finite()
    }

    /// A node is an intersection if more than one segment passes through it,
    /// or through any of its `nearby` nodes.
    fn is_intersection(&self, node: NodeId, nearby: &[NodeId]) -> bool {
        let mut segments: BTreeSet<&SegmentId> = BTreeSet::default();
        std::iter::once(&node)
            .chain(nearby)
            .filter_map(|id| self.node_segments.get(id))
            .flatten()
            .any(|segment| {
                segments.insert(segment);
                segments.len() > 1
            })
    }
}

/// Uniform grid over node positions, used to find all nodes
/// within a tolerance without scanning the whole graph.
#[derive(Debug)]
struct NodeGrid {
    cells: HashMap<(i64, i64), Vec<NodeId>>,
    cell_size: i64,
    tolerance: f64,
}

impl NodeGrid {
    /// `tolerance` is expressed in units of 1/[COORDINATE_PRECISION] degrees.
    fn new<I: IntoIterator<Item = NodeId>>(nodes: I, tolerance: f64) -> Self {
        let cell_size = (tolerance.ceil() as i64).max(1);
        let mut cells: HashMap<(i64, i64), Vec<NodeId>> = HashMap::default();
        for id in nodes {
            cells.entry(Self::cell_of(id, cell_size)).or_default().push(id);
        }

        Self {
            cells,
            cell_size,
            tolerance,
        }
    }

    fn cell_of(id: NodeId, cell_size: i64) -> (i64, i64) {
        let (lat, lon) = id.as_micro_degrees();
        (lat.div_euclid(cell_size), lon.div_euclid(cell_size))
    }

    /// Returns all nodes whose latitude and longitude both differ from `id`'s
    /// by less than the tolerance, including `id` itself.
    fn nearby(&self, id: NodeId) -> Vec<NodeId> {
        let (cell_lat, cell_lon) = Self::cell_of(id, self.cell_size);
        let (lat, lon) = id.as_micro_degrees();

        let mut found: Vec<NodeId> = (-1..=1)
            .flat_map(|dlat| (-1..=1).map(move |dlon| (cell_lat + dlat, cell_lon + dlon)))
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .filter(|other| {
                let (other_lat, other_lon) = other.as_micro_degrees();
                ((other_lat - lat).abs() as f64) < self.tolerance
                    && ((other_lon - lon).abs() as f64) < self.tolerance
            })
            .collect();

        found.sort();
        found
    }
}
