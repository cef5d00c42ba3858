// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Shortest drivable paths over road segments fetched for a bounding box.
//!
//! Raw, unordered [road segments](RoadSegment) are turned into a weighted directed
//! [Graph] by a [GraphBuilder]: shape points are deduplicated by rounding their coordinates,
//! one-way streets are respected, and ways meeting at slightly different points are stitched
//! together. A* then finds the shortest path between two nodes of the graph.
//! A [Router] ties everything together, fetching segments from a [SegmentSource].
//!
//! # Example
//!
//! ```no_run
//! use roadroute::{Coordinate, FileFormat, FileSource, RouteOptions, RouteOutcome, Router};
//!
//! let source = FileSource::new("path/to/monaco.osm", FileFormat::Xml);
//! let router = Router::new(source, RouteOptions::default());
//!
//! let start = Coordinate::new(43.7384, 7.4246);
//! let end = Coordinate::new(43.7478, 7.4323);
//! match router.route(start, end).expect("failed to read road data") {
//!     RouteOutcome::PathFound(path) => println!("Route: {:?}", path.nodes),
//!     RouteOutcome::NoPath(reason) => println!("No route: {reason}"),
//! }
//! ```

mod astar;
mod distance;
mod graph;
mod node_id;
mod route;
mod segment;

pub use astar::{find_route, AStarError, DEFAULT_STEP_LIMIT};
pub use distance::earth_distance;
pub use graph::Graph;
pub use node_id::{NodeId, COORDINATE_PRECISION};
pub use route::{NoPathReason, RouteOptions, RouteOutcome, Router, DEFAULT_BBOX_PADDING};
pub use segment::{
    build_graph, read_segments_from_buffer, read_segments_from_io, BoundingBox, BuilderOptions,
    FetchError, FileFormat, FileSource, GraphBuilder, MemorySource, RoadSegment, SegmentId,
    SegmentSource, DEFAULT_STITCH_TOLERANCE,
};

/// A position on Earth, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns `true` if both components are finite and within
    /// the [-90, 90] latitude and [-180, 180] longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Represents an element of the [Graph]: a shape point of a road or a junction.
///
/// The position of a node is always rounded, so that `NodeId::from_coordinate(node.coordinate())`
/// gives back `node.id`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

impl Node {
    /// Creates a node at the rounded position of `c`.
    pub fn from_coordinate(c: Coordinate) -> Self {
        let id = NodeId::from_coordinate(c);
        let Coordinate { lat, lon } = id.coordinate();
        Self { id, lat, lon }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }
}

/// Represents an outgoing (one-way) connection from a specific [Node].
///
/// `weight` is the great-circle distance between the two nodes, in meters,
/// and thus never less than the crow-flies distance used as the A* heuristic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: NodeId,
    pub weight: f64,
}

/// Result of a route search: an ordered sequence of [Nodes](Node)
/// from the start to the goal (inclusive).
///
/// An empty path means that no route exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    pub nodes: Vec<Node>,

    /// Sum of [Edge] weights along the path, in meters.
    pub cost: f64,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the path as `(node id, latitude, longitude)` triples.
    pub fn waypoints(&self) -> impl Iterator<Item = (NodeId, f64, f64)> + '_ {
        self.nodes.iter().map(|n| (n.id, n.lat, n.lon))
    }
}
