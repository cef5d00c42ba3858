// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{
    find_route, AStarError, BoundingBox, BuilderOptions, Coordinate, FetchError, GraphBuilder,
    Node, Path, SegmentSource, DEFAULT_STEP_LIMIT,
};

/// Default padding around the start and end points of a route, in degrees (about 500 m).
pub const DEFAULT_BBOX_PADDING: f64 = 0.005;

/// Additional controls for finding routes with a [Router].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteOptions {
    /// Road segments are requested for the bounding box of the start and end points,
    /// grown by this many degrees on every side.
    pub bbox_padding: f64,

    /// Maximum number of node expansions in the route search,
    /// see [find_route](crate::find_route).
    pub step_limit: usize,

    /// How the road graph is built from the fetched segments.
    pub builder: BuilderOptions,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            bbox_padding: DEFAULT_BBOX_PADDING,
            step_limit: DEFAULT_STEP_LIMIT,
            builder: BuilderOptions::default(),
        }
    }
}

/// Why a [Router] couldn't find a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoPathReason {
    /// There are no usable road segments in the requested area.
    EmptyGraph,

    /// No node close to the start or end point was found.
    NoNearestNode,

    /// The search has exhausted all reachable nodes without reaching the end.
    Unreachable,

    /// The search has given up after expanding the maximum allowed number of nodes.
    /// The end may or may not be reachable.
    StepLimitExceeded,
}

impl std::fmt::Display for NoPathReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyGraph => write!(f, "no roads in the area"),
            Self::NoNearestNode => write!(f, "no road near the start or end point"),
            Self::Unreachable => write!(f, "end is unreachable from start"),
            Self::StepLimitExceeded => write!(f, "step limit exceeded"),
        }
    }
}

/// Successful outcome of [Router::route]. Failures to obtain road data
/// are reported separately, as [FetchError].
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    PathFound(Path),
    NoPath(NoPathReason),
}

impl RouteOutcome {
    /// Returns the nodes of the found path, or an empty slice if there is no route.
    pub fn path(&self) -> &[Node] {
        match self {
            Self::PathFound(path) => &path.nodes,
            Self::NoPath(_) => &[],
        }
    }
}

/// Finds routes between arbitrary points, building a fresh road graph
/// from a [SegmentSource] for every request.
///
/// A Router holds no mutable state; concurrent requests are independent of each other.
#[derive(Debug, Clone)]
pub struct Router<S: SegmentSource> {
    source: S,
    options: RouteOptions,
}

impl<S: SegmentSource> Router<S> {
    pub fn new(source: S, options: RouteOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    /// Finds the shortest route between the road nodes closest to `start` and `end`.
    ///
    /// Errors from the [SegmentSource] are returned as-is, without retrying.
    pub fn route(&self, start: Coordinate, end: Coordinate) -> Result<RouteOutcome, FetchError> {
        let bbox = BoundingBox::around(start, end, self.options.bbox_padding);
        let segments = self.source.fetch(&bbox)?;
        log::debug!("fetched {} segments within {}", segments.len(), bbox);

        let g = {
            let mut b = GraphBuilder::new(self.options.builder);
            b.add_segments(&segments);
            b.finish()
        };
        if g.is_empty() {
            log::info!("no roads within {}", bbox);
            return Ok(RouteOutcome::NoPath(NoPathReason::EmptyGraph));
        }

        let (from, to) = match (g.find_nearest_node(start), g.find_nearest_node(end)) {
            (Some(from), Some(to)) => (from, to),
            _ => return Ok(RouteOutcome::NoPath(NoPathReason::NoNearestNode)),
        };
        log::debug!("routing from node {} to node {}", from.id, to.id);

        let outcome = match find_route(&g, from.id, to.id, self.options.step_limit) {
            Ok(path) if path.is_empty() => RouteOutcome::NoPath(NoPathReason::Unreachable),
            Ok(path) => RouteOutcome::PathFound(path),
            Err(AStarError::StepLimitExceeded) => {
                RouteOutcome::NoPath(NoPathReason::StepLimitExceeded)
            }
            // Both nodes were just taken from the graph
            Err(AStarError::InvalidReference(_)) => {
                RouteOutcome::NoPath(NoPathReason::NoNearestNode)
            }
        };

        match &outcome {
            RouteOutcome::PathFound(path) => log::info!(
                "route found: {} nodes, {:.1} m",
                path.nodes.len(),
                path.cost
            ),
            RouteOutcome::NoPath(reason) => log::info!("no route: {}", reason),
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{MemorySource, NodeId, RoadSegment};

    fn segment(id: i64, points: &[(f64, f64)]) -> RoadSegment {
        RoadSegment::new(
            id,
            points
                .iter()
                .map(|&(lat, lon)| Coordinate::new(lat, lon))
                .collect(),
        )
    }

    fn ids(nodes: &[Node]) -> Vec<NodeId> {
        nodes.iter().map(|n| n.id).collect()
    }

    fn id(lat: f64, lon: f64) -> NodeId {
        NodeId::from_coordinate(Coordinate::new(lat, lon))
    }

    #[test]
    fn path_found() {
        let router = Router::new(
            MemorySource(vec![
                segment(1, &[(0.0, 0.0), (0.0, 0.001), (0.0, 0.002)]),
                segment(2, &[(0.0, 0.002), (0.001, 0.002)]),
            ]),
            RouteOptions::default(),
        );

        let outcome = router
            .route(Coordinate::new(0.00001, -0.00002), Coordinate::new(0.00098, 0.00201))
            .unwrap();

        assert_eq!(
            ids(outcome.path()),
            vec![id(0.0, 0.0), id(0.0, 0.001), id(0.0, 0.002), id(0.001, 0.002)],
        );
        match outcome {
            RouteOutcome::PathFound(path) => {
                assert!((path.cost - 333.6).abs() < 1.0, "{}", path.cost);

                let waypoints: Vec<_> = path.waypoints().collect();
                assert_eq!(waypoints.len(), 4);
                assert_eq!(waypoints[0], (id(0.0, 0.0), 0.0, 0.0));
                assert_eq!(waypoints[3], (id(0.001, 0.002), 0.001, 0.002));
            }
            RouteOutcome::NoPath(reason) => panic!("unexpected no path: {reason}"),
        }
    }

    #[test]
    fn empty_area() {
        // Scenario: no segments at all - no search is attempted
        let router = Router::new(MemorySource::default(), RouteOptions::default());
        let outcome = router
            .route(Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.001))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::NoPath(NoPathReason::EmptyGraph));
        assert!(outcome.path().is_empty());
    }

    #[test]
    fn segments_outside_of_bbox() {
        let router = Router::new(
            MemorySource(vec![segment(1, &[(1.0, 1.0), (1.0, 1.001)])]),
            RouteOptions::default(),
        );
        let outcome = router
            .route(Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.001))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::NoPath(NoPathReason::EmptyGraph));
    }

    #[test]
    fn unreachable() {
        let router = Router::new(
            MemorySource(vec![
                segment(1, &[(0.0, 0.0), (0.0, 0.001)]),
                segment(2, &[(0.001, 0.0), (0.001, 0.001)]),
            ]),
            RouteOptions::default(),
        );
        let outcome = router
            .route(Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.001))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::NoPath(NoPathReason::Unreachable));
    }

    #[test]
    fn step_limit_exceeded() {
        let router = Router::new(
            MemorySource(vec![segment(
                1,
                &[(0.0, 0.0), (0.0, 0.001), (0.0, 0.002), (0.0, 0.003)],
            )]),
            RouteOptions {
                step_limit: 2,
                ..RouteOptions::default()
            },
        );
        let outcome = router
            .route(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.003))
            .unwrap();
        assert_eq!(outcome, RouteOutcome::NoPath(NoPathReason::StepLimitExceeded));
    }

    #[test]
    fn same_start_and_end() {
        let router = Router::new(
            MemorySource(vec![segment(1, &[(0.0, 0.0), (0.0, 0.001)])]),
            RouteOptions::default(),
        );
        let outcome = router
            .route(Coordinate::new(0.0, 0.0009), Coordinate::new(0.0, 0.0011))
            .unwrap();
        assert_eq!(ids(outcome.path()), vec![id(0.0, 0.001)]);
    }

    #[test]
    fn fetch_error_is_returned_verbatim() {
        let calls = Cell::new(0);
        let source = |_: &BoundingBox| -> Result<Vec<RoadSegment>, FetchError> {
            calls.set(calls.get() + 1);
            Err(FetchError::Unavailable("HTTP 504".to_string()))
        };

        let router = Router::new(source, RouteOptions::default());
        let err = router
            .route(Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.001))
            .unwrap_err();

        assert!(matches!(err, FetchError::Unavailable(ref msg) if msg == "HTTP 504"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn requests_padded_bbox() {
        let requested = Cell::new(None);
        let source = |bbox: &BoundingBox| -> Result<Vec<RoadSegment>, FetchError> {
            requested.set(Some(*bbox));
            Ok(vec![])
        };

        let router = Router::new(
            source,
            RouteOptions {
                bbox_padding: 0.01,
                ..RouteOptions::default()
            },
        );
        router
            .route(Coordinate::new(52.25, 21.0), Coordinate::new(52.2, 21.05))
            .unwrap();

        let bbox = requested.get().expect("source should have been called");
        assert!((bbox.min_lat - 52.19).abs() < 1e-9);
        assert!((bbox.min_lon - 20.99).abs() < 1e-9);
        assert!((bbox.max_lat - 52.26).abs() < 1e-9);
        assert!((bbox.max_lon - 21.06).abs() < 1e-9);
    }

    #[test]
    fn stitched_crossing() {
        // Two streets meeting 1.1 m apart at (0, 0.001)
        let router = Router::new(
            MemorySource(vec![
                segment(1, &[(0.0, 0.0), (0.0, 0.001)]),
                segment(2, &[(0.00001, 0.001), (0.001, 0.001)]),
            ]),
            RouteOptions::default(),
        );
        let outcome = router
            .route(Coordinate::new(0.0, 0.0), Coordinate::new(0.001, 0.001))
            .unwrap();
        assert_eq!(
            ids(outcome.path()),
            vec![id(0.0, 0.0), id(0.0, 0.001), id(0.00001, 0.001), id(0.001, 0.001)],
        );
    }
}
