// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::Coordinate;

mod graph_builder;
mod source;
mod xml;

pub use graph_builder::{build_graph, BuilderOptions, GraphBuilder, DEFAULT_STITCH_TOLERANCE};
pub use source::{
    read_segments_from_buffer, read_segments_from_io, FetchError, FileFormat, FileSource,
    MemorySource, SegmentSource,
};

/// Identifier of a [RoadSegment], as provided by the road data source.
///
/// Only used to tell segments apart when detecting intersections.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentId {
    Int(i64),
    Str(String),
}

impl From<i64> for SegmentId {
    fn from(id: i64) -> Self {
        Self::Int(id)
    }
}

impl From<i32> for SegmentId {
    fn from(id: i32) -> Self {
        Self::Int(id.into())
    }
}

impl From<String> for SegmentId {
    fn from(id: String) -> Self {
        Self::Str(id)
    }
}

impl From<&str> for SegmentId {
    fn from(id: &str) -> Self {
        Self::Str(id.to_string())
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Str(id) => f.write_str(id),
        }
    }
}

/// A single contiguous stretch of road (an [OSM way](https://wiki.openstreetmap.org/wiki/Way)),
/// made of ordered shape points.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadSegment {
    pub id: SegmentId,
    pub points: Vec<Coordinate>,
    pub tags: HashMap<String, String>,
}

impl RoadSegment {
    pub fn new<I: Into<SegmentId>>(id: I, points: Vec<Coordinate>) -> Self {
        Self {
            id: id.into(),
            points,
            tags: HashMap::default(),
        }
    }

    /// Adds a tag to the segment.
    pub fn with_tag(mut self, k: &str, v: &str) -> Self {
        self.tags.insert(k.to_string(), v.to_string());
        self
    }

    /// Returns `true` if the segment may only be traversed in the direction of its points,
    /// that is if it is tagged with `oneway=yes`. Other values of the tag are ignored.
    pub fn is_oneway(&self) -> bool {
        self.tags.get("oneway").map(String::as_str) == Some("yes")
    }

    /// Returns `true` if at least one point of the segment lies within the bounding box.
    pub fn touches(&self, bbox: &BoundingBox) -> bool {
        self.points.iter().any(|&p| bbox.contains(p))
    }
}

/// An area delimited by two parallels and two meridians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Returns the smallest box containing both points, grown by `padding` degrees on every side.
    pub fn around(a: Coordinate, b: Coordinate, padding: f64) -> Self {
        Self {
            min_lat: a.lat.min(b.lat) - padding,
            min_lon: a.lon.min(b.lon) - padding,
            max_lat: a.lat.max(b.lat) + padding,
            max_lon: a.lon.max(b.lon) + padding,
        }
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        c.lat >= self.min_lat && c.lat <= self.max_lat && c.lon >= self.min_lon && c.lon <= self.max_lon
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({},{},{},{})",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}
