// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use quick_xml::events::{BytesStart, Event};

use super::RoadSegment;
use crate::Coordinate;

/// Values of the `highway` tag of ways which can be driven on.
const DRIVABLE_HIGHWAYS: &[&str] = &[
    "motorway",
    "motorway_link",
    "trunk",
    "trunk_link",
    "primary",
    "primary_link",
    "secondary",
    "secondary_link",
    "tertiary",
    "tertiary_link",
    "residential",
    "living_street",
    "service",
    "unclassified",
];

/// Returns `true` for ways with a drivable `highway` tag, not closed off
/// with `access=private` or `access=no`.
pub(super) fn is_drivable(tags: &HashMap<String, String>) -> bool {
    let highway = tags.get("highway").map(String::as_str).unwrap_or("");
    let access = tags.get("access").map(String::as_str).unwrap_or("");
    DRIVABLE_HIGHWAYS.contains(&highway) && access != "private" && access != "no"
}

/// Reader streams drivable [road segments](RoadSegment) out of
/// [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML).
///
/// Shape points of ways may be provided inline (`<nd lat=".." lon=".."/>`, as returned
/// by Overpass `out geom;` queries), or as references to previously seen `<node>` elements.
pub(super) struct Reader<R: io::BufRead> {
    parser: quick_xml::Reader<R>,
    buf: Vec<u8>,
    nodes: HashMap<i64, Coordinate>,
    way: Option<RoadSegment>,
    eof: bool,
}

impl<R: io::BufRead> Reader<R> {
    pub(super) fn from_io(reader: R) -> Self {
        Self {
            parser: quick_xml::Reader::from_reader(reader),
            buf: Vec::default(),
            nodes: HashMap::default(),
            way: None,
            eof: false,
        }
    }

    /// Handles a `<way>` closing tag, returning the way if it should be emitted.
    fn finish_way(&mut self) -> Option<RoadSegment> {
        let way = self.way.take()?;
        if is_drivable(&way.tags) {
            Some(way)
        } else {
            log::trace!("way {}: not drivable, skipping", way.id);
            None
        }
    }
}

impl<R: io::BufRead> Iterator for Reader<R> {
    type Item = Result<RoadSegment, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.eof {
            self.buf.clear();
            let event = match self.parser.read_event_into(&mut self.buf) {
                Ok(e) => e,
                Err(e) => {
                    self.eof = true;
                    return Some(Err(e));
                }
            };

            match event {
                Event::Empty(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some((id, c)) = parse_node(&start) {
                            self.nodes.insert(id, c);
                        }
                    }
                    b"nd" => {
                        if let Some(way) = self.way.as_mut() {
                            match parse_nd(&start, &self.nodes) {
                                Some(c) => way.points.push(c),
                                None => log::warn!("way {}: skipping unresolvable <nd>", way.id),
                            }
                        }
                    }
                    b"tag" => {
                        if let Some(way) = self.way.as_mut() {
                            if let Some((k, v)) = parse_tag(&start) {
                                way.tags.insert(k, v);
                            }
                        }
                    }
                    // Self-closing ways don't have any geometry
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => {
                        if let Some((id, c)) = parse_node(&start) {
                            self.nodes.insert(id, c);
                        }
                    }
                    b"way" => {
                        self.way = parse_way(&start);
                        if self.way.is_none() {
                            log::warn!("skipping <way> without a valid id");
                        }
                    }
                    _ => {}
                },

                Event::End(end) => {
                    if end.local_name().as_ref() == b"way" {
                        if let Some(way) = self.finish_way() {
                            return Some(Ok(way));
                        }
                    }
                }

                Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        None
    }
}

fn parse_f64(value: &[u8]) -> Option<f64> {
    from_utf8(value).ok()?.trim().parse().ok()
}

fn parse_i64(value: &[u8]) -> Option<i64> {
    from_utf8(value).ok()?.trim().parse().ok()
}

fn parse_node(start: &BytesStart<'_>) -> Option<(i64, Coordinate)> {
    let mut id = None;
    let mut lat = None;
    let mut lon = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"id" => id = parse_i64(&attr.value),
            b"lat" => lat = parse_f64(&attr.value),
            b"lon" => lon = parse_f64(&attr.value),
            _ => {}
        }
    }

    match (id, lat, lon) {
        (Some(id), Some(lat), Some(lon)) => Some((id, Coordinate::new(lat, lon))),
        _ => {
            log::warn!("skipping <node> without valid id, lat or lon");
            None
        }
    }
}

fn parse_way(start: &BytesStart<'_>) -> Option<RoadSegment> {
    let mut id = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        if attr.key.as_ref() == b"id" {
            id = parse_i64(&attr.value);
        }
    }

    id.map(|id| RoadSegment::new(id, Vec::default()))
}

/// Parses a way's shape point, preferring inline coordinates over a node reference.
fn parse_nd(start: &BytesStart<'_>, nodes: &HashMap<i64, Coordinate>) -> Option<Coordinate> {
    let mut ref_ = None;
    let mut lat = None;
    let mut lon = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"ref" => ref_ = parse_i64(&attr.value),
            b"lat" => lat = parse_f64(&attr.value),
            b"lon" => lon = parse_f64(&attr.value),
            _ => {}
        }
    }

    match (lat, lon, ref_) {
        (Some(lat), Some(lon), _) => Some(Coordinate::new(lat, lon)),
        (_, _, Some(ref_)) => nodes.get(&ref_).copied(),
        _ => None,
    }
}

fn parse_tag(start: &BytesStart<'_>) -> Option<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr.ok()?;
        match attr.key.as_ref() {
            b"k" => k = attr.unescape_value().ok().map(|s| s.into_owned()),
            b"v" => v = attr.unescape_value().ok().map(|s| s.into_owned()),
            _ => {}
        }
    }

    k.map(|k| (k, v.unwrap_or_default()))
}
