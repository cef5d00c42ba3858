// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::fs::File;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use super::{xml, BoundingBox, RoadSegment};

/// Error which can occur when road segments can't be obtained from a [SegmentSource].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The source couldn't provide data for another reason, e.g. a remote service failure.
    #[error("road data unavailable: {0}")]
    Unavailable(String),
}

/// Provider of [road segments](RoadSegment) within a requested area.
///
/// Implementations are free to return segments extending beyond the bounding box,
/// or segments not touching it at all. Any function with a matching signature
/// is a SegmentSource.
pub trait SegmentSource {
    fn fetch(&self, bbox: &BoundingBox) -> Result<Vec<RoadSegment>, FetchError>;
}

impl<F> SegmentSource for F
where
    F: Fn(&BoundingBox) -> Result<Vec<RoadSegment>, FetchError>,
{
    fn fetch(&self, bbox: &BoundingBox) -> Result<Vec<RoadSegment>, FetchError> {
        self(bbox)
    }
}

/// [SegmentSource] over a fixed set of segments kept in memory.
/// Only segments with at least one point inside the requested area are returned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySource(pub Vec<RoadSegment>);

impl SegmentSource for MemorySource {
    fn fetch(&self, bbox: &BoundingBox) -> Result<Vec<RoadSegment>, FetchError> {
        Ok(self.0.iter().filter(|s| s.touches(bbox)).cloned().collect())
    }
}

/// Format of an input OSM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Unknown format - guess the format based on the content
    #[default]
    Unknown,

    /// Force uncompressed [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    Xml,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [gzip](https://en.wikipedia.org/wiki/Gzip) compression
    XmlGz,

    /// Force [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML)
    /// with [bzip2](https://en.wikipedia.org/wiki/Bzip2) compression
    XmlBz2,
}

impl FileFormat {
    /// Guesses the format from the first bytes of the data.
    fn detect(prefix: &[u8]) -> Self {
        if prefix.starts_with(&[0x1f, 0x8b]) {
            Self::XmlGz
        } else if prefix.starts_with(b"BZh") {
            Self::XmlBz2
        } else {
            Self::Xml
        }
    }
}

/// [SegmentSource] reading an OSM XML file (for example, the saved response
/// of an Overpass `out geom;` query) on every fetch.
///
/// Only drivable ways with at least one point inside the requested area are returned.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSource {
    pub path: PathBuf,
    pub format: FileFormat,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P, format: FileFormat) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            format,
        }
    }
}

impl SegmentSource for FileSource {
    fn fetch(&self, bbox: &BoundingBox) -> Result<Vec<RoadSegment>, FetchError> {
        let f = File::open(&self.path)?;
        let mut segments = read_segments_from_io(self.format, f)?;
        segments.retain(|s| s.touches(bbox));
        log::debug!(
            "{}: {} segments within {}",
            self.path.display(),
            segments.len(),
            bbox
        );
        Ok(segments)
    }
}

/// Reads all drivable [road segments](RoadSegment) from a stream of OSM XML data.
///
/// The provided stream will be automatically wrapped in a buffered reader when needed.
pub fn read_segments_from_io<R: io::Read>(
    format: FileFormat,
    reader: R,
) -> Result<Vec<RoadSegment>, FetchError> {
    let mut b = io::BufReader::new(reader);
    let format = match format {
        FileFormat::Unknown => {
            let detected = FileFormat::detect(b.fill_buf()?);
            log::debug!("detected input format: {:?}", detected);
            detected
        }
        format => format,
    };

    match format {
        FileFormat::Unknown | FileFormat::Xml => read_segments(b),

        FileFormat::XmlGz => {
            let d = flate2::read::MultiGzDecoder::new(b);
            read_segments(io::BufReader::new(d))
        }

        FileFormat::XmlBz2 => {
            let d = bzip2::read::MultiBzDecoder::new(b);
            read_segments(io::BufReader::new(d))
        }
    }
}

/// Reads all drivable [road segments](RoadSegment) from an in-memory buffer of OSM XML data.
pub fn read_segments_from_buffer(
    format: FileFormat,
    data: &[u8],
) -> Result<Vec<RoadSegment>, FetchError> {
    match format {
        // Fast path is available for uncompressed in-memory data
        FileFormat::Xml => read_segments(data),
        FileFormat::Unknown if FileFormat::detect(data) == FileFormat::Xml => read_segments(data),
        _ => read_segments_from_io(format, data),
    }
}

fn read_segments<R: io::BufRead>(reader: R) -> Result<Vec<RoadSegment>, FetchError> {
    Ok(xml::Reader::from_io(reader).collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::{Coordinate, SegmentId};

    const DATA: &str = r#"<osm>
  <way id="1">
    <nd lat="0.0" lon="0.0"/>
    <nd lat="0.0" lon="0.001"/>
    <tag k="highway" v="residential"/>
  </way>
  <way id="2">
    <nd lat="1.0" lon="1.0"/>
    <nd lat="1.0" lon="1.001"/>
    <tag k="highway" v="primary"/>
  </way>
</osm>"#;

    fn ids(segments: &[RoadSegment]) -> Vec<SegmentId> {
        segments.iter().map(|s| s.id.clone()).collect()
    }

    fn compress_gz(data: &[u8]) -> Vec<u8> {
        let mut e = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        e.write_all(data).unwrap();
        e.finish().unwrap()
    }

    fn compress_bz2(data: &[u8]) -> Vec<u8> {
        let mut e = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        e.write_all(data).unwrap();
        e.finish().unwrap()
    }

    #[test]
    fn buffer_xml() {
        let segments = read_segments_from_buffer(FileFormat::Xml, DATA.as_bytes()).unwrap();
        assert_eq!(ids(&segments), vec![SegmentId::Int(1), SegmentId::Int(2)]);
    }

    #[test]
    fn io_gz() {
        let compressed = compress_gz(DATA.as_bytes());
        let segments = read_segments_from_io(FileFormat::XmlGz, &compressed[..]).unwrap();
        assert_eq!(ids(&segments), vec![SegmentId::Int(1), SegmentId::Int(2)]);
    }

    #[test]
    fn io_bz2() {
        let compressed = compress_bz2(DATA.as_bytes());
        let segments = read_segments_from_buffer(FileFormat::XmlBz2, &compressed).unwrap();
        assert_eq!(ids(&segments), vec![SegmentId::Int(1), SegmentId::Int(2)]);
    }

    #[test]
    fn detects_format() {
        for data in [DATA.as_bytes().to_vec(), compress_gz(DATA.as_bytes()), compress_bz2(DATA.as_bytes())] {
            let segments = read_segments_from_buffer(FileFormat::Unknown, &data).unwrap();
            assert_eq!(segments.len(), 2);
        }
    }

    #[test]
    fn xml_error() {
        let err = read_segments_from_buffer(FileFormat::Xml, b"<osm><way id=\"1\"></osm>")
            .unwrap_err();
        assert!(matches!(err, FetchError::Xml(_)), "{err}");
    }

    #[test]
    fn memory_source_filters_by_bbox() {
        let source = MemorySource(vec![
            RoadSegment::new(1, vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.001)]),
            RoadSegment::new(2, vec![Coordinate::new(1.0, 1.0), Coordinate::new(1.0, 1.001)]),
        ]);
        let bbox = BoundingBox::around(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0), 0.005);
        let segments = source.fetch(&bbox).unwrap();
        assert_eq!(ids(&segments), vec![SegmentId::Int(1)]);
    }

    #[test]
    fn file_source() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(&compress_gz(DATA.as_bytes())).unwrap();
        f.flush().unwrap();

        let source = FileSource::new(f.path(), FileFormat::Unknown);
        let bbox = BoundingBox::around(Coordinate::new(1.0, 1.0), Coordinate::new(1.0, 1.0), 0.005);
        let segments = source.fetch(&bbox).unwrap();
        assert_eq!(ids(&segments), vec![SegmentId::Int(2)]);
    }

    #[test]
    fn file_source_missing_file() {
        let source = FileSource::new("/nonexistent/roadroute/data.osm", FileFormat::Xml);
        let bbox = BoundingBox::around(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0), 0.005);
        assert!(matches!(source.fetch(&bbox), Err(FetchError::Io(_))));
    }

    #[test]
    fn closure_source() {
        let source = |_: &BoundingBox| -> Result<Vec<RoadSegment>, FetchError> {
            Err(FetchError::Unavailable("service down".to_string()))
        };
        let bbox = BoundingBox::around(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0), 0.005);
        let err = source.fetch(&bbox).unwrap_err();
        assert_eq!(err.to_string(), "road data unavailable: service down");
    }
}
