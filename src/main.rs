use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use roadroute::{
    Coordinate, FileFormat, FileSource, NoPathReason, Path, RouteOptions, RouteOutcome, Router,
    DEFAULT_BBOX_PADDING, DEFAULT_STEP_LIMIT,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}: {1}")]
struct RoadDataError(PathBuf, #[source] roadroute::FetchError);

#[derive(Debug, thiserror::Error)]
#[error("no route: {0}")]
struct NoRouteError(NoPathReason);

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Auto,
    Xml,
    XmlGz,
    XmlBz2,
}

impl From<Format> for FileFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Auto => FileFormat::Unknown,
            Format::Xml => FileFormat::Xml,
            Format::XmlGz => FileFormat::XmlGz,
            Format::XmlBz2 => FileFormat::XmlBz2,
        }
    }
}

#[derive(Parser)]
struct Cli {
    /// The path to the OSM XML file with road data, e.g. a saved Overpass response
    osm_file: PathBuf,

    /// Latitude of the start point
    #[arg(allow_hyphen_values = true)]
    start_lat: f64,

    /// Longitude of the start point
    #[arg(allow_hyphen_values = true)]
    start_lon: f64,

    /// Latitude of the end point
    #[arg(allow_hyphen_values = true)]
    end_lat: f64,

    /// Longitude of the end point
    #[arg(allow_hyphen_values = true)]
    end_lon: f64,

    /// Format of the OSM file
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    format: Format,

    /// Padding around the start and end points for loading roads, in degrees
    #[arg(long, default_value_t = DEFAULT_BBOX_PADDING)]
    padding: f64,

    /// Maximum number of nodes expanded by the route search
    #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
    step_limit: usize,

    /// Log more details (repeat for even more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let source = FileSource::new(&cli.osm_file, cli.format.into());
    let options = RouteOptions {
        bbox_padding: cli.padding,
        step_limit: cli.step_limit,
        ..RouteOptions::default()
    };
    let router = Router::new(source, options);

    let start = Coordinate::new(cli.start_lat, cli.start_lon);
    let end = Coordinate::new(cli.end_lat, cli.end_lon);
    let outcome = router
        .route(start, end)
        .map_err(|e| RoadDataError(cli.osm_file.clone(), e))?;

    match outcome {
        RouteOutcome::PathFound(path) => {
            print_geojson(&path);
            Ok(())
        }
        RouteOutcome::NoPath(reason) => Err(NoRouteError(reason).into()),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = colog::default_builder();
    builder.filter_level(level);
    builder.init();
}

fn print_geojson(path: &Path) {
    println!("{{");
    println!("  \"type\": \"FeatureCollection\",");
    println!("  \"features\": [");
    println!("    {{");
    println!("      \"type\": \"Feature\",");
    println!("      \"properties\": {{\"distance\": {:.1}}},", path.cost);

    println!("      \"geometry\": {{");
    println!("        \"type\": \"LineString\",");
    println!("        \"coordinates\": [");

    let mut waypoints = path.waypoints().peekable();
    while let Some((_, lat, lon)) = waypoints.next() {
        let suffix = if waypoints.peek().is_some() { "," } else { "" };
        println!("          [{}, {}]{}", lon, lat, suffix);
    }

    println!("        ]");
    println!("      }}");
    println!("    }}");
    println!("  ]");
    println!("}}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_route_error_message() {
        let err: Box<dyn Error> = NoRouteError(NoPathReason::Unreachable).into();
        assert_eq!(err.to_string(), "no route: end is unreachable from start");
    }
}
