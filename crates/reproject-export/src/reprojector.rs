//! Extent and region reprojection through the engine's transform module.
//!
//! Coordinates are sent to `m.proj` as two corner lines, `east north` then
//! `west south`, and come back as `x y z` lines in the same order. The third
//! column is dropped.

use geo_common::{parse_key_values, Extent, GeoError, GeoResult, ProjectionDescriptor, Region};
use spatial_engine::{ModuleCall, Session};
use tracing::debug;

use crate::error::ExportResult;

const TRANSFORM_MODULE: &str = "m.proj";

/// Reproject `extent` from the current workspace's projection to WGS84
/// longitude/latitude.
pub fn to_geographic(session: &Session, extent: &Extent) -> ExportResult<Extent> {
    let call = ModuleCall::new(TRANSFORM_MODULE)
        .flags("od")
        .param("input", "-")
        .param("separator", "space");
    transform(session, &call, extent)
}

/// Reproject `extent` between two projection descriptors.
pub fn reproject_extent(
    session: &Session,
    extent: &Extent,
    from: &ProjectionDescriptor,
    to: &ProjectionDescriptor,
) -> ExportResult<Extent> {
    let call = ModuleCall::new(TRANSFORM_MODULE)
        .param("input", "-")
        .param("separator", "space")
        .param("proj_in", from)
        .param("proj_out", to);
    transform(session, &call, extent)
}

/// Reproject a region's bounds, keeping its rows and columns.
pub fn reproject_region(
    session: &Session,
    region: &Region,
    from: &ProjectionDescriptor,
    to: &ProjectionDescriptor,
) -> ExportResult<Region> {
    let extent = reproject_extent(session, &region.extent(), from, to)?;
    Ok(region.with_extent(&extent))
}

/// Geographic extent of a raster's own footprint.
pub fn geographic_extent_of_map(session: &Session, raster: &str) -> ExportResult<Extent> {
    let info = session.read(&ModuleCall::new("r.info").flags("g").param("map", raster))?;
    let extent = Extent::from_key_values(&parse_key_values(&info, "=", None)?)?;
    to_geographic(session, &extent)
}

/// Geographic extent of the current computational region.
pub fn geographic_extent_of_region(session: &Session) -> ExportResult<Extent> {
    let region = current_region(session)?;
    to_geographic(session, &region.extent())
}

/// The current workspace's computational region.
pub fn current_region(session: &Session) -> ExportResult<Region> {
    let output = session.read(&ModuleCall::new("g.region").flags("g"))?;
    Ok(Region::from_key_values(&parse_key_values(&output, "=", None)?)?)
}

/// Install `region` as the current workspace's computational region.
pub fn set_region(session: &Session, region: &Region) -> ExportResult<()> {
    debug!(
        north = %region.north,
        south = %region.south,
        east = %region.east,
        west = %region.west,
        "Setting region"
    );
    session.run(&ModuleCall::new("g.region").params(region.to_params()))?;
    Ok(())
}

/// The current workspace's projection definition.
pub fn projection_descriptor(session: &Session) -> ExportResult<ProjectionDescriptor> {
    let output = session.read(&ModuleCall::new("g.proj").flags("jf"))?;
    let definition = output.trim();
    if definition.is_empty() {
        return Err(GeoError::parse("projection output", "g.proj printed nothing").into());
    }
    Ok(ProjectionDescriptor::new(definition))
}

fn transform(session: &Session, call: &ModuleCall, extent: &Extent) -> ExportResult<Extent> {
    let mut input = extent.to_file_content();
    input.push('\n');
    let output = session.pipe(call, &input)?;
    Ok(parse_transform_output(&output)?)
}

fn parse_transform_output(output: &str) -> GeoResult<Extent> {
    let mut lines = output.lines().map(str::trim).filter(|l| !l.is_empty());
    let (east, north) = transformed_point(lines.next())?;
    let (west, south) = transformed_point(lines.next())?;
    Ok(Extent::new(east, north, west, south))
}

fn transformed_point(line: Option<&str>) -> GeoResult<(&str, &str)> {
    let line =
        line.ok_or_else(|| GeoError::parse("transform output", "expected two coordinate lines"))?;
    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.as_slice() {
        [x, y, _] => Ok((*x, *y)),
        _ => Err(GeoError::parse(
            "transform output",
            format!("expected 'x y z', got '{}'", line),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use std::sync::Arc;
    use test_utils::{FakeEngine, SourceFixture};

    fn session_with(engine: FakeEngine) -> (SourceFixture, Arc<FakeEngine>, Session) {
        let fixture = SourceFixture::new();
        let engine = Arc::new(engine);
        let session = Session::new(engine.clone(), fixture.context());
        (fixture, engine, session)
    }

    #[test]
    fn test_parse_transform_output_drops_third_column() {
        let extent = parse_transform_output("15.5 50.1 0.0\n12.0 48.5 0.0\n").unwrap();
        assert_eq!(extent, Extent::new("15.5", "50.1", "12.0", "48.5"));
    }

    #[test]
    fn test_parse_transform_output_requires_two_lines() {
        assert!(parse_transform_output("15.5 50.1 0.0\n").is_err());
        assert!(parse_transform_output("15.5 50.1\n12.0 48.5\n").is_err());
    }

    #[test]
    fn test_to_geographic_preserves_corner_order() {
        let (_fixture, engine, session) =
            session_with(FakeEngine::new().with_geographic_transform(|x, y| (-x, y)));

        let extent = to_geographic(&session, &Extent::new("10", "20", "0", "10")).unwrap();

        assert_eq!(extent, Extent::new("-10", "20", "0", "10"));
        let call = engine.calls_to("m.proj").pop().unwrap();
        assert_eq!(call.input.as_deref(), Some("10 20\n0 10\n"));
        assert!(call.flags.contains('o'));
    }

    #[test]
    fn test_to_geographic_failure_carries_stderr() {
        let (_fixture, _engine, session) = session_with(FakeEngine::new().failing_on("m.proj"));

        let err = to_geographic(&session, &Extent::new("10", "20", "0", "10")).unwrap_err();

        match err {
            ExportError::ExternalCommand(inner) => {
                assert!(inner.to_string().contains("m.proj failed"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_reproject_region_passes_descriptors_and_keeps_grid() {
        let (_fixture, engine, session) =
            session_with(FakeEngine::new().with_region_transform(|x, y| (x / 2.0, y / 2.0)));
        let region = current_region(&session).unwrap();

        let reprojected = reproject_region(
            &session,
            &region,
            &ProjectionDescriptor::new("+proj=utm +zone=33"),
            &ProjectionDescriptor::new("+proj=merc"),
        )
        .unwrap();

        assert_eq!(reprojected.rows, region.rows);
        assert_eq!(reprojected.cols, region.cols);
        assert!(reprojected.nsres.is_none());
        let call = engine.calls_to("m.proj").pop().unwrap();
        assert_eq!(call.param("proj_in"), Some("+proj=utm +zone=33"));
        assert_eq!(call.param("proj_out"), Some("+proj=merc"));
    }

    #[test]
    fn test_geographic_extent_of_map_reads_raster_info() {
        let (_fixture, engine, session) = session_with(FakeEngine::new());

        let extent = geographic_extent_of_map(&session, "elevation").unwrap();

        let info = engine.calls_to("r.info").pop().unwrap();
        assert_eq!(info.param("map"), Some("elevation"));
        let footprint = FakeEngine::default_raster_footprint();
        assert_eq!(
            extent,
            FakeEngine::default_geographic(&footprint.extent())
        );
    }

    #[test]
    fn test_projection_descriptor_is_trimmed() {
        let (fixture, _engine, session) = session_with(FakeEngine::new());
        let descriptor = projection_descriptor(&session).unwrap();
        assert_eq!(descriptor.as_str(), fixture.projection());
    }
}
