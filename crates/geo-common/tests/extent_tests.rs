//! Tests for the extent sidecar file and overlay formats.

use geo_common::{Extent, GeoError};

// ============================================================================
// Overlay bounds
// ============================================================================

#[test]
fn test_overlay_bounds_corner_order() {
    let extent = Extent::new("1", "2", "3", "4");
    assert_eq!(extent.to_overlay_bounds(), "[[4, 1], [2, 3]]");
}

#[test]
fn test_overlay_bounds_geographic() {
    let extent = Extent::new("15.5", "50.1", "12.0", "48.5");
    assert_eq!(extent.to_overlay_bounds(), "[[48.5, 15.5], [50.1, 12.0]]");
}

// ============================================================================
// Sidecar file round trip
// ============================================================================

fn round_trip(extent: &Extent) -> Extent {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wgs84.txt");
    extent.write_to_file(&path).unwrap();
    Extent::read_from_file(&path).unwrap()
}

#[test]
fn test_round_trip_plain_numbers() {
    let extent = Extent::new("10", "20", "0", "10");
    assert_eq!(round_trip(&extent), extent);
}

#[test]
fn test_round_trip_keeps_precision_text() {
    let extent = Extent::new(
        "-78.60891842",
        "35.74294537",
        "-78.77846213",
        "35.69100000",
    );
    assert_eq!(round_trip(&extent), extent);
}

#[test]
fn test_round_trip_scientific_and_negative_zero() {
    let extent = Extent::new("1e-7", "-0", "-1.5E+2", "0.000");
    assert_eq!(round_trip(&extent), extent);
}

#[test]
fn test_written_file_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wgs84.txt");
    Extent::new("15.5", "50.1", "12.0", "48.5")
        .write_to_file(&path)
        .unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content, "15.5 50.1\n12.0 48.5\n");
}

// ============================================================================
// Malformed files
// ============================================================================

#[test]
fn test_read_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Extent::read_from_file(&dir.path().join("absent.txt"));
    assert!(matches!(result, Err(GeoError::Io(_))));
}

#[test]
fn test_read_empty_file() {
    let result = Extent::parse_file_content("");
    assert!(matches!(result, Err(GeoError::Parse { .. })));
}

#[test]
fn test_read_tab_separated_line() {
    let result = Extent::parse_file_content("15.5\t50.1\n12.0 48.5\n");
    assert!(matches!(result, Err(GeoError::Parse { .. })));
}

#[test]
fn test_read_double_space() {
    let result = Extent::parse_file_content("15.5  50.1\n12.0 48.5\n");
    assert!(matches!(result, Err(GeoError::Parse { .. })));
}

#[test]
fn test_read_windows_line_endings() {
    let extent = Extent::parse_file_content("15.5 50.1\r\n12.0 48.5\r\n").unwrap();
    assert_eq!(extent, Extent::new("15.5", "50.1", "12.0", "48.5"));
}
