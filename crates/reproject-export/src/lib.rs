//! Reprojected image export.
//!
//! Renders a raster stored in one projection as an image in another. The
//! raster is imported into a disposable workspace created for the target
//! projection; all engine calls are redirected there for the duration of the
//! export, and the previous context is restored and the workspace removed
//! before the export returns, whether it succeeded or not.
//!
//! # Architecture
//!
//! - [`reprojector`]: extent and region reprojection, geographic extents of
//!   regions and rasters
//! - [`workspace`]: the disposable workspace and its teardown
//! - [`exporter`]: the export lifecycle

pub mod error;
pub mod exporter;
pub mod reprojector;
pub mod workspace;

// Re-exports
pub use error::{ExportError, ExportResult};
pub use exporter::{ExportReport, ExportRequest, ImageExporter};
pub use reprojector::{
    current_region, geographic_extent_of_map, geographic_extent_of_region,
    projection_descriptor, reproject_extent, reproject_region, set_region, to_geographic,
};
pub use workspace::DisposableWorkspace;
