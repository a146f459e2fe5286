//! Export lifecycle: switch into a disposable workspace, import, render,
//! switch back, tear down.

use std::path::PathBuf;

use geo_common::{parse_key_values, EpsgCode, Extent, ProjectionDescriptor, Region};
use serde::Serialize;
use spatial_engine::{ExportSlot, ModuleCall, ProcessContext, Session, WorkspaceRef};
use tracing::{debug, error, info};

use crate::error::{ExportError, ExportResult};
use crate::reprojector::{
    current_region, geographic_extent_of_map, geographic_extent_of_region,
    projection_descriptor, reproject_region, set_region,
};
use crate::workspace::DisposableWorkspace;

const RENDER_MODULE: &str = "r.out.png";
const IMPORT_MODULE: &str = "r.proj";

/// What to export and where.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Workspace holding the raster.
    pub source: WorkspaceRef,
    pub raster: String,
    pub output: PathBuf,
    pub target_epsg: EpsgCode,
    /// Passed through to the render module as its flags.
    pub render_flags: String,
    pub compression: u8,
    /// Where to write the two-line WGS84 extent file, if anywhere.
    pub geographic_sidecar: Option<PathBuf>,
    /// Compute the WGS84 extent even without a sidecar file.
    pub report_geographic_extent: bool,
    /// Render the source computational region rather than the whole raster.
    pub use_computation_region: bool,
}

impl ExportRequest {
    pub fn new(
        source: WorkspaceRef,
        raster: impl Into<String>,
        output: impl Into<PathBuf>,
        target_epsg: EpsgCode,
    ) -> Self {
        Self {
            source,
            raster: raster.into(),
            output: output.into(),
            target_epsg,
            render_flags: String::new(),
            compression: 6,
            geographic_sidecar: None,
            report_geographic_extent: false,
            use_computation_region: true,
        }
    }

    pub fn with_render_flags(mut self, flags: impl Into<String>) -> Self {
        self.render_flags = flags.into();
        self
    }

    pub fn with_compression(mut self, compression: u8) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_geographic_sidecar(mut self, path: impl Into<PathBuf>) -> Self {
        self.geographic_sidecar = Some(path.into());
        self
    }

    pub fn with_geographic_extent(mut self) -> Self {
        self.report_geographic_extent = true;
        self
    }

    /// Import and render the raster's full reprojected extent.
    pub fn with_map_extent(mut self) -> Self {
        self.use_computation_region = false;
        self
    }

    fn wants_geographic_extent(&self) -> bool {
        self.geographic_sidecar.is_some() || self.report_geographic_extent
    }
}

/// Result of a successful export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub output: PathBuf,
    /// Region the image was rendered in, in the target projection.
    pub target_region: Region,
    pub geographic_extent: Option<Extent>,
    pub sidecar: Option<PathBuf>,
}

/// Runs exports through a [`Session`].
pub struct ImageExporter<'a> {
    session: &'a Session,
    temp_dir: PathBuf,
}

impl<'a> ImageExporter<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Directory in which disposable workspaces are created.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Export `request.raster` as an image in `request.target_epsg`.
    ///
    /// The session's process context is the same after this returns as
    /// before, and the disposable workspace has been removed, whether the
    /// export succeeded or not. A failure inside the workspace is returned
    /// as is unless teardown also fails, in which case the teardown error
    /// is returned and the first failure is logged.
    pub fn export(&self, request: &ExportRequest) -> ExportResult<ExportReport> {
        let slot = self
            .session
            .acquire_export_slot()
            .ok_or(ExportError::ExportInProgress)?;

        if !request.source.exists() {
            return Err(ExportError::WorkspaceNotFound(request.source.to_string()));
        }

        info!(
            raster = %request.raster,
            source = %request.source,
            epsg = %request.target_epsg,
            output = %request.output.display(),
            use_region = request.use_computation_region,
            "Starting reprojected export"
        );

        // The source region is unreachable once the context is switched.
        let source_view = if request.use_computation_region {
            Some((
                current_region(self.session)?,
                projection_descriptor(self.session)?,
            ))
        } else {
            None
        };

        let workspace = DisposableWorkspace::allocate(&self.temp_dir, request.target_epsg)?;
        let scope = ExportScope::enter(self.session, slot, workspace, request.source.clone());

        let outcome = self.export_in_scope(&scope, request, source_view.as_ref());
        if let Err(err) = &outcome {
            error!(error = %err, raster = %request.raster, "Export failed, tearing down workspace");
        }

        match (outcome, scope.close()) {
            (Ok(report), Ok(())) => {
                info!(output = %report.output.display(), "Export complete");
                Ok(report)
            }
            (Err(err), Ok(())) => Err(err),
            (_, Err(teardown)) => Err(teardown),
        }
    }

    fn export_in_scope(
        &self,
        scope: &ExportScope<'_>,
        request: &ExportRequest,
        source_view: Option<&(Region, ProjectionDescriptor)>,
    ) -> ExportResult<ExportReport> {
        let session = self.session;

        session.create_location(&scope.workspace.new_location())?;
        scope.switch_context();

        let target_region = match source_view {
            Some((source_region, source_projection)) => {
                // Read back: the stored definition may differ from the code.
                let target_projection = projection_descriptor(session)?;
                reproject_region(session, source_region, source_projection, &target_projection)?
            }
            None => discover_import_region(session, &request.source, &request.raster)?,
        };
        set_region(session, &target_region)?;

        import_raster(session, &request.source, &request.raster)?;
        render(session, request)?;

        let geographic_extent = if request.wants_geographic_extent() {
            info!("Projecting image bounds to WGS84");
            // The image covers the whole region, which can exceed the raster.
            let extent = if request.use_computation_region {
                geographic_extent_of_region(session)?
            } else {
                geographic_extent_of_map(session, &request.raster)?
            };
            if let Some(path) = &request.geographic_sidecar {
                extent.write_to_file(path)?;
                debug!(path = %path.display(), "Wrote geographic extent");
            }
            Some(extent)
        } else {
            None
        };

        Ok(ExportReport {
            output: request.output.clone(),
            target_region,
            geographic_extent,
            sidecar: request.geographic_sidecar.clone(),
        })
    }
}

fn source_params(source: &WorkspaceRef, raster: &str) -> ModuleCall {
    ModuleCall::new(IMPORT_MODULE)
        .param("input", raster)
        .param("dbase", source.database.display())
        .param("location", &source.location)
        .param("mapset", &source.mapset)
        .param("output", raster)
}

/// Ask the import module for the region covering the whole reprojected
/// raster without importing anything.
fn discover_import_region(
    session: &Session,
    source: &WorkspaceRef,
    raster: &str,
) -> ExportResult<Region> {
    let output = session.read(&source_params(source, raster).flags("g"))?;
    Ok(Region::from_key_values(&parse_key_values(&output, "=", Some(" "))?)?)
}

fn import_raster(session: &Session, source: &WorkspaceRef, raster: &str) -> ExportResult<()> {
    debug!(raster = %raster, source = %source, "Importing raster");
    session.run(&source_params(source, raster))?;
    Ok(())
}

fn render(session: &Session, request: &ExportRequest) -> ExportResult<()> {
    debug!(output = %request.output.display(), "Rendering image");
    session.run(
        &ModuleCall::new(RENDER_MODULE)
            .flags(&request.render_flags)
            .param("input", &request.raster)
            .param("output", request.output.display())
            .param("compression", request.compression),
    )?;
    Ok(())
}

/// Holds the session switched away from its previous context.
///
/// [`ExportScope::close`] restores the context and tears the workspace
/// down. If the scope is dropped without being closed, the drop handler
/// does the same and logs a teardown failure, since it cannot return it.
struct ExportScope<'a> {
    session: &'a Session,
    _slot: ExportSlot<'a>,
    workspace: DisposableWorkspace,
    source: WorkspaceRef,
    previous_context: ProcessContext,
    closed: bool,
}

impl<'a> ExportScope<'a> {
    fn enter(
        session: &'a Session,
        slot: ExportSlot<'a>,
        workspace: DisposableWorkspace,
        source: WorkspaceRef,
    ) -> Self {
        let previous_context = session.context();
        if let Some(region) = session.take_region_override() {
            debug!(region = %region, "Suspending region override");
        }
        Self {
            session,
            _slot: slot,
            workspace,
            source,
            previous_context,
            closed: false,
        }
    }

    fn switch_context(&self) {
        self.session.replace_context(self.workspace.context());
        self.session
            .set_current_workspace(self.workspace.workspace().clone());
    }

    fn restore(&self) {
        self.session.replace_context(self.previous_context.clone());
        self.session.set_current_workspace(self.source.clone());
    }

    fn close(mut self) -> ExportResult<()> {
        self.closed = true;
        self.restore();
        self.workspace.teardown()
    }
}

impl Drop for ExportScope<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.restore();
        if let Err(err) = self.workspace.teardown() {
            error!(error = %err, "Teardown failed while unwinding export");
        }
    }
}
