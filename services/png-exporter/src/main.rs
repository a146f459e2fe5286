//! Reprojected image exporter.
//!
//! Exports a raster from the current database as a PNG in another
//! projection, optionally writing its WGS84 bounds next to it for web map
//! overlays:
//! - `png-proj export elevation out.png --epsg 3857 --wgs84 out.wgs84`
//! - `png-proj bounds out.wgs84`

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo_common::{EpsgCode, Extent};
use reproject_export::{ExportReport, ExportRequest, ImageExporter};
use spatial_engine::{ProcessEngine, Session};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use config::ExporterConfig;

#[derive(Parser, Debug)]
#[command(name = "png-proj")]
#[command(about = "Export rasters as images in another projection")]
struct Args {
    #[command(subcommand)]
    command: Commands,

    /// YAML configuration file
    #[arg(long, global = true, env = "PNG_PROJ_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, env = "PNG_PROJ_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reproject a raster and render it as a PNG
    Export(ExportArgs),

    /// Print the overlay bounds stored in a WGS84 extent file
    Bounds {
        /// File written by `export --wgs84`
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct ExportArgs {
    /// Raster to export
    input: String,

    /// Output image path
    output: PathBuf,

    /// Target projection as an EPSG code (e.g. 3857 or EPSG:3857)
    #[arg(long)]
    epsg: EpsgCode,

    /// Write the image's WGS84 extent to this file
    #[arg(long)]
    wgs84: Option<PathBuf>,

    /// PNG compression level
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=9))]
    compression: Option<u8>,

    /// Flags passed through to the render module (e.g. "t" for transparent nulls)
    #[arg(long)]
    flags: Option<String>,

    /// Render the raster's whole extent instead of the current region
    #[arg(long)]
    map_extent: bool,

    /// Mapset holding the raster (default: the current one)
    #[arg(long)]
    mapset: Option<String>,

    /// Print the overlay bounds of the exported image
    #[arg(long)]
    leaflet_bounds: bool,

    /// Print the export report as JSON
    #[arg(long)]
    json: bool,

    /// Directory for the disposable workspace
    #[arg(long, env = "PNG_PROJ_TEMP_DIR")]
    temp_dir: Option<PathBuf>,

    /// Launcher used to create the disposable location
    #[arg(long, env = "GRASS_EXECUTABLE")]
    grass_executable: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    match args.command {
        Commands::Export(export) => {
            let config = ExporterConfig::load(args.config.as_deref())?;
            run_export(export, config)
        }
        Commands::Bounds { file } => print_bounds(&file),
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn run_export(args: ExportArgs, config: ExporterConfig) -> Result<()> {
    let mut engine_config = config.engine;
    if let Some(grass) = args.grass_executable {
        engine_config.grass_executable = grass;
    }
    debug!(
        grass = %engine_config.grass_executable.display(),
        quiet = engine_config.quiet,
        "Engine configuration"
    );
    let session = Session::from_env(Arc::new(ProcessEngine::new(engine_config)));

    let source = match &args.mapset {
        Some(mapset) => session.workspace(mapset),
        None => session.current_workspace(),
    }
    .context("Cannot determine the source mapset; is GISRC set?")?;

    let mut request = ExportRequest::new(source, &args.input, &args.output, args.epsg)
        .with_render_flags(args.flags.unwrap_or(config.export.render_flags))
        .with_compression(args.compression.unwrap_or(config.export.compression));
    if let Some(sidecar) = args.wgs84 {
        request = request.with_geographic_sidecar(sidecar);
    }
    if args.leaflet_bounds {
        request = request.with_geographic_extent();
    }
    if args.map_extent {
        request = request.with_map_extent();
    }

    let mut exporter = ImageExporter::new(&session);
    if let Some(temp_dir) = args.temp_dir.or(config.export.temp_dir) {
        exporter = exporter.with_temp_dir(temp_dir);
    }

    let report = exporter
        .export(&request)
        .with_context(|| format!("Failed to export raster <{}>", args.input))?;

    print_report(&report, args.json, args.leaflet_bounds)
}

fn print_report(report: &ExportReport, json: bool, leaflet_bounds: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    if leaflet_bounds {
        if let Some(extent) = &report.geographic_extent {
            println!("{}", extent.to_overlay_bounds());
        }
    }
    info!(output = %report.output.display(), "Image written");
    Ok(())
}

fn print_bounds(file: &Path) -> Result<()> {
    let extent = Extent::read_from_file(file)
        .with_context(|| format!("Failed to read extent file {}", file.display()))?;
    println!("{}", extent.to_overlay_bounds());
    Ok(())
}
