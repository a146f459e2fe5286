//! In-process stand-in for the spatial engine.
//!
//! [`FakeEngine`] answers the handful of modules the exporter uses, keeps
//! regions and imported rasters per location in memory, and creates the
//! same directories on disk the real engine would, so that teardown can be
//! exercised against a real filesystem. Every call is recorded together
//! with the process context it ran in.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use geo_common::{parse_key_values, EpsgCode, Extent, Region};
use spatial_engine::{
    CommandOutput, Engine, EngineError, EngineResult, ModuleCall, NewLocation, ProcessContext,
    WorkspaceRef,
};

use crate::fixtures::{DEFAULT_REGION, RASTER_FOOTPRINT, SOURCE_PROJECTION, SOURCE_REGION};

/// Module name recorded for [`Engine::create_location`] calls; also accepted
/// by [`FakeEngine::failing_on`].
pub const CREATE_LOCATION: &str = "create_location";

/// Name of the file [`FakeEngine::leaking_on`] leaves in the location.
pub const STRAY_FILE: &str = "stray.tmp";

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

type Transform = Box<dyn Fn(f64, f64) -> (f64, f64) + Send + Sync>;

/// A module invocation as seen by the engine.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub module: String,
    pub flags: String,
    pub params: Vec<(String, String)>,
    pub input: Option<String>,
    pub context: ProcessContext,
    /// Workspace named by the context file, if it could be read.
    pub workspace: Option<WorkspaceRef>,
}

impl RecordedCall {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct FakeState {
    calls: Vec<RecordedCall>,
    regions: HashMap<PathBuf, Region>,
    created: HashMap<PathBuf, EpsgCode>,
    imported: HashMap<(PathBuf, String), Region>,
}

pub struct FakeEngine {
    geographic: Transform,
    region_transform: Transform,
    failing: Vec<String>,
    leaking: Vec<String>,
    panicking: Vec<String>,
    state: Mutex<FakeState>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeEngine {
    /// Geographic transform divides by 10 000; projected-to-projected
    /// transforms are the identity.
    pub fn new() -> Self {
        Self {
            geographic: Box::new(default_geographic_point),
            region_transform: Box::new(|x, y| (x, y)),
            failing: Vec::new(),
            leaking: Vec::new(),
            panicking: Vec::new(),
            state: Mutex::new(FakeState::default()),
        }
    }

    /// Transform applied by `m.proj -o` (to longitude/latitude).
    pub fn with_geographic_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64) + Send + Sync + 'static,
    {
        self.geographic = Box::new(transform);
        self
    }

    /// Transform applied by `m.proj proj_in=.. proj_out=..` and to raster
    /// footprints imported with `r.proj`.
    pub fn with_region_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(f64, f64) -> (f64, f64) + Send + Sync + 'static,
    {
        self.region_transform = Box::new(transform);
        self
    }

    /// Make `module` exit with status 1.
    pub fn failing_on(mut self, module: &str) -> Self {
        self.failing.push(module.to_string());
        self
    }

    /// After `module` succeeds, leave [`STRAY_FILE`] in the current location.
    pub fn leaking_on(mut self, module: &str) -> Self {
        self.leaking.push(module.to_string());
        self
    }

    /// Panic inside `module`, to exercise unwinding through an export.
    pub fn panicking_on(mut self, module: &str) -> Self {
        self.panicking.push(module.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn calls_to(&self, module: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.module == module)
            .collect()
    }

    pub fn modules(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.module).collect()
    }

    pub fn default_raster_footprint() -> Region {
        parse_region(RASTER_FOOTPRINT)
    }

    pub fn default_source_region() -> Region {
        parse_region(SOURCE_REGION)
    }

    /// `extent` as the default geographic transform would report it.
    pub fn default_geographic(extent: &Extent) -> Extent {
        let corner = |x: &str, y: &str| {
            default_geographic_point(x.parse().unwrap(), y.parse().unwrap())
        };
        let (east, north) = corner(&extent.east, &extent.north);
        let (west, south) = corner(&extent.west, &extent.south);
        Extent::new(coord(east), coord(north), coord(west), coord(south))
    }

    fn g_region(&self, workspace: &WorkspaceRef, call: &ModuleCall) -> CommandOutput {
        let location = workspace.location_path();
        let mut state = self.state.lock().unwrap();

        if call.has_flag('g') {
            let region = state.regions.get(&location).cloned().unwrap_or_else(|| {
                if state.created.contains_key(&location) {
                    parse_region(DEFAULT_REGION)
                } else {
                    parse_region(SOURCE_REGION)
                }
            });
            return CommandOutput::success(region_output(&region, "\n"));
        }

        let values = call
            .param_pairs()
            .iter()
            .cloned()
            .collect::<geo_common::KeyValues>();
        match Region::from_key_values(&values) {
            Ok(region) => {
                state.regions.insert(location, region);
                CommandOutput::success("")
            }
            Err(err) => CommandOutput::failure(1, format!("ERROR: {}", err)),
        }
    }

    fn g_proj(&self, workspace: &WorkspaceRef) -> CommandOutput {
        let state = self.state.lock().unwrap();
        match state.created.get(&workspace.location_path()) {
            Some(epsg) => CommandOutput::success(format!("+init=epsg:{} +type=crs\n", epsg)),
            None => CommandOutput::success(format!("{}\n", SOURCE_PROJECTION)),
        }
    }

    fn m_proj(&self, call: &ModuleCall, stdin: Option<&str>) -> CommandOutput {
        let transform: &Transform = if call.has_flag('o') {
            &self.geographic
        } else if call.get("proj_in").is_some() && call.get("proj_out").is_some() {
            &self.region_transform
        } else {
            return CommandOutput::failure(1, "ERROR: no target projection");
        };
        let Some(input) = stdin else {
            return CommandOutput::failure(1, "ERROR: no input coordinates");
        };

        let mut output = String::new();
        for line in input.lines().filter(|l| !l.trim().is_empty()) {
            let numbers: Vec<f64> = line
                .split_whitespace()
                .filter_map(|t| t.parse().ok())
                .collect();
            let [x, y] = numbers.as_slice() else {
                return CommandOutput::failure(1, format!("ERROR: invalid coordinates '{}'", line));
            };
            let (x, y) = transform(*x, *y);
            output.push_str(&format!("{} {} 0\n", coord(x), coord(y)));
        }
        CommandOutput::success(output)
    }

    fn r_proj(&self, workspace: &WorkspaceRef, call: &ModuleCall) -> CommandOutput {
        let source = WorkspaceRef::new(
            call.get("dbase").unwrap_or_default(),
            call.get("location").unwrap_or_default(),
            call.get("mapset").unwrap_or_default(),
        );
        if !source.exists() {
            return CommandOutput::failure(1, format!("ERROR: Mapset <{}> not found", source));
        }
        let (Some(input), Some(output)) = (call.get("input"), call.get("output")) else {
            return CommandOutput::failure(1, "ERROR: input and output are required");
        };

        let footprint = self.reprojected_footprint();
        if call.has_flag('g') {
            return CommandOutput::success(region_output(&footprint, " "));
        }

        let cell = workspace.mapset_path().join("cell");
        if let Err(err) = fs::create_dir_all(&cell).and_then(|_| fs::write(cell.join(output), input)) {
            return CommandOutput::failure(1, format!("ERROR: {}", err));
        }
        self.state
            .lock()
            .unwrap()
            .imported
            .insert((workspace.location_path(), output.to_string()), footprint);
        CommandOutput::success("")
    }

    fn r_info(&self, workspace: &WorkspaceRef, call: &ModuleCall) -> CommandOutput {
        let map = call.get("map").unwrap_or_default();
        match self.raster(workspace, map) {
            Some(region) => CommandOutput::success(format!(
                "north={}\nsouth={}\neast={}\nwest={}\nrows={}\ncols={}\ndatatype=DCELL\n",
                region.north,
                region.south,
                region.east,
                region.west,
                region.rows.as_deref().unwrap_or(""),
                region.cols.as_deref().unwrap_or("")
            )),
            None => CommandOutput::failure(1, format!("ERROR: Raster map <{}> not found", map)),
        }
    }

    fn r_out_png(&self, workspace: &WorkspaceRef, call: &ModuleCall) -> CommandOutput {
        let input = call.get("input").unwrap_or_default();
        if self.raster(workspace, input).is_none() {
            return CommandOutput::failure(1, format!("ERROR: Raster map <{}> not found", input));
        }
        let Some(output) = call.get("output") else {
            return CommandOutput::failure(1, "ERROR: output is required");
        };
        match fs::write(output, PNG_MAGIC) {
            Ok(()) => CommandOutput::success(""),
            Err(err) => CommandOutput::failure(1, format!("ERROR: cannot write {}: {}", output, err)),
        }
    }

    /// Footprint of a raster visible from `workspace`: imported rasters in
    /// created locations, any raster in a source location.
    fn raster(&self, workspace: &WorkspaceRef, name: &str) -> Option<Region> {
        let location = workspace.location_path();
        let state = self.state.lock().unwrap();
        if state.created.contains_key(&location) {
            state.imported.get(&(location, name.to_string())).cloned()
        } else {
            Some(parse_region(RASTER_FOOTPRINT))
        }
    }

    fn reprojected_footprint(&self) -> Region {
        let footprint = parse_region(RASTER_FOOTPRINT);
        let corner = |x: &str, y: &str| {
            (self.region_transform)(x.parse().unwrap_or(0.0), y.parse().unwrap_or(0.0))
        };
        let (east, north) = corner(&footprint.east, &footprint.north);
        let (west, south) = corner(&footprint.west, &footprint.south);
        footprint.with_extent(&Extent::new(
            coord(east),
            coord(north),
            coord(west),
            coord(south),
        ))
    }

    fn record(&self, call: RecordedCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl Engine for FakeEngine {
    fn execute(
        &self,
        context: &ProcessContext,
        call: &ModuleCall,
        stdin: Option<&str>,
    ) -> EngineResult<CommandOutput> {
        let workspace = context.workspace().ok();
        self.record(RecordedCall {
            module: call.module().to_string(),
            flags: call.flag_letters().to_string(),
            params: call.param_pairs().to_vec(),
            input: stdin.map(str::to_string),
            context: context.clone(),
            workspace: workspace.clone(),
        });

        if self.panicking.iter().any(|m| m == call.module()) {
            panic!("{} panicked", call.module());
        }
        if self.failing.iter().any(|m| m == call.module()) {
            return Ok(CommandOutput::failure(
                1,
                format!("ERROR: {} failed", call.module()),
            ));
        }
        let Some(workspace) = workspace else {
            return Ok(CommandOutput::failure(1, "ERROR: GISRC is not set or unreadable"));
        };
        if !workspace.exists() {
            return Ok(CommandOutput::failure(
                1,
                format!("ERROR: Mapset <{}> not found", workspace),
            ));
        }

        let output = match call.module() {
            "g.region" => self.g_region(&workspace, call),
            "g.proj" => self.g_proj(&workspace),
            "m.proj" => self.m_proj(call, stdin),
            "r.proj" => self.r_proj(&workspace, call),
            "r.info" => self.r_info(&workspace, call),
            "r.out.png" => self.r_out_png(&workspace, call),
            other => CommandOutput::failure(1, format!("ERROR: Module {} not found", other)),
        };

        if output.is_success() && self.leaking.iter().any(|m| m == call.module()) {
            fs::write(workspace.location_path().join(STRAY_FILE), b"leak")?;
        }
        Ok(output)
    }

    fn create_location(&self, request: &NewLocation) -> EngineResult<()> {
        let path = request.path();
        self.record(RecordedCall {
            module: CREATE_LOCATION.to_string(),
            flags: String::new(),
            params: vec![
                ("location".to_string(), path.display().to_string()),
                ("epsg".to_string(), request.epsg.to_string()),
            ],
            input: None,
            context: ProcessContext::default(),
            workspace: None,
        });

        if self.failing.iter().any(|m| m == CREATE_LOCATION) || path.exists() {
            return Err(EngineError::CommandFailed {
                module: "grass".to_string(),
                status: 1,
                stderr: format!("ERROR: cannot create location <{}>", path.display()),
            });
        }

        let mapset = request.permanent_mapset().mapset_path();
        fs::create_dir_all(&mapset)?;
        fs::write(mapset.join("PROJ_EPSG"), format!("epsg: {}\n", request.epsg))?;
        self.state
            .lock()
            .unwrap()
            .created
            .insert(path, request.epsg);
        Ok(())
    }
}

fn default_geographic_point(x: f64, y: f64) -> (f64, f64) {
    (x / 10_000.0, y / 10_000.0)
}

/// Shortest decimal form, without a negative zero.
fn coord(value: f64) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{}", value)
}

fn parse_region(text: &str) -> Region {
    let values = parse_key_values(text, "=", None).expect("fixture region is well formed");
    Region::from_key_values(&values).expect("fixture region is complete")
}

fn region_output(region: &Region, separator: &str) -> String {
    let mut fields = vec![
        format!("n={}", region.north),
        format!("s={}", region.south),
        format!("w={}", region.west),
        format!("e={}", region.east),
    ];
    let optional = [
        ("nsres", &region.nsres),
        ("ewres", &region.ewres),
        ("rows", &region.rows),
        ("cols", &region.cols),
    ];
    for (key, value) in optional {
        if let Some(value) = value {
            fields.push(format!("{}={}", key, value));
        }
    }
    let mut output = fields.join(separator);
    output.push('\n');
    output
}
