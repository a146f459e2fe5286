//! Extent type and its two text renderings.
//!
//! Coordinates are kept as the text the engine produced. Nothing here parses
//! them into floats, so the precision of the source is carried through to the
//! overlay string and the sidecar file unchanged.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};
use crate::keyval::KeyValues;

/// A bounding box given by its east, north, west and south edges.
///
/// The frame is whatever the producer used: projected units for a region
/// read from a workspace, degrees for the output of the geographic
/// reprojector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub east: String,
    pub north: String,
    pub west: String,
    pub south: String,
}

impl Extent {
    pub fn new(
        east: impl Into<String>,
        north: impl Into<String>,
        west: impl Into<String>,
        south: impl Into<String>,
    ) -> Self {
        Self {
            east: east.into(),
            north: north.into(),
            west: west.into(),
            south: south.into(),
        }
    }

    /// Bounds literal for a web map overlay: `[[south, east], [north, west]]`.
    pub fn to_overlay_bounds(&self) -> String {
        format!(
            "[[{}, {}], [{}, {}]]",
            self.south, self.east, self.north, self.west
        )
    }

    /// Two-line sidecar content, `east north` then `west south`.
    pub fn to_file_content(&self) -> String {
        format!("{} {}\n{} {}", self.east, self.north, self.west, self.south)
    }

    /// Write the sidecar file, terminated by a newline.
    pub fn write_to_file(&self, path: &Path) -> GeoResult<()> {
        let mut content = self.to_file_content();
        content.push('\n');
        fs::write(path, content)?;
        Ok(())
    }

    /// Read an extent back from a sidecar file.
    pub fn read_from_file(path: &Path) -> GeoResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse_file_content(&content)
    }

    /// Parse the two-line sidecar format.
    ///
    /// Only the first two lines are read. Each must split on a single space
    /// into exactly two tokens.
    pub fn parse_file_content(content: &str) -> GeoResult<Self> {
        let mut lines = content.lines();
        let (east, north) = split_pair(lines.next())?;
        let (west, south) = split_pair(lines.next())?;
        Ok(Self::new(east, north, west, south))
    }

    /// Build an extent from key/value output, accepting long (`east`) or
    /// short (`e`) keys.
    pub fn from_key_values(values: &KeyValues) -> GeoResult<Self> {
        Ok(Self::new(
            edge(values, "east", "e")?,
            edge(values, "north", "n")?,
            edge(values, "west", "w")?,
            edge(values, "south", "s")?,
        ))
    }
}

fn split_pair(line: Option<&str>) -> GeoResult<(&str, &str)> {
    let line = line
        .ok_or_else(|| GeoError::parse("coordinate file", "expected two lines"))?
        .trim();
    let tokens: Vec<&str> = line.split(' ').collect();
    match tokens.as_slice() {
        [x, y] => Ok((*x, *y)),
        _ => Err(GeoError::parse(
            "coordinate file",
            format!("expected two space separated values, got '{}'", line),
        )),
    }
}

pub(crate) fn edge(values: &KeyValues, long: &str, short: &str) -> GeoResult<String> {
    values
        .get(long)
        .or_else(|| values.get(short))
        .cloned()
        .ok_or_else(|| GeoError::parse("key/value output", format!("missing '{}'", long)))
}
