//! Computational region of a workspace.

use serde::{Deserialize, Serialize};

use crate::error::GeoResult;
use crate::extent::{edge, Extent};
use crate::keyval::KeyValues;

/// Bounds and resolution the engine computes on.
///
/// Values are kept as text, like [`Extent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub north: String,
    pub south: String,
    pub east: String,
    pub west: String,
    pub nsres: Option<String>,
    pub ewres: Option<String>,
    pub rows: Option<String>,
    pub cols: Option<String>,
}

impl Region {
    /// Region covering `extent` with no resolution information.
    pub fn from_extent(extent: &Extent) -> Self {
        Self {
            north: extent.north.clone(),
            south: extent.south.clone(),
            east: extent.east.clone(),
            west: extent.west.clone(),
            nsres: None,
            ewres: None,
            rows: None,
            cols: None,
        }
    }

    /// Parse `g.region -g`, `r.info -g` or `r.proj -g` style output.
    pub fn from_key_values(values: &KeyValues) -> GeoResult<Self> {
        Ok(Self {
            north: edge(values, "north", "n")?,
            south: edge(values, "south", "s")?,
            east: edge(values, "east", "e")?,
            west: edge(values, "west", "w")?,
            nsres: values.get("nsres").cloned(),
            ewres: values.get("ewres").cloned(),
            rows: values.get("rows").cloned(),
            cols: values.get("cols").cloned(),
        })
    }

    pub fn extent(&self) -> Extent {
        Extent::new(&self.east, &self.north, &self.west, &self.south)
    }

    /// The same grid moved to new bounds.
    ///
    /// Rows and columns are kept. Resolutions are dropped because they are
    /// expressed in the units of the old bounds.
    pub fn with_extent(&self, extent: &Extent) -> Self {
        Self {
            north: extent.north.clone(),
            south: extent.south.clone(),
            east: extent.east.clone(),
            west: extent.west.clone(),
            nsres: None,
            ewres: None,
            rows: self.rows.clone(),
            cols: self.cols.clone(),
        }
    }

    /// Parameters that install this region with `g.region`.
    ///
    /// Rows and columns win over resolutions when both are known.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("n", self.north.clone()),
            ("s", self.south.clone()),
            ("e", self.east.clone()),
            ("w", self.west.clone()),
        ];
        match (&self.rows, &self.cols) {
            (Some(rows), Some(cols)) => {
                params.push(("rows", rows.clone()));
                params.push(("cols", cols.clone()));
            }
            _ => {
                if let Some(nsres) = &self.nsres {
                    params.push(("nsres", nsres.clone()));
                }
                if let Some(ewres) = &self.ewres {
                    params.push(("ewres", ewres.clone()));
                }
            }
        }
        params
    }
}
