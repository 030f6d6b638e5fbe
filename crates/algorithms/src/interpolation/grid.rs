//! Regular sampling grid over a bounding box.
//!
//! Longitude is the outer loop: the grid is walked column by column, west
//! to east, and within each column south to north. Coordinates are computed
//! from the step index rather than accumulated, and both upper edges are
//! included when they fall on a step (within `STEP_TOLERANCE` cells).

use nitrogis_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::vector::BoundingBox;

/// Fraction of a cell by which an edge may miss the last step and still be
/// sampled.
const STEP_TOLERANCE: f64 = 1e-9;

/// Parameters for grid construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridParams {
    /// Grid spacing in coordinate units (default: 0.05).
    pub cell_size: f64,
    /// Largest number of grid points a run may allocate (default: 25 million).
    pub max_points: usize,
}

impl Default for GridParams {
    fn default() -> Self {
        Self {
            cell_size: 0.05,
            max_points: 25_000_000,
        }
    }
}

impl GridParams {
    /// Grid over `bbox`, rejected when it would exceed `max_points`.
    pub fn grid(&self, bbox: BoundingBox) -> Result<RegularGrid> {
        let grid = RegularGrid::new(bbox, self.cell_size);
        if grid.len() > self.max_points {
            return Err(Error::invalid_parameter(
                "cell_size",
                self.cell_size,
                format!(
                    "a {} x {} grid exceeds the limit of {} points",
                    grid.columns(),
                    grid.rows(),
                    self.max_points
                ),
            ));
        }
        Ok(grid)
    }
}

/// A regular lattice of sampling locations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegularGrid {
    bbox: BoundingBox,
    cell_size: f64,
    columns: usize,
    rows: usize,
}

impl RegularGrid {
    /// Grid over `bbox` with spacing `cell_size`.
    ///
    /// A non-finite or zero-area box, or a non-positive cell size, gives an
    /// empty grid.
    pub fn new(bbox: BoundingBox, cell_size: f64) -> Self {
        let usable = bbox.has_area() && cell_size.is_finite() && cell_size > 0.0;
        let (columns, rows) = if usable {
            (
                steps(bbox.width(), cell_size),
                steps(bbox.height(), cell_size),
            )
        } else {
            (0, 0)
        };
        Self {
            bbox,
            cell_size,
            columns,
            rows,
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of distinct longitudes
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of distinct latitudes
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.columns.saturating_mul(self.rows)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Coordinates of the point at `col`, `row`
    #[inline]
    pub fn coord(&self, col: usize, row: usize) -> (f64, f64) {
        let x = (self.bbox.min_x + col as f64 * self.cell_size).min(self.bbox.max_x);
        let y = (self.bbox.min_y + row as f64 * self.cell_size).min(self.bbox.max_y);
        (x, y)
    }

    pub fn iter(&self) -> GridIter<'_> {
        GridIter {
            grid: self,
            index: 0,
            len: self.len(),
        }
    }
}

fn steps(extent: f64, cell_size: f64) -> usize {
    ((extent / cell_size + STEP_TOLERANCE).floor() as usize).saturating_add(1)
}

/// Iterator over grid coordinates in column-major order.
#[derive(Debug, Clone)]
pub struct GridIter<'a> {
    grid: &'a RegularGrid,
    index: usize,
    len: usize,
}

impl Iterator for GridIter<'_> {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let col = self.index / self.grid.rows;
        let row = self.index % self.grid.rows;
        self.index += 1;
        Some(self.grid.coord(col, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.len - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridIter<'_> {}

impl<'a> IntoIterator for &'a RegularGrid {
    type Item = (f64, f64);
    type IntoIter = GridIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
