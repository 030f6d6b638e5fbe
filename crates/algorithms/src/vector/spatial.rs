//! Spatial operations: bounding box, point-in-polygon

use geo::{BoundingRect, Coord, Geometry, Intersects};
use nitrogis_core::FeatureCollection;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// From a GeoJSON-ordered `[west, south, east, north]` array
    pub fn from_array([west, south, east, north]: [f64; 4]) -> Self {
        Self::new(west, south, east, north)
    }

    /// As a GeoJSON-ordered `[west, south, east, north]` array
    pub fn to_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite() && self.min_y.is_finite() && self.max_x.is_finite() && self.max_y.is_finite()
    }

    /// Finite with a strictly positive width and height
    pub fn has_area(&self) -> bool {
        self.is_finite() && self.width() > 0.0 && self.height() > 0.0
    }

    /// Inclusive on all four edges
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Smallest box enclosing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Compute the bounding box of a geometry
pub fn bounding_box(geom: &Geometry<f64>) -> Option<BoundingBox> {
    geom.bounding_rect().map(|rect| BoundingBox {
        min_x: rect.min().x,
        min_y: rect.min().y,
        max_x: rect.max().x,
        max_y: rect.max().y,
    })
}

/// Bounding box enclosing every geometry of a collection
pub fn collection_bounds(collection: &FeatureCollection) -> Option<BoundingBox> {
    collection
        .iter()
        .filter_map(|f| f.geometry.as_ref())
        .filter_map(bounding_box)
        .reduce(|acc, bb| acc.union(&bb))
}

/// Whether the geometry encloses an area (and so can contain points)
pub fn is_areal(geom: &Geometry<f64>) -> bool {
    matches!(
        geom,
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_)
    )
}

/// Point-in-polygon test. Points on the boundary count as inside, points
/// inside a hole do not. Non-areal geometries contain nothing.
pub fn contains_point(geom: &Geometry<f64>, x: f64, y: f64) -> bool {
    let c = Coord { x, y };
    match geom {
        Geometry::Polygon(p) => p.intersects(&c),
        Geometry::MultiPolygon(mp) => mp.intersects(&c),
        Geometry::Rect(r) => r.intersects(&c),
        Geometry::Triangle(t) => t.intersects(&c),
        _ => false,
    }
}
