//! Vector primitives used by the aggregation stage
//!
//! - Bounding box: axis-aligned envelope
//! - Point-in-polygon: boundary-inclusive containment test

mod spatial;

pub use spatial::{bounding_box, collection_bounds, contains_point, is_areal, BoundingBox};
