//! Vector data structures
//!
//! - Feature: geometry + JSON properties
//! - FeatureCollection: ordered collection of features
//!
//! Both serialize to and from GeoJSON (see [`geojson`]).

pub mod geojson;

use geo_types::{Geometry, Point};
use serde_json::{Map, Value};

/// Feature attributes, kept as an insertion-ordered JSON object so that
/// properties we do not touch are passed through unchanged.
pub type Properties = Map<String, Value>;

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    pub properties: Properties,
    /// Optional feature ID (GeoJSON allows strings and numbers)
    pub id: Option<Value>,
    /// Why the source geometry could not be read. `geometry` is `None`
    /// whenever this is set.
    pub geometry_error: Option<String>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: Properties::new(),
            id: None,
            geometry_error: None,
        }
    }

    /// Create a feature with no geometry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a point feature at `(x, y)`
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(Geometry::Point(Point::new(x, y)))
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_property(key, value);
        self
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// First usable number among `keys`, in order.
    ///
    /// Numbers and numeric strings are accepted. Zero, non-finite and
    /// non-numeric values fall through to the next key, so an absent value
    /// and a zero both read as `None`.
    pub fn number_property<S: AsRef<str>>(&self, keys: &[S]) -> Option<f64> {
        keys.iter()
            .filter_map(|key| self.properties.get(key.as_ref()))
            .filter_map(as_number)
            .find(|v| v.is_finite() && *v != 0.0)
    }

    /// First non-null, non-empty value among `keys`, in order.
    pub fn label_property<S: AsRef<str>>(&self, keys: &[S]) -> Option<&Value> {
        keys.iter()
            .filter_map(|key| self.properties.get(key.as_ref()))
            .find(|v| match v {
                Value::Null | Value::Bool(false) => false,
                Value::String(s) => !s.is_empty(),
                Value::Number(n) => n.as_f64() != Some(0.0),
                _ => true,
            })
    }

    /// Point coordinates, if the geometry is a point
    pub fn as_point(&self) -> Option<(f64, f64)> {
        match self.geometry {
            Some(Geometry::Point(p)) => Some((p.x(), p.y())),
            _ => None,
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Collection of features
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self { features: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            features: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self {
            features: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

impl<'a> IntoIterator for &'a FeatureCollection {
    type Item = &'a Feature;
    type IntoIter = std::slice::Iter<'a, Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}
