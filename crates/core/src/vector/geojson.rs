//! GeoJSON codec for [`Feature`] and [`FeatureCollection`].
//!
//! Lightweight serde models for the subset of RFC 7946 that NitroGIS reads
//! and writes. Geometries are converted to and from `geo-types`. Positions
//! must carry at least two numbers; extra ordinates (altitude) are dropped.
//!
//! An invalid geometry does not fail the surrounding feature: the feature is
//! read without geometry and keeps the reason in `geometry_error`.

use geo_types::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::{Feature, FeatureCollection, Properties};
use crate::{Error, Result};

type Position = Vec<f64>;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
enum FeatureTag {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
enum CollectionTag {
    #[default]
    FeatureCollection,
}

/// GeoJSON geometry object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<RawGeometry> },
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    #[serde(rename = "type", default)]
    _kind: FeatureTag,
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    geometry: Option<Value>,
    #[serde(default)]
    properties: Option<Properties>,
}

#[derive(Serialize)]
struct RawFeatureRef<'a> {
    #[serde(rename = "type")]
    kind: FeatureTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a Value>,
    geometry: Option<RawGeometry>,
    properties: &'a Properties,
}

#[derive(Debug, Deserialize)]
struct RawFeatureCollection {
    #[serde(rename = "type", default)]
    _kind: CollectionTag,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct RawFeatureCollectionRef<'a> {
    #[serde(rename = "type")]
    kind: CollectionTag,
    features: &'a [Feature],
}

// ---------------------------------------------------------------------------
// Feature
// ---------------------------------------------------------------------------

impl From<RawFeature> for Feature {
    fn from(raw: RawFeature) -> Self {
        let (geometry, geometry_error) = match raw.geometry.map(parse_geometry).transpose() {
            Ok(geometry) => (geometry, None),
            Err(reason) => (None, Some(reason)),
        };
        Feature {
            geometry,
            properties: raw.properties.unwrap_or_default(),
            id: raw.id.filter(|id| !id.is_null()),
            geometry_error,
        }
    }
}

fn parse_geometry(value: Value) -> std::result::Result<Geometry<f64>, String> {
    let raw: RawGeometry = serde_json::from_value(value).map_err(|e| e.to_string())?;
    Geometry::try_from(raw).map_err(|e| match e {
        Error::InvalidGeometry(reason) => reason,
        other => other.to_string(),
    })
}

impl<'de> Deserialize<'de> for Feature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        RawFeature::deserialize(deserializer).map(Feature::from)
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawFeatureRef {
            kind: FeatureTag::Feature,
            id: self.id.as_ref(),
            geometry: self.geometry.as_ref().map(RawGeometry::from),
            properties: &self.properties,
        }
        .serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// FeatureCollection
// ---------------------------------------------------------------------------

impl<'de> Deserialize<'de> for FeatureCollection {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawFeatureCollection::deserialize(deserializer)?;
        Ok(FeatureCollection {
            features: raw.features,
        })
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawFeatureCollectionRef {
            kind: CollectionTag::FeatureCollection,
            features: &self.features,
        }
        .serialize(serializer)
    }
}

impl FeatureCollection {
    /// Parse a GeoJSON FeatureCollection
    pub fn from_geojson_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Serialize as a GeoJSON FeatureCollection
    pub fn to_geojson_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ---------------------------------------------------------------------------
// Geometry conversion
// ---------------------------------------------------------------------------

fn coord(position: &[f64]) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        [_, _, ..] => Err(Error::InvalidGeometry(
            "position contains non-finite coordinates".into(),
        )),
        _ => Err(Error::InvalidGeometry(format!(
            "position needs at least 2 coordinates, got {}",
            position.len()
        ))),
    }
}

fn line_string(positions: &[Position]) -> Result<LineString<f64>> {
    positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let mut rings = rings.iter().map(|r| line_string(r));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString::new(vec![]));
    let interiors = rings.collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}

impl TryFrom<RawGeometry> for Geometry<f64> {
    type Error = Error;

    fn try_from(raw: RawGeometry) -> Result<Self> {
        Ok(match raw {
            RawGeometry::Point { coordinates } => Geometry::Point(Point::from(coord(&coordinates)?)),
            RawGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint::new(
                coordinates
                    .iter()
                    .map(|p| coord(p).map(Point::from))
                    .collect::<Result<_>>()?,
            )),
            RawGeometry::LineString { coordinates } => {
                Geometry::LineString(line_string(&coordinates)?)
            }
            RawGeometry::MultiLineString { coordinates } => {
                Geometry::MultiLineString(MultiLineString::new(
                    coordinates
                        .iter()
                        .map(|l| line_string(l))
                        .collect::<Result<_>>()?,
                ))
            }
            RawGeometry::Polygon { coordinates } => Geometry::Polygon(polygon(&coordinates)?),
            RawGeometry::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon::new(
                coordinates
                    .iter()
                    .map(|p| polygon(p))
                    .collect::<Result<_>>()?,
            )),
            RawGeometry::GeometryCollection { geometries } => {
                Geometry::GeometryCollection(GeometryCollection(
                    geometries
                        .into_iter()
                        .map(Geometry::try_from)
                        .collect::<Result<_>>()?,
                ))
            }
        })
    }
}

fn position(c: Coord<f64>) -> Position {
    vec![c.x, c.y]
}

fn positions(ls: &LineString<f64>) -> Vec<Position> {
    ls.0.iter().copied().map(position).collect()
}

fn rings(p: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(p.exterior())
        .chain(p.interiors())
        .filter(|ring| !ring.0.is_empty())
        .map(positions)
        .collect()
}

impl From<&Geometry<f64>> for RawGeometry {
    fn from(geometry: &Geometry<f64>) -> Self {
        match geometry {
            Geometry::Point(p) => RawGeometry::Point {
                coordinates: position(p.0),
            },
            Geometry::Line(l) => RawGeometry::LineString {
                coordinates: vec![position(l.start), position(l.end)],
            },
            Geometry::LineString(ls) => RawGeometry::LineString {
                coordinates: positions(ls),
            },
            Geometry::Polygon(p) => RawGeometry::Polygon {
                coordinates: rings(p),
            },
            Geometry::MultiPoint(mp) => RawGeometry::MultiPoint {
                coordinates: mp.iter().map(|p| position(p.0)).collect(),
            },
            Geometry::MultiLineString(mls) => RawGeometry::MultiLineString {
                coordinates: mls.iter().map(positions).collect(),
            },
            Geometry::MultiPolygon(mp) => RawGeometry::MultiPolygon {
                coordinates: mp.iter().map(rings).collect(),
            },
            Geometry::GeometryCollection(gc) => RawGeometry::GeometryCollection {
                geometries: gc.iter().map(RawGeometry::from).collect(),
            },
            Geometry::Rect(r) => RawGeometry::Polygon {
                coordinates: rings(&r.to_polygon()),
            },
            Geometry::Triangle(t) => RawGeometry::Polygon {
                coordinates: rings(&t.to_polygon()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn square() -> Value {
        json!({
            "type": "Feature",
            "id": "tract-1",
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
            },
            "properties": { "GEOID": "55001", "canrate": 0.12 }
        })
    }

    #[test]
    fn test_parse_polygon_feature() {
        let f: Feature = serde_json::from_value(square()).unwrap();
        assert_eq!(f.id, Some(json!("tract-1")));
        assert_eq!(f.get_property("GEOID"), Some(&json!("55001")));
        match f.geometry {
            Some(Geometry::Polygon(p)) => assert_eq!(p.exterior().0.len(), 5),
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_collection_with_point_altitude() {
        let fc = FeatureCollection::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Point","coordinates":[-89.5,44.2,310.0]},
                 "properties":{"nitr_ran":3.4}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(fc.len(), 1);
        assert_eq!(fc.features[0].as_point(), Some((-89.5, 44.2)));
    }

    #[test]
    fn test_null_geometry_and_properties() {
        let f: Feature = serde_json::from_value(json!({
            "type": "Feature", "geometry": null, "properties": null
        }))
        .unwrap();
        assert!(f.geometry.is_none());
        assert!(f.properties.is_empty());
    }

    #[test]
    fn test_short_position_kept_as_error() {
        let f: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": [1.0]},
            "properties": {"GEOID": "bad"}
        }))
        .unwrap();
        assert!(f.geometry.is_none());
        assert_eq!(f.get_property("GEOID"), Some(&json!("bad")));
        let reason = f.geometry_error.unwrap();
        assert!(reason.contains("at least 2 coordinates"), "{}", reason);
    }

    #[test]
    fn test_bad_geometry_does_not_fail_collection() {
        let fc = FeatureCollection::from_geojson_str(
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1],[0,0]]]},"properties":{}},
                {"type":"Feature","geometry":{"type":"Blob","coordinates":[]},"properties":{}},
                {"type":"Feature","geometry":{"type":"Point","coordinates":[0.5,"x"]},"properties":{}},
                {"type":"Feature","geometry":{"type":"Point","coordinates":[0.5,0.5]},"properties":{}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(fc.len(), 4);
        for f in &fc.features[..3] {
            assert!(f.geometry.is_none());
            assert!(f.geometry_error.is_some());
        }
        assert!(fc.features[1].geometry_error.as_deref().unwrap().contains("Blob"));
        assert_eq!(fc.features[3].as_point(), Some((0.5, 0.5)));
        assert_eq!(fc.features[3].geometry_error, None);
    }

    #[test]
    fn test_wrong_type_tag_rejected() {
        let res = serde_json::from_value::<FeatureCollection>(json!({
            "type": "Feature", "features": []
        }));
        assert!(res.is_err());
    }

    #[test]
    fn test_serialize_feature() {
        let f = Feature::point(0.5, 0.25).with_property("idwValue", 12.5);
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(
            v,
            json!({
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [0.5, 0.25]},
                "properties": {"idwValue": 12.5}
            })
        );
    }

    #[test]
    fn test_collection_roundtrip_keeps_properties_order() {
        let text = json!({
            "type": "FeatureCollection",
            "features": [square()]
        })
        .to_string();
        let fc = FeatureCollection::from_geojson_str(&text).unwrap();
        let out: Value = serde_json::from_str(&fc.to_geojson_string().unwrap()).unwrap();
        let keys: Vec<&String> = out["features"][0]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, ["GEOID", "canrate"]);
        assert_eq!(out["features"][0]["geometry"], square()["geometry"]);
    }
}
