//! Zonal statistics over polygon regions
//!
//! Summarizes interpolated grid values falling inside each region polygon.
//! Candidates are first narrowed to the region's bounding box, then tested
//! exactly with point-in-polygon.
//!
//! Regions are processed independently: a region whose geometry cannot be
//! summarized gets zero statistics and its failure reason is kept, while
//! the remaining regions are processed normally.

use geo::Geometry;
use nitrogis_core::{FeatureCollection, Progress};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::interpolation::GridValue;
use crate::keys::PropertyKeys;
use crate::vector::{bounding_box, contains_point, is_areal};

/// Parameters for zonal aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonalParams {
    /// Emit a progress update after every this many regions (default: 50).
    /// Failed regions count as processed. Zero disables progress updates.
    pub progress_every: usize,
}

impl Default for ZonalParams {
    fn default() -> Self {
        Self { progress_every: 50 }
    }
}

/// Statistics of the grid values inside one region
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZonalSummary {
    /// Mean of the contained values, 0 when nothing is contained
    pub average: f64,
    /// Number of contained grid points
    pub count: usize,
}

/// Why a region could not be summarized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegionError {
    #[error("region geometry is malformed: {0}")]
    Malformed(String),

    #[error("region has no geometry")]
    MissingGeometry,

    #[error("region geometry is a {0}, not a polygon")]
    NotAreal(&'static str),

    #[error("region geometry has no coordinates")]
    Empty,

    #[error("region polygon ring has fewer than 4 positions")]
    DegenerateRing,

    #[error("region geometry has non-finite coordinates")]
    NonFinite,
}

/// Per-region result: statistics, or the reason they defaulted to zero
pub type RegionOutcome = std::result::Result<ZonalSummary, RegionError>;

/// Result of [`aggregate_regions`]
#[derive(Debug, Clone)]
pub struct ZonalOutput {
    /// Copy of the input regions with statistics properties set
    pub regions: FeatureCollection,
    /// One outcome per region, in input order
    pub outcomes: Vec<RegionOutcome>,
}

impl ZonalOutput {
    /// Regions that failed, with their index
    pub fn failures(&self) -> impl Iterator<Item = (usize, &RegionError)> {
        self.outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().err().map(|e| (i, e)))
    }

    /// Statistics for every region, zero for failed ones
    pub fn summaries(&self) -> impl Iterator<Item = ZonalSummary> + '_ {
        self.outcomes.iter().map(|o| o.as_ref().copied().unwrap_or_default())
    }
}

/// Summarize the grid values inside one region geometry.
pub fn summarize_region(geometry: &Geometry<f64>, grid: &[GridValue]) -> RegionOutcome {
    if !is_areal(geometry) {
        return Err(RegionError::NotAreal(geometry_kind(geometry)));
    }
    check_rings(geometry)?;

    let bbox = bounding_box(geometry).ok_or(RegionError::Empty)?;
    if !bbox.is_finite() {
        return Err(RegionError::NonFinite);
    }

    let mut sum = 0.0;
    let mut count = 0usize;
    for g in grid.iter().filter(|g| bbox.contains_point(g.x, g.y)) {
        if contains_point(geometry, g.x, g.y) {
            sum += g.value;
            count += 1;
        }
    }

    if count == 0 {
        return Ok(ZonalSummary::default());
    }
    Ok(ZonalSummary {
        average: sum / count as f64,
        count,
    })
}

fn check_rings(geometry: &Geometry<f64>) -> std::result::Result<(), RegionError> {
    let polygons = match geometry {
        Geometry::Polygon(p) => std::slice::from_ref(p),
        Geometry::MultiPolygon(mp) => mp.0.as_slice(),
        _ => return Ok(()),
    };
    if polygons.iter().all(|p| p.exterior().0.is_empty()) {
        return Err(RegionError::Empty);
    }
    if polygons.iter().any(|p| p.exterior().0.len() < 4) {
        return Err(RegionError::DegenerateRing);
    }
    Ok(())
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Aggregate interpolated grid values into every region.
///
/// The input collection is not modified: the result holds a copy of every
/// region with `keys.average` and `keys.count` set, plus
/// `keys.aggregation_error` on regions that failed.
///
/// # Arguments
/// * `regions` - Region polygons
/// * `grid` - Interpolated grid values
/// * `params` - Progress cadence
/// * `keys` - Output property names
/// * `on_progress` - Receives an update after every `params.progress_every` regions
pub fn aggregate_regions(
    regions: &FeatureCollection,
    grid: &[GridValue],
    params: &ZonalParams,
    keys: &PropertyKeys,
    mut on_progress: impl FnMut(Progress),
) -> ZonalOutput {
    let total = regions.len();
    let mut updated = regions.clone();
    let mut outcomes = Vec::with_capacity(total);

    for (index, region) in updated.features.iter_mut().enumerate() {
        let outcome = match (&region.geometry, &region.geometry_error) {
            (Some(geometry), _) => summarize_region(geometry, grid),
            (None, Some(reason)) => Err(RegionError::Malformed(reason.clone())),
            (None, None) => Err(RegionError::MissingGeometry),
        };

        let summary = match &outcome {
            Ok(summary) => *summary,
            Err(e) => {
                warn!("Error processing region {}: {}", index, e);
                region.set_property(keys.aggregation_error.as_str(), e.to_string());
                ZonalSummary::default()
            }
        };
        region.set_property(keys.average.as_str(), summary.average);
        region.set_property(keys.count.as_str(), summary.count);
        outcomes.push(outcome);

        let processed = index + 1;
        if params.progress_every > 0 && processed % params.progress_every == 0 {
            on_progress(Progress::fraction(
                format!("Processed {}/{} regions", processed, total),
                processed,
                total,
            ));
        }
    }

    let output = ZonalOutput {
        regions: updated,
        outcomes,
    };
    info!(
        "Aggregation completed for {} regions ({} failed)",
        total,
        output.failures().count()
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpolation::RegularGrid;
    use crate::vector::BoundingBox;
    use approx::assert_relative_eq;
    use geo::{LineString, MultiPolygon, Point, Polygon};
    use nitrogis_core::Feature;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )
    }

    fn grid_values(cell: f64, f: impl Fn(f64, f64) -> f64) -> Vec<GridValue> {
        RegularGrid::new(BoundingBox::new(0.0, 0.0, 4.0, 4.0), cell)
            .iter()
            .map(|(x, y)| GridValue { x, y, value: f(x, y) })
            .collect()
    }

    fn region(poly: Polygon<f64>) -> Feature {
        Feature::new(Geometry::Polygon(poly))
    }

    #[test]
    fn test_summarize_rect() {
        let grid = grid_values(1.0, |x, _| x);
        let s = summarize_region(&Geometry::Polygon(rect(0.5, 0.5, 2.5, 1.5)), &grid).unwrap();
        // Points (1,1) and (2,1)
        assert_eq!(s.count, 2);
        assert_relative_eq!(s.average, 1.5);
    }

    #[test]
    fn test_summarize_boundary_points_included() {
        let grid = grid_values(1.0, |_, _| 2.0);
        let s = summarize_region(&Geometry::Polygon(rect(1.0, 1.0, 2.0, 2.0)), &grid).unwrap();
        assert_eq!(s.count, 4);
        assert_relative_eq!(s.average, 2.0);
    }

    #[test]
    fn test_summarize_no_points_is_zero() {
        let grid = grid_values(1.0, |_, _| 9.0);
        let s = summarize_region(&Geometry::Polygon(rect(1.2, 1.2, 1.8, 1.8)), &grid).unwrap();
        assert_eq!(s, ZonalSummary { average: 0.0, count: 0 });
    }

    #[test]
    fn test_prefilter_keeps_every_contained_point() {
        let grid = grid_values(0.1, |x, y| x * 10.0 + y);
        let diamond = Geometry::Polygon(Polygon::new(
            LineString::from(vec![(2.0, 0.3), (3.7, 2.0), (2.0, 3.7), (0.3, 2.0), (2.0, 0.3)]),
            vec![],
        ));

        let brute: Vec<&GridValue> = grid
            .iter()
            .filter(|g| contains_point(&diamond, g.x, g.y))
            .collect();
        let s = summarize_region(&diamond, &grid).unwrap();

        assert!(!brute.is_empty());
        assert_eq!(s.count, brute.len());
        let mean = brute.iter().map(|g| g.value).sum::<f64>() / brute.len() as f64;
        assert_relative_eq!(s.average, mean, epsilon = 1e-9);
    }

    #[test]
    fn test_summarize_multipolygon() {
        let grid = grid_values(1.0, |x, _| x);
        let mp = Geometry::MultiPolygon(MultiPolygon::new(vec![
            rect(-0.5, -0.5, 0.5, 0.5),
            rect(3.5, -0.5, 4.5, 0.5),
        ]));
        let s = summarize_region(&mp, &grid).unwrap();
        assert_eq!(s.count, 2);
        assert_relative_eq!(s.average, 2.0);
    }

    #[test]
    fn test_summarize_rejects_bad_geometry() {
        let grid = grid_values(1.0, |_, _| 1.0);
        assert_eq!(
            summarize_region(&Geometry::Point(Point::new(1.0, 1.0)), &grid),
            Err(RegionError::NotAreal("Point"))
        );
        assert_eq!(
            summarize_region(&Geometry::Polygon(Polygon::new(LineString::new(vec![]), vec![])), &grid),
            Err(RegionError::Empty)
        );
        let sliver = Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]), vec![]);
        assert_eq!(
            summarize_region(&Geometry::Polygon(sliver), &grid),
            Err(RegionError::DegenerateRing)
        );
    }

    #[test]
    fn test_aggregate_isolates_failures() {
        let grid = grid_values(1.0, |_, _| 5.0);
        let regions: FeatureCollection = vec![
            region(rect(0.5, 0.5, 1.5, 1.5)),
            Feature::empty(),
            region(rect(2.5, 2.5, 3.5, 3.5)),
        ]
        .into_iter()
        .collect();
        let keys = PropertyKeys::default();

        let out = aggregate_regions(&regions, &grid, &ZonalParams::default(), &keys, |_| {});

        assert_eq!(out.regions.len(), 3);
        let failures: Vec<_> = out.failures().collect();
        assert_eq!(failures, vec![(1, &RegionError::MissingGeometry)]);

        let counts: Vec<usize> = out.summaries().map(|s| s.count).collect();
        assert_eq!(counts, vec![1, 0, 1]);

        let failed = &out.regions.features[1];
        assert_eq!(failed.number_property(&["average"]), None);
        assert_eq!(failed.get_property("count"), Some(&serde_json::json!(0)));
        assert_eq!(
            failed.get_property("aggregationError"),
            Some(&serde_json::json!("region has no geometry"))
        );
        assert_eq!(out.regions.features[2].number_property(&["average"]), Some(5.0));
    }

    #[test]
    fn test_aggregate_reports_malformed_geometry() {
        let grid = grid_values(1.0, |_, _| 5.0);
        let mut malformed = Feature::empty().with_property("GEOID", "bad");
        malformed.geometry_error = Some("position needs at least 2 coordinates, got 1".into());
        let regions: FeatureCollection = vec![malformed, region(rect(0.5, 0.5, 2.5, 1.5))]
            .into_iter()
            .collect();

        let out = aggregate_regions(&regions, &grid, &ZonalParams::default(), &PropertyKeys::default(), |_| {});

        let failures: Vec<_> = out.failures().collect();
        assert_eq!(
            failures,
            vec![(
                0,
                &RegionError::Malformed("position needs at least 2 coordinates, got 1".into())
            )]
        );
        assert_eq!(
            out.regions.features[0].get_property("aggregationError"),
            Some(&serde_json::json!(
                "region geometry is malformed: position needs at least 2 coordinates, got 1"
            ))
        );
        assert_eq!(out.summaries().map(|s| s.count).collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_failed_regions_count_for_progress() {
        let grid = grid_values(1.0, |_, _| 5.0);
        let regions: FeatureCollection = vec![Feature::empty(), Feature::empty()].into_iter().collect();
        let params = ZonalParams { progress_every: 1 };

        let mut seen = Vec::new();
        aggregate_regions(&regions, &grid, &params, &PropertyKeys::default(), |p| seen.push(p.message));

        assert_eq!(seen, vec!["Processed 1/2 regions", "Processed 2/2 regions"]);
    }

    #[test]
    fn test_aggregate_does_not_mutate_input() {
        let grid = grid_values(1.0, |_, _| 5.0);
        let regions: FeatureCollection = vec![region(rect(0.5, 0.5, 1.5, 1.5))].into_iter().collect();
        let before = regions.clone();

        let out = aggregate_regions(&regions, &grid, &ZonalParams::default(), &PropertyKeys::default(), |_| {});

        assert_eq!(regions, before);
        assert!(regions.features[0].get_property("average").is_none());
        assert!(out.regions.features[0].get_property("average").is_some());
    }

    #[test]
    fn test_aggregate_progress_cadence() {
        let grid = grid_values(1.0, |_, _| 1.0);
        let regions: FeatureCollection = (0..120)
            .map(|_| region(rect(0.5, 0.5, 1.5, 1.5)))
            .collect();
        let mut updates = Vec::new();

        aggregate_regions(
            &regions,
            &grid,
            &ZonalParams::default(),
            &PropertyKeys::default(),
            |p| updates.push(p),
        );

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message, "Processed 50/120 regions");
        assert_relative_eq!(updates[0].percent, 50.0 / 120.0 * 100.0);
        assert_eq!(updates[1].message, "Processed 100/120 regions");
    }

    #[test]
    fn test_aggregate_progress_disabled() {
        let grid = grid_values(1.0, |_, _| 1.0);
        let regions: FeatureCollection = (0..60).map(|_| region(rect(0.5, 0.5, 1.5, 1.5))).collect();
        let mut calls = 0;
        aggregate_regions(
            &regions,
            &grid,
            &ZonalParams { progress_every: 0 },
            &PropertyKeys::default(),
            |_| calls += 1,
        );
        assert_eq!(calls, 0);
    }
}
