//! Per-zone statistics over a suitability raster.

use crate::{
    error::{GeometryIssue, RooftopError, Stage},
    zone::{Zone, ZoneId},
};
use raster::Raster;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Running count/sum/min/max of cell values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulator {
    pub count: usize,
    pub sum: f64,
    pub min: f32,
    pub max: f32,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }
    }
}

impl Accumulator {
    pub fn new(value: f32) -> Self {
        Self {
            count: 1,
            sum: f64::from(value),
            min: value,
            max: value,
        }
    }

    /// Combines two partial accumulators. Associative and commutative,
    /// with [Accumulator::default] as identity.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Suitable area and irradiance statistics of one zone.
///
/// The irradiance fields are `None` when the zone has no suitable
/// cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneStats {
    pub cell_count: usize,
    pub suitable_area: f64,
    pub mean_irradiance: Option<f64>,
    pub min_irradiance: Option<f64>,
    pub max_irradiance: Option<f64>,
}

impl ZoneStats {
    /// `suitable_area` never exceeds `zone_area`, even when cell
    /// centers over-cover a small polygon.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_accumulator(acc: &Accumulator, cell_area: f64, zone_area: f64) -> Self {
        let has_cells = acc.count > 0;
        Self {
            cell_count: acc.count,
            suitable_area: (acc.count as f64 * cell_area).min(zone_area),
            mean_irradiance: acc.mean(),
            min_irradiance: has_cells.then_some(f64::from(acc.min)),
            max_irradiance: has_cells.then_some(f64::from(acc.max)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count == 0
    }
}

/// Aggregates the valid cells of `suitable` inside each zone.
pub fn aggregate(
    suitable: &Raster,
    zones: &[Zone],
    cell_area: f64,
) -> Result<BTreeMap<ZoneId, ZoneStats>, RooftopError> {
    if !(cell_area.is_finite() && cell_area > 0.0) {
        return Err(RooftopError::config(
            "cell_area",
            cell_area,
            "must be positive",
        ));
    }
    let mut seen = HashSet::with_capacity(zones.len());
    for zone in zones {
        if !seen.insert(zone.id()) {
            return Err(RooftopError::geometry(
                Some(zone.id()),
                Stage::ZonalStats,
                GeometryIssue::DuplicateId,
            ));
        }
    }

    let spec = suitable.spec();
    let stats: BTreeMap<ZoneId, ZoneStats> = zones
        .par_iter()
        .map(|zone| {
            let acc = zone
                .cells(spec)
                .into_iter()
                .filter_map(|(row, col)| suitable.get(row, col))
                .map(Accumulator::new)
                .fold(Accumulator::default(), Accumulator::merge);
            (
                zone.id().clone(),
                ZoneStats::from_accumulator(&acc, cell_area, zone.area()),
            )
        })
        .collect();

    log::debug!(
        "aggregate; zones: {}, with suitable cells: {}",
        stats.len(),
        stats.values().filter(|s| !s.is_empty()).count()
    );
    Ok(stats)
}

/// Keeps the zones with `suitable_area >= threshold`.
pub fn retain_min_suitable_area(
    mut stats: BTreeMap<ZoneId, ZoneStats>,
    threshold: f64,
) -> BTreeMap<ZoneId, ZoneStats> {
    stats.retain(|_, s| s.suitable_area >= threshold);
    stats
}

#[cfg(test)]
mod tests {
    use super::{aggregate, retain_min_suitable_area, Accumulator, ZoneStats};
    use crate::{
        zone::{Zone, ZoneId},
        GeometryIssue, RooftopError,
    };
    use approx::assert_relative_eq;
    use geo::{geometry::Polygon, polygon};
    use ndarray::array;
    use raster::{geo::geometry::Coord, Crs, GridSpec, Raster};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        polygon![(x: x0, y: y0), (x: x1, y: y0), (x: x1, y: y1), (x: x0, y: y1)]
    }

    /// 2 m cells, 3x3, with one nodata cell.
    fn suitable() -> Raster {
        let origin = Coord { x: 0.0, y: 6.0 };
        let spec = GridSpec::new(origin, 2.0, 3, 3, Crs::unknown()).unwrap();
        Raster::new(
            spec,
            -9999.0,
            array![
                [3000.0, 2800.0, -9999.0],
                [2600.0, 2400.0, 2200.0],
                [-9999.0, -9999.0, -9999.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_accumulator_merge() {
        let parts = [1.0, 5.0, 3.0].map(Accumulator::new);
        let whole = parts
            .into_iter()
            .fold(Accumulator::default(), Accumulator::merge);
        assert_eq!(whole.count, 3);
        assert_relative_eq!(whole.min, 1.0);
        assert_relative_eq!(whole.max, 5.0);
        assert_relative_eq!(whole.mean().unwrap(), 3.0);

        let left = parts[0].merge(parts[1]).merge(parts[2]);
        let right = parts[0].merge(parts[1].merge(parts[2]));
        assert_eq!(left, right);
        assert_eq!(Accumulator::default().merge(whole), whole);
        assert_eq!(Accumulator::default().mean(), None);
    }

    #[test]
    fn test_aggregate() {
        let zones = vec![
            // Top-left 2x2 block of cells.
            Zone::new("a", rect(0.0, 2.0, 4.0, 6.0), None).unwrap(),
            // Bottom row, all nodata.
            Zone::new("b", rect(0.0, 0.0, 6.0, 2.0), None).unwrap(),
        ];
        let stats = aggregate(&suitable(), &zones, 4.0).unwrap();

        let a = &stats[&ZoneId::from("a")];
        assert_eq!(a.cell_count, 4);
        assert_relative_eq!(a.suitable_area, 16.0);
        assert_relative_eq!(a.mean_irradiance.unwrap(), 2700.0);
        assert_relative_eq!(a.min_irradiance.unwrap(), 2400.0);
        assert_relative_eq!(a.max_irradiance.unwrap(), 3000.0);

        let b = &stats[&ZoneId::from("b")];
        assert!(b.is_empty());
        assert_relative_eq!(b.suitable_area, 0.0);
        assert_eq!(b.mean_irradiance, None);
    }

    #[test]
    fn test_suitable_area_capped_by_zone_area() {
        let small = rect(0.0, 2.0, 4.0, 6.0);
        let zones = vec![Zone::new("small", small, Some(10.0)).unwrap()];
        let stats = aggregate(&suitable(), &zones, 4.0).unwrap();
        let small = &stats[&ZoneId::from("small")];
        assert_eq!(small.cell_count, 4);
        assert_relative_eq!(small.suitable_area, 10.0);
    }

    #[test]
    fn test_duplicate_ids() {
        let zones = vec![
            Zone::new("a", rect(0.0, 2.0, 4.0, 6.0), None).unwrap(),
            Zone::new("a", rect(0.0, 0.0, 6.0, 2.0), None).unwrap(),
        ];
        assert!(matches!(
            aggregate(&suitable(), &zones, 4.0),
            Err(RooftopError::Geometry {
                reason: GeometryIssue::DuplicateId,
                ..
            })
        ));
    }

    #[test]
    fn test_bad_cell_area() {
        assert!(matches!(
            aggregate(&suitable(), &[], 0.0),
            Err(RooftopError::Configuration {
                parameter: "cell_area",
                ..
            })
        ));
    }

    #[test]
    fn test_retain_min_suitable_area() {
        let mut stats = std::collections::BTreeMap::new();
        for (id, area) in [("small", 25.0), ("edge", 30.0), ("large", 60.0)] {
            stats.insert(
                ZoneId::from(id),
                ZoneStats {
                    cell_count: 1,
                    suitable_area: area,
                    mean_irradiance: Some(3000.0),
                    min_irradiance: Some(3000.0),
                    max_irradiance: Some(3000.0),
                },
            );
        }
        let kept = retain_min_suitable_area(stats, 30.0);
        let ids: Vec<&str> = kept.keys().map(ZoneId::as_str).collect();
        assert_eq!(ids, vec!["edge", "large"]);
    }
}
