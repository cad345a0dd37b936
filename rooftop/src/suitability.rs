//! Restricts irradiance to rooftop cells fit for panels.
//!
//! A cell is suitable when all of these hold:
//!
//! 1. its center lies inside a building larger than
//!    `min_building_area`,
//! 1. its slope is at most `max_slope_deg`,
//! 1. its irradiance is at least `min_irradiance`.

use crate::{
    config::SuitabilityConfig,
    error::{RooftopError, Stage},
    terrain,
    zone::Zone,
};
use ndarray::{par_azip, Array2};
use raster::Raster;
use rayon::prelude::*;

/// Returns the buildings with `area > min_area`.
pub fn select_buildings(zones: &[Zone], min_area: f64) -> Vec<Zone> {
    zones
        .iter()
        .filter(|zone| zone.area() > min_area)
        .cloned()
        .collect()
}

/// Sets every cell whose center is outside all `zones` to nodata.
pub fn mask_to_zones(raster: &Raster, zones: &[Zone]) -> Result<Raster, RooftopError> {
    let spec = raster.spec();
    let cells: Vec<(usize, usize)> = zones
        .par_iter()
        .flat_map_iter(|zone| zone.cells(spec))
        .collect();

    let mut inside = Array2::from_elem(raster.dim(), false);
    for cell in cells {
        inside[cell] = true;
    }

    let nodata = raster.nodata();
    let mut data = raster.data().clone();
    par_azip!((value in &mut data, &within in &inside) {
        if !within {
            *value = nodata;
        }
    });
    Ok(raster.with_data(data)?)
}

/// Filters `irradiance` to suitable rooftop cells, deriving slope from
/// `elevation`.
pub fn filter_suitable(
    irradiance: &Raster,
    elevation: &Raster,
    buildings: &[Zone],
    cfg: &SuitabilityConfig,
    z_factor: f64,
) -> Result<Raster, RooftopError> {
    irradiance
        .check_aligned(elevation)
        .map_err(RooftopError::alignment(Stage::Suitability))?;
    let slope = terrain::slope(elevation, z_factor)?;
    filter_suitable_with_slope(irradiance, &slope, buildings, cfg)
}

/// Like [filter_suitable] with a precomputed slope raster (degrees).
pub fn filter_suitable_with_slope(
    irradiance: &Raster,
    slope: &Raster,
    buildings: &[Zone],
    cfg: &SuitabilityConfig,
) -> Result<Raster, RooftopError> {
    cfg.validate()?;
    irradiance
        .check_aligned(slope)
        .map_err(RooftopError::alignment(Stage::Suitability))?;

    let selected = select_buildings(buildings, cfg.min_building_area);
    let masked = mask_to_zones(irradiance, &selected)?;

    let nodata = masked.nodata();
    let slope_nodata = slope.nodata();
    let mut data = masked.data().clone();
    par_azip!((value in &mut data, &degrees in slope.data()) {
        let steep = degrees.is_nan()
            || degrees == slope_nodata
            || f64::from(degrees) > cfg.max_slope_deg;
        let dim = value.is_nan() || *value == nodata || f64::from(*value) < cfg.min_irradiance;
        if steep || dim {
            *value = nodata;
        }
    });
    let suitable = masked.with_data(data)?;

    log::info!(
        "suitability; buildings: {}/{}, suitable cells: {}",
        selected.len(),
        buildings.len(),
        suitable.valid_count()
    );
    Ok(suitable)
}

#[cfg(test)]
mod tests {
    use super::{filter_suitable, filter_suitable_with_slope, mask_to_zones, select_buildings};
    use crate::{config::SuitabilityConfig, zone::Zone, RooftopError};
    use geo::polygon;
    use ndarray::{array, Array2};
    use raster::{geo::geometry::Coord, Crs, GridSpec, Raster};

    fn spec() -> GridSpec {
        let (origin, crs) = (Coord { x: 0.0, y: 4.0 }, Crs::unknown());
        GridSpec::new(origin, 1.0, 4, 4, crs).unwrap()
    }

    /// Covers the 2x2 block in the top-left corner.
    fn corner(area: Option<f64>) -> Zone {
        Zone::new("corner", polygon![
            (x: 0.0, y: 2.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 4.0),
            (x: 0.0, y: 4.0),
        ], area)
        .unwrap()
    }

    #[test]
    fn test_select_buildings() {
        let zones = vec![corner(Some(40.0)), corner(Some(40.5))];
        let selected = select_buildings(&zones, 40.0);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].area(), 40.5);
    }

    #[test]
    fn test_mask_to_zones() {
        let raster = Raster::filled(spec(), -9999.0, 3000.0);
        let masked = mask_to_zones(&raster, &[corner(None)]).unwrap();
        assert_eq!(masked.valid_count(), 4);
        assert_eq!(masked.get(0, 0), Some(3000.0));
        assert_eq!(masked.get(2, 2), None);
    }

    #[test]
    fn test_all_criteria_apply() {
        let irradiance = Raster::new(
            spec(),
            -9999.0,
            array![
                [3000.0, 2100.0, 3000.0, 3000.0],
                [2200.0, 3000.0, 3000.0, 3000.0],
                [3000.0, 3000.0, 3000.0, 3000.0],
                [3000.0, 3000.0, 3000.0, 3000.0],
            ],
        )
        .unwrap();
        let mut slope = Array2::from_elem((4, 4), 10.0_f32);
        slope[[1, 1]] = 46.0;
        let slope = irradiance.with_data(slope).unwrap();

        let cfg = SuitabilityConfig::default();
        let roof = [corner(Some(100.0))];
        let suitable = filter_suitable_with_slope(&irradiance, &slope, &roof, &cfg);
        let suitable = suitable.unwrap();
        // (0, 1) is too dim, (1, 1) too steep, and the rest is off-roof.
        assert_eq!(suitable.valid_count(), 2);
        assert_eq!(suitable.get(0, 0), Some(3000.0));
        assert_eq!(suitable.get(1, 0), Some(2200.0));

        // Too small a building contributes nothing.
        let shed = [corner(Some(40.0))];
        let none = filter_suitable_with_slope(&irradiance, &slope, &shed, &cfg);
        let none = none.unwrap();
        assert_eq!(none.valid_count(), 0);
    }

    #[test]
    fn test_flat_roof_from_elevation() {
        let irradiance = Raster::filled(spec(), -9999.0, 2500.0);
        let elevation = Raster::filled(spec(), -9999.0, 12.0);
        let suitable = filter_suitable(
            &irradiance,
            &elevation,
            &[corner(Some(50.0))],
            &SuitabilityConfig::default(),
            1.0,
        )
        .unwrap();
        assert_eq!(suitable.valid_count(), 4);
    }

    #[test]
    fn test_misaligned_inputs() {
        let irradiance = Raster::filled(spec(), -9999.0, 2500.0);
        let mut other = spec();
        other.cell_size = 2.0;
        let elevation = Raster::filled(other, -9999.0, 12.0);
        let cfg = SuitabilityConfig::default();
        assert!(matches!(
            filter_suitable(&irradiance, &elevation, &[], &cfg, 1.0),
            Err(RooftopError::Alignment { .. })
        ));
    }
}
