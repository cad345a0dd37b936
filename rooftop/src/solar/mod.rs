//! Clear-sky insolation over an elevation surface.
//!
//! For each simulated day the sun's path is sampled, the direct beam
//! is attenuated through the atmosphere, projected onto each cell's
//! slope plane and blocked by the surrounding terrain. Diffuse
//! radiation is integrated over a discretised sky dome the same way.
//! Results are in Wh/m²/day.

mod horizon;
mod position;
mod sky;

pub use self::{
    horizon::HorizonMap,
    position::{declination, sun_track, SolarPosition, SunSample},
    sky::{SkyDome, SkySector},
};

use crate::{
    config::{SolarConfig, TerrainConfig},
    error::{RooftopError, Stage},
    terrain::{gradients, Gradient},
};
use ndarray::{Array2, Zip};
use raster::Raster;
use rayon::prelude::*;
use std::time::Instant;

/// Solar constant, W/m².
pub const SOLAR_CONSTANT: f64 = 1367.0;

/// Insolation over one simulated day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyInsolation {
    pub day: u16,
    pub raster: Raster,
}

/// Computes one insolation raster per configured day, aligned with
/// `elevation`.
pub fn insolation_by_day(
    elevation: &Raster,
    solar: &SolarConfig,
    terrain: &TerrainConfig,
) -> Result<Vec<DailyInsolation>, RooftopError> {
    solar.validate()?;
    terrain.validate()?;

    let now = Instant::now();
    let surface = Surface {
        elevation,
        gradients: gradients(elevation, terrain.z_factor),
        horizon: HorizonMap::compute(
            elevation,
            terrain.horizon_directions,
            terrain.horizon_search_distance,
        ),
        sky: SkyDome::new(
            solar.sky.zenith_divisions,
            solar.sky.azimuth_divisions,
            solar.diffuse_model,
        ),
    };
    log::debug!(
        "surface; horizon directions: {}, sky sectors: {}, elapsed: {:?}",
        surface.horizon.directions(),
        surface.sky.sectors().len(),
        now.elapsed()
    );

    solar
        .days
        .par_iter()
        .map(|&day| {
            let now = Instant::now();
            let track = sun_track(solar.latitude, day, solar.hour_interval);
            let raster = surface.insolation(&track, solar)?;
            log::debug!(
                "insolation; day: {day}, sun samples: {}, elapsed: {:?}",
                track.len(),
                now.elapsed()
            );
            Ok(DailyInsolation { day, raster })
        })
        .collect()
}

/// Averages aligned rasters cell by cell.
///
/// A cell is nodata in the result if it is nodata in any input.
pub fn average(rasters: &[Raster]) -> Result<Raster, RooftopError> {
    let Some(first) = rasters.first() else {
        return Err(RooftopError::config("rasters", 0, "nothing to average"));
    };
    for other in &rasters[1..] {
        first
            .check_aligned(other)
            .map_err(RooftopError::alignment(Stage::SolarRadiation))?;
    }

    let nodata = first.nodata();
    #[allow(clippy::cast_precision_loss)]
    let n = rasters.len() as f64;
    let mut out = Array2::<f32>::zeros(first.dim());
    Zip::indexed(&mut out).par_for_each(|(row, col), value| {
        let mut sum = 0.0_f64;
        for raster in rasters {
            match raster.get(row, col) {
                Some(v) => sum += f64::from(v),
                None => {
                    *value = nodata;
                    return;
                }
            }
        }
        *value = (sum / n) as f32;
    });
    Ok(first.with_data(out)?)
}

/// Average insolation over the configured days.
pub fn estimate_irradiance(
    elevation: &Raster,
    solar: &SolarConfig,
    terrain: &TerrainConfig,
) -> Result<Raster, RooftopError> {
    let daily: Vec<Raster> = insolation_by_day(elevation, solar, terrain)?
        .into_iter()
        .map(|day| day.raster)
        .collect();
    average(&daily)
}

/// Relative optical path length for a ray `zenith` radians from
/// vertical reaching a cell at `z` map units of elevation.
pub fn optical_path(zenith: f64, z: f64) -> f64 {
    let pressure = (-0.000_118 * z - 1.638e-9 * z * z).exp();
    let deg = zenith.to_degrees().min(90.0);
    // Kasten & Young, finite at the horizon.
    let air_mass = 1.0 / (zenith.cos() + 0.505_72 * (96.079_95 - deg).powf(-1.6364));
    pressure * air_mass
}

/// Per-run terrain state shared by every simulated day.
struct Surface<'a> {
    elevation: &'a Raster,
    gradients: Array2<Option<Gradient>>,
    horizon: HorizonMap,
    sky: SkyDome,
}

impl Surface<'_> {
    fn insolation(&self, track: &[SunSample], solar: &SolarConfig) -> Result<Raster, RooftopError> {
        let nodata = self.elevation.nodata();
        let beta = solar.transmittivity;
        let diffuse_share = solar.diffuse_proportion / (1.0 - solar.diffuse_proportion);

        let mut out = Array2::<f32>::zeros(self.elevation.dim());
        Zip::indexed(&mut out)
            .and(&self.gradients)
            .par_for_each(|(row, col), value, gradient| {
                let (Some(gradient), Some(z)) = (gradient, self.elevation.get(row, col)) else {
                    *value = nodata;
                    return;
                };
                let z = f64::from(z);

                let mut beam = 0.0;
                let mut direct = 0.0;
                for sample in track {
                    let SolarPosition { altitude, azimuth } = sample.position;
                    let zenith = sample.position.zenith();
                    let energy = SOLAR_CONSTANT * beta.powf(optical_path(zenith, z)) * sample.hours;
                    beam += energy;
                    if self.horizon.is_visible(row, col, azimuth, altitude) {
                        direct += energy * gradient.incidence(zenith, azimuth.to_radians());
                    }
                }

                let sky_view: f64 = self
                    .sky
                    .sectors()
                    .iter()
                    .filter(|s| self.horizon.is_visible(row, col, s.azimuth, s.altitude()))
                    .map(|s| {
                        let (zenith, azimuth) = (s.zenith.to_radians(), s.azimuth.to_radians());
                        s.weight * gradient.incidence(zenith, azimuth)
                    })
                    .sum();
                let diffuse = beam * diffuse_share * sky_view;

                *value = (direct + diffuse) as f32;
            });
        Ok(self.elevation.with_data(out)?)
    }
}
