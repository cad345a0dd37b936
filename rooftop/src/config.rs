//! Run configuration.
//!
//! Every stage takes its parameters explicitly from one of the
//! structs below. All fields have defaults, so a configuration file
//! only needs to name what it changes.

use crate::error::RooftopError;
use raster::{C, DEFAULT_NODATA};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub solar: SolarConfig,
    pub terrain: TerrainConfig,
    pub suitability: SuitabilityConfig,
    pub zonal: ZonalConfig,
    pub energy: EnergyConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), RooftopError> {
        self.grid.validate()?;
        self.solar.validate()?;
        self.terrain.validate()?;
        self.suitability.validate()?;
        self.zonal.validate()?;
        self.energy.validate()
    }
}

/// Processing grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Processing extent as `[xmin, ymin, xmax, ymax]`; defaults to
    /// the neighborhood boundary's bounding box.
    pub extent: Option<[C; 4]>,

    /// Output cell size; defaults to the elevation raster's.
    pub cell_size: Option<C>,

    /// Expected CRS of every input; unchecked when absent.
    pub crs: Option<String>,

    /// Nodata sentinel written into derived rasters.
    pub nodata: f32,

    /// Identifier of the neighborhood zone.
    pub neighborhood_id: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            extent: None,
            cell_size: None,
            crs: None,
            nodata: DEFAULT_NODATA,
            neighborhood_id: String::from("neighborhood"),
        }
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<(), RooftopError> {
        if let Some(cell_size) = self.cell_size {
            if !(cell_size.is_finite() && cell_size > 0.0) {
                return Err(RooftopError::config(
                    "cell_size",
                    cell_size,
                    "must be positive",
                ));
            }
        }
        if let Some([xmin, ymin, xmax, ymax]) = self.extent {
            let finite = [xmin, ymin, xmax, ymax].iter().all(|v| v.is_finite());
            if !finite || xmin >= xmax || ymin >= ymax {
                return Err(RooftopError::config(
                    "extent",
                    format!("[{xmin}, {ymin}, {xmax}, {ymax}]"),
                    "must be a non-empty [xmin, ymin, xmax, ymax] rectangle",
                ));
            }
        }
        if self.nodata.is_nan() {
            return Err(RooftopError::config(
                "nodata",
                self.nodata,
                "must be a number",
            ));
        }
        Ok(())
    }
}

/// How diffuse radiation is distributed over the sky dome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffuseModel {
    /// Same radiance from every sky direction.
    #[default]
    UniformOvercast,
    /// Radiance increasing towards the zenith.
    StandardOvercast,
}

/// Upper bound on either sky dome partition.
pub const MAX_SKY_DIVISIONS: u32 = 360;

/// Zenith and azimuth partition of the sky dome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyDivisions {
    pub zenith_divisions: u32,
    pub azimuth_divisions: u32,
}

impl Default for SkyDivisions {
    fn default() -> Self {
        Self {
            zenith_divisions: 8,
            azimuth_divisions: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarConfig {
    /// Site latitude in degrees, positive north.
    pub latitude: f64,

    pub sky: SkyDivisions,

    /// Proportion of global radiation that is diffuse, in `[0, 1)`.
    pub diffuse_proportion: f64,

    /// Fraction of radiation passing the atmosphere at zenith, in
    /// `(0, 1]`.
    pub transmittivity: f64,

    /// Days of year simulated and averaged.
    pub days: Vec<u16>,

    /// Hours between sun position samples.
    pub hour_interval: f64,

    pub diffuse_model: DiffuseModel,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            latitude: 38.92,
            sky: SkyDivisions::default(),
            diffuse_proportion: 0.3,
            transmittivity: 0.5,
            days: vec![80, 172, 266, 356],
            hour_interval: 0.5,
            diffuse_model: DiffuseModel::UniformOvercast,
        }
    }
}

impl SolarConfig {
    pub fn validate(&self) -> Result<(), RooftopError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(RooftopError::config(
                "latitude",
                self.latitude,
                "must be within [-90, 90]",
            ));
        }
        let divisions = [
            ("zenith_divisions", self.sky.zenith_divisions),
            ("azimuth_divisions", self.sky.azimuth_divisions),
        ];
        for (parameter, value) in divisions {
            if !(1..=MAX_SKY_DIVISIONS).contains(&value) {
                return Err(RooftopError::config(
                    parameter,
                    value,
                    "must be within 1..=360",
                ));
            }
        }
        if !(0.0..1.0).contains(&self.diffuse_proportion) {
            return Err(RooftopError::config(
                "diffuse_proportion",
                self.diffuse_proportion,
                "must be within [0, 1)",
            ));
        }
        if !(self.transmittivity > 0.0 && self.transmittivity <= 1.0) {
            return Err(RooftopError::config(
                "transmittivity",
                self.transmittivity,
                "must be within (0, 1]",
            ));
        }
        if self.days.is_empty() {
            return Err(RooftopError::config(
                "days",
                "[]",
                "at least one day is required",
            ));
        }
        if let Some(day) = self.days.iter().find(|day| !(1..=366).contains(*day)) {
            return Err(RooftopError::config("days", day, "must be within 1..=366"));
        }
        if !(self.hour_interval > 0.0 && self.hour_interval <= 24.0) {
            return Err(RooftopError::config(
                "hour_interval",
                self.hour_interval,
                "must be within (0, 24]",
            ));
        }
        Ok(())
    }
}

/// Surface derivatives and terrain shading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Multiplier converting elevation units to map units.
    pub z_factor: f64,

    /// Number of azimuths horizon angles are computed in; `0`
    /// disables shading.
    pub horizon_directions: usize,

    /// How far to search for obstructions, in map units.
    pub horizon_search_distance: C,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            z_factor: 1.0,
            horizon_directions: 32,
            horizon_search_distance: 100.0,
        }
    }
}

impl TerrainConfig {
    pub fn validate(&self) -> Result<(), RooftopError> {
        if !(self.z_factor.is_finite() && self.z_factor > 0.0) {
            return Err(RooftopError::config(
                "z_factor",
                self.z_factor,
                "must be positive",
            ));
        }
        if !(self.horizon_search_distance.is_finite() && self.horizon_search_distance >= 0.0) {
            return Err(RooftopError::config(
                "horizon_search_distance",
                self.horizon_search_distance,
                "must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuitabilityConfig {
    /// Buildings must be strictly larger than this to be considered.
    pub min_building_area: f64,

    /// Steepest acceptable roof slope, in degrees.
    pub max_slope_deg: f64,

    /// Least acceptable irradiance, in Wh/m²/day.
    pub min_irradiance: f64,
}

impl Default for SuitabilityConfig {
    fn default() -> Self {
        Self {
            min_building_area: 40.0,
            max_slope_deg: 45.0,
            min_irradiance: 2200.0,
        }
    }
}

impl SuitabilityConfig {
    pub fn validate(&self) -> Result<(), RooftopError> {
        if !(self.min_building_area >= 0.0) {
            return Err(RooftopError::config(
                "min_building_area",
                self.min_building_area,
                "must not be negative",
            ));
        }
        if !(0.0..=90.0).contains(&self.max_slope_deg) {
            return Err(RooftopError::config(
                "max_slope_deg",
                self.max_slope_deg,
                "must be within [0, 90]",
            ));
        }
        if !(self.min_irradiance >= 0.0) {
            return Err(RooftopError::config(
                "min_irradiance",
                self.min_irradiance,
                "must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZonalConfig {
    /// Buildings with less suitable area are dropped from the
    /// building-level results.
    pub min_area_threshold: f64,
}

impl Default for ZonalConfig {
    fn default() -> Self {
        Self {
            min_area_threshold: 30.0,
        }
    }
}

impl ZonalConfig {
    pub fn validate(&self) -> Result<(), RooftopError> {
        if !(self.min_area_threshold >= 0.0) {
            return Err(RooftopError::config(
                "min_area_threshold",
                self.min_area_threshold,
                "must not be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub panel_efficiency: f64,
    pub system_derate: f64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            panel_efficiency: 0.15,
            system_derate: 0.86,
        }
    }
}

impl EnergyConfig {
    pub fn validate(&self) -> Result<(), RooftopError> {
        for (parameter, value) in [
            ("panel_efficiency", self.panel_efficiency),
            ("system_derate", self.system_derate),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(RooftopError::config(
                    parameter,
                    value,
                    "must be within (0, 1]",
                ));
            }
        }
        Ok(())
    }
}
