use crate::{
    config::Config,
    elevation::clip,
    energy::estimate_energy,
    error::{GeometryIssue, RooftopError, Stage},
    report::{join, ZoneReport},
    solar::{average, insolation_by_day, DailyInsolation},
    suitability::{filter_suitable_with_slope, select_buildings},
    terrain,
    zonal::{aggregate, retain_min_suitable_area},
    zone::Zone,
};
use geo::{BoundingRect, Coord, Rect};
use log::{debug, info};
use raster::{Crs, GridSpec, Raster, RasterError};
use std::time::Instant;

/// Everything a run produces, every raster on the same grid.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Elevation clipped to the processing mask.
    pub elevation: Raster,

    /// Slope in degrees.
    pub slope: Raster,

    /// Insolation of each configured day.
    pub daily: Vec<DailyInsolation>,

    /// Average of `daily`.
    pub irradiance: Raster,

    /// `irradiance` restricted to suitable rooftop cells.
    pub suitable: Raster,

    /// Buildings that have enough suitable area, by id.
    pub buildings: Vec<ZoneReport>,

    pub neighborhood: ZoneReport,
}

/// Runs every stage from raw elevation to energy estimates.
pub struct Pipeline;

impl Pipeline {
    pub fn builder<'a>() -> PipelineBuilder<'a> {
        PipelineBuilder {
            config: Config::default(),
            elevation: None,
            boundary: None,
            mask: None,
            buildings: None,
        }
    }
}

pub struct PipelineBuilder<'a> {
    /// Run configuration (defaults to [Config::default]).
    config: Config,

    /// Raw elevation surface (required).
    elevation: Option<&'a Raster>,

    /// Neighborhood zone (required).
    boundary: Option<&'a Zone>,

    /// Processing mask (defaults to the boundary).
    mask: Option<&'a Zone>,

    /// Building footprints (required).
    buildings: Option<&'a [Zone]>,
}

impl<'a> PipelineBuilder<'a> {
    /// Run configuration (defaults to [Config::default]).
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Raw elevation surface (required).
    #[must_use]
    pub fn elevation(mut self, elevation: &'a Raster) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Neighborhood zone (required).
    #[must_use]
    pub fn boundary(mut self, boundary: &'a Zone) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Processing mask (defaults to the boundary).
    ///
    /// Elevation outside the mask is nodata and casts no shade. A mask
    /// wider than the neighborhood lets surrounding terrain shade
    /// roofs near its edge.
    #[must_use]
    pub fn mask(mut self, mask: &'a Zone) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Building footprints (required).
    #[must_use]
    pub fn buildings(mut self, buildings: &'a [Zone]) -> Self {
        self.buildings = Some(buildings);
        self
    }

    pub fn run(&self) -> Result<PipelineOutput, RooftopError> {
        let raw = self.elevation.ok_or(RooftopError::Builder("elevation"))?;
        let boundary = self.boundary.ok_or(RooftopError::Builder("boundary"))?;
        let buildings = self.buildings.ok_or(RooftopError::Builder("buildings"))?;
        let mask = self.mask.unwrap_or(boundary);
        let cfg = &self.config;
        cfg.validate()?;

        let run_start = Instant::now();

        let (elevation, clip_runtime) = {
            let now = Instant::now();
            let target = processing_grid(raw, mask, cfg)?;
            let elevation = clip(raw, mask.geometry(), &target, cfg.grid.nodata)?;
            (elevation, now.elapsed())
        };
        info!(
            "elevation; dim: {:?}, cell_size: {}, valid cells: {}",
            elevation.dim(),
            elevation.spec().cell_size,
            elevation.valid_count()
        );

        let (slope, daily, irradiance, solar_runtime) = {
            let now = Instant::now();
            let slope = terrain::slope(&elevation, cfg.terrain.z_factor)?;
            let daily = insolation_by_day(&elevation, &cfg.solar, &cfg.terrain)?;
            let rasters: Vec<Raster> = daily.iter().map(|day| day.raster.clone()).collect();
            let irradiance = average(&rasters)?;
            (slope, daily, irradiance, now.elapsed())
        };
        if let Some(summary) = irradiance.summary() {
            info!(
                "irradiance; days: {:?}, min: {}, mean: {:.1}, max: {}",
                cfg.solar.days, summary.min, summary.mean, summary.max
            );
        }

        let (suitable, suitability_runtime) = {
            let now = Instant::now();
            let suitable =
                filter_suitable_with_slope(&irradiance, &slope, buildings, &cfg.suitability)?;
            (suitable, now.elapsed())
        };

        let ((buildings, neighborhood), zonal_runtime) = {
            let now = Instant::now();
            let cell_area = suitable.spec().cell_area();

            let selected = select_buildings(buildings, cfg.suitability.min_building_area);
            let building_stats = retain_min_suitable_area(
                aggregate(&suitable, &selected, cell_area)?,
                cfg.zonal.min_area_threshold,
            );
            let building_energy = estimate_energy(&building_stats, &cfg.energy)?;
            let buildings = join(&selected, &building_stats, &building_energy);

            let hood = std::slice::from_ref(boundary);
            let stats = aggregate(&suitable, hood, cell_area)?;
            let energy = estimate_energy(&stats, &cfg.energy)?;
            let empty = || {
                let id = Some(boundary.id());
                RooftopError::geometry(id, Stage::ZonalStats, GeometryIssue::Empty)
            };
            let neighborhood = join(hood, &stats, &energy).pop().ok_or_else(empty)?;
            ((buildings, neighborhood), now.elapsed())
        };
        info!(
            "zones; buildings reported: {}, neighborhood suitable area: {:.1}",
            buildings.len(),
            neighborhood.suitable_area
        );

        debug!(
            "pipeline; clip: {:?}, solar: {:?}, suitability: {:?}, zonal: {:?}, total: {:?}",
            clip_runtime,
            solar_runtime,
            suitability_runtime,
            zonal_runtime,
            run_start.elapsed()
        );

        Ok(PipelineOutput {
            elevation,
            slope,
            daily,
            irradiance,
            suitable,
            buildings,
            neighborhood,
        })
    }
}

/// Grid the run computes on: the configured extent (or the mask's
/// bounding box) snapped to the raw elevation lattice.
fn processing_grid(raw: &Raster, mask: &Zone, cfg: &Config) -> Result<GridSpec, RooftopError> {
    if let Some(crs) = &cfg.grid.crs {
        let expected = Crs::new(crs.as_str());
        if raw.spec().crs != expected {
            return Err(RooftopError::Alignment {
                stage: Stage::ElevationClip,
                source: RasterError::Alignment {
                    what: "crs",
                    left: raw.spec().crs.to_string(),
                    right: expected.to_string(),
                },
            });
        }
    }

    let bounds = match cfg.grid.extent {
        Some([xmin, ymin, xmax, ymax]) => {
            Rect::new(Coord { x: xmin, y: ymin }, Coord { x: xmax, y: ymax })
        }
        None => mask.geometry().bounding_rect().ok_or_else(|| {
            let id = Some(mask.id());
            RooftopError::geometry(id, Stage::ElevationClip, GeometryIssue::Empty)
        })?,
    };
    let cell_size = cfg.grid.cell_size.unwrap_or(raw.spec().cell_size);
    Ok(GridSpec::covering(bounds, raw.spec(), cell_size)?)
}
