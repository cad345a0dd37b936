use crate::math::elevation_angle;
use ndarray::{Array3, Axis, Zip};
use raster::Raster;

/// Per-cell horizon angles in a fixed set of evenly spaced azimuths.
#[derive(Debug, Clone)]
pub struct HorizonMap {
    directions: usize,

    /// Degrees above horizontal, indexed by `[row, col, direction]`.
    angles: Array3<f32>,
}

impl HorizonMap {
    /// Marches outward from every cell in `directions` azimuths,
    /// one cell per step, up to `search_distance` map units, and
    /// records the steepest upward angle seen.
    ///
    /// Nodata cells along the way are skipped and the march stops at
    /// the grid edge. Angles are never negative.
    pub fn compute(elevation: &Raster, directions: usize, search_distance: f64) -> Self {
        let (rows, cols) = elevation.dim();
        let mut angles = Array3::<f32>::zeros((rows, cols, directions));
        if directions == 0 {
            return Self { directions, angles };
        }

        let cell_size = elevation.spec().cell_size;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_steps = (search_distance / cell_size).floor() as usize;
        #[allow(clippy::cast_precision_loss)]
        let unit_steps: Vec<(f64, f64)> = (0..directions)
            .map(|k| {
                let azimuth = (k as f64 * 360.0 / directions as f64).to_radians();
                // (rows south, cols east) per step.
                (-azimuth.cos(), azimuth.sin())
            })
            .collect();

        Zip::indexed(angles.lanes_mut(Axis(2))).par_for_each(|(row, col), mut lane| {
            let Some(z0) = elevation.get(row, col) else {
                return;
            };
            for (angle, &(d_row, d_col)) in lane.iter_mut().zip(&unit_steps) {
                let mut steepest = 0.0_f64;
                for step in 1..=max_steps {
                    #[allow(clippy::cast_precision_loss)]
                    let s = step as f64;
                    let r = (row as f64 + s * d_row).round();
                    let c = (col as f64 + s * d_col).round();
                    #[allow(clippy::cast_precision_loss)]
                    if r < 0.0 || c < 0.0 || r >= rows as f64 || c >= cols as f64 {
                        break;
                    }
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let Some(z) = elevation.get(r as usize, c as usize) else {
                        continue;
                    };
                    let rise = f64::from(z) - f64::from(z0);
                    steepest = steepest.max(elevation_angle(rise, s * cell_size));
                }
                *angle = steepest as f32;
            }
        });

        Self { directions, angles }
    }

    pub fn directions(&self) -> usize {
        self.directions
    }

    /// Horizon angle in degrees at `(row, col)` towards `azimuth`
    /// (degrees clockwise from north), linearly interpolated between
    /// the two nearest computed directions.
    pub fn angle(&self, row: usize, col: usize, azimuth: f64) -> f64 {
        if self.directions == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let position = azimuth.rem_euclid(360.0) / (360.0 / self.directions as f64);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let lower = (position.floor() as usize) % self.directions;
        let upper = (lower + 1) % self.directions;
        let frac = position - position.floor();
        let a = f64::from(self.angles[[row, col, lower]]);
        let b = f64::from(self.angles[[row, col, upper]]);
        a + (b - a) * frac
    }

    /// Returns true if a ray `altitude` degrees above horizontal
    /// towards `azimuth` clears the terrain.
    pub fn is_visible(&self, row: usize, col: usize, azimuth: f64, altitude: f64) -> bool {
        altitude > self.angle(row, col, azimuth)
    }
}
