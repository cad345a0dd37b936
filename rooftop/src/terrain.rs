//! Slope and aspect of an elevation surface.
//!
//! Both use Horn's weighted 3×3 finite difference. Neighbours that
//! are nodata or fall off the grid take the centre cell's value.

use crate::{error::RooftopError, math::normalize_degrees};
use ndarray::{Array2, Zip};
use raster::Raster;

/// Aspect written for flat cells.
pub const FLAT_ASPECT: f32 = -1.0;

/// Local surface orientation of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    /// Steepest descent angle from horizontal, in radians.
    pub slope: f64,

    /// Compass direction of steepest descent, in radians clockwise
    /// from north. Zero on flat cells.
    pub aspect: f64,
}

impl Gradient {
    pub const FLAT: Self = Self {
        slope: 0.0,
        aspect: 0.0,
    };

    /// Returns the cosine of the angle between this surface's normal
    /// and a ray from `zenith`/`azimuth` (radians), clamped at zero.
    pub fn incidence(&self, zenith: f64, azimuth: f64) -> f64 {
        let cos_i = zenith.cos() * self.slope.cos()
            + zenith.sin() * self.slope.sin() * (azimuth - self.aspect).cos();
        cos_i.max(0.0)
    }
}

/// Returns the gradient at `(row, col)`, or `None` if the cell is
/// nodata.
#[allow(clippy::many_single_char_names)]
pub fn gradient(elevation: &Raster, row: usize, col: usize, z_factor: f64) -> Option<Gradient> {
    let e = f64::from(elevation.get(row, col)?);
    let (rows, cols) = elevation.dim();
    let at = |dr: isize, dc: isize| -> f64 {
        let r = row.checked_add_signed(dr).filter(|r| *r < rows);
        let c = col.checked_add_signed(dc).filter(|c| *c < cols);
        match (r, c) {
            (Some(r), Some(c)) => elevation.get(r, c).map_or(e, f64::from),
            _ => e,
        }
    };

    let a = at(-1, -1);
    let b = at(-1, 0);
    let c = at(-1, 1);
    let d = at(0, -1);
    let f = at(0, 1);
    let g = at(1, -1);
    let h = at(1, 0);
    let i = at(1, 1);

    let cell_size = elevation.spec().cell_size;
    let east = ((c + 2.0 * f + i) - (a + 2.0 * d + g)) / (8.0 * cell_size);
    let north = ((a + 2.0 * b + c) - (g + 2.0 * h + i)) / (8.0 * cell_size);

    let rise = z_factor * east.hypot(north);
    if rise == 0.0 {
        return Some(Gradient::FLAT);
    }
    let aspect = normalize_degrees((-east).atan2(-north).to_degrees());
    Some(Gradient {
        slope: rise.atan(),
        aspect: aspect.to_radians(),
    })
}

/// Computes the gradient of every cell.
pub fn gradients(elevation: &Raster, z_factor: f64) -> Array2<Option<Gradient>> {
    let mut out = Array2::from_elem(elevation.dim(), None);
    Zip::indexed(&mut out).par_for_each(|(row, col), grad| {
        *grad = gradient(elevation, row, col, z_factor);
    });
    out
}

/// Slope in degrees.
pub fn slope(elevation: &Raster, z_factor: f64) -> Result<Raster, RooftopError> {
    check_z_factor(z_factor)?;
    let nodata = elevation.nodata();
    let data = gradients(elevation, z_factor).mapv(|grad| {
        grad.map_or(nodata, |grad| grad.slope.to_degrees() as f32)
    });
    let out = elevation.with_data(data)?;
    log::debug!("slope; valid cells: {}", out.valid_count());
    Ok(out)
}

/// Aspect in degrees clockwise from north, [FLAT_ASPECT] where the
/// surface is level.
pub fn aspect(elevation: &Raster, z_factor: f64) -> Result<Raster, RooftopError> {
    check_z_factor(z_factor)?;
    let nodata = elevation.nodata();
    let data = gradients(elevation, z_factor).mapv(|grad| match grad {
        None => nodata,
        Some(grad) if grad.slope == 0.0 => FLAT_ASPECT,
        Some(grad) => grad.aspect.to_degrees() as f32,
    });
    Ok(elevation.with_data(data)?)
}

fn check_z_factor(z_factor: f64) -> Result<(), RooftopError> {
    if z_factor.is_finite() && z_factor > 0.0 {
        Ok(())
    } else {
        Err(RooftopError::config(
            "z_factor",
            z_factor,
            "must be positive",
        ))
    }
}
