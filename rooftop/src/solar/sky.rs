use crate::{config::DiffuseModel, math::linspace};

/// One zenith × azimuth cell of the sky dome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkySector {
    /// Zenith angle of the sector's centroid, in degrees.
    pub zenith: f64,

    /// Azimuth of the sector's centroid, degrees clockwise from north.
    pub azimuth: f64,

    /// Share of diffuse radiation arriving from this sector.
    pub weight: f64,
}

impl SkySector {
    pub fn altitude(&self) -> f64 {
        90.0 - self.zenith
    }
}

/// The upper hemisphere split into sectors of equal zenith and
/// azimuth extent.
#[derive(Debug, Clone, PartialEq)]
pub struct SkyDome {
    sectors: Vec<SkySector>,
}

impl SkyDome {
    /// Sector weights sum to one for either model.
    pub fn new(zenith_divisions: u32, azimuth_divisions: u32, model: DiffuseModel) -> Self {
        let (bands, per_band) = (zenith_divisions as usize, azimuth_divisions as usize);
        let azimuth_step = 360.0 / f64::from(azimuth_divisions);
        let edges: Vec<f64> = linspace(0.0, 90.0, bands + 1).collect();
        let mut sectors = Vec::with_capacity(bands.saturating_mul(per_band));
        for band in edges.windows(2) {
            let (cos1, cos2) = (band[0].to_radians().cos(), band[1].to_radians().cos());
            let weight = match model {
                DiffuseModel::UniformOvercast => (cos1 - cos2) / f64::from(azimuth_divisions),
                DiffuseModel::StandardOvercast => {
                    let band = (cos1 - cos2) + (cos1 * cos1 - cos2 * cos2);
                    band / (2.0 * f64::from(azimuth_divisions))
                }
            };
            let zenith = (band[0] + band[1]) / 2.0;
            sectors.extend((0..azimuth_divisions).map(|k| SkySector {
                zenith,
                azimuth: (f64::from(k) + 0.5) * azimuth_step,
                weight,
            }));
        }
        Self { sectors }
    }

    pub fn sectors(&self) -> &[SkySector] {
        &self.sectors
    }
}
