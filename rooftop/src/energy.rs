use crate::{config::EnergyConfig, error::RooftopError, zonal::ZoneStats, zone::ZoneId};
use serde::Serialize;
use std::collections::BTreeMap;

/// Daily energy yield of one zone.
///
/// Both fields are `None` for zones without suitable area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyResult {
    /// Wh per m² of panel per day.
    pub daily_energy_per_sqm: Option<f64>,

    /// kWh per day over the zone's whole suitable area.
    pub daily_energy_total_kwh: Option<f64>,
}

impl EnergyResult {
    pub fn from_stats(stats: &ZoneStats, cfg: &EnergyConfig) -> Self {
        let per_sqm = stats
            .mean_irradiance
            .map(|mean| mean * cfg.panel_efficiency * cfg.system_derate);
        Self {
            daily_energy_per_sqm: per_sqm,
            daily_energy_total_kwh: per_sqm.map(|e| e * stats.suitable_area / 1000.0),
        }
    }
}

pub fn estimate_energy(
    stats: &BTreeMap<ZoneId, ZoneStats>,
    cfg: &EnergyConfig,
) -> Result<BTreeMap<ZoneId, EnergyResult>, RooftopError> {
    cfg.validate()?;
    Ok(stats
        .iter()
        .map(|(id, stats)| (id.clone(), EnergyResult::from_stats(stats, cfg)))
        .collect())
}
