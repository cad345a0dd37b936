//! Keyed join of zones, their statistics and their energy yield.

use crate::{
    energy::EnergyResult,
    zonal::ZoneStats,
    zone::{Zone, ZoneId},
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One output row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneReport {
    pub zone_id: ZoneId,
    pub zone_area: f64,
    pub cell_count: usize,
    pub suitable_area: f64,
    pub mean_irradiance: Option<f64>,
    pub min_irradiance: Option<f64>,
    pub max_irradiance: Option<f64>,
    pub daily_energy_per_sqm: Option<f64>,
    pub daily_energy_total_kwh: Option<f64>,
}

impl ZoneReport {
    pub fn new(zone: &Zone, stats: &ZoneStats, energy: Option<&EnergyResult>) -> Self {
        Self {
            zone_id: zone.id().clone(),
            zone_area: zone.area(),
            cell_count: stats.cell_count,
            suitable_area: stats.suitable_area,
            mean_irradiance: stats.mean_irradiance,
            min_irradiance: stats.min_irradiance,
            max_irradiance: stats.max_irradiance,
            daily_energy_per_sqm: energy.and_then(|e| e.daily_energy_per_sqm),
            daily_energy_total_kwh: energy.and_then(|e| e.daily_energy_total_kwh),
        }
    }
}

/// Returns one report per zone that has statistics, in zone id order.
///
/// Zones without statistics are left out; statistics without a
/// matching zone are ignored.
pub fn join(
    zones: &[Zone],
    stats: &BTreeMap<ZoneId, ZoneStats>,
    energy: &BTreeMap<ZoneId, EnergyResult>,
) -> Vec<ZoneReport> {
    let by_id: HashMap<&ZoneId, &Zone> = zones.iter().map(|zone| (zone.id(), zone)).collect();
    stats
        .iter()
        .filter_map(|(id, stats)| {
            let zone = by_id.get(id)?;
            Some(ZoneReport::new(zone, stats, energy.get(id)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::join;
    use crate::{
        config::EnergyConfig,
        energy::estimate_energy,
        zonal::ZoneStats,
        zone::{Zone, ZoneId},
    };
    use approx::assert_relative_eq;
    use geo::polygon;
    use std::collections::BTreeMap;

    fn zone(id: &str) -> Zone {
        Zone::new(id, polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ], None)
        .unwrap()
    }

    #[test]
    fn test_join() {
        let zones = vec![zone("b"), zone("a"), zone("c")];
        let mut stats = BTreeMap::new();
        stats.insert(
            ZoneId::from("b"),
            ZoneStats {
                cell_count: 50,
                suitable_area: 50.0,
                mean_irradiance: Some(3000.0),
                min_irradiance: Some(2500.0),
                max_irradiance: Some(3500.0),
            },
        );
        stats.insert(
            ZoneId::from("a"),
            ZoneStats {
                cell_count: 0,
                suitable_area: 0.0,
                mean_irradiance: None,
                min_irradiance: None,
                max_irradiance: None,
            },
        );
        let energy = estimate_energy(&stats, &EnergyConfig::default()).unwrap();

        let reports = join(&zones, &stats, &energy);
        let ids: Vec<&str> = reports.iter().map(|r| r.zone_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(reports[0].daily_energy_total_kwh, None);
        assert_relative_eq!(reports[1].zone_area, 100.0);
        assert_relative_eq!(
            reports[1].daily_energy_total_kwh.unwrap(),
            19.35,
            epsilon = 1e-9
        );

        // Inputs are untouched and the join is repeatable.
        assert_eq!(join(&zones, &stats, &energy), reports);
    }

    #[test]
    fn test_report_serializes_nulls() {
        let zones = vec![zone("x")];
        let mut stats = BTreeMap::new();
        stats.insert(
            ZoneId::from("x"),
            ZoneStats {
                cell_count: 0,
                suitable_area: 0.0,
                mean_irradiance: None,
                min_irradiance: None,
                max_irradiance: None,
            },
        );
        let reports = join(&zones, &stats, &BTreeMap::new());
        let json = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(json["zone_id"], "x");
        assert!(json["mean_irradiance"].is_null());
        assert!(json["daily_energy_per_sqm"].is_null());
    }
}
