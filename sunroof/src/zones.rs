use anyhow::{anyhow, bail, Context, Result};
use geo::{geometry::MultiPolygon, BooleanOps, Geometry};
use geojson::{feature::Id, Feature, GeoJson, JsonValue};
use rooftop::{Zone, ZoneId};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

/// Reads every polygonal feature in a GeoJSON file as a zone.
pub fn open_zones(path: &Path) -> Result<Vec<Zone>> {
    let file = File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    read_zones(BufReader::new(file))
        .with_context(|| format!("reading {}", path.display()))
}

/// Reads a GeoJSON file as a single zone, the union of all its
/// features.
pub fn open_boundary(path: &Path, id: &str) -> Result<Zone> {
    let file = File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    read_boundary(BufReader::new(file), id)
        .with_context(|| format!("reading {}", path.display()))
}

/// Zone id is the feature id, else its `OBJECTID` property, else its
/// 1-based position. A `Shape_Area` property overrides the computed
/// area. Two features resolving to the same id are rejected.
pub fn read_zones<R: Read>(reader: R) -> Result<Vec<Zone>> {
    let mut positions: HashMap<ZoneId, usize> = HashMap::new();
    features(reader)?
        .into_iter()
        .enumerate()
        .map(|(idx, feature)| {
            let position = idx + 1;
            let id = feature_id(&feature, position);
            if let Some(first) = positions.insert(id.clone(), position) {
                bail!("features {first} and {position} both have zone id {id}");
            }
            let area = feature.property("Shape_Area").and_then(JsonValue::as_f64);
            let geometry = multi_polygon(feature)
                .with_context(|| format!("zone {id}"))?;
            Ok(Zone::new(id, geometry, area)?)
        })
        .collect()
}

pub fn read_boundary<R: Read>(reader: R, id: &str) -> Result<Zone> {
    let mut parts = features(reader)?.into_iter().map(multi_polygon);
    let mut geometry = parts
        .next()
        .ok_or_else(|| anyhow!("boundary has no features"))??;
    for part in parts {
        geometry = geometry.union(&part?);
    }
    Ok(Zone::new(id, geometry, None)?)
}

fn features<R: Read>(reader: R) -> Result<Vec<Feature>> {
    Ok(match GeoJson::from_reader(reader)? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    })
}

fn feature_id(feature: &Feature, index: usize) -> ZoneId {
    match &feature.id {
        Some(Id::String(id)) => ZoneId::from(id.as_str()),
        Some(Id::Number(id)) => ZoneId::from(id.to_string()),
        None => match feature.property("OBJECTID") {
            Some(JsonValue::String(id)) => ZoneId::from(id.as_str()),
            Some(JsonValue::Number(id)) => ZoneId::from(id.to_string()),
            _ => ZoneId::from(index as u64),
        },
    }
}

fn multi_polygon(feature: Feature) -> Result<MultiPolygon<f64>> {
    let geometry = feature
        .geometry
        .ok_or_else(|| anyhow!("feature has no geometry"))?;
    match Geometry::<f64>::try_from(geometry)? {
        Geometry::Polygon(polygon) => Ok(polygon.into()),
        Geometry::MultiPolygon(multi) => Ok(multi),
        _ => Err(anyhow!(
            "only Polygon and MultiPolygon features are supported"
        )),
    }
}
