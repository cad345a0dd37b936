//! Zones: identified polygons that rasters are aggregated over.

use crate::error::{GeometryIssue, RooftopError, Stage};
use geo::{
    algorithm::line_intersection::line_intersection,
    geometry::{Line, LineString, MultiPolygon, Polygon},
    Area, BoundingRect, Contains,
};
use raster::{GridSpec, C};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique zone identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(String);

impl ZoneId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ZoneId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ZoneId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for ZoneId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A validated polygon zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    id: ZoneId,
    geometry: MultiPolygon<C>,
    area: f64,
}

impl Zone {
    /// Validates `geometry` and builds a zone.
    ///
    /// `area` is the zone's recorded area; when `None` the planar
    /// area of `geometry` is used.
    pub fn new(
        id: impl Into<ZoneId>,
        geometry: impl Into<MultiPolygon<C>>,
        area: Option<f64>,
    ) -> Result<Self, RooftopError> {
        let id = id.into();
        let geometry = geometry.into();
        validate_geometry(&geometry)
            .map_err(|issue| RooftopError::geometry(Some(&id), Stage::Input, issue))?;
        let area = match area {
            Some(area) if !area.is_finite() => {
                return Err(RooftopError::geometry(
                    Some(&id),
                    Stage::Input,
                    GeometryIssue::NonFinite,
                ));
            }
            Some(area) if area <= 0.0 => {
                return Err(RooftopError::geometry(
                    Some(&id),
                    Stage::Input,
                    GeometryIssue::ZeroArea,
                ));
            }
            Some(area) => area,
            None => geometry.unsigned_area(),
        };
        Ok(Self { id, geometry, area })
    }

    pub fn id(&self) -> &ZoneId {
        &self.id
    }

    pub fn geometry(&self) -> &MultiPolygon<C> {
        &self.geometry
    }

    pub fn area(&self) -> f64 {
        self.area
    }

    /// Returns the cells of `spec` whose centers lie inside this
    /// zone, in row-major order.
    pub fn cells(&self, spec: &GridSpec) -> Vec<(usize, usize)> {
        cells_within(&self.geometry, spec)
    }
}

/// Returns the cells of `spec` whose centers lie inside `geometry`.
pub(crate) fn cells_within(geometry: &MultiPolygon<C>, spec: &GridSpec) -> Vec<(usize, usize)> {
    let Some((rows, cols)) = geometry.bounding_rect().and_then(|rect| spec.window(rect)) else {
        return Vec::new();
    };
    rows.flat_map(|row| cols.clone().map(move |col| (row, col)))
        .filter(|&(row, col)| geometry.contains(&spec.cell_center(row, col)))
        .collect()
}

/// Checks that `geometry` is a usable zone.
pub fn validate_geometry(geometry: &MultiPolygon<C>) -> Result<(), GeometryIssue> {
    if geometry.0.is_empty() {
        return Err(GeometryIssue::Empty);
    }
    for polygon in &geometry.0 {
        validate_polygon(polygon)?;
    }
    if geometry.unsigned_area() <= 0.0 {
        return Err(GeometryIssue::ZeroArea);
    }
    Ok(())
}

fn validate_polygon(polygon: &Polygon<C>) -> Result<(), GeometryIssue> {
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        if ring.0.iter().any(|coord| !(coord.x.is_finite() && coord.y.is_finite())) {
            return Err(GeometryIssue::NonFinite);
        }
        // Closed rings repeat their first point.
        if ring.0.len() < 4 {
            return Err(GeometryIssue::TooFewPoints);
        }
        if self_intersects(ring) {
            return Err(GeometryIssue::SelfIntersecting);
        }
    }
    Ok(())
}

/// Returns true if two non-adjacent edges of the closed `ring` touch.
fn self_intersects(ring: &LineString<C>) -> bool {
    // Repeated vertices only add zero-length edges.
    let mut coords = ring.0.clone();
    coords.dedup();
    let edges: Vec<Line<C>> = coords
        .windows(2)
        .map(|pair| Line::new(pair[0], pair[1]))
        .collect();
    let n = edges.len();
    for i in 0..n {
        for j in (i + 2)..n {
            // First and last edges share the closing vertex.
            if i == 0 && j == n - 1 {
                continue;
            }
            if line_intersection(edges[i], edges[j]).is_some() {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::{validate_geometry, Zone, ZoneId};
    use crate::{GeometryIssue, RooftopError, Stage};
    use approx::assert_relative_eq;
    use geo::{
        geometry::{Coord, MultiPolygon, Polygon},
        polygon,
    };
    use raster::{Crs, GridSpec};

    fn square(x: f64, y: f64, side: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + side, y: y),
            (x: x + side, y: y + side),
            (x: x, y: y + side),
        ]
    }

    #[test]
    fn test_computed_and_recorded_area() {
        let zone = Zone::new("a", square(0.0, 0.0, 3.0), None).unwrap();
        assert_relative_eq!(zone.area(), 9.0);
        let zone = Zone::new(7_u64, square(0.0, 0.0, 3.0), Some(8.5)).unwrap();
        assert_eq!(zone.id(), &ZoneId::from("7"));
        assert_relative_eq!(zone.area(), 8.5);
    }

    #[test]
    fn test_cells() {
        let (origin, crs) = (Coord { x: 0.0, y: 10.0 }, Crs::unknown());
        let spec = GridSpec::new(origin, 1.0, 10, 10, crs).unwrap();
        // Covers x in [2, 5), y in [6, 8): rows 2..4, cols 2..5.
        let zone = Zone::new(
            "b",
            polygon![
                (x: 2.0, y: 6.0),
                (x: 5.0, y: 6.0),
                (x: 5.0, y: 8.0),
                (x: 2.0, y: 8.0),
            ],
            None,
        )
        .unwrap();
        let cells = zone.cells(&spec);
        assert_eq!(cells.len(), 6);
        assert_eq!(cells.first(), Some(&(2, 2)));
        assert_eq!(cells.last(), Some(&(3, 4)));

        let far = Zone::new("c", square(50.0, 50.0, 2.0), None).unwrap();
        assert!(far.cells(&spec).is_empty());
    }

    #[test]
    fn test_geometry_issues() {
        assert_eq!(
            validate_geometry(&MultiPolygon::new(vec![])),
            Err(GeometryIssue::Empty)
        );

        let line = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert_eq!(
            validate_geometry(&MultiPolygon::new(vec![line])),
            Err(GeometryIssue::TooFewPoints)
        );

        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        assert_eq!(
            validate_geometry(&MultiPolygon::new(vec![flat])),
            Err(GeometryIssue::ZeroArea)
        );

        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
        ];
        assert_eq!(
            validate_geometry(&MultiPolygon::new(vec![bowtie])),
            Err(GeometryIssue::SelfIntersecting)
        );

        let nan = polygon![(x: 0.0, y: 0.0), (x: f64::NAN, y: 0.0), (x: 1.0, y: 1.0)];
        assert_eq!(
            validate_geometry(&MultiPolygon::new(vec![nan])),
            Err(GeometryIssue::NonFinite)
        );

        let unit = MultiPolygon::new(vec![square(0.0, 0.0, 1.0)]);
        assert!(validate_geometry(&unit).is_ok());
    }

    #[test]
    fn test_repeated_vertex_is_valid() {
        let footprint = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ];
        assert_eq!(
            validate_geometry(&MultiPolygon::new(vec![footprint.clone()])),
            Ok(())
        );
        let zone = Zone::new("e", footprint, None).unwrap();
        assert_relative_eq!(zone.area(), 100.0);

        // Still caught when the crossing edges sit next to a repeat.
        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
        ];
        assert_eq!(
            validate_geometry(&MultiPolygon::new(vec![bowtie])),
            Err(GeometryIssue::SelfIntersecting)
        );
    }

    #[test]
    fn test_invalid_zone_reports_id() {
        let empty = MultiPolygon::<f64>::new(vec![]);
        let err = Zone::new("d", empty, None).unwrap_err();
        assert!(matches!(
            err,
            RooftopError::Geometry {
                zone: Some(ref id),
                stage: Stage::Input,
                reason: GeometryIssue::Empty,
            } if id.as_str() == "d"
        ));
    }
}
