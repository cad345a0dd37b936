//! Crops a raw elevation surface to the processing grid.

use crate::{
    error::{GeometryIssue, RooftopError, Stage},
    zone::validate_geometry,
};
use geo::{geometry::MultiPolygon, BoundingRect, Contains, Intersects};
use ndarray::{Array2, Zip};
use raster::{GridSpec, Raster, RasterError, C};

/// Resamples `raw` onto `target`, keeping only cells whose centers lie
/// inside `boundary`.
///
/// Each output cell takes the value of the raw cell containing its
/// center. Cells outside `boundary`, outside `raw`, or over raw
/// nodata are set to `nodata`.
pub fn clip(
    raw: &Raster,
    boundary: &MultiPolygon<C>,
    target: &GridSpec,
    nodata: f32,
) -> Result<Raster, RooftopError> {
    validate_geometry(boundary)
        .map_err(|issue| RooftopError::geometry(None, Stage::ElevationClip, issue))?;
    if raw.spec().crs != target.crs {
        return Err(RooftopError::Alignment {
            stage: Stage::ElevationClip,
            source: RasterError::Alignment {
                what: "crs",
                left: raw.spec().crs.to_string(),
                right: target.crs.to_string(),
            },
        });
    }
    let Some(bounds) = boundary.bounding_rect() else {
        return Err(RooftopError::geometry(
            None,
            Stage::ElevationClip,
            GeometryIssue::Empty,
        ));
    };

    let mut data = Array2::from_elem(target.dim(), nodata);
    Zip::indexed(&mut data).par_for_each(|(row, col), value| {
        let center = target.cell_center(row, col);
        if !bounds.intersects(&center) || !boundary.contains(&center) {
            return;
        }
        if let Some(v) = raw
            .spec()
            .cell_of(center.0)
            .and_then(|(r, c)| raw.get(r, c))
        {
            *value = v;
        }
    });

    let clipped = Raster::new(target.clone(), nodata, data)?;
    log::debug!(
        "clip; raw: {:?}, target: {:?}, valid cells: {}",
        raw.dim(),
        target.dim(),
        clipped.valid_count()
    );
    Ok(clipped)
}

#[cfg(test)]
mod tests {
    use super::clip;
    use crate::{GeometryIssue, RooftopError, Stage};
    use geo::{
        geometry::{Coord, MultiPolygon},
        polygon, Rect,
    };
    use ndarray::Array2;
    use raster::{Crs, GridSpec, Raster};

    fn raw() -> Raster {
        let (origin, crs) = (Coord { x: 0.0, y: 10.0 }, Crs::new("EPSG:2248"));
        let spec = GridSpec::new(origin, 1.0, 10, 10, crs).unwrap();
        #[allow(clippy::cast_precision_loss)]
        let data = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f32);
        Raster::new(spec, -9999.0, data).unwrap()
    }

    fn boundary() -> MultiPolygon<f64> {
        polygon![
            (x: 2.0, y: 2.0),
            (x: 6.0, y: 2.0),
            (x: 6.0, y: 6.0),
            (x: 2.0, y: 6.0),
        ]
        .into()
    }

    #[test]
    fn test_crop_to_boundary() {
        let raw = raw();
        let bounds = Rect::new(Coord { x: 1.0, y: 1.0 }, Coord { x: 7.0, y: 7.0 });
        let target = GridSpec::covering(bounds, raw.spec(), 1.0).unwrap();
        let clipped = clip(&raw, &boundary(), &target, -1.0).unwrap();
        assert_eq!(clipped.dim(), (6, 6));
        assert_eq!(clipped.nodata(), -1.0);
        // 4x4 cells fall inside the boundary.
        assert_eq!(clipped.valid_count(), 16);
        // Target (1, 1) has its center at (2.5, 5.5): raw row 4, col 2.
        assert_eq!(clipped.get(1, 1), Some(42.0));
        assert_eq!(clipped.get(0, 0), None);
    }

    #[test]
    fn test_target_beyond_raw_extent() {
        let raw = raw();
        let bounds = Rect::new(Coord { x: 8.0, y: 0.0 }, Coord { x: 12.0, y: 4.0 });
        let target = GridSpec::covering(bounds, raw.spec(), 1.0).unwrap();
        let wide: MultiPolygon<f64> = polygon![
            (x: 8.0, y: 0.0),
            (x: 12.0, y: 0.0),
            (x: 12.0, y: 4.0),
            (x: 8.0, y: 4.0),
        ]
        .into();
        let clipped = clip(&raw, &wide, &target, -9999.0).unwrap();
        // Only columns 8 and 9 are covered by the raw grid.
        assert_eq!(clipped.valid_count(), 8);
    }

    #[test]
    fn test_crs_mismatch() {
        let raw = raw();
        let mut target = raw.spec().clone();
        target.crs = Crs::new("EPSG:4326");
        assert!(matches!(
            clip(&raw, &boundary(), &target, -9999.0),
            Err(RooftopError::Alignment {
                stage: Stage::ElevationClip,
                ..
            })
        ));
    }

    #[test]
    fn test_degenerate_boundary() {
        let raw = raw();
        assert!(matches!(
            clip(&raw, &MultiPolygon::new(vec![]), raw.spec(), -9999.0),
            Err(RooftopError::Geometry {
                zone: None,
                stage: Stage::ElevationClip,
                reason: GeometryIssue::Empty,
            })
        ));
    }
}
