use crate::{RasterError, C};
use geo::geometry::{Coord, Point, Rect};
use std::{fmt, ops::Range};

/// Relative tolerance used when comparing grid geometry.
const GEOMETRY_EPSILON: C = 1e-9;

/// Opaque coordinate reference system identifier, e.g. `EPSG:2248`.
///
/// No reprojection is ever performed; two grids are compatible only
/// if their identifiers are equal. The empty identifier means
/// "unknown" and only matches another unknown CRS.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("<unknown>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Georeferencing of a north-up grid of square cells.
///
/// Row 0 is the northern-most row, column 0 the western-most column.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// Upper-left (north-west) corner of the grid.
    pub origin: Coord<C>,

    /// Side length of one cell in map units.
    pub cell_size: C,

    /// Number of rows (north to south).
    pub rows: usize,

    /// Number of columns (west to east).
    pub cols: usize,

    pub crs: Crs,
}

impl GridSpec {
    pub fn new(
        origin: Coord<C>,
        cell_size: C,
        rows: usize,
        cols: usize,
        crs: Crs,
    ) -> Result<Self, RasterError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RasterError::CellSize(cell_size));
        }
        Ok(Self {
            origin,
            cell_size,
            rows,
            cols,
            crs,
        })
    }

    /// Returns the smallest grid with `cell_size` cells covering
    /// `bounds`, snapped outward to `snap_to`'s lattice.
    ///
    /// The lattice is anchored at `snap_to.origin`, so when
    /// `cell_size` equals `snap_to.cell_size` every cell of the
    /// result coincides with a cell of `snap_to`.
    pub fn covering(
        bounds: Rect<C>,
        snap_to: &GridSpec,
        cell_size: C,
    ) -> Result<Self, RasterError> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RasterError::CellSize(cell_size));
        }
        let Coord { x: ox, y: oy } = snap_to.origin;
        let west = ox + ((bounds.min().x - ox) / cell_size).floor() * cell_size;
        let east = ox + ((bounds.max().x - ox) / cell_size).ceil() * cell_size;
        let north = oy - ((oy - bounds.max().y) / cell_size).floor() * cell_size;
        let south = oy - ((oy - bounds.min().y) / cell_size).ceil() * cell_size;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cols = (((east - west) / cell_size).round() as usize).max(1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rows = (((north - south) / cell_size).round() as usize).max(1);

        Self::new(
            Coord { x: west, y: north },
            cell_size,
            rows,
            cols,
            snap_to.crs.clone(),
        )
    }

    /// Returns (rows, cols), matching `ndarray`'s `dim()`.
    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn cell_area(&self) -> C {
        self.cell_size * self.cell_size
    }

    /// Bounding rectangle of the whole grid.
    #[allow(clippy::cast_precision_loss)]
    pub fn extent(&self) -> Rect<C> {
        let width = self.cols as C * self.cell_size;
        let height = self.rows as C * self.cell_size;
        Rect::new(
            Coord {
                x: self.origin.x,
                y: self.origin.y - height,
            },
            Coord {
                x: self.origin.x + width,
                y: self.origin.y,
            },
        )
    }

    /// Lower-left corner of the grid.
    pub fn lower_left(&self) -> Coord<C> {
        self.extent().min()
    }

    /// Returns the map coordinate of the center of cell `(row, col)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, row: usize, col: usize) -> Point<C> {
        Point::new(
            self.origin.x + (col as C + 0.5) * self.cell_size,
            self.origin.y - (row as C + 0.5) * self.cell_size,
        )
    }

    /// Returns the `(row, col)` of the cell containing `coord`, if
    /// any.
    ///
    /// Cells are closed on their west/north edges and open on their
    /// east/south edges.
    pub fn cell_of(&self, coord: Coord<C>) -> Option<(usize, usize)> {
        let col = ((coord.x - self.origin.x) / self.cell_size).floor();
        let row = ((self.origin.y - coord.y) / self.cell_size).floor();
        #[allow(clippy::cast_precision_loss)]
        if col >= 0.0 && row >= 0.0 && col < self.cols as C && row < self.rows as C {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            Some((row as usize, col as usize))
        } else {
            None
        }
    }

    /// Returns the row and column ranges of cells whose centers may
    /// fall inside `rect`, or `None` if no cell center can.
    pub fn window(&self, rect: Rect<C>) -> Option<(Range<usize>, Range<usize>)> {
        let Coord { x: ox, y: oy } = self.origin;
        let cs = self.cell_size;
        let (top, bottom) = ((oy - rect.max().y) / cs, (oy - rect.min().y) / cs);
        let (left, right) = ((rect.min().x - ox) / cs, (rect.max().x - ox) / cs);
        let rows = span(top - 0.5, bottom - 0.5, self.rows);
        let cols = span(left - 0.5, right - 0.5, self.cols);
        match (rows, cols) {
            (Some(rows), Some(cols)) => Some((rows, cols)),
            _ => None,
        }
    }

    /// Fails unless `other` shares this grid's CRS, cell size and
    /// extent.
    pub fn check_aligned(&self, other: &GridSpec) -> Result<(), RasterError> {
        if self.crs != other.crs {
            return Err(RasterError::Alignment {
                what: "crs",
                left: self.crs.to_string(),
                right: other.crs.to_string(),
            });
        }
        if !approx_eq(self.cell_size, other.cell_size) {
            return Err(RasterError::Alignment {
                what: "cell size",
                left: self.cell_size.to_string(),
                right: other.cell_size.to_string(),
            });
        }
        if self.dim() != other.dim()
            || !approx_eq(self.origin.x, other.origin.x)
            || !approx_eq(self.origin.y, other.origin.y)
        {
            return Err(RasterError::Alignment {
                what: "extent",
                left: format_extent(self),
                right: format_extent(other),
            });
        }
        Ok(())
    }
}

/// Integer range of indices `i` with `lo <= i <= hi`, clamped to
/// `0..len`.
fn span(lo: C, hi: C, len: usize) -> Option<Range<usize>> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let start = lo.ceil().max(0.0) as usize;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let end = ((hi.floor() + 1.0).max(0.0) as usize).min(len);
    (start < end).then_some(start..end)
}

fn approx_eq(a: C, b: C) -> bool {
    (a - b).abs() <= GEOMETRY_EPSILON * a.abs().max(b.abs()).max(1.0)
}

fn format_extent(spec: &GridSpec) -> String {
    let extent = spec.extent();
    format!(
        "[{}, {}, {}, {}] ({}x{})",
        extent.min().x,
        extent.min().y,
        extent.max().x,
        extent.max().y,
        spec.rows,
        spec.cols
    )
}
