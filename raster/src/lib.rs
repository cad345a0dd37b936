//! Georeferenced `f32` grids.
//!
//! A [Raster] couples a north-up [GridSpec] (origin, cell size,
//! shape, CRS) with a dense array of samples and a nodata sentinel.
//! Rasters are plain values: operations return new rasters rather
//! than mutating their inputs.
//!
//! # Formats
//!
//! 1. ESRI ASCII grid (`.asc`), see [read_ascii]/[write_ascii].
//! 1. ESRI float grid (`.hdr` + `.flt`), see [read_flt]/[write_flt].

mod ascii;
mod error;
mod flt;
mod grid;
mod header;

pub use crate::{
    ascii::{read_ascii, write_ascii},
    error::RasterError,
    flt::{read_flt, write_flt},
    grid::{Crs, GridSpec},
    header::DEFAULT_NODATA,
};
pub use geo;
pub use ndarray;

use memmap2::Mmap;
use ndarray::Array2;
use std::{
    ffi::OsStr,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// Base floating point type used for all map coordinates.
pub type C = f64;

#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    spec: GridSpec,

    /// Cells equal to this value (or NaN) hold no data.
    nodata: f32,

    /// Samples indexed by `[row, col]`, row 0 northern-most.
    data: Array2<f32>,
}

/// Min/max/mean over a raster's valid cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub min: f32,
    pub max: f32,
    pub mean: f64,
}

impl Raster {
    pub fn new(spec: GridSpec, nodata: f32, data: Array2<f32>) -> Result<Self, RasterError> {
        if data.dim() != spec.dim() {
            return Err(RasterError::Shape {
                expected: spec.dim(),
                actual: data.dim(),
            });
        }
        Ok(Self { spec, nodata, data })
    }

    /// Returns a raster with every cell set to `value`.
    pub fn filled(spec: GridSpec, nodata: f32, value: f32) -> Self {
        let data = Array2::from_elem(spec.dim(), value);
        Self { spec, nodata, data }
    }

    /// Returns a raster with every cell set to nodata.
    pub fn empty(spec: GridSpec, nodata: f32) -> Self {
        Self::filled(spec, nodata, nodata)
    }

    /// Returns a raster on the same grid and with the same nodata
    /// sentinel as `self`, holding `data`.
    pub fn with_data(&self, data: Array2<f32>) -> Result<Self, RasterError> {
        Self::new(self.spec.clone(), self.nodata, data)
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    pub fn data(&self) -> &Array2<f32> {
        &self.data
    }

    pub fn into_data(self) -> Array2<f32> {
        self.data
    }

    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Returns true if `value` is this raster's nodata sentinel.
    #[allow(clippy::float_cmp)]
    pub fn is_nodata(&self, value: f32) -> bool {
        value.is_nan() || value == self.nodata
    }

    /// Returns the sample at `(row, col)`, or `None` if the cell is
    /// nodata or outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.data
            .get((row, col))
            .copied()
            .filter(|value| !self.is_nodata(*value))
    }

    /// Number of cells holding data.
    pub fn valid_count(&self) -> usize {
        self.data
            .iter()
            .filter(|value| !self.is_nodata(**value))
            .count()
    }

    /// Returns `None` if the raster has no valid cells.
    pub fn summary(&self) -> Option<Summary> {
        let mut count = 0;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0_f64;
        for &value in self.data.iter().filter(|value| !self.is_nodata(**value)) {
            count += 1;
            min = min.min(value);
            max = max.max(value);
            sum += f64::from(value);
        }
        #[allow(clippy::cast_precision_loss)]
        (count > 0).then(|| Summary {
            count,
            min,
            max,
            mean: sum / count as f64,
        })
    }

    /// Fails unless `other` lies on exactly the same grid as `self`.
    pub fn check_aligned(&self, other: &Raster) -> Result<(), RasterError> {
        self.spec.check_aligned(&other.spec)
    }
}

/// File I/O
impl Raster {
    /// Loads a raster, choosing the format by file extension
    /// (`asc`, `hdr` or `flt`).
    pub fn load<P: AsRef<Path>>(path: P, crs: Crs) -> Result<Self, RasterError> {
        match extension(path.as_ref()).as_deref() {
            Some("asc") => Self::load_ascii(path, crs),
            Some("hdr" | "flt") => Self::load_flt(path, crs),
            _ => Err(RasterError::Extension(path.as_ref().to_owned())),
        }
    }

    /// Reads an ESRI ASCII grid into memory.
    pub fn load_ascii<P: AsRef<Path>>(path: P, crs: Crs) -> Result<Self, RasterError> {
        let rdr = BufReader::new(File::open(path.as_ref())?);
        let raster = read_ascii(rdr, crs)?;
        log::debug!(
            "loaded {}; dim: {:?}, cell_size: {}",
            path.as_ref().display(),
            raster.dim(),
            raster.spec.cell_size
        );
        Ok(raster)
    }

    /// Reads an ESRI float grid, memory-mapping the `.flt` body.
    ///
    /// `path` may name either the `.hdr` or the `.flt` file.
    pub fn load_flt<P: AsRef<Path>>(path: P, crs: Crs) -> Result<Self, RasterError> {
        let hdr_path = path.as_ref().with_extension("hdr");
        let flt_path = path.as_ref().with_extension("flt");
        let header = flt::parse_header(&mut BufReader::new(File::open(hdr_path)?))?;
        let body = File::open(&flt_path)?;
        let mmap = unsafe { Mmap::map(&body)? };
        let raster = flt::decode(&header, &mmap, crs)?;
        log::debug!(
            "loaded {}; dim: {:?}, cell_size: {}",
            flt_path.display(),
            raster.dim(),
            raster.spec.cell_size
        );
        Ok(raster)
    }

    /// Writes this raster, choosing the format by file extension.
    ///
    /// Float grids are written as a `.hdr`/`.flt` pair.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RasterError> {
        let path = path.as_ref();
        match extension(path).as_deref() {
            Some("asc") => write_ascii(self, BufWriter::new(File::create(path)?)),
            Some("hdr" | "flt") => write_flt(
                self,
                BufWriter::new(File::create(path.with_extension("hdr"))?),
                BufWriter::new(File::create(path.with_extension("flt"))?),
            ),
            _ => Err(RasterError::Extension(path.to_owned())),
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}
