//! The `key value` header shared by ESRI ASCII grids and the `.hdr`
//! sidecar of ESRI float grids.

use crate::{Crs, GridSpec, RasterError, C};
use geo::geometry::Coord;
use std::{io::Write, iter::Peekable, mem::size_of, str::FromStr};

/// Nodata sentinel assumed when a header doesn't declare one.
pub const DEFAULT_NODATA: f32 = -9999.0;

/// Upper bound on samples reserved up front from a header's declared
/// shape; readers grow past it as data actually arrives.
pub(crate) const MAX_RESERVED_SAMPLES: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ByteOrder {
    LittleEndian,
    BigEndian,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Header {
    pub cols: usize,
    pub rows: usize,
    /// Lower-left corner of the lower-left cell.
    pub lower_left: Coord<C>,
    pub cell_size: C,
    pub nodata: f32,
    pub byte_order: ByteOrder,
}

impl Header {
    /// Consumes `key value` pairs from `tokens` until the first token
    /// that doesn't start with a letter.
    pub fn parse<'a, I>(tokens: &mut Peekable<I>) -> Result<Self, RasterError>
    where
        I: Iterator<Item = &'a str>,
    {
        let mut cols = None;
        let mut rows = None;
        let mut x = None;
        let mut y = None;
        let mut cell_size = None;
        let mut nodata = None;
        let mut byte_order = ByteOrder::LittleEndian;

        while let Some(key) = tokens.next_if(|tok| is_key(tok)) {
            let key = key.to_ascii_lowercase();
            let value = tokens.next().ok_or_else(|| RasterError::Value {
                key: key.clone(),
                value: String::new(),
            })?;
            match key.as_str() {
                "ncols" => cols = Some(parse_value::<usize>(&key, value)?),
                "nrows" => rows = Some(parse_value::<usize>(&key, value)?),
                "xllcorner" => x = Some((parse_value::<C>(&key, value)?, false)),
                "xllcenter" => x = Some((parse_value::<C>(&key, value)?, true)),
                "yllcorner" => y = Some((parse_value::<C>(&key, value)?, false)),
                "yllcenter" => y = Some((parse_value::<C>(&key, value)?, true)),
                "cellsize" => cell_size = Some(parse_value::<C>(&key, value)?),
                "nodata_value" => nodata = Some(parse_value::<f32>(&key, value)?),
                "byteorder" => {
                    byte_order = match value.to_ascii_uppercase().as_str() {
                        "LSBFIRST" | "I" => ByteOrder::LittleEndian,
                        "MSBFIRST" | "M" => ByteOrder::BigEndian,
                        _ => {
                            return Err(RasterError::Value {
                                key: key.clone(),
                                value: value.to_string(),
                            })
                        }
                    }
                }
                other => log::debug!("ignoring header key {other}"),
            }
        }

        let cols = cols.ok_or(RasterError::MissingKey("ncols"))?;
        let rows = rows.ok_or(RasterError::MissingKey("nrows"))?;
        let (x, x_is_center) = x.ok_or(RasterError::MissingKey("xllcorner"))?;
        let (y, y_is_center) = y.ok_or(RasterError::MissingKey("yllcorner"))?;
        let cell_size = cell_size.ok_or(RasterError::MissingKey("cellsize"))?;
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(RasterError::CellSize(cell_size));
        }

        let half = cell_size / 2.0;
        let lower_left = Coord {
            x: if x_is_center { x - half } else { x },
            y: if y_is_center { y - half } else { y },
        };

        let header = Self {
            cols,
            rows,
            lower_left,
            cell_size,
            nodata: nodata.unwrap_or(DEFAULT_NODATA),
            byte_order,
        };
        header.sample_count()?;
        Ok(header)
    }

    pub fn from_spec(spec: &GridSpec, nodata: f32) -> Self {
        Self {
            cols: spec.cols,
            rows: spec.rows,
            lower_left: spec.lower_left(),
            cell_size: spec.cell_size,
            nodata,
            byte_order: ByteOrder::LittleEndian,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn spec(&self, crs: Crs) -> Result<GridSpec, RasterError> {
        let origin = Coord {
            x: self.lower_left.x,
            y: self.lower_left.y + self.rows as C * self.cell_size,
        };
        GridSpec::new(origin, self.cell_size, self.rows, self.cols, crs)
    }

    /// Number of samples the header declares, failing if the body
    /// could not be addressed in memory.
    pub fn sample_count(&self) -> Result<usize, RasterError> {
        self.rows
            .checked_mul(self.cols)
            .filter(|count| count.checked_mul(size_of::<f32>()).is_some())
            .ok_or_else(|| RasterError::Value {
                key: String::from("nrows x ncols"),
                value: format!("{} x {}", self.rows, self.cols),
            })
    }

    pub fn write<W: Write>(&self, mut out: W, with_byte_order: bool) -> Result<(), RasterError> {
        writeln!(out, "ncols {}", self.cols)?;
        writeln!(out, "nrows {}", self.rows)?;
        writeln!(out, "xllcorner {}", self.lower_left.x)?;
        writeln!(out, "yllcorner {}", self.lower_left.y)?;
        writeln!(out, "cellsize {}", self.cell_size)?;
        writeln!(out, "NODATA_value {}", self.nodata)?;
        if with_byte_order {
            let tag = match self.byte_order {
                ByteOrder::LittleEndian => "LSBFIRST",
                ByteOrder::BigEndian => "MSBFIRST",
            };
            writeln!(out, "byteorder {tag}")?;
        }
        Ok(())
    }
}

/// Header keys start with a letter; `nan`/`inf` samples don't count.
fn is_key(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_alphabetic()) && token.parse::<f32>().is_err()
}

pub(crate) fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, RasterError> {
    value.parse::<T>().map_err(|_| RasterError::Value {
        key: key.to_string(),
        value: value.to_string(),
    })
}
