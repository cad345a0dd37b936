//! ESRI ASCII grid (`.asc`) format.

use crate::{
    header::{parse_value, Header, MAX_RESERVED_SAMPLES},
    Crs, Raster, RasterError,
};
use ndarray::Array2;
use std::io::{BufRead, Write};

/// Parses an ESRI ASCII grid.
pub fn read_ascii<R: BufRead>(mut rdr: R, crs: Crs) -> Result<Raster, RasterError> {
    let mut text = String::new();
    rdr.read_to_string(&mut text)?;
    let mut tokens = text.split_whitespace().peekable();
    let header = Header::parse(&mut tokens)?;

    let expected = header.sample_count()?;
    let mut samples = Vec::with_capacity(expected.min(MAX_RESERVED_SAMPLES));
    for token in tokens {
        samples.push(parse_value::<f32>("sample", token)?);
    }
    if samples.len() != expected {
        return Err(RasterError::SampleCount {
            expected,
            actual: samples.len(),
        });
    }

    let shape = (header.rows, header.cols);
    let data = Array2::from_shape_vec(shape, samples).map_err(|_| RasterError::Shape {
        expected: shape,
        actual: shape,
    })?;
    Raster::new(header.spec(crs)?, header.nodata, data)
}

/// Writes `raster` as an ESRI ASCII grid, northern row first.
pub fn write_ascii<W: Write>(raster: &Raster, mut out: W) -> Result<(), RasterError> {
    let header = Header::from_spec(raster.spec(), raster.nodata());
    header.write(&mut out, false)?;
    for row in raster.data().rows() {
        let mut first = true;
        for value in row {
            if !first {
                out.write_all(b" ")?;
            }
            write!(out, "{value}")?;
            first = false;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
