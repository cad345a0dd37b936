//! ESRI float grid: a `.hdr` text header next to a `.flt` body of
//! raw `f32` samples, northern row first.

use crate::{
    header::{ByteOrder, Header},
    Crs, Raster, RasterError,
};
use byteorder::{BigEndian as BE, LittleEndian as LE, ReadBytesExt, WriteBytesExt};
use ndarray::Array2;
use std::{
    io::{BufRead, Read, Write},
    mem::size_of,
};

/// Parses a float grid from its header and body readers.
pub fn read_flt<H: BufRead, B: Read>(
    mut header: H,
    mut body: B,
    crs: Crs,
) -> Result<Raster, RasterError> {
    let header = parse_header(&mut header)?;
    let mut bytes = Vec::new();
    body.read_to_end(&mut bytes)?;
    decode(&header, &bytes, crs)
}

/// Writes `raster` as a little-endian float grid.
pub fn write_flt<H: Write, B: Write>(
    raster: &Raster,
    mut header: H,
    mut body: B,
) -> Result<(), RasterError> {
    let spec_header = Header::from_spec(raster.spec(), raster.nodata());
    spec_header.write(&mut header, true)?;
    header.flush()?;
    for value in raster.data().iter() {
        body.write_f32::<LE>(*value)?;
    }
    body.flush()?;
    Ok(())
}

pub(crate) fn parse_header<H: BufRead>(rdr: &mut H) -> Result<Header, RasterError> {
    let mut text = String::new();
    rdr.read_to_string(&mut text)?;
    Header::parse(&mut text.split_whitespace().peekable())
}

pub(crate) fn decode(header: &Header, bytes: &[u8], crs: Crs) -> Result<Raster, RasterError> {
    // The header parser guarantees the byte length fits in usize.
    let expected = header.sample_count()?;
    if bytes.len() != expected * size_of::<f32>() {
        return Err(RasterError::SampleCount {
            expected,
            actual: bytes.len() / size_of::<f32>(),
        });
    }

    let mut samples = Vec::with_capacity(expected);
    for mut chunk in bytes.chunks_exact(size_of::<f32>()) {
        let sample = match header.byte_order {
            ByteOrder::LittleEndian => chunk.read_f32::<LE>()?,
            ByteOrder::BigEndian => chunk.read_f32::<BE>()?,
        };
        samples.push(sample);
    }

    let shape = (header.rows, header.cols);
    let data = Array2::from_shape_vec(shape, samples).map_err(|_| RasterError::Shape {
        expected: shape,
        actual: shape,
    })?;
    Raster::new(header.spec(crs)?, header.nodata, data)
}

#[cfg(test)]
mod tests {
    use super::{read_flt, write_flt};
    use crate::{Crs, RasterError};
    use byteorder::{BigEndian as BE, WriteBytesExt};

    const HEADER: &str = "ncols 2\nnrows 2\nxllcorner 0\nyllcorner 0\ncellsize 1\nNODATA_value -9999\nbyteorder MSBFIRST\n";

    #[test]
    fn test_big_endian_body() {
        let mut body = Vec::new();
        for value in [1.5_f32, -9999.0, 3.25, 4.0] {
            body.write_f32::<BE>(value).unwrap();
        }
        let raster = read_flt(HEADER.as_bytes(), &body[..], Crs::unknown());
        let raster = raster.unwrap();
        assert_eq!(raster.get(0, 0), Some(1.5));
        assert_eq!(raster.get(0, 1), None);
        assert_eq!(raster.get(1, 0), Some(3.25));
        assert_eq!(raster.valid_count(), 3);
    }

    #[test]
    fn test_truncated_body() {
        let body = [0_u8; 10];
        assert!(matches!(
            read_flt(HEADER.as_bytes(), &body[..], Crs::unknown()),
            Err(RasterError::SampleCount {
                expected: 4,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_oversized_header() {
        let header = "ncols 4294967296\nnrows 4294967296\nxllcorner 0\nyllcorner 0\ncellsize 1\n";
        let body = [0_u8; 12];
        assert!(matches!(
            read_flt(header.as_bytes(), &body[..], Crs::unknown()),
            Err(RasterError::Value { .. })
        ));
    }

    #[test]
    fn test_write_then_read() {
        let mut body = Vec::new();
        for value in [1.0_f32, 2.0, -9999.0, 8.5] {
            body.write_f32::<BE>(value).unwrap();
        }
        let crs = Crs::new("EPSG:6487");
        let raster = read_flt(HEADER.as_bytes(), &body[..], crs.clone()).unwrap();

        let (mut header_out, mut body_out) = (Vec::new(), Vec::new());
        write_flt(&raster, &mut header_out, &mut body_out).unwrap();
        let reread = read_flt(&header_out[..], &body_out[..], crs).unwrap();
        assert_eq!(raster, reread);
    }
}
