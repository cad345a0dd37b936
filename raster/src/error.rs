use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("missing header key {0}")]
    MissingKey(&'static str),

    #[error("invalid value {value:?} for {key}")]
    Value { key: String, value: String },

    #[error("expected {expected} samples, found {actual}")]
    SampleCount { expected: usize, actual: usize },

    #[error("data shape {actual:?} does not match grid shape {expected:?}")]
    Shape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("invalid cell size {0}")]
    CellSize(f64),

    #[error("unsupported raster file {0}")]
    Extension(PathBuf),

    #[error("{what} mismatch: {left} vs {right}")]
    Alignment {
        what: &'static str,
        left: String,
        right: String,
    },
}
