use crate::zone::ZoneId;
use raster::RasterError;
use std::fmt;
use thiserror::Error;

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Input,
    Config,
    ElevationClip,
    SolarRadiation,
    Suitability,
    ZonalStats,
    Energy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Input => "input",
            Stage::Config => "config",
            Stage::ElevationClip => "elevation clip",
            Stage::SolarRadiation => "solar radiation",
            Stage::Suitability => "suitability",
            Stage::ZonalStats => "zonal stats",
            Stage::Energy => "energy",
        })
    }
}

/// What is wrong with a zone geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryIssue {
    Empty,
    TooFewPoints,
    ZeroArea,
    NonFinite,
    SelfIntersecting,
    DuplicateId,
}

impl fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GeometryIssue::Empty => "geometry is empty",
            GeometryIssue::TooFewPoints => "ring has fewer than three distinct points",
            GeometryIssue::ZeroArea => "geometry has zero area",
            GeometryIssue::NonFinite => "geometry has non-finite coordinates",
            GeometryIssue::SelfIntersecting => "ring intersects itself",
            GeometryIssue::DuplicateId => "zone id is not unique",
        })
    }
}

#[derive(Error, Debug)]
pub enum RooftopError {
    #[error("missing required parameter '{0}'")]
    Builder(&'static str),

    #[error("{stage}: zone {}: {reason}", zone_label(.zone))]
    Geometry {
        zone: Option<ZoneId>,
        stage: Stage,
        reason: GeometryIssue,
    },

    #[error("{stage}: raster alignment: {source}")]
    Alignment { stage: Stage, source: RasterError },

    #[error("invalid {parameter} {value}: {reason}")]
    Configuration {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{0}")]
    Raster(#[from] RasterError),
}

impl RooftopError {
    pub(crate) fn config(
        parameter: &'static str,
        value: impl fmt::Display,
        reason: &'static str,
    ) -> Self {
        RooftopError::Configuration {
            parameter,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn geometry(zone: Option<&ZoneId>, stage: Stage, reason: GeometryIssue) -> Self {
        RooftopError::Geometry {
            zone: zone.cloned(),
            stage,
            reason,
        }
    }

    /// Returns a closure that wraps a [RasterError] as an alignment
    /// failure of `stage`, for use with `map_err`.
    pub(crate) fn alignment(stage: Stage) -> impl Fn(RasterError) -> Self {
        move |source| RooftopError::Alignment { stage, source }
    }
}

fn zone_label(zone: &Option<ZoneId>) -> String {
    zone.as_ref()
        .map_or_else(|| String::from("<unnamed>"), ZoneId::to_string)
}
