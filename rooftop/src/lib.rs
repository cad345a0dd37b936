//! # Rooftop solar potential
//!
//! `rooftop` estimates how much solar energy building roofs could
//! yield, from an elevation surface (DSM) and building footprints.
//!
//! The [Pipeline] runs these stages in order, each returning new
//! rasters aligned with the clipped elevation grid:
//!
//! 1. [elevation::clip] crops the DSM to the neighborhood.
//! 1. [solar::insolation_by_day] and [solar::average] estimate
//!    annual-representative irradiance.
//! 1. [suitability::filter_suitable] keeps rooftop cells that are
//!    flat and sunny enough.
//! 1. [zonal::aggregate] sums suitable area per building and for the
//!    whole neighborhood.
//! 1. [energy::estimate_energy] converts that into daily yield, and
//!    [report::join] merges it all into [ZoneReport]s.

pub mod config;
pub mod elevation;
pub mod energy;
mod error;
mod math;
pub mod pipeline;
pub mod report;
pub mod solar;
pub mod suitability;
pub mod terrain;
pub mod zonal;
pub mod zone;

pub use {
    crate::{
        config::{
            Config, DiffuseModel, EnergyConfig, GridConfig, SkyDivisions, SolarConfig,
            SuitabilityConfig, TerrainConfig, ZonalConfig,
        },
        energy::EnergyResult,
        error::{GeometryIssue, RooftopError, Stage},
        pipeline::{Pipeline, PipelineBuilder, PipelineOutput},
        report::ZoneReport,
        solar::DailyInsolation,
        zonal::ZoneStats,
        zone::{Zone, ZoneId},
    },
    geo, raster,
};
