use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Estimate rooftop solar potential for a neighborhood.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// Elevation surface, `.asc` or `.hdr`/`.flt`.
    #[arg(long)]
    pub dsm: PathBuf,

    /// GeoJSON building footprints.
    #[arg(long)]
    pub buildings: PathBuf,

    /// GeoJSON neighborhood boundary.
    #[arg(long)]
    pub boundary: PathBuf,

    /// GeoJSON processing mask, the area whose elevation is kept and
    /// may cast shade. Defaults to the boundary.
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// JSON run configuration. Omitted fields take their defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// CRS identifier of the inputs, e.g. "EPSG:2248".
    #[arg(long)]
    pub crs: Option<String>,

    /// Site latitude in degrees.
    #[arg(long, allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    /// Processing cell size, in map units.
    #[arg(long)]
    pub cell_size: Option<f64>,

    /// Write intermediate rasters to this directory.
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone, Copy)]
pub enum Command {
    /// Print the result table to stdout as CSV.
    Csv,

    /// Print results to stdout as JSON.
    Json,

    /// Print a short human readable summary.
    Summary,
}
