mod options;
mod output;
mod zones;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use options::{Cli, Command as CliCmd};
use raster::{Crs, Raster};
use rooftop::{Config, Pipeline};
use std::{fs::File, io::BufReader, path::Path, time::Instant};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn main() -> Result<()> {
    let Cli {
        dsm,
        buildings,
        boundary,
        mask,
        config,
        crs,
        latitude,
        cell_size,
        out_dir,
        cmd,
    } = Cli::parse();

    env_logger::init();

    let mut config = match config {
        Some(path) => load_config(&path)?,
        None => Config::default(),
    };
    if let Some(latitude) = latitude {
        config.solar.latitude = latitude;
    }
    if let Some(cell_size) = cell_size {
        config.grid.cell_size = Some(cell_size);
    }
    if crs.is_some() {
        config.grid.crs = crs;
    }

    let now = Instant::now();
    let crs = config.grid.crs.as_deref();
    let crs = crs.map_or_else(Crs::unknown, Crs::new);
    let dsm = Raster::load(&dsm, crs)
        .with_context(|| format!("loading {}", dsm.display()))?;
    let buildings = zones::open_zones(&buildings)?;
    let boundary = zones::open_boundary(&boundary, &config.grid.neighborhood_id)?;
    let mask = match mask {
        Some(path) => Some(zones::open_boundary(&path, "mask")?),
        None => None,
    };
    info!(
        "inputs; dsm: {:?}, buildings: {}, load: {:?}",
        dsm.dim(),
        buildings.len(),
        now.elapsed()
    );

    let mut builder = Pipeline::builder()
        .config(config)
        .elevation(&dsm)
        .boundary(&boundary)
        .buildings(&buildings);
    if let Some(mask) = &mask {
        builder = builder.mask(mask);
    }
    let output = builder.run()?;

    if let Some(dir) = out_dir {
        output::write_rasters(&output, &dir)?;
    }

    let stdout = std::io::stdout().lock();
    match cmd {
        CliCmd::Csv => output::print_csv(stdout, &output)?,
        CliCmd::Json => output::print_json(stdout, &output)?,
        CliCmd::Summary => output::print_summary(stdout, &output)?,
    };
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    let file = File::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}
