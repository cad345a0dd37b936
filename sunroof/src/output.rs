use anyhow::{Context, Result};
use log::info;
use rooftop::{PipelineOutput, ZoneReport};
use serde::Serialize;
use std::{fs, io::Write, path::Path};

const CSV_HEADER: &str = "zone_id,zone_area,cell_count,suitable_area,mean_irradiance,min_irradiance,max_irradiance,daily_energy_per_sqm,daily_energy_total_kwh";

/// Writes every intermediate raster of `output` into `dir` as ESRI
/// ASCII grids.
pub fn write_rasters(output: &PipelineOutput, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating {}", dir.display()))?;

    let mut rasters = vec![
        (String::from("elevation_clipped.asc"), &output.elevation),
        (String::from("slope.asc"), &output.slope),
    ];
    rasters.extend(
        output
            .daily
            .iter()
            .map(|day| (format!("insolation_day_{:03}.asc", day.day), &day.raster)),
    );
    rasters.extend([
        (String::from("irradiance_avg.asc"), &output.irradiance),
        (String::from("suitable.asc"), &output.suitable),
    ]);

    for (name, raster) in rasters {
        let path = dir.join(name);
        raster
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

/// Building rows followed by the neighborhood row. Missing values are
/// left empty.
pub fn print_csv<W: Write>(mut out: W, output: &PipelineOutput) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    let hood = std::iter::once(&output.neighborhood);
    for report in output.buildings.iter().chain(hood) {
        writeln!(out, "{}", csv_row(report))?;
    }
    Ok(())
}

fn csv_row(report: &ZoneReport) -> String {
    fn opt(value: Option<f64>) -> String {
        value.map(|v| v.to_string()).unwrap_or_default()
    }

    let id = report.zone_id.as_str();
    let id = if id.contains([',', '"', '\n']) {
        format!("\"{}\"", id.replace('"', "\"\""))
    } else {
        id.to_string()
    };
    format!(
        "{id},{},{},{},{},{},{},{},{}",
        report.zone_area,
        report.cell_count,
        report.suitable_area,
        opt(report.mean_irradiance),
        opt(report.min_irradiance),
        opt(report.max_irradiance),
        opt(report.daily_energy_per_sqm),
        opt(report.daily_energy_total_kwh),
    )
}

pub fn print_json<W: Write>(mut out: W, output: &PipelineOutput) -> Result<()> {
    #[derive(Serialize)]
    struct Results<'a> {
        buildings: &'a [ZoneReport],
        neighborhood: &'a ZoneReport,
    }

    let results = Results {
        buildings: &output.buildings,
        neighborhood: &output.neighborhood,
    };
    serde_json::to_writer(&mut out, &results)?;
    writeln!(out)?;
    Ok(())
}

pub fn print_summary<W: Write>(mut out: W, output: &PipelineOutput) -> Result<()> {
    let hood = &output.neighborhood;
    let (rows, cols) = output.elevation.dim();
    writeln!(
        out,
        "grid:                {rows} x {cols} cells of {} m",
        output.elevation.spec().cell_size
    )?;
    if let Some(summary) = output.irradiance.summary() {
        writeln!(
            out,
            "irradiance:          {:.0} .. {:.0} Wh/m²/day (mean {:.0})",
            summary.min, summary.max, summary.mean
        )?;
    }
    writeln!(out, "suitable buildings:  {}", output.buildings.len())?;
    writeln!(out, "suitable area:       {:.1} m²", hood.suitable_area)?;
    match (hood.mean_irradiance, hood.daily_energy_total_kwh) {
        (Some(mean), Some(total)) => {
            writeln!(out, "mean irradiance:     {mean:.0} Wh/m²/day")?;
            writeln!(out, "daily energy:        {total:.1} kWh")?;
        }
        _ => writeln!(out, "no suitable rooftop area")?,
    }
    Ok(())
}
