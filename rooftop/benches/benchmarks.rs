use criterion::{criterion_group, criterion_main, Criterion};
use rooftop::{
    raster::{geo::geometry::Coord, ndarray::Array2, Crs, GridSpec, Raster},
    solar::{estimate_irradiance, HorizonMap},
    terrain, SolarConfig, TerrainConfig,
};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

/// Rolling ground with a grid of 6 m blocks, 1 m cells.
#[allow(clippy::cast_precision_loss)]
fn synthetic_dsm(size: usize) -> Raster {
    let spec = GridSpec::new(
        Coord {
            x: 0.0,
            y: size as f64,
        },
        1.0,
        size,
        size,
        Crs::new("EPSG:2248"),
    )
    .unwrap();
    let data = Array2::from_shape_fn((size, size), |(row, col)| {
        let ground = ((row as f32) * 0.05).sin() + ((col as f32) * 0.03).cos();
        let on_block = row % 20 < 12 && col % 20 < 12;
        let block = if on_block { 6.0 } else { 0.0 };
        ground + block
    });
    Raster::new(spec, -9999.0, data).unwrap()
}

fn terrain_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("Terrain");
    let dsm = synthetic_dsm(200);

    group.bench_with_input("slope", &dsm, |b, dsm| {
        b.iter(|| terrain::slope(dsm, 1.0).unwrap())
    });
    group.bench_with_input("horizon", &dsm, |b, dsm| {
        b.iter(|| HorizonMap::compute(dsm, 32, 100.0))
    });
}

fn solar_radiation(c: &mut Criterion) {
    let mut group = c.benchmark_group("Solar Radiation");
    group.sample_size(10);
    let dsm = synthetic_dsm(100);
    let solar = SolarConfig {
        days: vec![172],
        ..SolarConfig::default()
    };
    let terrain = TerrainConfig::default();

    let inputs = (dsm, solar, terrain);
    group.bench_with_input("one day", &inputs, |b, (dsm, solar, terrain)| {
        b.iter(|| estimate_irradiance(dsm, solar, terrain).unwrap())
    });
}

criterion_group!(benches, terrain_analysis, solar_radiation);
criterion_main!(benches);
