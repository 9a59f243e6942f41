//! Load, rasterize and export.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use contour_common::{LowResPoint, Point, Precision, RasterConfig, Region, SourcePoint};
use contour_ingest::{load_files, LoadOptions, LoadedContours};
use contour_raster::png::{encode_grayscale_rgba, encode_heightmap_rgba, write_png};
use contour_raster::{CellExclusions, LineProximity, Rasterizer};
use tracing::{debug, info};

/// Where the contours come from and how to rasterize them.
#[derive(Debug, Clone)]
pub struct Source {
    pub files: Vec<PathBuf>,
    pub elevation_property: String,
    pub exclusions: Option<PathBuf>,
    pub config: RasterConfig,
}

#[derive(Debug, Clone)]
pub struct RenderJob {
    pub output: PathBuf,
    pub region: Region,
    pub lines: bool,
    pub heightmap: bool,
}

#[derive(Debug, Clone)]
pub struct BulkJob {
    pub output_dir: PathBuf,
    pub region: Region,
    pub region_count: usize,
}

/// Path of tile `(x, y)` under `dir`.
pub fn tile_path(dir: &Path, x: usize, y: usize) -> PathBuf {
    dir.join(y.to_string()).join(format!("{x}.png"))
}

fn load<P: SourcePoint>(source: &Source) -> Result<LoadedContours<P>> {
    let options = LoadOptions::default().with_elevation_property(source.elevation_property.clone());
    load_files::<P>(&source.files, &options).context("Failed to load contour files")
}

fn setup<'a, P: SourcePoint>(
    source: &Source,
    loaded: &'a LoadedContours<P>,
) -> Result<Rasterizer<'a, P>> {
    info!(
        hardware_threads = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        workers = source.config.worker_count(),
        size = source.config.size,
        "Rasterizer configuration"
    );

    let start = Instant::now();
    let mut engine = Rasterizer::setup(&loaded.contours, source.config.clone())
        .context("Failed to set up rasterizer")?;
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "Spatial index ready");

    if let Some(path) = &source.exclusions {
        let exclusions = CellExclusions::load(path)
            .with_context(|| format!("Failed to load exclusions from {}", path.display()))?;
        engine = engine.with_exclusions(exclusions);
    }

    Ok(engine)
}

/// Render one region to one PNG.
pub fn render(source: &Source, job: &RenderJob) -> Result<()> {
    match source.config.precision {
        Precision::High => render_with::<Point>(source, job),
        Precision::Low => render_with::<LowResPoint>(source, job),
    }
}

fn render_with<P: SourcePoint>(source: &Source, job: &RenderJob) -> Result<()> {
    let loaded = load::<P>(source)?;
    let engine = setup(source, &loaded)?;
    let size = engine.config().size;

    let mut field = vec![0.0; engine.pixel_count()];
    let stats = engine
        .rasterize(&job.region, &mut field)
        .context("Elevation pass failed")?;

    let pixels = if job.heightmap {
        encode_heightmap_rgba(&field, size)?
    } else {
        let mask = if job.lines {
            let mut mask = vec![LineProximity::None; engine.pixel_count()];
            engine
                .rasterize_line_mask(&job.region, &mut mask)
                .context("Line mask pass failed")?;
            Some(mask)
        } else {
            None
        };
        encode_grayscale_rgba(&field, mask.as_deref(), size, &stats)?
    };

    write_png(&job.output, &pixels, size, size)
        .with_context(|| format!("Failed to write {}", job.output.display()))?;

    info!(
        output = %job.output.display(),
        min = ?stats.min_elevation.map(|e| loaded.bounds.denormalize_elevation(e)),
        max = ?stats.max_elevation.map(|e| loaded.bounds.denormalize_elevation(e)),
        no_data = stats.no_data_pixels,
        "Render complete"
    );
    Ok(())
}

/// Render every tile of `job.region` as a packed heightmap.
pub fn bulk(source: &Source, job: &BulkJob) -> Result<()> {
    if job.region_count == 0 {
        bail!("region count must be at least 1");
    }
    if job.output_dir.exists() {
        bail!(
            "Output directory {} already exists; refusing to overwrite",
            job.output_dir.display()
        );
    }

    match source.config.precision {
        Precision::High => bulk_with::<Point>(source, job),
        Precision::Low => bulk_with::<LowResPoint>(source, job),
    }
}

fn bulk_with<P: SourcePoint>(source: &Source, job: &BulkJob) -> Result<()> {
    let loaded = load::<P>(source)?;
    let engine = setup(source, &loaded)?;
    let size = engine.config().size;
    let total = job.region_count * job.region_count;
    let start = Instant::now();

    let mut field = vec![0.0; engine.pixel_count()];
    for (done, (x, y, tile)) in job.region.tiles(job.region_count).enumerate() {
        let stats = engine
            .rasterize(&tile, &mut field)
            .with_context(|| format!("Elevation pass failed for tile ({x}, {y})"))?;

        let path = tile_path(&job.output_dir, x, y);
        write_png(&path, &encode_heightmap_rgba(&field, size)?, size, size)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        debug!(x, y, no_data = stats.no_data_pixels, "Tile written");
        info!(tile = done + 1, of = total, "Bulk progress");
    }

    info!(
        tiles = total,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Bulk export complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_utils::two_level_collection;

    fn source(dir: &TempDir, precision: Precision) -> Source {
        let path = dir.path().join("levels.geojson");
        std::fs::write(&path, two_level_collection()).unwrap();
        Source {
            files: vec![path],
            elevation_property: "Elevation".to_string(),
            exclusions: None,
            config: RasterConfig {
                precision,
                workers: Some(2),
                ..RasterConfig::with_size(16)
            },
        }
    }

    fn is_png(path: &Path) -> bool {
        let bytes = std::fs::read(path).unwrap();
        bytes.starts_with(&[137, 80, 78, 71, 13, 10, 26, 10])
    }

    #[test]
    fn test_render_preview_with_lines() {
        let dir = TempDir::new().unwrap();
        let job = RenderJob {
            output: dir.path().join("preview.png"),
            region: Region::full(),
            lines: true,
            heightmap: false,
        };
        render(&source(&dir, Precision::High), &job).unwrap();
        assert!(is_png(&job.output));
    }

    #[test]
    fn test_render_low_resolution_heightmap() {
        let dir = TempDir::new().unwrap();
        let job = RenderJob {
            output: dir.path().join("out").join("height.png"),
            region: Region::full().zoom_out(),
            lines: false,
            heightmap: true,
        };
        render(&source(&dir, Precision::Low), &job).unwrap();
        assert!(is_png(&job.output));
    }

    #[test]
    fn test_bulk_writes_every_tile() {
        let dir = TempDir::new().unwrap();
        let job = BulkJob {
            output_dir: dir.path().join("tiles"),
            region: Region::full(),
            region_count: 2,
        };
        bulk(&source(&dir, Precision::High), &job).unwrap();

        for y in 0..2 {
            for x in 0..2 {
                assert!(is_png(&tile_path(&job.output_dir, x, y)));
            }
        }
    }

    #[test]
    fn test_bulk_refuses_existing_directory() {
        let dir = TempDir::new().unwrap();
        let job = BulkJob {
            output_dir: dir.path().to_path_buf(),
            region: Region::full(),
            region_count: 2,
        };
        let err = bulk(&source(&dir, Precision::High), &job).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_tile_path_layout() {
        let path = tile_path(Path::new("/tiles"), 3, 7);
        assert_eq!(path, PathBuf::from("/tiles/7/3.png"));
    }

    #[test]
    fn test_missing_input_reports_context() {
        let dir = TempDir::new().unwrap();
        let mut src = source(&dir, Precision::High);
        src.files = vec![dir.path().join("missing.geojson")];
        let job = RenderJob {
            output: dir.path().join("x.png"),
            region: Region::full(),
            lines: false,
            heightmap: true,
        };
        let err = render(&src, &job).unwrap_err();
        assert!(err.to_string().contains("Failed to load contour files"));
    }
}
