//! Contour tiler.
//!
//! Rasterizes GeoJSON elevation contours into PNG heightmaps:
//! - `render`: one region to one image (grayscale preview or packed heightmap)
//! - `bulk`: every tile of an `N x N` subdivision into `DIR/{y}/{x}.png`

mod pipeline;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use contour_common::{Precision, RasterConfig, Region};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pipeline::{BulkJob, RenderJob, Source};

#[derive(Parser, Debug)]
#[command(name = "contour-tiler")]
#[command(about = "Rasterize elevation contours into heightmap tiles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one region to a PNG
    Render {
        #[command(flatten)]
        common: CommonArgs,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Region as "left,top,size" in normalized coordinates
        #[arg(long, default_value = "0,0,1")]
        region: Region,

        /// Grow the region threefold before rendering
        #[arg(long)]
        zoom_out: bool,

        /// Overlay contour lines on the preview
        #[arg(long)]
        lines: bool,

        /// Write the 16-bit packed heightmap instead of a preview
        #[arg(long)]
        heightmap: bool,
    },

    /// Render every tile of a region into DIR/{y}/{x}.png
    Bulk {
        #[command(flatten)]
        common: CommonArgs,

        /// Output directory; must not exist yet
        #[arg(long)]
        output_dir: PathBuf,

        /// Tiles per side
        #[arg(long, default_value = "4")]
        region_count: usize,

        /// Region to subdivide, as "left,top,size"
        #[arg(long, default_value = "0,0,1")]
        region: Region,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// GeoJSON contour files, combined into one dataset
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Feature property holding the elevation
    #[arg(long, env = "CONTOUR_ELEVATION_PROPERTY", default_value = "Elevation")]
    feature: String,

    /// Store points in single precision
    #[arg(long)]
    low_resolution: bool,

    /// Output and grid resolution (overrides CONTOUR_RASTER_SIZE)
    #[arg(long)]
    size: Option<usize>,

    /// Worker threads (overrides CONTOUR_WORKERS)
    #[arg(long)]
    workers: Option<usize>,

    /// Ring search cap (overrides CONTOUR_MAX_RINGS)
    #[arg(long)]
    max_rings: Option<usize>,

    /// JSON file of excluded grid cells
    #[arg(long, env = "CONTOUR_EXCLUSIONS")]
    exclusions: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

impl CommonArgs {
    /// Environment configuration with command-line overrides applied.
    fn raster_config(&self) -> RasterConfig {
        let mut config = RasterConfig::from_env();
        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        if let Some(rings) = self.max_rings {
            config.max_rings = rings;
        }
        if self.low_resolution {
            config.precision = Precision::Low;
        }
        config
    }

    fn source(&self) -> Source {
        Source {
            files: self.files.clone(),
            elevation_property: self.feature.clone(),
            exclusions: self.exclusions.clone(),
            config: self.raster_config(),
        }
    }
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            common,
            output,
            region,
            zoom_out,
            lines,
            heightmap,
        } => {
            init_tracing(&common.log_level, common.json_logs)?;
            let region = if zoom_out { region.zoom_out() } else { region };
            info!(output = %output.display(), "Starting render");

            pipeline::render(
                &common.source(),
                &RenderJob {
                    output,
                    region,
                    lines,
                    heightmap,
                },
            )
        }
        Command::Bulk {
            common,
            output_dir,
            region_count,
            region,
        } => {
            init_tracing(&common.log_level, common.json_logs)?;
            info!(output_dir = %output_dir.display(), region_count, "Starting bulk export");

            pipeline::bulk(
                &common.source(),
                &BulkJob {
                    output_dir,
                    region,
                    region_count,
                },
            )
        }
    }
}
