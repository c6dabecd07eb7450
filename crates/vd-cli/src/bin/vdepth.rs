use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use serde::Serialize;
use vd_core::{Axis, Image, depth_map_shape};
use vd_depth::{
    BandRange, LevelReport, MultiscaleConfig, PeakConfig, PeakMode, ProjectionConfig, Reduction,
    project, refine,
};
use vd_filter::{MedianConfig, VarianceConfig, gaussian_smooth, windowed_median, windowed_variance};
use vd_io::{probe_rank, read_depth_map, read_volume, write_image_u8, write_image_u16};

/// In-plane radius of the variance preprocessing window.
const VARIANCE_RADIUS: usize = 15;

#[derive(Parser, Debug)]
#[command(name = "vdepth")]
#[command(about = "Estimate depth maps from volumes and project volumes along them")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate a depth map from a 3D volume.
    #[command(name = "generate")]
    Generate(GenerateArgs),
    /// Collapse a 3D volume to 2D around a depth map.
    #[command(name = "project")]
    Project(ProjectArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum GenerateType {
    /// Use raw intensities.
    Max,
    /// Use the local in-plane variance of the intensities.
    Var,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ProjectType {
    Max,
    Avg,
}

#[derive(Args, Debug, Clone)]
struct GenerateArgs {
    input: PathBuf,
    output: PathBuf,
    /// Standard deviation of the final depth-map smoothing; 0 disables it.
    sigma: f64,
    #[arg(long = "type", value_enum, default_value_t = GenerateType::Max)]
    kind: GenerateType,
    #[arg(long, default_value_t = 5)]
    levels: usize,
    /// 0: first maximum, 1: first peak, 2: last peak.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
    peak: u8,
    #[arg(long, default_value_t = 0.1)]
    tolerance: f32,
    /// Variance of the Gaussian applied at every pyramid level.
    #[arg(long, default_value_t = 1.0)]
    sigma_per_level: f64,
    #[arg(long, default_value_t = 2)]
    range_high: usize,
    #[arg(long, default_value_t = 2)]
    range_low: usize,
    #[arg(long, default_value_t = 2)]
    axis: usize,
    /// Write a JSON summary of the run.
    #[arg(long)]
    meta: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct ProjectArgs {
    input: PathBuf,
    depth: PathBuf,
    output: PathBuf,
    /// In-plane median radius applied to the volume first; 0 disables it.
    #[arg(long, default_value_t = 0)]
    median_radius: usize,
    #[arg(long = "type", value_enum, default_value_t = ProjectType::Max)]
    kind: ProjectType,
    #[arg(long, default_value_t = 1)]
    range_high: usize,
    #[arg(long, default_value_t = 1)]
    range_low: usize,
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    shift: i32,
    #[arg(long, default_value_t = 2)]
    axis: usize,
    #[arg(long)]
    meta: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct LevelDto {
    level: usize,
    factors: [usize; 3],
    shape: [usize; 3],
    clamped_bands: usize,
    mean_band_width: f64,
}

#[derive(Debug, Clone, Serialize)]
struct MetaGenerate {
    input: String,
    output: String,
    volume_shape: [usize; 3],
    depth_shape: [usize; 2],
    axis: usize,
    preprocessing: &'static str,
    levels: Vec<LevelDto>,
    peak_mode: u8,
    tolerance: f32,
    sigma_per_level: f64,
    final_sigma: f64,
    range_high: usize,
    range_low: usize,
    output_cast: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct MetaProject {
    input: String,
    depth: String,
    output: String,
    volume_shape: [usize; 3],
    output_shape: [usize; 2],
    axis: usize,
    median_radius: usize,
    reduction: &'static str,
    range_high: usize,
    range_low: usize,
    shift: i32,
    output_cast: &'static str,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Command::Generate(args) => run_generate(args),
        Command::Project(args) => run_project(args),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    ensure_rank(&args.input, 3, "input volume")?;
    let axis = Axis::new(args.axis).context("parsing --axis")?;
    if !args.sigma.is_finite() || args.sigma < 0.0 {
        bail!("SIGMA must be finite and >= 0, got {}", args.sigma);
    }

    let mut vol = read_volume(&args.input)
        .with_context(|| format!("reading volume {}", args.input.display()))?;
    info!("loaded {} shape={:?}", args.input.display(), vol.shape());

    if args.kind == GenerateType::Var {
        vol = windowed_variance(&vol, &VarianceConfig::in_plane(VARIANCE_RADIUS, axis), None)
            .context("computing windowed variance")?;
        info!("variance preprocessing done (radius {VARIANCE_RADIUS})");
    }

    let cfg = MultiscaleConfig {
        axis,
        levels: args.levels,
        sigma: args.sigma_per_level,
        peak: PeakConfig {
            mode: PeakMode::from_code(args.peak).context("parsing --peak")?,
            tolerance: args.tolerance,
        },
        range: BandRange::new(args.range_high, args.range_low),
    };
    let refined = refine(&vol, &cfg).context("refining depth map")?;
    info!("refined depth map over {} levels", refined.levels.len());

    let depth = if args.sigma > 0.0 {
        let variance = args.sigma * args.sigma;
        gaussian_smooth(&refined.depth, [variance, variance]).context("smoothing depth map")?
    } else {
        refined.depth
    };

    let out = depth_to_u8(&depth);
    write_image_u8(&args.output, &out)
        .with_context(|| format!("writing depth map {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    if let Some(meta) = &args.meta {
        write_json(
            meta,
            &MetaGenerate {
                input: args.input.display().to_string(),
                output: args.output.display().to_string(),
                volume_shape: vol.shape(),
                depth_shape: out.shape(),
                axis: axis.index(),
                preprocessing: match args.kind {
                    GenerateType::Max => "none",
                    GenerateType::Var => "windowed_variance",
                },
                levels: refined.levels.iter().map(level_dto).collect(),
                peak_mode: args.peak,
                tolerance: args.tolerance,
                sigma_per_level: args.sigma_per_level,
                final_sigma: args.sigma,
                range_high: args.range_high,
                range_low: args.range_low,
                output_cast: "u8, truncate then wrap",
            },
        )?;
    }

    Ok(())
}

fn run_project(args: ProjectArgs) -> Result<()> {
    ensure_rank(&args.input, 3, "input volume")?;
    ensure_rank(&args.depth, 2, "depth map")?;
    let axis = Axis::new(args.axis).context("parsing --axis")?;

    let mut vol = read_volume(&args.input)
        .with_context(|| format!("reading volume {}", args.input.display()))?;
    let depth = read_depth_map(&args.depth)
        .with_context(|| format!("reading depth map {}", args.depth.display()))?;

    let expected = depth_map_shape(vol.shape(), axis);
    if depth.shape() != expected {
        bail!(
            "depth map shape mismatch: volume {:?} along axis {} needs {:?}, got {:?}",
            vol.shape(),
            axis.index(),
            expected,
            depth.shape()
        );
    }

    if args.median_radius > 0 {
        vol = windowed_median(&vol, &MedianConfig::in_plane(args.median_radius, axis));
        info!("median preprocessing done (radius {})", args.median_radius);
    }

    let cfg = ProjectionConfig {
        axis,
        shift: args.shift,
        range: BandRange::new(args.range_high, args.range_low),
        reduction: match args.kind {
            ProjectType::Max => Reduction::Max,
            ProjectType::Avg => Reduction::Average,
        },
    };
    let out = project(&vol, &depth, &cfg).context("projecting volume")?;
    write_image_u16(&args.output, &out)
        .with_context(|| format!("writing projection {}", args.output.display()))?;
    info!("wrote {}", args.output.display());

    if let Some(meta) = &args.meta {
        write_json(
            meta,
            &MetaProject {
                input: args.input.display().to_string(),
                depth: args.depth.display().to_string(),
                output: args.output.display().to_string(),
                volume_shape: vol.shape(),
                output_shape: out.shape(),
                axis: axis.index(),
                median_radius: args.median_radius,
                reduction: match cfg.reduction {
                    Reduction::Max => "max",
                    Reduction::Average => "average",
                },
                range_high: args.range_high,
                range_low: args.range_low,
                shift: args.shift,
                output_cast: "u16, truncate then wrap",
            },
        )?;
    }

    Ok(())
}

fn ensure_rank(path: &Path, expected: usize, what: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{} file does not exist: {}", what, path.display());
    }
    let rank = probe_rank(path).with_context(|| format!("probing {}", path.display()))?;
    if rank != expected {
        bail!(
            "{} must have rank {expected}, {} has rank {rank}",
            what,
            path.display()
        );
    }
    Ok(())
}

/// Truncates towards zero and wraps modulo 256.
fn depth_to_u8(depth: &Image<f32>) -> Image<u8> {
    depth.map(|&d| (d as i64) as u8)
}

fn level_dto(report: &LevelReport) -> LevelDto {
    LevelDto {
        level: report.level,
        factors: report.factors,
        shape: report.shape,
        clamped_bands: report.band.clamped,
        mean_band_width: report.band.mean_width,
    }
}

fn write_json(path: &Path, value: &impl Serialize) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value).context("serializing json")?;
    fs::write(path, bytes).with_context(|| format!("writing json {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use vd_core::Image;
    use vd_io::{read_volume, write_image_u8};

    use super::{depth_to_u8, ensure_rank};

    #[test]
    fn depth_cast_truncates_then_wraps() {
        let depth = Image::from_vec(4, 1, vec![290.7f32, -1.0, 255.9, 3.2]).expect("valid image");
        assert_eq!(depth_to_u8(&depth).data(), &[34, 255, 255, 3]);
    }

    #[test]
    fn rank_gate_rejects_wrong_rank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let map = dir.path().join("map.mha");
        let img = Image::from_vec(2, 2, vec![1u8, 2, 3, 4]).expect("valid image");
        write_image_u8(&map, &img).expect("write");

        assert!(ensure_rank(&map, 3, "input volume").is_err());
        assert!(ensure_rank(&map, 2, "depth map").is_ok());
        assert!(ensure_rank(&dir.path().join("missing.mha"), 3, "input volume").is_err());
    }

    #[test]
    fn rank_gate_reads_header_only() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("vol.mhd");
        fs::write(
            &path,
            "NDims = 3\nDimSize = 4 4 4\nElementType = MET_UCHAR\nElementDataFile = vol.raw\n",
        )
        .expect("write header");

        // No element data exists, so only a header-only check can pass.
        assert!(ensure_rank(&path, 3, "input volume").is_ok());
        assert!(ensure_rank(&path, 2, "depth map").is_err());
        assert!(read_volume(&path).is_err());
    }
}
