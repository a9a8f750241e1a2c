use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, warn};
use plycloud::{random_subsample, voxel_downsample, write_ply, Color, PlyEncoding, PointCloud};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    path::{Path, PathBuf},
    time::Instant,
};

/// Reduces a LAS/LAZ scan to a voxel-downsampled PLY point cloud.
#[derive(Parser, Debug, Clone)]
#[command(name = "las2ply", version)]
struct Args {
    /// Input .las or .laz file.
    input: PathBuf,

    /// Output PLY path [default: voxel_downsampled_<VOXEL_SIZE>.ply].
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Voxel edge length in source units.
    #[arg(long, default_value_t = 0.2)]
    voxel_size: f64,

    /// Share of points kept by random sampling before voxelization (0, 1].
    #[arg(long, default_value_t = 1.0)]
    fraction: f64,

    /// Seed for the random sampler; entropy when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Write ASCII PLY instead of binary little endian.
    #[arg(long)]
    ascii: bool,

    /// Replace the output file if it exists.
    #[arg(long)]
    overwrite: bool,
}

fn default_output_path(voxel_size: f64) -> PathBuf {
    PathBuf::from(format!("voxel_downsampled_{voxel_size}.ply"))
}

/// 16-bit LAS color channels scaled to 0..1.
fn convert_point(p: &las::Point) -> ([f64; 3], Option<Color>) {
    let color = p.color.map(|c| {
        [
            c.red as f32 / 65_535.0,
            c.green as f32 / 65_535.0,
            c.blue as f32 / 65_535.0,
        ]
    });
    ([p.x, p.y, p.z], color)
}

fn read_las(path: &Path) -> Result<PointCloud> {
    let mut reader = las::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let expected = reader.header().number_of_points() as usize;
    let mut positions = Vec::with_capacity(expected);
    let mut colors: Vec<Color> = Vec::with_capacity(expected);
    let mut colored = true;

    for point in reader.points() {
        let point = point.with_context(|| format!("reading point from {}", path.display()))?;
        let (xyz, color) = convert_point(&point);
        positions.push(xyz);
        match color {
            Some(c) if colored => colors.push(c),
            _ => colored = false,
        }
    }

    let cloud = PointCloud::from_positions(positions);
    if colored && !cloud.is_empty() {
        Ok(cloud.with_colors(colors)?)
    } else {
        warn!("{} carries no RGB; output will be uncolored", path.display());
        Ok(cloud)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(args.voxel_size));

    if output.exists() && !args.overwrite {
        bail!(
            "{} already exists; pass --overwrite to replace it",
            output.display()
        );
    }

    let start = Instant::now();
    let cloud = read_las(&args.input)?;
    info!(
        "Read {} points from {} in {:.2?}",
        cloud.len(),
        args.input.display(),
        start.elapsed()
    );

    let sampled = if args.fraction < 1.0 {
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let s = random_subsample(&cloud, args.fraction, &mut rng)?;
        info!("Random sampling kept {} of {} points", s.len(), cloud.len());
        s
    } else {
        cloud
    };

    let t = Instant::now();
    let reduced = voxel_downsample(&sampled, args.voxel_size)?;
    info!(
        "Voxel size {}: {} -> {} points in {:.2?}",
        args.voxel_size,
        sampled.len(),
        reduced.len(),
        t.elapsed()
    );

    let encoding = if args.ascii {
        PlyEncoding::Ascii
    } else {
        PlyEncoding::BinaryLittleEndian
    };
    let bytes = write_ply(&output, &reduced, encoding)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(
        "Wrote {} ({} points, {} bytes) in {:.2?} total",
        output.display(),
        reduced.len(),
        bytes,
        start.elapsed()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_carries_voxel_size() {
        assert_eq!(
            default_output_path(0.2),
            PathBuf::from("voxel_downsampled_0.2.ply")
        );
        assert_eq!(
            default_output_path(0.05),
            PathBuf::from("voxel_downsampled_0.05.ply")
        );
    }

    #[test]
    fn colors_are_normalized_from_16_bit() {
        let p = las::Point {
            x: 155_000.5,
            y: 463_000.25,
            z: -1.0,
            color: Some(las::Color::new(65_535, 0, 32_768)),
            ..Default::default()
        };
        let (xyz, color) = convert_point(&p);
        assert_eq!(xyz, [155_000.5, 463_000.25, -1.0]);
        let c = color.unwrap();
        assert_eq!(c[0], 1.0);
        assert_eq!(c[1], 0.0);
        assert!((c[2] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn point_without_color() {
        let (_, color) = convert_point(&las::Point::default());
        assert!(color.is_none());
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_las(&dir.path().join("absent.las")).is_err());
    }

    fn write_las(path: &Path, format: u8, points: Vec<las::Point>) {
        let mut builder = las::Builder::from((1, 2));
        builder.point_format = las::point::Format::new(format).unwrap();
        let header = builder.into_header().unwrap();
        let mut writer = las::Writer::from_path(path, header).unwrap();
        for p in points {
            writer.write_point(p).unwrap();
        }
    }

    fn las_point(x: f64, y: f64, z: f64, color: Option<las::Color>) -> las::Point {
        las::Point {
            x,
            y,
            z,
            color,
            ..Default::default()
        }
    }

    #[test]
    fn reads_colored_las() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colored.las");
        write_las(
            &path,
            2,
            vec![
                las_point(155_000.5, 463_000.25, 1.5, Some(las::Color::new(65_535, 0, 0))),
                las_point(155_010.0, 463_020.0, -3.25, Some(las::Color::new(0, 32_768, 65_535))),
            ],
        );

        let cloud = read_las(&path).unwrap();
        assert_eq!(cloud.len(), 2);
        let expected = [[155_000.5, 463_000.25, 1.5], [155_010.0, 463_020.0, -3.25]];
        for (got, want) in cloud.positions().iter().zip(expected) {
            for axis in 0..3 {
                assert!((got[axis] - want[axis]).abs() < 1e-3, "{got:?} vs {want:?}");
            }
        }

        let colors = cloud.colors().unwrap();
        assert_eq!(colors[0], [1.0, 0.0, 0.0]);
        assert_eq!(colors[1][0], 0.0);
        assert!((colors[1][1] - 0.5).abs() < 1e-4);
        assert_eq!(colors[1][2], 1.0);
    }

    #[test]
    fn reads_uncolored_las() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.las");
        write_las(
            &path,
            0,
            vec![las_point(1.0, 2.0, 3.0, None), las_point(4.0, 5.0, 6.0, None)],
        );

        let cloud = read_las(&path).unwrap();
        assert_eq!(cloud.len(), 2);
        assert!((cloud.positions()[1][0] - 4.0).abs() < 1e-3);
        assert!((cloud.positions()[1][2] - 6.0).abs() < 1e-3);
        assert!(cloud.colors().is_none());
    }

    #[test]
    fn cli_defaults() {
        let args = Args::try_parse_from(["las2ply", "scan.laz"]).unwrap();
        assert_eq!(args.input, PathBuf::from("scan.laz"));
        assert_eq!(args.voxel_size, 0.2);
        assert_eq!(args.fraction, 1.0);
        assert!(args.output.is_none() && !args.ascii && !args.overwrite);
    }
}
