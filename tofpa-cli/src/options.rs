use anyhow::{anyhow, Error as AnyError};
use clap::{Args, Parser, Subcommand, ValueEnum};
use geo::geometry::Coord;
use std::{path::PathBuf, str::FromStr};
use tofpa::{shadow::DEFAULT_SHADOW_TOLERANCE_DEG, TakeoffDirection, TofpaParameters};

/// Check obstacle and terrain samples against a take-off flight path
/// area.
#[derive(Parser, Debug, Clone)]
pub struct Cli {
    /// JSON array of sample records.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Write output here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// DER elevation, in meters.
    #[arg(long)]
    pub der_elevation: f64,

    /// DER planar position "x,y". Requires --bearing.
    #[arg(long, requires = "bearing", conflicts_with_all = ["runway_start", "runway_end"])]
    pub der: Option<XY>,

    /// Departure bearing, degrees clockwise from grid north.
    #[arg(long)]
    pub bearing: Option<f64>,

    /// First runway end "x,y". Requires --runway-end.
    #[arg(long, requires = "runway_end")]
    pub runway_start: Option<XY>,

    /// Second runway end "x,y".
    #[arg(long)]
    pub runway_end: Option<XY>,

    /// Takeoff direction along the runway.
    #[arg(long, value_enum, default_value_t = Direction::StartToEnd)]
    pub direction: Direction,

    #[command(flatten)]
    pub surface: SurfaceArgs,

    /// Penetration tolerance, in meters.
    #[arg(short, long, default_value_t = tofpa::evaluate::DEFAULT_TOLERANCE_M)]
    pub tolerance: f64,

    /// Check samples whose surroundings, out to this many meters,
    /// touch the surface.
    #[arg(long, default_value_t = 0.0)]
    pub obstacle_buffer: f64,

    /// Treat obstacles with a known ground elevation as at least this
    /// tall, in meters.
    #[arg(long)]
    pub min_obstacle_height: Option<f64>,

    /// Mark penetrating obstacles hidden behind closer, taller ones.
    #[arg(long, default_value_t = false)]
    pub shadow: bool,

    /// Half-angle of the shadowing cone, in degrees.
    #[arg(long, default_value_t = DEFAULT_SHADOW_TOLERANCE_DEG)]
    pub shadow_tolerance: f64,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Args, Debug, Clone)]
pub struct SurfaceArgs {
    /// Width of the surface at its start, in meters.
    #[arg(long, default_value_t = 180.0)]
    pub initial_width: f64,

    /// Half-angle at which the sides diverge, in degrees. Defaults to
    /// a 12.5% divergence.
    #[arg(long)]
    pub splay: Option<f64>,

    /// Rise per unit of distance, e.g. 0.012 for 1.2%.
    #[arg(long, default_value_t = 0.012)]
    pub slope: f64,

    /// Length of the surface, in meters.
    #[arg(long, default_value_t = 10_000.0)]
    pub length: f64,

    /// Width at which the sides stop diverging, in meters.
    #[arg(long, default_value_t = 1_800.0)]
    pub max_width: f64,

    /// Let the sides diverge up to the far end.
    #[arg(long, default_value_t = false)]
    pub no_width_cap: bool,

    /// Distance beyond the DER where the surface starts, in meters.
    #[arg(long, default_value_t = 0.0)]
    pub clearway: f64,
}

impl From<&SurfaceArgs> for TofpaParameters {
    fn from(args: &SurfaceArgs) -> Self {
        let defaults = Self::default();
        Self {
            initial_width_m: args.initial_width,
            splay_deg: args.splay.unwrap_or(defaults.splay_deg),
            slope_ratio: args.slope,
            max_length_m: args.length,
            max_width_m: (!args.no_width_cap).then_some(args.max_width),
            origin_offset_m: args.clearway,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum Direction {
    StartToEnd,
    EndToStart,
}

impl From<Direction> for TakeoffDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::StartToEnd => Self::StartToEnd,
            Direction::EndToStart => Self::EndToStart,
        }
    }
}

/// A planar "x,y" pair.
#[derive(Clone, Debug, Copy)]
pub struct XY(pub Coord<f64>);

impl FromStr for XY {
    type Err = AnyError;
    fn from_str(s: &str) -> Result<Self, AnyError> {
        let (x_str, y_str) = s
            .split_once(',')
            .ok_or_else(|| anyhow!("not a valid x,y"))?;
        let x = f64::from_str(x_str.trim())?;
        let y = f64::from_str(y_str.trim())?;
        Ok(Self(Coord { x, y }))
    }
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print output records as JSON.
    Json,

    /// Print output records as CSV.
    Csv,

    /// Print the surface and output records as GeoJSON.
    Geojson,
}
