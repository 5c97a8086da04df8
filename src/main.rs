use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use gcodemorph_lib::commands::{self, query, transform::TransformRequest};
use gcodemorph_lib::gcode::{Anchor, EngineConfig, MirrorAxis};
use gcodemorph_lib::models::{MachineSnapshot, Point2};
use gcodemorph_lib::{AppError, GcodeEngine};

#[derive(Parser)]
#[command(
    name = "gcodemorph",
    version,
    about = "Parse, transform and inspect G-code programs"
)]
struct Cli {
    /// Input G-code program
    input: PathBuf,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Engine config TOML (defaults to the per-user config, then built-in values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Machine snapshot TOML: unit, work position and offset, limits, tools
    #[arg(short, long)]
    machine: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum AxisArg {
    X,
    Y,
}

impl From<AxisArg> for MirrorAxis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::X => MirrorAxis::X,
            AxisArg::Y => MirrorAxis::Y,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Write the program back unchanged
    Render,
    /// Mirror about the centre of the bounding box
    Mirror {
        #[arg(value_enum)]
        axis: AxisArg,
    },
    /// Rotate counter-clockwise by ANGLE degrees, then scale
    Rotate {
        #[arg(allow_hyphen_values = true)]
        angle: f64,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        pivot_x: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        pivot_y: f64,
    },
    /// Scale X and Y independently, in percent
    Scale { x_percent: f64, y_percent: f64 },
    /// Shift the program by ANCHOR + (X, Y); ANCHOR ends up at (-X, -Y)
    Offset {
        /// top-left, top-center, ..., center, ..., bottom-right
        #[arg(long, default_value = "center")]
        anchor: Anchor,
        #[arg(allow_hyphen_values = true)]
        x: f64,
        #[arg(allow_hyphen_values = true)]
        y: f64,
    },
    /// Replace arcs by line segments
    Linearize,
    /// Remove every Z word
    DropZ,
    /// Correct Z with a probed height map (JSON)
    HeightMap { map: PathBuf },
    /// Print the indexed coordinate nearest to (X, Y)
    Nearest {
        #[arg(allow_hyphen_values = true)]
        x: f64,
        #[arg(allow_hyphen_values = true)]
        y: f64,
        /// Earlier program searched as a background landmark
        #[arg(long)]
        landmark: Option<PathBuf>,
    },
    /// Print the line range of a figure
    Figure { number: u32 },
    /// Print the position and figure of a line (0-based)
    Locate { line: usize },
    /// Print a program summary
    Info,
    /// Print the drawable contours as JSON
    Trace {
        #[arg(long)]
        figure: Option<u32>,
        /// Height map whose grid is drawn as an overlay
        #[arg(long)]
        height_map: Option<PathBuf>,
    },
}

fn main() {
    let _guard = gcodemorph_lib::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let config: EngineConfig = commands::load_config(cli.config.as_deref())?;
    let machine: MachineSnapshot = commands::load_machine(cli.machine.as_deref())?;
    let text = commands::read_program(&cli.input)?;
    let mut engine = GcodeEngine::new(config, machine);

    let output = match cli.command {
        Command::Render => apply(&mut engine, &text, TransformRequest::Render)?,
        Command::Mirror { axis } => apply(&mut engine, &text, TransformRequest::Mirror(axis.into()))?,
        Command::Rotate {
            angle,
            scale,
            pivot_x,
            pivot_y,
        } => apply(
            &mut engine,
            &text,
            TransformRequest::Rotate {
                angle_deg: angle,
                scale,
                pivot: Point2::new(pivot_x, pivot_y),
            },
        )?,
        Command::Scale {
            x_percent,
            y_percent,
        } => apply(
            &mut engine,
            &text,
            TransformRequest::Scale {
                x_percent,
                y_percent,
            },
        )?,
        Command::Offset { anchor, x, y } => {
            apply(&mut engine, &text, TransformRequest::Offset { anchor, x, y })?
        }
        Command::Linearize => apply(&mut engine, &text, TransformRequest::Linearize)?,
        Command::DropZ => apply(&mut engine, &text, TransformRequest::DropZ)?,
        Command::HeightMap { map } => {
            let map = commands::load_height_map(&map)?;
            apply(&mut engine, &text, TransformRequest::HeightMap(map))?
        }
        Command::Nearest { x, y, landmark } => {
            let landmark_text = landmark.as_deref().map(commands::read_program).transpose()?;
            let hit = query::nearest(&mut engine, &text, landmark_text.as_deref(), Point2::new(x, y))?;
            query::to_json(&hit)?
        }
        Command::Figure { number } => {
            engine.parse(&text);
            query::to_json(&query::figure(&engine, number)?)?
        }
        Command::Locate { line } => {
            engine.parse(&text);
            query::to_json(&query::locate(&engine, line)?)?
        }
        Command::Info => {
            engine.parse(&text);
            query::to_json(&query::info(&engine))?
        }
        Command::Trace { figure, height_map } => {
            let map = height_map.as_deref().map(commands::load_height_map).transpose()?;
            engine.parse(&text);
            query::to_json(&query::trace(&engine, figure, map.as_ref())?)?
        }
    };

    write_output(cli.output.as_deref(), &output)
}

fn apply(engine: &mut GcodeEngine, text: &str, request: TransformRequest) -> Result<String, AppError> {
    commands::transform::run_transform(engine, text, &request)
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), AppError> {
    match path {
        Some(path) => {
            std::fs::write(path, text)?;
            eprintln!("Written to {}", path.display());
        }
        None if text.ends_with('\n') || text.is_empty() => print!("{text}"),
        None => println!("{text}"),
    }
    Ok(())
}
