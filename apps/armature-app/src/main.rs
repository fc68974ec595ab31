//! Armature command line.
//!
//! - `generate`: compile a TOML job into `main_T.mod` and `BASE.sys`
//! - `fk`: pose a robot at joint values
//! - `ik`: solve joint values for a TCP pose
//! - `info`: print crate versions and the available robot presets

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use armature_core::prelude::*;
use armature_core::types::pose_from_parts;
use armature_kinematics::{forward_kinematics, inverse_kinematics, presets, KinematicChain};
use armature_rapid::{ActionError, Job};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Robot program generation and kinematics.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a job file into RAPID modules.
    Generate {
        /// Job description (TOML).
        job: PathBuf,

        /// Output directory for main_T.mod and BASE.sys.
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        /// Print the modules instead of writing files.
        #[arg(long)]
        stdout: bool,
    },

    /// Forward kinematics: joint values to TCP pose.
    Fk {
        /// Preset name or robot TOML file.
        #[arg(short, long, default_value = "IRB1200")]
        robot: String,

        /// Six joint values in degrees.
        #[arg(num_args = 6, allow_negative_numbers = true, required = true)]
        joints: Vec<f64>,

        /// External axis value.
        #[arg(short, long, allow_negative_numbers = true)]
        external: Option<f64>,
    },

    /// Inverse kinematics: TCP pose to joint values.
    Ik {
        /// Preset name or robot TOML file.
        #[arg(short, long, default_value = "IRB1200")]
        robot: String,

        /// TCP position x y z (mm).
        #[arg(short, long, num_args = 3, allow_negative_numbers = true, required = true)]
        position: Vec<f64>,

        /// TCP orientation w x y z.
        #[arg(short, long, num_args = 4, allow_negative_numbers = true, default_values_t = [1.0, 0.0, 0.0, 0.0])]
        quaternion: Vec<f64>,

        /// Axis configuration selector (0-7).
        #[arg(short, long, default_value_t = 0)]
        cfg: i32,

        /// External axis value.
        #[arg(short, long, allow_negative_numbers = true)]
        external: Option<f64>,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Generation(#[from] ActionError),

    #[error(transparent)]
    Armature(#[from] ArmatureError),

    #[error("Cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Armature(value.into())
    }
}

impl From<ChainError> for AppError {
    fn from(value: ChainError) -> Self {
        Self::Armature(value.into())
    }
}

impl From<InputError> for AppError {
    fn from(value: InputError) -> Self {
        Self::Armature(value.into())
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_generate(job_path: &Path, out: &Path, stdout: bool) -> Result<(), AppError> {
    let job = Job::from_file(job_path)?;
    let output = job.run()?;
    let program = &output.program;

    if !program.first_movement_is_absolute_joint {
        warn!("the first movement is not an absolute joint move");
    }

    if stdout {
        println!("{}", program.code);
        println!();
        println!("{}", output.base);
    } else {
        let ending = job.generator.line_ending.as_str();
        write(&out.join("main_T.mod"), &program.code, ending)?;
        write(&out.join("BASE.sys"), &output.base, ending)?;
        info!(dir = %out.display(), "wrote main_T.mod and BASE.sys");
    }
    Ok(())
}

/// Write `text` followed by a final line ending.
fn write(path: &Path, text: &str, ending: &str) -> Result<(), AppError> {
    fs::write(path, format!("{text}{ending}")).map_err(|source| AppError::Write {
        path: path.to_owned(),
        source,
    })
}

/// A preset name, or a path to a robot TOML file.
fn load_chain(robot: &str) -> Result<KinematicChain, AppError> {
    let config = if Path::new(robot).is_file() {
        RobotConfig::from_file(robot)?
    } else {
        presets::by_name(robot)?
    };
    Ok(KinematicChain::from_config(&config)?)
}

fn run_fk(robot: &str, joints: &[f64], external: Option<f64>) -> Result<(), AppError> {
    let chain = load_chain(robot)?;
    let external: Vec<f64> = external.into_iter().collect();
    let position = JointPosition::from_slices(joints, &external)?;
    let posed = forward_kinematics(&chain, &position)?;

    println!("robot: {}", chain.name());
    print_pose("flange", &posed.flange_frame);
    print_pose("tcp", &posed.tcp_frame);
    Ok(())
}

fn run_ik(
    robot: &str,
    position: &[f64],
    quaternion: &[f64],
    cfg: i32,
    external: Option<f64>,
) -> Result<(), AppError> {
    let chain = load_chain(robot)?;
    let (Ok(position), Ok(quaternion)) = (
        <[f64; 3]>::try_from(position),
        <[f64; 4]>::try_from(quaternion),
    ) else {
        return Err(InputError::NonFinitePose.into());
    };
    let mut target = TargetPose::new(
        pose_from_parts(position, quaternion),
        AxisConfiguration::new(cfg),
    );
    if let Some(value) = external {
        target = target.with_external(ExternalAxisTarget::Value(value));
    }
    let solution = inverse_kinematics(&chain, &target)?;

    println!("robot: {}", chain.name());
    println!("cfg:   {}", solution.configuration);
    let joints: Vec<String> = solution
        .position
        .internal
        .iter()
        .map(|v| format!("{v:.3}"))
        .collect();
    println!("joints: [{}]", joints.join(", "));
    if !solution.position.external.is_empty() {
        println!("external: {:?}", solution.position.external);
    }
    Ok(())
}

fn print_pose(label: &str, pose: &Pose) {
    let t = pose.translation.vector;
    let q = pose.rotation.quaternion();
    println!(
        "{label:<7}[{:.3}, {:.3}, {:.3}] [{:.6}, {:.6}, {:.6}, {:.6}]",
        t.x, t.y, t.z, q.w, q.i, q.j, q.k
    );
}

fn run_info() {
    println!("armature v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("crates:");
    println!("  armature-core        {}", env!("CARGO_PKG_VERSION"));
    println!("  armature-kinematics  {}", env!("CARGO_PKG_VERSION"));
    println!("  armature-rapid       {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("robot presets:");
    for name in presets::NAMES {
        println!("  {name}");
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Generate { job, out, stdout } => run_generate(&job, &out, stdout),
        Commands::Fk {
            robot,
            joints,
            external,
        } => run_fk(&robot, &joints, external),
        Commands::Ik {
            robot,
            position,
            quaternion,
            cfg,
            external,
        } => run_ik(&robot, &position, &quaternion, cfg, external),
        Commands::Info => {
            run_info();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
