#![deny(unsafe_code)]
//! CLI binary for the dotfield particle animations.
//!
//! Subcommands:
//! - `render [animation]`: run an animation N ticks, write a PNG
//! - `navigate`: mount each path of a route table in turn, snapshotting each
//! - `list`: print available animations

mod error;

use dotfield_animations::snapshot::write_png;
use dotfield_animations::{AnimationKind, ImageCache, Navigation, RouteTable, Router};
use dotfield_core::{
    Animation, AnimationLoop, Color, FixedInterval, FrameBudget, FrameScheduler, LoopStats, Seed,
};
use clap::{Parser, Subcommand};
use error::CliError;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dotfield", about = "Particle animation renderer")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an animation for N ticks and write a PNG snapshot.
    Render {
        /// Animation name (e.g. "dot-shape"). Not needed with --seed-file.
        animation: Option<String>,

        /// Number of ticks to run.
        #[arg(short, long, default_value_t = 600)]
        ticks: u64,

        /// PRNG seed for deterministic output.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Animation parameters as a JSON string.
        #[arg(long, default_value = "{}")]
        params: String,

        /// Image whose shape the dots form (dot-shape only).
        #[arg(short, long)]
        image: Option<String>,

        /// Read animation, params, seed, ticks and image from a seed file.
        #[arg(long, conflicts_with_all = ["animation", "params", "image"])]
        seed_file: Option<PathBuf>,

        /// Write the run's seed file here for later reproduction.
        #[arg(long)]
        save_seed: Option<PathBuf>,

        /// Pace ticks at this frame rate instead of running flat out.
        #[arg(long)]
        fps: Option<u32>,

        /// Composite onto this opaque "#rrggbb" color instead of keeping alpha.
        #[arg(long)]
        background: Option<String>,

        /// Output file path.
        #[arg(short, long, default_value = "output.png")]
        output: PathBuf,
    },
    /// Navigate through route table paths, snapshotting each mounted animation.
    Navigate {
        /// Route table JSON file.
        #[arg(short, long)]
        routes: PathBuf,

        /// Paths to visit, in order.
        #[arg(required = true)]
        paths: Vec<String>,

        /// Ticks to run on each mounted path.
        #[arg(short, long, default_value_t = 600)]
        ticks: u64,

        /// Composite onto this opaque "#rrggbb" color instead of keeping alpha.
        #[arg(long)]
        background: Option<String>,

        /// Directory for the per-path PNG snapshots.
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// List available animations.
    List,
}

/// A tick budget, optionally paced at a fixed frame rate.
struct Schedule {
    budget: FrameBudget,
    pace: Option<FixedInterval>,
}

impl FrameScheduler for Schedule {
    fn next_frame(&mut self) -> bool {
        self.budget.next_frame() && self.pace.as_mut().map_or(true, FixedInterval::next_frame)
    }
}

/// Runs `ticks` ticks and makes sure at least one frame is drawn.
fn run_ticks(
    animation: &mut AnimationKind,
    ticks: u64,
    fps: Option<u32>,
) -> Result<LoopStats, CliError> {
    let mut lp = AnimationLoop::new(Schedule {
        budget: FrameBudget::new(ticks),
        pace: fps.map(FixedInterval::fps),
    });
    lp.start();
    let stats = lp.run(animation)?;
    if stats.rendered == 0 {
        animation.render();
    }
    Ok(stats)
}

fn parse_background(background: Option<&str>) -> Result<Option<Color>, CliError> {
    background
        .map(Color::from_hex)
        .transpose()
        .map_err(|e| CliError::Input(format!("invalid --background: {e}")))
}

fn read_seed(path: &Path) -> Result<Seed, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::Input(format!("invalid seed file {}: {e}", path.display())))
}

/// File name for a route path's snapshot: `/` is `index.png`, `/a/b` is `a_b.png`.
fn snapshot_name(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "index.png".to_string()
    } else {
        format!("{}.png", trimmed.replace('/', "_"))
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let names = AnimationKind::list_animations();
            if cli.json {
                let cache = ImageCache::new();
                let mut schemas = serde_json::Map::new();
                for &name in names {
                    let anim = AnimationKind::from_name(name, 0, &json!({}), &cache)?;
                    schemas.insert(name.to_string(), anim.param_schema());
                }
                print_json(&json!({ "animations": names, "params": schemas }))?;
            } else {
                println!("Animations:");
                for name in names {
                    println!("  {name}");
                }
            }
        }
        Command::Render {
            animation,
            ticks,
            seed,
            params,
            image,
            seed_file,
            save_seed,
            fps,
            background,
            output,
        } => {
            let background = parse_background(background.as_deref())?;
            let run_seed = match seed_file {
                Some(path) => read_seed(&path)?,
                None => {
                    let animation = animation.ok_or_else(|| {
                        CliError::Input("an animation name or --seed-file is required".into())
                    })?;
                    let params: Value = serde_json::from_str(&params)
                        .map_err(|e| CliError::Input(format!("invalid --params JSON: {e}")))?;
                    Seed {
                        animation,
                        params,
                        seed,
                        ticks,
                        image,
                    }
                }
            };

            let cache = ImageCache::new();
            let mut anim = AnimationKind::mount(&run_seed, &cache)?;
            let stats = run_ticks(&mut anim, run_seed.ticks, fps)?;
            write_png(anim.surface(), background, &output)?;

            if let Some(path) = &save_seed {
                fs::write(path, serde_json::to_string_pretty(&run_seed)?)
                    .map_err(|e| CliError::Io(format!("{}: {e}", path.display())))?;
            }

            if cli.json {
                print_json(&json!({
                    "animation": run_seed.animation,
                    "seed": run_seed.seed,
                    "ticks": stats.ticks,
                    "rendered": stats.rendered,
                    "skipped": stats.skipped,
                    "dots": anim.dot_count(),
                    "params": anim.params(),
                    "output": output.display().to_string(),
                }))?;
            } else {
                eprintln!(
                    "rendered {} ({} ticks, {} drawn, {} dots, seed {}) -> {}",
                    run_seed.animation,
                    stats.ticks,
                    stats.rendered,
                    anim.dot_count(),
                    run_seed.seed,
                    output.display()
                );
            }
        }
        Command::Navigate {
            routes,
            paths,
            ticks,
            background,
            out_dir,
        } => {
            let background = parse_background(background.as_deref())?;
            let table = RouteTable::from_path(&routes)?;
            fs::create_dir_all(&out_dir)
                .map_err(|e| CliError::Io(format!("{}: {e}", out_dir.display())))?;
            let mut router = Router::new(table, ImageCache::new());
            let mut visits = Vec::with_capacity(paths.len());

            for path in &paths {
                let visit = match router.navigate(path, false)? {
                    Navigation::Mounted {
                        animation,
                        load_error,
                        ..
                    } => {
                        let output = out_dir.join(snapshot_name(path));
                        let anim = router.current_mut().ok_or_else(|| {
                            CliError::Animation(dotfield_core::AnimationError::InvalidState(
                                format!("{path} mounted but nothing is current"),
                            ))
                        })?;
                        let stats = run_ticks(anim, ticks, None)?;
                        write_png(anim.surface(), background, &output)?;
                        info!(path = %path, output = %output.display(), "snapshot written");
                        if !cli.json {
                            eprintln!(
                                "{path}: {animation} ({} ticks, {} dots) -> {}",
                                stats.ticks,
                                anim.dot_count(),
                                output.display()
                            );
                            if let Some(e) = &load_error {
                                eprintln!("  warning: {e}");
                            }
                        }
                        json!({
                            "path": path,
                            "animation": animation,
                            "ticks": stats.ticks,
                            "output": output.display().to_string(),
                            "load_error": load_error.map(|e| e.to_string()),
                        })
                    }
                    Navigation::Unchanged => {
                        if !cli.json {
                            eprintln!("{path}: already mounted");
                        }
                        json!({ "path": path, "unchanged": true })
                    }
                    Navigation::Fallback { message, .. } => {
                        if !cli.json {
                            println!("{message}");
                        }
                        json!({ "path": path, "fallback": message })
                    }
                };
                visits.push(visit);
            }
            router.unmount();

            if cli.json {
                print_json(&Value::Array(visits))?;
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
