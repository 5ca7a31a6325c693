use clap::Parser;
use log::{error, info};
use soft3d::app::{run_cli, scene_stats};
use soft3d::io::config::Config;
use std::process::ExitCode;

/// Renders a TOML scene of immediate-mode shapes to an image.
#[derive(Parser, Debug)]
#[command(name = "soft3d")]
#[command(about = "Software 3D geometry pipeline driven by a TOML scene")]
struct Args {
    /// Scene file (TOML)
    #[arg(value_name = "FILE")]
    config: String,

    /// Overrides `render.output`
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Print triangle/line/point counts after rendering
    #[arg(long)]
    stats: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    info!("Loading scene '{}'", args.config);
    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(output) = args.output {
        config.render.output = output;
    }

    if let Err(e) = run_cli(&config) {
        error!("Render failed: {}", e);
        return ExitCode::FAILURE;
    }

    if args.stats {
        match scene_stats(&config) {
            Ok(stats) => println!(
                "triangles: {}\nlines: {}\npoints: {}",
                stats.triangles, stats.lines, stats.points
            ),
            Err(e) => {
                error!("Statistics pass failed: {}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
