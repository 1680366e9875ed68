use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;

use orrery::assets::GltfResolver;
use orrery::config::OrreryConfig;
use orrery::engine;
use orrery::orrery::{Orrery, PlacementRequest};

/// Places a solar system at an anchor point and runs its orbits headless.
#[derive(Parser, Debug)]
#[command(name = "orrery", version)]
struct Args {
    /// TOML file describing the system. Defaults to the built-in nine-body system.
    #[arg(long)]
    config: Option<PathBuf>,

    /// World-space point the system is anchored to, as x,y,z.
    #[arg(long, value_parser = parse_vec3, default_value = "0,0,-1", allow_hyphen_values = true)]
    anchor: Vec3,

    #[arg(long, default_value_t = 600)]
    frames: u32,

    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Log body positions every this many frames.
    #[arg(long, default_value_t = 60)]
    report_every: u32,
}

fn parse_vec3(text: &str) -> Result<Vec3, String> {
    let parts = text
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<f32>, _>>()
        .map_err(|err| format!("invalid coordinate in {:?}: {}", text, err))?;

    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got {:?}", text)),
    }
}

fn main() -> Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => OrreryConfig::load(path)?,
        None => OrreryConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let resolver = Arc::new(GltfResolver::new(config.asset_dir.clone()));
    let mut orrery = Orrery::new(config, resolver);

    let Some(system) =
        runtime.block_on(orrery.on_anchor_requested(PlacementRequest::at(args.anchor)))
    else {
        log::warn!("Nothing was placed");
        return Ok(());
    };

    let dt = Duration::from_millis(args.frame_ms);
    let report_every = args.report_every.max(1);

    for frame in 0..args.frames {
        engine::update(&mut orrery, dt).context("Error during engine::update")?;

        if frame % report_every == 0 {
            for (name, position) in orrery.body_positions(system) {
                log::info!(
                    "frame {:>5} {:<8} ({:>7.3}, {:>7.3}, {:>7.3})",
                    frame,
                    name,
                    position.x,
                    position.y,
                    position.z
                );
            }
        }
    }

    orrery.remove(system);
    Ok(())
}
