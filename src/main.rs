use anyhow::Context;
use bevy::prelude::*;
use clap::Parser;

use marble_race::{GameConfig, GamePlugin};

#[derive(Parser, Debug)]
#[command(name = "marble_race", about = "Procedural marble race with a metaball field renderer")]
struct Args {
    /// Config file (RON); defaults are used for anything missing.
    #[arg(long, default_value = "assets/config/game.ron")]
    config: String,
    /// Override window width.
    #[arg(long)]
    width: Option<f32>,
    /// Override window height.
    #[arg(long)]
    height: Option<f32>,
    /// Initial speed multiplier.
    #[arg(long)]
    speed: Option<f32>,
    /// Exit after N seconds (headless smoke runs).
    #[arg(long)]
    auto_close: Option<f32>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (mut cfg, load_err) = GameConfig::load_or_default(&args.config);
    if let Some(e) = load_err {
        eprintln!("config: {e}; using defaults");
    }
    if let Some(w) = args.width {
        cfg.window.width = w;
    }
    if let Some(h) = args.height {
        cfg.window.height = h;
    }
    if let Some(s) = args.speed {
        cfg.speed.initial = s;
    }
    if let Some(t) = args.auto_close {
        cfg.window.auto_close = t;
    }
    for warning in cfg.validate() {
        eprintln!("config warning: {warning}");
    }

    let exit = App::new()
        .insert_resource(cfg.clone())
        .add_plugins(
            DefaultPlugins.set(WindowPlugin {
                primary_window: Some(Window {
                    title: cfg.window.title.clone(),
                    resolution: (cfg.window.width, cfg.window.height).into(),
                    resizable: true,
                    ..default()
                }),
                ..default()
            }),
        )
        .add_plugins(GamePlugin)
        .run();

    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => Err(anyhow::anyhow!("exited with error code {code}"))
            .context("GPU preconditions failed or runtime error"),
    }
}
