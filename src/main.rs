use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use log::debug;
use minifb::{Key, KeyRepeat, Window, WindowOptions};

use tile_engine::config::EngineConfig;
use tile_engine::engine::Engine;
use tile_engine::tileset::Tileset;

#[derive(Parser, Debug)]
#[command(name = "tile_engine")]
#[command(about = "Stream and render an endless isometric tile terrain")]
struct Args {
    /// Window width in pixels
    #[arg(short = 'W', long, default_value = "1024")]
    width: usize,

    /// Window height in pixels
    #[arg(short = 'H', long, default_value = "768")]
    height: usize,

    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Tileset atlas PNG (procedural tiles if not specified or unreadable)
    #[arg(short, long)]
    tileset: Option<PathBuf>,

    /// Edge length of a terrain field chunk; must be 2^k + 1
    #[arg(long, default_value = "129")]
    field_size: usize,

    /// Height field roughness, 0.0 to 1.0
    #[arg(long, default_value = "0.5")]
    roughness: f64,

    /// Biome field roughness, 0.0 to 1.0
    #[arg(long, default_value = "0.5")]
    biome_roughness: f64,

    /// Repaint the whole frame every tick instead of incrementally
    #[arg(long)]
    full: bool,

    /// Disable blended tiles across surface-type edges
    #[arg(long)]
    no_blend: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let seed = args.seed.unwrap_or_else(rand::random);
    let config = EngineConfig {
        field_size: args.field_size,
        height_roughness: args.roughness,
        biome_roughness: args.biome_roughness,
        ..Default::default()
    };

    let tileset = args
        .tileset
        .as_deref()
        .and_then(|path| Tileset::load(path, &config))
        .unwrap_or_else(|| Tileset::procedural(&config, seed));

    let mut engine = match Engine::new(config, tileset, seed, args.width, args.height) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };
    engine.set_blend(!args.no_blend);
    engine.set_incremental(!args.full);

    println!("Tile engine started with seed {}", seed);
    println!("Controls:");
    println!("  Arrows: pan");
    println!("  +/-: zoom");
    println!("  Space: toggle autoscroll");
    println!("  F: toggle edge blending");
    println!("  Tab: toggle incremental repaint");
    println!("  Esc: exit");

    let mut window = Window::new(
        "Tile Engine - Arrows: Pan, +/-: Zoom, Space: Autoscroll, Esc: Exit",
        args.width,
        args.height,
        WindowOptions {
            resize: false,
            scale: minifb::Scale::X1,
            ..WindowOptions::default()
        },
    )
    .expect("Failed to create window");

    // Limit to ~60fps
    window.set_target_fps(60);

    let mut autoscroll = true;
    let start = Instant::now();
    let speed = engine.config().scroll_speed;

    while window.is_open() && !window.is_key_down(Key::Escape) {
        if window.is_key_pressed(Key::Space, KeyRepeat::No) {
            autoscroll = !autoscroll;
        }
        if window.is_key_pressed(Key::F, KeyRepeat::No) {
            let blend = !engine.blend();
            engine.set_blend(blend);
            println!("Edge blending: {}", if blend { "on" } else { "off" });
        }
        if window.is_key_pressed(Key::Tab, KeyRepeat::No) {
            let incremental = !engine.incremental();
            engine.set_incremental(incremental);
            println!(
                "Repaint: {}",
                if incremental { "incremental" } else { "full" }
            );
        }

        if window.is_key_down(Key::Equal) {
            engine.set_zoom(engine.zoom() * 1.02);
        }
        if window.is_key_down(Key::Minus) {
            engine.set_zoom(engine.zoom() / 1.02);
        }

        let mut dx = 0.0;
        let mut dy = 0.0;
        if window.is_key_down(Key::Left) {
            dx += speed;
        }
        if window.is_key_down(Key::Right) {
            dx -= speed;
        }
        if window.is_key_down(Key::Up) {
            dy += speed;
        }
        if window.is_key_down(Key::Down) {
            dy -= speed;
        }
        if autoscroll {
            // slow circular drift over the world
            let t = start.elapsed().as_secs_f64() * 0.5;
            dx += speed * t.cos();
            dy += speed * t.sin();
        }
        if dx != 0.0 || dy != 0.0 {
            engine.pan(dx, dy);
        }

        engine.tick();
        debug!(
            "tick: {} tiles, {} chunks visible, {} resident, {:.2} ms",
            engine.stats().tiles_drawn,
            engine.stats().chunks_visible,
            engine.resident_chunks(),
            engine.stats().draw_ms
        );

        window
            .update_with_buffer(engine.frame(), args.width, args.height)
            .expect("Failed to update window");
    }
}
