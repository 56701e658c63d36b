use anyhow::Context;
use crossterm::{
    cursor::{Hide, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::env;
use std::io::{stdout, BufWriter, Stdout, Write};
use std::time::{Duration, Instant};

use starfall::{Raster, Starfield, Surface, term::HalfBlockPresenter};

struct Options {
    seed: Option<u64>,
    bg_color: (u8, u8, u8),
    fps: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self { seed: None, bg_color: (0, 0, 0), fps: 60 }
    }
}

fn print_usage() {
    eprintln!("starfall - Drifting starfield with shooting stars for your terminal");
    eprintln!();
    eprintln!("Usage: starfall [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --seed N           Seed the particle field for a reproducible sky");
    eprintln!("  --bg-color RRGGBB  Set background color as hex (e.g., --bg-color 1a1b26)");
    eprintln!("  --fps N            Target frame rate (default 60)");
    eprintln!();
    eprintln!("Press 'q', ESC, or Ctrl+C to exit");
}

fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;

    Some((r, g, b))
}

fn is_exit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('q')
        || key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

// One raster pixel per half-block cell, so the field runs at DPR 1 over a
// cols x rows*2 surface.
fn cell_surface(cols: u16, rows: u16) -> (u32, u32) {
    (cols as u32, rows as u32 * 2)
}

fn run_loop(out: &mut BufWriter<Stdout>, opts: &Options) -> anyhow::Result<()> {
    let (cols, rows) = terminal::size()?;
    let (mut w, mut h) = cell_surface(cols, rows);

    let rng = match opts.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let mut field = Starfield::new(w as f32, h as f32, rng);
    let mut raster =
        Raster::new(w.max(1), h.max(1), 1.0).context("acquiring the drawing surface")?;
    let mut presenter = HalfBlockPresenter::new(opts.bg_color);
    log::debug!(
        "starfield {:?} cells, {} drift particles",
        raster.logical_size(),
        field.drift_count()
    );

    let fixed_dt = 1.0 / opts.fps.max(1) as f32;
    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;

    loop {
        if event::poll(Duration::from_millis(1))? {
            match event::read()? {
                Event::Key(key) if is_exit(&key) => break,
                Event::Resize(cols, rows) => {
                    (w, h) = cell_surface(cols, rows);
                    field.resize(w as f32, h as f32);
                    raster = Raster::new(w.max(1), h.max(1), 1.0)
                        .context("re-acquiring the drawing surface after resize")?;
                    execute!(out, Clear(ClearType::All))?;
                }
                _ => {}
            }
        }

        let now = Instant::now();
        accumulator += now.duration_since(last_frame).as_secs_f32();
        last_frame = now;
        if accumulator > fixed_dt * 3.0 {
            accumulator = fixed_dt * 3.0;
        }

        while accumulator >= fixed_dt {
            field.advance(&mut raster);
            accumulator -= fixed_dt;
        }

        presenter.present(&raster, out)?;
    }

    Ok(())
}

fn run(opts: &Options) -> anyhow::Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All))?;

    let result = run_loop(&mut stdout, opts);

    execute!(stdout, Show, LeaveAlternateScreen)?;
    stdout.flush()?;
    terminal::disable_raw_mode()?;

    result
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse() {
                        Ok(seed) => {
                            opts.seed = Some(seed);
                            i += 2;
                        }
                        Err(_) => {
                            eprintln!("Invalid seed: {}", args[i + 1]);
                            std::process::exit(1);
                        }
                    }
                } else {
                    eprintln!("--seed requires a number");
                    std::process::exit(1);
                }
            }
            "--bg-color" => {
                if i + 1 < args.len() {
                    if let Some(color) = parse_hex_color(&args[i + 1]) {
                        opts.bg_color = color;
                        i += 2;
                    } else {
                        eprintln!("Invalid hex color: {}", args[i + 1]);
                        eprintln!("Expected format: RRGGBB (e.g., 1a1b26)");
                        std::process::exit(1);
                    }
                } else {
                    eprintln!("--bg-color requires a hex color value");
                    std::process::exit(1);
                }
            }
            "--fps" => {
                if i + 1 < args.len() {
                    match args[i + 1].parse::<u32>() {
                        Ok(fps) if fps > 0 => {
                            opts.fps = fps;
                            i += 2;
                        }
                        _ => {
                            eprintln!("Invalid frame rate: {}", args[i + 1]);
                            std::process::exit(1);
                        }
                    }
                } else {
                    eprintln!("--fps requires a number");
                    std::process::exit(1);
                }
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            arg => {
                eprintln!("Unknown option: {}", arg);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    if let Err(e) = run(&opts) {
        log::error!("starfall: {:#}", e);
        return Err(e);
    }
    Ok(())
}
