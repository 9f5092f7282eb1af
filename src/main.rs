use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;

use turing_rave::color::find_scheme;
use turing_rave::disturb::Chemical;
use turing_rave::params::find_preset;
use turing_rave::{Config, Result, Simulation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AudioChoice {
    None,
    Synth,
    Mic,
}

impl FromStr for AudioChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "off" => Ok(AudioChoice::None),
            "synth" | "music" => Ok(AudioChoice::Synth),
            "mic" | "microphone" => Ok(AudioChoice::Mic),
            other => Err(format!("unknown audio source {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point(f32, f32);

impl FromStr for Point {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected x,y got {:?}", s))?;
        let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| e.to_string());

        Ok(Point(parse(x)?, parse(y)?))
    }
}

/// Headless Gray-Scott reaction-diffusion renderer with audio-reactive
/// modulation.
#[derive(Debug, Parser)]
#[clap(version)]
struct Opts {
    /// TOML configuration file [default: turing-rave.toml when present]
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Number of frames to run.
    #[clap(short, long, default_value = "600")]
    frames: usize,

    /// Pattern preset, e.g. "Mitosis" or "Maze Runner".
    #[clap(short, long)]
    preset: Option<String>,

    /// Color scheme name or index.
    #[clap(short, long)]
    scheme: Option<String>,

    /// Audio source driving the modulation: none, synth or mic.
    #[clap(short, long, default_value = "none")]
    audio: AudioChoice,

    /// Simulation speed, two steps per frame per unit.
    #[clap(long)]
    speed: Option<f32>,

    /// Fixed random seed.
    #[clap(long)]
    seed: Option<u64>,

    /// Pointer positions (display pixels, `x,y`) painted before the first frame.
    #[clap(long)]
    paint: Vec<Point>,

    /// Chemical painted by `--paint`: A seeds, B erases.
    #[clap(long, default_value = "A")]
    chemical: Chemical,

    /// Directory the frames are written to.
    #[clap(short, long, default_value = "img")]
    out: PathBuf,

    /// Save every frame and stitch them into a video with ffmpeg.
    #[clap(long)]
    video: bool,

    /// Video framerate.
    #[clap(long, default_value = "60")]
    framerate: u32,
}

fn main() -> Result<()> {
    env_logger::init();

    let opts = Opts::parse();

    let mut config = Config::load(opts.config.as_deref())?;
    if opts.seed.is_some() {
        config.seed = opts.seed;
    }
    if let Some(speed) = opts.speed {
        config.speed = speed;
    }

    let mut sim = Simulation::new(&config)?;

    if let Some(name) = &opts.preset {
        let preset = find_preset(name)?;
        sim.apply_preset(preset);
    }
    if let Some(key) = &opts.scheme {
        let index = find_scheme(sim.schemes(), key)?;
        sim.select_scheme(index)?;
    }

    sim.select_chemical(opts.chemical);
    for Point(x, y) in &opts.paint {
        sim.paint((*x, *y));
    }

    match opts.audio {
        AudioChoice::None => {}
        AudioChoice::Synth => {
            sim.toggle_synth();
        }
        AudioChoice::Mic => {
            if let Err(err) = sim.toggle_microphone() {
                log::warn!("running without audio: {}", err);
            }
        }
    }
    log::info!("audio: {}", sim.audio().status());

    prepare_output_dir(&opts.out)?;

    let start_ts = Instant::now();
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    for i in 1..=opts.frames {
        write!(
            stdout,
            "\r frame: {} pattern: {} F: {} K: {}",
            i,
            sim.pattern_name(),
            sim.params().feed_label(),
            sim.params().kill_label()
        )?;
        stdout.flush()?;

        sim.frame();

        if opts.video {
            sim.save_png(opts.out.join(format!("frame-{}.png", i)))?;
        }
    }

    let elapsed = start_ts.elapsed();

    if opts.video {
        let status = Command::new("ffmpeg")
            .arg("-framerate")
            .arg(opts.framerate.to_string())
            .arg("-i")
            .arg(opts.out.join("frame-%d.png"))
            .args(&["-pix_fmt", "yuv420p", "-y", "turing-rave.mp4"])
            .status()?;

        if !status.success() {
            log::warn!("ffmpeg exited with {}", status);
        }
    } else {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        sim.save_png(opts.out.join(format!("turing-rave-{}.png", millis)))?;
    }

    writeln!(
        stdout,
        r#"
*** Results ***

{} frames took {} min {} secs
"#,
        sim.frames(),
        elapsed.as_secs() / 60,
        elapsed.as_secs() % 60
    )?;

    Ok(())
}

/// Creates `dir` if needed and clears out frames from a previous run.
fn prepare_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)?;
    }

    for entry in dir.read_dir()? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("frame-") && name.ends_with(".png") {
            fs::remove_file(entry.path())?;
        }
    }

    Ok(())
}
