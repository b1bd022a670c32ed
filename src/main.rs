use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use firn::catalog::{scene_start_secs, validate_catalog, SCENES, TOTAL_DURATION_SECS};
use firn::config::load_player_config;
use firn::render::FrameRenderer;
use firn::sequence::resolve_scene;
use firn::soundscape::Soundscape;
use firn::transport::{Phase, Transport};

#[derive(Debug, Parser)]
#[command(name = "firn")]
#[command(about = "FIRN: a sixty-second generative mountain cinematic")]
#[command(version = build_version())]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open the interactive player window.
    #[cfg(feature = "play")]
    Play {
        /// Optional YAML player config.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Start with the soundscape muted.
        #[arg(long)]
        muted: bool,
    },
    /// Play the soundscape over the full timeline without a window.
    Audition {
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Export the cinematic as numbered PNG frames.
    Render {
        /// Output directory for the frames.
        #[arg(short = 'o', long = "out")]
        out: PathBuf,
        /// Frames per second (defaults to the config's render.fps).
        #[arg(long)]
        fps: Option<u32>,
        /// First second of the sequence to export.
        #[arg(long, default_value_t = 0.0)]
        from: f32,
        /// Last second of the sequence to export (defaults to the full 60).
        #[arg(long)]
        to: Option<f32>,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the scene table.
    Timeline {
        /// Emit a machine-readable JSON document instead of the table.
        #[arg(long)]
        json: bool,
    },
    /// Validate the scene catalog and an optional config.
    Check {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn build_version() -> String {
    match option_env!("FIRN_GIT_HASH") {
        Some(hash) => format!("{} ({hash})", env!("CARGO_PKG_VERSION")),
        None => env!("CARGO_PKG_VERSION").to_owned(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        #[cfg(feature = "play")]
        Commands::Play { config, muted } => firn::play::run_play(config.as_deref(), muted),
        Commands::Audition { config } => run_audition(config.as_deref()),
        Commands::Render {
            out,
            fps,
            from,
            to,
            config,
        } => run_render(&out, fps, from, to, config.as_deref()),
        Commands::Timeline { json } => run_timeline(json),
        Commands::Check { config } => run_check(config.as_deref()),
    }
}

fn run_check(config_path: Option<&Path>) -> Result<()> {
    validate_catalog(&SCENES)?;
    let config = load_player_config(config_path)?;

    println!(
        "OK: {} scenes, {}s total; window {}x{}, audio {}, render {} fps",
        SCENES.len(),
        TOTAL_DURATION_SECS,
        config.window.width,
        config.window.height,
        if config.audio.enabled { "on" } else { "off" },
        config.render.fps
    );
    Ok(())
}

fn run_timeline(json: bool) -> Result<()> {
    validate_catalog(&SCENES)?;

    if json {
        let scenes: Vec<serde_json::Value> = SCENES
            .iter()
            .enumerate()
            .map(|(index, scene)| {
                let start = scene_start_secs(&SCENES, index);
                serde_json::json!({
                    "index": index,
                    "id": scene.id,
                    "label": scene.label,
                    "tone": scene.tone,
                    "start_secs": start,
                    "end_secs": start + scene.duration_secs,
                    "duration_secs": scene.duration_secs,
                })
            })
            .collect();
        let document = serde_json::json!({
            "total_duration_secs": TOTAL_DURATION_SECS,
            "scenes": scenes,
        });
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    println!(
        " #  {:<10} {:<10} {:>6} {:>6} {:>5}  label",
        "id", "tone", "start", "end", "dur"
    );
    for (index, scene) in SCENES.iter().enumerate() {
        let start = scene_start_secs(&SCENES, index);
        println!(
            "{:>2}  {:<10} {:<10} {:>6.1} {:>6.1} {:>5.1}  {}",
            index,
            scene.id,
            format!("{:?}", scene.tone).to_lowercase(),
            start,
            start + scene.duration_secs,
            scene.duration_secs,
            scene.label
        );
    }
    println!("total: {}s", TOTAL_DURATION_SECS);
    Ok(())
}

fn run_render(
    out: &Path,
    fps_override: Option<u32>,
    from: f32,
    to: Option<f32>,
    config_path: Option<&Path>,
) -> Result<()> {
    validate_catalog(&SCENES)?;
    let config = load_player_config(config_path)?;

    let fps = fps_override.unwrap_or(config.render.fps);
    if fps == 0 {
        bail!("fps must be > 0");
    }
    let from = from.clamp(0.0, TOTAL_DURATION_SECS);
    let to = to
        .unwrap_or(TOTAL_DURATION_SECS)
        .clamp(0.0, TOTAL_DURATION_SECS);
    if to <= from {
        bail!("--to ({to}) must be greater than --from ({from})");
    }

    std::fs::create_dir_all(out)
        .with_context(|| format!("failed to create output directory {}", out.display()))?;

    let mut renderer = FrameRenderer::new(config.window.width, config.window.height)?;
    let total_frames = ((to - from) * fps as f32).ceil().max(1.0) as u32;

    for frame_index in 0..total_frames {
        let elapsed = from + frame_index as f32 / fps as f32;
        let state = resolve_scene(elapsed, &SCENES);
        let data = renderer.render(&SCENES, &state).to_vec();
        let image = image::RgbaImage::from_raw(config.window.width, config.window.height, data)
            .context("frame buffer size mismatch")?;
        let path = out.join(format!("frame_{frame_index:05}.png"));
        image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;

        if frame_index % fps == 0 {
            eprintln!("[firn] rendered frame {}/{}", frame_index + 1, total_frames);
        }
    }

    let info = serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "width": config.window.width,
        "height": config.window.height,
        "fps": fps,
        "from_secs": from,
        "to_secs": to,
        "frames": total_frames,
        "scenes": SCENES.iter().map(|scene| scene.id).collect::<Vec<_>>(),
    });
    let info_path = out.join("render-info.json");
    std::fs::write(&info_path, serde_json::to_string_pretty(&info)?)
        .with_context(|| format!("failed to write {}", info_path.display()))?;

    println!("Wrote {} frame(s) to {}", total_frames, out.display());
    Ok(())
}

fn run_audition(config_path: Option<&Path>) -> Result<()> {
    validate_catalog(&SCENES)?;
    let config = load_player_config(config_path)?;

    let mut soundscape = Soundscape::new(config.audio.master_gain, config.audio.enabled);
    let mut transport = Transport::new();
    transport.set_mute(config.audio.start_muted);
    transport.start();

    // Invoking the command is the user gesture for the native engine.
    if !transport.is_muted() {
        soundscape.ensure_initialized();
    }

    eprintln!(
        "[firn] audition: {} scenes over {}s",
        SCENES.len(),
        TOTAL_DURATION_SECS
    );

    let mut last_index = usize::MAX;
    loop {
        std::thread::sleep(Duration::from_millis(16));
        transport.tick(Instant::now());

        let state = resolve_scene(transport.elapsed(), &SCENES);
        let scene = &SCENES[state.index];
        soundscape.retarget(scene, state.progress);
        soundscape.set_master(transport.is_running(), transport.is_muted());

        if state.index != last_index {
            last_index = state.index;
            eprintln!(
                "[firn] {} | {} | {}",
                timestamp(state.total_elapsed),
                scene.id,
                scene.label
            );
        }

        if transport.phase() == Phase::Complete {
            break;
        }
    }

    // Let the master fade-out breathe before tearing the stream down.
    soundscape.set_master(false, transport.is_muted());
    if soundscape.is_initialized() {
        std::thread::sleep(Duration::from_millis(1_600));
    }

    println!("Sequence complete at {}", timestamp(TOTAL_DURATION_SECS));
    Ok(())
}

fn timestamp(secs: f32) -> String {
    let whole = secs.max(0.0).floor() as u32;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}
