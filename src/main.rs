use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use mocap_blend::settings::Settings;
use mocap_blend::{LoopMode, Motion, MotionLibrary, Skeleton};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mocap-blend", version, about = "Load, loop and mix BVH motion clips")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a clip and print its summary
    Inspect {
        path: PathBuf,
        #[arg(long)]
        loop_mode: Option<LoopMode>,
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Find the best matching frames of TARGET for every frame of SOURCE
    Mix {
        source: PathBuf,
        target: PathBuf,
        /// Write distance and winner tables into this directory
        #[arg(long)]
        plot_dir: Option<PathBuf>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        loop_mode: Option<LoopMode>,
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Play a clip for a while and print the root joint position per tick
    Play {
        path: PathBuf,
        #[arg(long, default_value_t = 1.0)]
        seconds: f32,
        #[arg(long, default_value_t = 1.0 / 30.0)]
        dt: f32,
        /// Move the root along its front while playing
        #[arg(long)]
        walk: bool,
    },
    /// Store default settings and print the stored values
    Config {
        #[arg(long)]
        plots: Option<bool>,
        #[arg(long)]
        plot_dir: Option<PathBuf>,
        #[arg(long)]
        loop_mode: Option<LoopMode>,
        #[arg(long)]
        steps: Option<u32>,
        #[arg(long)]
        scale: Option<f32>,
    },
}

#[derive(Serialize)]
struct MixReport<'a> {
    source: &'a str,
    target: &'a str,
    entries: Vec<MixEntry>,
}

#[derive(Serialize)]
struct MixEntry {
    source_frame: usize,
    target_frame: usize,
    transition_frames: usize,
}

fn clip_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "motion".to_string())
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let settings = Settings::load();

    match cli.command {
        Command::Inspect {
            path,
            loop_mode,
            steps,
        } => {
            let loop_mode = loop_mode.unwrap_or(settings.playback.loop_mode);
            let steps = steps.unwrap_or(settings.playback.transition_steps);
            let motion = Motion::create(&clip_name(&path), &path, loop_mode, steps)
                .with_context(|| format!("Failed to load '{}'", path.display()))?;

            println!("Motion: {}", motion.name);
            println!("  Joints: {}", motion.joints.len());
            for joint in motion.joints.iter() {
                println!("    {} (parent: {:?})", joint.name, joint.parent);
            }
            println!("  Frames: {}", motion.len());
            println!("  Frame time: {}", motion.time_step);
            println!("  Duration: {:.3}s", motion.duration());
            println!("  Max step: {:.4}", motion.max_step());
        }
        Command::Mix {
            source,
            target,
            plot_dir,
            json,
            loop_mode,
            steps,
        } => {
            let loop_mode = loop_mode.unwrap_or(settings.playback.loop_mode);
            let steps = steps.unwrap_or(settings.playback.transition_steps);
            let plot_dir = plot_dir.or_else(|| settings.plots.dir().map(Path::to_path_buf));

            let source_name = clip_name(&source);
            let target_name = clip_name(&target);
            if source_name == target_name {
                bail!("Source and target need different file names, both are '{source_name}'");
            }

            let mut library = MotionLibrary::new().with_plot_dir(plot_dir);
            library
                .add(&source_name, &source, loop_mode, steps)
                .with_context(|| format!("Failed to load '{}'", source.display()))?;
            library
                .add(&target_name, &target, loop_mode, steps)
                .with_context(|| format!("Failed to load '{}'", target.display()))?;

            let mm = library.mix(&source_name, &target_name)?;
            let report = MixReport {
                source: &source_name,
                target: &target_name,
                entries: mm
                    .iter()
                    .map(|(f1, entry)| MixEntry {
                        source_frame: *f1,
                        target_frame: entry.frame,
                        transition_frames: entry.transition.len(),
                    })
                    .collect(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{} -> {}", report.source, report.target);
                for entry in &report.entries {
                    println!("  {} -> {}", entry.source_frame, entry.target_frame);
                }
            }
        }
        Command::Play {
            path,
            seconds,
            dt,
            walk,
        } => {
            if !dt.is_finite() || dt <= 0.0 {
                bail!("--dt must be a positive number");
            }
            let playback = &settings.playback;
            let name = clip_name(&path);

            let mut skeleton = Skeleton::new(MotionLibrary::new(), playback.skeleton_scale);
            skeleton
                .add_motion(&name, &path, playback.loop_mode, playback.transition_steps)
                .with_context(|| format!("Failed to load '{}'", path.display()))?;
            skeleton.set_motion(&name)?;

            let ticks = (seconds / dt).ceil() as usize;
            for tick in 0..ticks {
                skeleton.update(dt);
                if walk {
                    skeleton.move_front(dt);
                }
                let frame = skeleton.frame_index().unwrap_or(0);
                if let Some(root) = skeleton.joint_positions().first() {
                    println!(
                        "{:>5} frame {:>4}  root ({:.3}, {:.3}, {:.3})",
                        tick, frame, root.x, root.y, root.z
                    );
                }
            }
        }
        Command::Config {
            plots,
            plot_dir,
            loop_mode,
            steps,
            scale,
        } => {
            let mut settings = settings;
            if plots.is_some() || plot_dir.is_some() {
                if let Some(enabled) = plots {
                    settings.plots.enabled = enabled;
                }
                if let Some(dir) = plot_dir {
                    settings.plots.plot_dir = dir;
                }
                settings.plots.save();
            }
            if loop_mode.is_some() || steps.is_some() || scale.is_some() {
                if let Some(mode) = loop_mode {
                    settings.playback.loop_mode = mode;
                }
                if let Some(steps) = steps {
                    settings.playback.transition_steps = steps;
                }
                if let Some(scale) = scale {
                    settings.playback.skeleton_scale = scale;
                }
                settings.playback.save();
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
