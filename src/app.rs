use crate::cli::{Cli, Commands, ProfileArgs};
use anyhow::{Context, Result};
use serde::Serialize;
use squeeze::config::{self, Config};
use squeeze::engine::{
    self, BackendChoice, DirectoryPlan, EncoderSettings, EncodingProfile, FrameRate,
    HardwareProbe, HwBackend, Resolution, RunContext, RunLog, RunSettings,
};
use squeeze::prompt::{self, PromptError};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::warn;

pub fn run(cli: Cli) {
    // Handle subcommands first
    let result = match cli.command {
        Some(Commands::CheckHw { json }) => handle_check_hw(json),
        Some(Commands::Scan { directory }) => handle_scan(directory),
        Some(Commands::DryRun {
            directory,
            profile,
            start,
        }) => handle_dry_run(directory, &profile, start),
        Some(Commands::InitConfig) => handle_init_config(),
        None => handle_run(
            cli.directory,
            &cli.profile,
            cli.start,
            cli.interactive,
            cli.quiet,
        ),
    };

    if let Err(e) = result {
        if let Some(PromptError::Cancelled) = e.downcast_ref::<PromptError>() {
            println!("\n{}", PromptError::Cancelled);
            process::exit(0);
        }
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        warn!(error = %format!("{:#}", e), "using built-in defaults");
        Config::default()
    })
}

fn root_dir(directory: Option<PathBuf>) -> PathBuf {
    directory.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Settings with their precedence resolved: CLI, then prompt, then config
struct Resolved {
    profile: EncodingProfile,
    backend: BackendChoice,
}

fn resolve_from_config(args: &ProfileArgs, config: &Config) -> Resolved {
    let defaults = &config.defaults;
    let resolution = args.resolution.unwrap_or_else(|| {
        defaults.resolution().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring configured resolution");
            Resolution::Original
        })
    });
    let frame_rate = args.fps.unwrap_or_else(|| {
        defaults.frame_rate().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring configured fps");
            FrameRate::Original
        })
    });
    let threads = match args.threads {
        Some(n) => config::resolve_threads(n, config::available_cores()),
        None => defaults.threads(),
    };
    let backend = args.backend.unwrap_or_else(|| {
        defaults.backend().unwrap_or_else(|e| {
            warn!(error = %e, "ignoring configured backend");
            BackendChoice::Auto
        })
    });

    Resolved {
        profile: EncodingProfile::new(resolution, frame_rate, threads),
        backend,
    }
}

fn print_probes(probes: &[HardwareProbe]) {
    println!("\nHardware Acceleration Detection:");
    for probe in probes {
        println!(
            "{} {}: {}",
            if probe.available { "✓" } else { "✗" },
            probe.backend.display_name(),
            probe.reason
        );
    }
}

fn pick_backend(settings: &EncoderSettings, choice: BackendChoice, show: bool) -> HwBackend {
    let probes = engine::probe_backends(settings);
    if show {
        print_probes(&probes);
    }
    let selected = engine::select_backend(&probes, choice);
    if let BackendChoice::Force(forced) = choice {
        if show && forced != selected {
            println!("{} is not available on this machine.", forced.display_name());
        }
    }
    selected
}

fn handle_run(
    directory: Option<PathBuf>,
    args: &ProfileArgs,
    start: Option<i64>,
    interactive: bool,
    quiet: bool,
) -> Result<()> {
    let config = load_config();
    let encoder = config.encoder.to_settings();
    let root = root_dir(directory);

    if !quiet {
        println!("Video Re-encoding with Hardware Acceleration");
        println!("{}", "=".repeat(60));
    }
    let version = engine::ffmpeg_version(&encoder)?;
    tracing::debug!(%version, "ffmpeg found");

    let mut resolved = resolve_from_config(args, &config);
    let backend = pick_backend(&encoder, resolved.backend, !quiet);
    if !quiet {
        println!("\nUsing: {}", backend.display_name());
    }

    let plan = engine::discover(&root)?;

    if interactive {
        let mut prompter = prompt::stdio();
        prompter.header()?;
        if args.resolution.is_none() {
            resolved.profile.resolution = prompter.choose_resolution()?;
        }
        if args.fps.is_none() {
            resolved.profile.frame_rate = prompter.choose_frame_rate()?;
        }
        if args.threads.is_none() {
            let cores = config::available_cores();
            resolved.profile.threads =
                prompter.choose_threads(cores, config::resolve_threads(0, cores))?;
        }
    }

    let log_dir = config.log_dir();
    let log = RunLog::create_in(&log_dir, !quiet)?;
    for dir in plan.excluded() {
        log.line(format!(
            "Directory '{}' doesn't contain video files, skipping it.",
            engine::base_name(dir)
        ));
    }
    if plan.is_empty() {
        log.line("No directories with video files found. Exiting.");
        return Ok(());
    }
    report_orphans(&plan, &log);

    let requested = match start {
        Some(index) => Some(index),
        None if interactive => prompt::stdio().choose_start(&plan.directories())?,
        None => None,
    };
    let start_index = engine::select_start_offset(&plan, requested);

    let ctx = Arc::new(RunContext::new(log));
    engine::install_handler(Arc::clone(&ctx))?;

    let settings = RunSettings {
        profile: resolved.profile,
        backend,
        encoder,
        live_progress: !quiet,
    };
    engine::run_plan(&ctx, &plan, start_index, &settings);
    Ok(())
}

fn report_orphans(plan: &DirectoryPlan, log: &RunLog) {
    for dir in plan.directories() {
        for orphan in engine::find_orphaned_temporaries(dir) {
            log.line(format!(
                "Leftover temporary file from an earlier run: {}",
                orphan.display()
            ));
        }
    }
}

#[derive(Serialize)]
struct CheckHwReport<'a> {
    ffmpeg: Option<String>,
    probes: &'a [HardwareProbe],
    selected: HwBackend,
}

fn handle_check_hw(json: bool) -> Result<()> {
    let config = load_config();
    let encoder = config.encoder.to_settings();
    let ffmpeg = engine::ffmpeg_version(&encoder);
    let choice = resolve_from_config(&ProfileArgs::default(), &config).backend;

    let probes = engine::probe_backends(&encoder);
    let selected = engine::select_backend(&probes, choice);

    if json {
        let report = CheckHwReport {
            ffmpeg: ffmpeg.as_ref().ok().cloned(),
            probes: &probes,
            selected,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
        return Ok(());
    }

    match &ffmpeg {
        Ok(version) => println!("ffmpeg found: {}", version),
        Err(e) => println!("ffmpeg: {:#}", e),
    }
    if let Some(device) = engine::hardware::detect_render_device() {
        println!("Render node: {}", device);
    }
    print_probes(&probes);
    println!("\nSelected backend: {}", selected.display_name());
    Ok(())
}

fn handle_scan(directory: Option<PathBuf>) -> Result<()> {
    let dir = root_dir(directory);
    println!("Scanning directory: {}", dir.display());

    let plan = engine::discover(&dir)?;
    let mut total = 0;
    for (i, dir) in plan.directories().into_iter().enumerate() {
        let count = engine::list_media(dir)
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .len();
        total += count;
        println!("  {}: {} ({} video(s))", i, engine::base_name(dir), count);
        for orphan in engine::find_orphaned_temporaries(dir) {
            println!("     leftover temporary: {}", display_name(&orphan));
        }
    }
    for dir in plan.excluded() {
        println!("  -: {} (no videos, skipped)", engine::base_name(dir));
    }
    println!("Planned directories: {}", plan.len());
    println!("Total videos: {}", total);
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn handle_dry_run(directory: Option<PathBuf>, args: &ProfileArgs, start: Option<i64>) -> Result<()> {
    let config = load_config();
    let encoder = config.encoder.to_settings();
    let dir = root_dir(directory);
    println!("Dry run: building ffmpeg commands for {}", dir.display());

    let resolved = resolve_from_config(args, &config);
    let backend = pick_backend(&encoder, resolved.backend, false);
    let plan = engine::discover(&dir)?;
    let start_index = engine::select_start_offset(&plan, start);

    let settings = RunSettings {
        profile: resolved.profile,
        backend,
        encoder,
        live_progress: false,
    };
    let invocations = engine::plan_invocations(&plan, start_index, &settings);
    for (entry, invocation) in &invocations {
        if entry.is_renamed() {
            println!("# {} -> {}", entry.raw_name, entry.normalized_name);
        }
        println!("{}", invocation);
    }
    println!("Total invocations: {}", invocations.len());
    Ok(())
}

fn handle_init_config() -> Result<()> {
    let path = Config::config_path()?;
    if path.exists() {
        let cfg = Config::load_from(&path)?;
        println!("Config loaded successfully from {}", path.display());
        println!("{:#?}", cfg);
    } else {
        println!("Creating default config...");
        Config::default().save_to(&path)?;
        println!("Default config saved to {}", path.display());
    }
    Ok(())
}
