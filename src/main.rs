//! centerframe - crop images to their content and re-center them
//!
//! CLI entry point

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use centerframe::compose::{resolve_margin, DEFAULT_PREVIEW_BACKDROP, DEFAULT_PREVIEW_SIZE};
use centerframe::settings::{sanitize_final_size, sanitize_margin_percentage, FIELD_NAMES};
use centerframe::{
    exit_codes, output_filename, pasted_image_name, to_data_url,
    // CLI
    Cli, Commands, ProcessArgs, SettingsAction, SettingsArgs,
    // Config
    CliOverrides, Config,
    // Core
    CanvasLayout, CompositeRenderer, CompositionSettings, ContentBoundingBoxDetector, ImageCodec,
    ImageRsCodec, MemoryStore, OutputFormat, Pipeline, PipelineConfig, PipelineError, PixelBuffer,
    // Progress
    OutputMode, ProcessingStage, ProgressCallback,
    // Settings
    JsonFileStore, MarginSpec, SettingsManager,
};

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Process(args) => run_process(&cli, args),
        Commands::Settings(args) => run_settings(&cli, args),
        Commands::Info => run_info(&cli),
    };

    std::process::exit(match result {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            match e.downcast_ref::<PipelineError>() {
                Some(PipelineError::NoContentFound) => exit_codes::NO_CONTENT,
                _ => exit_codes::GENERAL_ERROR,
            }
        }
    });
}

/// Log level from -v count unless RUST_LOG is set
fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("centerframe={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// ============ Progress Callback Implementation ============

/// Stage printer for CLI output
struct VerboseProgress {
    mode: OutputMode,
}

impl ProgressCallback for VerboseProgress {
    fn on_stage(&self, stage: ProcessingStage) {
        if self.mode.should_show(OutputMode::Verbose) {
            eprintln!("  {}", stage.status_message());
        }
    }

    fn on_stage_complete(&self, stage: ProcessingStage, message: &str) {
        if self.mode.should_show(OutputMode::VeryVerbose) {
            eprintln!("    {}: {}", stage.name(), message);
        }
    }
}

fn output_mode(cli: &Cli) -> OutputMode {
    if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::from_verbosity(cli.verbose)
    }
}

// ============ Process Command ============

fn run_process(cli: &Cli, args: &ProcessArgs) -> anyhow::Result<()> {
    let start_time = Instant::now();
    let mode = output_mode(cli);

    let file_config = load_config(cli);
    let overrides = args.overrides(cli.settings_file.clone());
    let pipeline_config = file_config.merge_with_cli(&overrides);

    let manager = SettingsManager::load(JsonFileStore::new(
        file_config.settings_store_path(&overrides),
    ));
    let settings = apply_layout_overrides(args, manager.settings())?;

    // Read input
    let (raw, source_name, source_dir) = if args.is_stdin() {
        let mut raw = Vec::new();
        std::io::stdin()
            .read_to_end(&mut raw)
            .context("Could not read stdin")?;
        (raw, pasted_image_name(Utc::now()), PathBuf::from("."))
    } else {
        let path = Path::new(&args.input);
        if !path.is_file() {
            eprintln!("Error: Input file does not exist: {}", path.display());
            std::process::exit(exit_codes::INPUT_NOT_FOUND);
        }
        let raw = std::fs::read(path)
            .with_context(|| format!("Could not read file: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        (raw, name, dir)
    };

    let filename = output_filename(
        &source_name,
        settings.final_width(),
        settings.final_height(),
        pipeline_config.output_format,
    );
    let output_path = resolve_output_path(args.output.as_deref(), &source_dir, &filename);

    if args.dry_run {
        print_execution_plan(args, &pipeline_config, &settings, &output_path);
        return Ok(());
    }

    let pipeline = Pipeline::new(pipeline_config);
    let progress = VerboseProgress { mode };
    let output = pipeline.process_with_progress(&raw, &settings, &progress)?;

    // Nothing is written unless encoding fully succeeded
    if args.data_url {
        println!("{}", to_data_url(&output.bytes, output.format));
    } else {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&output_path, &output.bytes)
            .with_context(|| format!("Could not write {}", output_path.display()))?;
    }

    if let Some(preview_path) = &args.preview {
        let preview = CompositeRenderer::render_preview(
            &output.composition,
            DEFAULT_PREVIEW_SIZE,
            DEFAULT_PREVIEW_BACKDROP,
        )?;
        save_side_image(&preview, preview_path, pipeline.config().jpeg_quality)
            .with_context(|| format!("Could not write preview {}", preview_path.display()))?;
    }

    if let Some(debug_path) = &args.debug_bbox {
        let source = ImageRsCodec.decode(&raw)?;
        let overlay = ContentBoundingBoxDetector::draw_overlay(&source, &output.bbox);
        save_side_image(&overlay, debug_path, pipeline.config().jpeg_quality)
            .with_context(|| format!("Could not write debug image {}", debug_path.display()))?;
    }

    if mode.should_show(OutputMode::Normal) && !args.data_url {
        let p = output.placement();
        println!(
            "Cropped {}x{} -> {}x{} at ({:.2}, {:.2}), scale {:.4}",
            output.bbox.width(),
            output.bbox.height(),
            output.output_size().0,
            output.output_size().1,
            p.draw_x,
            p.draw_y,
            p.scale
        );
        println!("Saved: {}", output_path.display());
        println!("Total time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

/// Apply per-run canvas flags through the same validation as saved settings
fn apply_layout_overrides(
    args: &ProcessArgs,
    base: &CompositionSettings,
) -> anyhow::Result<CompositionSettings> {
    if !args.has_layout_overrides() {
        return Ok(*base);
    }

    let mut scratch = SettingsManager::with_settings(MemoryStore::new(), *base);
    // --size is a square edge even when it feeds a sized canvas
    let size = args
        .size
        .map(|n| sanitize_final_size(n).into_value() as i64);
    let base_is_sized = matches!(base.layout, CanvasLayout::Sized { .. });
    let wants_sized = args.width.is_some()
        || args.height.is_some()
        || args.margin.is_some()
        || (base_is_sized && size.is_none() && args.margin_percent.is_some());

    if wants_sized {
        let width = args
            .width
            .or(size)
            .unwrap_or(base.final_width() as i64);
        let height = args
            .height
            .or(size)
            .unwrap_or(base.final_height() as i64);
        let margin = match (args.margin, args.margin_percent) {
            (Some(px), _) => px,
            (None, Some(pct)) => resolve_margin(
                MarginSpec::Percent(sanitize_margin_percentage(pct).into_value()),
                width.max(0) as u32,
                height.max(0) as u32,
            ) as i64,
            (None, None) => {
                resolve_margin(base.margin(), base.final_width(), base.final_height()) as i64
            }
        };
        scratch.set_layout(CanvasLayout::Sized {
            final_width: width.clamp(0, u32::MAX as i64) as u32,
            final_height: height.clamp(0, u32::MAX as i64) as u32,
            margin_size: margin.clamp(0, u32::MAX as i64) as u32,
        })?;
    } else {
        if let Some(size) = size {
            scratch.set_final_size(size)?;
        }
        if let Some(pct) = args.margin_percent {
            scratch.set_margin_percentage(pct)?;
        }
    }

    if let Some(hex) = &args.background {
        scratch.set_background_color(hex)?;
    }

    Ok(*scratch.settings())
}

/// Write an auxiliary image, picking the format from the extension (PNG otherwise)
fn save_side_image(buffer: &PixelBuffer, path: &Path, quality: u8) -> anyhow::Result<()> {
    let format = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg" | "jpeg") => OutputFormat::Jpeg,
        Some("webp") => OutputFormat::Webp,
        _ => OutputFormat::Png,
    };
    let bytes = ImageRsCodec.encode(buffer, format, quality)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Output file: explicit file, file inside an explicit directory, or next to the input
fn resolve_output_path(output: Option<&Path>, source_dir: &Path, filename: &str) -> PathBuf {
    match output {
        Some(path) if path.is_dir() => path.join(filename),
        Some(path) => path.to_path_buf(),
        None => source_dir.join(filename),
    }
}

fn load_config(cli: &Cli) -> Config {
    match &cli.config {
        Some(config_path) => match Config::load_from_path(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                Config::default()
            }
        },
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config file: {}", e);
            Config::default()
        }),
    }
}

/// Print execution plan for dry-run mode
fn print_execution_plan(
    args: &ProcessArgs,
    config: &PipelineConfig,
    settings: &CompositionSettings,
    output_path: &Path,
) {
    println!("=== Dry Run - Execution Plan ===");
    println!();
    println!("Input:  {}", args.input);
    println!("Output: {}", output_path.display());
    println!();
    println!("Detection:");
    println!("  White threshold: {}", config.detect.white_threshold);
    println!("  Alpha threshold: {}", config.detect.alpha_threshold);
    println!();
    println!("Canvas:");
    println!("  Mode:       {}", settings.layout.mode_name());
    println!(
        "  Size:       {}x{}",
        settings.final_width(),
        settings.final_height()
    );
    println!("  Margin:     {:?}", settings.margin());
    println!("  Background: {}", settings.background_color);
    println!();
    println!("Output:");
    println!("  Format:  {:?}", config.output_format);
    println!("  Quality: {}", config.jpeg_quality);
    if let Some(preview) = &args.preview {
        println!("  Preview: {}", preview.display());
    }
}

// ============ Settings Command ============

fn run_settings(cli: &Cli, args: &SettingsArgs) -> anyhow::Result<()> {
    let file_config = load_config(cli);
    let overrides = CliOverrides {
        settings_file: cli.settings_file.clone(),
        ..CliOverrides::new()
    };
    let store = JsonFileStore::new(file_config.settings_store_path(&overrides));
    let mut manager = SettingsManager::load(store);

    match &args.action {
        SettingsAction::Show => {
            println!(
                "{}",
                serde_json::to_string_pretty(&manager.settings().to_json_value())?
            );
        }
        SettingsAction::Set { field, value } => {
            if !FIELD_NAMES.contains(&field.as_str()) {
                eprintln!(
                    "Error: Unknown field '{}'. Expected one of: {}",
                    field,
                    FIELD_NAMES.join(", ")
                );
                std::process::exit(exit_codes::INVALID_ARGS);
            }
            let stored = manager.set_field(field, value)?;
            println!("{} = {}", field, stored);
        }
        SettingsAction::Reset => {
            manager.reset()?;
            println!("Settings reset to defaults");
        }
    }

    Ok(())
}

// ============ Info Command ============

fn run_info(cli: &Cli) -> anyhow::Result<()> {
    println!("centerframe v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Config File Locations:");
    for path in Config::search_paths() {
        let marker = if path.exists() { "found" } else { "not found" };
        println!("  {} ({})", path.display(), marker);
    }

    let file_config = load_config(cli);
    let overrides = CliOverrides {
        settings_file: cli.settings_file.clone(),
        ..CliOverrides::new()
    };
    println!();
    println!(
        "Settings Store: {}",
        file_config.settings_store_path(&overrides).display()
    );

    println!();
    println!("Effective Pipeline Config:");
    println!("  {}", file_config.merge_with_cli(&overrides).to_json());

    println!();
    println!("Default Settings:");
    println!(
        "  {}",
        CompositionSettings::default().to_json_value()
    );

    Ok(())
}
