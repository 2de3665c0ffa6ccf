//! doc-translate - Translate documents segment by segment with an LLM, then polish the result

mod config;
mod document;
mod pipeline;
mod text;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::TranslateConfig;
use document::{OutputFormat, extract_text, output_path, write_document};
use llm_client::{Config, LlmProvider, ModelPreset, get_provider};
use pipeline::{
    BarProgress, FixedDelay, NoDelay, Orchestrator, Pacer, PipelineSettings, Polisher, RunReport,
    SegmentTranslator,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const PROGRAM_NAME: &str = "doc-translate";
const RAW_SUFFIX: &str = "_初步翻譯";
const POLISHED_SUFFIX: &str = "_潤飾版";

#[derive(Parser, Debug)]
#[command(name = "doc-translate")]
#[command(
    about = "Translate documents with an LLM, one segment at a time",
    long_about = "Splits a document into paragraph-aligned segments, translates each with an LLM, merges the results and runs a final polishing pass over the merged text"
)]
#[command(version)]
struct Args {
    /// Document to translate (.txt or .docx)
    file: Option<PathBuf>,

    /// Directory for the translated files (default: next to the input)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Model preset for translation (overrides default from config)
    #[arg(short, long)]
    model: Option<String>,

    /// Model preset for polishing (default: same as translation)
    #[arg(long)]
    polish_model: Option<String>,

    /// Target language label
    #[arg(long)]
    language: Option<String>,

    /// Maximum segment size in characters
    #[arg(long)]
    max_chars: Option<usize>,

    /// Seconds to wait between segment translations
    #[arg(long)]
    delay: Option<f64>,

    /// Output file format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// Enable debug output
    #[arg(short, long, default_value_t = false)]
    debug: bool,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// List available model presets
    List,
    /// Set the default translation preset
    SetDefault {
        /// Name of the preset to use as default
        preset: String,
    },
    /// Add a new model preset
    AddPreset {
        /// Preset name
        name: String,
        /// Provider (gemini, anthropic, openrouter, cerebras)
        #[arg(short, long)]
        provider: String,
        /// Model identifier
        #[arg(short = 'M', long)]
        model: String,
    },
    /// Set the preset used for polishing
    SetPolish {
        /// Preset name
        preset: String,
    },
    /// Set the default maximum segment size
    SetMaxChars {
        /// Characters per segment (at least 1)
        value: usize,
    },
    /// Set the default delay between segment translations
    SetDelay {
        /// Seconds (non-negative)
        seconds: f64,
    },
    /// Set the default target language
    SetLanguage {
        /// Language label, e.g. 繁體中文
        language: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    if let Some(Commands::Config { action }) = &args.command {
        return handle_config_command(action);
    }

    let input = args
        .file
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Input file is required. Run 'doc-translate --help' for usage."))?;

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let llm_config = Config::load().context("Failed to load LLM configuration")?;
    let settings = resolve_settings(&args).context("Failed to load configuration")?;

    let translate_preset = args
        .model
        .clone()
        .unwrap_or_else(|| llm_config.get_default_for_program(PROGRAM_NAME).to_string());
    let polish_preset = args
        .polish_model
        .clone()
        .or_else(|| settings.polish_preset.clone())
        .unwrap_or_else(|| translate_preset.clone());

    let translate_provider = build_provider(&llm_config, &translate_preset)?;
    let polish_provider = if polish_preset == translate_preset {
        Arc::clone(&translate_provider)
    } else {
        build_provider(&llm_config, &polish_preset)?
    };

    let output_dir = match &args.output_dir {
        Some(dir) => dir.clone(),
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let base_name = input
        .file_stem()
        .and_then(OsStr::to_str)
        .context("Invalid input filename")?
        .to_string();

    log::debug!("Input: {}", input.display());
    log::debug!("Output directory: {}", output_dir.display());
    log::debug!(
        "Translation: {} ({}), polishing: {} ({})",
        translate_preset,
        translate_provider.model(),
        polish_preset,
        polish_provider.model()
    );
    let delay = settings.api_call_delay()?;
    log::debug!(
        "Segment size: {}, delay: {:?}, language: {}, format: {:?}",
        settings.max_chars_per_chunk,
        delay,
        settings.target_language,
        settings.output_format
    );

    eprintln!("Reading: {}", input.display());
    let document = extract_text(&input).context("Failed to extract text")?;
    if document.trim().is_empty() {
        anyhow::bail!("No text found in {}", input.display());
    }
    eprintln!("Characters: {}", document.chars().count());

    let pacer: Box<dyn Pacer> = if delay.is_zero() {
        Box::new(NoDelay)
    } else {
        Box::new(FixedDelay::new(delay))
    };

    let orchestrator = Orchestrator::new(
        PipelineSettings {
            max_chars: settings.max_chars_per_chunk,
        },
        SegmentTranslator::new(translate_provider),
        Polisher::new(polish_provider),
        pacer,
    );

    let progress = BarProgress::new();
    let report = orchestrator
        .run(&document, &settings.target_language, &progress)
        .await
        .context("Translation failed")?;
    progress.finish("完成");

    write_outputs(&report, &output_dir, &base_name, settings.output_format)?;

    if report.had_translation_errors {
        log::warn!(
            "{} of {} segment(s) failed to translate: {:?}",
            report.failed_segments.len(),
            report.segment_count,
            report.failed_segments
        );
        eprintln!(
            "Warning: {} segment(s) failed; look for 初步翻譯失敗 markers in the output",
            report.failed_segments.len()
        );
    }

    Ok(())
}

/// Paths of the translation files that were written
#[derive(Debug, Default)]
struct WrittenOutputs {
    raw: Option<PathBuf>,
    polished: Option<PathBuf>,
}

/// Write the merged and polished translations.
///
/// A failed write is logged and the other file is still attempted; the run
/// only fails when neither file could be written.
fn write_outputs(
    report: &RunReport,
    output_dir: &Path,
    base_name: &str,
    format: OutputFormat,
) -> Result<WrittenOutputs> {
    let mut written = WrittenOutputs::default();

    let raw_path = output_path(output_dir, base_name, RAW_SUFFIX, format);
    match write_document(&raw_path, &report.raw_merged, format) {
        Ok(()) => {
            eprintln!("Initial translation: {}", raw_path.display());
            written.raw = Some(raw_path);
        }
        Err(e) => log::error!("Could not save the initial translation: {:#}", e),
    }

    match report.polished.polished_text() {
        Some(polished) => {
            let polished_path = output_path(output_dir, base_name, POLISHED_SUFFIX, format);
            match write_document(&polished_path, polished, format) {
                Ok(()) => {
                    eprintln!("Polished translation: {}", polished_path.display());
                    written.polished = Some(polished_path);
                }
                Err(e) => log::error!("Could not save the polished translation: {:#}", e),
            }
        }
        None => {
            log::warn!("Polishing produced no text: {}", report.polished.text_or_marker());
            eprintln!("Polishing failed, only the initial translation was written");
        }
    }

    if written.raw.is_none() && written.polished.is_none() {
        anyhow::bail!("No translation could be written to {}", output_dir.display());
    }
    Ok(written)
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Merge the saved settings with command-line overrides.
fn resolve_settings(args: &Args) -> Result<TranslateConfig> {
    let mut settings = TranslateConfig::load()?;

    if let Some(max_chars) = args.max_chars {
        settings.max_chars_per_chunk = max_chars;
    }
    if let Some(delay) = args.delay {
        settings.api_call_delay_secs = delay;
    }
    if let Some(language) = &args.language {
        settings.target_language = language.clone();
    }
    if let Some(format) = args.format {
        settings.output_format = format;
    }

    settings.validate()?;
    Ok(settings)
}

fn build_provider(config: &Config, preset_name: &str) -> Result<Arc<dyn LlmProvider>> {
    let preset = config.get_preset(preset_name)?;
    let provider = get_provider(preset, config.get_provider_config(&preset.provider))
        .with_context(|| format!("Failed to set up model preset '{}'", preset_name))?;
    Ok(Arc::from(provider))
}

/// Handle config subcommands
fn handle_config_command(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let llm_config = Config::load()?;
            let settings = TranslateConfig::load()?;
            println!("LLM config file: {}", Config::config_path()?.display());
            println!(
                "Translation preset: {}",
                llm_config.get_default_for_program(PROGRAM_NAME)
            );
            println!();
            println!("Config file: {}", TranslateConfig::config_path()?.display());
            println!("{}", toml::to_string_pretty(&settings)?);
        }
        ConfigAction::List => {
            let config = Config::load()?;
            let current_default = config.get_default_for_program(PROGRAM_NAME);
            let mut names: Vec<&String> = config.presets.keys().collect();
            names.sort();
            println!("Available presets:");
            for name in names {
                let preset = &config.presets[name];
                let default_marker = if name == current_default {
                    " (default)"
                } else {
                    ""
                };
                println!(
                    "  {} - {} / {}{}",
                    name, preset.provider, preset.model, default_marker
                );
            }
        }
        ConfigAction::SetDefault { preset } => {
            let mut config = Config::load()?;
            config.get_preset(preset)?;
            config
                .defaults
                .insert(PROGRAM_NAME.to_string(), preset.clone());
            config.save()?;
            println!("Default preset for {} set to: {}", PROGRAM_NAME, preset);
        }
        ConfigAction::AddPreset {
            name,
            provider,
            model,
        } => {
            let mut config = Config::load()?;
            config.presets.insert(
                name.clone(),
                ModelPreset {
                    provider: provider.clone(),
                    model: model.clone(),
                },
            );
            config.save()?;
            println!("Added preset: {}", name);
        }
        ConfigAction::SetPolish { preset } => {
            Config::load()?.get_preset(preset)?;
            update_settings(|settings| settings.polish_preset = Some(preset.clone()))?;
            println!("Polishing preset set to: {}", preset);
        }
        ConfigAction::SetMaxChars { value } => {
            update_settings(|settings| settings.max_chars_per_chunk = *value)?;
            println!("Maximum segment size set to: {}", value);
        }
        ConfigAction::SetDelay { seconds } => {
            update_settings(|settings| settings.api_call_delay_secs = *seconds)?;
            println!("Delay between segments set to: {}s", seconds);
        }
        ConfigAction::SetLanguage { language } => {
            update_settings(|settings| settings.target_language = language.clone())?;
            println!("Target language set to: {}", language);
        }
    }
    Ok(())
}

/// Load, modify, validate and save the program settings.
fn update_settings(change: impl FnOnce(&mut TranslateConfig)) -> Result<()> {
    let mut settings = TranslateConfig::load()?;
    change(&mut settings);
    settings.validate()?;
    settings.save()
}
