// Expandrs CLI
// Drives the expansion engine against a simulated plain surface

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use log::debug;
use parking_lot::RwLock;

use expandrs_core::{
    default_settings_content, example_config_content, ChoiceOption, ChoiceOutcome,
    ChoicePresenter, ClipboardError, ClipboardReader, ConfigFile, ExpansionEngine,
    KeystrokeOutcome, MemoryStore, PlainSurface, ResolutionContext, Settings, TriggerKey,
};

/// Rule-based text expander
#[derive(Parser, Debug)]
#[command(name = "expandrs")]
#[command(author = "expandrs contributors")]
#[command(version)]
#[command(about = "Rule-based text expander", long_about = None)]
struct Args {
    /// TOML abbreviation config file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// TOML settings file (trigger keys, undo)
    #[arg(short, long, value_name = "SETTINGS")]
    settings: Option<PathBuf>,

    /// Hostname to evaluate domain rules against
    #[arg(long, default_value = "localhost")]
    hostname: String,

    /// Trigger key the interactive loop simulates (space, tab, or enter)
    #[arg(short, long, default_value = "space")]
    trigger: TriggerKey,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// List configured abbreviations and exit
    #[arg(long)]
    list: bool,

    /// Print an example config file and exit
    #[arg(long)]
    print_example: bool,

    /// Print the default settings file and exit
    #[arg(long)]
    print_settings: bool,
}

/// Clipboard backed by the EXPANDRS_CLIPBOARD environment variable, so
/// `$clipboard$` directives can be exercised without a window system.
struct EnvClipboard;

#[async_trait]
impl ClipboardReader for EnvClipboard {
    async fn read_text(&self) -> Result<String, ClipboardError> {
        std::env::var("EXPANDRS_CLIPBOARD")
            .map_err(|_| ClipboardError::Unavailable("EXPANDRS_CLIPBOARD not set".to_string()))
    }
}

/// Presents choice options on stdout and reads the selection from stdin.
/// An empty or invalid line dismisses the prompt.
struct StdinChoicePresenter;

#[async_trait]
impl ChoicePresenter for StdinChoicePresenter {
    async fn present(&self, options: &[ChoiceOption]) -> ChoiceOutcome {
        for (index, option) in options.iter().enumerate() {
            println!("  [{}] {}", index + 1, option.title);
        }
        print!("choice (empty to cancel)> ");
        let _ = std::io::stdout().flush();

        let line = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).map(|_| line)
        })
        .await;

        let line = match line {
            Ok(Ok(line)) => line,
            _ => return ChoiceOutcome::Dismissed,
        };
        match line.trim().parse::<usize>() {
            Ok(n) if n >= 1 => ChoiceOutcome::Selected(n - 1),
            _ => ChoiceOutcome::Dismissed,
        }
    }
}

fn load_config(args: &Args) -> anyhow::Result<ConfigFile> {
    match &args.config {
        Some(path) => ConfigFile::from_toml_path(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => ConfigFile::from_toml_str(example_config_content())
            .context("parsing built-in example config"),
    }
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    match &args.settings {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Settings::load_default().context("loading default settings"),
    }
}

fn list_abbreviations(config: &ConfigFile) {
    println!("{} abbreviation(s):", config.abbreviations().len());
    for abbr in config.abbreviations() {
        let state = if abbr.enabled() { "" } else { " (disabled)" };
        println!(
            "  {}{} -> {:?} [{} rule(s)]",
            abbr.key(),
            state,
            abbr.expansion_default(),
            abbr.rules().len()
        );
    }
}

async fn run_interactive(
    engine: &ExpansionEngine,
    hostname: &str,
    trigger: TriggerKey,
) -> anyhow::Result<()> {
    println!("type a line ending in an abbreviation; Ctrl-D to quit");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim_end_matches('\n');

        let mut surface = PlainSurface::with_text(line);
        let ctx = ResolutionContext::capture(hostname);
        match engine.handle_trigger(&mut surface, trigger, &ctx).await {
            KeystrokeOutcome::Expanded { key, .. } => {
                debug!("expanded '{key}'");
                println!("{}", surface.value());
            }
            KeystrokeOutcome::Aborted => println!("(cancelled)"),
            _ => println!("{line}{}", trigger.literal()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if args.print_example {
        print!("{}", example_config_content());
        return Ok(());
    }
    if args.print_settings {
        print!("{}", default_settings_content());
        return Ok(());
    }

    let config = load_config(&args)?;
    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }
    if args.list {
        list_abbreviations(&config);
        return Ok(());
    }

    let settings = Arc::new(RwLock::new(load_settings(&args)?));
    let store = Arc::new(MemoryStore::new());
    config.seed(&store).context("seeding store")?;

    let engine = ExpansionEngine::new(
        store,
        settings,
        Arc::new(EnvClipboard),
        Arc::new(StdinChoicePresenter),
    );
    engine.reload_snapshot().await;

    run_interactive(&engine, &args.hostname, args.trigger).await
}
