use anyhow::{Context, Result as AnyhowResult};
use clap::Parser;
use crossterm::event::{
    self, Event, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::ExecutableCommand;
use seemless::app::Editor;
use seemless::config::Config;
use seemless::model::document::Document;
use seemless::services::resolution::HttpResolutionService;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// A terminal prose editor that answers inline /queries in place
#[derive(Parser, Debug)]
#[command(name = "seemless")]
#[command(about = "A terminal prose editor that resolves inline /queries", long_about = None)]
#[command(version)]
struct Args {
    /// Text file whose lines seed the document ("---" lines become rules).
    /// The file is never written back.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Resolution Service endpoint (overrides the config file)
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Path to log file (default: platform cache dir)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the configuration JSON Schema and exit
    #[arg(long)]
    dump_config_schema: bool,
}

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("seemless")
        .join("seemless.log")
}

fn init_tracing(log_file: &Path) -> AnyhowResult<()> {
    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(args: &Args) -> AnyhowResult<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => match Config::default_config_path() {
            Some(path) => Config::load_or_default(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::default(),
        },
    };
    if let Some(endpoint) = &args.endpoint {
        config.resolver.endpoint = endpoint.clone();
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn load_document(path: Option<&Path>) -> AnyhowResult<Document> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(Document::from_text(&text))
        }
        None => Ok(Document::default()),
    }
}

/// Ask the terminal to report modifiers on Enter so Shift+Enter can split a
/// line holding a query. Returns whether the flags were pushed.
fn enable_keyboard_enhancement() -> bool {
    match crossterm::terminal::supports_keyboard_enhancement() {
        Ok(true) => io::stdout()
            .execute(PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES,
            ))
            .is_ok(),
        _ => false,
    }
}

fn run(editor: &mut Editor) -> AnyhowResult<()> {
    let mut terminal = ratatui::init();
    let keyboard_enhancement = enable_keyboard_enhancement();
    editor.set_keyboard_enhancement(keyboard_enhancement);
    let result = (|| -> AnyhowResult<()> {
        let mut needs_render = true;
        while !editor.should_quit() {
            needs_render |= editor.process_async_messages();
            if needs_render {
                terminal.draw(|frame| editor.render(frame))?;
                needs_render = false;
            }
            if event::poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        editor.handle_key(key);
                        needs_render = true;
                    }
                    Event::Resize(_, _) => needs_render = true,
                    _ => {}
                }
            }
        }
        Ok(())
    })();
    if keyboard_enhancement {
        let _ = io::stdout().execute(PopKeyboardEnhancementFlags);
    }
    ratatui::restore();
    result
}

fn main() -> AnyhowResult<()> {
    let args = Args::parse();

    if args.dump_config_schema {
        println!("{}", Config::json_schema()?);
        return Ok(());
    }

    let config = load_config(&args)?;
    if args.dump_config {
        let json = serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
        println!("{}", json);
        return Ok(());
    }

    let log_file = args.log_file.clone().unwrap_or_else(default_log_path);
    init_tracing(&log_file)?;
    tracing::info!("Editor starting, resolver at {}", config.resolver.endpoint);

    let doc = load_document(args.file.as_deref())?;
    let service = Arc::new(HttpResolutionService::from_config(&config.resolver));
    let mut editor = Editor::new(config, service, doc);

    let result = run(&mut editor);
    tracing::info!("Editor exiting");
    result
}
