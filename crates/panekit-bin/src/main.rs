//! panekit demo entrypoint.
use anyhow::{Context, Result};
use clap::Parser;
use core_config::{Config, load_from};
use core_gui::Gui;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

mod demo;

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "panekit", version, about = "Multi-pane terminal demo")]
struct Args {
    /// Configuration file path (overrides discovery of `panekit.toml`).
    #[arg(long = "config")]
    pub config: Option<PathBuf>,
    /// Draw frames with ASCII glyphs.
    #[arg(long)]
    pub ascii: bool,
    /// Capture mouse clicks.
    #[arg(long)]
    pub mouse: bool,
    /// Show the hardware cursor.
    #[arg(long)]
    pub cursor: bool,
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_dir = Path::new(".");
    let log_path = log_dir.join("panekit.log");
    if log_path.exists() {
        let _ = std::fs::remove_file(&log_path);
    }

    let file_appender = tracing_appender::rolling::never(log_dir, "panekit.log");
    let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(nb_writer)
        .with_ansi(false)
        .try_init()
        .ok()
        .map(|_| guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "runtime.panic", ?info, "panic");
            default_panic(info);
        }));
    });
}

fn load_config(args: &Args) -> Result<Config> {
    let config = load_from(args.config.clone())?;
    info!(
        target: "runtime.startup",
        path = ?config.path,
        config_override = args.config.is_some(),
        "config_ready"
    );
    Ok(config)
}

fn run(args: &Args) -> Result<()> {
    let config = load_config(args)?;
    let mut options = config.options()?;
    options.ascii |= args.ascii;
    options.mouse |= args.mouse;
    options.cursor |= args.cursor;
    let quit = config.quit_key()?;

    // The terminal is restored when `gui` drops, before any error is printed.
    let mut gui = Gui::crossterm(options).context("initializing terminal")?;
    demo::install(&mut gui, quit);
    demo::spawn_clock(&gui).context("starting clock")?;
    info!(target: "runtime", %quit, "startup");
    gui.run()?;
    info!(target: "runtime", "shutdown");
    Ok(())
}

fn main() -> Result<()> {
    let _log_guard = configure_logging();
    install_panic_hook();

    let args = Args::parse();
    let result = run(&args);
    if let Err(e) = &result {
        error!(target: "runtime", error = %format!("{e:#}"), "exit_with_error");
    }
    result
}
