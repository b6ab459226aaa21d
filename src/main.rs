mod app;
mod cache;
mod config;
mod fetch;
mod logging;
mod manager;
mod resolution;
mod screen;
mod setter;
mod ui;

use anyhow::Result;
use cache::{CacheDir, DEFAULT_MAX_FILES};
use clap::{Parser, Subcommand};
use config::Config;
use fetch::HttpClient;
use manager::{RefreshOutcome, WallpaperManager};
use screen::{DisplayInfo, SystemDisplay};
use setter::{SwwwSetter, WallpaperSetter};
use tracing::error;

#[derive(Parser)]
#[command(name = "skywall")]
#[command(author = "MrMattias")]
#[command(version)]
#[command(about = "Desktop wallpaper updater with automatic resolution matching")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and apply a wallpaper once
    Refresh,
    /// Show the detected screen size and matching resolution bucket
    Resolution,
    /// List configured image sources
    Sources,
    /// Manage the wallpaper cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// List cached wallpapers, oldest first
    List,
    /// Delete every cached wallpaper
    Clear,
}

fn main() {
    // Hold the guard so buffered log lines flush on exit
    let _log_guard = match logging::init() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e}");
            None
        }
    };

    if let Err(e) = run() {
        error!(error = %e, "fatal error");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Refresh) => cmd_refresh(),
        Some(Commands::Resolution) => cmd_resolution(),
        Some(Commands::Sources) => cmd_sources(),
        Some(Commands::Cache { action }) => cmd_cache(action),
        None => app::run_tui(),
    }
}

fn cmd_refresh() -> Result<()> {
    let mut config = Config::load();
    let manager = WallpaperManager::new(
        Box::new(HttpClient::new()?),
        Box::new(SystemDisplay),
        CacheDir::open_default()?,
        DEFAULT_MAX_FILES,
    );

    match manager.refresh(&config) {
        RefreshOutcome::Fresh(path) | RefreshOutcome::Cached(path) => {
            SwwwSetter.set(&path)?;
            println!("Wallpaper set: {}", path.display());
            config.current_wallpaper = Some(path);
            config.save()?;
            Ok(())
        }
        RefreshOutcome::Unavailable => {
            anyhow::bail!("download failed and no cached wallpaper is available")
        }
    }
}

fn cmd_resolution() -> Result<()> {
    let (width, height) = SystemDisplay.primary_resolution();
    let bucket = resolution::Bucket::for_dimensions(width, height);
    println!("{width}x{height} -> {bucket}");
    Ok(())
}

fn cmd_sources() -> Result<()> {
    let config = Config::load();

    for (key, source) in &config.sources {
        let marker = if *key == config.current_source { "*" } else { " " };
        println!("{marker} {key}: {}", source.name);
        for (bucket, url) in &source.templates {
            println!("    {bucket}: {url}");
        }
    }

    Ok(())
}

fn cmd_cache(action: CacheAction) -> Result<()> {
    let cache = CacheDir::open_default()?;

    match action {
        CacheAction::List => {
            let entries = cache.entries()?;
            if entries.is_empty() {
                println!("Cache is empty: {}", cache.path().display());
            } else {
                for path in &entries {
                    println!("{}", path.display());
                }
                println!("{} cached wallpaper(s)", entries.len());
            }
        }
        CacheAction::Clear => {
            let removed = cache.clear()?;
            println!("Removed {removed} cached wallpaper(s)");
        }
    }

    Ok(())
}
