use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;
use tracing::info;

/// Capability interface for applying a file as the desktop background.
///
/// Failure is surfaced to the status line and logged; the application
/// keeps running.
pub trait WallpaperSetter {
    fn set(&self, path: &Path) -> Result<()>;
}

/// Applies wallpapers through the swww daemon on all outputs.
pub struct SwwwSetter;

impl SwwwSetter {
    /// Start swww-daemon if it is not already answering queries.
    fn ensure_daemon(&self) -> Result<()> {
        let status = Command::new("swww").arg("query").output();

        match status {
            Ok(output) if output.status.success() => Ok(()),
            _ => {
                Command::new("swww-daemon")
                    .spawn()
                    .context("Failed to start swww-daemon")?;

                // Give it a moment to initialize
                std::thread::sleep(std::time::Duration::from_millis(100));
                Ok(())
            }
        }
    }
}

impl WallpaperSetter for SwwwSetter {
    fn set(&self, path: &Path) -> Result<()> {
        self.ensure_daemon()?;

        let output = Command::new("swww")
            .arg("img")
            .arg(path)
            .arg("--resize")
            .arg("crop")
            .arg("--transition-type")
            .arg("fade")
            .output()
            .context("Failed to run swww")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("swww failed: {}", stderr);
        }

        info!(path = %path.display(), "wallpaper applied");
        Ok(())
    }
}
