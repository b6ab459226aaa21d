use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

/// Upper bound on cached wallpapers, the active one included.
pub const DEFAULT_MAX_FILES: usize = 100;

/// Extensions considered cache entries; anything else in the directory is
/// left alone.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp"];

/// The directory holding downloaded wallpapers, one file per download,
/// named by timestamp.
pub struct CacheDir {
    dir: PathBuf,
}

impl CacheDir {
    /// Per-user cache directory, created on first use.
    pub fn open_default() -> Result<Self> {
        let dir = directories::ProjectDirs::from("com", "mrmattias", "skywall")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .or_else(|| dirs::home_dir().map(|h| h.join(".skywall_cache")))
            .context("could not determine a cache directory")?;
        Self::open(dir)
    }

    pub fn open(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create cache dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Path for the next download. Timestamped to the second; a counter
    /// suffix keeps back-to-back downloads from colliding.
    pub fn new_entry_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let mut path = self.dir.join(format!("wallpaper_{stamp}.jpg"));
        let mut n = 1;
        while path.exists() {
            path = self.dir.join(format!("wallpaper_{stamp}_{n}.jpg"));
            n += 1;
        }
        path
    }

    /// All cache entries, oldest first. Modification time is the recency
    /// proxy; the filename breaks ties so ordering is stable.
    pub fn entries(&self) -> Result<Vec<PathBuf>> {
        let mut entries: Vec<(SystemTime, PathBuf)> = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read cache dir {}", self.dir.display()))?
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_image_file(p))
            .map(|p| {
                let mtime = fs::metadata(&p)
                    .and_then(|m| m.modified())
                    .unwrap_or(SystemTime::UNIX_EPOCH);
                (mtime, p)
            })
            .collect();

        entries.sort();
        Ok(entries.into_iter().map(|(_, p)| p).collect())
    }

    /// Trim the cache to at most `max_files` entries, deleting oldest
    /// first. The active wallpaper is never deleted, so up to
    /// `max_files - 1` other entries are retained alongside it.
    ///
    /// Best effort: deletion failures are logged and skipped. Returns the
    /// number of files removed.
    pub fn evict(&self, max_files: usize, active: Option<&Path>) -> usize {
        let mut candidates = match self.entries() {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "cache eviction skipped");
                return 0;
            }
        };
        if let Some(active) = active {
            candidates.retain(|p| p != active);
        }

        let keep = max_files.saturating_sub(1);
        if candidates.len() <= keep {
            return 0;
        }

        let excess = candidates.len() - keep;
        let mut removed = 0;
        for old in candidates.into_iter().take(excess) {
            match fs::remove_file(&old) {
                Ok(()) => {
                    info!(path = %old.display(), "evicted cached wallpaper");
                    removed += 1;
                }
                Err(e) => warn!(path = %old.display(), error = %e, "failed to evict"),
            }
        }
        removed
    }

    /// Uniformly random cached wallpaper, for when a fresh download cannot
    /// be obtained. `None` when the cache is empty.
    pub fn random_entry(&self) -> Option<PathBuf> {
        use rand::seq::SliceRandom;

        let entries = self.entries().ok()?;
        entries.choose(&mut rand::thread_rng()).cloned()
    }

    /// Delete every cache entry. Used by `skywall cache clear`.
    pub fn clear(&self) -> Result<usize> {
        let entries = self.entries()?;
        let mut removed = 0;
        for path in entries {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let ext = e.to_lowercase();
            IMAGE_EXTENSIONS.iter().any(|&supported| supported == ext)
        })
        .unwrap_or(false)
}
