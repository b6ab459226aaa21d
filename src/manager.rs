use crate::cache::CacheDir;
use crate::config::Config;
use crate::fetch::{self, RemoteClient};
use crate::resolution::Bucket;
use crate::screen::DisplayInfo;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Result of one refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new wallpaper was downloaded into the cache.
    Fresh(PathBuf),
    /// Download failed; an existing cache entry was chosen instead.
    Cached(PathBuf),
    /// Download failed and the cache is empty. The active wallpaper is
    /// left untouched.
    Unavailable,
}

/// Ties the fetcher, cache, and display resolver together. Shared with the
/// download worker behind an `Arc`; all methods take `&self`.
pub struct WallpaperManager {
    client: Box<dyn RemoteClient>,
    display: Box<dyn DisplayInfo>,
    cache: CacheDir,
    max_cache_files: usize,
}

impl WallpaperManager {
    pub fn new(
        client: Box<dyn RemoteClient>,
        display: Box<dyn DisplayInfo>,
        cache: CacheDir,
        max_cache_files: usize,
    ) -> Self {
        Self {
            client,
            display,
            cache,
            max_cache_files,
        }
    }

    /// The bucket a refresh will request: the configured preference, or
    /// whatever fits the detected screen.
    pub fn effective_bucket(&self, config: &Config) -> Bucket {
        config.resolution.bucket().unwrap_or_else(|| {
            let (width, height) = self.display.primary_resolution();
            let bucket = Bucket::for_dimensions(width, height);
            info!(width, height, %bucket, "resolved screen to bucket");
            bucket
        })
    }

    /// Run one download cycle against the configured source.
    ///
    /// On success the new file becomes the active wallpaper and the cache
    /// is trimmed around it. On total download failure a random cached
    /// entry stands in; with nothing cached the cycle reports
    /// `Unavailable` and the previous wallpaper stays active.
    pub fn refresh(&self, config: &Config) -> RefreshOutcome {
        let Some(source) = config.source() else {
            error!(source = %config.current_source, "selected source is not configured");
            return self.fall_back_to_cache();
        };

        let bucket = self.effective_bucket(config);
        let Some(url) = source.url_for(bucket) else {
            error!(source = %config.current_source, %bucket, "source has no usable template");
            return self.fall_back_to_cache();
        };

        let dest = self.cache.new_entry_path();
        info!(url, %bucket, "refreshing wallpaper");

        match fetch::download_with_retry(self.client.as_ref(), url, &dest) {
            Ok(()) => {
                self.cache.evict(self.max_cache_files, Some(&dest));
                RefreshOutcome::Fresh(dest)
            }
            Err(e) => {
                warn!(error = %e, "all download attempts failed, trying cache");
                self.fall_back_to_cache()
            }
        }
    }

    fn fall_back_to_cache(&self) -> RefreshOutcome {
        match self.cache.random_entry() {
            Some(path) => {
                info!(path = %path.display(), "using cached wallpaper");
                RefreshOutcome::Cached(path)
            }
            None => {
                error!("no cached wallpaper available");
                RefreshOutcome::Unavailable
            }
        }
    }
}
