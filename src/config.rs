use crate::resolution::Bucket;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Selectable refresh intervals, seconds. Zero means manual-only.
pub const INTERVAL_OPTIONS: &[(&str, u64)] = &[
    ("30 min", 1800),
    ("1 hour", 3600),
    ("6 hours", 21600),
    ("1 day", 86400),
    ("manual", 0),
];

/// Which image variant to request: a fixed bucket, or detect the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPreference {
    #[default]
    Auto,
    Uhd,
    #[serde(rename = "1080p")]
    Fhd,
    #[serde(rename = "768p")]
    Hd,
    Mobile,
}

impl ResolutionPreference {
    /// The fixed bucket, or `None` when the screen should decide.
    pub fn bucket(&self) -> Option<Bucket> {
        match self {
            ResolutionPreference::Auto => None,
            ResolutionPreference::Uhd => Some(Bucket::Uhd),
            ResolutionPreference::Fhd => Some(Bucket::Fhd),
            ResolutionPreference::Hd => Some(Bucket::Hd),
            ResolutionPreference::Mobile => Some(Bucket::Mobile),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ResolutionPreference::Auto => "auto",
            ResolutionPreference::Uhd => "uhd",
            ResolutionPreference::Fhd => "1080p",
            ResolutionPreference::Hd => "768p",
            ResolutionPreference::Mobile => "mobile",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ResolutionPreference::Auto => ResolutionPreference::Uhd,
            ResolutionPreference::Uhd => ResolutionPreference::Fhd,
            ResolutionPreference::Fhd => ResolutionPreference::Hd,
            ResolutionPreference::Hd => ResolutionPreference::Mobile,
            ResolutionPreference::Mobile => ResolutionPreference::Auto,
        }
    }
}

/// A named upstream provider, one URL template per bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub templates: BTreeMap<Bucket, String>,
}

impl Source {
    /// URL for a bucket, falling back to the 1080p template when the
    /// source has no variant for it.
    pub fn url_for(&self, bucket: Bucket) -> Option<&str> {
        self.templates
            .get(&bucket)
            .or_else(|| self.templates.get(&Bucket::Fhd))
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub current_source: String,
    #[serde(default)]
    pub resolution: ResolutionPreference,
    #[serde(default = "default_interval")]
    pub refresh_interval_secs: u64,
    #[serde(default)]
    pub current_wallpaper: Option<PathBuf>,
    pub sources: BTreeMap<String, Source>,
}

fn default_interval() -> u64 {
    3600
}

impl Default for Config {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            "today".to_string(),
            Source {
                name: "Bing today".to_string(),
                templates: BTreeMap::from([
                    (Bucket::Uhd, "https://bing.img.run/uhd.php".to_string()),
                    (Bucket::Fhd, "https://bing.img.run/1920x1080.php".to_string()),
                    (Bucket::Hd, "https://bing.img.run/1366x768.php".to_string()),
                    (Bucket::Mobile, "https://bing.img.run/m.php".to_string()),
                ]),
            },
        );
        sources.insert(
            "archive".to_string(),
            Source {
                name: "Bing archive (random)".to_string(),
                templates: BTreeMap::from([
                    (Bucket::Uhd, "https://bing.img.run/rand_uhd.php".to_string()),
                    (Bucket::Fhd, "https://bing.img.run/rand.php".to_string()),
                    (Bucket::Hd, "https://bing.img.run/rand_1366x768.php".to_string()),
                    (Bucket::Mobile, "https://bing.img.run/rand_m.php".to_string()),
                ]),
            },
        );

        Self {
            current_source: "today".to_string(),
            resolution: ResolutionPreference::Auto,
            refresh_interval_secs: 3600,
            current_wallpaper: None,
            sources,
        }
    }
}

impl Config {
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("com", "mrmattias", "skywall")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
            .join("config.json")
    }

    /// Load from disk. A missing or corrupt file, or a `current_source`
    /// that is not a configured source, yields the built-in defaults.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &PathBuf) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(_) => return Self::default(),
        };

        match serde_json::from_str::<Config>(&data) {
            Ok(config) if config.is_valid() => config,
            Ok(_) => {
                warn!(path = %path.display(), "config references unknown source, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt config, using defaults");
                Self::default()
            }
        }
    }

    fn is_valid(&self) -> bool {
        self.sources.contains_key(&self.current_source)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        Ok(())
    }

    /// The selected source. Always present: `load` rejects configs whose
    /// `current_source` is unknown.
    pub fn source(&self) -> Option<&Source> {
        self.sources.get(&self.current_source)
    }

    /// Cycle to the next configured source.
    pub fn next_source(&mut self) {
        let keys: Vec<&String> = self.sources.keys().collect();
        if keys.is_empty() {
            return;
        }
        let pos = keys
            .iter()
            .position(|k| **k == self.current_source)
            .unwrap_or(0);
        self.current_source = keys[(pos + 1) % keys.len()].clone();
    }

    /// Cycle to the next refresh interval option.
    pub fn next_interval(&mut self) {
        let pos = INTERVAL_OPTIONS
            .iter()
            .position(|(_, secs)| *secs == self.refresh_interval_secs)
            .unwrap_or(INTERVAL_OPTIONS.len() - 1);
        self.refresh_interval_secs = INTERVAL_OPTIONS[(pos + 1) % INTERVAL_OPTIONS.len()].1;
    }

    pub fn interval_label(&self) -> String {
        INTERVAL_OPTIONS
            .iter()
            .find(|(_, secs)| *secs == self.refresh_interval_secs)
            .map(|(label, _)| label.to_string())
            .unwrap_or_else(|| format!("{} s", self.refresh_interval_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.is_valid());
        assert!(config.source().is_some());
        assert_eq!(config.refresh_interval_secs, 3600);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let config = Config::load_from(&path);
        assert_eq!(config.current_source, "today");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        let config = Config::load_from(&path);
        assert_eq!(config.current_source, "today");
    }

    #[test]
    fn unknown_current_source_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.current_source = "gone".to_string();
        fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let loaded = Config::load_from(&path);
        assert_eq!(loaded.current_source, "today");
    }

    #[test]
    fn save_is_byte_identical_for_identical_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = Config::default();

        config.save_to(&path).unwrap();
        let first = fs::read(&path).unwrap();
        config.save_to(&path).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn roundtrip_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.current_source = "archive".to_string();
        config.resolution = ResolutionPreference::Mobile;
        config.refresh_interval_secs = 0;
        config.current_wallpaper = Some(PathBuf::from("/tmp/w.jpg"));

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path);

        assert_eq!(loaded.current_source, "archive");
        assert_eq!(loaded.resolution, ResolutionPreference::Mobile);
        assert_eq!(loaded.refresh_interval_secs, 0);
        assert_eq!(loaded.current_wallpaper, Some(PathBuf::from("/tmp/w.jpg")));
    }

    #[test]
    fn url_falls_back_to_1080p_template() {
        let source = Source {
            name: "partial".to_string(),
            templates: BTreeMap::from([(Bucket::Fhd, "http://x/fhd".to_string())]),
        };
        assert_eq!(source.url_for(Bucket::Uhd), Some("http://x/fhd"));
        assert_eq!(source.url_for(Bucket::Fhd), Some("http://x/fhd"));
    }

    #[test]
    fn source_and_interval_cycling_wrap() {
        let mut config = Config::default();
        assert_eq!(config.current_source, "today");
        config.next_source();
        assert_eq!(config.current_source, "archive");
        config.next_source();
        assert_eq!(config.current_source, "today");

        config.refresh_interval_secs = 86400;
        config.next_interval();
        assert_eq!(config.refresh_interval_secs, 0);
        assert_eq!(config.interval_label(), "manual");
        config.next_interval();
        assert_eq!(config.refresh_interval_secs, 1800);
    }
}
