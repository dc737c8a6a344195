//! Cache configuration and the INI config file.
//!
//! [`CacheConfig`] controls what a reload looks for and how much work it runs
//! in parallel. [`ConfigFile`] persists it together with overlay and logging
//! settings:
//!
//! ```ini
//! [cache]
//! animations_folder = animations
//! models_folder = geo
//! file_suffix = .json
//! parallel_parse = true
//! max_concurrent_parses = 8
//!
//! [overlays]
//! packs_dir = /home/me/.local/share/game/resourcepacks
//! order = base, extras.zip
//!
//! [logging]
//! level = info
//! file = /tmp/rigcache.log
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};

use crate::error::ConfigError;
use crate::overlay::PackDirectoryProvider;

/// Default subfolder holding animation documents.
pub const DEFAULT_ANIMATIONS_FOLDER: &str = "animations";

/// Default subfolder holding geometry documents.
pub const DEFAULT_MODELS_FOLDER: &str = "geo";

/// Default file-name suffix of asset documents.
pub const DEFAULT_FILE_SUFFIX: &str = ".json";

/// Upper bound for the default parse concurrency.
pub const MAX_DEFAULT_CONCURRENCY: usize = 16;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default concurrency: available parallelism, capped at
/// [`MAX_DEFAULT_CONCURRENCY`].
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_DEFAULT_CONCURRENCY)
}

/// What a reload scans for and how it parses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Subfolder under `assets/<namespace>/` holding animations.
    pub animations_folder: String,

    /// Subfolder under `assets/<namespace>/` holding geometry.
    pub models_folder: String,

    /// Only files whose name ends with this suffix are parsed.
    pub file_suffix: String,

    /// Parse the files of one overlay on the rayon pool during a synchronous
    /// reload. Results are still applied in enumeration order.
    pub parallel_parse: bool,

    /// Maximum parse units in flight during a concurrent reload.
    pub max_concurrent_parses: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            animations_folder: DEFAULT_ANIMATIONS_FOLDER.to_string(),
            models_folder: DEFAULT_MODELS_FOLDER.to_string(),
            file_suffix: DEFAULT_FILE_SUFFIX.to_string(),
            parallel_parse: true,
            max_concurrent_parses: default_concurrency(),
        }
    }
}

impl CacheConfig {
    /// Set the animations subfolder.
    pub fn with_animations_folder(mut self, folder: impl Into<String>) -> Self {
        self.animations_folder = folder.into();
        self
    }

    /// Set the geometry subfolder.
    pub fn with_models_folder(mut self, folder: impl Into<String>) -> Self {
        self.models_folder = folder.into();
        self
    }

    /// Set the file-name suffix.
    pub fn with_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.file_suffix = suffix.into();
        self
    }

    /// Enable or disable parallel parsing in the synchronous driver.
    pub fn with_parallel_parse(mut self, enabled: bool) -> Self {
        self.parallel_parse = enabled;
        self
    }

    /// Set the concurrent driver's parse limit (minimum 1).
    pub fn with_max_concurrent_parses(mut self, limit: usize) -> Self {
        self.max_concurrent_parses = limit.max(1);
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("cache.animations_folder", &self.animations_folder),
            ("cache.models_folder", &self.models_folder),
            ("cache.file_suffix", &self.file_suffix),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                });
            }
        }

        if self.max_concurrent_parses == 0 {
            return Err(ConfigError::InvalidValue {
                key: "cache.max_concurrent_parses".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }
}

/// `[overlays]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OverlaySettings {
    /// Folder scanned for packs.
    pub packs_dir: Option<PathBuf>,

    /// Explicit pack order, lowest priority first. Empty means alphabetical.
    pub order: Vec<String>,
}

/// `[logging]` section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `rigcache=debug`.
    pub level: String,

    /// Optional log file; logs go to stderr only when unset.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// Contents of the INI config file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub cache: CacheConfig,
    pub overlays: OverlaySettings,
    pub logging: LoggingSettings,
}

/// Default location of the config file.
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rigcache")
        .join("config.ini")
}

impl ConfigFile {
    /// Load from [`config_file_path`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. Missing keys keep their defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to [`config_file_path`].
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = config_file_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save to `path`, creating parent folders.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        self.to_ini().write_to_file(path).map_err(write_error)
    }

    /// Build from a parsed INI document.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("cache")) {
            let cache = &mut config.cache;
            if let Some(v) = section.get("animations_folder") {
                cache.animations_folder = v.trim().to_string();
            }
            if let Some(v) = section.get("models_folder") {
                cache.models_folder = v.trim().to_string();
            }
            if let Some(v) = section.get("file_suffix") {
                cache.file_suffix = v.trim().to_string();
            }
            if let Some(v) = parse_value::<bool>(section, "cache", "parallel_parse")? {
                cache.parallel_parse = v;
            }
            if let Some(v) = parse_value::<usize>(section, "cache", "max_concurrent_parses")? {
                cache.max_concurrent_parses = v;
            }
        }

        if let Some(section) = ini.section(Some("overlays")) {
            config.overlays.packs_dir = section
                .get("packs_dir")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
            config.overlays.order = section
                .get("order")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(v) = section.get("level").map(str::trim).filter(|v| !v.is_empty()) {
                config.logging.level = v.to_string();
            }
            config.logging.file = section
                .get("file")
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from);
        }

        config.cache.validate()?;
        Ok(config)
    }

    /// Render as an INI document.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("cache"))
            .set("animations_folder", self.cache.animations_folder.as_str())
            .set("models_folder", self.cache.models_folder.as_str())
            .set("file_suffix", self.cache.file_suffix.as_str())
            .set("parallel_parse", self.cache.parallel_parse.to_string())
            .set(
                "max_concurrent_parses",
                self.cache.max_concurrent_parses.to_string(),
            );

        ini.with_section(Some("overlays"))
            .set(
                "packs_dir",
                self.overlays
                    .packs_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            )
            .set("order", self.overlays.order.join(", "));

        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "file",
                self.logging
                    .file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            );

        ini
    }

    /// Provider for the configured packs folder, if one is set.
    pub fn overlay_provider(&self) -> Option<PackDirectoryProvider> {
        let packs_dir = self.overlays.packs_dir.as_ref()?;
        let provider = PackDirectoryProvider::new(packs_dir);
        if self.overlays.order.is_empty() {
            Some(provider)
        } else {
            Some(provider.with_order(self.overlays.order.clone()))
        }
    }
}

fn parse_value<T: FromStr>(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    match section.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: format!("{}.{}", section_name, key),
                value: raw.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.animations_folder, "animations");
        assert_eq!(config.models_folder, "geo");
        assert_eq!(config.file_suffix, ".json");
        assert!(config.parallel_parse);
        assert!(config.max_concurrent_parses >= 1);
        assert!(config.max_concurrent_parses <= MAX_DEFAULT_CONCURRENCY);
    }

    #[test]
    fn test_builder_methods() {
        let config = CacheConfig::default()
            .with_animations_folder("anims")
            .with_models_folder("models")
            .with_file_suffix(".geo.json")
            .with_parallel_parse(false)
            .with_max_concurrent_parses(0);

        assert_eq!(config.animations_folder, "anims");
        assert_eq!(config.models_folder, "models");
        assert_eq!(config.file_suffix, ".geo.json");
        assert!(!config.parallel_parse);
        assert_eq!(config.max_concurrent_parses, 1);
    }

    #[test]
    fn test_validate_rejects_empty_folder() {
        let config = CacheConfig::default().with_models_folder("  ");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "cache.models_folder"));
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.cache.parallel_parse = false;
        config.cache.max_concurrent_parses = 3;
        config.overlays.packs_dir = Some(PathBuf::from("/packs"));
        config.overlays.order = vec!["base".to_string(), "extra.zip".to_string()];
        config.logging.level = "rigcache=debug".to_string();

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_sections_keep_defaults() {
        let ini = Ini::load_from_str("[cache]\nmodels_folder = geometry\n").unwrap();
        let config = ConfigFile::from_ini(&ini).unwrap();

        assert_eq!(config.cache.models_folder, "geometry");
        assert_eq!(config.cache.animations_folder, "animations");
        assert_eq!(config.logging, LoggingSettings::default());
        assert!(config.overlays.packs_dir.is_none());
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let ini = Ini::load_from_str("[cache]\nmax_concurrent_parses = lots\n").unwrap();
        let err = ConfigFile::from_ini(&ini).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref key, ref value }
                if key == "cache.max_concurrent_parses" && value == "lots"
        ));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let ini = Ini::load_from_str("[cache]\nmax_concurrent_parses = 0\n").unwrap();
        assert!(ConfigFile::from_ini(&ini).is_err());
    }

    #[test]
    fn test_order_is_split_on_commas() {
        let ini = Ini::load_from_str("[overlays]\npacks_dir = /p\norder = a , b,, c\n").unwrap();
        let config = ConfigFile::from_ini(&ini).unwrap();
        assert_eq!(config.overlays.order, vec!["a", "b", "c"]);
        assert!(config.overlay_provider().is_some());
    }

    #[test]
    fn test_load_missing_file_is_read_error() {
        let err = ConfigFile::load_from(Path::new("/nonexistent/rigcache.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_no_packs_dir_means_no_provider() {
        assert!(ConfigFile::default().overlay_provider().is_none());
    }
}
