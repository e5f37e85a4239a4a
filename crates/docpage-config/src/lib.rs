//! Configuration management for docpage.
//!
//! Parses `docpage.toml` with serde and discovers it in the current directory
//! or its parents. CLI settings override file values via [`CliSettings`].
//!
//! ```toml
//! [site]
//! base = "/hetu/"
//! clean_urls = true
//! not_found = "404.md"
//! hostname = "${SITE_HOST:-https://hetu.dev}"
//!
//! [build]
//! dist_dir = "dist"
//! assets_dir = "assets"
//! manifest = "hashmap.json"
//! ```
//!
//! `build.dist_dir` is relative to the config file; `assets_dir` and
//! `manifest` are relative to the dist directory.
//!
//! ## Environment Variable Expansion
//!
//! `${VAR}` and `${VAR:-default}` are expanded in `site.base` and
//! `site.hostname`.

mod expand;

use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docpage.toml";

/// CLI settings that override configuration file values.
///
/// Only `Some` values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    pub dist_dir: Option<PathBuf>,
    pub base: Option<String>,
    pub clean_urls: Option<bool>,
    pub hostname: Option<String>,
}

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    /// Build output layout (paths are relative strings from TOML).
    build: BuildConfigRaw,

    /// Resolved build configuration (set after loading).
    #[serde(skip)]
    pub build_resolved: BuildConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Site configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// URL base path the site is served under.
    pub base: String,
    /// Emit page URLs without `.html`.
    pub clean_urls: bool,
    /// Relative path of the page shown for missing pages.
    pub not_found: String,
    /// Absolute origin for sitemap URLs (e.g. `https://hetu.dev`).
    pub hostname: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base: "/".to_owned(),
            clean_urls: false,
            not_found: "404.md".to_owned(),
            hostname: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct BuildConfigRaw {
    dist_dir: Option<String>,
    assets_dir: Option<String>,
    manifest: Option<String>,
}

/// Resolved build output layout.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BuildConfig {
    /// Build output directory.
    pub dist_dir: PathBuf,
    /// Chunk directory, relative to `dist_dir`.
    pub assets_dir: PathBuf,
    /// Manifest file, relative to `dist_dir`.
    pub manifest: PathBuf,
}

impl BuildConfig {
    fn with_dist_dir(dist_dir: PathBuf) -> Self {
        Self {
            dist_dir,
            assets_dir: PathBuf::from("assets"),
            manifest: PathBuf::from("hashmap.json"),
        }
    }

    /// Absolute path of the manifest file.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dist_dir.join(&self.manifest)
    }

    /// Absolute path of the chunk directory.
    #[must_use]
    pub fn assets_path(&self) -> PathBuf {
        self.dist_dir.join(&self.assets_dir)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`site.hostname`").
        field: String,
        /// Error message (e.g., "${`SITE_HOST`} not set").
        message: String,
    },
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a path to stay inside its parent directory.
fn require_contained(path: &Path, field: &str) -> Result<(), ConfigError> {
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{field} must be a relative path inside the dist directory"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise searches
    /// for `docpage.toml` in the current directory and its parents, falling
    /// back to defaults relative to the current directory.
    ///
    /// CLI settings are applied after path resolution and the result is
    /// validated.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit `config_path` doesn't exist, parsing or
    /// expansion fails, or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(dist_dir) = &settings.dist_dir {
            self.build_resolved.dist_dir.clone_from(dist_dir);
        }
        if let Some(base) = &settings.base {
            self.site.base.clone_from(base);
        }
        if let Some(clean_urls) = settings.clean_urls {
            self.site.clean_urls = clean_urls;
        }
        if let Some(hostname) = &settings.hostname {
            self.site.hostname = Some(hostname.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    fn default_with_base(base: &Path) -> Self {
        Self {
            site: SiteConfig::default(),
            build: BuildConfigRaw::default(),
            build_resolved: BuildConfig::with_dist_dir(base.join("dist")),
            config_path: None,
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_site()?;
        require_contained(&self.build_resolved.assets_dir, "build.assets_dir")?;
        require_contained(&self.build_resolved.manifest, "build.manifest")?;
        Ok(())
    }

    fn validate_site(&self) -> Result<(), ConfigError> {
        let base = &self.site.base;
        if !base.starts_with('/') || !base.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "site.base must start and end with '/', got '{base}'"
            )));
        }

        let not_found = &self.site.not_found;
        if not_found.is_empty() || !not_found.ends_with(".md") {
            return Err(ConfigError::Validation(format!(
                "site.not_found must name a .md page, got '{not_found}'"
            )));
        }

        if let Some(hostname) = &self.site.hostname {
            require_http_url(hostname, "site.hostname")?;
        }

        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.site.base = expand::expand_env(&self.site.base, "site.base")?;
        if let Some(ref hostname) = self.site.hostname {
            self.site.hostname = Some(expand::expand_env(hostname, "site.hostname")?);
        }
        Ok(())
    }

    /// Resolve the dist directory against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = BuildConfig::with_dist_dir(
            config_dir.join(self.build.dist_dir.as_deref().unwrap_or("dist")),
        );
        self.build_resolved = BuildConfig {
            assets_dir: self
                .build
                .assets_dir
                .as_deref()
                .map_or(defaults.assets_dir.clone(), PathBuf::from),
            manifest: self
                .build
                .manifest
                .as_deref()
                .map_or(defaults.manifest.clone(), PathBuf::from),
            dist_dir: defaults.dist_dir,
        };
    }
}
