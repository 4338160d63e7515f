//! Session settings: defaults, then a TOML file, then environment, then flags.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use pinjam_observability::LogFormat;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "pinjam.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Inventory CSV replacing the built-in seed.
    pub seed: Option<PathBuf>,
    /// Base directory for bare export/import file names.
    pub data_dir: PathBuf,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            data_dir: PathBuf::from("."),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    seed: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    log_format: Option<LogFormat>,
}

impl Settings {
    /// Load settings for this process.
    ///
    /// An explicit `config` path must exist; the default file is optional.
    pub fn load(config: Option<&Path>) -> anyhow::Result<Self> {
        let mut settings = Settings::default();

        let (path, required) = match config {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        if required || path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            settings.apply_toml(&raw)
                .with_context(|| format!("invalid config file {}", path.display()))?;
        }

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    fn apply_toml(&mut self, raw: &str) -> anyhow::Result<()> {
        let file: FileSettings = toml::from_str(raw)?;
        if let Some(seed) = file.seed {
            self.seed = Some(seed);
        }
        if let Some(dir) = file.data_dir {
            self.data_dir = dir;
        }
        if let Some(format) = file.log_format {
            self.log_format = format;
        }
        Ok(())
    }

    /// `PINJAM_SEED`, `PINJAM_DATA_DIR`, `PINJAM_LOG_FORMAT`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = lookup("PINJAM_SEED").filter(|v| !v.is_empty()) {
            self.seed = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("PINJAM_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("PINJAM_LOG_FORMAT") {
            self.log_format = v
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("PINJAM_LOG_FORMAT")?;
        }
        Ok(())
    }

    /// Resolve a user-supplied file name against `data_dir` unless absolute.
    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = Path::new(file);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}
