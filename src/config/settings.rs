use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides the database location, mostly for scripting and tests.
pub const DB_ENV_VAR: &str = "KHATMA_DB";

fn default_language() -> String {
    "en".to_string()
}
fn default_hijri_offset() -> i32 {
    0
}
fn default_from_email() -> String {
    "noreply@khatma.local".to_string()
}
fn default_tick_ms() -> u64 {
    1000
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Username commands act on when `--user` is not given
    #[serde(default)]
    pub current: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// `ar` or `en`; picks which surah name is shown first
    #[serde(default = "default_language")]
    pub language: String,
    /// Days to add/subtract from the Hijri date for local moon sighting.
    #[serde(default = "default_hijri_offset")]
    pub hijri_offset: i32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            hijri_offset: default_hijri_offset(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// When false only the in-app feed is written
    #[serde(default = "default_true")]
    pub deliver_external: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            from_email: default_from_email(),
            deliver_external: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuranConfig {
    /// Default pipe-delimited text file for `khatma quran import`
    #[serde(default)]
    pub text_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuiConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl Default for TuiConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub quran: QuranConfig,
    #[serde(default)]
    pub tui: TuiConfig,
}

impl AppConfig {
    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("", "", "khatma").context("Could not determine project directories")
    }

    pub fn config_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn db_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(DB_ENV_VAR) {
            if !path.trim().is_empty() {
                return Ok(PathBuf::from(path));
            }
        }
        Ok(Self::data_dir()?.join("khatma.db"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Reading {:?}", path))?;
        let config: AppConfig = toml::from_str(&content).context("Parsing config.toml")?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Serializing config")?;
        std::fs::write(path, content).with_context(|| format!("Writing {:?}", path))?;
        Ok(())
    }

    pub fn ensure_data_dir() -> Result<PathBuf> {
        let dir = Self::data_dir()?;
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// The acting username: an explicit override wins over the configured one.
    pub fn acting_user<'a>(&'a self, explicit: Option<&'a str>) -> Option<&'a str> {
        explicit.or(self.user.current.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.display.language, "en");
        assert!(config.notifications.deliver_external);
        assert_eq!(config.tui.tick_ms, 1000);
        assert!(config.user.current.is_none());
    }

    #[test]
    fn partial_file_fills_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[user]\ncurrent = \"amina\"\n\n[display]\nhijri_offset = -1\n")
            .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.user.current.as_deref(), Some("amina"));
        assert_eq!(config.display.hijri_offset, -1);
        assert_eq!(config.display.language, "en");
        assert_eq!(config.notifications.from_email, "noreply@khatma.local");
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = AppConfig::default();
        config.user.current = Some("yusuf".to_string());
        config.quran.text_path = Some(PathBuf::from("/tmp/quran-text.txt"));
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.user.current.as_deref(), Some("yusuf"));
        assert_eq!(
            loaded.quran.text_path.as_deref(),
            Some(Path::new("/tmp/quran-text.txt"))
        );
    }

    #[test]
    fn explicit_user_overrides_config() {
        let mut config = AppConfig::default();
        assert_eq!(config.acting_user(None), None);
        config.user.current = Some("amina".to_string());
        assert_eq!(config.acting_user(None), Some("amina"));
        assert_eq!(config.acting_user(Some("bilal")), Some("bilal"));
    }
}
