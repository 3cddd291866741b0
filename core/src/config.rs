//! Configuration management (`config.toml`)
//!
//! Handles loading, saving, and providing defaults for bridge settings.
//! Settings are stored in TOML format in the platform-specific config directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use totalgb_shared as shared;

use crate::foreign::EntryPoint;

/// Bridge configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// Client-side size limits
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Names of the native module's exports
    #[serde(default)]
    pub exports: ExportNames,
    /// Save archive download settings
    #[serde(default)]
    pub download: DownloadConfig,
    /// Durable store settings
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Size limits checked before any read or foreign call.
///
/// These mirror limits the native module applies itself; they only exist to
/// reject bad selections early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted ROM in bytes (default: 0x410000)
    #[serde(default = "default_rom_max_size")]
    pub rom_max_size: u64,
    /// Largest accepted save file in bytes (default: 0x10000)
    #[serde(default = "default_save_max_size")]
    pub save_max_size: u64,
    /// Cap on the module's linear memory in bytes (default: 256 MiB)
    #[serde(default = "default_memory_limit")]
    pub memory_limit: usize,
}

/// Export names of the native module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportNames {
    #[serde(default = "default_memory")]
    pub memory: String,
    #[serde(default = "default_malloc")]
    pub malloc: String,
    #[serde(default = "default_free")]
    pub free: String,
    #[serde(default = "default_load_rom")]
    pub load_rom: String,
    #[serde(default = "default_upload_save")]
    pub upload_save: String,
    #[serde(default = "default_archive_size")]
    pub archive_size: String,
    #[serde(default = "default_archive_data")]
    pub archive_data: String,
}

/// How the save archive is offered for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Suggested file name (default: saves.zip)
    #[serde(default = "default_file_name")]
    pub file_name: String,
    /// MIME type of the object (default: application/zip)
    #[serde(default = "default_mime_type")]
    pub mime_type: String,
}

/// Where the native module's durable store lives on the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory the module stores its saves in, synced after each batch
    /// (default: `<data dir>/saves`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,
}

fn default_rom_max_size() -> u64 {
    shared::ROM_MAX_SIZE
}
fn default_save_max_size() -> u64 {
    shared::SAVE_MAX_SIZE
}
fn default_memory_limit() -> usize {
    256 * 1024 * 1024
}

fn default_memory() -> String {
    shared::EXPORT_MEMORY.to_string()
}
fn default_malloc() -> String {
    shared::EXPORT_MALLOC.to_string()
}
fn default_free() -> String {
    shared::EXPORT_FREE.to_string()
}
fn default_load_rom() -> String {
    shared::EXPORT_LOAD_ROM.to_string()
}
fn default_upload_save() -> String {
    shared::EXPORT_UPLOAD_SAVE.to_string()
}
fn default_archive_size() -> String {
    shared::EXPORT_ARCHIVE_SIZE.to_string()
}
fn default_archive_data() -> String {
    shared::EXPORT_ARCHIVE_DATA.to_string()
}

fn default_file_name() -> String {
    shared::ARCHIVE_FILE_NAME.to_string()
}
fn default_mime_type() -> String {
    shared::ARCHIVE_MIME_TYPE.to_string()
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rom_max_size: default_rom_max_size(),
            save_max_size: default_save_max_size(),
            memory_limit: default_memory_limit(),
        }
    }
}

impl Default for ExportNames {
    fn default() -> Self {
        Self {
            memory: default_memory(),
            malloc: default_malloc(),
            free: default_free(),
            load_rom: default_load_rom(),
            upload_save: default_upload_save(),
            archive_size: default_archive_size(),
            archive_data: default_archive_data(),
        }
    }
}

impl ExportNames {
    /// Export name bound to an entry point role.
    pub fn entry(&self, entry: EntryPoint) -> &str {
        match entry {
            EntryPoint::LoadRom => &self.load_rom,
            EntryPoint::UploadSave => &self.upload_save,
            EntryPoint::ArchiveSize => &self.archive_size,
            EntryPoint::ArchiveData => &self.archive_data,
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            file_name: default_file_name(),
            mime_type: default_mime_type(),
        }
    }
}

impl StorageConfig {
    /// The configured save directory, falling back to the platform data
    /// directory.
    pub fn resolve_save_dir(&self) -> Option<PathBuf> {
        self.save_dir
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join("saves")))
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\TotalGB\config`
/// On macOS: `~/Library/Application Support/io.github.TotalGB`
/// On Linux: `~/.config/TotalGB`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.github", "", "TotalGB")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory (save storage).
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.github", "", "TotalGB")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> BridgeConfig {
    config_dir()
        .and_then(|dir| std::fs::read_to_string(dir.join("config.toml")).ok())
        .and_then(|content| toml::from_str(&content).ok())
        .unwrap_or_default()
}

/// Loads the configuration from an explicit path.
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: &Path) -> Result<BridgeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
}

/// Saves the configuration to the platform config directory.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file
/// cannot be written.
pub fn save(config: &BridgeConfig) -> Result<()> {
    if let Some(dir) = config_dir() {
        save_to(&dir.join("config.toml"), config)?;
    }
    Ok(())
}

/// Saves the configuration to an explicit path, creating parent directories.
pub fn save_to(path: &Path, config: &BridgeConfig) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config: {}", path.display()))
}
