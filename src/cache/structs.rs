use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::cache_context;

/// Record of the last completed import of one kind of source data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportStamp {
    pub format_version: u32,
    pub imported_at: DateTime<Utc>,
    pub documents: usize,
}

/// File-based store for parsed import output and import stamps
pub struct Cache {
    parsed_dir: PathBuf,
    stamps_dir: PathBuf,
}

impl Cache {
    /// Create a new cache instance
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        let parsed_dir = cache_dir.join("parsed");
        let stamps_dir = cache_dir.join("stamps");

        fs::create_dir_all(&parsed_dir).context("Failed to create parsed cache directory")?;
        fs::create_dir_all(&stamps_dir).context("Failed to create stamps cache directory")?;

        Ok(Self {
            parsed_dir,
            stamps_dir,
        })
    }

    /// Save parsed data to cache
    pub fn save_parsed<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let file_path = self.parsed_dir.join(format!("{}.json", key));
        self.write_json(&file_path, data)
            .with_context(|| cache_context("write", key))?;
        info!("Saved parsed data to cache: {}", file_path.display());
        Ok(())
    }

    /// Load parsed data from cache
    pub fn load_parsed<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        let file_path = self.parsed_dir.join(format!("{}.json", key));
        self.read_json_opt(&file_path)
            .with_context(|| cache_context("read", key))
    }

    /// Stamp left by the last import of `kind`, if any
    pub fn load_stamp(&self, kind: &str) -> Result<Option<ImportStamp>> {
        let file_path = self.stamps_dir.join(format!("{}.json", kind));
        self.read_json_opt(&file_path)
            .with_context(|| cache_context("read stamp", kind))
    }

    pub fn save_stamp(&self, kind: &str, stamp: &ImportStamp) -> Result<()> {
        let file_path = self.stamps_dir.join(format!("{}.json", kind));
        self.write_json(&file_path, stamp)
            .with_context(|| cache_context("write stamp", kind))
    }

    // --- Helper Methods ---

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        fs::write(path, json).context("Failed to write cache file")?;
        Ok(())
    }

    fn read_json_opt<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(path)?;
        let data = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse JSON from {:?}. First 200 chars: {}",
                path,
                json.chars().take(200).collect::<String>()))?;
        Ok(Some(data))
    }
}
