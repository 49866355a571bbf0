//! On-disk cache for synthesized clips.
//!
//! Synthesis is idempotent for identical text/voice/language, so clips are
//! keyed by a digest of those inputs and reused across jobs.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::DubSyncConfig;
use crate::error::Result;

/// Synthesized-clip cache
pub struct ClipCache {
    cache_dir: PathBuf,
    max_size: Option<u64>,
}

impl ClipCache {
    pub fn new(config: &DubSyncConfig) -> Result<Self> {
        let cache_dir = if let Some(dir) = &config.cache_dir {
            PathBuf::from(dir)
        } else {
            std::env::temp_dir().join("dubsync-cache")
        };

        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)?;
        }

        Ok(Self {
            cache_dir,
            max_size: config.max_cache_size,
        })
    }

    /// Path a clip with this key would live at, whether or not it exists
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.wav", key))
    }

    /// Look up a previously synthesized clip
    pub fn cached_clip(&self, key: &str) -> Option<PathBuf> {
        let path = self.cache_path(key);
        if path.exists() {
            debug!("Clip cache hit: {}", path.display());
            Some(path)
        } else {
            None
        }
    }

    /// Copy a freshly synthesized clip into the cache
    pub fn add_clip(&self, key: &str, clip_path: &Path) -> Result<PathBuf> {
        let cache_file = self.cache_path(key);
        fs::copy(clip_path, &cache_file)?;

        if let Err(e) = self.check_cache_size() {
            // Eviction failure must not fail the synthesis that triggered it
            warn!("Clip cache eviction failed: {}", e);
        }

        Ok(cache_file)
    }

    /// Remove every cached clip
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Cache key for one synthesis request
    pub fn cache_key(text: &str, voice: &str, lang: &str, sample_rate: u32) -> String {
        let mut hasher = md5::Context::new();
        hasher.consume(text.as_bytes());
        hasher.consume(voice.as_bytes());
        hasher.consume(lang.as_bytes());
        hasher.consume(sample_rate.to_le_bytes());

        format!("{:x}", hasher.compute())
    }

    /// Evict oldest files until the cache fits under the size cap
    fn check_cache_size(&self) -> Result<()> {
        let Some(max_size) = self.max_size else {
            return Ok(());
        };

        let mut total_size = 0;
        let mut files = Vec::new();

        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                let metadata = entry.metadata()?;
                total_size += metadata.len();
                files.push((entry.path(), metadata.modified()?));
            }
        }

        if total_size > max_size {
            files.sort_by(|a, b| a.1.cmp(&b.1));

            for (path, _) in files {
                if total_size <= max_size {
                    break;
                }

                if let Ok(metadata) = fs::metadata(&path) {
                    total_size -= metadata.len();
                    fs::remove_file(path)?;
                }
            }
        }

        Ok(())
    }
}
