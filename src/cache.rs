use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::prismic::RawDoc;

/// A fetched post document and when we fetched it.
#[derive(Debug, Serialize, Deserialize)]
pub struct CachedDoc {
    pub uid: String,
    pub doc: RawDoc,
    pub fetched_at: DateTime<Utc>,
}

impl CachedDoc {
    /// Whether this entry can still be served without asking the API again.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        now - self.fetched_at < max_age
    }
}

/// Freshness window for a revalidation period given in hours.
pub fn max_age(hours: u32) -> Duration {
    Duration::hours(i64::from(hours))
}

/// File-based cache of single-post documents.
///
/// Cache layout: `~/.cache/prismic-blog/{repository_host}/{uid}.json`
pub struct Cache {
    dir: PathBuf,
}

impl Cache {
    /// Create a cache for the given repository host under the user cache directory.
    pub fn new(host: &str) -> Result<Self> {
        let cache_base = directories::ProjectDirs::from("", "", "prismic-blog")
            .context("Could not determine cache directory")?;
        Self::at(&cache_base.cache_dir().join(host))
    }

    /// Create a cache rooted at an explicit directory.
    pub fn at(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory: {:?}", dir))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    /// Load a cached document by uid, if it exists.
    ///
    /// An unreadable entry, or one stored for a different uid that maps to the
    /// same file name, is a miss: the caller refetches and overwrites it.
    pub fn load(&self, uid: &str) -> Result<Option<CachedDoc>> {
        let path = self.doc_path(uid);
        if !path.exists() {
            return Ok(None);
        }
        let data =
            std::fs::read_to_string(&path).with_context(|| format!("Failed to read {:?}", path))?;
        let cached: CachedDoc = match serde_json::from_str(&data) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!("Ignoring corrupt cache entry {:?}: {}", path, e);
                return Ok(None);
            }
        };
        if cached.uid != uid {
            tracing::debug!("Cache entry {:?} belongs to {}, not {}", path, cached.uid, uid);
            return Ok(None);
        }
        Ok(Some(cached))
    }

    /// Save a document to the cache (keyed by uid).
    ///
    /// Writes to a temporary file first so a reader never sees half an entry.
    pub fn save(&self, cached: &CachedDoc) -> Result<()> {
        let path = self.doc_path(&cached.uid);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(cached).context("Failed to serialize document")?;
        std::fs::write(&tmp, data).with_context(|| format!("Failed to write {:?}", tmp))?;
        std::fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {:?}", path))?;
        Ok(())
    }

    fn doc_path(&self, uid: &str) -> PathBuf {
        // uids are slugs, but never let one escape the cache directory
        let name: String = uid
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}
