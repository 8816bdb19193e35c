//! Incremental scan cache using SHA-256 for robust change detection.
//!
//! Performance characteristics:
//! - Parallel hashing and scanning via Rayon
//! - Read-once pattern: document text fetched once, then hashed and scanned
//! - O(changed_documents) scanning work, O(1) cache lookups
//!
//! Stores the full [`DocumentScan`] per key so an unchanged document skips
//! region scanning and extraction entirely on the next run.
//!
//! # Cache Versioning
//!
//! The cache includes version metadata to force a rebuild when:
//! - Refscan version changes (may extract differently)
//! - Cache format changes

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::extract::pattern::PatternSet;
use crate::index::{scan_document, DocumentIndex, DocumentScan};
use crate::store::DocumentProvider;

/// Maximum cache file size (50MB), prevents unbounded cache growth.
const MAX_CACHE_SIZE_BYTES: usize = 50_000_000;

/// Current cache format version. Increment when the scan model changes.
const CACHE_VERSION: u32 = 1;

/// Refscan version for cache compatibility checking.
const REFSCAN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cache file name inside the cache directory.
const CACHE_FILE: &str = "cache.json";

/// SHA-256 of document text as lowercase hex.
pub fn content_hash(text: &str) -> String {
    let mut sha = Sha256::new();
    sha.update(text.as_bytes());
    format!("{:x}", sha.finalize())
}

/// Cache metadata for version checking.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheMetadata {
    /// Cache format version
    pub cache_version: u32,
    /// Refscan version that created this cache
    pub refscan_version: String,
    /// RFC 3339 timestamp of cache creation
    #[serde(default)]
    pub created_at: String,
}

impl CacheMetadata {
    /// Create metadata for the current environment.
    pub fn current() -> Self {
        Self {
            cache_version: CACHE_VERSION,
            refscan_version: REFSCAN_VERSION.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Check whether this cache is compatible with the current version.
    pub fn is_compatible(&self) -> bool {
        if self.cache_version != CACHE_VERSION {
            return false;
        }

        // Major version must match
        let current_major = REFSCAN_VERSION.split('.').next().unwrap_or("0");
        let cached_major = self.refscan_version.split('.').next().unwrap_or("0");

        current_major == cached_major
    }
}

/// The full cache model, stored as `cache.json` in the cache directory.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ScanCache {
    /// Cache metadata for version checking
    #[serde(default)]
    pub metadata: CacheMetadata,
    /// Maps artifact key to its cached scan.
    pub scans: BTreeMap<String, DocumentScan>,
}

/// Load the cache from `<cache_dir>/cache.json`.
///
/// Returns `None` if:
/// - File doesn't exist
/// - File is corrupted
/// - Cache version is incompatible with the current refscan version
pub fn load_cache(cache_dir: &Path) -> Option<ScanCache> {
    let path = cache_dir.join(CACHE_FILE);
    if !path.exists() {
        return None;
    }

    let text = fs::read_to_string(&path).ok()?;
    let cache: ScanCache = serde_json::from_str(&text).ok()?;

    if !cache.metadata.is_compatible() {
        info!(
            cached_version = %cache.metadata.refscan_version,
            cached_format = cache.metadata.cache_version,
            current_version = REFSCAN_VERSION,
            current_format = CACHE_VERSION,
            "cache version mismatch, rebuilding"
        );
        let _ = fs::remove_file(&path);
        return None;
    }

    Some(cache)
}

/// Save the cache to disk.
///
/// Uses the temp-file-plus-rename pattern so an interrupted process never
/// leaves a partially written cache behind, and enforces the size cap.
pub fn save_cache(cache_dir: &Path, cache: &ScanCache) -> Result<()> {
    if !cache_dir.exists() {
        fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache dir: {}", cache_dir.display()))?;
    }

    let path = cache_dir.join(CACHE_FILE);
    let json = serde_json::to_string_pretty(cache)?;

    if json.len() > MAX_CACHE_SIZE_BYTES {
        warn!(
            limit_mb = MAX_CACHE_SIZE_BYTES / 1_000_000,
            "cache exceeds size limit, clearing"
        );
        let _ = fs::remove_file(&path);
        return Ok(());
    }

    // PID plus nanosecond timestamp keeps concurrent writers apart
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = cache_dir.join(format!("{}.{}.{}.tmp", CACHE_FILE, std::process::id(), nanos));

    fs::write(&temp_path, &json)
        .with_context(|| format!("Failed to write temp cache file: {}", temp_path.display()))?;

    fs::rename(&temp_path, &path).with_context(|| {
        let _ = fs::remove_file(&temp_path);
        format!("Failed to rename cache file to: {}", path.display())
    })?;

    Ok(())
}

/// Build the index over a provider, reusing cached scans for documents
/// whose content hash is unchanged.
///
/// Fault tolerance:
/// - Unchanged hash: reuse the cached scan without re-extracting
/// - Changed hash or not in cache: re-scan the fetched text
/// - Fetch failure: skip the key with a warning, continue with the rest
pub fn incremental_index<P: DocumentProvider + ?Sized>(
    provider: &P,
    patterns: &PatternSet,
    old_cache: Option<&ScanCache>,
) -> (DocumentIndex, ScanCache) {
    let keys = provider.keys();
    let scans: Vec<DocumentScan> = keys
        .par_iter()
        .filter_map(|key| {
            let Some(text) = provider.fetch(key) else {
                warn!(key = %key, "document listed but not fetchable, skipping");
                return None;
            };

            let hash = content_hash(&text);
            if let Some(old) = old_cache {
                if let Some(cached) = old.scans.get(key) {
                    if cached.hash == hash {
                        return Some(cached.clone());
                    }
                }
            }

            Some(scan_document(key, &text, patterns))
        })
        .collect();

    let mut new_cache = ScanCache {
        metadata: CacheMetadata::current(),
        scans: BTreeMap::new(),
    };
    for scan in &scans {
        new_cache.scans.insert(scan.key.clone(), scan.clone());
    }

    (DocumentIndex::from_scans(scans), new_cache)
}
