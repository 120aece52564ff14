// ── Result cache ──
//
// Last-known status per (box, rule instance), persisted as one flat YAML
// document keyed by `<box id>.<event id>`. The whole document is read at
// load and rewritten atomically by `persist`. Read and write failures are
// logged by the caller and never abort a run; the in-memory state stays
// authoritative for the current cycle.

use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::{CheckResult, CheckStatus, EventId};

const KEY_SEPARATOR: char = '.';

/// A result whose status differs from the cached one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<'a> {
    pub result: &'a CheckResult,
    /// `None` when the rule instance has never been seen.
    pub previous: Option<CheckStatus>,
}

impl Change<'_> {
    /// FAILED → OK.
    pub fn is_resolution(&self) -> bool {
        self.previous == Some(CheckStatus::Failed) && self.result.status == CheckStatus::Ok
    }
}

/// One persisted entry, as shown by `cache show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntry {
    pub box_id: String,
    pub event_id: String,
    pub status: CheckStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    path: Option<PathBuf>,
    entries: BTreeMap<String, CheckStatus>,
}

impl ResultCache {
    /// A cache that is never read from or written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the cache stored at `path`.
    ///
    /// A missing file yields an empty cache. An unreadable or malformed
    /// file is logged and also yields an empty cache bound to `path`, so
    /// the next `persist` replaces it.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("{e}; starting with an empty cache");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), entries = entries.len(), "loaded result cache");
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last-known status, or `None` if unknown.
    pub fn lookup(&self, box_id: &str, event_id: &EventId) -> Option<CheckStatus> {
        self.entries.get(&key(box_id, event_id.as_str())).copied()
    }

    /// Results whose status differs from the cache, in input order.
    pub fn diff<'a>(&self, box_id: &str, results: &'a [CheckResult]) -> Vec<Change<'a>> {
        results
            .iter()
            .filter_map(|result| {
                let previous = self.lookup(box_id, &result.event_id());
                (previous != Some(result.status)).then_some(Change { result, previous })
            })
            .collect()
    }

    /// Replace every entry of `box_id` with the statuses in `results`.
    ///
    /// Entries for rule instances no longer evaluated are dropped.
    pub fn update(&mut self, box_id: &str, results: &[CheckResult]) {
        let prefix = format!("{box_id}{KEY_SEPARATOR}");
        self.entries.retain(|k, _| !k.starts_with(&prefix));
        for result in results {
            self.entries
                .insert(key(box_id, result.event_id().as_str()), result.status);
        }
    }

    /// Atomically write the full cache to its file. No-op for in-memory caches.
    pub fn persist(&self) -> Result<(), CoreError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        let io_err = |message: String| CoreError::CacheIo {
            path: path.display().to_string(),
            message,
        };

        let yaml = serde_yaml::to_string(&self.entries).map_err(|e| io_err(e.to_string()))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(|e| io_err(e.to_string()))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| io_err(e.to_string()))?;
        tmp.write_all(yaml.as_bytes())
            .map_err(|e| io_err(e.to_string()))?;
        tmp.persist(path).map_err(|e| io_err(e.error.to_string()))?;

        debug!(path = %path.display(), entries = self.entries.len(), "persisted result cache");
        Ok(())
    }

    /// Forget every entry and delete the cache file.
    pub fn clear(&mut self) -> Result<(), CoreError> {
        self.entries.clear();
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::CacheIo {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// All entries, sorted by box id then event id.
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.entries
            .iter()
            .map(|(k, status)| {
                let (box_id, event_id) = k.split_once(KEY_SEPARATOR).unwrap_or((k.as_str(), ""));
                CacheEntry {
                    box_id: box_id.to_owned(),
                    event_id: event_id.to_owned(),
                    status: *status,
                }
            })
            .collect()
    }
}

fn key(box_id: &str, event_id: &str) -> String {
    format!("{box_id}{KEY_SEPARATOR}{event_id}")
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, CheckStatus>, CoreError> {
    let io_err = |message: String| CoreError::CacheIo {
        path: path.display().to_string(),
        message,
    };

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(io_err(e.to_string())),
    };
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_yaml::from_str(&raw).map_err(|e| io_err(e.to_string()))
}
