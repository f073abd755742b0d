//! File-based version allow-list.
//!
//! # Responsibilities
//! - Create the allow-list file (and parent dirs) when missing
//! - Parse one version per line
//! - Reload on a fixed delay until shutdown
//! - Publish the current set lock-free to request threads
//!
//! # Design Decisions
//! - Read-only to routing; only the refresh task writes
//! - A failed reload keeps the previous set
//! - Lines may carry a leading `/` (`/v1` and `v1` are the same version)

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

const DEFAULT_FILE_NAME: &str = "VersionConfig.txt";

/// Errors raised while preparing or reading the allow-list file.
#[derive(Debug, Error)]
pub enum AllowListError {
    #[error("failed to prepare allow-list file {path}: {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to read allow-list file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
}

/// Externally maintained set of versions reachable at lookup time.
#[derive(Debug)]
pub struct FileAllowList {
    path: Option<PathBuf>,
    versions: ArcSwap<HashSet<String>>,
}

impl FileAllowList {
    /// Open (creating if needed) and load the allow-list at `configured`.
    pub fn open(configured: &str) -> Result<Self, AllowListError> {
        let path = resolve_path(configured);
        ensure_exists(&path)?;

        let list = Self {
            path: Some(path),
            versions: ArcSwap::from_pointee(HashSet::new()),
        };
        list.reload()?;
        Ok(list)
    }

    /// A fixed, file-less allow-list.
    pub fn from_versions<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = versions
            .into_iter()
            .filter_map(|v| normalize_line(v.as_ref()))
            .collect();
        Self {
            path: None,
            versions: ArcSwap::from_pointee(set),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-read the file and publish the new set. Returns the version count.
    pub fn reload(&self) -> Result<usize, AllowListError> {
        let Some(path) = &self.path else {
            return Ok(self.versions.load().len());
        };

        let content = fs::read_to_string(path).map_err(|source| AllowListError::Read {
            path: path.clone(),
            source,
        })?;
        let set = parse_allow_list(&content);
        let count = set.len();

        tracing::debug!(path = ?path, versions = ?set, "Allow-list refreshed");
        self.versions.store(Arc::new(set));
        Ok(count)
    }

    /// Replace the set directly.
    pub fn replace<I, S>(&self, versions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = versions
            .into_iter()
            .filter_map(|v| normalize_line(v.as_ref()))
            .collect();
        self.versions.store(Arc::new(set));
    }

    pub fn contains(&self, version: &str) -> bool {
        self.versions.load().contains(version)
    }

    /// Snapshot of the currently allowed versions.
    pub fn currently_allowed(&self) -> Arc<HashSet<String>> {
        self.versions.load_full()
    }

    /// Reload every `interval` until shutdown is signalled.
    pub fn spawn_refresh(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(path = ?self.path, interval_ms = interval.as_millis() as u64, "Allow-list refresh starting");

            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the file was just loaded.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.reload() {
                            tracing::error!(error = %e, "Allow-list reload failed, keeping previous versions");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::info!("Allow-list refresh received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        })
    }
}

/// Append the default file name unless the path already names a `.txt` file.
pub fn resolve_path(configured: &str) -> PathBuf {
    let is_txt = Path::new(configured)
        .extension()
        .is_some_and(|ext| ext == "txt");
    if is_txt {
        PathBuf::from(configured)
    } else {
        PathBuf::from(format!("{configured}{DEFAULT_FILE_NAME}"))
    }
}

fn ensure_exists(path: &Path) -> Result<(), AllowListError> {
    let create_err = |source| AllowListError::Create {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(create_err)?;
    }
    if !path.exists() {
        fs::File::create(path).map_err(create_err)?;
        tracing::info!(path = ?path, "Created allow-list file");
    }
    Ok(())
}

fn normalize_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let version = trimmed.strip_prefix('/').unwrap_or(trimmed).trim();
    (!version.is_empty()).then(|| version.to_string())
}

/// Parse allow-list text: one version per line, blanks skipped.
pub fn parse_allow_list(content: &str) -> HashSet<String> {
    content.lines().filter_map(normalize_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blanks_and_slashes() {
        let set = parse_allow_list("v1\n\n  /v2  \n   \n2.0.0\n");
        assert_eq!(set.len(), 3);
        assert!(set.contains("v1"));
        assert!(set.contains("v2"));
        assert!(set.contains("2.0.0"));
    }

    #[test]
    fn test_resolve_path_appends_default_name() {
        assert_eq!(resolve_path("conf/"), PathBuf::from("conf/VersionConfig.txt"));
        assert_eq!(resolve_path("conf/allow.txt"), PathBuf::from("conf/allow.txt"));
    }

    #[test]
    fn test_open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let configured = format!("{}/nested/", dir.path().display());

        let list = FileAllowList::open(&configured).unwrap();
        let path = list.path().unwrap().to_path_buf();
        assert!(path.exists());
        assert!(list.currently_allowed().is_empty());

        fs::write(&path, "v1\nv3\n").unwrap();
        assert_eq!(list.reload().unwrap(), 2);
        assert!(list.contains("v3"));
    }

    #[test]
    fn test_failed_reload_keeps_previous_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allow.txt");
        fs::write(&path, "v1\n").unwrap();

        let list = FileAllowList::open(path.to_str().unwrap()).unwrap();
        fs::remove_file(&path).unwrap();

        assert!(list.reload().is_err());
        assert!(list.contains("v1"));
    }

    #[tokio::test]
    async fn test_refresh_task_picks_up_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("allow.txt");
        fs::write(&path, "v1\n").unwrap();

        let list = Arc::new(FileAllowList::open(path.to_str().unwrap()).unwrap());
        let (tx, rx) = broadcast::channel(1);
        let handle = list.clone().spawn_refresh(Duration::from_millis(20), rx);

        fs::write(&path, "v2\n").unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(list.contains("v2"));
        assert!(!list.contains("v1"));

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
