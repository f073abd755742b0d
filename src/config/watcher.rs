//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by rename-and-replace keep triggering reloads. Only events that
//! name the config file are acted on. Invalid files are logged and dropped;
//! the receiver only ever sees validated configs.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::CoexistConfig;

/// Sends a freshly validated config whenever the watched file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<CoexistConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for validated configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<CoexistConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching. Notifications stop when the returned handle drops.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, updates } = self;
        let file_name = path.file_name().map(OsString::from);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let config_path = path.clone();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, file_name.as_deref()) => {
                    tracing::info!(path = ?config_path, kind = ?event.kind, "Config file changed");
                    match load_config(&config_path) {
                        Ok(config) => {
                            if updates.send(config).is_err() {
                                tracing::debug!("Config receiver dropped, ignoring change");
                            }
                        }
                        Err(e) => tracing::error!(
                            error = %e,
                            "Reloaded config is invalid, keeping current routes"
                        ),
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

/// Whether `event` writes to the file named `file_name`.
fn touches(event: &Event, file_name: Option<&OsStr>) -> bool {
    let relevant = matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_));
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name().is_some() && p.file_name() == file_name)
}
