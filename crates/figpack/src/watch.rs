//! Source change notifications for watch sessions.
//!
//! Watches the project root recursively and forwards relevant changes,
//! skipping dependencies, build output, hidden files and configured patterns.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::trace;

use crate::error::EngineFault;

const CHANNEL_CAPACITY: usize = 100;

/// A change to one file under the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    Modified(PathBuf),
    Created(PathBuf),
    Removed(PathBuf),
}

impl FileChange {
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Recursive watcher feeding a bounded channel.
///
/// The channel closes once the watcher is dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// Repeated events for the same path inside `debounce` are collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineFault::WatchFailed`] if the platform watcher cannot be
    /// created or `root` cannot be watched.
    pub fn new(
        root: PathBuf,
        ignore_patterns: Vec<String>,
        debounce: Duration,
    ) -> Result<(Self, mpsc::Receiver<FileChange>), EngineFault> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let mut last_event: Option<(PathBuf, Instant)> = None;
        let filter_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };

            for path in &event.paths {
                if should_ignore(path, &filter_root, &ignore_patterns) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }

                let change = match event.kind {
                    EventKind::Create(_) => FileChange::Created(path.clone()),
                    EventKind::Modify(_) => FileChange::Modified(path.clone()),
                    EventKind::Remove(_) => FileChange::Removed(path.clone()),
                    _ => continue,
                };
                last_event = Some((path.clone(), now));

                trace!(path = %path.display(), "source change");
                // Receiver gone means the session is shutting down.
                if tx.blocking_send(change).is_err() {
                    return;
                }
            }
        })
        .map_err(|source| EngineFault::WatchFailed {
            root: root.clone(),
            source,
        })?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|source| EngineFault::WatchFailed {
                root: root.clone(),
                source,
            })?;

        Ok((Self { _watcher: watcher }, rx))
    }
}

/// Whether a change to `path` should be dropped.
///
/// Patterns starting with `*` match a suffix, anything else matches a
/// leading directory or a nested path segment.
fn should_ignore(path: &Path, root: &Path, ignore_patterns: &[String]) -> bool {
    let Ok(rel_path) = path.strip_prefix(root) else {
        return true;
    };

    let path_str = rel_path.to_string_lossy().replace('\\', "/");

    for pattern in ignore_patterns {
        if let Some(suffix) = pattern.strip_prefix('*') {
            if path_str.ends_with(suffix) {
                return true;
            }
        } else if path_str == *pattern
            || path_str.starts_with(&format!("{pattern}/"))
            || path_str.contains(&format!("/{pattern}/"))
        {
            return true;
        }
    }

    rel_path.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
    })
}
