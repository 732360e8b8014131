//! Request-scoped scratch files and their delayed cleanup.
//!
//! Every request gets a `Workspace` whose paths carry a unique id, so
//! concurrent requests never collide on disk. The `Janitor` removes
//! artifacts on detached tasks: intermediates with zero delay, the
//! deliverable after the retention window so the caller can finish
//! downloading it.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{info, warn};
use uuid::Uuid;

/// Per-request scratch path allocator.
///
/// Paths are recorded as they are allocated; cleanup works off the recorded
/// list, so an aborted request only touches what it actually created.
#[derive(Debug)]
pub struct Workspace {
    id: String,
    dir: PathBuf,
    tracked: Mutex<Vec<PathBuf>>,
}

impl Workspace {
    pub fn new(dir: &Path) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            dir: dir.to_path_buf(),
            tracked: Mutex::new(Vec::new()),
        }
    }

    /// The request-scoped unique id.
    pub fn id(&self) -> &str {
        &self.id
    }

    fn alloc(&self, file_name: String) -> PathBuf {
        let path = self.dir.join(file_name);
        self.tracked.lock().unwrap().push(path.clone());
        path
    }

    pub fn src_photo(&self, ext: &str) -> PathBuf {
        self.alloc(format!("src_photo_{}.{}", self.id, ext))
    }

    pub fn src_video(&self, ext: &str) -> PathBuf {
        self.alloc(format!("src_video_{}.{}", self.id, ext))
    }

    pub fn converted_photo(&self) -> PathBuf {
        self.alloc(format!("conv_photo_{}.jpg", self.id))
    }

    pub fn out_photo(&self) -> PathBuf {
        self.alloc(format!("out_photo_{}.jpg", self.id))
    }

    pub fn out_video(&self) -> PathBuf {
        self.alloc(format!("out_video_{}.mov", self.id))
    }

    pub fn bundle(&self) -> PathBuf {
        self.alloc(format!("live_{}.zip", self.id))
    }

    /// Every path allocated so far.
    pub fn tracked(&self) -> Vec<PathBuf> {
        self.tracked.lock().unwrap().clone()
    }

    /// Every allocated path except `keep`.
    pub fn tracked_except(&self, keep: &Path) -> Vec<PathBuf> {
        self.tracked
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_path() != keep)
            .cloned()
            .collect()
    }
}

/// Delayed best-effort file removal on detached tasks.
#[derive(Debug, Clone, Default)]
pub struct Janitor;

impl Janitor {
    pub fn new() -> Self {
        Self
    }

    /// Remove `paths` after `delay`. Detached: never blocks the response
    /// or process shutdown.
    pub fn schedule(&self, paths: Vec<PathBuf>, delay: Duration) {
        if paths.is_empty() {
            return;
        }
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            for path in &paths {
                remove_silently(path);
            }
        });
    }
}

/// Remove `paths` right now, before a response is produced. Used when
/// validation fails so nothing lingers in scratch storage.
pub fn remove_now(paths: &[PathBuf]) {
    for path in paths {
        remove_silently(path);
    }
}

fn remove_silently(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => info!("cleaned up: {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("cleanup failed {}: {}", path.display(), e),
    }
}
