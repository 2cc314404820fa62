//! Run-scoped state shared between steps

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// State owned by one pipeline run
///
/// Steps hold it through an `Arc`. The primary encode step writes the
/// fallback flag and the fallback step's skip predicate reads it.
#[derive(Debug)]
pub struct RunState {
    run_id: Uuid,

    /// Archive produced by encoding and consumed by signing
    tmp_archive: PathBuf,

    fall_back_to_aapt: AtomicBool,

    /// Why the primary strategy failed, kept for the fallback's error
    primary_failure: Mutex<Option<String>>,
}

impl RunState {
    /// Create state for a new run with its archive inside `tmp_dir`
    pub fn new(tmp_dir: &Path) -> Self {
        let run_id = Uuid::new_v4();
        Self {
            run_id,
            tmp_archive: tmp_dir.join(format!("repack-{}.apk", run_id)),
            fall_back_to_aapt: AtomicBool::new(false),
            primary_failure: Mutex::new(None),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn tmp_archive(&self) -> &Path {
        &self.tmp_archive
    }

    /// Record a primary encode failure and enable the fallback
    pub fn fall_back(&self, reason: String) {
        *self
            .primary_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(reason);
        self.fall_back_to_aapt.store(true, Ordering::SeqCst);
    }

    pub fn should_fall_back(&self) -> bool {
        self.fall_back_to_aapt.load(Ordering::SeqCst)
    }

    pub fn primary_failure(&self) -> Option<String> {
        self.primary_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
