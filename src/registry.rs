//! Open views and the host command table.
//!
//! Every view owns its own [`Navigator`]; nothing is shared between views.
//! Commands without an explicit view go to the active one.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ZoomConfig;
use crate::fs::FileSystem;
use crate::host::{self, Dispatched, Host};
use crate::media::is_image_file;
use crate::protocol::Command;
use crate::session::{Navigator, Outcome};

/// Identifier of the read-only image view type.
pub const VIEW_TYPE: &str = "imgnav.imageView";

/// Host command ids and the view command each one runs.
pub const COMMANDS: &[(&str, Command)] = &[
    ("imgnav.next", Command::NextImage),
    ("imgnav.prev", Command::PrevImage),
    ("imgnav.nextFolder", Command::NextFolder),
    ("imgnav.prevFolder", Command::PrevFolder),
    ("imgnav.delete", Command::DeleteImage),
    ("imgnav.copy", Command::CopyImage),
    ("imgnav.rotate", Command::RotateImage),
    ("imgnav.resetZoom", Command::ResetZoom),
];

pub fn command_by_id(id: &str) -> Option<Command> {
    COMMANDS.iter().find(|(name, _)| *name == id).map(|(_, c)| *c)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewId(pub u32);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Strip Windows extended-length path prefix (`\\?\`) if present.
pub(crate) fn clean_path(p: &Path) -> PathBuf {
    let s = p.to_string_lossy();
    match s.strip_prefix(r"\\?\") {
        Some(rest) => PathBuf::from(rest),
        None => p.to_path_buf(),
    }
}

pub struct Registry<F> {
    fs: F,
    zoom: ZoomConfig,
    views: Mutex<BTreeMap<ViewId, Arc<Navigator<F>>>>,
    active: Mutex<Option<ViewId>>,
    next_id: AtomicU32,
}

impl<F: FileSystem + Clone> Registry<F> {
    pub fn new(fs: F, zoom: ZoomConfig) -> Self {
        Registry {
            fs,
            zoom,
            views: Mutex::new(BTreeMap::new()),
            active: Mutex::new(None),
            next_id: AtomicU32::new(1),
        }
    }

    fn views(&self) -> MutexGuard<'_, BTreeMap<ViewId, Arc<Navigator<F>>>> {
        self.views.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_slot(&self) -> MutexGuard<'_, Option<ViewId>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new view on an image. The new view becomes active.
    ///
    /// Failures are reported on the host and yield `None`.
    pub fn open(&self, path: &Path, host: &dyn Host) -> Option<ViewId> {
        if !is_image_file(path) {
            host.error(&format!("Not an image: {}", path.display()));
            return None;
        }
        // Absolute, but symlinks stay as given: folder neighbors are looked up
        // beside the path the user opened, not beside its target.
        let path = match std::path::absolute(path).and_then(|p| fs::metadata(&p).map(|_| p)) {
            Ok(p) => clean_path(&p),
            Err(e) => {
                host.error(&format!("Cannot open {}: {}", path.display(), e));
                return None;
            }
        };

        let nav = Navigator::new(self.fs.clone());
        let shown = match nav.open(&path) {
            Ok(Outcome::Show(p)) => p,
            Ok(_) => return None,
            Err(e) => {
                host.error(&e.to_string());
                return None;
            }
        };

        let view = ViewId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let nav = Arc::new(nav);
        self.views().insert(view, nav.clone());
        *self.active_slot() = Some(view);
        info!(%view, path = %shown.display(), "view opened");

        host.opened(view);
        host::present(view, &nav, host, self.zoom, Ok(Outcome::Show(shown)));
        Some(view)
    }

    /// Drop a view and its session.
    pub fn close(&self, view: ViewId) -> bool {
        let removed = self.views().remove(&view).is_some();
        if removed {
            let mut active = self.active_slot();
            if *active == Some(view) {
                *active = self.views().keys().next_back().copied();
            }
            info!(%view, "view closed");
        }
        removed
    }

    pub fn focus(&self, view: ViewId) -> bool {
        if self.views().contains_key(&view) {
            *self.active_slot() = Some(view);
            true
        } else {
            false
        }
    }

    pub fn active(&self) -> Option<ViewId> {
        *self.active_slot()
    }

    pub fn navigator(&self, view: ViewId) -> Option<Arc<Navigator<F>>> {
        self.views().get(&view).cloned()
    }

    /// Open views with the image each one shows.
    pub fn list(&self) -> Vec<(ViewId, Option<PathBuf>)> {
        self.views()
            .iter()
            .map(|(id, nav)| (*id, nav.snapshot().current().map(Path::to_path_buf)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.views().is_empty()
    }

    /// Run `command` on `view`, or on the active view when `None`.
    ///
    /// Returns false when there is no such view.
    pub fn dispatch(&self, view: Option<ViewId>, command: Command, host: &dyn Host) -> bool {
        let Some(view) = view.or_else(|| self.active()) else {
            debug!(?command, "no active view");
            return false;
        };
        let Some(nav) = self.navigator(view) else {
            debug!(%view, ?command, "unknown view");
            return false;
        };
        if host::dispatch(view, &nav, host, self.zoom, command) == Dispatched::Closed {
            self.close(view);
        }
        true
    }

    /// Run a host command id (`imgnav.next`, ...) on the active view.
    pub fn execute(&self, id: &str, host: &dyn Host) -> bool {
        match command_by_id(id) {
            Some(command) => self.dispatch(None, command, host),
            None => {
                host.error(&format!("Unknown command: {}", id));
                false
            }
        }
    }
}
