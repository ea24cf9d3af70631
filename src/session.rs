//! Per-view navigation state and the operations the view triggers.
//!
//! A [`Navigator`] owns exactly one [`Session`]. Navigation, folder jumps and
//! delete run through a single-slot guard: while one is in flight the phase
//! is [`Phase::Busy`] and every other gated request is dropped, not queued.
//! Copy is read-only and bypasses the guard.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::error::{NavError, NavResult};
use crate::fs::FileSystem;
use crate::protocol::file_uri;
use crate::scanner::{self, Direction};

/// Gated operations, named so a dropped request can say what blocked it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Open,
    Next,
    Prev,
    NextFolder,
    PrevFolder,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Busy(Op),
}

/// Navigation state for one open view.
///
/// After any successful navigation `siblings[index] == current`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    current: Option<PathBuf>,
    siblings: Vec<PathBuf>,
    index: Option<usize>,
}

impl Session {
    pub fn current(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    pub fn siblings(&self) -> &[PathBuf] {
        &self.siblings
    }

    /// `None` when the current path is not among its siblings.
    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

/// What the caller has to present after an operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Another operation was in flight; the request was ignored.
    Dropped,
    /// Nothing to do: empty list, no image, boundary folder, cancelled prompt.
    Unchanged,
    /// Rebuild the view for this image.
    Show(PathBuf),
    /// The last image of the directory is gone; close the view.
    Close,
    /// Informational, no navigation happened.
    Notice(String),
    /// This URI is now on the clipboard.
    Copied(String),
}

/// Clears the busy phase when the operation ends, whichever way it ends.
pub(crate) struct InFlight<'a> {
    phase: &'a Mutex<Phase>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner) = Phase::Idle;
    }
}

pub struct Navigator<F> {
    fs: F,
    session: Mutex<Session>,
    phase: Mutex<Phase>,
}

impl<F: FileSystem> Navigator<F> {
    pub fn new(fs: F) -> Self {
        Navigator {
            fs,
            session: Mutex::new(Session::default()),
            phase: Mutex::new(Phase::Idle),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Session {
        self.state().clone()
    }

    pub fn phase(&self) -> Phase {
        *self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase(), Phase::Busy(_))
    }

    fn state(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, op: Op) -> Option<InFlight<'_>> {
        let mut phase = self.phase.lock().unwrap_or_else(PoisonError::into_inner);
        match *phase {
            Phase::Busy(running) => {
                debug!(?op, ?running, "request dropped: busy");
                None
            }
            Phase::Idle => {
                *phase = Phase::Busy(op);
                Some(InFlight { phase: &self.phase })
            }
        }
    }

    /// Occupy the busy slot from a test, as an in-flight operation would.
    #[cfg(test)]
    pub(crate) fn hold(&self, op: Op) -> Option<InFlight<'_>> {
        self.begin(op)
    }

    // ── open ────────────────────────────────────────────────────────────

    /// Show `path` and re-list the images beside it.
    pub fn open(&self, path: &Path) -> NavResult<Outcome> {
        let Some(_slot) = self.begin(Op::Open) else {
            return Ok(Outcome::Dropped);
        };
        self.load(path)
    }

    fn load(&self, path: &Path) -> NavResult<Outcome> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let siblings = scanner::list_images(&self.fs, dir)?;
        let index = siblings
            .iter()
            .position(|p| p.file_name() == path.file_name());
        let current = match index {
            Some(i) => siblings[i].clone(),
            None => path.to_path_buf(),
        };
        info!(
            path = %current.display(),
            count = siblings.len(),
            ?index,
            "opened"
        );

        let mut state = self.state();
        state.current = Some(current.clone());
        state.siblings = siblings;
        state.index = index;
        Ok(Outcome::Show(current))
    }

    // ── next / prev ─────────────────────────────────────────────────────

    pub fn next(&self) -> Outcome {
        self.step(Op::Next, Direction::Forward)
    }

    pub fn prev(&self) -> Outcome {
        self.step(Op::Prev, Direction::Backward)
    }

    /// Move within the cached sibling list, wrapping at both ends. No
    /// filesystem access.
    fn step(&self, op: Op, dir: Direction) -> Outcome {
        let Some(_slot) = self.begin(op) else {
            return Outcome::Dropped;
        };
        let mut state = self.state();
        let n = state.siblings.len();
        if n == 0 {
            return Outcome::Unchanged;
        }
        let next = match (dir, state.index) {
            (Direction::Forward, Some(i)) => (i + 1) % n,
            (Direction::Forward, None) => 0,
            (Direction::Backward, Some(0)) | (Direction::Backward, None) => n - 1,
            (Direction::Backward, Some(i)) => i - 1,
        };
        let path = state.siblings[next].clone();
        state.index = Some(next);
        state.current = Some(path.clone());
        debug!(index = next, of = n, "step");
        Outcome::Show(path)
    }

    // ── folders ─────────────────────────────────────────────────────────

    pub fn next_folder(&self) -> NavResult<Outcome> {
        self.jump_folder(Op::NextFolder, Direction::Forward)
    }

    pub fn prev_folder(&self) -> NavResult<Outcome> {
        self.jump_folder(Op::PrevFolder, Direction::Backward)
    }

    /// Open the first image of the neighboring folder. The first and last
    /// folders have no neighbor beyond them; that is a silent no-op.
    fn jump_folder(&self, op: Op, dir: Direction) -> NavResult<Outcome> {
        let Some(_slot) = self.begin(op) else {
            return Ok(Outcome::Dropped);
        };
        let Some(current) = self.state().current.clone() else {
            return Ok(Outcome::Unchanged);
        };
        let Some(folder) = current.parent() else {
            return Ok(Outcome::Unchanged);
        };
        let Some(parent) = folder.parent() else {
            return Ok(Outcome::Unchanged);
        };
        // A relative folder with a single component lives in ".", and
        // listing "." yields "./name" entries.
        let (parent, folder) = if parent.as_os_str().is_empty() {
            (Path::new("."), Path::new(".").join(folder))
        } else {
            (parent, folder.to_path_buf())
        };

        let folders = scanner::list_dirs(&self.fs, parent)?;
        let Some(target) = scanner::neighbor(&folders, &folder, dir) else {
            debug!(folder = %folder.display(), ?dir, "no neighbor folder");
            return Ok(Outcome::Unchanged);
        };

        match scanner::first_image_in(&self.fs, target)? {
            Some(first) => self.load(&first),
            None => Ok(Outcome::Notice(format!(
                "No images in {}",
                target.display()
            ))),
        }
    }

    // ── delete ──────────────────────────────────────────────────────────

    /// Delete the current image after `confirm` agrees.
    ///
    /// The sibling list is edited in place, not re-listed. If the current
    /// image changed while the prompt was open nothing is deleted.
    pub fn delete(&self, confirm: impl FnOnce(&Path) -> bool) -> NavResult<Outcome> {
        if self.is_busy() {
            debug!("delete dropped: busy");
            return Ok(Outcome::Dropped);
        }
        let Some(target) = self.state().current.clone() else {
            return Ok(Outcome::Unchanged);
        };
        if !confirm(&target) {
            debug!(path = %target.display(), "delete cancelled");
            return Ok(Outcome::Unchanged);
        }

        let Some(_slot) = self.begin(Op::Delete) else {
            return Ok(Outcome::Dropped);
        };
        if self.state().current.as_deref() != Some(target.as_path()) {
            warn!(path = %target.display(), "current image changed during confirmation, not deleting");
            return Ok(Outcome::Unchanged);
        }

        self.fs.remove_file(&target).map_err(|source| NavError::Delete {
            path: target.clone(),
            source,
        })?;
        info!(path = %target.display(), "deleted");

        let mut state = self.state();
        let at = match state.index {
            Some(i) if state.siblings.get(i) == Some(&target) => Some(i),
            _ => state.siblings.iter().position(|p| p == &target),
        };
        if let Some(i) = at {
            state.siblings.remove(i);
        }

        if state.siblings.is_empty() {
            state.current = None;
            state.index = None;
            return Ok(Outcome::Close);
        }
        let idx = at
            .or(state.index)
            .unwrap_or(0)
            .min(state.siblings.len() - 1);
        let path = state.siblings[idx].clone();
        state.index = Some(idx);
        state.current = Some(path.clone());
        Ok(Outcome::Show(path))
    }

    // ── copy ────────────────────────────────────────────────────────────

    /// Hand the current image's `file://` URI to `write`. Not gated.
    pub fn copy_path(
        &self,
        write: impl FnOnce(&str) -> Result<(), String>,
    ) -> NavResult<Outcome> {
        let Some(current) = self.state().current.clone() else {
            return Ok(Outcome::Unchanged);
        };
        let uri = file_uri(&current);
        write(&uri).map_err(NavError::Clipboard)?;
        Ok(Outcome::Copied(uri))
    }
}
