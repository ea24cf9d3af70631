//! JSON-lines host for an external webview.
//!
//! Reads [`Inbound`] messages from stdin and writes [`Outbound`] messages to
//! stdout, one JSON object per line. View commands run on their own threads,
//! so a request that arrives while its session is busy gets dropped by the
//! session guard. A delete blocks its thread until a `confirm` message
//! arrives, or until input ends (which answers "no").

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use tracing::{debug, warn};

use crate::clipboard;
use crate::fs::FileSystem;
use crate::host::Host;
use crate::protocol::{Command, Inbound, Notification, Outbound};
use crate::registry::{command_by_id, Registry, ViewId};
use crate::view::ViewModel;

#[derive(Default)]
struct Pending {
    /// The view whose delete is waiting, and where its answer goes.
    answer: Option<(ViewId, mpsc::Sender<bool>)>,
    closed: bool,
}

pub struct Bridge<W> {
    out: Mutex<W>,
    pending: Mutex<Pending>,
    clipboard: fn(&str) -> Result<(), String>,
}

impl<W: Write + Send + 'static> Bridge<W> {
    pub fn new(out: W) -> Self {
        Bridge {
            out: Mutex::new(out),
            pending: Mutex::new(Pending::default()),
            clipboard: clipboard::copy_text,
        }
    }

    #[cfg(test)]
    fn with_clipboard(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.clipboard = f;
        self
    }

    fn pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, msg: &Outbound) {
        let line = match serde_json::to_string(msg) {
            Ok(line) => line,
            Err(e) => {
                warn!("cannot encode message: {}", e);
                return;
            }
        };
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{}", line).ok();
        out.flush().ok();
    }

    /// Serve `input` until it ends, then wait for running commands.
    pub fn run<F, R>(self: &Arc<Self>, registry: &Arc<Registry<F>>, input: R) -> io::Result<()>
    where
        F: FileSystem + Clone + 'static,
        R: BufRead,
    {
        let mut workers = Vec::new();
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Inbound>(line) {
                Ok(msg) => self.handle(msg, registry, &mut workers),
                Err(e) => self.error(&format!("bad message: {}", e)),
            }
            workers.retain(|w: &JoinHandle<()>| !w.is_finished());
        }
        self.finish(workers);
        Ok(())
    }

    fn handle<F>(
        self: &Arc<Self>,
        msg: Inbound,
        registry: &Arc<Registry<F>>,
        workers: &mut Vec<JoinHandle<()>>,
    ) where
        F: FileSystem + Clone + 'static,
    {
        debug!(?msg, "inbound");
        match msg {
            Inbound::Open { path } => {
                registry.open(&path, &**self);
            }
            Inbound::Close { view } => {
                self.decline(view);
                if registry.close(view) {
                    self.send(&Outbound::Close { view });
                } else {
                    self.error(&format!("no view {}", view));
                }
            }
            Inbound::Focus { view } => {
                if !registry.focus(view) {
                    self.error(&format!("no view {}", view));
                }
            }
            Inbound::Invoke { view, command } => {
                workers.push(self.spawn(registry, view, command));
            }
            Inbound::Execute { id } => match command_by_id(&id) {
                Some(command) => workers.push(self.spawn(registry, None, command)),
                None => self.error(&format!("Unknown command: {}", id)),
            },
            Inbound::Confirm { answer } => match self.pending().answer.take() {
                Some((_, tx)) => {
                    tx.send(answer).ok();
                }
                None => warn!("confirmation without a pending delete"),
            },
        }
    }

    fn spawn<F>(
        self: &Arc<Self>,
        registry: &Arc<Registry<F>>,
        view: Option<ViewId>,
        command: Command,
    ) -> JoinHandle<()>
    where
        F: FileSystem + Clone + 'static,
    {
        let view = view.or_else(|| registry.active());
        let bridge = Arc::clone(self);
        let registry = Arc::clone(registry);
        std::thread::spawn(move || {
            if !registry.dispatch(view, command, &*bridge) {
                bridge.error("no such view");
            }
        })
    }

    /// Answer "no" to a prompt that belongs to `view`.
    fn decline(&self, view: ViewId) {
        let mut pending = self.pending();
        if matches!(pending.answer, Some((v, _)) if v == view) {
            if let Some((_, tx)) = pending.answer.take() {
                tx.send(false).ok();
            }
        }
    }

    /// Answer "no" to any open or future prompt, then wait for workers.
    fn finish(&self, workers: Vec<JoinHandle<()>>) {
        {
            let mut pending = self.pending();
            pending.closed = true;
            pending.answer = None;
        }
        for w in workers {
            w.join().ok();
        }
    }
}

impl<W: Write + Send + 'static> Host for Bridge<W> {
    fn opened(&self, view: ViewId) {
        self.send(&Outbound::Opened { view });
    }

    fn render(&self, view: ViewId, model: ViewModel) {
        self.send(&Outbound::Render { view, model });
    }

    fn close(&self, view: ViewId) {
        self.send(&Outbound::Close { view });
    }

    fn info(&self, message: &str) {
        self.send(&Outbound::Info {
            message: message.to_string(),
        });
    }

    fn error(&self, message: &str) {
        self.send(&Outbound::Error {
            message: message.to_string(),
        });
    }

    fn post(&self, view: ViewId, notification: Notification) {
        self.send(&Outbound::Notify { view, notification });
    }

    fn confirm_delete(&self, view: ViewId, path: &Path) -> bool {
        let (tx, rx) = mpsc::channel();
        {
            let mut pending = self.pending();
            if pending.closed {
                return false;
            }
            // A newer prompt replaces an unanswered one, which then reads as "no".
            pending.answer = Some((view, tx));
        }
        self.send(&Outbound::Confirm {
            view,
            path: path.to_path_buf(),
        });
        rx.recv().unwrap_or(false)
    }

    fn write_clipboard(&self, text: &str) -> Result<(), String> {
        (self.clipboard)(text)
    }
}
