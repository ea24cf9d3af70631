//! Interactive terminal host: one key chord or command per input line.
//!
//! The terminal plays the view. It keeps each view's pan/zoom/rotate locally
//! and prints a fresh description of the image on every render.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::clipboard;
use crate::config::{Config, ViewConfig, ZoomConfig};
use crate::fs::FileSystem;
use crate::host::Host;
use crate::protocol::Notification;
use crate::registry::{Registry, ViewId};
use crate::view::{command_for, fit_scale, Chord, Transform, ViewModel};

const HELP: &str = "\
keys:     right left delete ctrl+c ctrl+r ctrl+0 ctrl+down ctrl+up
view:     wheel up|down, drag DX DY
session:  open PATH, close, views, view N, help, quit";

/// Local state of one terminal view.
#[derive(Debug, Clone, Copy)]
struct Pane {
    fit: f64,
    transform: Transform,
}

pub struct Terminal<R, W> {
    input: Mutex<R>,
    out: Mutex<W>,
    view: ViewConfig,
    zoom: ZoomConfig,
    panes: Mutex<HashMap<ViewId, Pane>>,
    clipboard: fn(&str) -> Result<(), String>,
}

enum Flow {
    Continue,
    Quit,
}

impl<R: BufRead + Send, W: Write + Send> Terminal<R, W> {
    pub fn new(input: R, out: W, config: &Config) -> Self {
        Terminal {
            input: Mutex::new(input),
            out: Mutex::new(out),
            view: config.view,
            zoom: config.zoom,
            panes: Mutex::new(HashMap::new()),
            clipboard: clipboard::copy_text,
        }
    }

    #[cfg(test)]
    fn with_clipboard(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.clipboard = f;
        self
    }

    fn out(&self) -> MutexGuard<'_, W> {
        self.out.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn panes(&self) -> MutexGuard<'_, HashMap<ViewId, Pane>> {
        self.panes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .input
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read_line(&mut line)?;
        Ok((n > 0).then_some(line))
    }

    fn say(&self, text: &str) {
        let mut out = self.out();
        writeln!(out, "{}", text).ok();
        out.flush().ok();
    }

    /// Read and handle lines until `quit`, end of input, or the last view closes.
    pub fn run<F: FileSystem + Clone>(&self, registry: &Registry<F>) -> io::Result<()> {
        while !registry.is_empty() {
            let Some(line) = self.read_line()? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Flow::Quit = self.handle(line, registry) {
                break;
            }
        }
        Ok(())
    }

    fn handle<F: FileSystem + Clone>(&self, line: &str, registry: &Registry<F>) -> Flow {
        let mut words = line.split_whitespace();
        let head = words.next().unwrap_or_default();
        let rest: Vec<&str> = words.collect();

        match (head, rest.as_slice()) {
            ("q" | "quit" | "exit", []) => return Flow::Quit,
            ("help" | "?", []) => self.say(HELP),
            ("views", []) => {
                let active = registry.active();
                for (id, path) in registry.list() {
                    let mark = if Some(id) == active { "*" } else { " " };
                    let shown = path
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "-".into());
                    self.say(&format!("{}{} {}", mark, id, shown));
                }
            }
            ("view", [n]) => match n.parse::<u32>() {
                Ok(n) if registry.focus(ViewId(n)) => self.say(&format!("active {}", ViewId(n))),
                _ => self.error(&format!("no view {}", n)),
            },
            ("open", [..]) if !rest.is_empty() => {
                registry.open(Path::new(&rest.join(" ")), self);
            }
            ("close", []) => {
                if let Some(view) = registry.active() {
                    registry.close(view);
                    self.close(view);
                }
            }
            ("wheel", [dir @ ("up" | "down")]) => {
                let delta = if *dir == "up" { -1.0 } else { 1.0 };
                self.adjust(registry.active(), |t, zoom| t.wheel(delta, zoom));
            }
            ("drag", [dx, dy]) => match (dx.parse::<f64>(), dy.parse::<f64>()) {
                (Ok(dx), Ok(dy)) => self.adjust(registry.active(), |t, _| t.drag(dx, dy)),
                _ => self.error("drag takes two numbers"),
            },
            _ => match line.parse::<Chord>().ok().and_then(command_for) {
                Some(command) => {
                    if !registry.dispatch(None, command, self) {
                        self.error("no active view");
                    }
                }
                None => self.error(&format!("unknown input: {} (try help)", line)),
            },
        }
        Flow::Continue
    }

    fn adjust(&self, view: Option<ViewId>, f: impl FnOnce(&mut Transform, &ZoomConfig)) {
        let Some(view) = view else {
            return;
        };
        let mut panes = self.panes();
        if let Some(pane) = panes.get_mut(&view) {
            f(&mut pane.transform, &self.zoom);
            let line = format!("{} {}", view, pane.transform.css());
            drop(panes);
            self.say(&line);
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> Host for Terminal<R, W> {
    fn render(&self, view: ViewId, model: ViewModel) {
        let fit = model
            .dimensions
            .map(|dims| {
                fit_scale(
                    dims,
                    (self.view.container_width, self.view.container_height),
                    self.view.reserved_height,
                )
            })
            .unwrap_or(1.0);
        let transform = Transform::fitted(fit);
        self.panes().insert(view, Pane { fit, transform });

        let position = model
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".into());
        let size = model
            .dimensions
            .map(|(w, h)| format!("{}x{}", w, h))
            .unwrap_or_else(|| "?x?".into());
        self.say(&format!(
            "{} [{}/{}] {}  {}  fit {:.3}\n    {}",
            view, position, model.total, model.file_name, size, fit, model.resource_uri
        ));
    }

    fn close(&self, view: ViewId) {
        self.panes().remove(&view);
        self.say(&format!("{} closed", view));
    }

    fn info(&self, message: &str) {
        self.say(&format!("info: {}", message));
    }

    fn error(&self, message: &str) {
        self.say(&format!("error: {}", message));
    }

    fn post(&self, view: ViewId, notification: Notification) {
        match notification {
            Notification::Rotate => {
                self.adjust(Some(view), |t, _| t.rotate());
            }
            Notification::ResetZoom => {
                let fit = self.panes().get(&view).map(|p| p.fit);
                if let Some(fit) = fit {
                    self.adjust(Some(view), |t, _| t.reset(fit));
                }
            }
            Notification::OperationComplete => debug!(%view, "operation complete"),
        }
    }

    fn confirm_delete(&self, _view: ViewId, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        {
            let mut out = self.out();
            write!(out, "Delete {}? [y/N] ", name).ok();
            out.flush().ok();
        }
        match self.read_line() {
            Ok(Some(answer)) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
            _ => false,
        }
    }

    fn write_clipboard(&self, text: &str) -> Result<(), String> {
        (self.clipboard)(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::DiskFs;
    use std::io::Cursor;

    fn session(input: &str, names: &[&str]) -> (String, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"fake").unwrap();
        }
        let config = Config::default();
        let term = Terminal::new(Cursor::new(input.to_string()), Vec::new(), &config)
            .with_clipboard(|_| Ok(()));
        let reg = Registry::new(DiskFs, config.zoom);
        reg.open(&dir.path().join(names[0]), &term).unwrap();
        term.run(&reg).unwrap();
        let out = String::from_utf8(term.out.into_inner().unwrap()).unwrap();
        (out, dir)
    }

    #[test]
    fn renders_on_open_and_navigation() {
        let (out, _dir) = session("right\nright\nquit\n", &["a.png", "b.png", "c.png"]);
        let lines: Vec<&str> = out.lines().filter(|l| l.starts_with('#')).collect();
        assert!(lines[0].contains("[1/3] a.png"));
        assert!(lines[1].contains("[2/3] b.png"));
        assert!(lines[2].contains("[3/3] c.png"));
    }

    #[test]
    fn delete_prompt_declined_then_accepted() {
        let (out, dir) = session("delete\nn\ndelete\ny\nquit\n", &["a.png", "b.png"]);
        assert_eq!(out.matches("Delete a.png? [y/N]").count(), 2);
        assert!(out.contains("[1/1] b.png"));
        assert!(!dir.path().join("a.png").exists());
    }

    #[test]
    fn deleting_last_image_ends_session() {
        let (out, dir) = session("delete\nyes\nright\n", &["only.png"]);
        assert!(out.contains("#1 closed"));
        assert!(!out.contains("unknown input"));
        assert!(!dir.path().join("only.png").exists());
    }

    #[test]
    fn local_transform_commands() {
        let (out, _dir) = session("ctrl+r\nwheel up\ndrag 5 -3\nctrl+0\nq\n", &["a.png"]);
        // Unreadable dimensions fit at 1.0.
        assert!(out.contains("scale(1.000) rotate(90deg)"));
        assert!(out.contains("scale(1.100) rotate(90deg)"));
        assert!(out.contains("translate(5.0px, -3.0px) scale(1.100)"));
        assert!(out.contains("translate(0.0px, 0.0px) scale(1.000) rotate(0deg)"));
    }

    #[test]
    fn copy_and_bad_input() {
        let (out, _dir) = session("ctrl+c\nctrl+x\nview 9\n", &["a.png"]);
        assert!(out.contains("info: Copied file://"));
        assert!(out.contains("error: unknown input: ctrl+x"));
        assert!(out.contains("error: no view 9"));
    }

    #[test]
    fn views_lists_active() {
        let (out, _dir) = session("views\nq\n", &["a.png"]);
        assert!(out.lines().any(|l| l.starts_with("*#1 ") && l.ends_with("a.png")));
    }
}
