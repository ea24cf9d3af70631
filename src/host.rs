//! Presentation seam. Navigator operations return outcomes or errors; this
//! module turns them into renders, notices and notifications on a [`Host`].

use std::path::Path;

use tracing::warn;

use crate::config::ZoomConfig;
use crate::error::NavResult;
use crate::fs::FileSystem;
use crate::protocol::{Command, Notification};
use crate::registry::ViewId;
use crate::session::{Navigator, Outcome};
use crate::view::ViewModel;

/// What the embedding application provides to each view.
pub trait Host: Send + Sync {
    /// A view was created for a freshly opened image.
    fn opened(&self, _view: ViewId) {}

    /// Replace the whole view.
    fn render(&self, view: ViewId, model: ViewModel);

    fn close(&self, view: ViewId);

    fn info(&self, message: &str);

    fn error(&self, message: &str);

    fn post(&self, view: ViewId, notification: Notification);

    /// Yes/no prompt; anything but an explicit yes is a no.
    fn confirm_delete(&self, view: ViewId, path: &Path) -> bool;

    fn write_clipboard(&self, text: &str) -> Result<(), String>;
}

/// Whether the view survived the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    Kept,
    Closed,
}

/// Run one view command against its navigator and present the result.
pub fn dispatch<F: FileSystem>(
    view: ViewId,
    nav: &Navigator<F>,
    host: &dyn Host,
    zoom: ZoomConfig,
    command: Command,
) -> Dispatched {
    let result = match command {
        Command::NextImage => Ok(nav.next()),
        Command::PrevImage => Ok(nav.prev()),
        Command::NextFolder => nav.next_folder(),
        Command::PrevFolder => nav.prev_folder(),
        Command::DeleteImage => nav.delete(|path| host.confirm_delete(view, path)),
        Command::CopyImage => nav.copy_path(|uri| host.write_clipboard(uri)),
        Command::RotateImage => {
            host.post(view, Notification::Rotate);
            return Dispatched::Kept;
        }
        Command::ResetZoom => {
            host.post(view, Notification::ResetZoom);
            return Dispatched::Kept;
        }
    };

    let ran = !matches!(result, Ok(Outcome::Dropped));
    let dispatched = present(view, nav, host, zoom, result);
    if ran && command != Command::CopyImage && dispatched == Dispatched::Kept {
        host.post(view, Notification::OperationComplete);
    }
    dispatched
}

/// Show an outcome on the host. Errors become error notices and stop here.
pub fn present<F: FileSystem>(
    view: ViewId,
    nav: &Navigator<F>,
    host: &dyn Host,
    zoom: ZoomConfig,
    result: NavResult<Outcome>,
) -> Dispatched {
    match result {
        Ok(Outcome::Dropped) | Ok(Outcome::Unchanged) => {}
        Ok(Outcome::Show(path)) => {
            host.render(view, ViewModel::build(&nav.snapshot(), &path, zoom));
        }
        Ok(Outcome::Close) => {
            host.close(view);
            return Dispatched::Closed;
        }
        Ok(Outcome::Notice(message)) => host.info(&message),
        Ok(Outcome::Copied(uri)) => host.info(&format!("Copied {}", uri)),
        Err(e) => {
            warn!(%view, "{}", e);
            host.error(&e.to_string());
        }
    }
    Dispatched::Kept
}


#[cfg(test)]
mod tests {
    use super::testing::{Event, RecordingHost};
    use super::*;
    use crate::fs::testing::BrokenStat;
    use crate::fs::DiskFs;
    use crate::session::Op;

    const V: ViewId = ViewId(1);

    fn setup(names: &[&str]) -> (Navigator<DiskFs>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"fake").unwrap();
        }
        let nav = Navigator::new(DiskFs);
        nav.open(&dir.path().join(names[0])).unwrap();
        (nav, dir)
    }

    fn run(nav: &Navigator<DiskFs>, host: &RecordingHost, cmd: Command) -> Dispatched {
        dispatch(V, nav, host, ZoomConfig::default(), cmd)
    }

    #[test]
    fn next_renders_then_completes() {
        let (nav, dir) = setup(&["a.png", "b.png"]);
        let host = RecordingHost::new(true);
        assert_eq!(run(&nav, &host, Command::NextImage), Dispatched::Kept);
        assert_eq!(
            host.take(),
            vec![
                Event::Render(V, dir.path().join("b.png")),
                Event::Post(V, Notification::OperationComplete),
            ]
        );
    }

    #[test]
    fn rotate_and_reset_only_notify() {
        let (nav, _dir) = setup(&["a.png"]);
        let host = RecordingHost::new(true);
        let before = nav.snapshot();
        run(&nav, &host, Command::RotateImage);
        run(&nav, &host, Command::ResetZoom);
        assert_eq!(
            host.take(),
            vec![
                Event::Post(V, Notification::Rotate),
                Event::Post(V, Notification::ResetZoom),
            ]
        );
        assert_eq!(nav.snapshot(), before);
    }

    #[test]
    fn dropped_request_is_silent() {
        let (nav, _dir) = setup(&["a.png", "b.png"]);
        let host = RecordingHost::new(true);
        let _slot = nav.hold(Op::NextFolder).unwrap();
        for cmd in [
            Command::NextImage,
            Command::PrevImage,
            Command::NextFolder,
            Command::PrevFolder,
            Command::DeleteImage,
        ] {
            assert_eq!(run(&nav, &host, cmd), Dispatched::Kept);
        }
        assert!(host.take().is_empty());

        // Copy is not gated.
        run(&nav, &host, Command::CopyImage);
        assert_eq!(host.take().len(), 2);
    }

    #[test]
    fn delete_confirmed_renders_next() {
        let (nav, dir) = setup(&["a.png", "b.png"]);
        let host = RecordingHost::new(true);
        run(&nav, &host, Command::DeleteImage);
        assert_eq!(
            host.take(),
            vec![
                Event::Confirm(V, dir.path().join("a.png")),
                Event::Render(V, dir.path().join("b.png")),
                Event::Post(V, Notification::OperationComplete),
            ]
        );
    }

    #[test]
    fn delete_declined_only_asks() {
        let (nav, dir) = setup(&["a.png", "b.png"]);
        let host = RecordingHost::new(false);
        run(&nav, &host, Command::DeleteImage);
        let events = host.take();
        assert_eq!(events[0], Event::Confirm(V, dir.path().join("a.png")));
        assert!(!events.iter().any(|e| matches!(e, Event::Render(..))));
        assert!(dir.path().join("a.png").exists());
    }

    #[test]
    fn delete_last_closes_view() {
        let (nav, _dir) = setup(&["a.png"]);
        let host = RecordingHost::new(true);
        assert_eq!(run(&nav, &host, Command::DeleteImage), Dispatched::Closed);
        let events = host.take();
        assert_eq!(events.last(), Some(&Event::Close(V)));
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::Post(_, Notification::OperationComplete))));
    }

    #[test]
    fn delete_failure_reports_error() {
        let (nav, dir) = setup(&["a.png", "b.png"]);
        std::fs::remove_file(dir.path().join("a.png")).unwrap();
        let host = RecordingHost::new(true);
        run(&nav, &host, Command::DeleteImage);
        let events = host.take();
        assert!(matches!(&events[1], Event::Error(msg) if msg.contains("failed to delete")));
        assert_eq!(events[2], Event::Post(V, Notification::OperationComplete));
    }

    #[test]
    fn copy_reports_success_and_failure() {
        let (nav, _dir) = setup(&["a.png"]);
        let host = RecordingHost::new(true);
        run(&nav, &host, Command::CopyImage);
        let events = host.take();
        assert!(matches!(&events[0], Event::Clipboard(uri) if uri.starts_with("file://")));
        assert!(matches!(&events[1], Event::Info(msg) if msg.starts_with("Copied file://")));
        assert_eq!(events.len(), 2);

        let mut host = RecordingHost::new(true);
        host.clipboard_ok = false;
        run(&nav, &host, Command::CopyImage);
        assert!(matches!(&host.take()[..], [Event::Error(msg)] if msg.contains("clipboard")));
    }

    #[test]
    fn folder_stat_failure_is_error_notice() {
        let root = tempfile::tempdir().unwrap();
        for d in ["a", "b"] {
            std::fs::create_dir(root.path().join(d)).unwrap();
            std::fs::write(root.path().join(d).join("1.png"), b"x").unwrap();
        }
        let nav = Navigator::new(BrokenStat);
        nav.open(&root.path().join("a/1.png")).unwrap();

        let host = RecordingHost::new(true);
        let out = dispatch(V, &nav, &host, ZoomConfig::default(), Command::NextFolder);
        assert_eq!(out, Dispatched::Kept);
        let events = host.take();
        assert!(matches!(&events[0], Event::Error(msg) if msg.starts_with("cannot stat")));
        assert_eq!(events[1], Event::Post(V, Notification::OperationComplete));
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn empty_folder_neighbor_is_info() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("a")).unwrap();
        std::fs::create_dir(root.path().join("b")).unwrap();
        std::fs::write(root.path().join("a/x.png"), b"x").unwrap();
        let nav = Navigator::new(DiskFs);
        nav.open(&root.path().join("a/x.png")).unwrap();

        let host = RecordingHost::new(true);
        run(&nav, &host, Command::NextFolder);
        let events = host.take();
        assert!(matches!(&events[0], Event::Info(msg) if msg.starts_with("No images")));
    }
}
