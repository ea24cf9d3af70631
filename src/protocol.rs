//! Messages between the view and the navigator, plus the URI forms used for
//! image resources and the clipboard.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::registry::ViewId;
use crate::view::ViewModel;

/// URI scheme the view loads image bytes from.
pub const RESOURCE_SCHEME: &str = "imgnav-file";

/// Everything the view can ask for. Closed set, dispatched exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    NextImage,
    PrevImage,
    NextFolder,
    PrevFolder,
    DeleteImage,
    CopyImage,
    RotateImage,
    ResetZoom,
}

/// Pushed from the navigator to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Notification {
    Rotate,
    ResetZoom,
    OperationComplete,
}

/// One JSON line read by the bridge.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Inbound {
    Open {
        path: PathBuf,
    },
    Close {
        view: ViewId,
    },
    Focus {
        view: ViewId,
    },
    /// A view posted a command tag. Without `view` the active view is meant.
    #[serde(rename = "command")]
    Invoke {
        #[serde(default)]
        view: Option<ViewId>,
        command: Command,
    },
    /// A host command id such as `imgnav.next`, run on the active view.
    Execute {
        id: String,
    },
    Confirm {
        answer: bool,
    },
}

/// One JSON line written by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outbound {
    Opened { view: ViewId },
    Render { view: ViewId, model: ViewModel },
    Close { view: ViewId },
    Notify { view: ViewId, notification: Notification },
    Info { message: String },
    Error { message: String },
    Confirm { view: ViewId, path: PathBuf },
}

/// `imgnav-file://localhost/<encoded path>`
pub fn resource_uri(path: &Path) -> String {
    format!(
        "{}://localhost/{}",
        RESOURCE_SCHEME,
        urlencoding::encode(&path.to_string_lossy())
    )
}

/// `file://` URI with each path segment percent-encoded.
pub fn file_uri(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let encoded: Vec<String> = raw
        .split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect();
    let joined = encoded.join("/");
    if joined.starts_with('/') {
        format!("file://{}", joined)
    } else {
        format!("file:///{}", joined)
    }
}
