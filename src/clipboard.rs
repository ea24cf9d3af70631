//! System clipboard (OS-level text copy via arboard).

/// Put `text` on the system clipboard.
pub fn copy_text(text: &str) -> Result<(), String> {
    let mut clip = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clip.set_text(text.to_owned()).map_err(|e| e.to_string())
}
