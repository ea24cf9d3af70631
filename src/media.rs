//! Image classification by file name suffix. File contents are never inspected.

use std::path::Path;

/// Recognized image extensions, lowercase.
pub const IMAGE_EXTS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "svg", "ico"];

/// Lowercased extension of `path`, empty when there is none.
pub fn ext_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// True if the name ends in one of [`IMAGE_EXTS`] (case-insensitive).
pub fn is_image_file(path: impl AsRef<Path>) -> bool {
    IMAGE_EXTS.contains(&ext_of(path.as_ref()).as_str())
}

pub fn guess_mime(path: &Path) -> &'static str {
    match ext_of(path).as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── is_image_file ───────────────────────────────────────────────────

    #[test]
    fn recognized_extensions() {
        for name in &[
            "a.png", "a.jpg", "a.jpeg", "a.gif", "a.bmp", "a.webp", "a.svg", "a.ico",
        ] {
            assert!(is_image_file(name), "{} should be an image", name);
        }
    }

    #[test]
    fn case_insensitive() {
        assert!(is_image_file("Photo.JPG"));
        assert!(is_image_file("icon.ICO"));
        assert!(is_image_file("Mixed.WebP"));
    }

    #[test]
    fn rejected_names() {
        for name in &["notes.txt", "clip.mp4", "photo.tiff", "png", "archive.png.zip", ""] {
            assert!(!is_image_file(name), "{} should NOT be an image", name);
        }
    }

    #[test]
    fn full_paths_use_file_name_only() {
        assert!(is_image_file("/some.dir/with.dots/pic.gif"));
        assert!(!is_image_file("/photos.png/readme"));
    }

    // ── guess_mime ──────────────────────────────────────────────────────

    #[test]
    fn mime_for_known_types() {
        assert_eq!(guess_mime(Path::new("x.JPEG")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("x.svg")), "image/svg+xml");
        assert_eq!(guess_mime(Path::new("x.ico")), "image/x-icon");
        assert_eq!(guess_mime(Path::new("x.bin")), "application/octet-stream");
    }
}
