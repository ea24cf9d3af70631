//! View side: the render payload, local pan/zoom/rotate state, and the key map.
//!
//! The transform is purely local to a view and never reported back to the
//! navigator. Every navigation replaces the whole [`ViewModel`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::config::ZoomConfig;
use crate::media::guess_mime;
use crate::protocol::{resource_uri, Command};
use crate::session::Session;

/// Share of the container the fitted image may occupy.
const FIT_MARGIN: f64 = 0.98;

/// Everything a view needs to draw one image from scratch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub path: PathBuf,
    pub file_name: String,
    pub resource_uri: String,
    pub mime: &'static str,
    /// 1-based position among the siblings.
    pub position: Option<usize>,
    pub total: usize,
    /// Natural size from the image header; `None` if it can't be read (SVG, broken file).
    pub dimensions: Option<(u32, u32)>,
    pub zoom: ZoomConfig,
}

impl ViewModel {
    pub fn build(session: &Session, path: &Path, zoom: ZoomConfig) -> Self {
        let position = session
            .siblings()
            .iter()
            .position(|p| p == path)
            .map(|i| i + 1);
        ViewModel {
            path: path.to_path_buf(),
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            resource_uri: resource_uri(path),
            mime: guess_mime(path),
            position,
            total: session.siblings().len(),
            dimensions: image::image_dimensions(path).ok(),
            zoom,
        }
    }
}

// ── fit / transform ─────────────────────────────────────────────────────

/// Zoom that fits `natural` inside the container minus `reserved` height.
///
/// Degenerate sizes (zero image or no room left) fall back to 1.0.
pub fn fit_scale(natural: (u32, u32), container: (f64, f64), reserved: f64) -> f64 {
    let (iw, ih) = (natural.0 as f64, natural.1 as f64);
    let cw = container.0;
    let ch = container.1 - reserved;
    if iw <= 0.0 || ih <= 0.0 || cw <= 0.0 || ch <= 0.0 {
        return 1.0;
    }
    (cw * FIT_MARGIN / iw).min(ch * FIT_MARGIN / ih)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: f64,
    pub pan_x: f64,
    pub pan_y: f64,
    /// Degrees, always one of 0, 90, 180, 270.
    pub rotation: u16,
}

impl Transform {
    pub fn fitted(fit: f64) -> Self {
        Transform {
            scale: fit,
            pan_x: 0.0,
            pan_y: 0.0,
            rotation: 0,
        }
    }

    pub fn drag(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Negative `delta_y` (wheel up) zooms in by one step.
    pub fn wheel(&mut self, delta_y: f64, zoom: &ZoomConfig) {
        let next = if delta_y < 0.0 {
            self.scale + zoom.step
        } else if delta_y > 0.0 {
            self.scale - zoom.step
        } else {
            return;
        };
        self.scale = next.clamp(zoom.min, zoom.max);
    }

    pub fn rotate(&mut self) {
        self.rotation = (self.rotation + 90) % 360;
    }

    pub fn reset(&mut self, fit: f64) {
        *self = Transform::fitted(fit);
    }

    /// CSS `transform` value.
    pub fn css(&self) -> String {
        format!(
            "translate({:.1}px, {:.1}px) scale({:.3}) rotate({}deg)",
            self.pan_x, self.pan_y, self.scale, self.rotation
        )
    }
}

// ── key map ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Delete,
    Char(char),
}

/// A key with or without the command modifier (Ctrl, or Cmd on macOS).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    pub modifier: bool,
    pub key: Key,
}

#[derive(Debug, Error, PartialEq)]
#[error("unknown key chord: {0}")]
pub struct ChordError(String);

impl FromStr for Chord {
    type Err = ChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let (modifier, key) = match lower
            .strip_prefix("ctrl+")
            .or_else(|| lower.strip_prefix("cmd+"))
        {
            Some(rest) => (true, rest),
            None => (false, lower.as_str()),
        };
        let key = match key {
            "left" => Key::Left,
            "right" => Key::Right,
            "up" => Key::Up,
            "down" => Key::Down,
            "delete" | "del" => Key::Delete,
            k if k.chars().count() == 1 => Key::Char(k.chars().next().unwrap_or_default()),
            _ => return Err(ChordError(s.to_string())),
        };
        Ok(Chord { modifier, key })
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier {
            write!(f, "ctrl+")?;
        }
        match self.key {
            Key::Left => write!(f, "left"),
            Key::Right => write!(f, "right"),
            Key::Up => write!(f, "up"),
            Key::Down => write!(f, "down"),
            Key::Delete => write!(f, "delete"),
            Key::Char(c) => write!(f, "{}", c),
        }
    }
}

pub fn command_for(chord: Chord) -> Option<Command> {
    match (chord.modifier, chord.key) {
        (false, Key::Right) => Some(Command::NextImage),
        (false, Key::Left) => Some(Command::PrevImage),
        (false, Key::Delete) => Some(Command::DeleteImage),
        (true, Key::Char('c')) => Some(Command::CopyImage),
        (true, Key::Char('r')) => Some(Command::RotateImage),
        (true, Key::Char('0')) => Some(Command::ResetZoom),
        (true, Key::Down) => Some(Command::NextFolder),
        (true, Key::Up) => Some(Command::PrevFolder),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoom() -> ZoomConfig {
        ZoomConfig::default()
    }

    // ── fit_scale ───────────────────────────────────────────────────────

    #[test]
    fn fit_limited_by_width() {
        // 2000x500 into 1000x800 (40 reserved): width bound 0.49, height bound 1.4896
        let s = fit_scale((2000, 500), (1000.0, 800.0), 40.0);
        assert!((s - 0.49).abs() < 1e-9);
    }

    #[test]
    fn fit_limited_by_height() {
        let s = fit_scale((100, 1000), (1000.0, 540.0), 40.0);
        assert!((s - 0.49).abs() < 1e-9);
    }

    #[test]
    fn fit_upscales_small_images() {
        let s = fit_scale((10, 10), (100.0, 100.0), 0.0);
        assert!((s - 9.8).abs() < 1e-9);
    }

    #[test]
    fn fit_degenerate_is_one() {
        assert_eq!(fit_scale((0, 10), (100.0, 100.0), 0.0), 1.0);
        assert_eq!(fit_scale((10, 10), (100.0, 30.0), 40.0), 1.0);
    }

    // ── transform ───────────────────────────────────────────────────────

    #[test]
    fn wheel_steps_and_clamps() {
        let z = zoom();
        let mut t = Transform::fitted(1.0);
        t.wheel(-1.0, &z);
        assert!((t.scale - 1.1).abs() < 1e-9);
        t.wheel(1.0, &z);
        t.wheel(1.0, &z);
        assert!((t.scale - 0.9).abs() < 1e-9);

        for _ in 0..200 {
            t.wheel(1.0, &z);
        }
        assert_eq!(t.scale, z.min);
        for _ in 0..200 {
            t.wheel(-1.0, &z);
        }
        assert_eq!(t.scale, z.max);
    }

    #[test]
    fn wheel_zero_delta_ignored() {
        let mut t = Transform::fitted(0.5);
        t.wheel(0.0, &zoom());
        assert_eq!(t.scale, 0.5);
    }

    #[test]
    fn rotate_cycles() {
        let mut t = Transform::fitted(1.0);
        let seen: Vec<u16> = (0..5)
            .map(|_| {
                t.rotate();
                t.rotation
            })
            .collect();
        assert_eq!(seen, vec![90, 180, 270, 0, 90]);
    }

    #[test]
    fn reset_clears_pan_and_rotation() {
        let mut t = Transform::fitted(1.0);
        t.drag(15.0, -4.0);
        t.rotate();
        t.wheel(-1.0, &zoom());
        t.reset(0.25);
        assert_eq!(t, Transform::fitted(0.25));
        assert_eq!(t.css(), "translate(0.0px, 0.0px) scale(0.250) rotate(0deg)");
    }

    // ── key map ─────────────────────────────────────────────────────────

    #[test]
    fn chords_map_to_commands() {
        let cases = [
            ("right", Command::NextImage),
            ("left", Command::PrevImage),
            ("delete", Command::DeleteImage),
            ("ctrl+c", Command::CopyImage),
            ("Ctrl+R", Command::RotateImage),
            ("ctrl+0", Command::ResetZoom),
            ("ctrl+down", Command::NextFolder),
            ("cmd+up", Command::PrevFolder),
        ];
        for (s, cmd) in cases {
            let chord: Chord = s.parse().unwrap();
            assert_eq!(command_for(chord), Some(cmd), "{}", s);
        }
    }

    #[test]
    fn unbound_and_invalid_chords() {
        assert_eq!(command_for("c".parse().unwrap()), None);
        assert_eq!(command_for("ctrl+right".parse().unwrap()), None);
        assert!("ctrl+pageup".parse::<Chord>().is_err());
    }

    #[test]
    fn chord_display_roundtrips() {
        for s in ["ctrl+down", "left", "ctrl+c"] {
            assert_eq!(s.parse::<Chord>().unwrap().to_string(), s);
        }
    }

    // ── view model ──────────────────────────────────────────────────────

    #[test]
    fn model_for_unreadable_image() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.svg"), b"<svg/>").unwrap();
        let nav = crate::session::Navigator::new(crate::fs::DiskFs);
        nav.open(&dir.path().join("a.svg")).unwrap();

        let m = ViewModel::build(&nav.snapshot(), &dir.path().join("a.svg"), zoom());
        assert_eq!(m.file_name, "a.svg");
        assert_eq!(m.mime, "image/svg+xml");
        assert_eq!(m.position, Some(1));
        assert_eq!(m.total, 1);
        assert_eq!(m.dimensions, None);
    }

    #[test]
    fn model_reads_real_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        image::RgbImage::new(3, 2).save(&path).unwrap();
        let nav = crate::session::Navigator::new(crate::fs::DiskFs);
        nav.open(&path).unwrap();

        let m = ViewModel::build(&nav.snapshot(), &path, zoom());
        assert_eq!(m.dimensions, Some((3, 2)));
    }
}
