// touch/evdev.rs — single-finger touch reader over /dev/input/event*
//
// Raw absolute reports are folded into one TouchEvent per SYN_REPORT frame
// by `FrameDecoder`, a pure state machine. `EvdevTouch` adds the device:
// discovery, axis range queries and non-blocking reads.

use std::os::fd::{AsFd, OwnedFd};
use std::path::{Path, PathBuf};

use rustix::fs::OFlags;

use super::{Orientation, TouchEvent, TouchKind, TouchSource};
use crate::config::TouchConfig;
use crate::error::{Error, Result};
use crate::pixelui::{LOGICAL_H, LOGICAL_W};
use crate::sys::{self, InputEvent};

const READ_BATCH: usize = 64;

// ── axis mapping ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
}

impl AxisRange {
    /// A degenerate range (`max <= min`) is widened to one unit.
    pub fn new(min: i32, max: i32) -> Self {
        let max = if max <= min { min.saturating_add(1) } else { max };
        Self { min, max }
    }

    /// Clamp `v` to the range and scale it onto `[0, out-1]`.
    pub fn map(&self, v: i32, out: i32) -> i32 {
        if out <= 1 {
            return 0;
        }
        let v = v.clamp(self.min, self.max) as i64;
        let num = v - self.min as i64;
        let den = self.max as i64 - self.min as i64;
        (num * (out as i64 - 1) / den) as i32
    }
}

// ── frame decoder ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FrameDecoder {
    range_x: AxisRange,
    range_y: AxisRange,
    out_w: i32,
    out_h: i32,
    orientation: Orientation,
    cur_x: i32,
    cur_y: i32,
    is_down: bool,
    has_pos: bool,
    last_down: bool,
    last_x: i32,
    last_y: i32,
}

impl FrameDecoder {
    pub fn new(range_x: AxisRange, range_y: AxisRange, out_w: i32, out_h: i32) -> Self {
        Self {
            range_x,
            range_y,
            out_w,
            out_h,
            orientation: Orientation::default(),
            cur_x: 0,
            cur_y: 0,
            is_down: false,
            has_pos: false,
            last_down: false,
            last_x: 0,
            last_y: 0,
        }
    }

    pub fn with_orientation(mut self, o: Orientation) -> Self {
        self.orientation = o;
        self
    }

    /// Feed one kernel record. Returns an event only on SYN_REPORT.
    pub fn feed(&mut self, ev: InputEvent) -> Option<TouchEvent> {
        match ev.kind {
            sys::EV_ABS => match ev.code {
                sys::ABS_X | sys::ABS_MT_POSITION_X => {
                    self.cur_x = self.range_x.map(ev.value, self.out_w);
                    self.has_pos = true;
                }
                sys::ABS_Y | sys::ABS_MT_POSITION_Y => {
                    self.cur_y = self.range_y.map(ev.value, self.out_h);
                    self.has_pos = true;
                }
                sys::ABS_MT_TRACKING_ID => self.is_down = ev.value >= 0,
                _ => {}
            },
            sys::EV_KEY if ev.code == sys::BTN_TOUCH => self.is_down = ev.value != 0,
            sys::EV_SYN if ev.code == sys::SYN_REPORT => return self.end_frame(),
            _ => {}
        }
        None
    }

    fn end_frame(&mut self) -> Option<TouchEvent> {
        if !self.has_pos && self.is_down == self.last_down {
            return None;
        }
        let (x, y) = (self.cur_x, self.cur_y);
        let kind = match (self.last_down, self.is_down) {
            (false, true) => TouchKind::Down,
            (true, false) => TouchKind::Up,
            _ => TouchKind::Move,
        };
        if kind == TouchKind::Move && x == self.last_x && y == self.last_y {
            return None;
        }
        self.last_down = self.is_down;
        self.last_x = x;
        self.last_y = y;
        self.has_pos = false;

        let (x, y) = self.orientation.apply(x, y);
        Some(TouchEvent::new(kind, x, y))
    }
}

// ── device discovery ──────────────────────────────────────────────────────────

pub const DEFAULT_NAME_HINTS: &[&str] = &["goodix", "gt911", "touch"];

/// Choose among `(node, name)` pairs: first name containing a hint, else
/// first non-empty name, else the first node.
pub fn pick_device(candidates: &[(PathBuf, String)], hints: &[String]) -> Option<PathBuf> {
    let hinted = candidates.iter().find(|(_, name)| {
        let low = name.to_lowercase();
        hints
            .iter()
            .filter(|h| !h.is_empty())
            .any(|h| low.contains(&h.to_lowercase()))
    });
    hinted
        .or_else(|| candidates.iter().find(|(_, name)| !name.is_empty()))
        .or_else(|| candidates.first())
        .map(|(p, _)| p.clone())
}

fn event_nodes() -> Vec<PathBuf> {
    let Ok(rd) = std::fs::read_dir("/dev/input") else {
        return Vec::new();
    };
    let mut nodes: Vec<PathBuf> = rd
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("event"))
        })
        .collect();
    // event2 before event10
    nodes.sort_by_key(|p| {
        p.file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.trim_start_matches("event").parse::<u32>().ok())
            .unwrap_or(u32::MAX)
    });
    nodes
}

pub fn discover(hints: &[String]) -> Result<PathBuf> {
    let candidates: Vec<(PathBuf, String)> = event_nodes()
        .into_iter()
        .map(|p| {
            let name = sys::open_device(&p, OFlags::RDONLY | OFlags::NONBLOCK)
                .ok()
                .and_then(|fd| sys::evdev_name(fd.as_fd()).ok())
                .unwrap_or_default();
            tracing::debug!("input node {}: {:?}", p.display(), name);
            (p, name)
        })
        .collect();
    pick_device(&candidates, hints).ok_or(Error::NoInputDevice)
}

// ── reader ────────────────────────────────────────────────────────────────────

pub struct EvdevTouch {
    fd: OwnedFd,
    path: PathBuf,
    decoder: FrameDecoder,
    buf: Vec<u8>,
    read_failed: bool,
}

impl EvdevTouch {
    /// Open the configured node, or discover one by name.
    pub fn open(cfg: &TouchConfig) -> Result<Self> {
        let path = match &cfg.device {
            Some(p) => p.clone(),
            None => discover(&cfg.name_hints)?,
        };
        Self::open_path(&path, Orientation::from_config(cfg))
    }

    pub fn open_path(path: &Path, orientation: Orientation) -> Result<Self> {
        let fd = sys::open_device(path, OFlags::RDONLY | OFlags::NONBLOCK)?;
        let name = sys::evdev_name(fd.as_fd()).unwrap_or_default();

        let range_x = query_range(&fd, sys::ABS_MT_POSITION_X, sys::ABS_X, LOGICAL_W);
        let range_y = query_range(&fd, sys::ABS_MT_POSITION_Y, sys::ABS_Y, LOGICAL_H);
        tracing::info!(
            "Touch device {} ({:?}) x {}..{} y {}..{}",
            path.display(),
            name,
            range_x.min,
            range_x.max,
            range_y.min,
            range_y.max
        );

        Ok(Self {
            fd,
            path: path.to_path_buf(),
            decoder: FrameDecoder::new(range_x, range_y, LOGICAL_W, LOGICAL_H)
                .with_orientation(orientation),
            buf: vec![0u8; sys::INPUT_EVENT_SIZE * READ_BATCH],
            read_failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Multi-touch axis first, then the single-touch axis, then the screen.
fn query_range(fd: &OwnedFd, mt: u16, st: u16, screen: i32) -> AxisRange {
    let info = sys::evdev_abs(fd.as_fd(), mt)
        .ok()
        .filter(|i| i.maximum > i.minimum)
        .or_else(|| sys::evdev_abs(fd.as_fd(), st).ok());
    match info {
        Some(i) => AxisRange::new(i.minimum, i.maximum),
        None => AxisRange::new(0, screen - 1),
    }
}

impl TouchSource for EvdevTouch {
    fn poll(&mut self) -> Vec<TouchEvent> {
        let mut out = Vec::new();
        loop {
            let n = match sys::read_nonblocking(self.fd.as_fd(), &mut self.buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    if !self.read_failed {
                        tracing::warn!("Touch read from {} failed: {e}", self.path.display());
                        self.read_failed = true;
                    }
                    break;
                }
            };
            for rec in self.buf[..n].chunks(sys::INPUT_EVENT_SIZE) {
                match InputEvent::decode(rec) {
                    Some(ev) => out.extend(self.decoder.feed(ev)),
                    None => tracing::debug!("short evdev record ({} bytes)", rec.len()),
                }
            }
            if n < self.buf.len() {
                break;
            }
        }
        out
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(kind: u16, code: u16, value: i32) -> InputEvent {
        InputEvent { kind, code, value }
    }

    fn run(dec: &mut FrameDecoder, evs: &[InputEvent]) -> Vec<(TouchKind, i32, i32)> {
        evs.iter()
            .filter_map(|e| dec.feed(*e))
            .map(|t| (t.kind, t.x, t.y))
            .collect()
    }

    fn decoder(min: i32, max: i32) -> FrameDecoder {
        FrameDecoder::new(AxisRange::new(min, max), AxisRange::new(min, max), 480, 480)
    }

    const SYN: InputEvent = InputEvent {
        kind: sys::EV_SYN,
        code: sys::SYN_REPORT,
        value: 0,
    };

    #[test]
    fn tap_from_min_to_max() {
        let mut d = decoder(0, 4095);
        let out = run(
            &mut d,
            &[
                ev(sys::EV_ABS, sys::ABS_X, 0),
                ev(sys::EV_ABS, sys::ABS_Y, 0),
                ev(sys::EV_KEY, sys::BTN_TOUCH, 1),
                SYN,
                ev(sys::EV_ABS, sys::ABS_X, 4095),
                ev(sys::EV_KEY, sys::BTN_TOUCH, 0),
                SYN,
            ],
        );
        assert_eq!(out, vec![(TouchKind::Down, 0, 0), (TouchKind::Up, 479, 0)]);
    }

    #[test]
    fn tracking_id_drives_contact() {
        let mut d = decoder(0, 479);
        let out = run(
            &mut d,
            &[
                ev(sys::EV_ABS, sys::ABS_MT_TRACKING_ID, 7),
                ev(sys::EV_ABS, sys::ABS_MT_POSITION_X, 100),
                ev(sys::EV_ABS, sys::ABS_MT_POSITION_Y, 200),
                SYN,
                ev(sys::EV_ABS, sys::ABS_MT_POSITION_X, 110),
                SYN,
                ev(sys::EV_ABS, sys::ABS_MT_TRACKING_ID, -1),
                SYN,
            ],
        );
        assert_eq!(
            out,
            vec![
                (TouchKind::Down, 100, 200),
                (TouchKind::Move, 110, 200),
                (TouchKind::Up, 110, 200),
            ]
        );
    }

    #[test]
    fn unchanged_move_suppressed() {
        let mut d = decoder(0, 479);
        let out = run(
            &mut d,
            &[
                ev(sys::EV_KEY, sys::BTN_TOUCH, 1),
                ev(sys::EV_ABS, sys::ABS_X, 50),
                ev(sys::EV_ABS, sys::ABS_Y, 50),
                SYN,
                ev(sys::EV_ABS, sys::ABS_X, 50),
                SYN,
                SYN,
            ],
        );
        assert_eq!(out, vec![(TouchKind::Down, 50, 50)]);
    }

    #[test]
    fn out_of_range_values_clamp() {
        let r = AxisRange::new(100, 200);
        assert_eq!(r.map(-5, 480), 0);
        assert_eq!(r.map(9999, 480), 479);
        assert_eq!(r.map(150, 480), 239);
    }

    #[test]
    fn degenerate_range_widened() {
        let r = AxisRange::new(10, 10);
        assert_eq!(r.max, 11);
        assert_eq!(r.map(11, 480), 479);
    }

    #[test]
    fn orientation_applied_to_output() {
        let mut d = decoder(0, 479).with_orientation(Orientation {
            swap_xy: false,
            invert_x: true,
            invert_y: false,
        });
        let out = run(
            &mut d,
            &[
                ev(sys::EV_KEY, sys::BTN_TOUCH, 1),
                ev(sys::EV_ABS, sys::ABS_X, 0),
                ev(sys::EV_ABS, sys::ABS_Y, 10),
                SYN,
            ],
        );
        assert_eq!(out, vec![(TouchKind::Down, 479, 10)]);
    }

    #[test]
    fn pick_prefers_hinted_name() {
        let c = vec![
            (PathBuf::from("/dev/input/event0"), String::new()),
            (PathBuf::from("/dev/input/event1"), "gpio-keys".to_string()),
            (PathBuf::from("/dev/input/event2"), "Goodix Capacitive TouchScreen".to_string()),
        ];
        let hints: Vec<String> = DEFAULT_NAME_HINTS.iter().map(|s| s.to_string()).collect();
        assert_eq!(pick_device(&c, &hints), Some(PathBuf::from("/dev/input/event2")));
        assert_eq!(pick_device(&c[..2], &hints), Some(PathBuf::from("/dev/input/event1")));
        assert_eq!(pick_device(&c[..1], &hints), Some(PathBuf::from("/dev/input/event0")));
        assert_eq!(pick_device(&[], &hints), None);
    }
}
