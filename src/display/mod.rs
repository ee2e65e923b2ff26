// display/mod.rs — output backends
//
// A backend owns the physical output and one RGBA back buffer at physical
// resolution. The loop paints into `back_buffer()` and calls `present()`.

pub mod fb;
#[cfg(feature = "preview")]
pub mod preview;

use crate::config::{Backend, DisplayConfig};
use crate::error::Result;
use crate::surface::PixelSurface;
use crate::touch::TouchEvent;

pub use self::fb::FbDisplay;
#[cfg(feature = "preview")]
pub use self::preview::PreviewDisplay;

/// Something the platform reported since the last poll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayEvent {
    /// Pointer input in logical coordinates (preview window).
    Touch(TouchEvent),
    Quit,
}

pub trait Display {
    /// Physical resolution.
    fn size(&self) -> (u32, u32);

    fn back_buffer(&mut self) -> &mut PixelSurface;

    fn present(&mut self) -> Result<()>;

    /// Drain platform events. Backends without a native queue report none.
    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        Vec::new()
    }
}

impl<D: Display + ?Sized> Display for Box<D> {
    fn size(&self) -> (u32, u32) {
        (**self).size()
    }
    fn back_buffer(&mut self) -> &mut PixelSurface {
        (**self).back_buffer()
    }
    fn present(&mut self) -> Result<()> {
        (**self).present()
    }
    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        (**self).poll_events()
    }
}

/// Open the backend named by the config.
pub fn open(cfg: &DisplayConfig) -> Result<Box<dyn Display>> {
    match cfg.backend {
        Backend::Framebuffer => Ok(Box::new(FbDisplay::open(&cfg.device)?)),
        #[cfg(feature = "preview")]
        Backend::Preview => Ok(Box::new(PreviewDisplay::open(cfg.preview_scale)?)),
        #[cfg(not(feature = "preview"))]
        Backend::Preview => Err(crate::error::Error::Window(
            "preview backend not compiled in (build with --features preview)".into(),
        )),
    }
}

// ── test double ───────────────────────────────────────────────────────────────

/// Back buffer only; counts presents and replays queued events.
#[cfg(test)]
pub struct MemoryDisplay {
    surface: PixelSurface,
    pub presented: usize,
    /// One entry per `poll_events` call; empty once drained.
    pub script: std::collections::VecDeque<Vec<DisplayEvent>>,
    pub fail_present: bool,
}

#[cfg(test)]
impl MemoryDisplay {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            surface: PixelSurface::new(w, h),
            presented: 0,
            script: Default::default(),
            fail_present: false,
        }
    }

    pub fn surface(&self) -> &PixelSurface {
        &self.surface
    }
}

#[cfg(test)]
impl Display for MemoryDisplay {
    fn size(&self) -> (u32, u32) {
        (self.surface.width(), self.surface.height())
    }
    fn back_buffer(&mut self) -> &mut PixelSurface {
        &mut self.surface
    }
    fn present(&mut self) -> Result<()> {
        if self.fail_present {
            return Err(crate::error::Error::Present("memory display refused".into()));
        }
        self.presented += 1;
        Ok(())
    }
    fn poll_events(&mut self) -> Vec<DisplayEvent> {
        self.script.pop_front().unwrap_or_default()
    }
}
