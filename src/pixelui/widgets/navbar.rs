// widgets/navbar.rs — 60 px title bar with optional back chevron

use crate::font::FontWeight;
use crate::pixelui::{text_top_for_center, theme, Painter, LOGICAL_W};
use crate::touch::{TouchEvent, TouchKind};

pub const NAVBAR_HEIGHT: i32 = 60;
const BACK_AREA: i32 = 60;
const TITLE_SIZE: f32 = 22.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavBarResponse {
    Ignored,
    Consumed,
    Back,
}

#[derive(Debug, Clone)]
pub struct NavBar {
    title: String,
    has_back: bool,
}

impl NavBar {
    pub fn new(title: impl Into<String>, has_back: bool) -> Self {
        Self {
            title: title.into(),
            has_back,
        }
    }

    pub fn set_title(&mut self, t: impl Into<String>) {
        self.title = t.into();
    }

    /// Drawn last so scrolled content never shows through.
    pub fn render(&self, p: &mut Painter) {
        p.fill_rect(0, 0, LOGICAL_W, NAVBAR_HEIGHT, theme::BACKGROUND);
        p.fill_rect(0, NAVBAR_HEIGHT - 1, LOGICAL_W, 1, theme::SEPARATOR);

        if self.has_back {
            let (ax, ay, s) = (24, NAVBAR_HEIGHT / 2, 14);
            p.line(ax + s, ay - s, ax, ay, theme::TEXT_PRIMARY);
            p.line(ax, ay, ax + s, ay + s, theme::TEXT_PRIMARY);
        }

        let x = if self.has_back { 60 } else { 24 };
        let top = text_top_for_center(0, NAVBAR_HEIGHT, TITLE_SIZE);
        p.text(&self.title, x, top, theme::TEXT_PRIMARY, TITLE_SIZE, FontWeight::Medium);
    }

    /// The back area swallows every touch; release there means Back.
    pub fn handle_touch(&self, ev: &TouchEvent) -> NavBarResponse {
        if !self.has_back || ev.x >= BACK_AREA || ev.y >= NAVBAR_HEIGHT {
            return NavBarResponse::Ignored;
        }
        if ev.kind == TouchKind::Up {
            NavBarResponse::Back
        } else {
            NavBarResponse::Consumed
        }
    }
}
