// widgets/button.rs — rounded push button

use crate::font::FontWeight;
use crate::pixelui::{text_top_for_center, theme, Color, Painter, Rect};
use crate::touch::{TouchEvent, TouchKind};

const LABEL_SIZE: f32 = 16.0;
const DISABLED_BG: Color = Color::rgb(203, 213, 225);
const DISABLED_FG: Color = Color::rgb(241, 245, 249);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Danger,
}

impl ButtonStyle {
    fn colors(self) -> (Color, Color) {
        match self {
            ButtonStyle::Primary => (theme::BRAND_BLUE, theme::BACKGROUND),
            ButtonStyle::Secondary => (theme::PRESSED, theme::TEXT_PRIMARY),
            ButtonStyle::Danger => (theme::ERROR_RED, theme::BACKGROUND),
        }
    }
}

/// Scale each channel by `1 - factor`.
fn darken(c: Color, factor: f64) -> Color {
    let f = |v: u8| (v as f64 * (1.0 - factor)) as u8;
    Color(f(c.0), f(c.1), f(c.2), c.3)
}

#[derive(Debug, Clone)]
pub struct Button {
    pub rect: Rect,
    label: String,
    style: ButtonStyle,
    radius: i32,
    enabled: bool,
    pressed: bool,
}

impl Button {
    pub fn new(rect: Rect, label: impl Into<String>) -> Self {
        Self {
            rect,
            label: label.into(),
            style: ButtonStyle::Primary,
            radius: 12,
            enabled: true,
            pressed: false,
        }
    }

    pub fn style(mut self, s: ButtonStyle) -> Self {
        self.style = s;
        self
    }
    pub fn radius(mut self, r: i32) -> Self {
        self.radius = r;
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }
    pub fn set_label(&mut self, l: impl Into<String>) {
        self.label = l.into();
    }
    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
        if !on {
            self.pressed = false;
        }
    }
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn render(&self, p: &mut Painter) {
        let (bg, fg) = if !self.enabled {
            (DISABLED_BG, DISABLED_FG)
        } else if self.pressed {
            let (bg, fg) = self.style.colors();
            (darken(bg, 0.2), fg)
        } else {
            self.style.colors()
        };
        let r = self.rect;
        p.rounded_rect(r.x, r.y, r.w, r.h, self.radius, bg);
        let tw = p.measure_text(&self.label, LABEL_SIZE, FontWeight::Medium);
        let top = text_top_for_center(r.y, r.h, LABEL_SIZE);
        p.text(&self.label, r.x + (r.w - tw) / 2, top, fg, LABEL_SIZE, FontWeight::Medium);
    }

    /// True on release over a pressed button (a click).
    /// Any touch inside an enabled button is consumed, see `contains`.
    pub fn handle_touch(&mut self, ev: &TouchEvent) -> bool {
        if !self.enabled {
            return false;
        }
        let inside = self.rect.contains(ev.x, ev.y);
        match ev.kind {
            TouchKind::Down => {
                self.pressed = inside;
                false
            }
            TouchKind::Move => {
                if !inside {
                    self.pressed = false;
                }
                false
            }
            TouchKind::Up => {
                let click = inside && self.pressed;
                self.pressed = false;
                click
            }
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.enabled && self.rect.contains(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_requires_press_inside() {
        let mut b = Button::new(Rect::new(24, 400, 432, 50), "Apply");
        assert!(!b.handle_touch(&TouchEvent::down(30, 410)));
        assert!(b.handle_touch(&TouchEvent::up(30, 410)));
        assert!(!b.handle_touch(&TouchEvent::up(30, 410)));
    }

    #[test]
    fn slide_out_cancels() {
        let mut b = Button::new(Rect::new(24, 400, 432, 50), "Apply");
        b.handle_touch(&TouchEvent::down(30, 410));
        b.handle_touch(&TouchEvent::moved(30, 300));
        assert!(!b.handle_touch(&TouchEvent::up(30, 410)));
    }

    #[test]
    fn disabled_never_clicks() {
        let mut b = Button::new(Rect::new(0, 0, 100, 40), "x");
        b.set_enabled(false);
        b.handle_touch(&TouchEvent::down(5, 5));
        assert!(!b.handle_touch(&TouchEvent::up(5, 5)));
        assert!(!b.contains(5, 5));
    }

    #[test]
    fn darken_scales_channels() {
        assert_eq!(darken(Color::rgb(100, 200, 50), 0.2), Color::rgb(80, 160, 40));
    }
}
