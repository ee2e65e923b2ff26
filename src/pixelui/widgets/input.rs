// widgets/input.rs — single-line text field edited through the keyboard

use crate::font::FontWeight;
use crate::pixelui::{text_top_for_center, theme, Painter, Rect};
use crate::touch::{TouchEvent, TouchKind};

const TEXT_SIZE: f32 = 20.0;
const BLINK_FRAMES: u32 = 30;
pub const DEFAULT_MAX_LEN: usize = 32;

#[derive(Debug, Clone)]
pub struct InputField {
    pub rect: Rect,
    text: String,
    placeholder: String,
    focused: bool,
    password: bool,
    max_len: usize,
    cursor_frame: u32,
}

impl InputField {
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            text: String::new(),
            placeholder: String::new(),
            focused: false,
            password: false,
            max_len: DEFAULT_MAX_LEN,
            cursor_frame: 0,
        }
    }

    pub fn placeholder(mut self, p: impl Into<String>) -> Self {
        self.placeholder = p.into();
        self
    }
    pub fn password(mut self, on: bool) -> Self {
        self.password = on;
        self
    }
    pub fn max_len(mut self, n: usize) -> Self {
        self.max_len = n;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }
    pub fn set_text(&mut self, t: impl Into<String>) {
        self.text = t.into();
    }
    pub fn is_focused(&self) -> bool {
        self.focused
    }
    pub fn set_focus(&mut self, on: bool) {
        self.focused = on;
        if on {
            self.cursor_frame = 0;
        }
    }
    pub fn is_password(&self) -> bool {
        self.password
    }
    pub fn set_password(&mut self, on: bool) {
        self.password = on;
    }

    /// Append one character while under the length limit.
    pub fn push(&mut self, ch: char) -> bool {
        if self.text.chars().count() >= self.max_len {
            return false;
        }
        self.text.push(ch);
        true
    }

    /// Remove the last character; no-op on empty text.
    pub fn pop(&mut self) {
        self.text.pop();
    }

    /// Advance the cursor blink while focused.
    pub fn tick(&mut self) {
        if self.focused {
            self.cursor_frame = self.cursor_frame.wrapping_add(1);
        }
    }

    fn cursor_visible(&self) -> bool {
        self.focused && (self.cursor_frame / BLINK_FRAMES) % 2 == 0
    }

    pub fn render(&self, p: &mut Painter) {
        let r = self.rect;
        p.fill(r, theme::BACKGROUND);

        let (line_color, line_h) = if self.focused {
            (theme::BRAND_BLUE, 2)
        } else {
            (theme::SEPARATOR, 1)
        };
        p.fill_rect(r.x, r.bottom() - line_h, r.w, line_h, line_color);

        let (shown, color) = if self.text.is_empty() {
            (self.placeholder.clone(), theme::TEXT_LIGHT)
        } else if self.password {
            let dot = if p.has_outline() { "•" } else { "*" };
            (dot.repeat(self.text.chars().count()), theme::TEXT_PRIMARY)
        } else {
            (self.text.clone(), theme::TEXT_PRIMARY)
        };

        let text_x = r.x + 8;
        let top = text_top_for_center(r.y, r.h, TEXT_SIZE);
        p.text(&shown, text_x, top, color, TEXT_SIZE, FontWeight::Regular);

        if self.cursor_visible() {
            let w = if self.text.is_empty() {
                0
            } else {
                p.measure_text(&shown, TEXT_SIZE, FontWeight::Regular)
            };
            p.fill_rect(text_x + w + 2, r.y + 10, 2, r.h - 20, theme::BRAND_BLUE);
        }
    }

    /// Up inside the field focuses it. Other touches are not consumed.
    pub fn handle_touch(&mut self, ev: &TouchEvent) -> bool {
        if ev.kind == TouchKind::Up && self.rect.contains(ev.x, ev.y) {
            self.set_focus(true);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_respects_limit() {
        let mut f = InputField::new(Rect::new(0, 0, 100, 40)).max_len(3);
        for ch in "abcd".chars() {
            f.push(ch);
        }
        assert_eq!(f.text(), "abc");
        f.pop();
        f.pop();
        f.pop();
        f.pop();
        assert_eq!(f.text(), "");
    }

    #[test]
    fn limit_counts_characters() {
        let mut f = InputField::new(Rect::new(0, 0, 100, 40)).max_len(2);
        assert!(f.push('é'));
        assert!(f.push('ü'));
        assert!(!f.push('a'));
    }

    #[test]
    fn tap_up_inside_focuses() {
        let mut f = InputField::new(Rect::new(24, 120, 432, 50));
        assert!(!f.handle_touch(&TouchEvent::down(30, 130)));
        assert!(!f.is_focused());
        assert!(f.handle_touch(&TouchEvent::up(30, 130)));
        assert!(f.is_focused());
        assert!(!f.handle_touch(&TouchEvent::up(10, 10)));
    }

    #[test]
    fn cursor_blinks_every_thirty_ticks() {
        let mut f = InputField::new(Rect::new(0, 0, 100, 40));
        f.set_focus(true);
        assert!(f.cursor_visible());
        for _ in 0..30 {
            f.tick();
        }
        assert!(!f.cursor_visible());
        for _ in 0..30 {
            f.tick();
        }
        assert!(f.cursor_visible());
    }
}
